//! 単一のメモリプールを管理するアロケータ.
//!
//! # 割当の流れ
//!
//! - `initialize`: プールを確保し、全体を一つの空き領域(Hole)として台帳に登録する
//! - `allocate`: 配置戦略に従って空き領域を選び、必要なら先頭側を切り出して割当済み(Process)にする
//! - `free`: 割当済み領域を空き領域に戻し、前後の空き領域と結合する
//! - `destroy`: プールを解放し、台帳を初期状態に戻す
use slog::Logger;

pub use self::builder::AllocatorBuilder;
pub use self::placement::FitStrategy;

use self::placement::Placement;
use crate::alignment::Alignment;
use crate::ledger::{Ledger, ProcessIndex, Region, RegionKind, SlotIndex};
use crate::metrics::AllocatorMetrics;
use crate::pool::Pool;
use crate::{Address, ErrorKind, Result};

mod builder;
mod placement;

#[derive(Debug)]
struct Arena {
    pool: Pool,
    placement: Placement,
}

/// 配置戦略を選択可能な、単一プール上のアロケータ.
///
/// インスタンスは利用者が排他的に所有する.
/// 内部で同期は行わないため、複数スレッドから使う場合には利用者側でロックを取る必要がある.
///
/// # Examples
///
/// ```
/// use fitalloc::{Allocator, FitStrategy};
///
/// let mut allocator = Allocator::new();
/// allocator.initialize(64, FitStrategy::FirstFit).unwrap();
/// assert_eq!(allocator.region_count(), 1);
///
/// let a = allocator.allocate(10).unwrap().unwrap();
/// allocator.bytes_mut(a).unwrap()[..5].copy_from_slice(b"hello");
/// assert_eq!(allocator.region_count(), 2);
///
/// allocator.free(a).unwrap();
/// assert_eq!(allocator.region_count(), 1);
///
/// allocator.destroy();
/// assert_eq!(allocator.region_count(), 0);
/// ```
#[derive(Debug)]
pub struct Allocator {
    arena: Option<Arena>,
    ledger: Ledger,
    index: ProcessIndex,
    alignment: Alignment,
    logger: Logger,
    metrics: AllocatorMetrics,
}
impl Allocator {
    /// デフォルト設定で、プールを保持していないアロケータを生成する.
    pub fn new() -> Self {
        AllocatorBuilder::new().build()
    }

    /// `size`バイトのプールを確保し、`strategy`を以後の配置戦略として記録する.
    ///
    /// `size`はアライメント単位に切り上げられる.
    ///
    /// # Errors
    ///
    /// - `size`が`0`、あるいは切り上げ後に`usize`に収まらない場合には`ErrorKind::InvalidInput`
    /// - 既にプールを保持している場合には`ErrorKind::InvalidInput`
    /// - 台帳の容量が`0`の場合には`ErrorKind::InvalidInput`
    /// - プールの確保に失敗した場合には`ErrorKind::OutOfMemory`
    ///
    /// エラー時には、アロケータの状態は変更されない.
    pub fn initialize(&mut self, size: usize, strategy: FitStrategy) -> Result<()> {
        track_assert!(
            self.arena.is_none(),
            ErrorKind::InvalidInput,
            "The allocator already holds a pool"
        );
        track_assert_ne!(size, 0, ErrorKind::InvalidInput);
        track_assert_ne!(self.ledger.capacity(), 0, ErrorKind::InvalidInput);
        let pool_size =
            track_assert_some!(self.alignment.ceil_align(size), ErrorKind::InvalidInput; size);
        let pool = track!(Pool::acquire(pool_size, self.alignment))?;

        self.ledger.reset();
        self.index.clear();
        track!(self.ledger.seed(pool_size))?;
        self.metrics.pool_bytes.set(pool_size as f64);
        self.arena = Some(Arena {
            pool,
            placement: Placement::new(strategy),
        });
        info!(self.logger, "Pool initialized";
              "pool_size" => pool_size, "strategy" => %strategy);
        Ok(())
    }

    /// プールを解放し、アロケータを初期状態に戻す.
    ///
    /// 以後、再び`initialize`を呼び出すことが可能.
    /// 割当中の領域が残っている場合には、それらも解放されたものとしてメトリクスに計上される.
    /// プールを保持していない場合には何も行わない.
    pub fn destroy(&mut self) {
        if let Some(arena) = self.arena.take() {
            info!(self.logger, "Pool destroyed";
                  "pool_size" => arena.pool.len(), "live_allocations" => self.index.len());

            // 割当中の領域はプールと共に解放される
            for region in self.ledger.iter().map(|(_, r)| r).filter(|r| r.is_process()) {
                self.metrics.count_release(region.size);
            }
            self.ledger.reset();
            self.index.clear();
            self.metrics.pool_bytes.set(0.0);
        }
    }

    /// `size`バイトの領域を割り当てる.
    ///
    /// `size`はアライメント単位に切り上げられる.
    ///
    /// 十分な大きさの空き領域が存在しない場合には`Ok(None)`が返される.
    /// この場合、何らかの領域を解放すれば、再試行で成功する可能性がある.
    ///
    /// # Errors
    ///
    /// - プールを保持していない場合には`ErrorKind::Uninitialized`
    /// - `size`が`0`の場合には`ErrorKind::InvalidInput`
    /// - 空き領域の分割に必要な台帳スロットがない場合には`ErrorKind::LedgerFull`
    pub fn allocate(&mut self, size: usize) -> Result<Option<Address>> {
        let arena = track_assert_some!(self.arena.as_mut(), ErrorKind::Uninitialized);
        track_assert_ne!(size, 0, ErrorKind::InvalidInput);

        let selected = match self.alignment.ceil_align(size) {
            Some(aligned) => arena
                .placement
                .select(&self.ledger, aligned)
                .map(|hole| (hole, aligned)),
            None => None,
        };
        let (hole, size) = match selected {
            Some(selected) => selected,
            None => {
                self.metrics.nospace_failures.increment();
                debug!(self.logger, "No hole large enough";
                       "size" => size, "strategy" => %arena.placement.strategy());
                return Ok(None);
            }
        };

        let slot = if self.ledger.region(hole).size == size {
            self.ledger.set_kind(hole, RegionKind::Process);
            hole
        } else {
            match self.ledger.split_front(hole, size) {
                Ok(slot) => {
                    self.metrics.split_regions.increment();
                    slot
                }
                Err(e) => {
                    if *e.kind() == ErrorKind::LedgerFull {
                        warn!(self.logger, "Ledger is full";
                              "capacity" => self.ledger.capacity(), "size" => size);
                    }
                    return Err(track!(e));
                }
            }
        };

        arena.placement.commit(hole);

        let address = self.ledger.region(slot).base;
        self.index.insert(address, slot);
        self.metrics.count_allocation(size);
        Ok(Some(address))
    }

    /// `address`から始まる割当済み領域を解放する.
    ///
    /// 解放された領域は、前後に隣接する空き領域と結合される.
    ///
    /// # Errors
    ///
    /// - プールを保持していない場合には`ErrorKind::Uninitialized`
    /// - `address`が割当中の領域の開始位置ではない場合(二重解放を含む)には`ErrorKind::InvalidFree`
    ///
    /// エラー時には、台帳は変更されない.
    pub fn free(&mut self, address: Address) -> Result<()> {
        let arena = track_assert_some!(self.arena.as_mut(), ErrorKind::Uninitialized);
        let slot = match self.index.remove(address) {
            Some(slot) => slot,
            None => {
                self.metrics.invalid_frees.increment();
                warn!(self.logger, "Attempted to free an address that is not allocated";
                      "address" => %address);
                track_panic!(ErrorKind::InvalidFree, "address={}", address);
            }
        };

        let size = self.ledger.region(slot).size;
        self.ledger.set_kind(slot, RegionKind::Hole);
        self.metrics.count_release(size);

        let mut slot = slot;
        if let Some(prev) = hole_before(&self.ledger, slot) {
            let reclaimed = track!(self.ledger.absorb_next(prev))?;
            arena.placement.on_reclaimed(reclaimed, prev);
            self.metrics.merged_regions.increment();
            slot = prev;
        }
        if let Some(next) = hole_after(&self.ledger, slot) {
            let reclaimed = track!(self.ledger.absorb_next(slot))?;
            debug_assert_eq!(reclaimed, next);
            arena.placement.on_reclaimed(reclaimed, slot);
            self.metrics.merged_regions.increment();
        }
        Ok(())
    }

    /// ポインタで指定された割当済み領域を解放する.
    ///
    /// `ptr`がヌルの場合には何も行わない.
    /// それ以外の場合は、プール先頭からのオフセットに変換した上で`free`と同様に扱う.
    ///
    /// # Errors
    ///
    /// `ptr`がプール外を指している場合には`ErrorKind::InvalidFree`が返される.
    /// その他は`free`と同様.
    pub fn free_ptr(&mut self, ptr: *mut u8) -> Result<()> {
        if ptr.is_null() {
            return Ok(());
        }
        let arena = track_assert_some!(self.arena.as_ref(), ErrorKind::Uninitialized);
        let address = match arena.pool.address_of(ptr) {
            Some(address) => address,
            None => {
                self.metrics.invalid_frees.increment();
                warn!(self.logger, "Attempted to free a pointer outside of the pool";
                      "ptr" => ?ptr);
                track_panic!(ErrorKind::InvalidFree, "ptr={:?}", ptr);
            }
        };
        track!(self.free(address))
    }

    /// 台帳に連結されている領域(割当済みと空きの両方)の数を返す.
    ///
    /// プールを保持していない場合は`0`.
    pub fn region_count(&self) -> usize {
        if self.arena.is_some() {
            self.ledger.len()
        } else {
            0
        }
    }

    /// 台帳に記録されている領域群を、アドレスの昇順に走査するイテレータを返す.
    pub fn regions(&self) -> Regions {
        Regions(self.ledger.iter())
    }

    /// 割当中の領域を、変更不可能なバイト列として返す.
    ///
    /// 長さはアライメント後のサイズとなる.
    ///
    /// # Errors
    ///
    /// `address`が割当中の領域の開始位置ではない場合には`ErrorKind::InvalidInput`が返される.
    pub fn bytes(&self, address: Address) -> Result<&[u8]> {
        let (arena, region) = track!(self.live_region(address))?;
        Ok(arena.pool.slice(region.base, region.size))
    }

    /// 割当中の領域を、変更可能なバイト列として返す.
    ///
    /// # Errors
    ///
    /// `bytes`と同様.
    pub fn bytes_mut(&mut self, address: Address) -> Result<&mut [u8]> {
        let region = *track!(self.live_region(address))?.1;
        let arena = track_assert_some!(self.arena.as_mut(), ErrorKind::Uninitialized);
        Ok(arena.pool.slice_mut(region.base, region.size))
    }

    /// 割当中の領域の先頭ポインタを返す.
    ///
    /// 返されたポインタは、その領域が解放されるか、プールが破棄されるまで有効.
    ///
    /// # Errors
    ///
    /// `bytes`と同様.
    pub fn as_ptr(&mut self, address: Address) -> Result<*mut u8> {
        track!(self.bytes_mut(address)).map(<[u8]>::as_mut_ptr)
    }

    /// プールを保持しているかどうかを返す.
    pub fn is_initialized(&self) -> bool {
        self.arena.is_some()
    }

    /// プールのサイズ(バイト単位)を返す.
    ///
    /// プールを保持していない場合は`0`.
    pub fn pool_size(&self) -> usize {
        self.arena.as_ref().map_or(0, |a| a.pool.len())
    }

    /// `initialize`時に指定された配置戦略を返す.
    pub fn strategy(&self) -> Option<FitStrategy> {
        self.arena.as_ref().map(|a| a.placement.strategy())
    }

    /// アライメント単位を返す.
    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// 台帳が保持可能な領域の最大数を返す.
    pub fn ledger_capacity(&self) -> usize {
        self.ledger.capacity()
    }

    /// アロケータのメトリクスを返す.
    pub fn metrics(&self) -> &AllocatorMetrics {
        &self.metrics
    }

    pub(crate) fn from_builder(builder: &AllocatorBuilder) -> Self {
        Allocator {
            arena: None,
            ledger: Ledger::new(builder.ledger_capacity),
            index: ProcessIndex::new(),
            alignment: builder.alignment,
            logger: builder.logger.clone(),
            metrics: AllocatorMetrics::new(&builder.metrics),
        }
    }

    fn live_region(&self, address: Address) -> Result<(&Arena, &Region)> {
        let arena = track_assert_some!(self.arena.as_ref(), ErrorKind::Uninitialized);
        let slot = track_assert_some!(self.index.get(address), ErrorKind::InvalidInput; address);
        Ok((arena, self.ledger.region(slot)))
    }
}
impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

/// 台帳内の領域をアドレスの昇順に走査するイテレータ.
#[derive(Debug)]
pub struct Regions<'a>(crate::ledger::Iter<'a>);
impl<'a> Iterator for Regions<'a> {
    type Item = Region;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, r)| *r)
    }
}

fn hole_before(ledger: &Ledger, slot: SlotIndex) -> Option<SlotIndex> {
    ledger
        .prev(slot)
        .filter(|&prev| ledger.region(prev).is_hole())
}

fn hole_after(ledger: &Ledger, slot: SlotIndex) -> Option<SlotIndex> {
    ledger
        .next(slot)
        .filter(|&next| ledger.region(next).is_hole())
}
