//! プール内の領域群を管理する台帳.
//!
//! 台帳は、プールを隙間なく覆う領域(割当済み or 空き)の列を、アドレスの昇順に連結したリストとして保持する.
//!
//! リストの各要素は、構築時に容量が固定されるスロット配列上に置かれ、
//! 互いをスロット番号で参照し合う.
//! 結合によって不要になったスロットは空きスロットリストに戻され、以後の分割で再利用される.
pub use self::index::ProcessIndex;
pub use self::region::{Region, RegionKind};

use crate::{Address, ErrorKind, Result};

mod index;
mod region;

/// 台帳スロットの番号.
pub type SlotIndex = usize;

#[derive(Debug, Clone)]
struct Slot {
    region: Region,
    prev: Option<SlotIndex>,
    next: Option<SlotIndex>,
}

/// アドレス順に並んだ領域の双方向連結リスト.
#[derive(Debug)]
pub struct Ledger {
    slots: Vec<Slot>,
    free_slots: Vec<SlotIndex>,
    capacity: usize,
    head: Option<SlotIndex>,
    len: usize,
}
impl Ledger {
    /// 最大で`capacity`個の領域を保持可能な台帳を生成する.
    pub fn new(capacity: usize) -> Self {
        Ledger {
            slots: Vec::with_capacity(capacity),
            free_slots: Vec::new(),
            capacity,
            head: None,
            len: 0,
        }
    }

    /// 台帳を空にする.
    ///
    /// スロット配列のメモリは保持したまま再利用される.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.free_slots.clear();
        self.head = None;
        self.len = 0;
    }

    /// 空の台帳に、`pool_size`バイトのプール全体を覆う単一の空き領域を登録する.
    pub fn seed(&mut self, pool_size: usize) -> Result<SlotIndex> {
        track_assert_eq!(self.len, 0, ErrorKind::InconsistentState);
        let region = Region {
            base: Address::BASE,
            size: pool_size,
            kind: RegionKind::Hole,
        };
        let slot = track!(self.take_slot(region))?;
        self.head = Some(slot);
        Ok(slot)
    }

    /// 台帳が保持可能な領域の最大数を返す.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 連結されている領域の数を返す.
    pub fn len(&self) -> usize {
        self.len
    }

    /// 最も低いアドレスの領域を返す.
    pub fn head(&self) -> Option<SlotIndex> {
        self.head
    }

    /// スロットに格納されている領域を返す.
    pub fn region(&self, slot: SlotIndex) -> &Region {
        &self.slots[slot].region
    }

    /// アドレス上で直前に位置する領域を返す.
    pub fn prev(&self, slot: SlotIndex) -> Option<SlotIndex> {
        self.slots[slot].prev
    }

    /// アドレス上で直後に位置する領域を返す.
    pub fn next(&self, slot: SlotIndex) -> Option<SlotIndex> {
        self.slots[slot].next
    }

    /// 領域の種別を更新する.
    pub fn set_kind(&mut self, slot: SlotIndex, kind: RegionKind) {
        self.slots[slot].region.kind = kind;
    }

    /// 先頭から順に領域を走査するイテレータを返す.
    pub fn iter(&self) -> Iter {
        self.iter_from(self.head)
    }

    /// `start`から順に領域を走査するイテレータを返す.
    pub fn iter_from(&self, start: Option<SlotIndex>) -> Iter {
        Iter {
            ledger: self,
            current: start,
        }
    }

    /// 空き領域`hole`の先頭から`size`バイトを切り出し、割当済み領域として登録する.
    ///
    /// 新しい領域は`hole`の直前に連結され、`hole`の開始位置は`size`だけ後ろにずれる.
    /// 返り値は新しい領域のスロット.
    ///
    /// 空きスロットがない場合には`ErrorKind::LedgerFull`が返され、台帳は変更されない.
    pub fn split_front(&mut self, hole: SlotIndex, size: usize) -> Result<SlotIndex> {
        let remaining = *self.region(hole);
        track_assert!(remaining.is_hole(), ErrorKind::InconsistentState; hole);
        track_assert!(size < remaining.size, ErrorKind::InconsistentState; size, remaining);

        let carved = Region {
            base: remaining.base,
            size,
            kind: RegionKind::Process,
        };
        let slot = track!(self.take_slot(carved))?;

        let prev = self.slots[hole].prev;
        self.slots[slot].prev = prev;
        self.slots[slot].next = Some(hole);
        match prev {
            Some(prev) => self.slots[prev].next = Some(slot),
            None => self.head = Some(slot),
        }

        let hole = &mut self.slots[hole];
        hole.prev = Some(slot);
        hole.region.base = remaining.base + size;
        hole.region.size = remaining.size - size;
        Ok(slot)
    }

    /// `slot`の直後の領域を`slot`に吸収させる.
    ///
    /// 吸収された領域はリストから外され、そのスロットは空きスロットリストに戻される.
    /// 返り値は解放されたスロット.
    pub fn absorb_next(&mut self, slot: SlotIndex) -> Result<SlotIndex> {
        let next = track_assert_some!(self.slots[slot].next, ErrorKind::InconsistentState; slot);
        let absorbed = self.slots[next].clone();
        track_assert_eq!(
            self.slots[slot].region.end(),
            absorbed.region.base,
            ErrorKind::InconsistentState
        );

        self.slots[slot].region.size += absorbed.region.size;
        self.slots[slot].next = absorbed.next;
        if let Some(after) = absorbed.next {
            self.slots[after].prev = Some(slot);
        }
        self.release_slot(next);
        Ok(next)
    }

    fn take_slot(&mut self, region: Region) -> Result<SlotIndex> {
        let slot = Slot {
            region,
            prev: None,
            next: None,
        };
        let index = if let Some(index) = self.free_slots.pop() {
            self.slots[index] = slot;
            index
        } else {
            track_assert!(
                self.slots.len() < self.capacity,
                ErrorKind::LedgerFull;
                self.capacity
            );
            self.slots.push(slot);
            self.slots.len() - 1
        };
        self.len += 1;
        Ok(index)
    }

    fn release_slot(&mut self, index: SlotIndex) {
        let slot = &mut self.slots[index];
        slot.prev = None;
        slot.next = None;
        slot.region.size = 0;
        self.free_slots.push(index);
        self.len -= 1;
    }
}

/// 台帳内の領域をアドレス順に走査するためのイテレータ.
#[derive(Debug)]
pub struct Iter<'a> {
    ledger: &'a Ledger,
    current: Option<SlotIndex>,
}
impl<'a> Iterator for Iter<'a> {
    type Item = (SlotIndex, &'a Region);
    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.current?;
        self.current = self.ledger.next(slot);
        Some((slot, self.ledger.region(slot)))
    }
}

#[cfg(test)]
mod tests {
    use trackable::result::TestResult;

    use super::*;
    use crate::ErrorKind;

    fn regions(ledger: &Ledger) -> Vec<(usize, usize, RegionKind)> {
        ledger
            .iter()
            .map(|(_, r)| (r.base.as_usize(), r.size, r.kind))
            .collect()
    }

    #[test]
    fn seed_works() -> TestResult {
        let mut ledger = Ledger::new(4);
        let slot = track!(ledger.seed(64))?;
        assert_eq!(ledger.head(), Some(slot));
        assert_eq!(ledger.len(), 1);
        assert_eq!(regions(&ledger), vec![(0, 64, RegionKind::Hole)]);
        Ok(())
    }

    #[test]
    fn split_front_works() -> TestResult {
        use self::RegionKind::*;

        let mut ledger = Ledger::new(4);
        let hole = track!(ledger.seed(64))?;
        let a = track!(ledger.split_front(hole, 12))?;
        assert_eq!(ledger.head(), Some(a));
        let b = track!(ledger.split_front(hole, 8))?;
        assert_eq!(ledger.prev(b), Some(a));
        assert_eq!(ledger.next(b), Some(hole));
        assert_eq!(
            regions(&ledger),
            vec![(0, 12, Process), (12, 8, Process), (20, 44, Hole)]
        );
        assert_eq!(ledger.len(), 3);
        Ok(())
    }

    #[test]
    fn absorb_next_reuses_slots() -> TestResult {
        use self::RegionKind::*;

        let mut ledger = Ledger::new(3);
        let hole = track!(ledger.seed(64))?;
        let a = track!(ledger.split_front(hole, 12))?;
        let b = track!(ledger.split_front(hole, 8))?;

        // 容量上限
        let e = ledger.split_front(hole, 4).err();
        assert_eq!(e.map(|e| *e.kind()), Some(ErrorKind::LedgerFull));
        assert_eq!(ledger.len(), 3);

        ledger.set_kind(b, Hole);
        assert_eq!(track!(ledger.absorb_next(b))?, hole);
        assert_eq!(regions(&ledger), vec![(0, 12, Process), (12, 52, Hole)]);
        assert_eq!(ledger.len(), 2);

        // 解放されたスロットが再利用される
        let c = track!(ledger.split_front(b, 4))?;
        assert_eq!(c, hole);
        assert_eq!(ledger.prev(c), Some(a));
        assert_eq!(
            regions(&ledger),
            vec![(0, 12, Process), (12, 4, Process), (16, 48, Hole)]
        );
        Ok(())
    }

    #[test]
    fn reset_works() -> TestResult {
        let mut ledger = Ledger::new(2);
        let hole = track!(ledger.seed(32))?;
        track!(ledger.split_front(hole, 4))?;
        ledger.reset();
        assert_eq!(ledger.len(), 0);
        assert_eq!(ledger.head(), None);
        assert_eq!(ledger.iter().count(), 0);

        track!(ledger.seed(16))?;
        assert_eq!(ledger.len(), 1);
        Ok(())
    }
}
