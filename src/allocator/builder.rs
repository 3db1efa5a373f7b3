use prometrics::metrics::MetricBuilder;
use slog::{Discard, Logger};

use super::{Allocator, FitStrategy};
use crate::alignment::Alignment;
use crate::Result;

/// `Allocator`のビルダ.
#[derive(Debug, Clone)]
pub struct AllocatorBuilder {
    pub(crate) ledger_capacity: usize,
    pub(crate) alignment: Alignment,
    pub(crate) logger: Logger,
    pub(crate) metrics: MetricBuilder,
}
impl AllocatorBuilder {
    /// 台帳の容量のデフォルト値.
    pub const DEFAULT_LEDGER_CAPACITY: usize = 10_000;

    /// デフォルト設定で`AllocatorBuilder`インスタンスを生成する.
    pub fn new() -> Self {
        AllocatorBuilder {
            ledger_capacity: Self::DEFAULT_LEDGER_CAPACITY,
            alignment: Alignment::default(),
            logger: Logger::root(Discard, o!()),
            metrics: MetricBuilder::new(),
        }
    }

    /// 台帳が同時に保持可能な領域(割当済みと空きの合計)の最大数を設定する.
    ///
    /// 台帳用のスロット配列は、この値に基づいてアロケータの構築時に確保される.
    /// 生存する領域がこの数を超えようとした場合には、割当が`ErrorKind::LedgerFull`で失敗する.
    ///
    /// `0`が指定された場合には、`initialize`時にエラーとなる.
    ///
    /// デフォルト値は`10_000`.
    pub fn ledger_capacity(&mut self, capacity: usize) -> &mut Self {
        self.ledger_capacity = capacity;
        self
    }

    /// アライメント単位を設定する.
    ///
    /// プールのサイズおよび各割当要求のサイズは、この単位に切り上げられる.
    ///
    /// デフォルト値は`Alignment::min()`.
    pub fn alignment(&mut self, alignment: Alignment) -> &mut Self {
        self.alignment = alignment;
        self
    }

    /// アロケータ用の logger を登録する.
    pub fn logger(&mut self, logger: Logger) -> &mut Self {
        self.logger = logger;
        self
    }

    /// メトリクス用の共通設定を登録する.
    ///
    /// デフォルト値は`MetricBuilder::new()`.
    pub fn metrics(&mut self, metrics: MetricBuilder) -> &mut Self {
        self.metrics = metrics;
        self
    }

    /// プールを保持していない`Allocator`を生成する.
    ///
    /// 利用前に`Allocator::initialize`を呼び出す必要がある.
    pub fn build(&self) -> Allocator {
        Allocator::from_builder(self)
    }

    /// `pool_size`バイトのプールを確保済みの`Allocator`を生成する.
    pub fn create(&self, pool_size: usize, strategy: FitStrategy) -> Result<Allocator> {
        let mut allocator = self.build();
        track!(allocator.initialize(pool_size, strategy))?;
        Ok(allocator)
    }
}
impl Default for AllocatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
