//! [Prometheus][prometheus]用のメトリクス.
//!
//! [prometheus]: https://prometheus.io/
use prometrics::metrics::{Counter, Gauge, MetricBuilder};

/// [`Allocator`]のメトリクス.
///
/// カウンタ群は`destroy`を跨いで累積される.
///
/// [`Allocator`]: ../struct.Allocator.html
#[derive(Debug, Clone)]
pub struct AllocatorMetrics {
    pub(crate) pool_bytes: Gauge,
    pub(crate) allocated_regions: Counter,
    pub(crate) allocated_bytes: Counter,
    pub(crate) released_regions: Counter,
    pub(crate) released_bytes: Counter,
    pub(crate) split_regions: Counter,
    pub(crate) merged_regions: Counter,
    pub(crate) nospace_failures: Counter,
    pub(crate) invalid_frees: Counter,
}
impl AllocatorMetrics {
    /// 現在保持しているプールのサイズ.
    ///
    /// プールを保持していない場合は`0`.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fitalloc_allocator_pool_bytes <GAUGE>
    /// ```
    pub fn pool_bytes(&self) -> u64 {
        self.pool_bytes.value() as u64
    }

    /// 領域の割当回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fitalloc_allocator_allocated_regions_total <COUNTER>
    /// ```
    pub fn allocated_regions(&self) -> u64 {
        self.allocated_regions.value() as u64
    }

    /// これまでに割り当てた領域のバイト数(アライメント後).
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fitalloc_allocator_allocated_bytes_total <COUNTER>
    /// ```
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes.value() as u64
    }

    /// 領域の解放回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fitalloc_allocator_released_regions_total <COUNTER>
    /// ```
    pub fn released_regions(&self) -> u64 {
        self.released_regions.value() as u64
    }

    /// これまでに解放された領域のバイト数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fitalloc_allocator_released_bytes_total <COUNTER>
    /// ```
    pub fn released_bytes(&self) -> u64 {
        self.released_bytes.value() as u64
    }

    /// 割当時に空き領域が分割された回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fitalloc_allocator_split_regions_total <COUNTER>
    /// ```
    pub fn split_regions(&self) -> u64 {
        self.split_regions.value() as u64
    }

    /// 解放時に隣接する空き領域同士が結合された回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fitalloc_allocator_merged_regions_total <COUNTER>
    /// ```
    pub fn merged_regions(&self) -> u64 {
        self.merged_regions.value() as u64
    }

    /// 空き領域不足による割当失敗回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fitalloc_allocator_nospace_failures_total <COUNTER>
    /// ```
    pub fn nospace_failures(&self) -> u64 {
        self.nospace_failures.value() as u64
    }

    /// 不正なアドレス(二重解放を含む)の解放が試みられた回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fitalloc_allocator_invalid_frees_total <COUNTER>
    /// ```
    pub fn invalid_frees(&self) -> u64 {
        self.invalid_frees.value() as u64
    }

    /// 現在割当中のバイト数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fitalloc_allocator_allocated_bytes_total - fitalloc_allocator_released_bytes_total
    /// ```
    pub fn usage_bytes(&self) -> u64 {
        // NOTE: 以下の順番で値を取得しないとアンダーフローする可能性がある
        let dec = self.released_bytes();
        let inc = self.allocated_bytes();
        inc - dec
    }

    pub(crate) fn new(builder: &MetricBuilder) -> Self {
        let mut builder = builder.clone();
        builder.namespace("fitalloc").subsystem("allocator");
        AllocatorMetrics {
            pool_bytes: builder
                .gauge("pool_bytes")
                .help("Size of the memory pool currently held")
                .finish()
                .expect("Never fails"),
            allocated_regions: builder
                .counter("allocated_regions_total")
                .help("Number of allocated regions")
                .finish()
                .expect("Never fails"),
            allocated_bytes: builder
                .counter("allocated_bytes_total")
                .help("Number of allocated bytes")
                .finish()
                .expect("Never fails"),
            released_regions: builder
                .counter("released_regions_total")
                .help("Number of released regions")
                .finish()
                .expect("Never fails"),
            released_bytes: builder
                .counter("released_bytes_total")
                .help("Number of released bytes")
                .finish()
                .expect("Never fails"),
            split_regions: builder
                .counter("split_regions_total")
                .help("Number of holes split by allocations")
                .finish()
                .expect("Never fails"),
            merged_regions: builder
                .counter("merged_regions_total")
                .help("Number of adjacent holes coalesced by releases")
                .finish()
                .expect("Never fails"),
            nospace_failures: builder
                .counter("nospace_failures_total")
                .help("Number of allocation failures caused by no available space")
                .finish()
                .expect("Never fails"),
            invalid_frees: builder
                .counter("invalid_frees_total")
                .help("Number of releases of addresses that are not live allocations")
                .finish()
                .expect("Never fails"),
        }
    }

    pub(crate) fn count_allocation(&self, size: usize) {
        self.allocated_regions.increment();
        self.allocated_bytes.add_u64(size as u64);
    }

    pub(crate) fn count_release(&self, size: usize) {
        self.released_regions.increment();
        self.released_bytes.add_u64(size as u64);
    }
}
