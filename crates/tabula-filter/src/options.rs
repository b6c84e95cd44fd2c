/// Max number of filter value buffers the renderer provides per dataset.
pub const MAX_GPU_FILTERS: usize = 4;

pub const HISTOGRAM_BINS: usize = 30;
pub const ENLARGED_HISTOGRAM_BINS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainOptions {
    pub histogram_bins: usize,
    pub enlarged_histogram_bins: usize,
}

impl Default for DomainOptions {
    fn default() -> Self {
        Self {
            histogram_bins: HISTOGRAM_BINS,
            enlarged_histogram_bins: ENLARGED_HISTOGRAM_BINS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    pub max_gpu_filters: usize,
    pub domain: DomainOptions,
    /// Datasets with at least this many rows are scanned in parallel when the `parallel`
    /// feature is enabled.
    pub parallel_threshold_rows: usize,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            max_gpu_filters: MAX_GPU_FILTERS,
            domain: DomainOptions::default(),
            parallel_threshold_rows: 65_536,
        }
    }
}
