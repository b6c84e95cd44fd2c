use crate::filter::Filter;
use crate::options::MAX_GPU_FILTERS;
use std::collections::HashMap;

/// Keep at most [`MAX_GPU_FILTERS`] GPU filters per dataset, first come first served.
pub fn reset_filter_gpu_mode(filters: Vec<Filter>) -> Vec<Filter> {
    reset_filter_gpu_mode_with_options(filters, MAX_GPU_FILTERS)
}

/// Clear `gpu` on every filter that would push one of its datasets past `max_gpu_filters`.
///
/// A filter spanning several datasets keeps its slot only if all of them have room, and then
/// takes a slot in each.
pub fn reset_filter_gpu_mode_with_options(
    mut filters: Vec<Filter>,
    max_gpu_filters: usize,
) -> Vec<Filter> {
    let mut per_dataset: HashMap<String, usize> = HashMap::new();
    for filter in filters.iter_mut().filter(|f| f.gpu) {
        let full = filter
            .data_id
            .iter()
            .any(|id| per_dataset.get(id).copied().unwrap_or(0) >= max_gpu_filters);
        if full {
            log::warn!(
                "filter {} moved off the GPU: datasets {:?} already use {max_gpu_filters} GPU filters",
                filter.id,
                filter.data_id
            );
            filter.gpu = false;
            continue;
        }
        for id in &filter.data_id {
            *per_dataset.entry(id.clone()).or_default() += 1;
        }
    }
    filters
}
