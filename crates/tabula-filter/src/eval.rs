//! Compiling filters into row predicates and partitioning dataset rows.

use crate::domain::is_in_range;
use crate::error::FilterResult;
use crate::field::{Dataset, Field};
use crate::filter::{
    dataset_field_index_for_filter, should_apply_filter, Filter, FilterType, FilterValue,
};
use crate::options::FilterOptions;
use crate::polygon::{polygon_filter_functor, Layer};
use crate::time::TimeParser;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tabula_table::{DataContainerExt, DataRow, TableResult, Value};

/// Per-row test compiled from one filter. Receives the row and its index in the container.
pub type RowPredicate<'a> =
    Box<dyn Fn(&DataRow<'_>, usize) -> TableResult<bool> + Send + Sync + 'a>;

/// Compile `filter` into a predicate over rows of dataset `dataset_id`, reading `field`.
///
/// Returns `None` for filters without a type. A missing field reads every row as null.
pub fn filter_function<'a>(
    field: Option<&Field>,
    dataset_id: &str,
    filter: &'a Filter,
    layers: &'a [Arc<dyn Layer>],
) -> Option<RowPredicate<'a>> {
    let column = field.map(Field::column);
    let read = move |row: &DataRow<'_>| -> TableResult<Option<Value>> {
        match column {
            Some(column) => Ok(Some(row.value_at(column)?.clone())),
            None => Ok(None),
        }
    };

    let predicate: RowPredicate<'a> = match filter.filter_type? {
        FilterType::Range => {
            let Some(bounds) = filter.value.as_ref().and_then(FilterValue::as_range) else {
                return Some(Box::new(|_, _| Ok(false)));
            };
            Box::new(move |row, _| {
                Ok(read(row)?
                    .and_then(|v| v.as_finite_f64())
                    .is_some_and(|v| is_in_range(v, bounds)))
            })
        }
        FilterType::MultiSelect => {
            let selected: HashSet<Value> = filter
                .value
                .as_ref()
                .and_then(FilterValue::as_list)
                .map(|values| values.iter().cloned().collect())
                .unwrap_or_default();
            Box::new(move |row, _| Ok(read(row)?.is_some_and(|v| selected.contains(&v))))
        }
        FilterType::Select => {
            let expected = filter.value.as_ref().and_then(FilterValue::as_bool);
            Box::new(move |row, _| {
                let actual = read(row)?.and_then(|v| v.as_bool());
                Ok(expected.is_some() && actual == expected)
            })
        }
        FilterType::TimeRange => {
            let Some(bounds) = filter.value.as_ref().and_then(FilterValue::as_range) else {
                return Some(Box::new(|_, _| Ok(false)));
            };
            let mapped = field
                .and_then(|f| f.filter_props.as_ref())
                .and_then(|props| props.domain.mapped_value.clone());
            let parser = TimeParser::new(field.and_then(|f| f.format.as_deref()));
            Box::new(move |row, index| {
                let millis = match &mapped {
                    Some(mapped) => mapped.get(index).copied().flatten(),
                    None => read(row)?.and_then(|v| parser.parse(&v)),
                };
                Ok(millis.is_some_and(|v| is_in_range(v, bounds)))
            })
        }
        FilterType::Polygon => {
            if layers.is_empty() {
                return Some(Box::new(|_, _| Ok(true)));
            }
            let functors: Vec<RowPredicate<'a>> = filter
                .layer_id
                .iter()
                .filter_map(|id| layers.iter().find(|layer| layer.id() == id))
                .filter(|layer| layer.data_id() == dataset_id)
                .map(|layer| polygon_filter_functor(layer.as_ref(), filter))
                .collect();
            Box::new(move |row, index| {
                for functor in &functors {
                    if !functor(row, index)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            })
        }
    };
    Some(predicate)
}

/// The two row-index sets produced by [`filter_data`], both strictly ascending.
///
/// `filtered_index_for_domain` holds rows passing every dynamic-domain filter;
/// `filtered_index` additionally requires every fixed-domain filter and is always a subset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredIndex {
    pub filtered_index: Vec<usize>,
    pub filtered_index_for_domain: Vec<usize>,
}

pub fn filter_data(
    dataset: &Dataset,
    filters: &[Filter],
    layers: &[Arc<dyn Layer>],
) -> FilterResult<FilteredIndex> {
    filter_data_with_options(dataset, filters, layers, FilterOptions::default())
}

/// Partition `dataset`'s rows by the filters that apply to it.
pub fn filter_data_with_options(
    dataset: &Dataset,
    filters: &[Filter],
    layers: &[Arc<dyn Layer>],
    options: FilterOptions,
) -> FilterResult<FilteredIndex> {
    let container = dataset.data_container.as_ref();
    let num_rows = container.num_rows();
    if dataset.id.is_empty() || num_rows == 0 {
        return Ok(FilteredIndex::default());
    }
    if filters.is_empty() {
        let all = container.plain_index();
        return Ok(FilteredIndex {
            filtered_index: all.clone(),
            filtered_index_for_domain: all,
        });
    }

    let mut dynamic_domain = Vec::new();
    let mut fixed_domain = Vec::new();
    for filter in filters.iter().filter(|f| should_apply_filter(f, &dataset.id)) {
        let field = dataset_field_index_for_filter(dataset, filter)
            .and_then(|column| dataset.field_for_column(column));
        let Some(predicate) = filter_function(field, &dataset.id, filter, layers) else {
            continue;
        };
        if filter.fixed_domain {
            fixed_domain.push(predicate);
        } else {
            dynamic_domain.push(predicate);
        }
    }

    let classify = |row: &DataRow<'_>, index: usize| -> TableResult<Option<bool>> {
        for predicate in &dynamic_domain {
            if !predicate(row, index)? {
                return Ok(None);
            }
        }
        for predicate in &fixed_domain {
            if !predicate(row, index)? {
                return Ok(Some(false));
            }
        }
        Ok(Some(true))
    };

    let mut result = FilteredIndex::default();
    let mut push = |index: usize, outcome: Option<bool>| {
        if let Some(for_render) = outcome {
            result.filtered_index_for_domain.push(index);
            if for_render {
                result.filtered_index.push(index);
            }
        }
    };

    #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
    let parallel = num_rows >= options.parallel_threshold_rows;
    #[cfg(not(all(feature = "parallel", not(target_arch = "wasm32"))))]
    let parallel = {
        let _ = options;
        false
    };

    if parallel {
        #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
        {
            use rayon::prelude::*;

            let outcomes = (0..num_rows)
                .into_par_iter()
                .with_min_len(4096)
                .map(|index| {
                    let row = DataRow::new(container, index);
                    classify(&row, index).map(|outcome| (index, outcome))
                })
                .collect::<TableResult<Vec<_>>>()?;
            for (index, outcome) in outcomes {
                push(index, outcome);
            }
        }
    } else {
        container.for_each_shared(0..num_rows, |row, index| {
            push(index, classify(row, index)?);
            Ok(())
        })?;
    }

    log::debug!(
        "filter data: dataset={} rows={} dynamic={} fixed={} for_domain={} filtered={}",
        dataset.id,
        num_rows,
        dynamic_domain.len(),
        fixed_domain.len(),
        result.filtered_index_for_domain.len(),
        result.filtered_index.len()
    );
    Ok(result)
}

/// A dataset together with its filtered index sets.
#[derive(Clone, Debug)]
pub struct FilteredDataset {
    pub dataset: Dataset,
    pub filtered_index: Vec<usize>,
    pub filtered_index_for_domain: Vec<usize>,
}

pub fn apply_filter_to_dataset(
    dataset: Dataset,
    filters: &[Filter],
    layers: &[Arc<dyn Layer>],
) -> FilterResult<FilteredDataset> {
    apply_filter_to_dataset_with_options(dataset, filters, layers, FilterOptions::default())
}

pub fn apply_filter_to_dataset_with_options(
    dataset: Dataset,
    filters: &[Filter],
    layers: &[Arc<dyn Layer>],
    options: FilterOptions,
) -> FilterResult<FilteredDataset> {
    let FilteredIndex {
        filtered_index,
        filtered_index_for_domain,
    } = filter_data_with_options(&dataset, filters, layers, options)?;
    Ok(FilteredDataset {
        dataset,
        filtered_index,
        filtered_index_for_domain,
    })
}

/// Filter each dataset in `dataset_ids`, passing each only the layers that render it.
///
/// Ids with no entry in `datasets` are skipped.
pub fn apply_filters_to_datasets(
    dataset_ids: &[String],
    datasets: &HashMap<String, Dataset>,
    filters: &[Filter],
    layers: &[Arc<dyn Layer>],
) -> FilterResult<HashMap<String, FilteredDataset>> {
    apply_filters_to_datasets_with_options(
        dataset_ids,
        datasets,
        filters,
        layers,
        FilterOptions::default(),
    )
}

pub fn apply_filters_to_datasets_with_options(
    dataset_ids: &[String],
    datasets: &HashMap<String, Dataset>,
    filters: &[Filter],
    layers: &[Arc<dyn Layer>],
    options: FilterOptions,
) -> FilterResult<HashMap<String, FilteredDataset>> {
    let mut out = HashMap::with_capacity(dataset_ids.len());
    for id in dataset_ids {
        let Some(dataset) = datasets.get(id) else {
            log::debug!("apply filters: unknown dataset {id}");
            continue;
        };
        let dataset_layers: Vec<Arc<dyn Layer>> = layers
            .iter()
            .filter(|layer| layer.data_id() == id)
            .cloned()
            .collect();
        let filtered =
            apply_filter_to_dataset_with_options(dataset.clone(), filters, &dataset_layers, options)?;
        out.insert(id.clone(), filtered);
    }
    Ok(out)
}
