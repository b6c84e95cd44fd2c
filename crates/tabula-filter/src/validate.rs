//! Binding filters to dataset fields and checking them against live data.

use crate::domain::{filter_props, Domain, FilterProps};
use crate::error::FilterResult;
use crate::field::{Dataset, FieldType};
use crate::filter::{generate_filter_id, is_valid_filter_value, Filter, FilterType, FilterValue};
use crate::options::FilterOptions;
use crate::plot::filter_plot;
use crate::polygon::Layer;
use std::collections::BTreeSet;
use std::sync::Arc;
use tabula_table::Value;

/// Outcome of validating a filter against one dataset.
///
/// `filter` is `None` when the filter does not apply to the dataset or cannot be made valid for
/// it; the dataset is returned either way, with any newly computed field props attached.
#[derive(Clone, Debug)]
pub struct ValidatedFilter {
    pub filter: Option<Filter>,
    pub dataset: Dataset,
}

impl ValidatedFilter {
    fn rejected(dataset: Dataset, filter: &Filter, reason: &str) -> Self {
        log::debug!(
            "filter rejected: filter={} dataset={} reason={reason}",
            filter.id,
            dataset.id
        );
        Self {
            filter: None,
            dataset,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.filter.is_some()
    }
}

/// A stored value fitted to a filter domain.
///
/// Multi-select filters distinguish a selection that was never made from one that ended up empty
/// because none of its values exist in the domain; both store an empty list on the filter.
#[derive(Clone, Debug, PartialEq)]
pub enum AdjustedValue {
    Value(FilterValue),
    UnsetSelection,
    EmptySelection,
}

impl AdjustedValue {
    pub fn into_filter_value(self) -> FilterValue {
        match self {
            AdjustedValue::Value(value) => value,
            AdjustedValue::UnsetSelection | AdjustedValue::EmptySelection => {
                FilterValue::List(Vec::new())
            }
        }
    }
}

/// Fit `value` to `domain`. Returns `None` when the filter type has no adjustment rule or the
/// filter lacks a domain or type.
pub fn adjust_value_to_filter_domain(
    value: Option<&FilterValue>,
    domain: Option<&Domain>,
    filter_type: Option<FilterType>,
) -> Option<AdjustedValue> {
    let (domain, filter_type) = (domain?, filter_type?);
    match filter_type {
        FilterType::Range | FilterType::TimeRange => {
            let bounds = domain.as_linear()?;
            match value.and_then(FilterValue::as_list) {
                Some(pair) if pair.len() == 2 => {
                    let adjusted = pair
                        .iter()
                        .zip(bounds)
                        .map(|(v, bound)| match v.as_finite_f64() {
                            Some(n) if domain.contains(v) => Value::number(n),
                            _ => Value::number(bound),
                        })
                        .collect();
                    Some(AdjustedValue::Value(FilterValue::List(adjusted)))
                }
                _ => Some(AdjustedValue::Value(domain.to_filter_value())),
            }
        }
        FilterType::MultiSelect => {
            let Some(selected) = value.and_then(FilterValue::as_list) else {
                return Some(AdjustedValue::UnsetSelection);
            };
            let kept: Vec<Value> = selected
                .iter()
                .filter(|v| domain.contains(v))
                .cloned()
                .collect();
            if kept.is_empty() {
                Some(AdjustedValue::EmptySelection)
            } else {
                Some(AdjustedValue::Value(FilterValue::List(kept)))
            }
        }
        FilterType::Select => {
            let selected = value
                .and_then(FilterValue::as_bool)
                .filter(|b| domain.contains(&Value::Boolean(*b)))
                .unwrap_or(true);
            Some(AdjustedValue::Value(FilterValue::Bool(selected)))
        }
        FilterType::Polygon => None,
    }
}

/// Copy the field-derived settings in `props` onto `filter`.
fn apply_props(mut filter: Filter, props: &FilterProps) -> Filter {
    filter.field_type = Some(props.field_type);
    filter.domain = Some(props.domain.domain.clone());
    filter.step = props.domain.step;
    filter.histogram = props.domain.histogram.clone();
    filter.enlarged_histogram = props.domain.enlarged_histogram.clone();
    filter.mapped_value = props.domain.mapped_value.clone();
    filter.filter_type = Some(props.filter_type);
    filter.value = Some(props.value.clone());
    filter.gpu = props.gpu;
    filter.fixed_domain |= props.fixed_domain;
    filter.enlarged |= props.enlarged;
    filter
}

fn union_domain(current: &Domain, incoming: &Domain, field_type: FieldType) -> Domain {
    match (current, incoming) {
        (Domain::Linear { min: a, max: b }, Domain::Linear { min: c, max: d }) => {
            Domain::linear(a.min(*c), b.max(*d))
        }
        (Domain::Ordinal(a), Domain::Ordinal(b))
            if matches!(field_type, FieldType::String | FieldType::Date) =>
        {
            Domain::Ordinal(
                a.iter()
                    .chain(b)
                    .cloned()
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect(),
            )
        }
        _ => incoming.clone(),
    }
}

/// Merge a field's props into a filter that may already be bound to fields of other datasets.
///
/// Linear domains widen to cover both, string/date domains become the sorted union and timestamp
/// filters keep the finer step. Props of a different field type leave the filter unchanged.
pub fn merge_filter_domain_step(filter: Filter, props: Option<&FilterProps>) -> Filter {
    let Some(props) = props else {
        return filter;
    };
    if filter
        .field_type
        .is_some_and(|field_type| field_type != props.field_type)
    {
        return filter;
    }

    let domain = match &filter.domain {
        None => props.domain.domain.clone(),
        Some(current) => union_domain(current, &props.domain.domain, props.field_type),
    };
    let previous_step = filter.step;
    let mut merged = apply_props(filter, props);
    merged.domain = Some(domain);
    if props.field_type == FieldType::Timestamp {
        merged.step = match (previous_step, props.domain.step) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => b.or(a),
        };
    }
    merged
}

/// Bind `filter` to the field named `field_name` in `dataset`, as the filter's
/// `dataset_index`-th dataset.
///
/// Field props are computed once and cached on the dataset's (replaced) field. A frozen filter
/// only rebinds to the field it already names for that dataset.
pub fn apply_filter_field_name(
    filter: Filter,
    dataset: Dataset,
    field_name: &str,
    dataset_index: usize,
    merge_domain: bool,
) -> FilterResult<ValidatedFilter> {
    apply_filter_field_name_with_options(
        filter,
        dataset,
        field_name,
        dataset_index,
        merge_domain,
        FilterOptions::default(),
    )
}

pub fn apply_filter_field_name_with_options(
    filter: Filter,
    mut dataset: Dataset,
    field_name: &str,
    dataset_index: usize,
    merge_domain: bool,
    options: FilterOptions,
) -> FilterResult<ValidatedFilter> {
    let bound_name = filter
        .name
        .get(dataset_index)
        .filter(|name| !name.is_empty());
    if filter.freeze && bound_name.is_some_and(|name| name != field_name) {
        return Ok(ValidatedFilter::rejected(
            dataset,
            &filter,
            "frozen to another field",
        ));
    }
    let Some(field_index) = dataset.field_index(field_name) else {
        return Ok(ValidatedFilter::rejected(dataset, &filter, "unknown field"));
    };
    let field = &dataset.fields[field_index];
    let props = match &field.filter_props {
        Some(props) => Arc::clone(props),
        None => Arc::new(filter_props(
            dataset.data_container.as_ref(),
            field,
            options.domain,
        )?),
    };

    let mut filter = Filter {
        freeze: true,
        ..filter
    };
    let mut name = filter.name.clone();
    let mut field_idx = filter.field_idx.clone();
    filter = if merge_domain {
        merge_filter_domain_step(filter, Some(&props))
    } else {
        apply_props(filter, &props)
    };

    if name.len() <= dataset_index {
        name.resize(dataset_index + 1, String::new());
    }
    if field_idx.len() <= dataset_index {
        field_idx.resize(dataset_index + 1, None);
    }
    name[dataset_index] = field.name.clone();
    field_idx[dataset_index] = Some(field.column());
    filter.name = name;
    filter.field_idx = field_idx;

    let field = field.with_filter_props(props);
    dataset.fields[field_index] = field;
    Ok(ValidatedFilter {
        filter: Some(filter),
        dataset,
    })
}

/// Re-resolve the filter's y axis (by name and type) in `dataset` and recompute its line chart.
pub fn validate_filter_y_axis(mut filter: Filter, dataset: &Dataset) -> FilterResult<Filter> {
    let Some(axis) = &filter.y_axis else {
        return Ok(filter);
    };
    let Some(matched) = dataset
        .fields
        .iter()
        .find(|f| f.name == axis.name && f.field_type == axis.field_type)
    else {
        return Ok(filter);
    };

    let mut matched = matched.clone();
    matched.filter_props = None;
    filter.line_chart = filter_plot(&filter, dataset.data_container.as_ref(), &matched)?;
    filter.y_axis = Some(matched);
    Ok(filter)
}

/// Validate a saved field filter against `dataset`: bind its field, merge the field domain and
/// fit the stored value into it.
pub fn validate_filter(dataset: Dataset, filter: &Filter) -> FilterResult<ValidatedFilter> {
    validate_filter_with_options(dataset, filter, FilterOptions::default())
}

pub fn validate_filter_with_options(
    dataset: Dataset,
    filter: &Filter,
    options: FilterOptions,
) -> FilterResult<ValidatedFilter> {
    let Some(dataset_index) = filter.data_id.iter().position(|id| *id == dataset.id) else {
        return Ok(ValidatedFilter::rejected(dataset, filter, "dataset not bound"));
    };
    let Some(field_name) = filter.name.get(dataset_index).cloned() else {
        return Ok(ValidatedFilter::rejected(dataset, filter, "no field name"));
    };

    let mut initial = filter.clone();
    if initial.id.is_empty() {
        initial.id = generate_filter_id();
    }

    let ValidatedFilter {
        filter: bound,
        dataset,
    } = apply_filter_field_name_with_options(
        initial,
        dataset,
        &field_name,
        dataset_index,
        true,
        options,
    )?;
    let Some(mut bound) = bound else {
        return Ok(ValidatedFilter {
            filter: None,
            dataset,
        });
    };

    // Binding overwrote `value` with the field default; adjust the stored one instead.
    let adjusted = adjust_value_to_filter_domain(
        filter.value.as_ref(),
        bound.domain.as_ref(),
        bound.filter_type,
    );
    let Some(adjusted) = adjusted else {
        return Ok(ValidatedFilter::rejected(dataset, filter, "value not adjustable"));
    };
    if matches!(
        adjusted,
        AdjustedValue::UnsetSelection | AdjustedValue::EmptySelection
    ) {
        log::debug!("filter {} selection adjusted to {adjusted:?}", bound.id);
    }
    bound.value = Some(adjusted.into_filter_value());

    let bound = validate_filter_y_axis(bound, &dataset)?;
    Ok(ValidatedFilter {
        filter: Some(bound),
        dataset,
    })
}

/// Validate a polygon filter: it needs layers, a polygon value, to be bound to `dataset` and at
/// least one of its layers among `layers`.
pub fn validate_polygon_filter(
    dataset: Dataset,
    filter: &Filter,
    layers: &[Arc<dyn Layer>],
) -> ValidatedFilter {
    if filter.layer_id.is_empty()
        || !is_valid_filter_value(filter.filter_type, filter.value.as_ref())
    {
        return ValidatedFilter::rejected(dataset, filter, "invalid polygon");
    }
    if !filter.is_bound_to(&dataset.id) {
        return ValidatedFilter::rejected(dataset, filter, "dataset not bound");
    }
    if !layers
        .iter()
        .any(|layer| filter.layer_id.iter().any(|id| id == layer.id()))
    {
        return ValidatedFilter::rejected(dataset, filter, "no matching layer");
    }

    ValidatedFilter {
        filter: Some(Filter {
            freeze: true,
            field_idx: Vec::new(),
            ..filter.clone()
        }),
        dataset,
    }
}

/// Validate a saved filter of any type against `dataset`.
pub fn validate_filter_with_data(
    dataset: Dataset,
    filter: &Filter,
    layers: &[Arc<dyn Layer>],
) -> FilterResult<ValidatedFilter> {
    validate_filter_with_data_and_options(dataset, filter, layers, FilterOptions::default())
}

pub fn validate_filter_with_data_and_options(
    dataset: Dataset,
    filter: &Filter,
    layers: &[Arc<dyn Layer>],
    options: FilterOptions,
) -> FilterResult<ValidatedFilter> {
    match filter.filter_type {
        Some(FilterType::Polygon) => Ok(validate_polygon_filter(dataset, filter, layers)),
        _ => validate_filter_with_options(dataset, filter, options),
    }
}
