//! The persisted filter record and helpers over it.

use crate::domain::{Bin, Domain};
use crate::error::FilterResult;
use crate::field::{Dataset, Field, FieldType};
use crate::plot::LineChart;
use crate::polygon::PolygonFeature;
use crate::serde_helpers::{one_or_many, serialize_f64, serialize_opt_f64};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tabula_table::Value;

/// Length of generated filter ids.
pub const FILTER_ID_LENGTH: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    Range,
    Select,
    MultiSelect,
    TimeRange,
    Polygon,
}

impl FilterType {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterType::Range => "range",
            FilterType::Select => "select",
            FilterType::MultiSelect => "multiSelect",
            FilterType::TimeRange => "timeRange",
            FilterType::Polygon => "polygon",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlotType {
    #[default]
    Histogram,
    LineChart,
}

/// A filter's stored value. Its meaning depends on the filter type: a `[min, max]` pair for
/// range filters, a boolean for select, the selected values for multi-select and a polygon
/// feature for polygon filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    List(Vec<Value>),
    Feature(Box<PolygonFeature>),
    Other(serde_json::Value),
}

impl FilterValue {
    /// Both ends of a range value, when it is a pair of finite numbers.
    pub fn as_range(&self) -> Option<[f64; 2]> {
        match self.as_list()? {
            [lo, hi] => Some([lo.as_finite_f64()?, hi.as_finite_f64()?]),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FilterValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            FilterValue::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_feature(&self) -> Option<&PolygonFeature> {
        match self {
            FilterValue::Feature(feature) => Some(feature),
            _ => None,
        }
    }

    pub fn range(min: f64, max: f64) -> Self {
        FilterValue::List(vec![Value::number(min), Value::number(max)])
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<Vec<Value>> for FilterValue {
    fn from(values: Vec<Value>) -> Self {
        FilterValue::List(values)
    }
}

impl From<PolygonFeature> for FilterValue {
    fn from(feature: PolygonFeature) -> Self {
        FilterValue::Feature(Box::new(feature))
    }
}

/// A filter over one or more datasets.
///
/// `data_id`, `name` and `field_idx` are index-aligned: entry `i` of `name`/`field_idx` is the
/// field bound in dataset `data_id[i]`. Domain data copied from the bound field
/// (`field_type`, histograms, mapped timestamps) travels with the filter so evaluation and
/// plotting do not recompute it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(default, deserialize_with = "one_or_many")]
    pub data_id: Vec<String>,
    #[serde(default)]
    pub freeze: bool,
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub fixed_domain: bool,
    #[serde(default)]
    pub enlarged: bool,
    #[serde(default)]
    pub is_animating: bool,
    #[serde(default = "default_speed", serialize_with = "serialize_f64")]
    pub speed: f64,

    #[serde(default, deserialize_with = "one_or_many")]
    pub name: Vec<String>,
    #[serde(rename = "type", default)]
    pub filter_type: Option<FilterType>,
    #[serde(default)]
    pub field_idx: Vec<Option<usize>>,
    #[serde(default)]
    pub domain: Option<Domain>,
    #[serde(default)]
    pub value: Option<FilterValue>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_f64"
    )]
    pub step: Option<f64>,

    #[serde(default)]
    pub plot_type: PlotType,
    #[serde(default)]
    pub y_axis: Option<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_chart: Option<LineChart>,
    #[serde(default)]
    pub interval: Option<String>,

    #[serde(default)]
    pub gpu: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layer_id: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub histogram: Vec<Bin>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enlarged_histogram: Vec<Bin>,
    #[serde(skip)]
    pub mapped_value: Option<Arc<Vec<Option<f64>>>>,
}

fn default_speed() -> f64 {
    1.0
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            data_id: Vec::new(),
            freeze: false,
            id: String::new(),
            fixed_domain: false,
            enlarged: false,
            is_animating: false,
            speed: default_speed(),
            name: Vec::new(),
            filter_type: None,
            field_idx: Vec::new(),
            domain: None,
            value: None,
            step: None,
            plot_type: PlotType::Histogram,
            y_axis: None,
            line_chart: None,
            interval: None,
            gpu: false,
            layer_id: Vec::new(),
            field_type: None,
            histogram: Vec::new(),
            enlarged_histogram: Vec::new(),
            mapped_value: None,
        }
    }
}

impl Filter {
    pub fn from_json(json: &str) -> FilterResult<Self> {
        let mut filter: Filter = serde_json::from_str(json)?;
        if filter.has_ordinal_domain() {
            filter.domain = filter.domain.take().map(Domain::into_ordinal);
        }
        Ok(filter)
    }

    /// Non-numeric fields and multi-select filters always carry value-list domains.
    fn has_ordinal_domain(&self) -> bool {
        matches!(
            self.field_type,
            Some(FieldType::String | FieldType::Date | FieldType::Boolean)
        ) || self.filter_type == Some(FilterType::MultiSelect)
    }

    pub fn to_json(&self) -> FilterResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn is_bound_to(&self, dataset_id: &str) -> bool {
        self.data_id.iter().any(|id| id == dataset_id)
    }
}

fn new_uuid() -> uuid::Uuid {
    #[cfg(not(target_arch = "wasm32"))]
    {
        uuid::Uuid::new_v4()
    }

    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::atomic::{AtomicU64, Ordering};

        static COUNTER: AtomicU64 = AtomicU64::new(1);
        uuid::Uuid::from_u128(COUNTER.fetch_add(1, Ordering::Relaxed) as u128)
    }
}

/// A fresh opaque id of [`FILTER_ID_LENGTH`] hex characters.
pub fn generate_filter_id() -> String {
    let hex = new_uuid().simple().to_string();
    hex[hex.len() - FILTER_ID_LENGTH..].to_string()
}

/// The default filter shape bound to `data_ids`, with a fresh id.
pub fn default_filter<I, S>(data_ids: I) -> Filter
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Filter {
        data_id: data_ids.into_iter().map(Into::into).collect(),
        id: generate_filter_id(),
        ..Filter::default()
    }
}

/// Whether `value` is a usable value for a filter of `filter_type`.
pub fn is_valid_filter_value(filter_type: Option<FilterType>, value: Option<&FilterValue>) -> bool {
    let (Some(filter_type), Some(value)) = (filter_type, value) else {
        return false;
    };
    match filter_type {
        FilterType::Select => value.as_bool().is_some(),
        FilterType::Range | FilterType::TimeRange => value.as_list().is_some_and(|values| {
            values
                .iter()
                .all(|v| v.as_f64().is_some_and(|n| !n.is_nan()))
        }),
        FilterType::MultiSelect => value.as_list().is_some_and(|values| !values.is_empty()),
        FilterType::Polygon => value
            .as_feature()
            .is_some_and(|feature| !feature.id.is_empty() && !feature.geometry.is_empty()),
    }
}

/// A filter takes part in evaluating `dataset_id` once it is bound to it and has a type and a
/// value.
pub fn should_apply_filter(filter: &Filter, dataset_id: &str) -> bool {
    filter.is_bound_to(dataset_id) && filter.value.is_some() && filter.filter_type.is_some()
}

/// Position of `dataset` in `filter.data_id`.
pub fn dataset_index_for_filter(dataset: &Dataset, filter: &Filter) -> Option<usize> {
    filter.data_id.iter().position(|id| *id == dataset.id)
}

/// Container column the filter reads in `dataset`.
pub fn dataset_field_index_for_filter(dataset: &Dataset, filter: &Filter) -> Option<usize> {
    let index = dataset_index_for_filter(dataset, filter)?;
    filter.field_idx.get(index).copied().flatten()
}

/// Plot type for range-like filters: a histogram, or a line chart when the y axis is numeric.
pub fn default_filter_plot_type(filter: &Filter) -> Option<PlotType> {
    match filter.filter_type? {
        FilterType::Range | FilterType::TimeRange => match &filter.y_axis {
            None => Some(PlotType::Histogram),
            Some(axis) if axis.field_type.is_numeric() => Some(PlotType::LineChart),
            Some(_) => None,
        },
        _ => None,
    }
}
