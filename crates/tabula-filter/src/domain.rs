//! Per-field value domains, step sizes and histograms.

use crate::error::FilterResult;
use crate::field::{Field, FieldType};
use crate::filter::{FilterType, FilterValue};
use crate::options::DomainOptions;
use crate::serde_helpers::{serialize_f64, Num};
use crate::time::TimeParser;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::sync::Arc;
use tabula_table::{DataContainer, DataContainerExt, Value};

/// `(max diff, step)` pairs for timestamp fields; the first entry with `max >= diff` wins.
pub const TIMESTAMP_STEP_MAP: [(f64, f64); 7] = [
    (1.0, 0.05),
    (10.0, 0.1),
    (100.0, 1.0),
    (500.0, 5.0),
    (1000.0, 10.0),
    (5000.0, 50.0),
    (f64::INFINITY, 1000.0),
];

const DEFAULT_NUMERIC_STEP: f64 = 0.1;

const DURATION_SECOND: f64 = 1000.0;
const DURATION_MINUTE: f64 = DURATION_SECOND * 60.0;
const DURATION_HOUR: f64 = DURATION_MINUTE * 60.0;
const DURATION_DAY: f64 = DURATION_HOUR * 24.0;
const DURATION_WEEK: f64 = DURATION_DAY * 7.0;
const DURATION_YEAR: f64 = DURATION_DAY * 365.0;

/// The span of values a field (or filter) covers.
///
/// On the wire both shapes are plain arrays: `[min, max]` for linear domains and the distinct
/// values for ordinal ones. Decoding goes by shape, so an ordinal domain of exactly two numbers
/// reads back as linear; [`Filter::from_json`](crate::Filter::from_json) restores it from the
/// filter's field and filter type.
#[derive(Clone, Debug, PartialEq)]
pub enum Domain {
    Linear { min: f64, max: f64 },
    Ordinal(Vec<Value>),
}

impl Domain {
    pub fn linear(min: f64, max: f64) -> Self {
        Domain::Linear { min, max }
    }

    pub fn as_linear(&self) -> Option<[f64; 2]> {
        match self {
            Domain::Linear { min, max } => Some([*min, *max]),
            Domain::Ordinal(_) => None,
        }
    }

    /// Reinterpret a linear domain as the ordinal domain `[min, max]`.
    pub fn into_ordinal(self) -> Self {
        match self {
            Domain::Linear { min, max } => {
                Domain::Ordinal(vec![Value::number(min), Value::number(max)])
            }
            ordinal => ordinal,
        }
    }

    pub fn as_ordinal(&self) -> Option<&[Value]> {
        match self {
            Domain::Ordinal(values) => Some(values),
            Domain::Linear { .. } => None,
        }
    }

    /// Membership test: inclusive range check for linear domains, equality for ordinal ones.
    pub fn contains(&self, value: &Value) -> bool {
        match self {
            Domain::Linear { min, max } => value
                .as_finite_f64()
                .is_some_and(|v| is_in_range(v, [*min, *max])),
            Domain::Ordinal(values) => values.contains(value),
        }
    }

    pub fn to_filter_value(&self) -> FilterValue {
        match self {
            Domain::Linear { min, max } => {
                FilterValue::List(vec![Value::number(*min), Value::number(*max)])
            }
            Domain::Ordinal(values) => FilterValue::List(values.clone()),
        }
    }
}

impl Serialize for Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Domain::Linear { min, max } => [Num(*min), Num(*max)].serialize(serializer),
            Domain::Ordinal(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for v in values {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DomainRepr {
    Linear([f64; 2]),
    Ordinal(Vec<Value>),
}

impl<'de> Deserialize<'de> for Domain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match DomainRepr::deserialize(deserializer)? {
            DomainRepr::Linear([min, max]) => Domain::Linear { min, max },
            DomainRepr::Ordinal(values) => Domain::Ordinal(values),
        })
    }
}

/// One histogram bucket covering `[range_start, range_end)` (the last bucket is closed).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bin {
    pub count: usize,
    #[serde(serialize_with = "serialize_f64")]
    pub range_start: f64,
    #[serde(serialize_with = "serialize_f64")]
    pub range_end: f64,
}

/// Domain summary for one field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDomain {
    pub domain: Domain,
    pub step: Option<f64>,
    pub histogram: Vec<Bin>,
    pub enlarged_histogram: Vec<Bin>,
    /// Epoch milliseconds per row, kept for timestamp fields so evaluation does not reparse.
    pub mapped_value: Option<Arc<Vec<Option<f64>>>>,
}

impl FieldDomain {
    fn ordinal(values: Vec<Value>) -> Self {
        Self {
            domain: Domain::Ordinal(values),
            step: None,
            histogram: Vec::new(),
            enlarged_histogram: Vec::new(),
            mapped_value: None,
        }
    }
}

/// Default filter settings derived from a field; cached on [`Field::filter_props`].
#[derive(Clone, Debug, PartialEq)]
pub struct FilterProps {
    pub field_type: FieldType,
    pub domain: FieldDomain,
    pub filter_type: FilterType,
    pub value: FilterValue,
    pub gpu: bool,
    pub fixed_domain: bool,
    pub enlarged: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Floor,
    Ceil,
}

/// Round `value` down or up to a multiple of `step`.
pub fn format_number_by_step(value: f64, step: f64, bound: Bound) -> f64 {
    let inverse = 1.0 / step;
    match bound {
        Bound::Floor => (value * inverse).floor() / inverse,
        Bound::Ceil => (value * inverse).ceil() / inverse,
    }
}

pub fn is_in_range(value: f64, domain: [f64; 2]) -> bool {
    value >= domain[0] && value <= domain[1]
}

fn numeric_step_size(diff: f64) -> Option<f64> {
    if diff > 100.0 {
        Some(1.0)
    } else if diff > 3.0 && diff <= 20.0 {
        Some(0.01)
    } else if diff <= 3.0 {
        Some(0.001)
    } else {
        None
    }
}

fn extent(values: &[Option<f64>]) -> Option<(f64, f64)> {
    values.iter().flatten().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((min, max)) => Some((min.min(v), max.max(v))),
    })
}

/// Domain, step and histograms for an integer/real field.
///
/// `values` holds one entry per row; `None` marks nulls and non-numeric cells.
pub fn numeric_field_domain(values: &[Option<f64>], options: DomainOptions) -> FieldDomain {
    let (domain, step) = match extent(values) {
        None => ([0.0, 1.0], DEFAULT_NUMERIC_STEP),
        Some((min, mut max)) => {
            let diff = max - min;
            if diff == 0.0 {
                max = min + 1.0;
            }
            let step = numeric_step_size(diff).unwrap_or(DEFAULT_NUMERIC_STEP);
            (
                [
                    format_number_by_step(min, step, Bound::Floor),
                    format_number_by_step(max, step, Bound::Ceil),
                ],
                step,
            )
        }
    };
    let (histogram, enlarged_histogram) = histograms(domain, values, options);
    FieldDomain {
        domain: Domain::linear(domain[0], domain[1]),
        step: Some(step),
        histogram,
        enlarged_histogram,
        mapped_value: None,
    }
}

/// Domain, step and histograms for a timestamp field. `values` are epoch milliseconds per row
/// and are retained as [`FieldDomain::mapped_value`].
pub fn timestamp_field_domain(values: Vec<Option<f64>>, options: DomainOptions) -> FieldDomain {
    let domain = extent(&values).map_or([0.0, 1.0], |(min, max)| [min, max]);
    let diff = domain[1] - domain[0];
    let step = TIMESTAMP_STEP_MAP
        .iter()
        .find(|(max, _)| *max >= diff)
        .map_or(0.01, |(_, step)| *step);
    let (histogram, enlarged_histogram) = histograms(domain, &values, options);
    FieldDomain {
        domain: Domain::linear(domain[0], domain[1]),
        step: Some(step),
        histogram,
        enlarged_histogram,
        mapped_value: Some(Arc::new(values)),
    }
}

fn histograms(
    domain: [f64; 2],
    values: &[Option<f64>],
    options: DomainOptions,
) -> (Vec<Bin>, Vec<Bin>) {
    let finite = || values.iter().flatten().copied();
    (
        histogram_construct(domain, finite(), options.histogram_bins),
        histogram_construct(domain, finite(), options.enlarged_histogram_bins),
    )
}

/// Bucket `values` into `bins` equal-width bins spanning `domain`.
///
/// Values outside the domain are not counted; a value equal to the upper bound lands in the last
/// bin.
pub fn histogram_construct(
    domain: [f64; 2],
    values: impl IntoIterator<Item = f64>,
    bins: usize,
) -> Vec<Bin> {
    if bins == 0 {
        return Vec::new();
    }
    let [min, max] = domain;
    let width = (max - min) / bins as f64;
    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            count: 0,
            range_start: min + width * i as f64,
            range_end: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
        })
        .collect();

    for v in values {
        if !is_in_range(v, domain) {
            continue;
        }
        let slot = if width > 0.0 {
            (((v - min) / width).floor() as usize).min(bins - 1)
        } else {
            0
        };
        out[slot].count += 1;
    }
    out
}

/// Distinct non-null values, sorted ascending.
pub fn ordinal_domain<'a>(values: impl IntoIterator<Item = &'a Value>) -> Vec<Value> {
    values
        .into_iter()
        .filter(|v| !v.is_null())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Compute the domain of `field` over every row of `container`.
pub fn field_domain(
    container: &dyn DataContainer,
    field: &Field,
    options: DomainOptions,
) -> FilterResult<FieldDomain> {
    let column = field.column();
    let domain = match field.field_type {
        FieldType::Integer | FieldType::Real => {
            let values = container
                .column(column)?
                .map(|v| v.map(Value::as_finite_f64))
                .collect::<Result<Vec<_>, _>>()?;
            numeric_field_domain(&values, options)
        }
        FieldType::Timestamp => {
            let parser = TimeParser::new(field.format.as_deref());
            let values = container
                .column(column)?
                .map(|v| v.map(|v| parser.parse(v)))
                .collect::<Result<Vec<_>, _>>()?;
            timestamp_field_domain(values, options)
        }
        FieldType::Boolean => {
            FieldDomain::ordinal(vec![Value::Boolean(true), Value::Boolean(false)])
        }
        FieldType::String | FieldType::Date => {
            let values = container.column(column)?.collect::<Result<Vec<_>, _>>()?;
            FieldDomain::ordinal(ordinal_domain(values))
        }
    };

    log::trace!(
        "field domain: field={} type={} domain={:?} step={:?}",
        field.name,
        field.field_type,
        domain.domain,
        domain.step
    );
    Ok(domain)
}

/// Default filter settings for `field`, including its domain.
pub fn filter_props(
    container: &dyn DataContainer,
    field: &Field,
    options: DomainOptions,
) -> FilterResult<FilterProps> {
    let domain = field_domain(container, field, options)?;
    let props = match field.field_type {
        FieldType::Integer | FieldType::Real => FilterProps {
            field_type: field.field_type,
            value: domain.domain.to_filter_value(),
            domain,
            filter_type: FilterType::Range,
            gpu: true,
            fixed_domain: false,
            enlarged: false,
        },
        FieldType::Boolean => FilterProps {
            field_type: field.field_type,
            domain,
            filter_type: FilterType::Select,
            value: FilterValue::Bool(true),
            gpu: false,
            fixed_domain: false,
            enlarged: false,
        },
        FieldType::String | FieldType::Date => FilterProps {
            field_type: field.field_type,
            domain,
            filter_type: FilterType::MultiSelect,
            value: FilterValue::List(Vec::new()),
            gpu: false,
            fixed_domain: false,
            enlarged: false,
        },
        FieldType::Timestamp => FilterProps {
            field_type: field.field_type,
            value: domain.domain.to_filter_value(),
            domain,
            filter_type: FilterType::TimeRange,
            gpu: true,
            fixed_domain: true,
            enlarged: true,
        },
    };
    Ok(props)
}

/// Display format (moment.js tokens) for the time widget title.
pub fn time_widget_title_formatter(domain: [f64; 2]) -> &'static str {
    let diff = domain[1] - domain[0];
    if diff > DURATION_YEAR {
        "MM/DD/YY"
    } else if diff > DURATION_DAY {
        "MM/DD/YY hh:mma"
    } else {
        "MM/DD/YY hh:mm:ssa"
    }
}

/// Display format (moment.js tokens) for the time widget hint.
pub fn time_widget_hint_formatter(domain: [f64; 2]) -> &'static str {
    let diff = domain[1] - domain[0];
    if diff > DURATION_YEAR {
        "MM/DD/YY"
    } else if diff > DURATION_WEEK {
        "MM/DD"
    } else if diff > DURATION_DAY {
        "MM/DD hha"
    } else if diff > DURATION_HOUR {
        "hh:mma"
    } else {
        "hh:mm:ssa"
    }
}
