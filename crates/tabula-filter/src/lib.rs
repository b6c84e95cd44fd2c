//! Filter evaluation for Tabula datasets.
//!
//! This crate focuses on:
//! - Field domains, step sizes and histograms ([`field_domain`], [`filter_props`]).
//! - Validating saved filters against live datasets ([`validate_filter_with_data`]).
//! - Compiling filters into row predicates and the two-pass row partition ([`filter_data`]).
//! - The per-dataset GPU filter slot budget ([`reset_filter_gpu_mode`]).
//! - Polygon filters over map layers ([`Layer`], [`polygon_filter_functor`]).

#![forbid(unsafe_code)]

mod domain;
mod error;
mod eval;
mod field;
mod filter;
mod gpu;
mod options;
mod plot;
mod polygon;
mod serde_helpers;
mod time;
mod validate;

pub use crate::domain::{
    field_domain, filter_props, format_number_by_step, histogram_construct, is_in_range,
    numeric_field_domain, ordinal_domain, time_widget_hint_formatter, time_widget_title_formatter,
    timestamp_field_domain, Bin, Bound, Domain, FieldDomain, FilterProps, TIMESTAMP_STEP_MAP,
};
pub use crate::error::{FilterError, FilterResult};
pub use crate::eval::{
    apply_filter_to_dataset, apply_filter_to_dataset_with_options, apply_filters_to_datasets,
    apply_filters_to_datasets_with_options, filter_data, filter_data_with_options,
    filter_function, FilteredDataset, FilteredIndex, RowPredicate,
};
pub use crate::field::{Dataset, Field, FieldType};
pub use crate::filter::{
    dataset_field_index_for_filter, dataset_index_for_filter, default_filter,
    default_filter_plot_type, generate_filter_id, is_valid_filter_value, should_apply_filter,
    Filter, FilterType, FilterValue, PlotType, FILTER_ID_LENGTH,
};
pub use crate::gpu::{reset_filter_gpu_mode, reset_filter_gpu_mode_with_options};
pub use crate::options::{
    DomainOptions, FilterOptions, ENLARGED_HISTOGRAM_BINS, HISTOGRAM_BINS, MAX_GPU_FILTERS,
};
pub use crate::plot::{filter_plot, LineChart, SeriesPoint};
pub use crate::polygon::{
    feature_to_filter_value, filter_id_in_feature, generate_polygon_filter, is_in_polygon,
    polygon_filter_functor, ColumnLayer, Geometry, Layer, LayerType, PolygonFeature, Position,
    PositionAccessor, PositionColumns,
};
pub use crate::time::{time_to_unix_milli, TimeParser};
pub use crate::validate::{
    adjust_value_to_filter_domain, apply_filter_field_name, apply_filter_field_name_with_options,
    merge_filter_domain_step, validate_filter, validate_filter_with_data,
    validate_filter_with_data_and_options, validate_filter_with_options, validate_filter_y_axis,
    validate_polygon_filter, AdjustedValue, ValidatedFilter,
};

pub use tabula_table::{DataContainer, DataContainerExt, DataRow, Value};
