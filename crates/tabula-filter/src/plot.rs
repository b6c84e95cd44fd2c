use crate::error::FilterResult;
use crate::field::Field;
use crate::filter::{Filter, PlotType};
use crate::serde_helpers::{serialize_f64, serialize_f64_seq};
use serde::{Deserialize, Serialize};
use tabula_table::{DataContainer, DataContainerExt};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    #[serde(serialize_with = "serialize_f64")]
    pub x: f64,
    #[serde(serialize_with = "serialize_f64")]
    pub y: f64,
}

/// Y-axis values plotted against a time-range filter's mapped timestamps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChart {
    pub series: Vec<SeriesPoint>,
    #[serde(serialize_with = "serialize_f64_seq")]
    pub x_domain: [f64; 2],
    #[serde(serialize_with = "serialize_f64_seq")]
    pub y_domain: [f64; 2],
}

/// Compute the line chart for `filter` against `y_axis`.
///
/// Returns `None` for histogram plots, for filters without mapped timestamps and when no row has
/// both a finite x and a finite y.
pub fn filter_plot(
    filter: &Filter,
    container: &dyn DataContainer,
    y_axis: &Field,
) -> FilterResult<Option<LineChart>> {
    if filter.plot_type == PlotType::Histogram {
        return Ok(None);
    }
    let Some(mapped) = filter.mapped_value.as_deref() else {
        return Ok(None);
    };

    let column = y_axis.column();
    let mut series = Vec::new();
    for (row, y) in container.column(column)?.enumerate() {
        let x = mapped.get(row).copied().flatten();
        if let (Some(x), Some(y)) = (x.filter(|x| x.is_finite()), y?.as_finite_f64()) {
            series.push(SeriesPoint { x, y });
        }
    }
    series.sort_by(|a, b| a.x.total_cmp(&b.x));

    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Ok(None);
    };
    let x_domain = [first.x, last.x];
    let y_domain = series.iter().fold([f64::INFINITY, f64::NEG_INFINITY], |[lo, hi], p| {
        [lo.min(p.y), hi.max(p.y)]
    });

    Ok(Some(LineChart {
        series,
        x_domain,
        y_domain,
    }))
}
