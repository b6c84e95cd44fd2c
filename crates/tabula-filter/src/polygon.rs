//! Polygon spatial filter: geometry, containment and the layer position contract.

use crate::eval::RowPredicate;
use crate::filter::{default_filter, Filter, FilterType, FilterValue};
use crate::serde_helpers::serialize_f64_seq;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::sync::Arc;
use tabula_table::{DataRow, TableResult};

/// A GeoJSON position, `[lng, lat]` with an optional altitude.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Position(pub Vec<f64>);

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_f64_seq(&self.0, serializer)
    }
}

impl Position {
    pub fn new(lng: f64, lat: f64) -> Self {
        Position(vec![lng, lat])
    }

    fn xy(&self) -> (f64, f64) {
        (
            self.0.first().copied().unwrap_or(f64::NAN),
            self.0.get(1).copied().unwrap_or(f64::NAN),
        )
    }
}

/// Rings are closed point sequences; the first ring of a polygon is its outline and the rest are
/// holes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Polygon(rings) => rings.iter().all(Vec::is_empty),
            Geometry::MultiPolygon(polygons) => polygons.iter().flatten().all(Vec::is_empty),
        }
    }
}

/// A drawn polygon, stored as the value of a polygon filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolygonFeature {
    #[serde(rename = "type", default = "feature_type")]
    pub feature_type: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, JsonValue>,
    pub geometry: Geometry,
}

fn feature_type() -> String {
    "Feature".to_string()
}

impl PolygonFeature {
    pub fn new(id: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            feature_type: feature_type(),
            id: id.into(),
            properties: Map::new(),
            geometry,
        }
    }
}

/// Whether `point` lies strictly inside `geometry`. Points on an outline or hole boundary are
/// not inside.
pub fn is_in_polygon(point: [f64; 2], geometry: &Geometry) -> bool {
    match geometry {
        Geometry::Polygon(rings) => polygon_contains(rings, point),
        Geometry::MultiPolygon(polygons) => {
            polygons.iter().any(|rings| polygon_contains(rings, point))
        }
    }
}

fn polygon_contains(rings: &[Vec<Position>], point: [f64; 2]) -> bool {
    let Some((outline, holes)) = rings.split_first() else {
        return false;
    };
    if rings.iter().any(|ring| on_ring_boundary(ring, point)) {
        return false;
    }
    ring_contains(outline, point) && !holes.iter().any(|hole| ring_contains(hole, point))
}

fn ring_contains(ring: &[Position], [x, y]: [f64; 2]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = ring[i].xy();
        let (xj, yj) = ring[j].xy();
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn on_ring_boundary(ring: &[Position], [x, y]: [f64; 2]) -> bool {
    ring.windows(2).any(|edge| {
        let (x1, y1) = edge[0].xy();
        let (x2, y2) = edge[1].xy();
        let cross = (x - x1) * (y2 - y1) - (y - y1) * (x2 - x1);
        cross == 0.0
            && x >= x1.min(x2)
            && x <= x1.max(x2)
            && y >= y1.min(y2)
            && y <= y1.max(y2)
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Point,
    Icon,
    Arc,
    Line,
    Hexagon,
    Grid,
    Heatmap,
    Cluster,
    Geojson,
}

/// Reads a row's coordinates. Point-like layers yield `[lng, lat, ..]`; arc/line layers yield
/// `[lng0, lat0, alt0, lng1, lat1, alt1]`.
pub type PositionAccessor<'a> =
    Box<dyn Fn(&DataRow<'_>) -> TableResult<Vec<f64>> + Send + Sync + 'a>;

/// The slice of a map layer the polygon filter depends on.
pub trait Layer: fmt::Debug + Send + Sync {
    fn id(&self) -> &str;

    fn layer_type(&self) -> LayerType;

    /// Id of the dataset the layer renders.
    fn data_id(&self) -> &str;

    fn label(&self) -> &str;

    fn position_accessor(&self) -> PositionAccessor<'_>;
}

/// Where a [`ColumnLayer`] finds its coordinates (0-based container columns).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionColumns {
    Point {
        lng: usize,
        lat: usize,
    },
    Arc {
        source_lng: usize,
        source_lat: usize,
        target_lng: usize,
        target_lat: usize,
    },
}

/// A layer that reads positions straight from dataset columns.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnLayer {
    pub id: String,
    pub layer_type: LayerType,
    pub data_id: String,
    pub label: String,
    pub columns: PositionColumns,
}

impl ColumnLayer {
    pub fn point(
        id: impl Into<String>,
        data_id: impl Into<String>,
        lng: usize,
        lat: usize,
    ) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            layer_type: LayerType::Point,
            data_id: data_id.into(),
            columns: PositionColumns::Point { lng, lat },
        }
    }

    pub fn arc(
        id: impl Into<String>,
        data_id: impl Into<String>,
        source: (usize, usize),
        target: (usize, usize),
    ) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            layer_type: LayerType::Arc,
            data_id: data_id.into(),
            columns: PositionColumns::Arc {
                source_lng: source.0,
                source_lat: source.1,
                target_lng: target.0,
                target_lat: target.1,
            },
        }
    }

    pub fn with_type(mut self, layer_type: LayerType) -> Self {
        self.layer_type = layer_type;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

fn coordinate(row: &DataRow<'_>, column: usize) -> TableResult<f64> {
    Ok(row.value_at(column)?.as_f64().unwrap_or(f64::NAN))
}

impl Layer for ColumnLayer {
    fn id(&self) -> &str {
        &self.id
    }

    fn layer_type(&self) -> LayerType {
        self.layer_type
    }

    fn data_id(&self) -> &str {
        &self.data_id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn position_accessor(&self) -> PositionAccessor<'_> {
        match self.columns {
            PositionColumns::Point { lng, lat } => {
                Box::new(move |row| Ok(vec![coordinate(row, lng)?, coordinate(row, lat)?]))
            }
            PositionColumns::Arc {
                source_lng,
                source_lat,
                target_lng,
                target_lat,
            } => Box::new(move |row| {
                Ok(vec![
                    coordinate(row, source_lng)?,
                    coordinate(row, source_lat)?,
                    0.0,
                    coordinate(row, target_lng)?,
                    coordinate(row, target_lat)?,
                    0.0,
                ])
            }),
        }
    }
}

/// Row predicate testing `layer`'s positions against the polygon stored in `filter`.
///
/// Layer kinds without a position-based test always pass. A filter whose value is not a polygon
/// feature rejects every row of a supported layer.
pub fn polygon_filter_functor<'a>(layer: &'a dyn Layer, filter: &Filter) -> RowPredicate<'a> {
    let geometry = filter
        .value
        .as_ref()
        .and_then(FilterValue::as_feature)
        .map(|feature| feature.geometry.clone());

    match layer.layer_type() {
        LayerType::Point | LayerType::Icon => {
            let position = layer.position_accessor();
            Box::new(move |row, _| {
                let Some(geometry) = &geometry else {
                    return Ok(false);
                };
                let pos = position(row)?;
                Ok(pos.len() >= 2
                    && pos.iter().all(|v| v.is_finite())
                    && is_in_polygon([pos[0], pos[1]], geometry))
            })
        }
        LayerType::Arc | LayerType::Line => {
            let position = layer.position_accessor();
            Box::new(move |row, _| {
                let Some(geometry) = &geometry else {
                    return Ok(false);
                };
                let pos = position(row)?;
                Ok(pos.len() >= 5
                    && pos.iter().all(|v| v.is_finite())
                    && is_in_polygon([pos[0], pos[1]], geometry)
                    && is_in_polygon([pos[3], pos[4]], geometry))
            })
        }
        _ => Box::new(|_, _| Ok(true)),
    }
}

/// Copy `feature` with `properties` merged in and `properties.filterId` set.
pub fn feature_to_filter_value(
    feature: &PolygonFeature,
    filter_id: &str,
    properties: Map<String, JsonValue>,
) -> FilterValue {
    let mut feature = feature.clone();
    feature.properties.extend(properties);
    feature
        .properties
        .insert("filterId".to_string(), JsonValue::from(filter_id));
    FilterValue::Feature(Box::new(feature))
}

pub fn filter_id_in_feature(feature: &PolygonFeature) -> Option<&str> {
    feature.properties.get("filterId").and_then(JsonValue::as_str)
}

/// Build a fixed-domain polygon filter over the datasets rendered by `layers`.
pub fn generate_polygon_filter(layers: &[Arc<dyn Layer>], feature: &PolygonFeature) -> Filter {
    let data_ids: Vec<String> = layers.iter().map(|l| l.data_id().to_string()).collect();
    let mut filter = default_filter(data_ids);
    filter.fixed_domain = true;
    filter.filter_type = Some(FilterType::Polygon);
    filter.name = layers.iter().map(|l| l.label().to_string()).collect();
    filter.layer_id = layers.iter().map(|l| l.id().to_string()).collect();

    let mut properties = Map::new();
    properties.insert("isVisible".to_string(), JsonValue::Bool(true));
    filter.value = Some(feature_to_filter_value(feature, &filter.id, properties));
    filter
}
