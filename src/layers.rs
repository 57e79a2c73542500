// layers.rs

use geojson::{Geometry, JsonObject, Value};

use crate::aggregate::Summary;
use crate::config::FieldNames;
use crate::filter::{Cascade, Dimension, narrow_habitations};
use crate::loader::Dataset;
use crate::model::{MapFeature, display_attr};
use crate::style::{BOUNDARY_STYLE, HABITATION_STYLE, Style, arterial_style, scheme_style};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Boundary,
    Arterial,
    Roads,
    Habitations,
}

impl LayerKind {
    /// Draw order, bottom to top.
    pub const ALL: [LayerKind; 4] = [
        LayerKind::Boundary,
        LayerKind::Arterial,
        LayerKind::Roads,
        LayerKind::Habitations,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LayerKind::Boundary => "Taluka Boundary",
            LayerKind::Arterial => "PWD Network",
            LayerKind::Roads => "Roads",
            LayerKind::Habitations => "Habitations",
        }
    }

    pub fn shown_by_default(self) -> bool {
        !matches!(self, LayerKind::Arterial)
    }

    fn index(self) -> usize {
        match self {
            LayerKind::Boundary => 0,
            LayerKind::Arterial => 1,
            LayerKind::Roads => 2,
            LayerKind::Habitations => 3,
        }
    }
}

/// Layer control: one on/off flag per layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerVisibility([bool; 4]);

impl Default for LayerVisibility {
    fn default() -> Self {
        LayerVisibility(LayerKind::ALL.map(LayerKind::shown_by_default))
    }
}

impl LayerVisibility {
    pub fn is_visible(&self, kind: LayerKind) -> bool {
        self.0[kind.index()]
    }

    pub fn toggle(&mut self, kind: LayerKind) -> bool {
        let flag = &mut self.0[kind.index()];
        *flag = !*flag;
        *flag
    }
}

/// Ordered (attribute, label) pairs shown when a feature is inspected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tooltip {
    pub fields: Vec<(String, String)>,
}

impl Tooltip {
    pub fn new<'s>(pairs: impl IntoIterator<Item = (&'s str, &'s str)>) -> Self {
        Tooltip {
            fields: pairs
                .into_iter()
                .map(|(field, label)| (field.to_string(), label.to_string()))
                .collect(),
        }
    }

    /// (label, value) rows for one feature.
    pub fn rows(&self, properties: &JsonObject) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(field, label)| (label.clone(), display_attr(properties, field)))
            .collect()
    }

    pub fn for_roads(fields: &FieldNames) -> Self {
        Tooltip::new([
            (fields.road_name.as_str(), "Road Name"),
            (fields.road_scheme.as_str(), "Scheme"),
            (fields.road_class.as_str(), "Connected To"),
            (fields.road_habitation.as_str(), "Habitation"),
            (fields.road_population.as_str(), "Population"),
        ])
    }

    pub fn for_habitations(fields: &FieldNames) -> Self {
        Tooltip::new([
            (fields.hab_name.as_str(), "Habitation"),
            (fields.hab_population.as_str(), "Population"),
        ])
    }

    pub fn for_arterial(fields: &FieldNames) -> Self {
        Tooltip::new([(fields.arterial_number.as_str(), "Road No")])
    }
}

#[derive(Debug, Clone)]
pub struct StyledFeature<'a> {
    pub geometry: &'a Geometry,
    pub properties: &'a JsonObject,
    pub style: Style,
}

#[derive(Debug, Clone)]
pub struct Layer<'a> {
    pub kind: LayerKind,
    pub features: Vec<StyledFeature<'a>>,
    pub tooltip: Option<Tooltip>,
    pub visible: bool,
}

impl<'a> Layer<'a> {
    /// Styles each record; records without geometry have nothing to draw
    /// and are left out of the layer.
    pub fn from_records<T, I, F>(kind: LayerKind, records: I, style: F) -> Self
    where
        T: MapFeature + 'a,
        I: IntoIterator<Item = &'a T>,
        F: Fn(&T) -> Style,
    {
        let features = records
            .into_iter()
            .filter_map(|record| {
                record.geometry().map(|geometry| StyledFeature {
                    geometry,
                    properties: record.properties(),
                    style: style(record),
                })
            })
            .collect();
        Layer {
            kind,
            features,
            tooltip: None,
            visible: kind.shown_by_default(),
        }
    }

    pub fn with_tooltip(mut self, tooltip: Tooltip) -> Self {
        self.tooltip = Some(tooltip);
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Everything one render pass hands to a presentation surface.
#[derive(Debug, Clone)]
pub struct MapView<'a> {
    pub layers: Vec<Layer<'a>>,
    pub summary: Summary,
}

impl<'a> MapView<'a> {
    pub fn layer(&self, kind: LayerKind) -> Option<&Layer<'a>> {
        self.layers.iter().find(|layer| layer.kind == kind)
    }

    pub fn visible_layers(&self) -> impl Iterator<Item = &Layer<'a>> {
        self.layers.iter().filter(|layer| layer.visible)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.visible_layers()
            .flat_map(|layer| layer.features.iter())
            .fold(None, |acc: Option<Bounds>, feature| {
                match (acc, Bounds::of_geometry(feature.geometry)) {
                    (Some(a), Some(b)) => Some(a.union(b)),
                    (a, b) => a.or(b),
                }
            })
    }
}

/// Builds the layer stack and summary for the current filter cascade.
pub fn compose<'a>(
    dataset: &'a Dataset,
    cascade: &Cascade<'a>,
    fields: &FieldNames,
    visibility: &LayerVisibility,
) -> MapView<'a> {
    let roads = cascade.roads();
    let habitations: Vec<_> = match cascade.selected(Dimension::AdminUnit) {
        Some(units) => narrow_habitations(&dataset.habitations, &fields.hab_unit, units),
        None => dataset.habitations.iter().collect(),
    };

    let mut layers = vec![Layer::from_records(
        LayerKind::Boundary,
        dataset.blocks.iter(),
        |_| BOUNDARY_STYLE,
    )];
    if let Some(arterial) = &dataset.arterial {
        layers.push(
            Layer::from_records(LayerKind::Arterial, arterial.iter(), |r| {
                arterial_style(r.road_number.as_deref())
            })
            .with_tooltip(Tooltip::for_arterial(fields)),
        );
    }
    layers.push(
        Layer::from_records(LayerKind::Roads, roads.iter().copied(), |r| {
            scheme_style(r.scheme.as_deref())
        })
        .with_tooltip(Tooltip::for_roads(fields)),
    );
    layers.push(
        Layer::from_records(LayerKind::Habitations, habitations, |_| HABITATION_STYLE)
            .with_tooltip(Tooltip::for_habitations(fields)),
    );
    for layer in &mut layers {
        layer.visible = visibility.is_visible(layer.kind);
    }

    MapView {
        layers,
        summary: Summary::for_table(&dataset.roads, roads, &fields.road_population),
    }
}

/// Axis-aligned lon/lat box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    fn point(c: &[f64]) -> Option<Bounds> {
        match c {
            [lon, lat, ..] => Some(Bounds {
                min_lon: *lon,
                min_lat: *lat,
                max_lon: *lon,
                max_lat: *lat,
            }),
            _ => None,
        }
    }

    pub fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    fn of_positions<'p>(positions: impl IntoIterator<Item = &'p Vec<f64>>) -> Option<Bounds> {
        positions
            .into_iter()
            .filter_map(|c| Bounds::point(c))
            .reduce(Bounds::union)
    }

    pub fn of_geometry(geometry: &Geometry) -> Option<Bounds> {
        match &geometry.value {
            Value::Point(c) => Bounds::point(c),
            Value::MultiPoint(coords) | Value::LineString(coords) => Bounds::of_positions(coords),
            Value::MultiLineString(lines) | Value::Polygon(lines) => {
                Bounds::of_positions(lines.iter().flatten())
            }
            Value::MultiPolygon(polygons) => {
                Bounds::of_positions(polygons.iter().flatten().flatten())
            }
            Value::GeometryCollection(geometries) => geometries
                .iter()
                .filter_map(Bounds::of_geometry)
                .reduce(Bounds::union),
        }
    }

    /// Pads each side by `fraction` of the span (at least `min_span`) and
    /// clamps to valid lon/lat.
    pub fn padded(self, fraction: f64, min_span: f64) -> Bounds {
        let lon_pad = (self.max_lon - self.min_lon).max(min_span) * fraction;
        let lat_pad = (self.max_lat - self.min_lat).max(min_span) * fraction;
        Bounds {
            min_lon: (self.min_lon - lon_pad).max(-180.0),
            min_lat: (self.min_lat - lat_pad).max(-90.0),
            max_lon: (self.max_lon + lon_pad).min(180.0),
            max_lat: (self.max_lat + lat_pad).min(90.0),
        }
    }

    /// Square window of `half_span` degrees around a [lat, lon] center.
    pub fn around(center: [f64; 2], half_span: f64) -> Bounds {
        let [lat, lon] = center;
        Bounds {
            min_lon: lon - half_span,
            min_lat: lat - half_span,
            max_lon: lon + half_span,
            max_lat: lat + half_span,
        }
    }
}
