// model.rs

use std::collections::BTreeSet;

use geojson::{Feature, Geometry, JsonObject, JsonValue};

use crate::config::FieldNames;

/// Anything that can be drawn on the map: a geometry plus the raw
/// attribute bag tooltips read from.
pub trait MapFeature {
    fn geometry(&self) -> Option<&Geometry>;
    fn properties(&self) -> &JsonObject;
}

/// A set of records plus the attribute names present on any of them.
///
/// The column set mirrors a dataframe built from the features: a key that
/// appears on a single feature is a column for the whole table.
#[derive(Debug, Clone)]
pub struct Table<T> {
    pub records: Vec<T>,
    columns: BTreeSet<String>,
}

impl<T> Table<T> {
    pub fn new(records: Vec<T>, columns: BTreeSet<String>) -> Self {
        Table { records, columns }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Table::new(Vec::new(), BTreeSet::new())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoadRecord {
    pub name: Option<String>,
    pub scheme: Option<String>,
    pub unit: Option<String>,
    pub classification: Option<String>,
    pub habitation: Option<String>,
    pub population: Option<f64>,
    pub geometry: Option<Geometry>,
    pub properties: JsonObject,
}

#[derive(Debug, Clone, Default)]
pub struct HabitationRecord {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub population: Option<f64>,
    pub geometry: Option<Geometry>,
    pub properties: JsonObject,
}

#[derive(Debug, Clone, Default)]
pub struct BlockRecord {
    pub name: Option<String>,
    pub geometry: Option<Geometry>,
    pub properties: JsonObject,
}

#[derive(Debug, Clone, Default)]
pub struct ArterialRecord {
    pub road_number: Option<String>,
    pub geometry: Option<Geometry>,
    pub properties: JsonObject,
}

impl RoadRecord {
    pub fn from_feature(feature: Feature, fields: &FieldNames) -> Self {
        let properties = feature.properties.unwrap_or_default();
        RoadRecord {
            name: text_attr(&properties, &fields.road_name),
            scheme: text_attr(&properties, &fields.road_scheme),
            unit: text_attr(&properties, &fields.road_unit),
            classification: text_attr(&properties, &fields.road_class),
            habitation: text_attr(&properties, &fields.road_habitation),
            population: numeric_attr(&properties, &fields.road_population),
            geometry: feature.geometry,
            properties,
        }
    }
}

impl HabitationRecord {
    pub fn from_feature(feature: Feature, fields: &FieldNames) -> Self {
        let properties = feature.properties.unwrap_or_default();
        HabitationRecord {
            name: text_attr(&properties, &fields.hab_name),
            unit: text_attr(&properties, &fields.hab_unit),
            population: numeric_attr(&properties, &fields.hab_population),
            geometry: feature.geometry,
            properties,
        }
    }
}

impl BlockRecord {
    pub fn from_feature(feature: Feature, fields: &FieldNames) -> Self {
        let properties = feature.properties.unwrap_or_default();
        BlockRecord {
            name: text_attr(&properties, &fields.block_name),
            geometry: feature.geometry,
            properties,
        }
    }
}

impl ArterialRecord {
    pub fn from_feature(feature: Feature, fields: &FieldNames) -> Self {
        let properties = feature.properties.unwrap_or_default();
        ArterialRecord {
            road_number: text_attr(&properties, &fields.arterial_number),
            geometry: feature.geometry,
            properties,
        }
    }
}

macro_rules! impl_map_feature {
    ($($record:ty),*) => {
        $(
            impl MapFeature for $record {
                fn geometry(&self) -> Option<&Geometry> {
                    self.geometry.as_ref()
                }

                fn properties(&self) -> &JsonObject {
                    &self.properties
                }
            }
        )*
    };
}

impl_map_feature!(RoadRecord, HabitationRecord, BlockRecord, ArterialRecord);

/// Categorical attributes are opaque strings. Numbers and booleans are
/// stringified so a numeric road class still filters; null is missing.
pub fn text_attr(properties: &JsonObject, key: &str) -> Option<String> {
    match properties.get(key)? {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Numeric attributes accept JSON numbers or strings that parse as numbers.
pub fn numeric_attr(properties: &JsonObject, key: &str) -> Option<f64> {
    match properties.get(key)? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|value| value.is_finite())
}

/// Display form of an attribute for tooltips. Missing values render empty.
pub fn display_attr(properties: &JsonObject, key: &str) -> String {
    match properties.get(key) {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
