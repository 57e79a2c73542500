// loader.rs

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use geojson::{Feature, FeatureCollection, GeoJson};
use tracing::{debug, info};

use crate::config::{FieldNames, Sources};
use crate::error::{DashboardError, Result};
use crate::model::{ArterialRecord, BlockRecord, HabitationRecord, RoadRecord, Table};

/// Everything one dashboard session renders from. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub roads: Table<RoadRecord>,
    pub habitations: Table<HabitationRecord>,
    pub blocks: Table<BlockRecord>,
    pub arterial: Option<Table<ArterialRecord>>,
    pub loaded_at: DateTime<Local>,
}

pub fn read_geojson(filepath: &Path) -> Result<GeoJson> {
    let file = fs::File::open(filepath).map_err(|source| DashboardError::Io {
        path: filepath.to_path_buf(),
        source,
    })?;
    parse_geojson(io::BufReader::new(file), filepath)
}

pub fn parse_geojson<R: Read>(reader: R, origin: &Path) -> Result<GeoJson> {
    GeoJson::from_reader(reader).map_err(|source| DashboardError::GeoJson {
        path: origin.to_path_buf(),
        source,
    })
}

/// Flattens a GeoJSON root into its features. A bare geometry carries no
/// attributes, so it cannot feed any of the record tables.
pub fn into_features(geojson: GeoJson, origin: &Path) -> Result<Vec<Feature>> {
    match geojson {
        GeoJson::FeatureCollection(FeatureCollection { features, .. }) => Ok(features),
        GeoJson::Feature(feature) => Ok(vec![feature]),
        GeoJson::Geometry(_) => Err(DashboardError::UnsupportedRoot {
            path: origin.to_path_buf(),
        }),
    }
}

/// Renames attribute `from` to `to` on every feature that carries it.
/// An existing `to` value on the same feature wins. Silent when absent.
pub fn rename_column(features: &mut [Feature], from: &str, to: &str) -> usize {
    let mut renamed = 0;
    for properties in features.iter_mut().filter_map(|f| f.properties.as_mut()) {
        if let Some(value) = properties.remove(from) {
            properties.entry(to.to_string()).or_insert(value);
            renamed += 1;
        }
    }
    renamed
}

fn column_names(features: &[Feature]) -> BTreeSet<String> {
    features
        .iter()
        .filter_map(|f| f.properties.as_ref())
        .flat_map(|p| p.keys().cloned())
        .collect()
}

fn build_table<T>(features: Vec<Feature>, convert: impl Fn(Feature) -> T) -> Table<T> {
    let columns = column_names(&features);
    let records = features.into_iter().map(convert).collect();
    Table::new(records, columns)
}

pub fn roads_from_features(mut features: Vec<Feature>, fields: &FieldNames) -> Table<RoadRecord> {
    let renamed = rename_column(&mut features, &fields.road_scheme_legacy, &fields.road_scheme);
    if renamed > 0 {
        debug!(
            renamed,
            from = %fields.road_scheme_legacy,
            to = %fields.road_scheme,
            "normalized truncated scheme column"
        );
    }
    build_table(features, |f| RoadRecord::from_feature(f, fields))
}

pub fn habitations_from_features(features: Vec<Feature>, fields: &FieldNames) -> Table<HabitationRecord> {
    build_table(features, |f| HabitationRecord::from_feature(f, fields))
}

pub fn blocks_from_features(features: Vec<Feature>, fields: &FieldNames) -> Table<BlockRecord> {
    build_table(features, |f| BlockRecord::from_feature(f, fields))
}

pub fn arterial_from_features(features: Vec<Feature>, fields: &FieldNames) -> Table<ArterialRecord> {
    build_table(features, |f| ArterialRecord::from_feature(f, fields))
}

fn load_features(path: &Path) -> Result<Vec<Feature>> {
    let geojson = read_geojson(path)?;
    let features = into_features(geojson, path)?;
    debug!(path = %path.display(), features = features.len(), "read features");
    Ok(features)
}

/// Reads all configured sources. Any unreadable or malformed file aborts
/// the whole load.
pub fn load_dataset(sources: &Sources, fields: &FieldNames) -> Result<Dataset> {
    let roads = roads_from_features(load_features(&sources.roads_path())?, fields);
    let habitations = habitations_from_features(load_features(&sources.habitations_path())?, fields);
    let blocks = blocks_from_features(load_features(&sources.blocks_path())?, fields);
    let arterial = match sources.arterial_path() {
        Some(path) => Some(arterial_from_features(load_features(&path)?, fields)),
        None => None,
    };

    info!(
        roads = roads.len(),
        habitations = habitations.len(),
        blocks = blocks.len(),
        arterial = arterial.as_ref().map_or(0, Table::len),
        "dataset loaded"
    );

    Ok(Dataset {
        roads,
        habitations,
        blocks,
        arterial,
        loaded_at: Local::now(),
    })
}

/// File name and feature count per source, for the sources panel.
pub fn describe_sources(sources: &Sources, dataset: &Dataset) -> Vec<(PathBuf, usize)> {
    let mut described = vec![
        (sources.roads.clone(), dataset.roads.len()),
        (sources.habitations.clone(), dataset.habitations.len()),
        (sources.blocks.clone(), dataset.blocks.len()),
    ];
    if let (Some(name), Some(arterial)) = (&sources.arterial, &dataset.arterial) {
        described.push((name.clone(), arterial.len()));
    }
    described
}
