// config.rs

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DashboardError, Result};

const GEOJSON_DIR: &str = "data/geojson/";
const OUTPUT_DIR: &str = "output/";

/// Top-level dashboard configuration. Every section falls back to the
/// Pune district defaults, so a config file only has to name what differs.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub sources: Sources,
    pub fields: FieldNames,
    pub map: MapSettings,
}

/// Where the four datasets live. File names are resolved against `data_dir`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct Sources {
    pub data_dir: PathBuf,
    pub roads: PathBuf,
    pub habitations: PathBuf,
    pub blocks: PathBuf,
    pub arterial: Option<PathBuf>,
}

impl Default for Sources {
    fn default() -> Self {
        Sources {
            data_dir: PathBuf::from(GEOJSON_DIR),
            roads: PathBuf::from("Pune_Roads_Web.geojson"),
            habitations: PathBuf::from("Pune_Hab_Web.geojson"),
            blocks: PathBuf::from("Pune_Taluka_Web.geojson"),
            arterial: Some(PathBuf::from("Pune_PWD_Web.geojson")),
        }
    }
}

impl Sources {
    pub fn roads_path(&self) -> PathBuf {
        self.data_dir.join(&self.roads)
    }

    pub fn habitations_path(&self) -> PathBuf {
        self.data_dir.join(&self.habitations)
    }

    pub fn blocks_path(&self) -> PathBuf {
        self.data_dir.join(&self.blocks)
    }

    /// The arterial layer is optional twice over: it may be unconfigured,
    /// or configured but missing on disk.
    pub fn arterial_path(&self) -> Option<PathBuf> {
        self.arterial
            .as_ref()
            .map(|name| self.data_dir.join(name))
            .filter(|path| path.is_file())
    }
}

/// Attribute names as they appear in the source GeoJSON properties.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FieldNames {
    pub road_name: String,
    pub road_scheme: String,
    /// Truncated shapefile spelling of `road_scheme`, renamed on load.
    pub road_scheme_legacy: String,
    pub road_unit: String,
    pub road_class: String,
    pub road_habitation: String,
    pub road_population: String,

    pub hab_name: String,
    pub hab_unit: String,
    pub hab_population: String,

    pub block_name: String,

    pub arterial_number: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        FieldNames {
            road_name: "Name".to_string(),
            road_scheme: "Scheme_Type".to_string(),
            road_scheme_legacy: "Scheme_Typ".to_string(),
            road_unit: "THENAME".to_string(),
            road_class: "Start_From".to_string(),
            road_habitation: "Connected_".to_string(),
            road_population: "Connecte_1".to_string(),

            hab_name: "HAB_NAME".to_string(),
            hab_unit: "THENAME".to_string(),
            hab_population: "TOT_POPULA".to_string(),

            block_name: "THENAME".to_string(),

            arterial_number: "ROAD_NO".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapSettings {
    /// [lat, lon] shown when no layer has any geometry.
    pub center: [f64; 2],
    pub width: u32,
    pub height: u32,
    pub output_dir: PathBuf,
    pub output_filename: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        MapSettings {
            center: [18.5204, 73.8567],
            width: 1400,
            height: 700,
            output_dir: PathBuf::from(OUTPUT_DIR),
            output_filename: String::from("road_map.png"),
        }
    }
}

impl DashboardConfig {
    /// Reads a JSON config file, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(DashboardConfig::default());
        };
        let text = fs::read_to_string(path).map_err(|source| DashboardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| DashboardError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
