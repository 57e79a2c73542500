// error.rs

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed GeoJSON in {path:?}")]
    GeoJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path:?} is a bare geometry, expected a FeatureCollection or Feature")]
    UnsupportedRoot { path: PathBuf },
    #[error("invalid config file {path:?}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("map rendering failed: {0}")]
    Render(String),
    #[error("invalid output filename {0:?}: must end with .png, .jpg, .jpeg, or .bmp")]
    InvalidOutput(String),
}
