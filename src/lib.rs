//! Rural road connectivity dashboard.
//!
//! Loads road, habitation, block and arterial-network GeoJSON layers, filters
//! roads through a cascading unit → scheme → connecting-road pipeline, styles
//! them by category and reports road counts and connected population, either
//! in an interactive terminal dashboard or as a rendered map image.

pub mod aggregate;
pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod layers;
pub mod loader;
pub mod model;
pub mod render;
pub mod report;
pub mod style;
pub mod ui;

pub use error::{DashboardError, Result};
