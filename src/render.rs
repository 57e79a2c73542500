// render.rs

use std::path::{Path, PathBuf};

use geojson::{Geometry, Value};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use tracing::{debug, info};

use crate::config::MapSettings;
use crate::error::{DashboardError, Result};
use crate::layers::{Bounds, MapView};
use crate::style::{MapColor, Style};

const PADDING_FRACTION: f64 = 0.1;
const MIN_SPAN_DEG: f64 = 0.001;
const EMPTY_HALF_SPAN_DEG: f64 = 0.5;
const IMAGE_EXTENSIONS: [&str; 4] = [".png", ".jpg", ".jpeg", ".bmp"];

type MapChart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

impl From<MapColor> for RGBColor {
    fn from(color: MapColor) -> Self {
        let (r, g, b) = color.rgb();
        RGBColor(r, g, b)
    }
}

fn render_err<E: std::fmt::Display>(err: E) -> DashboardError {
    DashboardError::Render(err.to_string())
}

/// Output names must carry an image extension plotters can encode.
pub fn validate_output_filename(name: &str) -> Result<()> {
    if !name.is_empty() && IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
        Ok(())
    } else {
        Err(DashboardError::InvalidOutput(name.to_string()))
    }
}

pub fn output_path(settings: &MapSettings, filename: &str) -> PathBuf {
    settings.output_dir.join(filename)
}

/// Visible-layer extent with padding, or a fixed window around the
/// configured center when nothing visible has geometry.
pub fn viewport(view: &MapView<'_>, settings: &MapSettings) -> Bounds {
    view.bounds()
        .map(|b| b.padded(PADDING_FRACTION, MIN_SPAN_DEG))
        .unwrap_or_else(|| Bounds::around(settings.center, EMPTY_HALF_SPAN_DEG))
}

/// Draws every visible layer, bottom to top, into an image at `path`.
pub fn render_png(view: &MapView<'_>, path: &Path, settings: &MapSettings) -> Result<()> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    validate_output_filename(name)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DashboardError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let bounds = viewport(view, settings);
    debug!(?bounds, "map viewport");

    let root = BitMapBackend::new(path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let caption = format!(
        "Roads: {} | Connected population: {}",
        view.summary.road_count, view.summary.population
    );
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(&caption, ("sans-serif", 28).into_font())
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(bounds.min_lon..bounds.max_lon, bounds.min_lat..bounds.max_lat)
        .map_err(render_err)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .draw()
        .map_err(render_err)?;

    let mut drawn = 0;
    for layer in view.visible_layers() {
        for feature in &layer.features {
            draw_geometry(&mut chart, feature.geometry, feature.style)?;
        }
        drawn += layer.features.len();
        debug!(layer = layer.name(), features = layer.features.len(), "layer drawn");
    }

    root.present().map_err(render_err)?;
    info!(path = %path.display(), features = drawn, "map exported");
    Ok(())
}

fn draw_line(chart: &mut MapChart<'_, '_>, coords: &[Vec<f64>], style: Style) -> Result<()> {
    let color: RGBColor = style.color.into();
    chart
        .draw_series(LineSeries::new(
            coords
                .iter()
                .filter(|c| c.len() >= 2)
                .map(|c| (c[0], c[1])),
            color.stroke_width(style.weight),
        ))
        .map_err(render_err)?;
    Ok(())
}

fn draw_points(chart: &mut MapChart<'_, '_>, coords: &[Vec<f64>], style: Style) -> Result<()> {
    let color: RGBColor = style.color.into();
    chart
        .draw_series(
            coords
                .iter()
                .filter(|c| c.len() >= 2)
                .map(|c| Circle::new((c[0], c[1]), style.weight, color.filled())),
        )
        .map_err(render_err)?;
    Ok(())
}

fn draw_geometry(chart: &mut MapChart<'_, '_>, geometry: &Geometry, style: Style) -> Result<()> {
    match &geometry.value {
        Value::Point(c) => draw_points(chart, std::slice::from_ref(c), style),
        Value::MultiPoint(coords) => draw_points(chart, coords, style),
        Value::LineString(line) => draw_line(chart, line, style),
        Value::MultiLineString(lines) => {
            for line in lines {
                draw_line(chart, line, style)?;
            }
            Ok(())
        }
        // polygons are outlined by their exterior ring, never filled
        Value::Polygon(rings) => match rings.first() {
            Some(exterior) => draw_line(chart, exterior, style),
            None => Ok(()),
        },
        Value::MultiPolygon(polygons) => {
            for exterior in polygons.iter().filter_map(|rings| rings.first()) {
                draw_line(chart, exterior, style)?;
            }
            Ok(())
        }
        Value::GeometryCollection(geometries) => {
            for inner in geometries {
                draw_geometry(chart, inner, style)?;
            }
            Ok(())
        }
    }
}
