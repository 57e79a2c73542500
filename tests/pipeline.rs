use std::fs;
use std::path::Path;

use road_dashboard::DashboardError;
use road_dashboard::aggregate::Summary;
use road_dashboard::config::{FieldNames, Sources};
use road_dashboard::filter::{Dimension, FilterPipeline};
use road_dashboard::layers::{LayerKind, LayerVisibility, compose};
use road_dashboard::loader::load_dataset;
use road_dashboard::report::Report;
use tempfile::TempDir;

/// Roads still carry the truncated `Scheme_Typ` column; one Haveli PMGSY
/// road has no population value.
const ROADS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature",
     "geometry": {"type": "LineString", "coordinates": [[73.80, 18.50], [73.82, 18.52]]},
     "properties": {"Name": "R1", "Scheme_Typ": "PMGSY", "THENAME": "Haveli", "Start_From": "SH", "Connected_": "Wagholi", "Connecte_1": 1200.7}},
    {"type": "Feature",
     "geometry": {"type": "LineString", "coordinates": [[73.83, 18.51], [73.85, 18.53]]},
     "properties": {"Name": "R2", "Scheme_Typ": "PMGSY", "THENAME": "Haveli", "Start_From": "ODR", "Connected_": "Lonikand", "Connecte_1": 300}},
    {"type": "Feature",
     "geometry": {"type": "LineString", "coordinates": [[73.86, 18.54], [73.88, 18.55]]},
     "properties": {"Name": "R3", "Scheme_Typ": "MMGSY", "THENAME": "Haveli", "Start_From": "MDR", "Connected_": "Uruli", "Connecte_1": 500}},
    {"type": "Feature",
     "geometry": {"type": "LineString", "coordinates": [[73.50, 18.60], [73.52, 18.61]]},
     "properties": {"Name": "R4", "Scheme_Typ": "Proposed", "THENAME": "Mulshi", "Start_From": "VR", "Connected_": "Paud", "Connecte_1": 50}},
    {"type": "Feature",
     "geometry": {"type": "LineString", "coordinates": [[73.89, 18.56], [73.90, 18.57]]},
     "properties": {"Name": "R5", "Scheme_Typ": "PMGSY", "THENAME": "Haveli", "Start_From": "SH", "Connected_": "Kesnand"}}
  ]
}"#;

const HABITATIONS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature",
     "geometry": {"type": "Point", "coordinates": [73.81, 18.51]},
     "properties": {"HAB_NAME": "Wagholi", "TOT_POPULA": 1200}},
    {"type": "Feature",
     "geometry": {"type": "Point", "coordinates": [73.51, 18.60]},
     "properties": {"HAB_NAME": "Paud", "TOT_POPULA": 50}}
  ]
}"#;

const BLOCKS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature",
     "geometry": {"type": "Polygon", "coordinates": [[[73.7, 18.4], [74.0, 18.4], [74.0, 18.7], [73.7, 18.7], [73.7, 18.4]]]},
     "properties": {"THENAME": "Haveli"}}
  ]
}"#;

fn write_sources(dir: &Path) -> Sources {
    fs::write(dir.join("roads.geojson"), ROADS).unwrap();
    fs::write(dir.join("habs.geojson"), HABITATIONS).unwrap();
    fs::write(dir.join("blocks.geojson"), BLOCKS).unwrap();
    Sources {
        data_dir: dir.to_path_buf(),
        roads: "roads.geojson".into(),
        habitations: "habs.geojson".into(),
        blocks: "blocks.geojson".into(),
        // configured but absent on disk: the layer is simply skipped
        arterial: Some("pwd.geojson".into()),
    }
}

fn requests(unit: &str, schemes: &[&str]) -> Vec<(Dimension, Vec<String>)> {
    vec![
        (Dimension::AdminUnit, vec![unit.to_string()]),
        (Dimension::Scheme, schemes.iter().map(|s| s.to_string()).collect()),
    ]
}

#[test]
fn haveli_pmgsy_totals() {
    let dir = TempDir::new().unwrap();
    let sources = write_sources(dir.path());
    let fields = FieldNames::default();
    let dataset = load_dataset(&sources, &fields).unwrap();

    assert_eq!(dataset.roads.len(), 5);
    assert!(dataset.roads.has_column("Scheme_Type"));
    assert!(dataset.arterial.is_none());

    let pipeline = FilterPipeline::from_requests(&dataset.roads.records, &requests("Haveli", &["PMGSY"]));
    let cascade = pipeline.evaluate(&dataset.roads.records);
    assert_eq!(cascade.offered(Dimension::Classification), ["ODR", "SH"]);

    let view = compose(&dataset, &cascade, &fields, &LayerVisibility::default());
    assert_eq!(
        view.summary,
        Summary {
            road_count: 3,
            population: 1500
        }
    );
    assert!(view.layer(LayerKind::Arterial).is_none());
    assert_eq!(view.layer(LayerKind::Boundary).unwrap().features.len(), 1);

    // habitations carry no taluka column, so they are never narrowed
    let report = Report::new(&cascade, &view);
    assert_eq!(report.habitations_shown, 2);
    assert_eq!(report.filters[1].offered, vec!["MMGSY", "PMGSY"]);
}

#[test]
fn cleared_scheme_selection_is_empty() {
    let dir = TempDir::new().unwrap();
    let sources = write_sources(dir.path());
    let fields = FieldNames::default();
    let dataset = load_dataset(&sources, &fields).unwrap();

    let mut pipeline = FilterPipeline::from_requests(&dataset.roads.records, &requests("Haveli", &[]));
    pipeline.select(Dimension::Scheme, Vec::<String>::new());
    let cascade = pipeline.sync(&dataset.roads.records);

    assert!(cascade.roads().is_empty());
    assert!(cascade.offered(Dimension::Classification).is_empty());
    let view = compose(&dataset, &cascade, &fields, &LayerVisibility::default());
    assert_eq!(view.summary, Summary::default());
    assert!(view.layer(LayerKind::Roads).unwrap().features.is_empty());
}

#[test]
fn mulshi_offers_only_its_schemes() {
    let dir = TempDir::new().unwrap();
    let sources = write_sources(dir.path());
    let fields = FieldNames::default();
    let dataset = load_dataset(&sources, &fields).unwrap();

    let pipeline = FilterPipeline::from_requests(&dataset.roads.records, &requests("Mulshi", &[]));
    let cascade = pipeline.evaluate(&dataset.roads.records);
    assert_eq!(cascade.offered(Dimension::Scheme), ["Proposed"]);
    let view = compose(&dataset, &cascade, &fields, &LayerVisibility::default());
    assert_eq!(view.summary.road_count, 1);
    assert_eq!(view.summary.population, 50);
}

#[test]
fn missing_required_file_fails_the_load() {
    let dir = TempDir::new().unwrap();
    let mut sources = write_sources(dir.path());
    sources.habitations = "nowhere.geojson".into();

    let err = load_dataset(&sources, &FieldNames::default()).unwrap_err();
    match err {
        DashboardError::Io { path, .. } => assert!(path.ends_with("nowhere.geojson")),
        other => panic!("expected an io error, got {other:?}"),
    }
}

#[test]
fn malformed_file_fails_the_load() {
    let dir = TempDir::new().unwrap();
    let sources = write_sources(dir.path());
    fs::write(dir.path().join("blocks.geojson"), "{ not json").unwrap();

    let err = load_dataset(&sources, &FieldNames::default()).unwrap_err();
    assert!(matches!(err, DashboardError::GeoJson { .. }));
}
