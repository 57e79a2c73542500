// app.rs

use anyhow::Context;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tracing::{error, info, warn};

use crate::cache::DatasetCache;
use crate::config::DashboardConfig;
use crate::filter::{Dimension, FilterPipeline};
use crate::layers::{LayerKind, LayerVisibility, MapView, compose};
use crate::loader::{Dataset, load_dataset};
use crate::model::RoadRecord;
use crate::render::{output_path, render_png, validate_output_filename};

#[derive(Debug, PartialEq)]
pub enum CurrentScreen {
    Dashboard,
    Help,
}

#[derive(Debug, PartialEq)]
pub enum AppMode {
    Navigation,
    EditingFilename,
}

#[derive(Debug, Clone, Copy)]
pub enum TerminalEvent {
    Resize,
}

/// Which list the cursor keys drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Filter(Dimension),
    Roads,
}

impl Focus {
    const CYCLE: [Focus; 4] = [
        Focus::Filter(Dimension::AdminUnit),
        Focus::Filter(Dimension::Scheme),
        Focus::Filter(Dimension::Classification),
        Focus::Roads,
    ];

    fn position(self) -> usize {
        Focus::CYCLE.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn next(self) -> Focus {
        Focus::CYCLE[(self.position() + 1) % Focus::CYCLE.len()]
    }

    fn previous(self) -> Focus {
        Focus::CYCLE[(self.position() + Focus::CYCLE.len() - 1) % Focus::CYCLE.len()]
    }
}

const DEFAULT_NOTIFICATION: &str = "Filter roads by taluka, scheme and connecting road:";

pub struct App {
    pub current_screen: CurrentScreen,
    pub current_mode: AppMode,
    pub config: DashboardConfig,
    cache: DatasetCache<Dataset>,

    // Filter state
    pub pipeline: FilterPipeline,
    pub focus: Focus,
    pub option_cursors: [usize; 3],
    pub road_cursor: usize,

    // Layer control
    pub visibility: LayerVisibility,

    // Output filename editing
    pub output_filename_buffer: String,
    /// Character index into `output_filename_buffer`.
    pub output_filename_cursor: usize,
    pub previous_output_filename_buffer: String,

    // UI related
    pub notification: String,
    pub help_keybinds: Vec<String>,

    // Resizing for the filter pane
    pub left_pane_width_percentage: u16,
    pub is_resizing: bool,
    pub divider_x: u16,
    pub should_quit: bool,
    /// Set when a reload fails; the session ends and the error is reported.
    fatal: Option<anyhow::Error>,
}

fn dimension_slot(dimension: Dimension) -> usize {
    match dimension {
        Dimension::AdminUnit => 0,
        Dimension::Scheme => 1,
        Dimension::Classification => 2,
    }
}

impl App {
    pub fn new(config: DashboardConfig) -> App {
        let output_filename_buffer = config.map.output_filename.clone();
        App {
            current_screen: CurrentScreen::Dashboard,
            current_mode: AppMode::Navigation,
            config,
            cache: DatasetCache::new(),

            pipeline: FilterPipeline::standard(),
            focus: Focus::Filter(Dimension::AdminUnit),
            option_cursors: [0; 3],
            road_cursor: 0,

            visibility: LayerVisibility::default(),

            output_filename_cursor: output_filename_buffer.chars().count(),
            output_filename_buffer,
            previous_output_filename_buffer: String::new(),

            notification: String::from(DEFAULT_NOTIFICATION),
            help_keybinds: vec![
                "Tab/Shift-Tab: Move between lists".to_string(),
                "J/K or Arrow Keys: Move within a list".to_string(),
                "Space: Toggle option".to_string(),
                "A: Select all / clear list".to_string(),
                "1-4: Toggle map layers".to_string(),
                "Enter: Export map image".to_string(),
                "R: Rename output image".to_string(),
                "F5: Reload data".to_string(),
                "Q: Quit the application".to_string(),
                "H: Show Help screen".to_string(),
                "Click & Drag Divider: Resize panels".to_string(),
            ],

            left_pane_width_percentage: 35,
            is_resizing: false,
            divider_x: 0,
            should_quit: false,
            fatal: None,
        }
    }

    /// Builds an app around an already-loaded dataset.
    pub fn with_dataset(config: DashboardConfig, dataset: Dataset) -> App {
        let mut app = App::new(config);
        let sources = app.config.sources.clone();
        if app.cache.get_or_load(&sources, |_| Ok(dataset)).is_ok() {
            app.refresh();
        }
        app
    }

    /// Loads the configured sources through the cache, then re-runs the filters.
    pub fn load(&mut self) -> anyhow::Result<()> {
        let fields = &self.config.fields;
        self.cache
            .get_or_load(&self.config.sources, |sources| load_dataset(sources, fields))
            .context("failed to load road network data")?;
        self.refresh();
        Ok(())
    }

    pub fn reload(&mut self) -> anyhow::Result<()> {
        self.cache.invalidate();
        self.load()?;
        self.notification = match self.dataset() {
            Some(dataset) => format!(
                "Reloaded {} roads at {}",
                dataset.roads.len(),
                dataset.loaded_at.format("%H:%M:%S")
            ),
            None => String::from("Reload produced no data"),
        };
        Ok(())
    }

    /// The load failure that ended the session, if any.
    pub fn take_fatal(&mut self) -> Option<anyhow::Error> {
        self.fatal.take()
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.cache.peek(&self.config.sources)
    }

    /// Re-runs the cascade so every list offers the right options, then
    /// keeps the cursors inside them.
    pub fn refresh(&mut self) {
        let Some(dataset) = self.cache.peek(&self.config.sources) else {
            return;
        };
        let cascade = self.pipeline.sync(&dataset.roads.records);
        for dimension in Dimension::ORDER {
            let len = cascade.offered(dimension).len();
            let cursor = &mut self.option_cursors[dimension_slot(dimension)];
            *cursor = (*cursor).min(len.saturating_sub(1));
        }
        self.road_cursor = self.road_cursor.min(cascade.roads().len().saturating_sub(1));
    }

    pub fn offered(&self, dimension: Dimension) -> &[String] {
        self.pipeline
            .stage(dimension)
            .map(|stage| stage.offered())
            .unwrap_or(&[])
    }

    pub fn option_cursor(&self, dimension: Dimension) -> usize {
        self.option_cursors[dimension_slot(dimension)]
    }

    /// Layers and summary for the current selections.
    pub fn view(&self) -> Option<MapView<'_>> {
        let dataset = self.dataset()?;
        let cascade = self.pipeline.evaluate(&dataset.roads.records);
        Some(compose(dataset, &cascade, &self.config.fields, &self.visibility))
    }

    /// Roads passing every filter, in source order.
    pub fn filtered_roads(&self) -> Vec<&RoadRecord> {
        match self.dataset() {
            Some(dataset) => self.pipeline.evaluate(&dataset.roads.records).roads().to_vec(),
            None => Vec::new(),
        }
    }

    fn focused_len(&self) -> usize {
        match self.focus {
            Focus::Filter(dimension) => self.offered(dimension).len(),
            Focus::Roads => self.filtered_roads().len(),
        }
    }

    fn move_cursor(&mut self, down: bool) {
        let len = self.focused_len();
        let cursor = match self.focus {
            Focus::Filter(dimension) => &mut self.option_cursors[dimension_slot(dimension)],
            Focus::Roads => &mut self.road_cursor,
        };
        if down {
            if *cursor + 1 < len {
                *cursor += 1;
            }
        } else {
            *cursor = cursor.saturating_sub(1);
        }
    }

    fn toggle_option_at_cursor(&mut self) {
        let Focus::Filter(dimension) = self.focus else {
            return;
        };
        let Some(value) = self.offered(dimension).get(self.option_cursor(dimension)).cloned() else {
            return;
        };
        self.pipeline.toggle(dimension, &value);
        self.refresh();
        self.notify_summary();
    }

    fn toggle_all_in_focus(&mut self) {
        let Focus::Filter(dimension) = self.focus else {
            return;
        };
        self.pipeline.toggle_all(dimension);
        self.refresh();
        self.notify_summary();
    }

    fn notify_summary(&mut self) {
        if let Some(summary) = self.view().map(|view| view.summary) {
            self.notification = format!(
                "{} roads selected, connected population {}",
                summary.road_count, summary.population
            );
        }
    }

    fn toggle_layer(&mut self, slot: usize) {
        let Some(kind) = LayerKind::ALL.get(slot).copied() else {
            return;
        };
        let shown = self.visibility.toggle(kind);
        self.notification = format!(
            "{} layer {}",
            kind.name(),
            if shown { "shown" } else { "hidden" }
        );
    }

    /// Writes the current map to the output directory.
    pub fn export(&mut self) -> anyhow::Result<()> {
        let path = output_path(&self.config.map, &self.output_filename_buffer);
        let view = self.view().context("no data loaded")?;
        render_png(&view, &path, &self.config.map)
            .with_context(|| format!("failed to export {}", path.display()))?;
        self.notification = format!("Map exported to {}", path.display());
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.current_mode {
            AppMode::Navigation => self.handle_navigation_key(key),
            AppMode::EditingFilename => self.handle_filename_key(key),
        }
    }

    fn handle_navigation_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.current_screen == CurrentScreen::Help {
            match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                _ => self.current_screen = CurrentScreen::Dashboard,
            }
            return;
        }
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                self.notification = String::from("Exiting...");
            }
            KeyCode::Char('h') => self.current_screen = CurrentScreen::Help,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(true),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(false),
            KeyCode::Char(' ') => self.toggle_option_at_cursor(),
            KeyCode::Char('a') => self.toggle_all_in_focus(),
            KeyCode::Char(c @ '1'..='4') => self.toggle_layer(c as usize - '1' as usize),
            KeyCode::Char('r') => {
                self.previous_output_filename_buffer
                    .clone_from(&self.output_filename_buffer);
                self.output_filename_cursor = self.output_filename_buffer.chars().count();
                self.current_mode = AppMode::EditingFilename;
                self.notification = String::from("Editing output filename (Enter to save, Esc to cancel)");
            }
            KeyCode::Enter => {
                if let Err(err) = self.export() {
                    warn!("{err:#}");
                    self.notification = format!("Export failed: {err:#}");
                }
            }
            KeyCode::F(5) => {
                if let Err(err) = self.reload() {
                    error!("{err:#}");
                    self.notification = format!("Reload failed: {err:#}");
                    self.should_quit = true;
                    self.fatal = Some(err);
                }
            }
            KeyCode::Char(other) => {
                self.notification = format!("Unknown key: {}", other);
            }
            _ => {}
        }
    }

    fn handle_filename_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                match validate_output_filename(&self.output_filename_buffer) {
                    Ok(()) => {
                        self.notification =
                            format!("Output filename set to: {}", self.output_filename_buffer);
                    }
                    Err(err) => {
                        self.notification = format!("{err}. Reverted.");
                        self.output_filename_buffer
                            .clone_from(&self.previous_output_filename_buffer);
                    }
                }
                self.current_mode = AppMode::Navigation;
            }
            KeyCode::Esc => {
                self.output_filename_buffer
                    .clone_from(&self.previous_output_filename_buffer);
                self.notification = String::from("Filename editing cancelled. Reverted to previous.");
                self.current_mode = AppMode::Navigation;
            }
            KeyCode::Backspace => {
                if self.output_filename_cursor > 0 {
                    self.output_filename_cursor -= 1;
                    let at = self.filename_byte_offset();
                    self.output_filename_buffer.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.output_filename_cursor < self.output_filename_buffer.chars().count() {
                    let at = self.filename_byte_offset();
                    self.output_filename_buffer.remove(at);
                }
            }
            KeyCode::Left => self.output_filename_cursor = self.output_filename_cursor.saturating_sub(1),
            KeyCode::Right => {
                self.output_filename_cursor =
                    (self.output_filename_cursor + 1).min(self.output_filename_buffer.chars().count());
            }
            KeyCode::Char(c) if !c.is_control() => {
                let at = self.filename_byte_offset();
                self.output_filename_buffer.insert(at, c);
                self.output_filename_cursor += 1;
            }
            _ => {}
        }
    }

    /// Byte position of the filename cursor, which counts characters.
    fn filename_byte_offset(&self) -> usize {
        self.output_filename_buffer
            .char_indices()
            .nth(self.output_filename_cursor)
            .map_or(self.output_filename_buffer.len(), |(at, _)| at)
    }

    /// Drag the divider to resize the filter pane. `width` is the terminal width.
    pub fn handle_mouse(&mut self, mouse: MouseEvent, width: u16) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.is_resizing = mouse.column.abs_diff(self.divider_x) <= 1;
            }
            MouseEventKind::Drag(MouseButton::Left) if self.is_resizing && width > 0 => {
                let percentage = (u32::from(mouse.column) * 100 / u32::from(width)) as u16;
                self.left_pane_width_percentage = percentage.clamp(20, 80);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if self.is_resizing {
                    info!(percentage = self.left_pane_width_percentage, "filter pane resized");
                }
                self.is_resizing = false;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HabitationRecord, Table};
    use chrono::Local;
    use std::collections::BTreeSet;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn dataset() -> Dataset {
        let road = |unit: &str, scheme: &str, class: &str, pop: f64| RoadRecord {
            unit: Some(unit.into()),
            scheme: Some(scheme.into()),
            classification: Some(class.into()),
            population: Some(pop),
            ..RoadRecord::default()
        };
        let columns: BTreeSet<String> = ["THENAME", "Scheme_Type", "Start_From", "Connecte_1"]
            .into_iter()
            .map(String::from)
            .collect();
        Dataset {
            roads: Table::new(
                vec![
                    road("Haveli", "PMGSY", "SH", 1200.0),
                    road("Haveli", "MMGSY", "ODR", 300.0),
                    road("Haveli", "Proposed", "MDR", 80.0),
                    road("Junnar", "PMGSY", "NH", 640.0),
                ],
                columns,
            ),
            habitations: Table::<HabitationRecord>::default(),
            blocks: Table::default(),
            arterial: None,
            loaded_at: Local::now(),
        }
    }

    fn app() -> App {
        App::with_dataset(DashboardConfig::default(), dataset())
    }

    #[test]
    fn starts_with_first_unit_and_everything_else() {
        let app = app();
        let summary = app.view().unwrap().summary;
        assert_eq!(summary.road_count, 3);
        assert_eq!(summary.population, 1580);
    }

    #[test]
    fn clearing_scheme_empties_the_map() {
        let mut app = app();
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Filter(Dimension::Scheme));
        app.handle_key(key(KeyCode::Char('a')));
        let summary = app.view().unwrap().summary;
        assert_eq!(summary.road_count, 0);
        assert_eq!(summary.population, 0);
        assert!(app.offered(Dimension::Classification).is_empty());
    }

    #[test]
    fn toggling_a_scheme_updates_counts() {
        let mut app = app();
        app.handle_key(key(KeyCode::Tab));
        // options are MMGSY, PMGSY, Proposed; cursor on MMGSY
        app.handle_key(key(KeyCode::Char(' ')));
        let summary = app.view().unwrap().summary;
        assert_eq!(summary.road_count, 2);
        assert_eq!(summary.population, 1280);
        assert!(app.notification.contains("2 roads"));
    }

    #[test]
    fn switching_unit_resets_downstream_lists() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(app.offered(Dimension::Scheme), ["PMGSY"]);
        let summary = app.view().unwrap().summary;
        assert_eq!(summary.road_count, 1);
        assert_eq!(summary.population, 640);
    }

    #[test]
    fn cursor_stays_inside_list() {
        let mut app = app();
        for _ in 0..10 {
            app.handle_key(key(KeyCode::Down));
        }
        assert_eq!(app.option_cursor(Dimension::AdminUnit), 1);
        for _ in 0..10 {
            app.handle_key(key(KeyCode::Up));
        }
        assert_eq!(app.option_cursor(Dimension::AdminUnit), 0);
    }

    #[test]
    fn layer_hotkeys_toggle_visibility() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('2')));
        assert!(app.visibility.is_visible(LayerKind::Arterial));
        app.handle_key(key(KeyCode::Char('3')));
        assert!(!app.visibility.is_visible(LayerKind::Roads));
    }

    #[test]
    fn filename_edit_rejects_bad_extension() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('r')));
        assert_eq!(app.current_mode, AppMode::EditingFilename);
        for _ in 0..3 {
            app.handle_key(key(KeyCode::Backspace));
        }
        for c in "svg".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(app.output_filename_buffer, "road_map.svg");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.current_mode, AppMode::Navigation);
        assert_eq!(app.output_filename_buffer, "road_map.png");
    }

    #[test]
    fn filename_edit_steps_over_multibyte_chars() {
        let mut config = DashboardConfig::default();
        config.map.output_filename = String::from("नकाशा.png");
        let mut app = App::with_dataset(config, dataset());
        app.handle_key(key(KeyCode::Char('r')));
        for _ in 0..4 {
            app.handle_key(key(KeyCode::Left));
        }
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.output_filename_buffer, "नकाश.png");
        app.handle_key(key(KeyCode::Char('_')));
        app.handle_key(key(KeyCode::Delete));
        assert_eq!(app.output_filename_buffer, "नकाश_png");
        app.handle_key(key(KeyCode::Char('.')));
        assert_eq!(app.output_filename_buffer, "नकाश_.png");
        for _ in 0..20 {
            app.handle_key(key(KeyCode::Right));
        }
        assert_eq!(app.output_filename_cursor, app.output_filename_buffer.chars().count());
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.output_filename_buffer, "नकाश_.png");
    }

    fn write_layers(dir: &std::path::Path) -> DashboardConfig {
        let collection = |features: &str| format!(r#"{{"type": "FeatureCollection", "features": [{features}]}}"#);
        let road = r#"{"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[73.8, 18.5], [73.9, 18.6]]},
            "properties": {"THENAME": "Haveli", "Scheme_Type": "PMGSY", "Start_From": "SH", "Connecte_1": 10}}"#;
        std::fs::write(dir.join("roads.geojson"), collection(road)).unwrap();
        std::fs::write(dir.join("habs.geojson"), collection("")).unwrap();
        std::fs::write(dir.join("blocks.geojson"), collection("")).unwrap();

        let mut config = DashboardConfig::default();
        config.sources.data_dir = dir.to_path_buf();
        config.sources.roads = "roads.geojson".into();
        config.sources.habitations = "habs.geojson".into();
        config.sources.blocks = "blocks.geojson".into();
        config.sources.arterial = None;
        config
    }

    #[test]
    fn reload_picks_up_changed_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut app = App::new(write_layers(dir.path()));
        app.load().unwrap();
        assert_eq!(app.dataset().unwrap().roads.len(), 1);

        std::fs::write(
            dir.path().join("roads.geojson"),
            r#"{"type": "FeatureCollection", "features": []}"#,
        )
        .unwrap();
        app.handle_key(key(KeyCode::F(5)));
        assert!(!app.should_quit);
        assert!(app.take_fatal().is_none());
        assert_eq!(app.dataset().unwrap().roads.len(), 0);
    }

    #[test]
    fn failed_reload_ends_the_session() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut app = App::new(write_layers(dir.path()));
        app.load().unwrap();

        std::fs::remove_file(dir.path().join("roads.geojson")).unwrap();
        app.handle_key(key(KeyCode::F(5)));
        assert!(app.should_quit);
        let err = app.take_fatal().expect("reload error kept for the caller");
        let io = err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<crate::error::DashboardError>(),
                Some(crate::error::DashboardError::Io { .. })
            )
        });
        assert!(io, "{err:#}");
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);

        let mut app = self::app();
        app.handle_key(key(KeyCode::Char('h')));
        assert_eq!(app.current_screen, CurrentScreen::Help);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.current_screen, CurrentScreen::Dashboard);
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
