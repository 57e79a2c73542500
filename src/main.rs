// main.rs
mod cli;
mod telemetry;

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{info, warn};

use road_dashboard::app::App;
use road_dashboard::config::DashboardConfig;
use road_dashboard::event::{Event, EventHandler};
use road_dashboard::filter::{Dimension, FilterPipeline};
use road_dashboard::layers::{LayerKind, LayerVisibility, compose};
use road_dashboard::loader::{Dataset, load_dataset};
use road_dashboard::render::{output_path, render_png};
use road_dashboard::report::Report;
use road_dashboard::ui;

use crate::cli::{BrowseArgs, Cli, Commands, FilterArgs, RenderArgs};
use crate::telemetry::LogTarget;

const TICK_RATE: Duration = Duration::from_millis(250);

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.sources.data_dir = data_dir;
    }

    match cli.command.unwrap_or(Commands::Browse(BrowseArgs::default())) {
        Commands::Browse(args) => {
            telemetry::init(cli.verbose, LogTarget::File(args.log_file))?;
            browse(config)
        }
        Commands::Summary(filters) => {
            telemetry::init(cli.verbose, LogTarget::Stderr)?;
            summary(&config, &filters)
        }
        Commands::Render(args) => {
            telemetry::init(cli.verbose, LogTarget::Stderr)?;
            render(&config, &args)
        }
    }
}

fn browse(config: DashboardConfig) -> anyhow::Result<()> {
    let mut app = App::new(config);
    // load before taking over the terminal so errors stay readable
    app.load()?;

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> anyhow::Result<()> {
    let events = EventHandler::new(TICK_RATE);
    info!("dashboard started");
    while !app.should_quit {
        terminal.draw(|frame| ui::render(frame, app))?;
        match events.next(TICK_RATE) {
            Ok(Some(Event::Input(key))) => app.handle_key(key),
            Ok(Some(Event::Mouse(mouse))) => {
                let width = terminal.size()?.width;
                app.handle_mouse(mouse, width);
            }
            Ok(Some(Event::Tick | Event::TerminalEvent(_))) | Ok(None) => {}
            Err(err) => {
                warn!("input thread stopped: {err}");
                break;
            }
        }
    }
    info!("dashboard closed");
    match app.take_fatal() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Loads the dataset and applies the command-line selections.
fn filtered(config: &DashboardConfig, filters: &FilterArgs) -> anyhow::Result<(Dataset, FilterPipeline)> {
    let dataset = load_dataset(&config.sources, &config.fields)
        .context("failed to load road network data")?;
    let pipeline = FilterPipeline::from_requests(&dataset.roads.records, &filters.requests());
    if let Some(unit) = &filters.unit {
        let known = pipeline
            .stage(Dimension::AdminUnit)
            .is_some_and(|stage| stage.offered().contains(unit));
        if !known {
            warn!(unit = %unit, "no roads in the requested taluka");
        }
    }
    Ok((dataset, pipeline))
}

fn summary(config: &DashboardConfig, filters: &FilterArgs) -> anyhow::Result<()> {
    let (dataset, pipeline) = filtered(config, filters)?;
    let cascade = pipeline.evaluate(&dataset.roads.records);
    let view = compose(&dataset, &cascade, &config.fields, &LayerVisibility::default());
    let report = Report::new(&cascade, &view);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn render(config: &DashboardConfig, args: &RenderArgs) -> anyhow::Result<()> {
    let (dataset, pipeline) = filtered(config, &args.filters)?;
    let cascade = pipeline.evaluate(&dataset.roads.records);
    let mut visibility = LayerVisibility::default();
    if args.show_pwd != visibility.is_visible(LayerKind::Arterial) {
        visibility.toggle(LayerKind::Arterial);
    }
    let view = compose(&dataset, &cascade, &config.fields, &visibility);

    let path = match &args.output {
        Some(path) => path.clone(),
        None => output_path(&config.map, &config.map.output_filename),
    };
    render_png(&view, &path, &config.map)
        .with_context(|| format!("failed to export {}", path.display()))?;
    println!("{}", path.display());
    Ok(())
}
