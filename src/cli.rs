use std::path::PathBuf;

use road_dashboard::filter::Dimension;

/// Rural road connectivity dashboard
#[derive(clap::Parser, Debug)]
#[command(name = "road-dashboard", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// JSON settings file; built-in defaults apply when omitted
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Directory holding the GeoJSON layers, overrides the settings file
    #[arg(long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    /// Defaults to `browse`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Interactive terminal dashboard
    Browse(BrowseArgs),

    /// Print road count and connected population as JSON
    Summary(FilterArgs),

    /// Export the filtered map as an image
    Render(RenderArgs),
}

#[derive(clap::Args, Debug)]
pub struct BrowseArgs {
    /// Log file, the terminal is busy drawing the dashboard
    #[arg(long, default_value = "output/road-dashboard.log", value_hint = clap::ValueHint::FilePath)]
    pub log_file: PathBuf,
}

impl Default for BrowseArgs {
    fn default() -> Self {
        BrowseArgs {
            log_file: PathBuf::from("output/road-dashboard.log"),
        }
    }
}

#[derive(clap::Args, Debug, Default)]
pub struct FilterArgs {
    /// Taluka to show, defaults to the first one alphabetically
    #[arg(long)]
    pub unit: Option<String>,

    /// Scheme to keep (repeatable), defaults to all
    #[arg(long = "scheme")]
    pub schemes: Vec<String>,

    /// Connecting road class to keep (repeatable), defaults to all
    #[arg(long = "class")]
    pub classes: Vec<String>,
}

impl FilterArgs {
    pub fn requests(&self) -> Vec<(Dimension, Vec<String>)> {
        vec![
            (Dimension::AdminUnit, self.unit.iter().cloned().collect()),
            (Dimension::Scheme, self.schemes.clone()),
            (Dimension::Classification, self.classes.clone()),
        ]
    }
}

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Output image, defaults to the configured output directory and name
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Draw the PWD arterial roads underneath
    #[arg(long)]
    pub show_pwd: bool,
}
