//! Tracing subscriber setup for the binary.

use std::{fs::File, io, path::PathBuf, sync::Mutex};

use anyhow::Context;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Where log lines go. The dashboard owns the terminal, so it logs to a file.
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `-v`.
pub fn init(verbosity: u8, target: LogTarget) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));

    match target {
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(io::stderr)
                    .with_filter(env_filter),
            )
            .try_init()
            .context("failed to install log subscriber")?,
        LogTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = File::create(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file))
                        .with_filter(env_filter),
                )
                .try_init()
                .context("failed to install log subscriber")?
        }
    }
    Ok(())
}
