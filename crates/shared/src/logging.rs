//! Tracing setup for the meta-provider binaries.
//!
//! Human-readable events go to stderr so stdout carries only command results.
//! A daily-rotated file under the data directory can be enabled on top.

use crate::config::Config;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Crates whose chatter is capped at `warn` regardless of the chosen level
const QUIET_TARGETS: &[&str] = &["hyper", "reqwest", "html5ever", "selectors"];

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory holding rotated log files
    pub log_dir: PathBuf,
    /// Binary name; also the log file prefix
    pub component: String,
    pub default_level: Level,
    pub console: bool,
    pub file: bool,
    /// Write file events as JSON lines
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("data/logs"),
            component: "mal-meta".to_string(),
            default_level: Level::INFO,
            console: true,
            file: false,
            json_format: false,
        }
    }
}

impl LogConfig {
    /// Settings from the `[logging]` table. `verbose` forces DEBUG; an
    /// unparseable configured level falls back to INFO.
    pub fn from_config(config: &Config, component: &str, verbose: bool) -> Self {
        let default_level = if verbose {
            Level::DEBUG
        } else {
            config.logging.default_level.parse().unwrap_or(Level::INFO)
        };

        Self {
            log_dir: config.log_dir(),
            component: component.to_string(),
            default_level,
            console: config.logging.console,
            file: config.logging.file,
            json_format: config.logging.json_format,
        }
    }

    /// Filter directives used when RUST_LOG is not set.
    fn directives(&self) -> String {
        let level = self.default_level;
        let mut directives = vec![
            format!("{}={level}", self.component.replace('-', "_")),
            format!("shared={level}"),
        ];
        directives.extend(QUIET_TARGETS.iter().map(|target| format!("{target}=warn")));
        directives.join(",")
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.directives()));

    let mut layers = Vec::new();

    if config.console {
        layers.push(fmt::layer().with_writer(std::io::stderr).boxed());
    }

    if config.file {
        std::fs::create_dir_all(&config.log_dir).with_context(|| {
            format!("Failed to create log directory: {}", config.log_dir.display())
        })?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, &config.component);

        let layer = if config.json_format {
            fmt::layer().json().with_writer(appender).boxed()
        } else {
            fmt::layer().with_ansi(false).with_writer(appender).boxed()
        };
        layers.push(layer);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!(
        component = %config.component,
        log_dir = %config.log_dir.display(),
        file = config.file,
        "Logging initialized"
    );

    Ok(())
}
