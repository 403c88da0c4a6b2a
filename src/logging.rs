//! Logging setup, powered by tracing-subscriber
//!
//! A plain-text file layer is always installed (appending to the log file);
//! a stderr layer is added when console output is requested. Both share one
//! filter built from the configured level.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Default log file, relative to the working directory
pub const DEFAULT_LOG_FILE: &str = "vintage.log";

/// Default level when neither a flag nor `RUST_LOG` sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Where and how much to log
#[derive(Debug, Clone)]
pub struct LogOptions {
    pub file: PathBuf,
    /// Explicit level or filter directive; `None` falls back to `RUST_LOG`
    pub level: Option<String>,
    /// Mirror log output on stderr
    pub console: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self { file: PathBuf::from(DEFAULT_LOG_FILE), level: None, console: false }
    }
}

/// Build the filter: explicit level, then `RUST_LOG`, then `info`.
/// Driver internals are capped at `warn` unless named explicitly.
pub fn build_env_filter(level: Option<&str>) -> anyhow::Result<EnvFilter> {
    let base = match level {
        Some(level) => level.to_string(),
        None => std::env::var(EnvFilter::DEFAULT_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
    };

    let mut directives = vec![base];
    for noisy in ["mysql_async", "mysql_common"] {
        if !directives[0].contains(noisy) {
            directives.push(format!("{noisy}=warn"));
        }
    }

    let filter_str = directives.join(",");
    EnvFilter::try_new(&filter_str)
        .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{}': {}", filter_str, e))
}

/// Install the global subscriber
pub fn init_logging(options: &LogOptions) -> anyhow::Result<()> {
    if let Some(parent) = options.file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }

    let log_file = open_log_file(&options.file)?;

    let console_layer = if options.console {
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(build_env_filter(options.level.as_deref())?),
        )
    } else {
        None
    };

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .with_target(true)
        .with_filter(build_env_filter(options.level.as_deref())?);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    tracing::trace!(
        file = %options.file.display(),
        console = options.console,
        "Logging initialized"
    );

    Ok(())
}

fn open_log_file(path: &Path) -> anyhow::Result<fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}
