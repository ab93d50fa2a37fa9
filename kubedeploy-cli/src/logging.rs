///! Logging configuration
///! Console output on stderr, optional JSON file output

use anyhow::{anyhow, Result};
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Fallback filter when RUST_LOG is unset
    pub level: String,
    pub json_format: bool,
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
            file_path: None,
        }
    }
}

impl LoggingConfig {
    /// Install the global subscriber
    ///
    /// The returned guard flushes the file writer on drop and must be held
    /// until the process exits.
    pub fn init(&self) -> Result<Option<WorkerGuard>> {
        let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&self.level))?;

        let console_layer = if self.json_format {
            fmt::layer().json().with_writer(io::stderr).boxed()
        } else {
            fmt::layer()
                .with_target(false)
                .with_writer(io::stderr)
                .boxed()
        };

        let (file_layer, guard) = match &self.file_path {
            Some(path) => {
                let (dir, file_name) = split_log_path(path)?;
                std::fs::create_dir_all(dir)?;

                let (writer, guard) = non_blocking(rolling::never(dir, file_name));
                let layer = fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .json()
                    .with_writer(writer)
                    .boxed();
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()?;

        tracing::debug!(level = %self.level, json = self.json_format, "logging initialized");
        Ok(guard)
    }
}

fn split_log_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("log_file '{}' does not name a file", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((dir, file_name))
}
