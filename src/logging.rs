//! Console plus rotating-file logging.
//!
//! The console gets a human-readable, coloured stream; the log directory gets a
//! JSON (or plain) stream rotated daily or hourly by tracing-appender.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const LOG_FILE_PREFIX: &str = "gamepath_api";

/// `[logging]` section of config.toml
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_dir: String,
    /// EnvFilter directive; `RUST_LOG` wins when set
    pub level_filter: String,
    pub rotation: LogRotation,
    pub console_timestamps: bool,
    pub file_json_format: bool,
    /// Rotated files older than this are removed at startup
    pub keep_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Daily,
    Hourly,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            level_filter: "info,gamepath_api=info".to_string(),
            rotation: LogRotation::Daily,
            console_timestamps: true,
            file_json_format: true,
            keep_days: 14,
        }
    }
}

const CONSOLE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f UTC";
const FILE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

fn console_layer(config: &LoggingConfig) -> BoxedLayer {
    let timer = ChronoUtc::new(if config.console_timestamps {
        CONSOLE_TIME_FORMAT.to_string()
    } else {
        String::new()
    });
    fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_timer(timer)
        .with_filter(env_filter(&config.level_filter))
        .boxed()
}

fn file_layer(config: &LoggingConfig, writer: NonBlocking) -> BoxedLayer {
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_timer(ChronoUtc::new(FILE_TIME_FORMAT.to_string()));
    if config.file_json_format {
        layer.json().with_filter(env_filter(&config.level_filter)).boxed()
    } else {
        layer.with_filter(env_filter(&config.level_filter)).boxed()
    }
}

/// Install console and rotating-file layers.
/// Keep the returned guard alive or buffered file output is lost.
pub fn init_dual_logging(config: &LoggingConfig) -> Result<WorkerGuard, Box<dyn std::error::Error + Send + Sync>> {
    std::fs::create_dir_all(&config.log_dir)?;

    let file_name = format!("{}.log", LOG_FILE_PREFIX);
    let appender = match config.rotation {
        LogRotation::Daily => tracing_appender::rolling::daily(&config.log_dir, &file_name),
        LogRotation::Hourly => tracing_appender::rolling::hourly(&config.log_dir, &file_name),
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(vec![console_layer(config), file_layer(config, writer)])
        .try_init()?;

    tracing::info!(
        log_dir = %config.log_dir,
        rotation = ?config.rotation,
        json_format = config.file_json_format,
        "📁 Logging to console and {}/{}",
        config.log_dir,
        file_name
    );
    Ok(guard)
}

/// Console-only fallback when the log directory cannot be used
pub fn init_simple_logging(level_filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level_filter))
        .try_init()?;
    Ok(())
}

/// Log files written by this service, oldest first
pub fn get_current_log_files(log_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(log_dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| {
                    path.is_file()
                        && path
                            .file_name()
                            .and_then(|name| name.to_str())
                            .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX) && name.contains(".log"))
                })
                .collect()
        })
        .unwrap_or_default();

    files.sort();
    files
}

/// Remove service log files not modified within `keep_days`
pub fn cleanup_old_logs(log_dir: &Path, keep_days: u32) -> Result<usize, std::io::Error> {
    let cutoff = std::time::SystemTime::now() - std::time::Duration::from_secs(keep_days as u64 * 24 * 3600);
    let mut removed_count = 0;

    for path in get_current_log_files(log_dir) {
        let modified = path.metadata().and_then(|m| m.modified());
        if let Ok(modified) = modified {
            if modified < cutoff && std::fs::remove_file(&path).is_ok() {
                removed_count += 1;
                tracing::debug!("🗑️ Removed old log file: {:?}", path);
            }
        }
    }

    if removed_count > 0 {
        tracing::info!("🧹 Cleaned up {} old log files (older than {} days)", removed_count, keep_days);
    }
    Ok(removed_count)
}
