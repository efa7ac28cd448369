use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use time::{Date, OffsetDateTime, macros::format_description};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};
use uuid::Uuid;

use crate::config::{LoggingConfig, LoggingRotation};

const LOG_FILE_PREFIX: &str = "dbimpact.log";

/// Keeps the non-blocking log worker alive for the duration of the run.
/// Dropping it flushes buffered events, so `main` holds it until exit.
pub struct LoggingGuard {
    _worker: WorkerGuard,
    run_id: String,
}

impl LoggingGuard {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

/// Sets up the run's tracing output: a JSON file layer under the rolling
/// appender, plus an optional plain stderr layer for WARN and above so an
/// operator sees trouble without tailing the log file. Expired log files
/// are swept once per run, after the subscriber is live, so sweep outcomes
/// land in the log like any other event.
pub fn init_tracing(logging_config: &LoggingConfig) -> Result<LoggingGuard> {
    if logging_config.filter.trim().is_empty() {
        return Err(anyhow!("logging.filter cannot be empty"));
    }
    if logging_config.dir.as_os_str().is_empty() {
        return Err(anyhow!("logging.dir cannot be empty"));
    }
    let env_filter = parse_filter(&logging_config.filter)?;

    let log_dir = if logging_config.dir.is_absolute() {
        logging_config.dir.clone()
    } else {
        std::env::current_dir()
            .context("failed to resolve logging.dir against the working directory")?
            .join(&logging_config.dir)
    };
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create logging directory {}", log_dir.display()))?;

    let appender = match logging_config.rotation {
        LoggingRotation::Daily => rolling::daily(&log_dir, LOG_FILE_PREFIX),
        LoggingRotation::Hourly => rolling::hourly(&log_dir, LOG_FILE_PREFIX),
    };
    let (writer, worker) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(env_filter);
    let stderr_layer = logging_config.stderr_warn_enabled.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    let run_id = Uuid::now_v7().to_string();
    tracing::info!(
        target: "logging",
        run_id = %run_id,
        dir = %log_dir.display(),
        filter = %logging_config.filter,
        retention_days = logging_config.retention_days,
        "logging_initialized"
    );
    sweep_expired(&log_dir, logging_config.retention_days);

    Ok(LoggingGuard {
        _worker: worker,
        run_id,
    })
}

fn parse_filter(filter: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(filter)
        .with_context(|| format!("failed to parse logging.filter '{filter}'"))
}

fn sweep_expired(log_dir: &Path, retention_days: usize) {
    let today = OffsetDateTime::now_utc().date();
    for path in expired_log_files(log_dir, LOG_FILE_PREFIX, retention_days, today) {
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(target: "logging", file = %path.display(), "expired_log_removed");
            }
            Err(err) => {
                tracing::warn!(
                    target: "logging",
                    file = %path.display(),
                    error = %err,
                    "expired_log_removal_failed"
                );
            }
        }
    }
}

/// Log files past retention, judged by the date the rolling appender stamped
/// into the file name. Anything without a parseable stamp (the current
/// rotation's file included) is left alone.
fn expired_log_files(
    log_dir: &Path,
    prefix: &str,
    retention_days: usize,
    today: Date,
) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return Vec::new();
    };
    let Some(cutoff) = today.checked_sub(time::Duration::days(retention_days as i64)) else {
        return Vec::new();
    };

    let mut expired = Vec::new();
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(stamped) = rotation_date(&file_name.to_string_lossy(), prefix) else {
            continue;
        };
        if stamped < cutoff {
            expired.push(entry.path());
        }
    }
    expired
}

/// Parses the date out of a rolling-appender file name such as
/// `dbimpact.log.2026-08-30` or `dbimpact.log.2026-08-30-14`.
fn rotation_date(file_name: &str, prefix: &str) -> Option<Date> {
    let suffix = file_name.strip_prefix(prefix)?.strip_prefix('.')?;
    let stamp = suffix.get(..10)?;
    Date::parse(stamp, format_description!("[year]-[month]-[day]")).ok()
}
