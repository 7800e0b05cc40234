//! # Structured Logging
//!
//! Console output plus a JSON log file per process, so that transitions and
//! scheduler fires can be followed after the fact. `RUST_LOG` overrides the
//! environment-derived level.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

const DEFAULT_LOG_DIR: &str = "log";

static LOGGING: OnceLock<()> = OnceLock::new();

/// Install console and file logging once per process, writing under `log/`
pub fn init_structured_logging() {
    init_structured_logging_in(DEFAULT_LOG_DIR);
}

/// Install console and file logging once per process, writing under `log_dir`.
///
/// Falls back to console-only output when the directory cannot be created.
/// An already-installed global subscriber is left in place.
pub fn init_structured_logging_in(log_dir: impl AsRef<Path>) {
    let log_dir = log_dir.as_ref().to_path_buf();
    LOGGING.get_or_init(move || {
        let environment = get_environment();

        let console = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_filter(level_filter(&environment));

        if let Err(err) = std::fs::create_dir_all(&log_dir) {
            let _ = tracing_subscriber::registry().with(console).try_init();
            tracing::warn!(
                log_dir = %log_dir.display(),
                error = %err,
                "log directory unavailable, logging to console only"
            );
            return;
        }

        let file_name = log_file_name(&environment);
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(&log_dir, &file_name));
        let json = fmt::layer()
            .json()
            .with_writer(writer)
            .with_ansi(false)
            .with_current_span(false)
            .with_filter(level_filter(&environment));

        if tracing_subscriber::registry()
            .with(console)
            .with(json)
            .try_init()
            .is_err()
        {
            tracing::debug!("global subscriber already installed, keeping it");
        }

        // Flushes on drop; logging lives as long as the process
        std::mem::forget(guard);

        tracing::info!(
            environment = %environment,
            log_file = %PathBuf::from(&log_dir).join(&file_name).display(),
            "structured logging initialized"
        );
    });
}

/// Deployment environment: `PUBLISHING_ENV`, then `APP_ENV`, else `development`
pub fn get_environment() -> String {
    std::env::var("PUBLISHING_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn default_level(environment: &str) -> &'static str {
    if environment == "production" {
        "info"
    } else {
        "debug"
    }
}

fn level_filter(environment: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(environment)))
}

fn log_file_name(environment: &str) -> String {
    format!(
        "{environment}.{pid}.{stamp}.log",
        pid = std::process::id(),
        stamp = Utc::now().format("%Y%m%d_%H%M%S")
    )
}

/// A committed per-language transition
pub fn log_transition_operation(
    event: &str,
    root_id: Uuid,
    version_id: Uuid,
    language: &str,
    status: &str,
    actor: &str,
) {
    tracing::info!(
        event,
        %root_id,
        %version_id,
        language,
        status,
        actor,
        "language transition committed"
    );
}

/// A scheduler job lifecycle step (registered, fired, retried, paused, toggled)
pub fn log_job_operation(
    operation: &str,
    job_name: &str,
    state: &str,
    failed_executions: u32,
    details: Option<&str>,
) {
    tracing::info!(
        operation,
        job_name,
        state,
        failed_executions,
        details,
        "scheduler job"
    );
}

pub fn log_history_query(stream: &str, root_id: Uuid, page: usize, returned: usize, more: bool) {
    tracing::debug!(
        stream,
        %root_id,
        page,
        returned,
        is_more_available = more,
        "history page served"
    );
}

/// An error that is handled locally but must stay visible in the logs
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(component, operation, error, context, "operation failed");
}
