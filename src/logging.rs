//! # Structured Logging Module
//!
//! Environment-aware structured logging that outputs to both console and a JSON file in
//! the deployer log directory, for following slow deploy and teardown workflows.

use crate::config::ConfigManager;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_GUARD: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// Initialize structured logging with console output and a JSON log file under `log_dir`.
///
/// Safe to call more than once; only the first call installs the subscriber. When the
/// log directory cannot be created, logging falls back to console only.
pub fn init_structured_logging(log_dir: &Path) {
    LOGGER_GUARD.get_or_init(|| {
        let environment = ConfigManager::detect_environment();
        let log_level = get_log_level(&environment);

        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_ansi(true)
            .with_filter(env_filter(&log_level));

        let (file_layer, guard, log_path) = match fs::create_dir_all(log_dir) {
            Ok(()) => {
                let file_name = log_file_name(&environment);
                let appender = tracing_appender::rolling::never(log_dir, &file_name);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_level(true)
                    .with_ansi(false)
                    .json()
                    .with_filter(env_filter(&log_level));
                (Some(layer), Some(guard), Some(log_dir.join(file_name)))
            }
            Err(e) => {
                eprintln!(
                    "deployer: cannot create log directory {}: {e}; logging to console only",
                    log_dir.display()
                );
                (None, None, None)
            }
        };

        if tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .is_err()
        {
            // A global subscriber is already installed (e.g. by a test harness)
            tracing::debug!("Global tracing subscriber already initialized");
        }

        let log_file = log_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        tracing::info!(
            pid = process::id(),
            environment = %environment,
            log_file = %log_file,
            "🔧 STRUCTURED LOGGING: Initialized"
        );

        guard
    });
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn log_file_name(environment: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    format!("deployer.{}.{}.{}.log", environment, process::id(), timestamp)
}

/// Path the JSON log file would take for the given directory and environment
pub fn log_file_path(log_dir: &Path, environment: &str) -> PathBuf {
    log_dir.join(log_file_name(environment))
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for assembly lifecycle operations
pub fn log_assembly_operation(
    operation: &str,
    assembly_id: i64,
    assembly_uuid: Option<&str>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        assembly_id = assembly_id,
        assembly_uuid = assembly_uuid,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📦 ASSEMBLY_OPERATION"
    );
}

/// Log structured data for remote stack operations
pub fn log_stack_operation(
    operation: &str,
    assembly_id: i64,
    stack_id: Option<&str>,
    stack_name: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        assembly_id = assembly_id,
        stack_id = stack_id,
        stack_name = %stack_name,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "🏗️ STACK_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}
