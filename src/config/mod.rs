//! # Deployer Configuration
//!
//! Explicit configuration for the deployment engine. A [`DeployerConfig`] is built once at
//! process start (usually through [`ConfigManager`]) and handed to the orchestrator by
//! reference; nothing in the crate reads tunables from ambient global state.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use deployer_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let poll = manager.config().poll_policy();
//! println!("stack poll budget: {} attempts", poll.max_attempts);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::defaults;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring deployer-config.yaml
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeployerConfig {
    /// Retry budgets, intervals and VM defaults for the deploy workflow
    pub deployer: DeployerSettings,

    /// Artifact packaging settings shared with the API layer
    pub api: ApiConfig,

    /// Artifact storage settings shared with the build workers
    pub worker: WorkerConfig,

    /// Object store holding built deployment units
    pub object_store: ObjectStoreConfig,

    /// Database connection settings for the PostgreSQL store
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeployerSettings {
    /// Attempts to query the stack for a terminal provisioning status
    pub max_attempts: u32,
    /// Attempts to reach the deployed unit on all of its ports
    pub du_attempts: u32,
    /// Initial sleep between two stack status queries, in seconds
    pub wait_interval: f64,
    /// Factor by which the sleep interval grows; must be >= 1.0
    pub growth_factor: f64,
    /// Optional ceiling for the grown interval, in seconds. `None` keeps growth unbounded.
    pub max_wait_interval: Option<f64>,
    /// Fixed sleep between readiness probe attempts
    pub probe_interval_ms: u64,
    /// Connect timeout for a single port check
    pub probe_timeout_ms: u64,
    /// VM flavor used for virtual-machine deployments
    pub flavor: String,
    /// Base image id used for virtual-machine deployments
    pub image: String,
    /// Deployer logs location
    pub deployer_log_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Runtime packaging format tag (`docker` or `vm`)
    pub image_format: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Storage backend tag (`glance`, `docker_registry` or `swift`)
    pub image_storage: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObjectStoreConfig {
    /// Container that holds deployment-unit images
    pub du_container: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Backoff policy for stack status polling, derived from [`DeployerSettings`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub growth_factor: f64,
    pub max_interval: Option<Duration>,
}

impl PollPolicy {
    /// The sleep that precedes poll number `attempt` (1-based):
    /// `initial * growth_factor^(attempt - 1)`, clamped to the ceiling when one is set.
    pub fn interval_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial_interval.as_secs_f64() * self.growth_factor.powi(exponent);
        self.clamp(secs)
    }

    /// Grow an interval by one step
    pub fn next_interval(&self, current: Duration) -> Duration {
        self.clamp(current.as_secs_f64() * self.growth_factor)
    }

    fn clamp(&self, secs: f64) -> Duration {
        let secs = if secs.is_finite() { secs } else { f64::MAX };
        let duration = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        match self.max_interval {
            Some(ceiling) => duration.min(ceiling),
            None => duration,
        }
    }
}

/// Attempt budget and timings for readiness probing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbePolicy {
    pub max_attempts: u32,
    pub retry_interval: Duration,
    pub connect_timeout: Duration,
}

impl Default for DeployerSettings {
    fn default() -> Self {
        Self {
            max_attempts: defaults::MAX_ATTEMPTS,
            du_attempts: defaults::DU_ATTEMPTS,
            wait_interval: defaults::WAIT_INTERVAL_SECONDS,
            growth_factor: defaults::GROWTH_FACTOR,
            max_wait_interval: None,
            probe_interval_ms: defaults::PROBE_INTERVAL_MS,
            probe_timeout_ms: defaults::PROBE_TIMEOUT_MS,
            flavor: defaults::FLAVOR.to_string(),
            image: defaults::IMAGE.to_string(),
            deployer_log_dir: PathBuf::from(defaults::DEPLOYER_LOG_DIR),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            image_format: defaults::IMAGE_FORMAT.to_string(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            image_storage: defaults::IMAGE_STORAGE.to_string(),
        }
    }
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            du_container: defaults::DU_CONTAINER.to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::DATABASE_URL.to_string(),
            max_connections: defaults::DATABASE_MAX_CONNECTIONS,
        }
    }
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            deployer: DeployerSettings::default(),
            api: ApiConfig::default(),
            worker: WorkerConfig::default(),
            object_store: ObjectStoreConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl DeployerConfig {
    /// Validate configuration values that would otherwise surface as runtime misbehavior
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let d = &self.deployer;

        if d.max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "deployer.max_attempts",
                "0",
                "stack poll budget must be greater than 0",
            ));
        }

        if d.du_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "deployer.du_attempts",
                "0",
                "readiness probe budget must be greater than 0",
            ));
        }

        if !(d.wait_interval.is_finite() && d.wait_interval > 0.0) {
            return Err(ConfigurationError::invalid_value(
                "deployer.wait_interval",
                d.wait_interval.to_string(),
                "wait interval must be a positive number of seconds",
            ));
        }

        if !(d.growth_factor.is_finite() && d.growth_factor >= 1.0) {
            return Err(ConfigurationError::invalid_value(
                "deployer.growth_factor",
                d.growth_factor.to_string(),
                "growth factor must be >= 1.0",
            ));
        }

        if let Some(ceiling) = d.max_wait_interval {
            if !ceiling.is_finite() || ceiling < d.wait_interval {
                return Err(ConfigurationError::invalid_value(
                    "deployer.max_wait_interval",
                    ceiling.to_string(),
                    "ceiling must be >= deployer.wait_interval",
                ));
            }
        }

        if d.probe_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "deployer.probe_interval_ms",
                "0",
                "probe interval must be greater than 0",
            ));
        }

        if d.probe_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "deployer.probe_timeout_ms",
                "0",
                "probe timeout must be greater than 0",
            ));
        }

        if d.flavor.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "deployer.flavor",
                "virtual-machine deployment defaults",
            ));
        }

        if d.image.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "deployer.image",
                "virtual-machine deployment defaults",
            ));
        }

        if d.deployer_log_dir.as_os_str().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "deployer.deployer_log_dir",
                "deployer configuration",
            ));
        }

        if self.object_store.du_container.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "object_store.du_container",
                "object store configuration",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "0",
                "pool size must be greater than 0",
            ));
        }

        Ok(())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            max_attempts: self.deployer.max_attempts,
            initial_interval: saturating_secs(self.deployer.wait_interval),
            growth_factor: self.deployer.growth_factor,
            max_interval: self.deployer.max_wait_interval.map(saturating_secs),
        }
    }

    pub fn probe_policy(&self) -> ProbePolicy {
        ProbePolicy {
            max_attempts: self.deployer.du_attempts,
            retry_interval: Duration::from_millis(self.deployer.probe_interval_ms),
            connect_timeout: Duration::from_millis(self.deployer.probe_timeout_ms),
        }
    }
}

/// Negative and NaN values become zero, overflow becomes [`Duration::MAX`]
fn saturating_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}
