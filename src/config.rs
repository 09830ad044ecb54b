//! Operator configuration loaded from the environment

use std::env;
use std::time::Duration;

use crate::{Error, Result};

/// Default field manager for server-side apply
pub const DEFAULT_FIELD_MANAGER: &str = "pod-reloader-operator";

const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 300;
const DEFAULT_ERROR_REQUEUE_SECS: u64 = 30;

/// Runtime configuration of the operator process
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorConfig {
    /// Namespace to watch; `None` watches all namespaces
    pub watch_namespace: Option<String>,
    /// Requeue interval after a successful reconciliation
    pub reconcile_interval: Duration,
    /// Requeue interval after a failed reconciliation
    pub error_requeue: Duration,
    /// Field manager used for server-side apply
    pub field_manager: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            reconcile_interval: Duration::from_secs(DEFAULT_RECONCILE_INTERVAL_SECS),
            error_requeue: Duration::from_secs(DEFAULT_ERROR_REQUEUE_SECS),
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
        }
    }
}

impl OperatorConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let watch_namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty());

        let reconcile_interval = match lookup("RECONCILE_INTERVAL_SECS") {
            Some(raw) => parse_secs("RECONCILE_INTERVAL_SECS", &raw)?,
            None => defaults.reconcile_interval,
        };

        let error_requeue = match lookup("ERROR_REQUEUE_SECS") {
            Some(raw) => parse_secs("ERROR_REQUEUE_SECS", &raw)?,
            None => defaults.error_requeue,
        };

        let field_manager = lookup("FIELD_MANAGER")
            .filter(|fm| !fm.trim().is_empty())
            .unwrap_or(defaults.field_manager);

        Ok(Self {
            watch_namespace,
            reconcile_interval,
            error_requeue,
            field_manager,
        })
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    let secs: u64 = raw.trim().parse().map_err(|e| {
        Error::ConfigError(format!("{} must be a number of seconds, got '{}': {}", key, raw, e))
    })?;
    if secs == 0 {
        return Err(Error::ConfigError(format!("{} must be > 0", key)));
    }
    Ok(Duration::from_secs(secs))
}
