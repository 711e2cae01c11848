// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{kind, requeue};
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Path or name of the kind executable
    pub kind_binary: String,
    /// Kubeconfig file kind writes new cluster credentials to; kind's default when unset
    pub kind_kubeconfig: Option<PathBuf>,
    pub kind_wait: Duration,
    pub requeue_interval: Duration,
    pub error_requeue_interval: Duration,
    /// How often a Ready KindCluster is checked for a vanished kind cluster
    pub ready_recheck_interval: Duration,
    /// Only watch KindClusters in this namespace; all namespaces when unset
    pub watch_namespace: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            kind_binary: kind::BINARY.to_string(),
            kind_kubeconfig: None,
            kind_wait: Duration::from_secs(kind::WAIT_SECS),
            requeue_interval: Duration::from_secs(requeue::PROVISIONING_SECS),
            error_requeue_interval: Duration::from_secs(requeue::ERROR_SECS),
            ready_recheck_interval: Duration::from_secs(requeue::READY_RECHECK_SECS),
            watch_namespace: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secs = |key: &str, default: Duration| -> Result<Duration> {
            match non_empty(key) {
                Some(v) => v
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("{} must be a number of seconds, got '{}'", key, v)),
                None => Ok(default),
            }
        };

        Ok(Config {
            kind_binary: non_empty("KIND_BINARY").unwrap_or(defaults.kind_binary),
            kind_kubeconfig: non_empty("KIND_KUBECONFIG").map(PathBuf::from),
            kind_wait: secs("KIND_WAIT_SECS", defaults.kind_wait)?,
            requeue_interval: secs("REQUEUE_INTERVAL_SECS", defaults.requeue_interval)?,
            error_requeue_interval: secs(
                "ERROR_REQUEUE_INTERVAL_SECS",
                defaults.error_requeue_interval,
            )?,
            ready_recheck_interval: secs(
                "READY_RECHECK_INTERVAL_SECS",
                defaults.ready_recheck_interval,
            )?,
            watch_namespace: non_empty("WATCH_NAMESPACE"),
        })
    }
}
