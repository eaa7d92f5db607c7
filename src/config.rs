// SPDX-License-Identifier: Apache-2.0

//! Configuration for the portfolio API.
//!
//! Every value can be overridden through environment variables; defaults
//! suit a single-instance deployment behind a reverse proxy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the portfolio API service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Contact submission throttling configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Admin API configuration
    #[serde(default)]
    pub admin: AdminConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Storage path; the literal "memory" selects the in-memory engine
    /// (default: memory)
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// Throttling configuration for public contact submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum submissions per source address per window (default: 5)
    #[serde(default = "default_max_submissions")]
    pub max_submissions: u32,

    /// Length of the sliding window in seconds (default: 3600)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Interval between ledger sweeps in seconds (default: 600)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Admin API configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    /// Bearer token required on /api/admin routes. When unset the admin
    /// API rejects every request.
    #[serde(default)]
    pub token: Option<String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_database_path() -> String {
    "memory".to_string()
}

fn default_max_submissions() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    3600 // one hour
}

fn default_sweep_interval_secs() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database: DatabaseConfig::default(),
            rate_limit: RateLimitConfig::default(),
            admin: AdminConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_submissions: default_max_submissions(),
            window_secs: default_window_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the interval between ledger sweeps
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_string("BIND_ADDR").unwrap_or_else(default_bind_addr),
            database: DatabaseConfig {
                path: env_string("DATABASE_PATH").unwrap_or_else(default_database_path),
            },
            rate_limit: RateLimitConfig {
                max_submissions: env_parsed("RATE_LIMIT_MAX_SUBMISSIONS")
                    .unwrap_or_else(default_max_submissions),
                window_secs: env_parsed("RATE_LIMIT_WINDOW_SECS")
                    .unwrap_or_else(default_window_secs),
                sweep_interval_secs: env_parsed("RATE_LIMIT_SWEEP_INTERVAL_SECS")
                    .unwrap_or_else(default_sweep_interval_secs),
            },
            admin: AdminConfig {
                token: env_string("ADMIN_TOKEN"),
            },
            metrics: MetricsConfig {
                enabled: env_parsed("METRICS_ENABLED").unwrap_or_else(default_true),
                path: env_string("METRICS_PATH").unwrap_or_else(default_metrics_path),
            },
        }
    }
}

/// Read an environment variable, treating blank values as unset.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Read and parse an environment variable, ignoring unparseable values.
fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}
