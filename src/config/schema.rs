//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::BreakerPolicy;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Deployment environment; gates the internal endpoint's key check.
    pub environment: Environment,

    /// Prefix prepended to every service's external path.
    pub api_prefix: String,

    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Service name → upstream.
    pub services: BTreeMap<String, ServiceEntry>,

    /// Breaker policy shared by every service.
    pub breaker: BreakerConfig,

    /// Internal diagnostics endpoint.
    pub internal: InternalConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            api_prefix: "/api/v1".to_string(),
            listener: ListenerConfig::default(),
            services: BTreeMap::new(),
            breaker: BreakerConfig::default(),
            internal: InternalConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
        }
    }
}

/// One configured service.
///
/// Either a bare upstream URL or a table that may override the paths.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ServiceEntry {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        base_path: Option<String>,
        #[serde(default)]
        external_prefix: Option<String>,
    },
}

impl ServiceEntry {
    /// Upstream base URL.
    pub fn url(&self) -> &str {
        match self {
            ServiceEntry::Url(url) => url,
            ServiceEntry::Detailed { url, .. } => url,
        }
    }

    /// Explicit upstream base path, if any.
    pub fn base_path(&self) -> Option<&str> {
        match self {
            ServiceEntry::Url(_) => None,
            ServiceEntry::Detailed { base_path, .. } => base_path.as_deref(),
        }
    }

    /// Explicit external prefix, if any.
    pub fn external_prefix(&self) -> Option<&str> {
        match self {
            ServiceEntry::Url(_) => None,
            ServiceEntry::Detailed {
                external_prefix, ..
            } => external_prefix.as_deref(),
        }
    }

    /// An entry without a usable URL registers no route.
    pub fn is_empty(&self) -> bool {
        self.url().trim().is_empty()
    }
}

/// Circuit breaker parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Upstream call deadline in milliseconds.
    pub timeout_ms: u64,

    /// Failure percentage (1-100) that trips the breaker.
    pub error_threshold_percentage: u8,

    /// Time spent open before probing, in milliseconds.
    pub reset_timeout_ms: u64,

    /// Rolling statistics window in milliseconds.
    pub rolling_window_ms: u64,

    /// Number of buckets in the rolling window.
    pub bucket_count: usize,

    /// Minimum samples before the ratio is evaluated.
    pub volume_threshold: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 3000,
            error_threshold_percentage: 50,
            reset_timeout_ms: 10_000,
            rolling_window_ms: 10_000,
            bucket_count: 10,
            volume_threshold: 5,
        }
    }
}

impl BreakerConfig {
    /// Convert into the runtime policy.
    pub fn policy(&self) -> BreakerPolicy {
        BreakerPolicy {
            timeout: Duration::from_millis(self.timeout_ms),
            error_threshold_percentage: f64::from(self.error_threshold_percentage),
            rolling_window: Duration::from_millis(self.rolling_window_ms),
            bucket_count: self.bucket_count,
            reset_timeout: Duration::from_millis(self.reset_timeout_ms),
            volume_threshold: self.volume_threshold,
        }
    }
}

/// Internal diagnostics endpoint configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct InternalConfig {
    /// Shared key expected in `x-internal-key` outside development.
    pub api_key: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,

    /// Maximum upstream response body size in bytes.
    pub max_upstream_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024,           // 2MB
            max_upstream_body_size: 16 * 1024 * 1024, // 16MB
        }
    }
}
