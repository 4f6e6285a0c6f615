//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate upstream URLs and service names
//! - Validate value ranges (timeouts > 0, threshold within 1..=100)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("service name '{0}' must be non-empty [A-Za-z0-9_-]")]
    ServiceName(String),

    #[error("service '{service}' url '{url}': {reason}")]
    ServiceUrl {
        service: String,
        url: String,
        reason: String,
    },

    #[error("breaker.{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("breaker.error_threshold_percentage must be within 1..=100 (got {0})")]
    Threshold(u8),

    #[error("breaker.rolling_window_ms ({window_ms}) must be at least bucket_count ({buckets})")]
    Window { window_ms: u64, buckets: usize },

    #[error("api_prefix '{0}' must be empty or start with '/'")]
    ApiPrefix(String),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if !config.api_prefix.is_empty() && !config.api_prefix.starts_with('/') {
        errors.push(ValidationError::ApiPrefix(config.api_prefix.clone()));
    }

    for (name, entry) in &config.services {
        if !is_valid_service_name(name) {
            errors.push(ValidationError::ServiceName(name.clone()));
        }
        if entry.is_empty() {
            continue;
        }
        if let Err(reason) = check_upstream_url(entry.url()) {
            errors.push(ValidationError::ServiceUrl {
                service: name.clone(),
                url: entry.url().to_string(),
                reason,
            });
        }
    }

    let breaker = &config.breaker;
    for (field, value) in [
        ("timeout_ms", breaker.timeout_ms),
        ("reset_timeout_ms", breaker.reset_timeout_ms),
        ("rolling_window_ms", breaker.rolling_window_ms),
        ("bucket_count", breaker.bucket_count as u64),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }
    if !(1..=100).contains(&breaker.error_threshold_percentage) {
        errors.push(ValidationError::Threshold(breaker.error_threshold_percentage));
    }
    if breaker.bucket_count > 0 && breaker.rolling_window_ms < breaker.bucket_count as u64 {
        errors.push(ValidationError::Window {
            window_ms: breaker.rolling_window_ms,
            buckets: breaker.bucket_count,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_service_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn check_upstream_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme '{}', expected http", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(())
}
