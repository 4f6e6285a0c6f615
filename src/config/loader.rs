//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, ServiceEntry};
use crate::config::validation::{validate_config, ValidationError};

/// Suffix marking a service URL override, e.g. `PRODUCTS_SERVICE_URL`.
const SERVICE_URL_SUFFIX: &str = "_SERVICE_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML document.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load configuration: file (or defaults), process environment, validation.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, std::env::vars());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides from `vars`.
///
/// - `GATEWAY_ENV` sets the environment
/// - `PORT` rebinds the listener on all interfaces
/// - `INTERNAL_API_KEY` sets the internal endpoint key
/// - `<NAME>_SERVICE_URL` adds or replaces service `name` (lower-cased);
///   an empty value removes it
pub fn apply_env_overrides<I>(config: &mut GatewayConfig, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        match key.as_str() {
            "GATEWAY_ENV" => match value.parse() {
                Ok(env) => config.environment = env,
                Err(e) => tracing::warn!(error = %e, "Ignoring GATEWAY_ENV"),
            },
            "PORT" => match value.trim().parse::<u16>() {
                Ok(port) => config.listener.bind_address = format!("0.0.0.0:{}", port),
                Err(_) => tracing::warn!(value = %value, "Ignoring invalid PORT"),
            },
            "INTERNAL_API_KEY" => {
                config.internal.api_key = Some(value).filter(|k| !k.is_empty());
            }
            _ => {
                let Some(name) = key.strip_suffix(SERVICE_URL_SUFFIX) else {
                    continue;
                };
                if name.is_empty() {
                    continue;
                }
                let name = name.to_ascii_lowercase();
                if value.trim().is_empty() {
                    config.services.remove(&name);
                    continue;
                }
                let entry = match config.services.remove(&name) {
                    Some(ServiceEntry::Detailed {
                        base_path,
                        external_prefix,
                        ..
                    }) => ServiceEntry::Detailed {
                        url: value,
                        base_path,
                        external_prefix,
                    },
                    _ => ServiceEntry::Url(value),
                };
                config.services.insert(name, entry);
            }
        }
    }
}
