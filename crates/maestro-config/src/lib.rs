mod adapter;
mod model;
mod raw;

use std::path::PathBuf;

pub use adapter::resolve_path;
pub use model::{Config, Registry, Settings, ALL_TARGET, DEFAULT_LOG_DIR, DEFAULT_STATE_FILE};

/// Error type for configuration parsing and service lookup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[cfg(feature = "toml")]
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("validation error(s): {0}")]
    Validation(String),

    #[error("unknown service `{name}` (available: {})", available.join(", "))]
    UnknownService {
        name: String,
        available: Vec<String>,
    },

    #[error("executable for service `{service}` not found: {}", path.display())]
    MissingExecutable { service: String, path: PathBuf },
}

/// Load a configuration from a file path.
///
/// # Errors
///
/// Returns a `ConfigError` if the configuration file cannot be read or parsed.
pub fn load_from_path(path: &std::path::Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    parse_auto(&text, path)
}

/// Parse a configuration, picking the format from the file extension.
///
/// # Errors
///
/// Returns a `ConfigError` if the configuration string cannot be parsed.
pub fn parse_auto(text: &str, path: &std::path::Path) -> Result<Config, ConfigError> {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml")]
        "toml" => parse_toml(text, path),
        _ => Err(ConfigError::Validation("unknown config extension".into())),
    }
}

/// Parse a TOML configuration. Relative paths resolve against the
/// directory of `path`.
///
/// # Errors
///
/// Returns a `ConfigError` if the configuration string cannot be parsed.
#[cfg(feature = "toml")]
pub fn parse_toml(config: &str, path: &std::path::Path) -> Result<Config, ConfigError> {
    let raw_config = toml::from_str::<raw::RawConfig>(config)?;
    raw_config.to_config(path)
}
