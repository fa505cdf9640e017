use crate::config::types::{Config, RawConfig};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads, parses and validates a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use deadlink_patrol::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Checking {} sites", config.sites.len());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    validate(load_raw_config(path)?)
}

/// Reads and deserializes a configuration file without validating it
///
/// Lets the caller look at settings such as `verbose` before validation
/// runs and starts logging.
pub fn load_raw_config(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut raw: RawConfig = toml::from_str(&content)?;
    apply_env_overrides(&mut raw, std::env::var(VERBOSE_ENV).ok().as_deref());
    Ok(raw)
}

/// Environment variable overriding the `verbose` setting of the file
pub const VERBOSE_ENV: &str = "VERBOSE";

/// Applies the value of [`VERBOSE_ENV`], if set to a recognized boolean
fn apply_env_overrides(raw: &mut RawConfig, verbose: Option<&str>) {
    match verbose.map(|value| (value, parse_bool(value))) {
        Some((_, Some(verbose))) => raw.verbose = verbose,
        Some((value, None)) => {
            tracing::warn!("Ignoring {}={:?}: not a boolean", VERBOSE_ENV, value);
        }
        None => {}
    }
}

/// Parses env-style booleans (case-insensitive `1/true/yes/on`, `0/false/no/off`)
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parses and validates configuration content
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let raw: RawConfig = toml::from_str(content)?;
    validate(raw)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Scheduled runs log it so a report can be tied to the configuration
/// revision that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
