//! Configuration module for Deadlink-Patrol
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The file is deserialized into raw types first and then resolved into a
//! [`Config`] with parsed URLs, compiled ignore patterns and located notifier
//! transports.
//!
//! # Example
//!
//! ```no_run
//! use deadlink_patrol::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! for site in &config.sites {
//!     println!("Will check {}", site.url);
//! }
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerOptions, NotifierTarget, RawConfig, RawCrawlerConfig, RawHealthCheck,
    RawNotifier, RawSite, SiteTarget,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_raw_config, parse_bool,
    parse_config, VERBOSE_ENV,
};
pub use validation::validate;
