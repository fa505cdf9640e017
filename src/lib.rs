//! Deadlink-Patrol: a periodic broken-link checker
//!
//! This crate crawls a set of configured websites, records every link it
//! encounters together with the links that fail to resolve, aggregates the
//! failures into per-site reports and notifies the configured channels when
//! breakages are found.

pub mod config;
pub mod crawler;
pub mod manager;
pub mod notify;
pub mod record;
pub mod report;
pub mod schedule;

use thiserror::Error;

/// Main error type for Deadlink-Patrol operations
#[derive(Debug, Error)]
pub enum PatrolError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Failed to serialize reports: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
///
/// All of these are fatal: they abort the process before any run starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No sites defined")]
    NoSitesDefined,

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid ignored link pattern '{pattern}' for site '{site}': {source}")]
    InvalidPattern {
        site: String,
        pattern: String,
        source: regex::Error,
    },

    #[error("Invalid cron spec '{spec}' provided: {reason}")]
    InvalidSchedule { spec: String, reason: String },

    #[error("{field} missing for notifier at index {index}")]
    NotifierFieldMissing { field: &'static str, index: usize },

    #[error("Failed to resolve url of notifier at index {index}: {url}: {reason}")]
    UnknownNotifierService {
        index: usize,
        url: String,
        reason: String,
    },

    #[error("Site '{site}' requested to notify unknown notifier '{notifier}'")]
    UnknownNotifierForSite { site: String, notifier: String },
}

/// Errors that prevent a site crawl from producing any observation
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Failed to start crawler for site {url}: {reason}")]
    Start { url: String, reason: String },

    #[error("Site root {url} could not be fetched: {reason}")]
    RootUnreachable { url: String, reason: String },
}

/// Errors raised while turning a report into a delivered notification
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to render template '{template}': {source}")]
    Render {
        template: String,
        source: minijinja::Error,
    },

    #[error("Failed to deliver message: {0}")]
    Delivery(String),

    #[error("Notification endpoint returned HTTP {status}")]
    Status { status: u16 },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Result type alias for Deadlink-Patrol operations
pub type Result<T> = std::result::Result<T, PatrolError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, SiteTarget};
pub use manager::Manager;
pub use record::{Recorder, Recording};
pub use report::{generate_report, Report, SiteReport};
