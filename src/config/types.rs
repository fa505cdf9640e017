use crate::notify::Sender;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Configuration file structure as written by the user
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawConfig {
    /// Enables debug logging
    #[serde(default)]
    pub verbose: bool,

    /// Cron expression for recurring runs
    #[serde(default)]
    pub cron: Option<String>,

    #[serde(default)]
    pub health_check: RawHealthCheck,

    #[serde(default)]
    pub crawler: RawCrawlerConfig,

    #[serde(default)]
    pub notifiers: Vec<RawNotifier>,

    #[serde(default)]
    pub sites: Vec<RawSite>,
}

/// Health check section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHealthCheck {
    /// URL receiving a GET after each run without notification failures
    #[serde(default)]
    pub url: Option<String>,
}

/// Crawler tuning section
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawCrawlerConfig {
    /// Timeout of a single fetch (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Maximum number of in-flight fetches per site
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: u32,

    /// Maximum number of sites crawled at the same time (0 = unbounded)
    #[serde(default)]
    pub max_concurrent_sites: u32,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RawCrawlerConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            max_concurrent_requests: default_max_concurrent_requests(),
            max_concurrent_sites: 0,
            user_agent: default_user_agent(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_concurrent_requests() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("deadlink-patrol/{}", env!("CARGO_PKG_VERSION"))
}

/// Notifier entry
#[derive(Debug, Clone, Deserialize)]
pub struct RawNotifier {
    #[serde(default)]
    pub name: String,

    /// Connection URL, e.g. "generic+https://hooks.example.com/abc"
    #[serde(default)]
    pub url: String,

    /// Name of the built-in template used to render the message
    #[serde(default = "default_template")]
    pub template: String,
}

fn default_template() -> String {
    "text".to_string()
}

/// Site entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawSite {
    pub url: String,

    /// Regular expressions of links which should not be followed
    #[serde(default)]
    pub ignored_links: Vec<String>,

    /// Names of the notifiers to invoke on breakage
    #[serde(default)]
    pub notify: Vec<String>,
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub verbose: bool,
    pub schedule: Option<cron::Schedule>,
    pub health_check_url: Option<Url>,
    pub crawler: CrawlerOptions,
    pub notifiers: HashMap<String, NotifierTarget>,
    pub sites: Vec<SiteTarget>,
}

/// Resolved crawler tuning
#[derive(Debug, Clone)]
pub struct CrawlerOptions {
    pub request_timeout: Duration,
    pub max_concurrent_requests: usize,
    /// `None` spawns one worker per site without limit
    pub max_concurrent_sites: Option<usize>,
    pub user_agent: String,
}

impl Default for CrawlerOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(default_request_timeout()),
            max_concurrent_requests: default_max_concurrent_requests() as usize,
            max_concurrent_sites: None,
            user_agent: default_user_agent(),
        }
    }
}

/// A website to check
#[derive(Debug, Clone)]
pub struct SiteTarget {
    pub url: Url,
    pub ignored_links: Vec<Regex>,
    pub notify: Vec<String>,
}

impl SiteTarget {
    /// Creates a target without ignored links or notifiers
    pub fn new(url: Url) -> Self {
        Self {
            url,
            ignored_links: Vec::new(),
            notify: Vec::new(),
        }
    }

    /// Root URL as used for scope checks and report keys
    pub fn url_string(&self) -> String {
        self.url.to_string()
    }
}

/// A notification destination
#[derive(Clone)]
pub struct NotifierTarget {
    pub name: String,
    pub sender: Arc<dyn Sender>,
    pub template: String,
}

impl fmt::Debug for NotifierTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierTarget")
            .field("name", &self.name)
            .field("sender", &self.sender.service())
            .field("template", &self.template)
            .finish()
    }
}
