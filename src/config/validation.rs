use crate::config::types::{
    Config, CrawlerOptions, NotifierTarget, RawConfig, RawCrawlerConfig, RawNotifier, RawSite,
    SiteTarget,
};
use crate::notify::locate_sender;
use crate::schedule::parse_schedule;
use crate::ConfigError;
use regex::Regex;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Validates the raw configuration and resolves it into a [`Config`]
pub fn validate(raw: RawConfig) -> Result<Config, ConfigError> {
    if raw.sites.is_empty() {
        return Err(ConfigError::NoSitesDefined);
    }

    let schedule = match raw.cron.as_deref().map(str::trim) {
        Some(spec) if !spec.is_empty() => Some(parse_schedule(spec)?),
        _ => None,
    };

    let health_check_url = match raw.health_check.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Some(parse_http_url(url, "health check URL")?),
        _ => {
            tracing::info!("No health check URL found, disabling health check calling");
            None
        }
    };

    let crawler = validate_crawler_config(&raw.crawler)?;
    let notifiers = validate_notifiers(&raw.notifiers)?;

    let mut sites = Vec::with_capacity(raw.sites.len());
    for site in &raw.sites {
        sites.push(validate_site(site, &notifiers)?);
    }

    Ok(Config {
        verbose: raw.verbose,
        schedule,
        health_check_url,
        crawler,
        notifiers,
        sites,
    })
}

/// Validates crawler tuning
fn validate_crawler_config(config: &RawCrawlerConfig) -> Result<CrawlerOptions, ConfigError> {
    if config.request_timeout == 0 {
        return Err(ConfigError::Validation(
            "request-timeout must be at least 1 second".to_string(),
        ));
    }

    if config.max_concurrent_requests == 0 {
        return Err(ConfigError::Validation(
            "max-concurrent-requests must be >= 1, got 0".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(CrawlerOptions {
        request_timeout: Duration::from_secs(config.request_timeout),
        max_concurrent_requests: config.max_concurrent_requests as usize,
        max_concurrent_sites: match config.max_concurrent_sites {
            0 => None,
            n => Some(n as usize),
        },
        user_agent: config.user_agent.clone(),
    })
}

/// Validates notifier entries and resolves their transports
fn validate_notifiers(
    notifiers: &[RawNotifier],
) -> Result<HashMap<String, NotifierTarget>, ConfigError> {
    let mut resolved = HashMap::with_capacity(notifiers.len());

    for (index, notifier) in notifiers.iter().enumerate() {
        if notifier.name.trim().is_empty() {
            return Err(ConfigError::NotifierFieldMissing {
                field: "name",
                index,
            });
        }
        if notifier.url.trim().is_empty() {
            return Err(ConfigError::NotifierFieldMissing { field: "url", index });
        }
        if resolved.contains_key(&notifier.name) {
            return Err(ConfigError::Validation(format!(
                "notifier name '{}' is defined more than once",
                notifier.name
            )));
        }

        let sender =
            locate_sender(&notifier.url).map_err(|reason| ConfigError::UnknownNotifierService {
                index,
                url: notifier.url.clone(),
                reason,
            })?;

        resolved.insert(
            notifier.name.clone(),
            NotifierTarget {
                name: notifier.name.clone(),
                sender,
                template: notifier.template.clone(),
            },
        );
    }

    Ok(resolved)
}

/// Validates a single site entry
fn validate_site(
    site: &RawSite,
    notifiers: &HashMap<String, NotifierTarget>,
) -> Result<SiteTarget, ConfigError> {
    let url = parse_http_url(&site.url, "site URL")?;

    let mut ignored_links = Vec::with_capacity(site.ignored_links.len());
    for pattern in &site.ignored_links {
        let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            site: site.url.clone(),
            pattern: pattern.clone(),
            source,
        })?;
        ignored_links.push(regex);
    }

    for notify in &site.notify {
        if !notifiers.contains_key(notify) {
            return Err(ConfigError::UnknownNotifierForSite {
                site: site.url.clone(),
                notifier: notify.clone(),
            });
        }
    }

    Ok(SiteTarget {
        url,
        ignored_links,
        notify: site.notify.clone(),
    })
}

/// Parses an absolute http(s) URL
fn parse_http_url(value: &str, what: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use the http or https scheme",
            what, value
        )));
    }

    Ok(url)
}
