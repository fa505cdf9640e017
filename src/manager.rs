//! Orchestration of a complete check run
//!
//! A run checks every configured site in its own task, collects the site
//! reports, notifies the notifiers of the sites with broken links and
//! finally pings the health check URL when every notification went out.

use crate::config::{Config, CrawlerOptions, NotifierTarget, SiteTarget};
use crate::crawler::{build_http_client, check_site};
use crate::notify::Templates;
use crate::record::{BrokenLink, BrokenLinkDetails, Link, Recorder};
use crate::report::{generate_report, Report, SiteReport};
use crate::PatrolError;
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use url::Url;

/// Runs checks and dispatches notifications
///
/// Owns the template registry and the HTTP client, both built once and
/// reused by every run.
#[derive(Debug)]
pub struct Manager {
    templates: Templates,
    client: Client,
}

impl Manager {
    /// Creates a manager with the built-in templates
    pub fn new(options: &CrawlerOptions) -> Result<Self, PatrolError> {
        Ok(Self::with_templates(Templates::new()?, build_http_client(options)?))
    }

    pub fn with_templates(templates: Templates, client: Client) -> Self {
        Self { templates, client }
    }

    /// Checks every site of the config and notifies about broken links
    ///
    /// Never fails: sites that cannot be checked are reported as broken and
    /// notification failures are logged.
    ///
    /// # Returns
    ///
    /// The report of every site, keyed by site URL
    pub async fn run(&self, config: &Config) -> BTreeMap<String, Report> {
        let (all_reports, broken_reports) = self.check_sites(config).await;

        if broken_reports.is_empty() {
            tracing::info!("No broken links found in provided sites");
            self.ping_health_check(config.health_check_url.as_ref()).await;
            return all_reports;
        }

        let sites: Vec<&str> = broken_reports.keys().map(String::as_str).collect();
        tracing::info!(
            sites = ?sites,
            "Sites with broken links found, sending notifications ..."
        );

        let batches = route_reports(config, &broken_reports);
        let mut error_detected = false;
        for (notifier, reports) in batches.into_values() {
            if !self.notify(notifier, &reports).await {
                error_detected = true;
            }
        }

        if !error_detected {
            self.ping_health_check(config.health_check_url.as_ref()).await;
        }
        all_reports
    }

    /// Checks all sites concurrently and collects their reports
    ///
    /// Returns all reports and the subset with broken links.
    async fn check_sites(
        &self,
        config: &Config,
    ) -> (BTreeMap<String, Report>, BTreeMap<String, Report>) {
        let (report_tx, mut report_rx) = mpsc::channel::<SiteReport>(config.sites.len().max(1));
        let site_limit = config
            .crawler
            .max_concurrent_sites
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        for site in &config.sites {
            let site = site.clone();
            let client = self.client.clone();
            let options = config.crawler.clone();
            let report_tx = report_tx.clone();
            let site_limit = site_limit.clone();

            tokio::spawn(async move {
                let _permit = match site_limit {
                    Some(limit) => limit.acquire_owned().await.ok(),
                    None => None,
                };
                let site_report = check_and_report(&client, &site, &options).await;
                if report_tx.send(site_report).await.is_err() {
                    tracing::error!(site_url = %site.url, "Report collector is gone");
                }
            });
        }
        drop(report_tx);

        let mut all_reports = BTreeMap::new();
        let mut broken_reports = BTreeMap::new();
        while let Some(site_report) = report_rx.recv().await {
            if site_report.has_broken_links() {
                broken_reports.insert(site_report.site_url.clone(), site_report.report.clone());
            }
            all_reports.insert(site_report.site_url, site_report.report);
        }

        if all_reports.len() != config.sites.len() {
            tracing::error!(
                expected = config.sites.len(),
                received = all_reports.len(),
                "Some site checks did not produce a report"
            );
        }
        (all_reports, broken_reports)
    }

    /// Renders and sends the batch of one notifier
    ///
    /// Returns false if rendering or delivery failed.
    async fn notify(&self, notifier: &NotifierTarget, reports: &BTreeMap<String, Report>) -> bool {
        tracing::debug!(
            notifier_name = %notifier.name,
            template_name = %notifier.template,
            "Generating template for notifier '{}' ...",
            notifier.name
        );
        let message = match self.templates.render(&notifier.template, reports) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(
                    notifier_name = %notifier.name,
                    template_name = %notifier.template,
                    error = %e,
                    "Failed to render template for sending notification"
                );
                return false;
            }
        };

        tracing::debug!(
            notifier_name = %notifier.name,
            service = notifier.sender.service(),
            "Sending message with notifier '{}' ...",
            notifier.name
        );
        match notifier.sender.send(&message).await {
            Ok(()) => {
                tracing::debug!(notifier_name = %notifier.name, "Message sent");
                true
            }
            Err(e) => {
                tracing::error!(
                    notifier_name = %notifier.name,
                    error = %e,
                    "Failed to send notification"
                );
                false
            }
        }
    }

    /// Best-effort GET of the health check URL
    async fn ping_health_check(&self, url: Option<&Url>) {
        let Some(url) = url else {
            return;
        };

        match self.client.get(url.clone()).send().await {
            Ok(response) if !response.status().is_success() => tracing::warn!(
                health_check_url = %url,
                status_code = response.status().as_u16(),
                "Health check URL answered with an error status"
            ),
            Ok(_) => tracing::debug!(health_check_url = %url, "Health check URL called"),
            Err(e) => tracing::error!(
                health_check_url = %url,
                error = %e,
                "Failed to send GET request to health check URL"
            ),
        }
    }
}

/// Checks a single site and turns its recording into a report
///
/// A site that cannot be crawled is reported with a single broken entry for
/// its root URL.
pub async fn check_and_report(
    client: &Client,
    site: &SiteTarget,
    options: &CrawlerOptions,
) -> SiteReport {
    let recorder = Recorder::new();

    if let Err(e) = check_site(client, site, options, recorder.clone()).await {
        tracing::error!(
            site_url = %site.url,
            error = %e,
            "Failed to run checker. Will mark as broken link."
        );
        let site_url = site.url_string();
        recorder.record_link(Link::site_root(&site_url)).await;
        recorder
            .record_broken_link(BrokenLink {
                absolute_url: site_url,
                details: BrokenLinkDetails::new(0, format!("Failed to run checker: {}", e)),
            })
            .await;
    }

    let recording = recorder.stop().await;
    generate_report(site, recording)
}

/// Groups the reports of broken sites per notifier
///
/// Sites are visited in config order; a site listing a notifier twice is
/// only added once to its batch.
pub fn route_reports<'a>(
    config: &'a Config,
    broken_reports: &BTreeMap<String, Report>,
) -> BTreeMap<&'a str, (&'a NotifierTarget, BTreeMap<String, Report>)> {
    let mut batches: BTreeMap<&str, (&NotifierTarget, BTreeMap<String, Report>)> =
        BTreeMap::new();

    for site in &config.sites {
        let site_url = site.url_string();
        let Some(report) = broken_reports.get(&site_url) else {
            continue;
        };

        for name in &site.notify {
            let Some(notifier) = config.notifiers.get(name) else {
                tracing::warn!(site_url = %site_url, notifier_name = %name, "Unknown notifier");
                continue;
            };
            batches
                .entry(notifier.name.as_str())
                .or_insert_with(|| (notifier, BTreeMap::new()))
                .1
                .insert(site_url.clone(), report.clone());
        }
    }
    batches
}
