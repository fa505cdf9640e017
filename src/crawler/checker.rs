//! Broken link checking of a single site
//!
//! Glues the crawl engine to the classifier and the recorder: every link
//! found on a page of the site is recorded, then followed, and every link
//! that fails to resolve is recorded as broken.

use crate::config::{CrawlerOptions, SiteTarget};
use crate::crawler::classifier::{
    classify, classify_fetch_error, classify_request_error, element_targets,
};
use crate::crawler::engine::{crawl, CrawlHandler, Crawler, FetchError, LinkContext, RequestContext};
use crate::crawler::parser::{ElementTarget, LinkElement, ParsedPage};
use crate::record::{BrokenLink, Recorder};
use crate::CrawlError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

/// Crawl handler recording the links of one site
pub struct SiteChecker {
    site_url: String,
    recorder: Recorder,
}

impl SiteChecker {
    pub fn new(site_url: impl Into<String>, recorder: Recorder) -> Self {
        Self {
            site_url: site_url.into(),
            recorder,
        }
    }
}

#[async_trait]
impl CrawlHandler for SiteChecker {
    fn targets(&self) -> Vec<ElementTarget> {
        element_targets()
    }

    async fn on_element(&self, crawler: &Crawler, page: &ParsedPage, element: &LinkElement) {
        for link in classify(element, page, &self.site_url) {
            self.recorder.record_link(link.clone()).await;

            let context = LinkContext {
                page_url: link.page_url.clone(),
                tag: link.tag.clone(),
                attribute: link.attribute.clone(),
                link_value: link.link_value.clone(),
                link_absolute_url: link.absolute_url.clone(),
            };

            if let Err(e) = crawler.request(&link.absolute_url, Some(context)) {
                match classify_request_error(&e) {
                    Some(details) => {
                        tracing::warn!(
                            site_url = %self.site_url,
                            page_url = %link.page_url,
                            link_value = %link.link_value,
                            "Failed to visit link: {}",
                            e
                        );
                        self.recorder
                            .record_broken_link(BrokenLink {
                                absolute_url: link.absolute_url,
                                details,
                            })
                            .await;
                    }
                    None => tracing::trace!("Not visiting {}: {}", link.absolute_url, e),
                }
            }
        }
    }

    async fn on_error(&self, request: &RequestContext, error: &FetchError) {
        let Some(link) = &request.link else {
            return;
        };

        match classify_fetch_error(error) {
            Some(details) => {
                tracing::warn!(
                    site_url = %self.site_url,
                    page_url = %link.page_url,
                    tag = %link.tag,
                    attribute = %link.attribute,
                    link_value = %link.link_value,
                    status_code = details.status_code,
                    "Broken link: {}",
                    error
                );
                self.recorder
                    .record_broken_link(BrokenLink {
                        absolute_url: link.link_absolute_url.clone(),
                        details,
                    })
                    .await;
            }
            None => tracing::info!(
                site_url = %self.site_url,
                link_value = %link.link_value,
                "Skipping link: {}",
                error
            ),
        }
    }
}

/// Crawls a site and feeds its observations to `recorder`
///
/// Returns once the crawl is complete. The recorder is not stopped.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `site` - The site to check
/// * `options` - Crawler limits
/// * `recorder` - Receives every link and broken link of the site
///
/// # Returns
///
/// * `Ok(())` - The site was crawled
/// * `Err(CrawlError)` - The crawl could not start or the root is unreachable
pub async fn check_site(
    client: &Client,
    site: &SiteTarget,
    options: &CrawlerOptions,
    recorder: Recorder,
) -> Result<(), CrawlError> {
    tracing::info!(site_url = %site.url, "Checking site");
    let handler = Arc::new(SiteChecker::new(site.url_string(), recorder));
    crawl(client, site, options, handler).await
}
