//! Crawl engine for a single site
//!
//! The engine owns the request queue, duplicate-URL suppression, the
//! ignored-link filter and the fetch concurrency limit. It knows nothing
//! about links or reports: every matched element and every failed fetch is
//! handed to a [`CrawlHandler`], which decides what to record and which
//! links to follow through [`Crawler::request`].

use crate::config::{CrawlerOptions, SiteTarget};
use crate::crawler::fetcher::{fetch_url, FetchResult};
use crate::crawler::parser::{parse_html, ElementTarget, LinkElement, ParsedPage};
use crate::CrawlError;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use url::Url;

/// Why a request was refused before being sent
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("URL already visited: {0}")]
    AlreadyVisited(String),

    #[error("URL forbidden by ignored links: {0}")]
    Forbidden(String),

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported scheme '{scheme}' in URL {url}")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("crawl already finished")]
    Closed,
}

/// Terminal failure of a sent request
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} already visited (redirected from {from})")]
    AlreadyVisited { url: String, from: String },

    #[error("redirect from {from} to ignored link {url} is forbidden")]
    ForbiddenRedirect { url: String, from: String },

    #[error("{description}")]
    Status { status_code: u16, description: String },

    #[error("{0}")]
    Transport(String),
}

impl FetchError {
    /// HTTP status code of the failure, 0 when no response was received
    pub fn status_code(&self) -> u16 {
        match self {
            FetchError::Status { status_code, .. } => *status_code,
            _ => 0,
        }
    }
}

/// Context of the link a request was made for
///
/// Travels with the request so failures can be attributed to the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkContext {
    pub page_url: String,
    pub tag: String,
    pub attribute: String,
    pub link_value: String,
    pub link_absolute_url: String,
}

/// A queued request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub url: Url,
    /// `None` for the site root
    pub link: Option<LinkContext>,
}

/// Callbacks invoked by the engine while crawling
#[async_trait]
pub trait CrawlHandler: Send + Sync + 'static {
    /// Elements to extract from every fetched HTML page
    fn targets(&self) -> Vec<ElementTarget>;

    /// Called once per matched element of a fetched page
    async fn on_element(&self, crawler: &Crawler, page: &ParsedPage, element: &LinkElement);

    /// Called when a request for a link fails
    async fn on_error(&self, request: &RequestContext, error: &FetchError);
}

/// Handle used to submit requests to a running crawl
#[derive(Debug, Clone)]
pub struct Crawler {
    inner: Arc<CrawlerInner>,
}

#[derive(Debug)]
struct CrawlerInner {
    ignored_links: Vec<Regex>,
    visited: Mutex<HashSet<String>>,
    queue: mpsc::UnboundedSender<RequestContext>,
}

impl Crawler {
    fn new(ignored_links: Vec<Regex>, queue: mpsc::UnboundedSender<RequestContext>) -> Self {
        Self {
            inner: Arc::new(CrawlerInner {
                ignored_links,
                visited: Mutex::new(HashSet::new()),
                queue,
            }),
        }
    }

    /// Queues a GET request for `url`
    ///
    /// Fails synchronously when the URL is invalid, not http(s), matched by
    /// an ignored-link pattern or already visited during this crawl.
    pub fn request(&self, url: &str, link: Option<LinkContext>) -> Result<(), RequestError> {
        let mut parsed = Url::parse(url).map_err(|e| RequestError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(RequestError::UnsupportedScheme {
                url: url.to_string(),
                scheme: parsed.scheme().to_string(),
            });
        }
        parsed.set_fragment(None);

        if self.is_ignored(&parsed) {
            return Err(RequestError::Forbidden(parsed.to_string()));
        }
        if !self.mark_visited(&parsed) {
            return Err(RequestError::AlreadyVisited(parsed.to_string()));
        }

        self.inner
            .queue
            .send(RequestContext { url: parsed, link })
            .map_err(|_| RequestError::Closed)
    }

    /// Checks the final URL of a redirected request
    fn check_redirect(&self, from: &Url, to: &Url) -> Result<(), FetchError> {
        let mut target = to.clone();
        target.set_fragment(None);

        if self.is_ignored(&target) {
            return Err(FetchError::ForbiddenRedirect {
                url: target.to_string(),
                from: from.to_string(),
            });
        }
        if !self.mark_visited(&target) {
            return Err(FetchError::AlreadyVisited {
                url: target.to_string(),
                from: from.to_string(),
            });
        }
        Ok(())
    }

    fn is_ignored(&self, url: &Url) -> bool {
        self.inner
            .ignored_links
            .iter()
            .any(|pattern| pattern.is_match(url.as_str()))
    }

    /// Returns false if the URL was already visited
    fn mark_visited(&self, url: &Url) -> bool {
        let mut visited = self
            .inner
            .visited
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        visited.insert(url.to_string())
    }
}

struct CrawlShared<H> {
    client: Client,
    crawler: Crawler,
    handler: Arc<H>,
    targets: Vec<ElementTarget>,
    semaphore: Semaphore,
}

/// Crawls a site starting at its root URL
///
/// Resolves once every queued request has completed and no task can queue
/// new ones. Fails if the root request cannot be sent or its fetch fails.
pub async fn crawl<H: CrawlHandler>(
    client: &Client,
    site: &SiteTarget,
    options: &CrawlerOptions,
    handler: Arc<H>,
) -> Result<(), CrawlError> {
    let (queue_tx, mut queue_rx) = mpsc::unbounded_channel();
    let crawler = Crawler::new(site.ignored_links.clone(), queue_tx);

    crawler
        .request(site.url.as_str(), None)
        .map_err(|e| CrawlError::Start {
            url: site.url.to_string(),
            reason: e.to_string(),
        })?;

    let shared = Arc::new(CrawlShared {
        client: client.clone(),
        crawler,
        targets: handler.targets(),
        handler,
        semaphore: Semaphore::new(options.max_concurrent_requests.max(1)),
    });

    let mut tasks = JoinSet::new();
    let mut root_error = None;
    let mut requests_sent = 0usize;

    loop {
        while let Ok(request) = queue_rx.try_recv() {
            requests_sent += 1;
            tasks.spawn(process_request(shared.clone(), request));
        }
        if tasks.is_empty() {
            break;
        }

        tokio::select! {
            Some(request) = queue_rx.recv() => {
                requests_sent += 1;
                tasks.spawn(process_request(shared.clone(), request));
            }
            Some(joined) = tasks.join_next() => match joined {
                Ok(Some(error)) => root_error = Some(error),
                Ok(None) => {}
                Err(e) => tracing::error!(site_url = %site.url, "Crawl task failed: {}", e),
            },
            else => break,
        }
    }

    tracing::debug!(site_url = %site.url, "Crawl finished after {} requests", requests_sent);

    match root_error {
        Some(error) => Err(CrawlError::RootUnreachable {
            url: site.url.to_string(),
            reason: error.to_string(),
        }),
        None => Ok(()),
    }
}

/// Fetches one request and dispatches the outcome to the handler
///
/// Returns the failure of the root request, which has no link to attribute
/// it to.
async fn process_request<H: CrawlHandler>(
    shared: Arc<CrawlShared<H>>,
    request: RequestContext,
) -> Option<FetchError> {
    tracing::debug!("Visiting {}", request.url);

    let result = {
        let _permit = shared.semaphore.acquire().await.ok()?;
        fetch_url(&shared.client, &request.url).await
    };

    let (final_url, outcome) = match result {
        FetchResult::Success {
            final_url, body, ..
        } => (Some(final_url), Ok(body)),
        FetchResult::HttpError {
            final_url,
            status_code,
            description,
        } => (
            Some(final_url),
            Err(FetchError::Status {
                status_code,
                description,
            }),
        ),
        FetchResult::NetworkError { error } => (None, Err(FetchError::Transport(error))),
    };

    let redirect_check = match &final_url {
        Some(final_url) if *final_url != request.url => {
            shared.crawler.check_redirect(&request.url, final_url)
        }
        _ => Ok(()),
    };

    let outcome = redirect_check.and(outcome);
    match outcome {
        Ok(Some(body)) => {
            let page_url = final_url.unwrap_or_else(|| request.url.clone());
            let page = parse_html(&body, &page_url, &shared.targets);
            for element in &page.elements {
                shared
                    .handler
                    .on_element(&shared.crawler, &page, element)
                    .await;
            }
            None
        }
        Ok(None) => None,
        Err(error) if request.link.is_none() => match error {
            FetchError::Status { .. } | FetchError::Transport(_) => Some(error),
            _ => {
                tracing::info!("Root request of site ended early: {}", error);
                None
            }
        },
        Err(error) => {
            shared.handler.on_error(&request, &error).await;
            None
        }
    }
}
