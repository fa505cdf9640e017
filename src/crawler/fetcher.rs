//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests of the crawler:
//! - Building the HTTP client shared by every site
//! - GET requests following redirects
//! - Classification of the response into a [`FetchResult`]

use crate::config::CrawlerOptions;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// The server answered with a success status
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Page body, only read for HTML responses
        body: Option<String>,
    },

    /// The server answered with a non-success status
    HttpError {
        /// Final URL after redirects
        final_url: Url,
        /// The HTTP status code
        status_code: u16,
        /// Canonical reason phrase of the status
        description: String,
    },

    /// No usable response (connection refused, timeout, too many redirects, ...)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use deadlink_patrol::config::CrawlerOptions;
/// use deadlink_patrol::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerOptions::default()).unwrap();
/// ```
pub fn build_http_client(options: &CrawlerOptions) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(options.user_agent.as_str())
        .timeout(options.request_timeout)
        .connect_timeout(options.request_timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// Only bodies of HTML responses (any content type mentioning `html`, so
/// `application/xhtml+xml` too) are downloaded, everything else is checked
/// for its status alone.
pub async fn fetch_url(client: &Client, url: &Url) -> FetchResult {
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            let error = if e.is_timeout() {
                format!("Request timeout: {}", e)
            } else {
                e.to_string()
            };
            return FetchResult::NetworkError { error };
        }
    };

    let status = response.status();
    let final_url = response.url().clone();

    if !status.is_success() {
        return FetchResult::HttpError {
            final_url,
            status_code: status.as_u16(),
            description: status
                .canonical_reason()
                .unwrap_or("Unknown Status")
                .to_string(),
        };
    }

    let is_html = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("html"))
        .unwrap_or(false);

    if !is_html {
        return FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body: None,
        };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body: Some(body),
        },
        Err(e) => FetchResult::NetworkError {
            error: format!("Failed to read body: {}", e),
        },
    }
}
