//! Crawler module for checking the links of a site
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching following redirects
//! - HTML parsing of link-carrying elements
//! - Link filtering and failure classification
//! - The per-site crawl loop

mod checker;
mod classifier;
mod engine;
mod fetcher;
mod parser;

pub use checker::{check_site, SiteChecker};
pub use classifier::{
    classify, classify_fetch_error, classify_request_error, element_targets, link_values,
    resolve, skip_reason, tag_text, SkipReason, TagConfig, IGNORED_SCHEMES, LINK_TAGS,
};
pub use engine::{
    crawl, CrawlHandler, Crawler, FetchError, LinkContext, RequestContext, RequestError,
};
pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use parser::{parse_html, ElementTarget, LinkElement, ParsedPage};
