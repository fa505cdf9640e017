//! Link filter and classifier
//!
//! Decides which attribute values found by the crawler are links worth
//! recording and following, describes them, and tells apart real breakages
//! from benign crawl outcomes.

use crate::crawler::engine::{FetchError, RequestError};
use crate::crawler::parser::{ElementTarget, LinkElement, ParsedPage};
use crate::record::{BrokenLinkDetails, Link, TagText};
use std::fmt;
use url::Url;

/// Link extraction rules of a tag
#[derive(Debug, Clone, Copy)]
pub struct TagConfig {
    pub tag: &'static str,
    /// Attributes carrying links
    pub link_attributes: &'static [&'static str],
    /// The whole element is skipped when one of these attributes has one of the listed values
    pub ignore_when_attribute_matches: &'static [(&'static str, &'static [&'static str])],
}

/// Tags and attributes checked for links
pub const LINK_TAGS: &[TagConfig] = &[
    // Anchors
    TagConfig {
        tag: "a",
        link_attributes: &["href"],
        ignore_when_attribute_matches: &[],
    },
    // Images
    TagConfig {
        tag: "img",
        link_attributes: &["src", "srcset"],
        ignore_when_attribute_matches: &[],
    },
    // Stylesheets and other head links
    TagConfig {
        tag: "link",
        link_attributes: &["href"],
        ignore_when_attribute_matches: &[(
            "rel",
            &["dns-prefetch", "pingback", "preconnect", "profile"],
        )],
    },
    // Scripts
    TagConfig {
        tag: "script",
        link_attributes: &["src"],
        ignore_when_attribute_matches: &[],
    },
    // Part of <picture>
    TagConfig {
        tag: "source",
        link_attributes: &["srcset"],
        ignore_when_attribute_matches: &[],
    },
];

/// Link values with one of these prefixes are never checked
pub const IGNORED_SCHEMES: &[&str] = &["data:", "ftp:", "javascript:", "mailto:", "tel:"];

/// Why a link value was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Same-page anchor
    HashLink,
    /// The page itself is outside the site
    ExternalPage,
    /// Scheme from [`IGNORED_SCHEMES`]
    IgnoredScheme,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::HashLink => "it is a hash link to the current page",
            SkipReason::ExternalPage => "we are on an external site",
            SkipReason::IgnoredScheme => "it has an ignored scheme",
        };
        f.write_str(reason)
    }
}

/// All `tag[attribute]` combinations of [`LINK_TAGS`]
pub fn element_targets() -> Vec<ElementTarget> {
    LINK_TAGS
        .iter()
        .flat_map(|config| {
            config
                .link_attributes
                .iter()
                .map(move |&attribute| ElementTarget {
                    tag: config.tag,
                    attribute,
                })
        })
        .collect()
}

/// Turns a matched element into the link observations to record and follow
///
/// Returns nothing when the element is ignored as a whole or when every link
/// value it carries is dropped.
pub fn classify(element: &LinkElement, page: &ParsedPage, site_url: &str) -> Vec<Link> {
    if let Some((attribute, value)) = ignored_by_attribute(element) {
        tracing::debug!(
            tag = %element.tag,
            attribute = %attribute,
            attribute_value = %value,
            "Link ignored because attribute value is in list to ignore"
        );
        return Vec::new();
    }

    let page_url = page.url.as_str();
    let tag_text = tag_text(element);

    link_values(element)
        .into_iter()
        .filter_map(|link_value| {
            if let Some(reason) = skip_reason(&link_value, page_url, site_url) {
                tracing::debug!(
                    site_url = %site_url,
                    page_url = %page_url,
                    link_value = %link_value,
                    "Link ignored because {}",
                    reason
                );
                return None;
            }

            Some(Link {
                absolute_url: resolve(&link_value, &page.base_url),
                link_value,
                page_url: page_url.to_string(),
                tag: element.tag.clone(),
                attribute: element.attribute.clone(),
                tag_text: tag_text.clone(),
            })
        })
        .collect()
}

/// Returns the attribute and value that cause the element to be ignored
fn ignored_by_attribute(element: &LinkElement) -> Option<(&'static str, String)> {
    let config = LINK_TAGS.iter().find(|config| config.tag == element.tag)?;
    config
        .ignore_when_attribute_matches
        .iter()
        .find_map(|(attribute, ignored_values)| {
            let value = element.attr(attribute).trim();
            ignored_values
                .contains(&value)
                .then(|| (*attribute, value.to_string()))
        })
}

/// Splits the link attribute into candidate link values
///
/// A `srcset` holds comma separated "URL descriptor" pairs, of which only
/// the URL is a link. Empty candidates are dropped.
pub fn link_values(element: &LinkElement) -> Vec<String> {
    let raw = element.link_attr();
    if element.attribute == "srcset" {
        raw.split(',')
            .filter_map(|item| item.split_whitespace().next())
            .map(str::to_string)
            .collect()
    } else {
        vec![raw.to_string()]
    }
}

/// Decides whether a link value must be dropped
pub fn skip_reason(link_value: &str, page_url: &str, site_url: &str) -> Option<SkipReason> {
    if link_value.starts_with('#') {
        return Some(SkipReason::HashLink);
    }
    if !page_url.starts_with(site_url) {
        return Some(SkipReason::ExternalPage);
    }
    let lowered = link_value.trim_start().to_ascii_lowercase();
    if IGNORED_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return Some(SkipReason::IgnoredScheme);
    }
    None
}

/// Describes the element by its text, depending on the tag
pub fn tag_text(element: &LinkElement) -> TagText {
    match element.tag.as_str() {
        "a" => TagText::content(element.text.trim()),
        "img" => TagText::attribute("alt", element.attr("alt")),
        "link" => TagText::attribute("rel", element.attr("rel")),
        _ => TagText::none(),
    }
}

/// Resolves a link value against the page base, without fragment
///
/// Returns an empty string if the value cannot be resolved.
pub fn resolve(link_value: &str, base_url: &Url) -> String {
    match base_url.join(link_value.trim()) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => String::new(),
    }
}

/// Failure details of a sent request, `None` for benign outcomes
///
/// A request ending on an already visited URL almost certainly converged
/// with another one through a redirect, and a redirect onto an ignored link
/// was excluded on purpose. Neither is a broken link.
pub fn classify_fetch_error(error: &FetchError) -> Option<BrokenLinkDetails> {
    match error {
        FetchError::AlreadyVisited { .. } | FetchError::ForbiddenRedirect { .. } => None,
        FetchError::Status { .. } | FetchError::Transport(_) => Some(BrokenLinkDetails::new(
            error.status_code(),
            error.to_string(),
        )),
    }
}

/// Failure details of a refused request, `None` for benign refusals
pub fn classify_request_error(error: &RequestError) -> Option<BrokenLinkDetails> {
    match error {
        RequestError::AlreadyVisited(_) | RequestError::Forbidden(_) => None,
        _ => Some(BrokenLinkDetails::new(
            0,
            format!("Failed to create request: {}", error),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TagTextKind;
    use std::collections::HashMap;

    const SITE: &str = "https://example.com/";

    fn element(tag: &str, attribute: &str, attrs: &[(&str, &str)], text: &str) -> LinkElement {
        LinkElement {
            tag: tag.to_string(),
            attribute: attribute.to_string(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            text: text.to_string(),
        }
    }

    fn page(url: &str) -> ParsedPage {
        let url = Url::parse(url).unwrap();
        ParsedPage {
            base_url: url.clone(),
            url,
            elements: vec![],
        }
    }

    #[test]
    fn test_element_targets_cover_table() {
        let targets = element_targets();
        assert_eq!(targets.len(), 6);
        assert!(targets.contains(&ElementTarget {
            tag: "img",
            attribute: "srcset"
        }));
        assert!(targets.contains(&ElementTarget {
            tag: "source",
            attribute: "srcset"
        }));
    }

    #[test]
    fn test_anchor_relative_link() {
        let el = element("a", "href", &[("href", "/about")], "  About us \n");
        let links = classify(&el, &page("https://example.com/docs/"), SITE);

        assert_eq!(links.len(), 1);
        let link = &links[0];
        assert_eq!(link.link_value, "/about");
        assert_eq!(link.absolute_url, "https://example.com/about");
        assert_eq!(link.page_url, "https://example.com/docs/");
        assert_eq!(link.tag, "a");
        assert_eq!(link.attribute, "href");
        assert_eq!(link.tag_text, TagText::content("About us"));
    }

    #[test]
    fn test_image_uses_alt_text() {
        let el = element("img", "src", &[("src", "logo.png"), ("alt", "Logo")], "");
        let links = classify(&el, &page("https://example.com/docs/"), SITE);

        assert_eq!(links[0].absolute_url, "https://example.com/docs/logo.png");
        assert_eq!(links[0].tag_text, TagText::attribute("alt", "Logo"));
    }

    #[test]
    fn test_script_has_no_text() {
        let el = element("script", "src", &[("src", "/app.js")], "");
        let links = classify(&el, &page(SITE), SITE);
        assert_eq!(links[0].tag_text.kind, TagTextKind::None);
    }

    #[test]
    fn test_srcset_yields_one_link_per_item() {
        let el = element(
            "img",
            "srcset",
            &[("srcset", "/img/a1x.jpg 1x, /img/a2x.jpg 2x,/img/a4x.jpg   4x")],
            "",
        );
        let links = classify(&el, &page(SITE), SITE);

        let values: Vec<&str> = links.iter().map(|l| l.link_value.as_str()).collect();
        assert_eq!(values, vec!["/img/a1x.jpg", "/img/a2x.jpg", "/img/a4x.jpg"]);
        assert!(links.iter().all(|l| l.attribute == "srcset"));
    }

    #[test]
    fn test_srcset_skips_empty_items() {
        let el = element("source", "srcset", &[("srcset", "/a.webp 480w, ")], "");
        assert_eq!(link_values(&el), vec!["/a.webp"]);
    }

    #[test]
    fn test_stylesheet_rel_ignored() {
        for rel in ["dns-prefetch", "pingback", "preconnect", " profile "] {
            let el = element(
                "link",
                "href",
                &[("href", "https://fonts.example.net"), ("rel", rel)],
                "",
            );
            assert!(classify(&el, &page(SITE), SITE).is_empty(), "rel={}", rel);
        }

        let el = element("link", "href", &[("href", "/main.css"), ("rel", "stylesheet")], "");
        let links = classify(&el, &page(SITE), SITE);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].tag_text, TagText::attribute("rel", "stylesheet"));
    }

    #[test]
    fn test_hash_link_dropped() {
        let el = element("a", "href", &[("href", "#top")], "Top");
        assert!(classify(&el, &page(SITE), SITE).is_empty());
    }

    #[test]
    fn test_external_page_dropped() {
        let el = element("a", "href", &[("href", "/anything")], "x");
        assert!(classify(&el, &page("https://other.org/page"), SITE).is_empty());
    }

    #[test]
    fn test_ignored_schemes_dropped() {
        for value in [
            "mailto:someone@example.com",
            "tel:+3212345678",
            "javascript:void(0)",
            "data:image/png;base64,AAAA",
            "ftp://files.example.com/x",
            "MAILTO:upper@example.com",
        ] {
            assert_eq!(
                skip_reason(value, SITE, SITE),
                Some(SkipReason::IgnoredScheme),
                "{}",
                value
            );
        }
        assert_eq!(skip_reason("https://other.org", SITE, SITE), None);
    }

    #[test]
    fn test_fragment_stripped_from_absolute_url() {
        let base = Url::parse("https://example.com/docs/").unwrap();
        assert_eq!(resolve("page#section", &base), "https://example.com/docs/page");
        assert_eq!(resolve("//cdn.example.net/x.js", &base), "https://cdn.example.net/x.js");
        assert_eq!(resolve("http://[broken", &base), "");
    }

    #[test]
    fn test_base_href_used_for_resolution() {
        let mut p = page("https://example.com/docs/page");
        p.base_url = Url::parse("https://example.com/static/").unwrap();
        let el = element("img", "src", &[("src", "a.png")], "");

        let links = classify(&el, &p, SITE);
        assert_eq!(links[0].absolute_url, "https://example.com/static/a.png");
        assert_eq!(links[0].page_url, "https://example.com/docs/page");
    }

    #[test]
    fn test_benign_fetch_errors() {
        let visited = FetchError::AlreadyVisited {
            url: "https://example.com/b".to_string(),
            from: "https://example.com/a".to_string(),
        };
        let forbidden = FetchError::ForbiddenRedirect {
            url: "https://example.com/private".to_string(),
            from: "https://example.com/a".to_string(),
        };
        assert_eq!(classify_fetch_error(&visited), None);
        assert_eq!(classify_fetch_error(&forbidden), None);
    }

    #[test]
    fn test_broken_fetch_errors() {
        let status = FetchError::Status {
            status_code: 404,
            description: "Not Found".to_string(),
        };
        assert_eq!(
            classify_fetch_error(&status),
            Some(BrokenLinkDetails::new(404, "Not Found"))
        );

        let transport = FetchError::Transport("connection refused".to_string());
        assert_eq!(
            classify_fetch_error(&transport),
            Some(BrokenLinkDetails::new(0, "connection refused"))
        );
    }

    #[test]
    fn test_request_errors() {
        assert_eq!(
            classify_request_error(&RequestError::AlreadyVisited("x".to_string())),
            None
        );
        assert_eq!(
            classify_request_error(&RequestError::Forbidden("x".to_string())),
            None
        );

        let details = classify_request_error(&RequestError::InvalidUrl {
            url: String::new(),
            reason: "relative URL without a base".to_string(),
        })
        .unwrap();
        assert_eq!(details.status_code, 0);
        assert!(details
            .status_description
            .starts_with("Failed to create request: "));
    }
}
