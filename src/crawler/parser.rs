//! HTML parser extracting link-carrying elements
//!
//! The parser does not decide anything about the links it finds: it returns
//! every element matching one of the requested `tag[attribute]` targets,
//! with its attributes and text, for the classifier to judge.

use scraper::{Html, Selector};
use std::collections::HashMap;
use url::Url;

/// A `tag[attribute]` combination to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementTarget {
    pub tag: &'static str,
    pub attribute: &'static str,
}

/// An element matched by an [`ElementTarget`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkElement {
    /// Tag name of the target, e.g. "img"
    pub tag: String,
    /// Attribute of the target carrying the link, e.g. "srcset"
    pub attribute: String,
    /// All attributes of the element
    pub attributes: HashMap<String, String>,
    /// Text content of the element
    pub text: String,
}

impl LinkElement {
    /// Returns the value of an attribute, empty if absent
    pub fn attr(&self, name: &str) -> &str {
        self.attributes.get(name).map(String::as_str).unwrap_or("")
    }

    /// Value of the link-carrying attribute
    pub fn link_attr(&self) -> &str {
        self.attr(&self.attribute)
    }
}

/// A fetched page ready for classification
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// URL the page was served from
    pub url: Url,
    /// Base for resolving relative links (`<base href>` or the page URL)
    pub base_url: Url,
    /// Matched elements in document order, grouped per target
    pub elements: Vec<LinkElement>,
}

/// Parses HTML content and extracts the elements matching `targets`
///
/// # Example
///
/// ```
/// use deadlink_patrol::crawler::{parse_html, ElementTarget};
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// let url = Url::parse("https://example.com/").unwrap();
/// let targets = [ElementTarget { tag: "a", attribute: "href" }];
/// let parsed = parse_html(html, &url, &targets);
/// assert_eq!(parsed.elements[0].link_attr(), "/page");
/// ```
pub fn parse_html(html: &str, page_url: &Url, targets: &[ElementTarget]) -> ParsedPage {
    let document = Html::parse_document(html);
    let base_url = extract_base_url(&document, page_url).unwrap_or_else(|| page_url.clone());

    let mut elements = Vec::new();
    for target in targets {
        let query = format!("{}[{}]", target.tag, target.attribute);
        let selector = match Selector::parse(&query) {
            Ok(selector) => selector,
            Err(e) => {
                tracing::warn!("Invalid selector {}: {:?}", query, e);
                continue;
            }
        };

        for element in document.select(&selector) {
            let attributes = element
                .value()
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();
            elements.push(LinkElement {
                tag: target.tag.to_string(),
                attribute: target.attribute.to_string(),
                attributes,
                text: element.text().collect(),
            });
        }
    }

    ParsedPage {
        url: page_url.clone(),
        base_url,
        elements,
    }
}

/// Resolves the document base from the first `<base href>`, if any
fn extract_base_url(document: &Html, page_url: &Url) -> Option<Url> {
    let selector = Selector::parse("base[href]").ok()?;
    let href = document.select(&selector).next()?.value().attr("href")?;
    page_url.join(href.trim()).ok()
}
