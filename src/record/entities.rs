use std::collections::HashMap;

/// Raw result of one site crawl
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    /// Every link observed during the crawl, in recording order
    pub links: Vec<Link>,
    /// Latest failure details per absolute URL
    pub broken_link_by_abs_url: HashMap<String, BrokenLinkDetails>,
}

/// A single link reference discovered on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Value of the link, most likely a URL. Can be relative or absolute.
    pub link_value: String,
    /// Absolute URL based on the link value. Empty if not a valid URL.
    pub absolute_url: String,
    /// URL of the page on which the link was found
    pub page_url: String,
    /// HTML tag, e.g. "img"
    pub tag: String,
    /// HTML attribute of the tag, e.g. "src"
    pub attribute: String,
    /// Descriptive text of the tag
    pub tag_text: TagText,
}

impl Link {
    /// Synthetic observation standing in for a site whose crawl failed
    pub fn site_root(site_url: &str) -> Self {
        Self {
            link_value: site_url.to_string(),
            absolute_url: site_url.to_string(),
            page_url: site_url.to_string(),
            tag: String::new(),
            attribute: String::new(),
            tag_text: TagText::none(),
        }
    }
}

/// Where the descriptive text of a tag comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagTextKind {
    /// Text is in an attribute, e.g. `alt` of an image
    Attribute,
    /// Text is the content of the tag, e.g. anchor text
    Content,
    /// Tag has no relevant text
    None,
}

impl TagTextKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagTextKind::Attribute => "ATTRIBUTE",
            TagTextKind::Content => "CONTENT",
            TagTextKind::None => "NONE",
        }
    }
}

/// Descriptive text of a tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagText {
    pub kind: TagTextKind,
    /// Key of the text, e.g. "alt" for an image. Empty unless attribute-sourced.
    pub key: String,
    pub value: String,
}

impl TagText {
    pub fn attribute(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: TagTextKind::Attribute,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn content(value: impl Into<String>) -> Self {
        Self {
            kind: TagTextKind::Content,
            key: String::new(),
            value: value.into(),
        }
    }

    pub fn none() -> Self {
        Self {
            kind: TagTextKind::None,
            key: String::new(),
            value: String::new(),
        }
    }
}

/// Failure of a followed link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLink {
    pub absolute_url: String,
    pub details: BrokenLinkDetails,
}

/// Why a link is broken
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BrokenLinkDetails {
    /// HTTP status code, 0 when the request failed before a response
    pub status_code: u16,
    /// Human readable status or error description
    pub status_description: String,
}

impl BrokenLinkDetails {
    pub fn new(status_code: u16, status_description: impl Into<String>) -> Self {
        Self {
            status_code,
            status_description: status_description.into(),
        }
    }
}
