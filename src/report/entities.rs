use crate::record::{BrokenLinkDetails, Link, TagTextKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Report of a single site, keyed by its root URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteReport {
    pub site_url: String,
    pub report: Report,
}

impl SiteReport {
    /// Returns a report without links or broken links
    pub fn empty(site_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            report: Report::default(),
        }
    }

    /// Whether at least one page has a broken link
    pub fn has_broken_links(&self) -> bool {
        self.report
            .broken_links_by_page_url
            .values()
            .any(|links| !links.is_empty())
    }
}

/// Deduplicated and counted result of a site crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    #[serde(rename = "Statistics")]
    pub statistics: Statistics,
    #[serde(rename = "BrokenLinksByPageURL")]
    pub broken_links_by_page_url: BTreeMap<String, Vec<BrokenLink>>,
}

/// Link counters of a site crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(rename = "LinksCountTotal")]
    pub links_count_total: usize,
    #[serde(rename = "LinksCountByPageURL")]
    pub links_count_by_page_url: BTreeMap<String, usize>,
}

/// A broken link as shown in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLink {
    /// Value of the link, most likely a URL. Can be relative or absolute.
    #[serde(rename = "LinkValue")]
    pub link_value: String,
    /// Absolute URL based on the link value. Empty if not a valid URL.
    #[serde(rename = "AbsoluteURL")]
    pub absolute_url: String,
    /// HTML tag, e.g. "img"
    #[serde(rename = "Tag")]
    pub tag: String,
    #[serde(rename = "IsTagTextTypeAttribute")]
    pub is_tag_text_type_attribute: bool,
    #[serde(rename = "IsTagTextTypeContent")]
    pub is_tag_text_type_content: bool,
    #[serde(rename = "IsTagTextTypeNone")]
    pub is_tag_text_type_none: bool,
    /// Key of the text for the tag, e.g. "alt" for an image
    #[serde(rename = "TagTextKey")]
    pub tag_text_key: String,
    /// Content of the tag or of the relevant attribute
    #[serde(rename = "TagTextValue")]
    pub tag_text_value: String,
    /// HTML attribute of the tag, e.g. "src"
    #[serde(rename = "Attribute")]
    pub attribute: String,
    /// HTTP status code, 0 when no response was received
    #[serde(rename = "StatusCode")]
    pub status_code: u16,
    /// Human readable status or error description
    #[serde(rename = "StatusDescription")]
    pub status_description: String,
    /// Occurrences of this exact link on the page
    #[serde(rename = "CountOnPage")]
    pub count_on_page: usize,
}

impl BrokenLink {
    /// Builds a report entry from the key it was counted under
    pub fn from_key(key: BrokenLinkKey, count_on_page: usize) -> Self {
        Self {
            link_value: key.link_value,
            absolute_url: key.absolute_url,
            tag: key.tag,
            is_tag_text_type_attribute: key.tag_text_kind == TagTextKind::Attribute,
            is_tag_text_type_content: key.tag_text_kind == TagTextKind::Content,
            is_tag_text_type_none: key.tag_text_kind == TagTextKind::None,
            tag_text_key: key.tag_text_key,
            tag_text_value: key.tag_text_value,
            attribute: key.attribute,
            status_code: key.status_code,
            status_description: key.status_description,
            count_on_page,
        }
    }
}

/// Canonical form used to order entries within a page
impl fmt::Display for BrokenLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "link_value={};absolute_url={};tag={};is_tag_text_type_attribute={};\
             is_tag_text_type_content={};is_tag_text_type_none={};tag_text_key={};\
             tag_text_value={};attribute={};status_code={};status_description={};\
             count_on_page={}",
            self.link_value,
            self.absolute_url,
            self.tag,
            self.is_tag_text_type_attribute,
            self.is_tag_text_type_content,
            self.is_tag_text_type_none,
            self.tag_text_key,
            self.tag_text_value,
            self.attribute,
            self.status_code,
            self.status_description,
            self.count_on_page,
        )
    }
}

/// Identity of a broken link occurrence
///
/// Two occurrences on the same page are counted as one entry when all of
/// these fields are equal. The page URL is part of the identity through the
/// per-page grouping of the generator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BrokenLinkKey {
    pub link_value: String,
    pub absolute_url: String,
    pub tag: String,
    pub attribute: String,
    pub tag_text_kind: TagTextKind,
    pub tag_text_key: String,
    pub tag_text_value: String,
    pub status_code: u16,
    pub status_description: String,
}

impl BrokenLinkKey {
    pub fn new(link: &Link, details: &BrokenLinkDetails) -> Self {
        Self {
            link_value: link.link_value.clone(),
            absolute_url: link.absolute_url.clone(),
            tag: link.tag.clone(),
            attribute: link.attribute.clone(),
            tag_text_kind: link.tag_text.kind,
            tag_text_key: link.tag_text.key.clone(),
            tag_text_value: link.tag_text.value.clone(),
            status_code: details.status_code,
            status_description: details.status_description.clone(),
        }
    }
}
