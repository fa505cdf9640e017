//! Conversion of recordings into per-site reports
//!
//! A report counts every link of a site per page and lists the broken ones,
//! deduplicated and in a stable order so consecutive runs over an unchanged
//! site can be diffed.

mod entities;
mod generator;

pub use entities::{BrokenLink, BrokenLinkKey, Report, SiteReport, Statistics};
pub use generator::{generate_report, reports_to_json};
