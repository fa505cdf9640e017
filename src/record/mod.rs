//! Recording of links and broken links found by the crawler
//!
//! This module contains the observation entities and the [`Recorder`], which
//! safely collects observations from many concurrent crawl tasks of one site.

mod entities;
mod recorder;

pub use entities::{BrokenLink, BrokenLinkDetails, Link, Recording, TagText, TagTextKind};
pub use recorder::Recorder;
