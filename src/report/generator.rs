use crate::config::SiteTarget;
use crate::record::Recording;
use crate::report::entities::{BrokenLink, BrokenLinkKey, Report, SiteReport};
use std::collections::{BTreeMap, HashMap};

/// Generates the report of a site from its recording
///
/// Broken link occurrences sharing the same identity on a page are merged
/// into a single entry carrying the number of occurrences. Entries of a page
/// are sorted by their canonical string form, so unchanged input always
/// produces an identical report.
pub fn generate_report(site: &SiteTarget, recording: Recording) -> SiteReport {
    let mut site_report = SiteReport::empty(site.url_string());
    let statistics = &mut site_report.report.statistics;
    let mut counts_by_page: HashMap<String, HashMap<BrokenLinkKey, usize>> = HashMap::new();

    for link in &recording.links {
        statistics.links_count_total += 1;
        *statistics
            .links_count_by_page_url
            .entry(link.page_url.clone())
            .or_insert(0) += 1;

        if let Some(details) = recording.broken_link_by_abs_url.get(&link.absolute_url) {
            let key = BrokenLinkKey::new(link, details);
            *counts_by_page
                .entry(link.page_url.clone())
                .or_default()
                .entry(key)
                .or_insert(0) += 1;
        }
    }

    site_report.report.broken_links_by_page_url = counts_by_page
        .into_iter()
        .map(|(page_url, counts)| {
            let mut entries: Vec<(String, BrokenLink)> = counts
                .into_iter()
                .map(|(key, count)| {
                    let entry = BrokenLink::from_key(key, count);
                    (entry.to_string(), entry)
                })
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            (page_url, entries.into_iter().map(|(_, e)| e).collect())
        })
        .collect::<BTreeMap<_, _>>();

    site_report
}

/// Serializes the reports of a run, keyed by site URL, as pretty JSON
pub fn reports_to_json(reports: &BTreeMap<String, Report>) -> crate::Result<String> {
    Ok(serde_json::to_string_pretty(reports)?)
}
