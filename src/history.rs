//! Which matches were already reported by the previous run.
//!
//! The previous HTML report doubles as the history store: every job link in
//! it carries the `job-link` class.

use std::collections::HashSet;
use std::path::Path;

use scraper::Html;
use tracing::{debug, warn};

use crate::markup::parse_selector;
use crate::models::JobMatch;

/// Partition into (new, previously seen), keeping input order in both.
pub fn split_matches(matches: &[JobMatch], previous: &HashSet<String>) -> (Vec<JobMatch>, Vec<JobMatch>) {
    matches.iter().cloned().partition(|m| !previous.contains(&m.url))
}

pub fn previous_urls_from_html(html: &str) -> HashSet<String> {
    let document = Html::parse_document(html);
    let Some(selector) = parse_selector("a.job-link[href]") else {
        return HashSet::new();
    };
    document
        .select(&selector)
        .filter_map(|link| link.value().attr("href"))
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

/// URLs listed in an earlier report. A missing or unreadable report means no history.
pub fn load_previous_urls(path: &Path) -> HashSet<String> {
    if !path.exists() {
        debug!("No previous report at {}", path.display());
        return HashSet::new();
    }
    match std::fs::read_to_string(path) {
        Ok(html) => previous_urls_from_html(&html),
        Err(e) => {
            warn!("Could not parse previous matches from {}: {}", path.display(), e);
            HashSet::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(url: &str) -> JobMatch {
        JobMatch {
            title: format!("Job at {}", url),
            url: url.to_string(),
            company: "Acme".to_string(),
            matched_keywords: vec!["rust".to_string()],
        }
    }

    #[test]
    fn test_split_matches() {
        let previous: HashSet<String> = ["https://a.test/u1".to_string()].into_iter().collect();
        let current = vec![job("https://a.test/u1"), job("https://a.test/u2")];

        let (new, existing) = split_matches(&current, &previous);
        assert_eq!(new, vec![job("https://a.test/u2")]);
        assert_eq!(existing, vec![job("https://a.test/u1")]);
    }

    #[test]
    fn test_split_matches_keeps_order() {
        let previous: HashSet<String> = ["https://a.test/2".to_string()].into_iter().collect();
        let current = vec![job("https://a.test/3"), job("https://a.test/2"), job("https://a.test/1")];

        let (new, existing) = split_matches(&current, &previous);
        let urls: Vec<&str> = new.iter().map(|m| m.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.test/3", "https://a.test/1"]);
        assert_eq!(existing.len(), 1);
    }

    #[test]
    fn test_previous_urls_from_html() {
        let html = r#"<html><body>
            <a class="job-link" href="https://a.test/jobs/1">One</a>
            <a class="keyword job-link" href="https://a.test/jobs/2">Two</a>
            <a href="https://a.test/about">About</a>
            <a class="job-link">No href</a>
        </body></html>"#;

        let urls = previous_urls_from_html(html);
        assert_eq!(urls.len(), 2);
        assert!(urls.contains("https://a.test/jobs/1"));
        assert!(urls.contains("https://a.test/jobs/2"));
    }

    #[test]
    fn test_load_previous_urls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job_matches.html");
        assert!(load_previous_urls(&path).is_empty());

        std::fs::write(&path, r#"<a class="job-link" href="https://a.test/jobs/9">Nine</a>"#).unwrap();
        assert!(load_previous_urls(&path).contains("https://a.test/jobs/9"));

        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(load_previous_urls(&path).is_empty());
    }
}
