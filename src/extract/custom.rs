//! Extraction driven by per-company selectors.

use std::time::Duration;

use scraper::{ElementRef, Html};
use tracing::debug;

use super::{JobCollector, title_has_any, title_len_ok, wait_for_page_ready};
use crate::browser::Page;
use crate::constants::{CHROME_TAGS, HEADING_TAGS, MIN_TITLE_LENGTH};
use crate::markup::{find_descendant, first_link, has_ancestor, normalized_text, parse_selector, select_first};
use crate::models::{CustomScrapeConfig, LoadState, RawJob};
use crate::urls::{is_same_url, make_absolute, matches_url_pattern};

pub async fn extract_custom(
    page: &dyn Page,
    config: &CustomScrapeConfig,
    wait: LoadState,
    timeout: Duration,
) -> Vec<RawJob> {
    wait_for_page_ready(page, wait, timeout).await;

    let (url, html) = match (page.url().await, page.content().await) {
        (Ok(url), Ok(html)) => (url, html),
        (Err(e), _) | (_, Err(e)) => {
            debug!("Could not read page for custom extraction: {}", e);
            return Vec::new();
        }
    };
    custom_jobs_from_html(&html, &url, config)
}

pub fn custom_jobs_from_html(html: &str, page_url: &str, config: &CustomScrapeConfig) -> Vec<RawJob> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    // First selector that matches anything wins; later ones are fallbacks.
    let containers: Vec<ElementRef> = config
        .container_selectors
        .iter()
        .filter_map(|css| parse_selector(css).map(|selector| (css, selector)))
        .map(|(css, selector)| (css, root.select(&selector).collect::<Vec<_>>()))
        .find(|(_, found)| !found.is_empty())
        .map(|(css, found)| {
            debug!("Found {} containers with selector: {}", found.len(), css);
            found
        })
        .unwrap_or_default();

    let mut collector = JobCollector::default();
    for container in containers {
        if let Some(job) = job_from_container(container, page_url, config) {
            collector.push(job);
        }
    }
    collector.into_jobs()
}

fn job_from_container(container: ElementRef, page_url: &str, config: &CustomScrapeConfig) -> Option<RawJob> {
    if has_ancestor(container, CHROME_TAGS) {
        return None;
    }

    let link = match &config.link_selector {
        Some(css) => select_first(container, css),
        None => first_link(container),
    }?;
    let href = link.value().attr("href").unwrap_or_default();
    if href.is_empty() {
        return None;
    }

    let url = make_absolute(href, page_url);
    if !url.starts_with("http") {
        return None;
    }
    let excluded = &config.exclude_patterns;
    if excluded.urls.iter().any(|pattern| matches_url_pattern(&url, pattern)) {
        return None;
    }
    if is_same_url(&url, page_url) {
        return None;
    }

    let title = config_title(container, link, config.title_selector.as_deref());
    if !title_len_ok(&title, MIN_TITLE_LENGTH) || title_has_any(&title, &excluded.titles) {
        return None;
    }

    let description = config
        .description_selector
        .as_deref()
        .and_then(|css| select_first(container, css))
        .map(normalized_text)
        .unwrap_or_else(|| normalized_text(container));

    Some(RawJob::new(title, url, description))
}

fn config_title(container: ElementRef, link: ElementRef, title_selector: Option<&str>) -> String {
    let from_selector = title_selector
        .and_then(|css| select_first(container, css))
        .map(normalized_text)
        .unwrap_or_default();
    if !from_selector.is_empty() {
        return from_selector;
    }
    let link_text = normalized_text(link);
    if !link_text.is_empty() {
        return link_text;
    }
    find_descendant(container, HEADING_TAGS)
        .map(normalized_text)
        .unwrap_or_default()
}
