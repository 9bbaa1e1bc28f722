//! Built-in heuristics for job boards nobody wrote selectors for.

use std::collections::HashSet;
use std::time::Duration;

use scraper::{ElementRef, Html};
use tracing::debug;

use super::{JobCollector, title_has_any, title_len_ok, wait_for_page_ready};
use crate::browser::Page;
use crate::constants::{
    CHROME_TAGS, DATA_ATTR_EXCLUSIONS, DEFAULT_CONTAINER_ATTRS, DEFAULT_CONTAINER_KEYWORDS, DEFAULT_CONTAINER_TAGS,
    FALLBACK_TITLE_CHARS, HEADING_TAGS, JOB_LINK_SELECTORS, JOB_URL_PATTERNS, MIN_ROW_TEXT_LENGTH, MIN_TITLE_LENGTH,
    NON_JOB_KEYWORDS, RESULT_ITEM_PATTERNS,
};
use crate::markup::{closest, find_descendant, first_link, has_ancestor, normalized_text, parent_element, parse_selector};
use crate::models::{LoadState, RawJob};
use crate::urls::{domain_of, is_same_url, looks_like_job_url, make_absolute};

pub async fn extract_default(page: &dyn Page, wait: LoadState, timeout: Duration) -> Vec<RawJob> {
    wait_for_page_ready(page, wait, timeout).await;

    let (url, html) = match (page.url().await, page.content().await) {
        (Ok(url), Ok(html)) => (url, html),
        (Err(e), _) | (_, Err(e)) => {
            debug!("Could not read page for heuristic extraction: {}", e);
            return Vec::new();
        }
    };
    default_jobs_from_html(&html, &url)
}

/// Container pass first, then a sweep over bare job links the containers missed.
pub fn default_jobs_from_html(html: &str, page_url: &str) -> Vec<RawJob> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let page_domain = domain_of(page_url);
    let mut collector = JobCollector::default();

    for container in find_job_containers(root) {
        if let Some(job) = job_from_container(container, page_url, &page_domain) {
            collector.push(job);
        }
    }

    for css in JOB_LINK_SELECTORS {
        let Some(selector) = parse_selector(css) else {
            continue;
        };
        for link in root.select(&selector) {
            if has_ancestor(link, CHROME_TAGS) {
                continue;
            }
            let href = link.value().attr("href").unwrap_or_default();
            if href.is_empty() {
                continue;
            }
            let url = make_absolute(href, page_url);
            if !url.starts_with("http") || is_same_url(&url, page_url) {
                continue;
            }
            let title = normalized_text(link);
            if !title_len_ok(&title, MIN_TITLE_LENGTH) {
                continue;
            }
            let description = parent_element(link).map(normalized_text).unwrap_or_default();
            collector.push(RawJob::new(title, url, description));
        }
    }

    collector.into_jobs()
}

fn find_job_containers<'a>(root: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let mut seen = HashSet::new();
    let mut containers = Vec::new();
    let mut add = |el: ElementRef<'a>| {
        if seen.insert(el.id()) {
            containers.push(el);
        }
    };

    for tag in DEFAULT_CONTAINER_TAGS {
        for keyword in DEFAULT_CONTAINER_KEYWORDS {
            for attr in DEFAULT_CONTAINER_ATTRS {
                let css = format!("{}[{}*=\"{}\"]", tag, attr, keyword);
                if let Some(selector) = parse_selector(&css) {
                    root.select(&selector).for_each(&mut add);
                }
            }
        }
    }

    for css in RESULT_ITEM_PATTERNS {
        let Some(selector) = parse_selector(css) else {
            continue;
        };
        for el in root.select(&selector) {
            let data_qa = el.value().attr("data-qa").unwrap_or_default().to_lowercase();
            if DATA_ATTR_EXCLUSIONS.iter().any(|x| data_qa.contains(x)) {
                continue;
            }
            add(el);
        }
    }

    if let Some(selector) = parse_selector("table tr") {
        root.select(&selector).filter(|row| is_listing_row(*row)).for_each(&mut add);
    }

    containers
}

fn is_listing_row(row: ElementRef) -> bool {
    if has_ancestor(row, CHROME_TAGS) {
        return false;
    }
    let Some(links) = parse_selector("a[href]") else {
        return false;
    };
    let has_link = row.select(&links).any(|a| {
        let href = a.value().attr("href").unwrap_or_default();
        href.starts_with("http") || href.starts_with('/')
    });
    has_link && normalized_text(row).chars().count() > MIN_ROW_TEXT_LENGTH
}

fn job_from_container(container: ElementRef, page_url: &str, page_domain: &str) -> Option<RawJob> {
    if has_ancestor(container, CHROME_TAGS) {
        return None;
    }
    let link = first_link(container)?;
    let href = link.value().attr("href").unwrap_or_default();
    if href.is_empty() {
        return None;
    }

    let url = make_absolute(href, page_url);
    if !url.starts_with("http") {
        return None;
    }
    if is_same_url(&url, page_url) || url.contains("/search") || url.contains("/filter") {
        return None;
    }
    if !looks_like_job_url(&url, page_domain, JOB_URL_PATTERNS) {
        return None;
    }

    let title = if container.value().name() == "tr" {
        row_title(link)
    } else {
        container_title(container, link)
    };
    if !title_len_ok(&title, MIN_TITLE_LENGTH) || title_has_any(&title, NON_JOB_KEYWORDS) {
        return None;
    }

    Some(RawJob::new(title, url, normalized_text(container)))
}

fn row_title(link: ElementRef) -> String {
    let link_text = normalized_text(link);
    let Some(cell) = closest(link, &["td", "th"]) else {
        return link_text;
    };
    if let Some(heading) = find_descendant(cell, HEADING_TAGS) {
        return normalized_text(heading);
    }
    if link_text.is_empty() {
        normalized_text(cell)
    } else {
        link_text
    }
}

fn container_title(container: ElementRef, link: ElementRef) -> String {
    if let Some(heading) = find_descendant(container, HEADING_TAGS) {
        return normalized_text(heading);
    }
    let link_text = normalized_text(link);
    if !link_text.is_empty() {
        return link_text;
    }

    let titled = container
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| {
            matches!(el.value().name(), "span" | "div" | "p")
                && el.value().classes().any(|class| {
                    let class = class.to_lowercase();
                    class.contains("title") || class.contains("name")
                })
        });
    if let Some(el) = titled {
        return normalized_text(el);
    }

    let text = normalized_text(container);
    let first_line = text.split('\n').next().unwrap_or_default();
    first_line.chars().take(FALLBACK_TITLE_CHARS).collect::<String>().trim().to_string()
}
