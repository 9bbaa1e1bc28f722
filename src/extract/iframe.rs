//! Boards embedded through an iframe (Greenhouse-style widgets).

use std::collections::HashSet;
use std::time::Duration;

use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};

use super::title_has_any;
use crate::browser::{BrowserResult, Frame, Page};
use crate::constants::{
    EXCLUDE_TITLE_KEYWORDS, EXCLUDE_URL_PATTERNS, HEADING_TAGS, IFRAME_JOB_SELECTORS, JOB_INDICATORS, MIN_TITLE_WORDS,
    MIN_URL_DEPTH,
};
use crate::markup::{document_text, find_descendant, first_link, normalized_text, parse_selector};
use crate::models::{LoadState, RawJob};
use crate::urls::{make_absolute, matches_url_pattern};

pub async fn extract_from_iframes(page: &dyn Page, wait: LoadState, timeout: Duration) -> Vec<RawJob> {
    let frames = match page.frames().await {
        Ok(frames) => frames,
        Err(e) => {
            warn!("Iframe extraction failed: {}", e);
            return Vec::new();
        }
    };

    let mut jobs = Vec::new();
    for (index, frame) in frames.iter().enumerate() {
        match read_frame(frame.as_ref(), wait, timeout).await {
            Ok((frame_url, html)) => {
                let frame_jobs = frame_jobs_from_html(&html, &frame_url);
                if !frame_jobs.is_empty() {
                    info!("Found {} jobs in iframe {}", frame_jobs.len(), frame_url);
                }
                jobs.extend(frame_jobs);
            }
            Err(e) => debug!("Skipping iframe {}: {}", index, e),
        }
    }
    jobs
}

async fn read_frame(
    frame: &dyn Frame,
    wait: LoadState,
    timeout: Duration,
) -> BrowserResult<(String, String)> {
    frame.wait_for_load_state(wait, timeout).await?;
    let html = frame.content().await?;
    let url = frame.url().await?;
    Ok((url, html))
}

/// Cheap relevance gate before running the container pass.
pub fn has_job_content(document: &Html) -> bool {
    let text = document_text(document).to_lowercase();
    JOB_INDICATORS.iter().any(|indicator| text.contains(indicator))
}

pub fn frame_jobs_from_html(html: &str, frame_url: &str) -> Vec<RawJob> {
    let document = Html::parse_document(html);
    if !has_job_content(&document) {
        return Vec::new();
    }
    let root = document.root_element();

    let mut seen_nodes = HashSet::new();
    let mut containers: Vec<ElementRef> = Vec::new();
    for css in IFRAME_JOB_SELECTORS {
        let Some(selector) = parse_selector(css) else {
            continue;
        };
        for el in root.select(&selector) {
            if seen_nodes.insert(el.id()) {
                containers.push(el);
            }
        }
    }

    let mut seen_jobs = HashSet::new();
    let mut jobs = Vec::new();
    for container in containers {
        let Some(job) = job_from_container(container, frame_url) else {
            continue;
        };
        if seen_jobs.insert((job.url.clone(), job.title.clone())) {
            jobs.push(job);
        }
    }
    jobs
}

fn job_from_container(container: ElementRef, frame_url: &str) -> Option<RawJob> {
    let link = first_link(container)?;
    let href = link.value().attr("href").unwrap_or_default();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    if EXCLUDE_URL_PATTERNS.iter().any(|pattern| matches_url_pattern(href, pattern)) {
        return None;
    }
    if href.matches('/').count() < MIN_URL_DEPTH {
        return None;
    }
    let url = make_absolute(href, frame_url);

    // Link text first: a section container's heading names the department.
    let link_text = normalized_text(link);
    let title = if link_text.is_empty() {
        find_descendant(container, HEADING_TAGS)
            .map(normalized_text)
            .unwrap_or_default()
    } else {
        link_text
    };
    if title.is_empty() || title_has_any(&title, EXCLUDE_TITLE_KEYWORDS) {
        return None;
    }
    if title.split_whitespace().count() < MIN_TITLE_WORDS {
        return None;
    }

    let description = find_descendant(container, &["p", "div"])
        .map(normalized_text)
        .unwrap_or_default();

    Some(RawJob::new(title, url, description))
}
