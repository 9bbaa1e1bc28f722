//! Job extraction strategies.
//!
//! Each company gets exactly one strategy, chosen up front from its
//! configuration. Priority: JS navigation (clicking) over custom selectors
//! over iframe boards over the built-in heuristics.

mod clicking;
mod custom;
mod default;
mod iframe;

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info};

use crate::browser::Page;
use crate::models::{Company, CustomScrapeConfig, LoadState, RawJob};

#[derive(Debug, Clone, Copy)]
pub enum Strategy<'a> {
    Clicking(&'a CustomScrapeConfig),
    Custom(&'a CustomScrapeConfig),
    Iframe,
    Default,
}

impl<'a> Strategy<'a> {
    pub fn for_company(company: &'a Company) -> Self {
        match &company.scraping_config {
            Some(config) if config.use_js_navigation => Strategy::Clicking(config),
            Some(config) => Strategy::Custom(config),
            None if company.use_iframe => Strategy::Iframe,
            None => Strategy::Default,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Clicking(_) => "clicking",
            Strategy::Custom(_) => "custom",
            Strategy::Iframe => "iframe",
            Strategy::Default => "default",
        }
    }

    /// Extract the jobs visible on the page right now. Never fails: broken
    /// selectors and unreadable elements just yield fewer jobs.
    pub async fn extract(&self, page: &dyn Page, wait: LoadState, timeout: Duration) -> Vec<RawJob> {
        let jobs = match self {
            Strategy::Clicking(config) => clicking::extract_by_clicking(page, config, wait, timeout).await,
            Strategy::Custom(config) => custom::extract_custom(page, config, wait, timeout).await,
            Strategy::Iframe => {
                let jobs = iframe::extract_from_iframes(page, wait, timeout).await;
                if jobs.is_empty() {
                    info!("No jobs found in iframes, falling back to page heuristics");
                    default::extract_default(page, wait, timeout).await
                } else {
                    jobs
                }
            }
            Strategy::Default => default::extract_default(page, wait, timeout).await,
        };
        debug!("{} extractor found {} jobs", self.name(), jobs.len());
        jobs
    }
}

/// Best-effort wait; a timeout only means we read the page as it is.
pub(crate) async fn wait_for_page_ready(page: &dyn Page, state: LoadState, timeout: Duration) {
    if let Err(e) = page.wait_for_load_state(state, timeout).await {
        debug!("Wait for load state '{}' did not finish: {}", state, e);
    }
}

/// Collects jobs, keeping only the first occurrence of each URL.
#[derive(Default)]
pub(crate) struct JobCollector {
    seen: HashSet<String>,
    jobs: Vec<RawJob>,
}

impl JobCollector {
    pub fn push(&mut self, job: RawJob) -> bool {
        if self.seen.insert(job.url.clone()) {
            self.jobs.push(job);
            true
        } else {
            false
        }
    }

    pub fn into_jobs(self) -> Vec<RawJob> {
        self.jobs
    }
}

pub(crate) fn title_len_ok(title: &str, min: usize) -> bool {
    !title.is_empty() && title.chars().count() >= min
}

pub(crate) fn title_has_any(title: &str, keywords: &[impl AsRef<str>]) -> bool {
    let lower = title.to_lowercase();
    keywords
        .iter()
        .any(|k| !k.as_ref().is_empty() && lower.contains(&k.as_ref().to_lowercase()))
}
