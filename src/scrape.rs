//! Per-company orchestration and the scrape session.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::actions::run_pre_scrape_actions;
use crate::browser::{Browser, BrowserError, BrowserResult, Page};
use crate::constants::{NAVIGATION_ATTEMPTS, NAVIGATION_BACKOFF_MAX_MS, NAVIGATION_BACKOFF_MIN_MS, RESPECTFUL_DELAY_MS};
use crate::extract::Strategy;
use crate::matching::{match_keywords, merge_keywords, should_filter_out};
use crate::models::{Company, Config, JobMatch, LocationFilters, RawJob};
use crate::pagination::advance_to_next_page;

pub struct Scraper {
    universal_keywords: Vec<String>,
    companies: Vec<Company>,
}

impl Scraper {
    pub fn new(config: &Config) -> Self {
        Self {
            universal_keywords: config.universal_keywords.iter().map(|k| k.to_lowercase()).collect(),
            companies: config.companies.clone(),
        }
    }

    pub async fn scrape_all(&self, browser: &dyn Browser) -> Vec<JobMatch> {
        if self.companies.is_empty() {
            warn!("No companies configured. Use `jobscout company add` to add one.");
            return Vec::new();
        }

        info!("Starting job scraper...");
        if self.universal_keywords.is_empty() {
            info!("Universal keywords: None");
        } else {
            info!("Universal keywords: {}", self.universal_keywords.join(", "));
        }
        info!("Companies to scrape: {}", self.companies.len());

        let mut all_matches = Vec::new();
        for company in &self.companies {
            all_matches.extend(self.scrape_company(browser, company).await);
        }
        all_matches
    }

    /// Never fails: any error for this company is logged and yields no matches.
    pub async fn scrape_company(&self, browser: &dyn Browser, company: &Company) -> Vec<JobMatch> {
        let Some(url) = company.job_board_url.as_deref().filter(|u| !u.is_empty()) else {
            warn!("Skipping {}: No job board URL", company.name);
            return Vec::new();
        };
        let keywords = merge_keywords(&self.universal_keywords, &company.keywords);

        info!("Scraping {}...", company.name);
        info!("URL: {}", url);
        info!("Keywords: {}", keywords.join(", "));

        let page = match browser.new_page().await {
            Ok(page) => page,
            Err(e) => {
                error!("Error scraping {}: {}", company.name, e);
                return Vec::new();
            }
        };

        let result = collect_jobs(page.as_ref(), company, url).await;
        if let Err(e) = page.close().await {
            debug!("Failed to close page for {}: {}", company.name, e);
        }

        let jobs = match result {
            Ok(jobs) => dedupe_by_url(jobs),
            Err(BrowserError::Timeout { .. }) => {
                warn!("Timeout loading {}", company.name);
                return Vec::new();
            }
            Err(e) => {
                error!("Error scraping {}: {}", company.name, e);
                return Vec::new();
            }
        };
        info!("Found {} job listings", jobs.len());

        let (matches, location_filtered) = match_jobs(&jobs, &company.name, &keywords, company.location_filters.as_ref());
        if location_filtered > 0 {
            info!("Filtered out {} job(s) by location", location_filtered);
        }
        info!("Found {} matching jobs", matches.len());
        matches
    }
}

/// Navigate, prepare the page, then extract page after page.
async fn collect_jobs(page: &dyn Page, company: &Company, url: &str) -> BrowserResult<Vec<RawJob>> {
    let timeout = Duration::from_millis(company.timeout_ms());
    goto_with_retry(page, url, timeout).await?;
    run_pre_scrape_actions(page, &company.pre_scrape_actions, timeout).await;

    let strategy = Strategy::for_company(company);
    let pagination = company
        .scraping_config
        .as_ref()
        .and_then(|config| config.pagination_selectors.as_deref());
    debug!("Using {} extraction for {}", strategy.name(), company.name);

    let mut all_jobs = Vec::new();
    for page_number in 1..=company.max_pages() {
        info!("Scraping page {}...", page_number);
        all_jobs.extend(strategy.extract(page, company.wait_for_load_state, timeout).await);

        if !advance_to_next_page(page, pagination, timeout).await {
            break;
        }
        sleep(Duration::from_millis(RESPECTFUL_DELAY_MS)).await;
    }
    Ok(all_jobs)
}

/// Exponential delays between navigation attempts, 4s doubling up to 10s.
fn navigation_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(NAVIGATION_BACKOFF_MIN_MS))
        .with_max_delay(Duration::from_millis(NAVIGATION_BACKOFF_MAX_MS))
        .with_max_times(NAVIGATION_ATTEMPTS - 1)
}

/// Navigate with bounded retries and exponential backoff. Only waits for the
/// navigation itself; readiness is the extractor's concern.
pub async fn goto_with_retry(page: &dyn Page, url: &str, timeout: Duration) -> BrowserResult<()> {
    let attempt = move || async move {
        debug!("Attempting to navigate to {}", url);
        page.goto(url, timeout).await
    };

    attempt
        .retry(navigation_backoff())
        .sleep(sleep)
        .notify(|e: &BrowserError, delay: Duration| {
            warn!("Navigation to {} failed: {}; retrying in {:?}", url, e, delay);
        })
        .await
}

/// One job per URL. A later duplicate replaces the earlier one's contents
/// but keeps its position.
pub fn dedupe_by_url(jobs: Vec<RawJob>) -> Vec<RawJob> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<RawJob> = Vec::new();
    for job in jobs {
        match index.get(&job.url) {
            Some(&i) => unique[i] = job,
            None => {
                index.insert(job.url.clone(), unique.len());
                unique.push(job);
            }
        }
    }
    unique
}

/// Location filter first, then keywords. Returns the matches and how many
/// jobs the location filter dropped.
pub fn match_jobs(
    jobs: &[RawJob],
    company: &str,
    keywords: &[String],
    filters: Option<&LocationFilters>,
) -> (Vec<JobMatch>, usize) {
    let mut matches = Vec::new();
    let mut location_filtered = 0;

    for job in jobs {
        let combined = format!("{} {}", job.title, job.description);
        if should_filter_out(&combined, filters) {
            location_filtered += 1;
            continue;
        }
        let matched = match_keywords(&combined, keywords);
        if !matched.is_empty() {
            matches.push(JobMatch {
                title: job.title.clone(),
                url: job.url.clone(),
                company: company.to_string(),
                matched_keywords: matched,
            });
        }
    }
    (matches, location_filtered)
}

#[derive(Debug)]
pub enum SessionOutcome {
    Completed(Vec<JobMatch>),
    Interrupted,
}

/// Scrape every company over one browser, closing it afterwards whether the
/// run finished or `interrupt` fired first.
pub async fn run_session<F>(scraper: &Scraper, browser: Box<dyn Browser>, interrupt: F) -> SessionOutcome
where
    F: Future<Output = ()>,
{
    let outcome = tokio::select! {
        biased;
        _ = interrupt => SessionOutcome::Interrupted,
        matches = scraper.scrape_all(browser.as_ref()) => SessionOutcome::Completed(matches),
    };
    if let Err(e) = browser.close().await {
        warn!("Failed to close browser: {}", e);
    }
    outcome
}
