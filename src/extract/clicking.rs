//! Boards whose listings navigate through JavaScript instead of hrefs.
//!
//! Each container is clicked in turn and the URL the page lands on becomes
//! the job URL. Slow by nature: one round trip per listing.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::wait_for_page_ready;
use crate::browser::{BrowserResult, Element, Page, locate, wait_for_any_visible, wait_for_url_change};
use crate::constants::{
    CONTAINER_WAIT_TIMEOUT_MS, POST_NAVIGATION_DELAY_MS, URL_NAVIGATION_TIMEOUT_MS, URL_RECHECK_DELAY_MS,
};
use crate::models::{CustomScrapeConfig, LoadState, RawJob};

pub async fn extract_by_clicking(
    page: &dyn Page,
    config: &CustomScrapeConfig,
    wait: LoadState,
    timeout: Duration,
) -> Vec<RawJob> {
    wait_for_page_ready(page, wait, timeout).await;

    if config.container_selectors.is_empty() {
        warn!("No container selectors specified for JavaScript navigation");
        return Vec::new();
    }

    let initial_url = match page.url().await {
        Ok(url) => url,
        Err(e) => {
            warn!("Could not read listing URL: {}", e);
            return Vec::new();
        }
    };

    let mut found = None;
    for selector in &config.container_selectors {
        if wait_for_any_visible(page, selector, Duration::from_millis(CONTAINER_WAIT_TIMEOUT_MS)).await {
            debug!("Found containers with selector: {}", selector);
            found = Some(selector.as_str());
            break;
        }
        debug!("Selector '{}' has no visible match", selector);
    }
    let Some(selector) = found else {
        info!("No job containers found with selectors: {:?}", config.container_selectors);
        return Vec::new();
    };

    let total = locate(page, selector).await.map(|c| c.len()).unwrap_or(0);
    if total == 0 {
        info!("No job containers found with selector: {}", selector);
        return Vec::new();
    }
    info!("Found {} job containers, clicking each to extract URLs...", total);

    let title_selector = config.title_selector.as_deref();
    let mut jobs = Vec::new();
    for index in 0..total {
        let result: BrowserResult<()> = async {
            if let Some(job) = open_container(page, selector, index, &initial_url, title_selector, wait, timeout).await? {
                info!("Job {}/{}: {}", index + 1, total, job.title);
                jobs.push(job);
            }
            return_to_listing(page, selector, &initial_url, wait, timeout).await
        }
        .await;

        if let Err(e) = result {
            warn!("Error clicking job {}: {}", index + 1, e);
            match page.goto(&initial_url, timeout).await {
                Ok(()) => wait_for_page_ready(page, wait, timeout).await,
                Err(e) => error!("Failed to recover to initial page: {}", e),
            }
        }
    }
    jobs
}

/// Click the `index`-th container and report where the page went.
async fn open_container(
    page: &dyn Page,
    selector: &str,
    index: usize,
    initial_url: &str,
    title_selector: Option<&str>,
    wait: LoadState,
    timeout: Duration,
) -> BrowserResult<Option<RawJob>> {
    // The DOM is rebuilt after every round trip, so handles never carry over.
    wait_for_page_ready(page, wait, timeout).await;
    let mut containers = locate(page, selector).await?;
    if index >= containers.len() {
        warn!("Job {} no longer exists after re-fetch", index + 1);
        return Ok(None);
    }
    let container = containers.swap_remove(index);

    let title = element_title(container.as_ref(), title_selector).await;
    container.click().await?;

    if let Err(e) = wait_for_url_change(page, initial_url, Duration::from_millis(URL_NAVIGATION_TIMEOUT_MS)).await {
        debug!("URL navigation wait failed: {}", e);
        sleep(Duration::from_millis(URL_RECHECK_DELAY_MS)).await;
    }

    let job_url = page.url().await?;
    if job_url == initial_url || job_url.ends_with('/') {
        return Ok(None);
    }
    Ok(Some(RawJob::new(title.clone(), job_url, title)))
}

async fn return_to_listing(
    page: &dyn Page,
    selector: &str,
    initial_url: &str,
    wait: LoadState,
    timeout: Duration,
) -> BrowserResult<()> {
    page.goto(initial_url, timeout).await?;
    wait_for_page_ready(page, wait, timeout).await;
    if !wait_for_any_visible(page, selector, Duration::from_millis(URL_NAVIGATION_TIMEOUT_MS)).await {
        debug!("Containers did not reappear for selector: {}", selector);
    }
    sleep(Duration::from_millis(POST_NAVIGATION_DELAY_MS)).await;
    Ok(())
}

async fn element_title(element: &dyn Element, title_selector: Option<&str>) -> String {
    if let Some(css) = title_selector {
        match element.query_all(css).await {
            Ok(found) => {
                if let Some(first) = found.first() {
                    let title = first.text().await.unwrap_or_default().trim().to_string();
                    if !title.is_empty() {
                        return title;
                    }
                }
            }
            Err(e) => debug!("Failed to extract title with selector '{}': {}", css, e),
        }
    }
    element.text().await.unwrap_or_default().trim().to_string()
}
