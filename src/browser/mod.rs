//! Browser capability used by the extractors.
//!
//! Everything the scraper needs from a live browser goes through the traits
//! below so the extraction logic never depends on a specific driver. The
//! production adapter talks WebDriver via `thirtyfour`.

mod webdriver;

#[cfg(test)]
pub mod fake;

pub use webdriver::WebDriverBrowser;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::{Instant, sleep};

use crate::models::LoadState;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("webdriver error: {0}")]
    Driver(String),

    #[error("browser session closed")]
    Closed,
}

pub type BrowserResult<T> = Result<T, BrowserError>;

#[async_trait]
pub trait Browser: Send + Sync {
    /// Open a fresh page sized to the default viewport.
    async fn new_page(&self) -> BrowserResult<Box<dyn Page>>;
    async fn close(&self) -> BrowserResult<()>;
}

#[async_trait]
pub trait Page: Send + Sync {
    async fn url(&self) -> BrowserResult<String>;

    /// Returns as soon as the browser commits to `url`; readiness is waited
    /// for separately.
    async fn goto(&self, url: &str, timeout: Duration) -> BrowserResult<()>;

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> BrowserResult<()>;

    /// Full rendered markup of the main document.
    async fn content(&self) -> BrowserResult<String>;

    async fn query_all(&self, css: &str) -> BrowserResult<Vec<Box<dyn Element>>>;

    /// Embedded frames, excluding the main document.
    async fn frames(&self) -> BrowserResult<Vec<Box<dyn Frame>>>;

    async fn close(&self) -> BrowserResult<()>;
}

#[async_trait]
pub trait Frame: Send + Sync {
    async fn url(&self) -> BrowserResult<String>;
    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> BrowserResult<()>;
    async fn content(&self) -> BrowserResult<String>;
}

#[async_trait]
pub trait Element: Send + Sync {
    async fn is_visible(&self) -> BrowserResult<bool>;
    async fn text(&self) -> BrowserResult<String>;
    async fn click(&self) -> BrowserResult<()>;
    async fn fill(&self, value: &str) -> BrowserResult<()>;
    async fn select_option(&self, value: &str) -> BrowserResult<()>;
    async fn set_checked(&self, checked: bool) -> BrowserResult<()>;
    async fn press(&self, key: &str) -> BrowserResult<()>;
    async fn hover(&self) -> BrowserResult<()>;
    async fn query_all(&self, css: &str) -> BrowserResult<Vec<Box<dyn Element>>>;
}

/// A CSS selector with an optional `:has-text("...")` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub css: String,
    pub has_text: Option<String>,
}

impl Locator {
    pub fn parse(selector: &str) -> Self {
        let selector = selector.trim();
        if let Some(start) = selector.find(":has-text(") {
            let css = selector[..start].trim().to_string();
            let inner = selector[start + ":has-text(".len()..]
                .trim_end()
                .trim_end_matches(')')
                .trim()
                .trim_matches(|c: char| c == '"' || c == '\'');
            return Self {
                css: if css.is_empty() { "*".to_string() } else { css },
                has_text: Some(inner.to_string()),
            };
        }
        Self {
            css: selector.to_string(),
            has_text: None,
        }
    }
}

/// All elements matching `selector`, honoring a `:has-text` filter.
pub async fn locate(page: &dyn Page, selector: &str) -> BrowserResult<Vec<Box<dyn Element>>> {
    let locator = Locator::parse(selector);
    let elements = page.query_all(&locator.css).await?;

    let Some(needle) = locator.has_text.map(|t| t.to_lowercase()) else {
        return Ok(elements);
    };

    let mut filtered = Vec::new();
    for element in elements {
        let text = element.text().await.unwrap_or_default();
        if text.to_lowercase().contains(&needle) {
            filtered.push(element);
        }
    }
    Ok(filtered)
}

/// Wait until the first match of `selector` is visible. Always checks at
/// least once, even with a zero timeout.
pub async fn wait_for_first_visible(page: &dyn Page, selector: &str, timeout: Duration) -> Option<Box<dyn Element>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(mut elements) = locate(page, selector).await {
            if !elements.is_empty() {
                let first = elements.swap_remove(0);
                if first.is_visible().await.unwrap_or(false) {
                    return Some(first);
                }
            }
        }
        if Instant::now() >= deadline {
            return None;
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Wait until any match of `selector` is visible.
pub async fn wait_for_any_visible(page: &dyn Page, selector: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(elements) = locate(page, selector).await {
            for element in &elements {
                if element.is_visible().await.unwrap_or(false) {
                    return true;
                }
            }
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Wait for the page URL to move away from `from`, returning the new URL.
pub async fn wait_for_url_change(page: &dyn Page, from: &str, timeout: Duration) -> BrowserResult<String> {
    let deadline = Instant::now() + timeout;
    loop {
        let current = page.url().await?;
        if current != from {
            return Ok(current);
        }
        if Instant::now() >= deadline {
            return Err(BrowserError::Timeout {
                what: format!("navigation away from {}", from),
                after: timeout,
            });
        }
        sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeSite;

    #[test]
    fn test_locator_parse_plain() {
        let locator = Locator::parse("a[rel=\"next\"]");
        assert_eq!(locator.css, "a[rel=\"next\"]");
        assert!(locator.has_text.is_none());
    }

    #[test]
    fn test_locator_parse_has_text() {
        let locator = Locator::parse("nav a:has-text(\"Next\")");
        assert_eq!(locator.css, "nav a");
        assert_eq!(locator.has_text.as_deref(), Some("Next"));

        let locator = Locator::parse(":has-text('Load More')");
        assert_eq!(locator.css, "*");
        assert_eq!(locator.has_text.as_deref(), Some("Load More"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_filters_by_text() {
        let site = FakeSite::new().page(
            "https://acme.test/",
            r#"<html><body><button>Apply</button><button>Load more jobs</button></body></html>"#,
        );
        let page = site.open("https://acme.test/").await;

        let found = locate(&page, "button:has-text(\"load more\")").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text().await.unwrap(), "Load more jobs");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_first_visible_skips_hidden() {
        let site = FakeSite::new().page(
            "https://acme.test/",
            r#"<html><body><div id="banner" hidden><button>OK</button></div></body></html>"#,
        );
        let page = site.open("https://acme.test/").await;

        let found = wait_for_first_visible(&page, "#banner button", Duration::from_millis(500)).await;
        assert!(found.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_url_change_times_out() {
        let site = FakeSite::new().page("https://acme.test/", "<html><body></body></html>");
        let page = site.open("https://acme.test/").await;

        let result = wait_for_url_change(&page, "https://acme.test/", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(BrowserError::Timeout { .. })));
    }
}
