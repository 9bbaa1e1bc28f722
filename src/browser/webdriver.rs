//! WebDriver adapter backed by `thirtyfour`.
//!
//! Expects a chromedriver (or Selenium) endpoint. Readiness is polled from
//! `document.readyState` and the resource timing buffer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use thirtyfour::components::SelectElement;
use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;
use thirtyfour::{CapabilitiesHelper, ChromeCapabilities, PageLoadStrategy, WindowHandle};
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info};

use super::{Browser, BrowserError, BrowserResult, Element, Frame, Page};
use crate::constants::VIEWPORT;
use crate::models::LoadState;

const READY_POLL: Duration = Duration::from_millis(250);
const NETWORK_QUIET: Duration = Duration::from_millis(500);

const READY_STATE_SCRIPT: &str =
    "return [document.readyState, performance.getEntriesByType('resource').length];";

impl From<WebDriverError> for BrowserError {
    fn from(e: WebDriverError) -> Self {
        BrowserError::Driver(e.to_string())
    }
}

pub struct WebDriverBrowser {
    driver: WebDriver,
    home: WindowHandle,
    closed: AtomicBool,
}

/// Headless Chrome at the default viewport. Navigation returns once the
/// browser commits to the URL; readiness is polled separately.
fn chrome_capabilities(headless: bool) -> WebDriverResult<ChromeCapabilities> {
    let mut caps = DesiredCapabilities::chrome();
    if headless {
        caps.set_headless()?;
    }
    caps.set_page_load_strategy(PageLoadStrategy::None)?;
    caps.add_arg("--disable-dev-shm-usage")?;
    caps.add_arg("--disable-blink-features=AutomationControlled")?;
    caps.add_arg(&format!("--window-size={},{}", VIEWPORT.0, VIEWPORT.1))?;
    Ok(caps)
}

impl WebDriverBrowser {
    pub async fn launch(server_url: &str, headless: bool) -> Result<Self> {
        let caps = chrome_capabilities(headless)?;

        info!("Connecting to WebDriver at {} (headless={})", server_url, headless);
        let driver = WebDriver::new(server_url, caps)
            .await
            .with_context(|| format!("Failed to start a browser session via {}. Is chromedriver running?", server_url))?;
        let home = driver.window().await.context("Failed to read the initial window handle")?;

        Ok(Self {
            driver,
            home,
            closed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn new_page(&self) -> BrowserResult<Box<dyn Page>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BrowserError::Closed);
        }
        let handle = self.driver.new_tab().await?;
        self.driver.switch_to_window(handle.clone()).await?;
        if let Err(e) = self
            .driver
            .set_window_rect(0, 0, VIEWPORT.0.into(), VIEWPORT.1.into())
            .await
        {
            debug!("Could not resize window: {}", e);
        }
        Ok(Box::new(WebDriverPage {
            driver: self.driver.clone(),
            home: self.home.clone(),
        }))
    }

    async fn close(&self) -> BrowserResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.driver.clone().quit().await?;
        Ok(())
    }
}

struct WebDriverPage {
    driver: WebDriver,
    home: WindowHandle,
}

async fn ready_state(driver: &WebDriver) -> BrowserResult<(String, u64)> {
    let ret = driver.execute(READY_STATE_SCRIPT, Vec::new()).await?;
    let value = ret.json();
    let state = value.get(0).and_then(Value::as_str).unwrap_or_default().to_string();
    let resources = value.get(1).and_then(Value::as_u64).unwrap_or_default();
    Ok((state, resources))
}

/// Poll until the current document reaches `state`. For `networkidle` the
/// resource count must also hold still for a quiet window.
async fn poll_load_state(driver: &WebDriver, state: LoadState, limit: Duration) -> BrowserResult<()> {
    let deadline = Instant::now() + limit;
    let mut last_count: Option<u64> = None;
    let mut quiet_since = Instant::now();

    loop {
        let (ready, resources) = ready_state(driver).await?;
        let reached = match state {
            LoadState::DomContentLoaded => ready == "interactive" || ready == "complete",
            LoadState::Load => ready == "complete",
            LoadState::NetworkIdle => {
                if last_count != Some(resources) {
                    last_count = Some(resources);
                    quiet_since = Instant::now();
                }
                ready == "complete" && quiet_since.elapsed() >= NETWORK_QUIET
            }
        };
        if reached {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(BrowserError::Timeout {
                what: format!("load state '{}'", state),
                after: limit,
            });
        }
        sleep(READY_POLL).await;
    }
}

fn wrap_elements(driver: &WebDriver, elements: Vec<WebElement>) -> Vec<Box<dyn Element>> {
    elements
        .into_iter()
        .map(|elem| {
            Box::new(WebDriverElement {
                driver: driver.clone(),
                elem,
            }) as Box<dyn Element>
        })
        .collect()
}

#[async_trait]
impl Page for WebDriverPage {
    async fn url(&self) -> BrowserResult<String> {
        Ok(self.driver.current_url().await?.to_string())
    }

    async fn goto(&self, url: &str, limit: Duration) -> BrowserResult<()> {
        match timeout(limit, self.driver.goto(url)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(BrowserError::Timeout {
                what: format!("navigation to {}", url),
                after: limit,
            }),
        }
    }

    async fn wait_for_load_state(&self, state: LoadState, limit: Duration) -> BrowserResult<()> {
        poll_load_state(&self.driver, state, limit).await
    }

    async fn content(&self) -> BrowserResult<String> {
        Ok(self.driver.source().await?)
    }

    async fn query_all(&self, css: &str) -> BrowserResult<Vec<Box<dyn Element>>> {
        let elements = self.driver.find_all(By::Css(css.to_string())).await?;
        Ok(wrap_elements(&self.driver, elements))
    }

    async fn frames(&self) -> BrowserResult<Vec<Box<dyn Frame>>> {
        let iframes = self.driver.find_all(By::Tag("iframe")).await?;
        Ok((0..iframes.len())
            .filter_map(|index| u16::try_from(index).ok())
            .map(|index| {
                Box::new(WebDriverFrame {
                    driver: self.driver.clone(),
                    index,
                }) as Box<dyn Frame>
            })
            .collect())
    }

    async fn close(&self) -> BrowserResult<()> {
        self.driver.close_window().await?;
        self.driver.switch_to_window(self.home.clone()).await?;
        Ok(())
    }
}

/// A child frame addressed by index; every call enters it and returns to the
/// top-level document afterwards.
struct WebDriverFrame {
    driver: WebDriver,
    index: u16,
}

impl WebDriverFrame {
    async fn leave(&self) {
        if let Err(e) = self.driver.enter_default_frame().await {
            debug!("Failed to leave frame {}: {}", self.index, e);
        }
    }
}

#[async_trait]
impl Frame for WebDriverFrame {
    async fn url(&self) -> BrowserResult<String> {
        self.driver.enter_frame(self.index).await?;
        let result = self
            .driver
            .execute("return window.location.href;", Vec::new())
            .await
            .map(|ret| ret.json().as_str().unwrap_or_default().to_string());
        self.leave().await;
        Ok(result?)
    }

    async fn wait_for_load_state(&self, state: LoadState, limit: Duration) -> BrowserResult<()> {
        self.driver.enter_frame(self.index).await?;
        let result = poll_load_state(&self.driver, state, limit).await;
        self.leave().await;
        result
    }

    async fn content(&self) -> BrowserResult<String> {
        self.driver.enter_frame(self.index).await?;
        let result = self.driver.source().await;
        self.leave().await;
        Ok(result?)
    }
}

struct WebDriverElement {
    driver: WebDriver,
    elem: WebElement,
}

fn key_named(name: &str) -> Option<Key> {
    let key = match name.to_ascii_lowercase().as_str() {
        "enter" | "return" => Key::Enter,
        "tab" => Key::Tab,
        "escape" | "esc" => Key::Escape,
        "backspace" => Key::Backspace,
        "space" => Key::Space,
        "arrowdown" | "down" => Key::Down,
        "arrowup" | "up" => Key::Up,
        "arrowleft" | "left" => Key::Left,
        "arrowright" | "right" => Key::Right,
        "pagedown" => Key::PageDown,
        "pageup" => Key::PageUp,
        "home" => Key::Home,
        "end" => Key::End,
        _ => return None,
    };
    Some(key)
}

#[async_trait]
impl Element for WebDriverElement {
    async fn is_visible(&self) -> BrowserResult<bool> {
        Ok(self.elem.is_displayed().await?)
    }

    async fn text(&self) -> BrowserResult<String> {
        Ok(self.elem.text().await?)
    }

    async fn click(&self) -> BrowserResult<()> {
        Ok(self.elem.click().await?)
    }

    async fn fill(&self, value: &str) -> BrowserResult<()> {
        self.elem.clear().await?;
        Ok(self.elem.send_keys(value).await?)
    }

    async fn select_option(&self, value: &str) -> BrowserResult<()> {
        let select = SelectElement::new(&self.elem).await?;
        Ok(select.select_by_value(value).await?)
    }

    async fn set_checked(&self, checked: bool) -> BrowserResult<()> {
        if self.elem.is_selected().await? != checked {
            self.elem.click().await?;
        }
        Ok(())
    }

    async fn press(&self, key: &str) -> BrowserResult<()> {
        match key_named(key) {
            Some(key) => Ok(self.elem.send_keys(key + "").await?),
            None => Ok(self.elem.send_keys(key).await?),
        }
    }

    async fn hover(&self) -> BrowserResult<()> {
        self.driver
            .action_chain()
            .move_to_element_center(&self.elem)
            .perform()
            .await?;
        Ok(())
    }

    async fn query_all(&self, css: &str) -> BrowserResult<Vec<Box<dyn Element>>> {
        let elements = self.elem.find_all(By::Css(css.to_string())).await?;
        Ok(wrap_elements(&self.driver, elements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_named() {
        assert!(matches!(key_named("Enter"), Some(Key::Enter)));
        assert!(matches!(key_named("ArrowDown"), Some(Key::Down)));
        assert!(key_named("q").is_none());
    }

    #[tokio::test]
    #[ignore] // Requires a running chromedriver on localhost:9515
    async fn test_launch_and_read_page() {
        let browser = WebDriverBrowser::launch("http://localhost:9515", true).await.expect("launch");
        let page = browser.new_page().await.expect("page");
        page.goto("https://example.com", Duration::from_secs(30)).await.expect("goto");
        page.wait_for_load_state(LoadState::Load, Duration::from_secs(30))
            .await
            .expect("load");
        assert!(page.content().await.expect("content").contains("Example Domain"));
        page.close().await.expect("close page");
        browser.close().await.expect("close browser");
        assert!(matches!(browser.new_page().await, Err(BrowserError::Closed)));
    }

    #[test]
    fn test_capabilities_commit_only_navigation() {
        let caps: thirtyfour::Capabilities = chrome_capabilities(true).unwrap().into();
        assert_eq!(caps.get("pageLoadStrategy"), Some(&serde_json::json!("none")));
    }
}
