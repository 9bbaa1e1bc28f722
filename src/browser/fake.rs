//! Scripted in-memory browser for tests.
//!
//! Pages are static HTML keyed by URL. Click effects are declared in the
//! markup itself: `data-goto="URL"` navigates, `data-state="NAME"` swaps the
//! current page's markup for a registered state without changing the URL.
//! Elements carrying `hidden` or `display:none` (directly or via an ancestor)
//! are invisible and refuse clicks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use super::{Browser, BrowserError, BrowserResult, Element, Frame, Page};
use crate::markup::normalized_text;
use crate::models::LoadState;

#[derive(Default)]
struct SiteData {
    pages: HashMap<String, String>,
    states: HashMap<String, String>,
    frames: HashMap<String, Vec<(String, String)>>,
}

#[derive(Default)]
struct PageState {
    url: String,
    html: String,
    goto_failures: usize,
    log: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeSite {
    data: Arc<Mutex<SiteData>>,
    goto_failures: usize,
    pages_opened: Arc<Mutex<Vec<Arc<Mutex<PageState>>>>>,
    closed: Arc<Mutex<bool>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, html: &str) -> Self {
        self.data.lock().unwrap().pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn state(self, name: &str, html: &str) -> Self {
        self.data.lock().unwrap().states.insert(name.to_string(), html.to_string());
        self
    }

    pub fn frame(self, page_url: &str, frame_url: &str, html: &str) -> Self {
        self.data
            .lock()
            .unwrap()
            .frames
            .entry(page_url.to_string())
            .or_default()
            .push((frame_url.to_string(), html.to_string()));
        self
    }

    /// Make the first `count` navigations of every new page fail.
    pub fn failing_gotos(mut self, count: usize) -> Self {
        self.goto_failures = count;
        self
    }

    pub fn browser(&self) -> FakeBrowser {
        FakeBrowser { site: self.clone() }
    }

    pub fn new_fake_page(&self) -> FakePage {
        let state = Arc::new(Mutex::new(PageState {
            url: "about:blank".to_string(),
            goto_failures: self.goto_failures,
            ..Default::default()
        }));
        self.pages_opened.lock().unwrap().push(state.clone());
        FakePage {
            site: self.data.clone(),
            state,
        }
    }

    /// Open a page already navigated to `url`.
    pub async fn open(&self, url: &str) -> FakePage {
        let page = FakePage {
            site: self.data.clone(),
            state: Arc::new(Mutex::new(PageState::default())),
        };
        page.goto(url, Duration::from_secs(1)).await.unwrap();
        page
    }

    pub fn pages_opened(&self) -> usize {
        self.pages_opened.lock().unwrap().len()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

pub struct FakeBrowser {
    site: FakeSite,
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn new_page(&self) -> BrowserResult<Box<dyn Page>> {
        if self.site.is_closed() {
            return Err(BrowserError::Closed);
        }
        Ok(Box::new(self.site.new_fake_page()))
    }

    async fn close(&self) -> BrowserResult<()> {
        *self.site.closed.lock().unwrap() = true;
        Ok(())
    }
}

pub struct FakePage {
    site: Arc<Mutex<SiteData>>,
    state: Arc<Mutex<PageState>>,
}

impl FakePage {
    /// Interactions performed through elements, e.g. `fill #q=rust`.
    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }
}

fn navigate(site: &Mutex<SiteData>, state: &Mutex<PageState>, url: &str) -> BrowserResult<()> {
    let html = site.lock().unwrap().pages.get(url).cloned();
    let mut state = state.lock().unwrap();
    match html {
        Some(html) => {
            state.url = url.to_string();
            state.html = html;
            Ok(())
        }
        None => Err(BrowserError::Navigation {
            url: url.to_string(),
            message: "404 Not Found".to_string(),
        }),
    }
}

fn is_hidden(element: &ElementRef) -> bool {
    std::iter::once(*element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|el| {
            let value = el.value();
            value.attr("hidden").is_some()
                || value
                    .attr("style")
                    .map(|s| s.replace(' ', "").contains("display:none"))
                    .unwrap_or(false)
        })
}

fn select_elements(
    html: &str,
    css: &str,
    fragment: bool,
    site: &Arc<Mutex<SiteData>>,
    state: &Arc<Mutex<PageState>>,
    parent_hidden: bool,
) -> BrowserResult<Vec<Box<dyn Element>>> {
    let selector = Selector::parse(css).map_err(|e| BrowserError::Driver(format!("invalid selector {}: {:?}", css, e)))?;
    let document = if fragment {
        Html::parse_fragment(html)
    } else {
        Html::parse_document(html)
    };

    let elements = document
        .select(&selector)
        .map(|el| {
            let value = el.value();
            Box::new(FakeElement {
                site: site.clone(),
                state: state.clone(),
                html: el.html(),
                text: normalized_text(el),
                visible: !parent_hidden && !is_hidden(&el),
                id: value.attr("id").map(str::to_string),
                goto: value.attr("data-goto").map(str::to_string),
                swap: value.attr("data-state").map(str::to_string),
            }) as Box<dyn Element>
        })
        .collect();
    Ok(elements)
}

#[async_trait]
impl Page for FakePage {
    async fn url(&self) -> BrowserResult<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn goto(&self, url: &str, _timeout: Duration) -> BrowserResult<()> {
        {
            let mut state = self.state.lock().unwrap();
            if state.goto_failures > 0 {
                state.goto_failures -= 1;
                return Err(BrowserError::Navigation {
                    url: url.to_string(),
                    message: "net::ERR_CONNECTION_RESET".to_string(),
                });
            }
        }
        navigate(&self.site, &self.state, url)
    }

    async fn wait_for_load_state(&self, _state: LoadState, _timeout: Duration) -> BrowserResult<()> {
        Ok(())
    }

    async fn content(&self) -> BrowserResult<String> {
        Ok(self.state.lock().unwrap().html.clone())
    }

    async fn query_all(&self, css: &str) -> BrowserResult<Vec<Box<dyn Element>>> {
        let html = self.state.lock().unwrap().html.clone();
        select_elements(&html, css, false, &self.site, &self.state, false)
    }

    async fn frames(&self) -> BrowserResult<Vec<Box<dyn Frame>>> {
        let url = self.state.lock().unwrap().url.clone();
        let frames = self
            .site
            .lock()
            .unwrap()
            .frames
            .get(&url)
            .cloned()
            .unwrap_or_default();
        Ok(frames
            .into_iter()
            .map(|(url, html)| Box::new(FakeFrame { url, html }) as Box<dyn Frame>)
            .collect())
    }

    async fn close(&self) -> BrowserResult<()> {
        self.state.lock().unwrap().log.push("close".to_string());
        Ok(())
    }
}

struct FakeFrame {
    url: String,
    html: String,
}

#[async_trait]
impl Frame for FakeFrame {
    async fn url(&self) -> BrowserResult<String> {
        Ok(self.url.clone())
    }

    async fn wait_for_load_state(&self, _state: LoadState, _timeout: Duration) -> BrowserResult<()> {
        Ok(())
    }

    async fn content(&self) -> BrowserResult<String> {
        Ok(self.html.clone())
    }
}

struct FakeElement {
    site: Arc<Mutex<SiteData>>,
    state: Arc<Mutex<PageState>>,
    html: String,
    text: String,
    visible: bool,
    id: Option<String>,
    goto: Option<String>,
    swap: Option<String>,
}

impl FakeElement {
    fn record(&self, entry: String) {
        self.state.lock().unwrap().log.push(entry);
    }

    fn label(&self) -> String {
        match &self.id {
            Some(id) => format!("#{}", id),
            None => self.text.clone(),
        }
    }

    fn ensure_interactable(&self) -> BrowserResult<()> {
        if self.visible {
            Ok(())
        } else {
            Err(BrowserError::Driver(format!("element not interactable: {}", self.label())))
        }
    }
}

#[async_trait]
impl Element for FakeElement {
    async fn is_visible(&self) -> BrowserResult<bool> {
        Ok(self.visible)
    }

    async fn text(&self) -> BrowserResult<String> {
        Ok(self.text.clone())
    }

    async fn click(&self) -> BrowserResult<()> {
        self.ensure_interactable()?;
        self.record(format!("click {}", self.label()));
        if let Some(url) = &self.goto {
            navigate(&self.site, &self.state, url)?;
        }
        if let Some(name) = &self.swap {
            let html = self
                .site
                .lock()
                .unwrap()
                .states
                .get(name)
                .cloned()
                .ok_or_else(|| BrowserError::Driver(format!("unknown state {}", name)))?;
            self.state.lock().unwrap().html = html;
        }
        Ok(())
    }

    async fn fill(&self, value: &str) -> BrowserResult<()> {
        self.ensure_interactable()?;
        self.record(format!("fill {}={}", self.label(), value));
        Ok(())
    }

    async fn select_option(&self, value: &str) -> BrowserResult<()> {
        self.ensure_interactable()?;
        self.record(format!("select {}={}", self.label(), value));
        Ok(())
    }

    async fn set_checked(&self, checked: bool) -> BrowserResult<()> {
        self.ensure_interactable()?;
        let verb = if checked { "check" } else { "uncheck" };
        self.record(format!("{} {}", verb, self.label()));
        Ok(())
    }

    async fn press(&self, key: &str) -> BrowserResult<()> {
        self.ensure_interactable()?;
        self.record(format!("press {}={}", self.label(), key));
        Ok(())
    }

    async fn hover(&self) -> BrowserResult<()> {
        self.ensure_interactable()?;
        self.record(format!("hover {}", self.label()));
        Ok(())
    }

    async fn query_all(&self, css: &str) -> BrowserResult<Vec<Box<dyn Element>>> {
        select_elements(&self.html, css, true, &self.site, &self.state, !self.visible)
    }
}
