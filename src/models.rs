use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ACTION_WAIT_MS, DEFAULT_TIMEOUT_MS, MAX_PAGINATION_PAGES, MAX_REPEAT_CLICKS};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub universal_keywords: Vec<String>,
    #[serde(default)]
    pub companies: Vec<Company>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    #[serde(default = "unknown_company")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_board_url: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_filters: Option<LocationFilters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>, // milliseconds
    #[serde(default)]
    pub wait_for_load_state: LoadState,
    #[serde(default)]
    pub use_iframe: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_scrape_actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraping_config: Option<CustomScrapeConfig>,
}

fn unknown_company() -> String {
    "Unknown".to_string()
}

impl Company {
    pub fn new(name: &str, job_board_url: &str, keywords: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            job_board_url: Some(job_board_url.to_string()),
            keywords,
            location_filters: None,
            timeout: None,
            wait_for_load_state: LoadState::default(),
            use_iframe: false,
            max_pages: None,
            pre_scrape_actions: Vec::new(),
            scraping_config: None,
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages.unwrap_or(MAX_PAGINATION_PAGES)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Load,
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    #[default]
    #[serde(rename = "networkidle")]
    NetworkIdle,
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoadState::Load => "load",
            LoadState::DomContentLoaded => "domcontentloaded",
            LoadState::NetworkIdle => "networkidle",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationFilters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

/// A single declared page interaction, run before extraction starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default = "default_action_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub wait_for_network_idle: bool,
    #[serde(default = "default_wait_after")]
    pub wait_after: u64,
    #[serde(default)]
    pub repeat_until_gone: bool,
    #[serde(default = "default_max_repeats")]
    pub max_repeats: usize,
}

fn default_action_timeout() -> u64 {
    5000
}

fn default_wait_after() -> u64 {
    DEFAULT_ACTION_WAIT_MS
}

fn default_max_repeats() -> usize {
    MAX_REPEAT_CLICKS
}

impl Action {
    pub fn new(kind: ActionKind, selector: &str) -> Self {
        Self {
            kind,
            selector: selector.to_string(),
            value: None,
            timeout: default_action_timeout(),
            wait_for_network_idle: false,
            wait_after: default_wait_after(),
            repeat_until_gone: false,
            max_repeats: default_max_repeats(),
        }
    }
}

/// Closed set of interactions. Names that are not recognized are kept
/// verbatim so they can be reported and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    Click,
    Fill,
    Select,
    Check,
    Uncheck,
    Press,
    Hover,
    Wait,
    Unknown(String),
}

impl From<String> for ActionKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "click" => ActionKind::Click,
            "fill" => ActionKind::Fill,
            "select" => ActionKind::Select,
            "check" => ActionKind::Check,
            "uncheck" => ActionKind::Uncheck,
            "press" => ActionKind::Press,
            "hover" => ActionKind::Hover,
            "wait" => ActionKind::Wait,
            _ => ActionKind::Unknown(name),
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Fill => "fill",
            ActionKind::Select => "select",
            ActionKind::Check => "check",
            ActionKind::Uncheck => "uncheck",
            ActionKind::Press => "press",
            ActionKind::Hover => "hover",
            ActionKind::Wait => "wait",
            ActionKind::Unknown(name) => name,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomScrapeConfig {
    #[serde(default)]
    pub container_selectors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_selector: Option<String>,
    #[serde(default)]
    pub exclude_patterns: ExcludePatterns,
    // Some(vec![]) disables pagination entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination_selectors: Option<Vec<String>>,
    #[serde(default)]
    pub use_js_navigation: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludePatterns {
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub titles: Vec<String>,
}

/// A listing pulled off a page, before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawJob {
    pub title: String,
    pub url: String,
    pub description: String,
}

impl RawJob {
    pub fn new(title: impl Into<String>, url: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMatch {
    pub title: String,
    pub url: String,
    pub company: String,
    pub matched_keywords: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_defaults() {
        let company: Company =
            serde_json::from_str(r#"{"name": "Acme", "job_board_url": "https://acme.test/careers"}"#).unwrap();
        assert_eq!(company.timeout_ms(), 30000);
        assert_eq!(company.max_pages(), 10);
        assert_eq!(company.wait_for_load_state, LoadState::NetworkIdle);
        assert!(!company.use_iframe);
        assert!(company.pre_scrape_actions.is_empty());
        assert!(company.scraping_config.is_none());
    }

    #[test]
    fn test_company_without_url() {
        let company: Company = serde_json::from_str(r#"{"name": "Nowhere"}"#).unwrap();
        assert!(company.job_board_url.is_none());
    }

    #[test]
    fn test_action_defaults_and_kinds() {
        let actions: Vec<Action> = serde_json::from_str(
            r##"[
                {"type": "click", "selector": "#accept"},
                {"type": "fill", "selector": "input", "value": "rust", "wait_for_network_idle": true},
                {"type": "teleport", "selector": "#nowhere"}
            ]"##,
        )
        .unwrap();

        assert_eq!(actions[0].kind, ActionKind::Click);
        assert_eq!(actions[0].timeout, 5000);
        assert_eq!(actions[0].wait_after, 500);
        assert_eq!(actions[0].max_repeats, 50);
        assert!(!actions[0].repeat_until_gone);

        assert_eq!(actions[1].kind, ActionKind::Fill);
        assert_eq!(actions[1].value.as_deref(), Some("rust"));
        assert!(actions[1].wait_for_network_idle);

        assert_eq!(actions[2].kind, ActionKind::Unknown("teleport".to_string()));
        assert_eq!(actions[2].kind.as_str(), "teleport");
    }

    #[test]
    fn test_load_state_names() {
        let states: Vec<LoadState> = serde_json::from_str(r#"["load", "domcontentloaded", "networkidle"]"#).unwrap();
        assert_eq!(states, vec![LoadState::Load, LoadState::DomContentLoaded, LoadState::NetworkIdle]);
        assert_eq!(LoadState::DomContentLoaded.to_string(), "domcontentloaded");
    }

    #[test]
    fn test_empty_pagination_selectors_preserved() {
        let config: CustomScrapeConfig =
            serde_json::from_str(r#"{"container_selectors": [".job"], "pagination_selectors": []}"#).unwrap();
        assert_eq!(config.pagination_selectors, Some(vec![]));
        assert!(!config.use_js_navigation);
    }
}
