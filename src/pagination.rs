use std::time::Duration;

use tracing::{debug, info};

use crate::browser::{BrowserResult, Page, locate};
use crate::constants::{DEFAULT_PAGINATION_SELECTORS, PAGINATION_KEYWORDS, PAGINATION_SYMBOLS};
use crate::models::LoadState;

/// Click the first visible "next page" / "load more" control.
///
/// `custom` replaces the built-in selector list; an empty list disables
/// pagination. Returns true when a control was clicked.
pub async fn advance_to_next_page(page: &dyn Page, custom: Option<&[String]>, timeout: Duration) -> bool {
    let selectors: Vec<&str> = match custom {
        Some([]) => return false,
        Some(list) => list.iter().map(String::as_str).collect(),
        None => DEFAULT_PAGINATION_SELECTORS.to_vec(),
    };

    for selector in selectors {
        match try_selector(page, selector, timeout).await {
            Ok(true) => {
                info!("Advanced to next page via '{}'", selector);
                return true;
            }
            Ok(false) => {}
            Err(e) => debug!("Pagination selector '{}' failed: {}", selector, e),
        }
    }
    false
}

async fn try_selector(page: &dyn Page, selector: &str, timeout: Duration) -> BrowserResult<bool> {
    let Some(control) = locate(page, selector).await?.into_iter().next() else {
        return Ok(false);
    };
    if !control.is_visible().await? {
        return Ok(false);
    }
    let text = control.text().await?;
    if !looks_like_next_control(&text) {
        debug!("Skipping '{}': text {:?} is not a pagination label", selector, text);
        return Ok(false);
    }

    control.click().await?;
    if let Err(e) = page.wait_for_load_state(LoadState::NetworkIdle, timeout).await {
        debug!("Network idle wait after pagination click failed: {}", e);
    }
    Ok(true)
}

/// A selector hit alone is not enough; the label has to read like "next".
fn looks_like_next_control(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return false;
    }
    PAGINATION_KEYWORDS.iter().any(|k| lower.contains(k)) || PAGINATION_SYMBOLS.iter().any(|s| text.contains(s))
}
