//! Interactions replayed on a board before extraction: cookie banners,
//! search boxes, "load more" buttons.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::browser::{BrowserError, BrowserResult, Element, Page, wait_for_first_visible};
use crate::constants::ELEMENT_VISIBILITY_TIMEOUT_MS;
use crate::models::{Action, ActionKind, LoadState};

/// Run every action in order. A failing action is logged and skipped.
pub async fn run_pre_scrape_actions(page: &dyn Page, actions: &[Action], timeout: Duration) {
    if actions.is_empty() {
        return;
    }
    info!("Executing {} pre-scrape action(s)...", actions.len());

    for (i, action) in actions.iter().enumerate() {
        let step = i + 1;
        let result = if action.repeat_until_gone && action.kind == ActionKind::Click {
            repeat_click(page, action, step).await;
            Ok(())
        } else {
            run_once(page, action, step, timeout).await
        };
        if let Err(e) = result {
            let mut message = e.to_string();
            message.truncate(message.char_indices().nth(100).map_or(message.len(), |(idx, _)| idx));
            warn!("Failed action {} ({}): {}", step, action.kind.as_str(), message);
        }
    }
}

/// Keep clicking until the element stops showing up, capped at `max_repeats`.
async fn repeat_click(page: &dyn Page, action: &Action, step: usize) {
    let probe = Duration::from_millis(ELEMENT_VISIBILITY_TIMEOUT_MS);
    let mut clicks = 0;

    while clicks < action.max_repeats {
        let clicked = match wait_for_first_visible(page, &action.selector, probe).await {
            Some(element) => perform(element.as_ref(), action).await.is_ok(),
            None => false,
        };
        if !clicked {
            info!("Action {} complete after {} clicks (element gone)", step, clicks);
            return;
        }
        clicks += 1;
        info!("Action {}: click on {}... (click {})", step, short(&action.selector), clicks);
        sleep(Duration::from_millis(action.wait_after)).await;
    }
    warn!("Action {} stopped after {} clicks (max limit)", step, action.max_repeats);
}

async fn run_once(page: &dyn Page, action: &Action, step: usize, timeout: Duration) -> BrowserResult<()> {
    if let ActionKind::Unknown(name) = &action.kind {
        warn!("Unknown action type: {}", name);
        return Ok(());
    }

    let limit = Duration::from_millis(action.timeout);
    let element = wait_for_first_visible(page, &action.selector, limit)
        .await
        .ok_or_else(|| BrowserError::Timeout {
            what: format!("'{}' to become visible", action.selector),
            after: limit,
        })?;

    perform(element.as_ref(), action).await?;
    info!("Action {}: {} on {}...", step, action.kind.as_str(), short(&action.selector));

    if action.wait_for_network_idle {
        if page.wait_for_load_state(LoadState::NetworkIdle, timeout).await.is_err() {
            warn!("Network idle timeout after action {}, continuing...", step);
        }
    } else {
        sleep(Duration::from_millis(action.wait_after)).await;
    }
    Ok(())
}

async fn perform(element: &dyn Element, action: &Action) -> BrowserResult<()> {
    let value = action.value.as_deref();
    match &action.kind {
        ActionKind::Click => element.click().await,
        ActionKind::Fill => element.fill(value.unwrap_or_default()).await,
        ActionKind::Select => element.select_option(value.unwrap_or_default()).await,
        ActionKind::Check => element.set_checked(true).await,
        ActionKind::Uncheck => element.set_checked(false).await,
        ActionKind::Press => element.press(value.unwrap_or("Enter")).await,
        ActionKind::Hover => element.hover().await,
        ActionKind::Wait | ActionKind::Unknown(_) => Ok(()),
    }
}

fn short(selector: &str) -> String {
    selector.chars().take(50).collect()
}
