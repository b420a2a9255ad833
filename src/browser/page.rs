//! DOM-polling primitives.
//!
//! The portal is a server-rendered app with asynchronous client-side
//! enhancement: elements appear late, stale zero-dimension duplicates
//! linger in templates, and every mutating click needs a settle pause
//! before the next read. These helpers encode those realities once.

use std::time::{Duration, Instant};

use chromiumoxide::element::Element;
use chromiumoxide::page::Page;

use crate::error::{Error, Result};

/// How often bounded waits re-poll the DOM.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Geometry check run against a candidate element. Some portal templates
/// leave zero-dimension off-screen duplicates of action elements in the
/// DOM; clicking those hangs the flow, so mere presence is never enough.
const VISIBLE_FN: &str = "function() {
    const r = this.getBoundingClientRect();
    const limit = Math.max(document.documentElement.scrollHeight, 4000);
    return r.width > 1 && r.height > 1 && r.bottom > 0 && r.top < limit;
}";

/// Navigate and wait for the load to finish.
pub async fn goto(page: &Page, url: &str) -> Result<()> {
    page.goto(url).await?;
    page.wait_for_navigation().await?;
    Ok(())
}

/// Wait until `selector` matches a *visible* element, polling the DOM.
pub async fn wait_for_visible(page: &Page, selector: &str, timeout: Duration) -> Result<Element> {
    let started = Instant::now();
    loop {
        if let Ok(elements) = page.find_elements(selector).await {
            for element in elements {
                if is_visible(&element).await {
                    return Ok(element);
                }
            }
        }
        if started.elapsed() >= timeout {
            return Err(Error::WaitTimeout {
                selector: selector.to_string(),
                waited_ms: started.elapsed().as_millis() as u64,
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// All currently visible matches for `selector`, in document order.
pub async fn visible_elements(page: &Page, selector: &str) -> Result<Vec<Element>> {
    let mut visible = Vec::new();
    for element in page.find_elements(selector).await? {
        if is_visible(&element).await {
            visible.push(element);
        }
    }
    Ok(visible)
}

/// Rendered-geometry visibility. Errors count as not visible.
pub async fn is_visible(element: &Element) -> bool {
    match element.call_js_fn(VISIBLE_FN, false).await {
        Ok(ret) => ret
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        Err(_) => false,
    }
}

/// The page body's rendered text, for marker matching.
pub async fn body_text(page: &Page) -> Result<String> {
    page.evaluate("document.body ? document.body.innerText : ''")
        .await?
        .into_value()
        .map_err(|e| Error::Other(format!("read body text: {e}")))
}

/// The page's current URL.
pub async fn current_url(page: &Page) -> Result<String> {
    Ok(page.url().await?.unwrap_or_default())
}

/// Fixed pause after a UI-mutating action, giving the portal's own
/// scripts time to react before the next DOM read.
pub async fn settle(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Clear a form field and type a fresh value. The explicit clear guards
/// against stale autofill left by a previous session in a shared browser.
pub async fn clear_and_type(element: &Element, value: &str) -> Result<()> {
    element
        .call_js_fn("function() { this.value = ''; }", false)
        .await?;
    element.click().await?;
    element.type_str(value).await?;
    Ok(())
}
