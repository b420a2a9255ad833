//! Browser acquisition and teardown.
//!
//! Two strategies: attach to a long-lived shared browser over its
//! remote-debugging endpoint, or launch a dedicated process. Either way
//! each run gets its own isolated browsing context (cookies/storage), so
//! concurrent runs cannot corrupt each other's portal session. Ownership
//! discipline on teardown: only a process this session launched is ever
//! closed.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::BrowserStrategy;
use crate::error::{Error, Result};

/// One run's browser attachment: the underlying browser (launched or
/// shared), an isolated browsing context, and the single page the run
/// drives.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    context_id: Option<BrowserContextId>,
    page: Page,
    owns_process: bool,
}

impl BrowserSession {
    /// Acquire a browser per the configured strategy and open an isolated
    /// context in it.
    ///
    /// Every failure, including the bounding timeout, maps to
    /// [`Error::BrowserUnavailable`]; there is nothing to do against the
    /// portal without a browser.
    pub async fn acquire(strategy: &BrowserStrategy, timeout: Duration) -> Result<Self> {
        match tokio::time::timeout(timeout, Self::acquire_inner(strategy)).await {
            Ok(result) => result,
            Err(_) => Err(Error::BrowserUnavailable(format!(
                "browser did not come up within {}s",
                timeout.as_secs()
            ))),
        }
    }

    async fn acquire_inner(strategy: &BrowserStrategy) -> Result<Self> {
        let (browser, handler, owns_process) = match strategy {
            BrowserStrategy::Attach { endpoint } => {
                debug!(endpoint, "attaching to shared browser");
                let (browser, handler) = Browser::connect(endpoint.clone())
                    .await
                    .map_err(|e| Error::BrowserUnavailable(format!("connect {endpoint}: {e}")))?;
                (browser, handler, false)
            }
            BrowserStrategy::Launch { headless } => {
                debug!(headless, "launching dedicated browser");
                let mut builder = BrowserConfig::builder().no_sandbox();
                if !headless {
                    builder = builder.with_head();
                }
                let config = builder.build().map_err(Error::BrowserUnavailable)?;
                let (browser, handler) = Browser::launch(config)
                    .await
                    .map_err(|e| Error::BrowserUnavailable(format!("launch: {e}")))?;
                (browser, handler, true)
            }
        };

        let mut handler = handler;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        // Isolated cookie/storage context so concurrent runs cannot see
        // each other's session state.
        let context = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| Error::BrowserUnavailable(format!("create context: {e}")))?;
        let context_id = context.result.browser_context_id.clone();

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(Error::Other)?;
        let page = browser
            .new_page(target)
            .await
            .map_err(|e| Error::BrowserUnavailable(format!("open page: {e}")))?;

        Ok(Self {
            browser,
            handler_task,
            context_id: Some(context_id),
            page,
            owns_process,
        })
    }

    /// The page this run drives. One page per run; the portal's flow is
    /// stateful and order-dependent, so there is never a second.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Tear the session down. Best-effort and infallible: failures are
    /// logged and swallowed. Only resources this session created are
    /// destroyed; a shared attached browser stays up.
    pub async fn release(self) {
        let Self {
            mut browser,
            handler_task,
            context_id,
            page,
            owns_process,
        } = self;

        if let Err(e) = page.close().await {
            warn!("closing page: {e}");
        }

        if let Some(id) = context_id {
            match DisposeBrowserContextParams::builder()
                .browser_context_id(id)
                .build()
            {
                Ok(dispose) => {
                    if let Err(e) = browser.execute(dispose).await {
                        warn!("disposing context: {e}");
                    }
                }
                Err(e) => warn!("disposing context: {e}"),
            }
        }

        if owns_process {
            if let Err(e) = browser.close().await {
                warn!("closing browser: {e}");
            }
            let _ = browser.wait().await;
        }

        handler_task.abort();
    }
}
