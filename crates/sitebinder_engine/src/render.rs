use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::Page;
use futures_util::StreamExt;
use log::debug;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::types::RenderFailure;

/// Flags passed to every per-task Chromium process. Headless mode is the
/// chromiumoxide default; image loading is disabled because captured pages
/// are printed, not screenshotted.
const CHROMIUM_ARGS: &[&str] = &[
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-software-rasterizer",
    "--blink-settings=imagesEnabled=false",
    "--disable-extensions",
    "--disable-infobars",
    "--disable-notifications",
];

#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Upper bound on waiting for `document.readyState == "complete"`.
    pub page_load_timeout: Duration,
    /// Settle delay after load, letting lazy content arrive.
    pub settle_after_load: Duration,
    /// Shorter settle delay after the full-height scroll.
    pub settle_after_scroll: Duration,
    pub ready_poll_interval: Duration,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            page_load_timeout: Duration::from_secs(10),
            settle_after_load: Duration::from_secs(2),
            settle_after_scroll: Duration::from_secs(1),
            ready_poll_interval: Duration::from_millis(250),
        }
    }
}

/// Renders one URL to a paginated PDF. The seam exists so the dispatcher and
/// the HTTP layer can be exercised without a browser.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<Bytes, RenderFailure>;
}

/// Drives one short-lived headless Chromium process per render call. The
/// process is never shared between tasks and is shut down on every exit
/// path, including failures at any step.
#[derive(Debug, Clone, Default)]
pub struct ChromiumRenderer {
    settings: RenderSettings,
}

impl ChromiumRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    async fn launch(&self) -> Result<(Browser, JoinHandle<()>), RenderFailure> {
        let config = BrowserConfig::builder()
            .args(CHROMIUM_ARGS.iter().copied())
            .build()
            .map_err(RenderFailure::Launch)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| RenderFailure::Launch(err.to_string()))?;

        // The CDP event loop must be polled for the lifetime of the browser.
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok((browser, events))
    }

    async fn capture(&self, browser: &Browser, url: &str) -> Result<Bytes, RenderFailure> {
        let page = browser
            .new_page(url)
            .await
            .map_err(|err| RenderFailure::Navigation(err.to_string()))?;

        self.wait_until_ready(&page).await?;
        sleep(self.settings.settle_after_load).await;

        // Force lazy-loaded content to materialize before printing.
        page.evaluate("window.scrollTo(0, document.body.scrollHeight);")
            .await
            .map_err(|err| RenderFailure::Script(err.to_string()))?;
        sleep(self.settings.settle_after_scroll).await;

        let params = PrintToPdfParams {
            print_background: Some(true),
            prefer_css_page_size: Some(true),
            scale: Some(1.0),
            ..Default::default()
        };
        let data = page
            .pdf(params)
            .await
            .map_err(|err| RenderFailure::Print(err.to_string()))?;

        Ok(Bytes::from(data))
    }

    async fn wait_until_ready(&self, page: &Page) -> Result<(), RenderFailure> {
        let deadline = tokio::time::Instant::now() + self.settings.page_load_timeout;
        loop {
            let state = page
                .evaluate("document.readyState")
                .await
                .ok()
                .and_then(|value| value.into_value::<String>().ok());
            if state.as_deref() == Some("complete") {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(RenderFailure::ReadyTimeout(self.settings.page_load_timeout));
            }
            sleep(self.settings.ready_poll_interval).await;
        }
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &str) -> Result<Bytes, RenderFailure> {
        let (browser, events) = self.launch().await?;
        // Scoped acquisition: capture errors still flow through shutdown.
        let result = self.capture(&browser, url).await;
        shutdown(browser, events).await;
        result
    }
}

async fn shutdown(mut browser: Browser, events: JoinHandle<()>) {
    if let Err(err) = browser.close().await {
        debug!("browser close failed: {err}");
    }
    if let Err(err) = browser.wait().await {
        debug!("browser wait failed: {err}");
    }
    events.abort();
}
