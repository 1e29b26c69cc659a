//! Browser-rendered page retrieval.
//!
//! The Envoy history pages build their ledger client-side, so the markup has
//! to come from a real browser after clicking through to the history view.
//! [`PageRenderer`] is the seam the export service depends on; [`ChromeRenderer`]
//! implements it with a headless Chromium driven over CDP.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::scrape_error::ScrapeError;

/// Returns the markup of `url` after activating the link containing `link_text`
#[allow(async_fn_in_trait)]
pub trait PageRenderer {
    async fn fetch_rendered_page(&self, url: &str, link_text: &str)
        -> Result<String, ScrapeError>;
}

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Chromium/Chrome binary; autodetected when unset
    pub executable_path: Option<PathBuf>,
    pub headless: bool,
    pub sandbox: bool,
    /// Wait after navigation for client-side rendering
    pub initial_wait: Duration,
    /// Wait after clicking the history link
    pub render_wait: Duration,
}

pub struct ChromeRenderer {
    browser: Browser,
    handler_handle: JoinHandle<()>,
    initial_wait: Duration,
    render_wait: Duration,
}

impl ChromeRenderer {
    #[instrument(skip(settings), fields(headless = settings.headless))]
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, ScrapeError> {
        let mut builder = BrowserConfig::builder();
        if let Some(path) = &settings.executable_path {
            debug!("Using browser executable at {}", path.display());
            builder = builder.chrome_executable(path);
        }
        if !settings.headless {
            builder = builder.with_head();
        }
        if !settings.sandbox {
            builder = builder.no_sandbox();
        }
        let config = builder
            .build()
            .map_err(|e| ScrapeError::Navigation(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config).await?;

        // The handler stream must be polled for the browser connection to make progress
        let handler_handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        info!("Browser session running");

        Ok(Self {
            browser,
            handler_handle,
            initial_wait: settings.initial_wait,
            render_wait: settings.render_wait,
        })
    }

    /// Close the browser process and stop the handler task
    /// Failures are logged; teardown always runs to completion
    pub async fn close(mut self) {
        debug!("Closing browser session");
        if let Err(e) = self.browser.close().await {
            error!("Failed to close browser: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Browser process did not exit cleanly: {}", e);
        }
        self.handler_handle.abort();
        info!("Browser session closed");
    }

    async fn click_link(page: &Page, link_text: &str) -> Result<(), ScrapeError> {
        let links = page.find_elements("a").await?;
        debug!("Page has {} links", links.len());

        for link in links {
            let text = link.inner_text().await?.unwrap_or_default();
            if text.contains(link_text) {
                debug!("Clicking link '{}'", text.trim());
                link.click().await?;
                return Ok(());
            }
        }

        Err(ScrapeError::ElementNotFound(format!(
            "link with text '{link_text}'"
        )))
    }

    async fn render(&self, page: &Page, link_text: &str) -> Result<String, ScrapeError> {
        tokio::time::sleep(self.initial_wait).await;
        Self::click_link(page, link_text).await?;
        tokio::time::sleep(self.render_wait).await;

        let html = page.content().await?;
        debug!("Retrieved rendered HTML, size: {} bytes", html.len());
        Ok(html)
    }
}

impl PageRenderer for ChromeRenderer {
    #[instrument(skip(self))]
    async fn fetch_rendered_page(
        &self,
        url: &str,
        link_text: &str,
    ) -> Result<String, ScrapeError> {
        info!("Visiting {}", url);
        let page = self.browser.new_page(url).await?;

        let result = self.render(&page, link_text).await;

        if let Err(e) = page.close().await {
            warn!("Failed to close page: {}", e);
        }
        result
    }
}
