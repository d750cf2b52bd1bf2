use super::wait::WaitPolicy;
use crate::core::{BrowserConfig, BrowserTrait, Config, ElementState};
use crate::dom::RenderedDocument;
use crate::errors::{Result, ScrapeError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Loads a page and hands back its DOM once a ready condition holds.
///
/// The browser is launched lazily and released on every failed fetch. With
/// `reuse_session` off it is also released after each successful fetch, so
/// every page gets a fresh browser.
pub struct PageFetcher<B: BrowserTrait> {
    browser: B,
    tab: Option<B::TabHandle>,
    browser_config: BrowserConfig,
    wait: WaitPolicy,
    scroll_selector: Option<String>,
    content_selector: Option<String>,
    content_grace: Duration,
    reuse_session: bool,
}

impl<B: BrowserTrait> PageFetcher<B> {
    pub fn new(browser: B, config: &Config) -> Self {
        Self {
            browser,
            tab: None,
            browser_config: config.browser.clone(),
            wait: WaitPolicy::from_config(&config.fetch),
            scroll_selector: config.fetch.scroll_selector.clone(),
            content_selector: config.fetch.content_selector.clone(),
            content_grace: config.fetch.content_grace(),
            reuse_session: config.run.reuse_session,
        }
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn is_session_open(&self) -> bool {
        self.browser.is_running()
    }

    pub async fn fetch(
        &mut self,
        url: &str,
        ready_selector: &str,
        timeout: Duration,
    ) -> Result<RenderedDocument> {
        let started = Instant::now();
        let result = self.load(url, ready_selector, timeout).await;

        if result.is_err() || !self.reuse_session {
            if let Err(e) = self.release().await {
                warn!(url, error = %e, "failed to close browser session");
            }
        }

        if result.is_ok() {
            debug!(url, elapsed_ms = started.elapsed().as_millis() as u64, "page ready");
        }
        result
    }

    /// Close the session if one is open. Safe to call repeatedly.
    pub async fn release(&mut self) -> Result<()> {
        self.tab = None;
        if self.browser.is_running() {
            self.browser.close().await?;
        }
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.release().await
    }

    async fn acquire(&mut self) -> Result<()> {
        if !self.browser.is_running() {
            self.tab = None;
            self.browser.launch(&self.browser_config).await?;
        }
        if self.tab.is_none() {
            self.tab = Some(self.browser.new_tab().await?);
        }
        Ok(())
    }

    async fn load(
        &mut self,
        url: &str,
        ready_selector: &str,
        timeout: Duration,
    ) -> Result<RenderedDocument> {
        self.acquire().await?;
        let tab = self
            .tab
            .as_ref()
            .ok_or_else(|| ScrapeError::ChromeError("no active tab".to_string()))?;
        let browser = &self.browser;

        browser.navigate(tab, url).await?;
        let deadline = Instant::now() + timeout;
        let timed_out = |selector: &str| ScrapeError::Timeout {
            url: url.to_string(),
            selector: selector.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        };

        // A scroll only counts once the target was actually found and moved.
        if let Some(scroll) = self.scroll_selector.as_deref() {
            let attempts = self
                .wait
                .until(deadline, || browser.scroll_into_view(tab, scroll))
                .await
                .ok_or_else(|| timed_out(scroll))?;
            debug!(url, scroll, attempts, "scrolled into view");
        }

        let attempts = self
            .wait
            .until(deadline, || async move {
                let state = browser.element_state(tab, ready_selector).await?;
                Ok::<_, ScrapeError>(state == ElementState::Visible)
            })
            .await
            .ok_or_else(|| timed_out(ready_selector))?;
        debug!(url, ready_selector, attempts, "ready condition met");

        if let Some(content) = self.content_selector.as_deref() {
            let content_deadline = Instant::now() + self.content_grace;
            let loaded = self
                .wait
                .until(content_deadline, || async move {
                    Ok::<_, ScrapeError>(browser.element_state(tab, content).await?.is_present())
                })
                .await;
            match loaded {
                Some(attempts) => debug!(url, content, attempts, "content loaded"),
                None => info!(
                    url,
                    content,
                    grace_ms = self.content_grace.as_millis() as u64,
                    "no content after grace period, treating page as empty"
                ),
            }
        }

        let html = browser.page_html(tab).await?;
        Ok(RenderedDocument::new(url, html))
    }
}
