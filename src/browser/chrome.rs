use crate::core::{BrowserConfig, BrowserTrait, ElementState};
use crate::errors::{Result, ScrapeError};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Chrome browser implementation
pub struct ChromeBrowser {
    browser: Option<Browser>,
}

impl ChromeBrowser {
    pub fn new() -> Self {
        Self { browser: None }
    }

    fn evaluate(tab: &Arc<Tab>, script: &str) -> Result<Value> {
        let result = tab
            .evaluate(script, false)
            .map_err(|e| ScrapeError::JavaScriptFailed(e.to_string()))?;

        Ok(result.value.unwrap_or(Value::Null))
    }

    /// Quote a selector as a JavaScript string literal.
    fn js_string(selector: &str) -> Result<String> {
        Ok(serde_json::to_string(selector)?)
    }
}

impl Default for ChromeBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserTrait for ChromeBrowser {
    type TabHandle = Arc<Tab>;

    async fn launch(&mut self, config: &BrowserConfig) -> Result<()> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );

        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];

        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }

        if config.disable_images {
            args.push(OsStr::new("--blink-settings=imagesEnabled=false"));
        }

        for arg in &config.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .idle_browser_timeout(Duration::from_millis(config.idle_timeout_ms))
            .args(args)
            .build()
            .map_err(|e| ScrapeError::LaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| ScrapeError::LaunchFailed(e.to_string()))?;

        debug!(headless = config.headless, "chrome launched");
        self.browser = Some(browser);
        Ok(())
    }

    async fn new_tab(&self) -> Result<Self::TabHandle> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ScrapeError::ChromeError("browser not launched".to_string()))?;

        browser.new_tab().map_err(ScrapeError::from_any_error)
    }

    async fn navigate(&self, tab: &Self::TabHandle, url: &str) -> Result<()> {
        tab.navigate_to(url)
            .map_err(|e| ScrapeError::NavigationFailed(format!("{}: {}", url, e)))?;

        tab.wait_until_navigated()
            .map_err(|e| ScrapeError::NavigationFailed(format!("{}: {}", url, e)))?;

        // Chrome renders network failures as an internal error page instead of failing the navigation.
        let landed = tab.get_url();
        if landed.starts_with("chrome-error://") {
            return Err(ScrapeError::NavigationFailed(format!(
                "{}: page could not be loaded",
                url
            )));
        }

        let status = Self::evaluate(
            tab,
            r#"
            (function() {
                const entry = performance.getEntriesByType('navigation')[0];
                return entry && entry.responseStatus ? entry.responseStatus : 0;
            })()
        "#,
        )?;
        if let Some(code) = status.as_u64().filter(|c| *c >= 400) {
            return Err(ScrapeError::NavigationFailed(format!("{}: HTTP {}", url, code)));
        }

        Ok(())
    }

    async fn element_state(&self, tab: &Self::TabHandle, selector: &str) -> Result<ElementState> {
        let js_code = format!(
            r#"
            (function() {{
                const element = document.querySelector({});
                if (!element) return 'missing';
                const style = window.getComputedStyle(element);
                const rect = element.getBoundingClientRect();
                if (style.display === 'none' || style.visibility === 'hidden' ||
                    (rect.width === 0 && rect.height === 0)) {{
                    return 'hidden';
                }}
                return 'visible';
            }})()
        "#,
            Self::js_string(selector)?
        );

        let state = match Self::evaluate(tab, &js_code)?.as_str() {
            Some("visible") => ElementState::Visible,
            Some("hidden") => ElementState::Hidden,
            _ => ElementState::Missing,
        };
        Ok(state)
    }

    async fn scroll_into_view(&self, tab: &Self::TabHandle, selector: &str) -> Result<bool> {
        let js_code = format!(
            r#"
            (function() {{
                const element = document.querySelector({});
                if (element) {{
                    element.scrollIntoView();
                    return true;
                }}
                return false;
            }})()
        "#,
            Self::js_string(selector)?
        );

        Ok(Self::evaluate(tab, &js_code)?.as_bool() == Some(true))
    }

    async fn page_html(&self, tab: &Self::TabHandle) -> Result<String> {
        Self::evaluate(tab, "document.documentElement.outerHTML")?
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ScrapeError::JavaScriptFailed("Failed to get HTML content".to_string()))
    }

    fn is_running(&self) -> bool {
        self.browser.is_some()
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the handle kills the Chrome process.
        if self.browser.take().is_some() {
            debug!("chrome closed");
        }
        Ok(())
    }
}
