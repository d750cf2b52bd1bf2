use crate::core::config::BrowserConfig;
use crate::errors::Result;
use async_trait::async_trait;

/// What a readiness probe saw for a selector on the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    Missing,
    Hidden,
    Visible,
}

impl ElementState {
    pub fn is_present(self) -> bool {
        !matches!(self, ElementState::Missing)
    }
}

/// The browser capabilities the scraper relies on: navigate, probe the DOM
/// for a ready condition, and read back the rendered document.
#[async_trait]
pub trait BrowserTrait: Send + Sync {
    type TabHandle: Send + Sync;

    /// Launch a new browser instance
    async fn launch(&mut self, config: &BrowserConfig) -> Result<()>;

    /// Create a new tab/page
    async fn new_tab(&self) -> Result<Self::TabHandle>;

    /// Navigate to a URL and wait for the navigation itself to settle
    async fn navigate(&self, tab: &Self::TabHandle, url: &str) -> Result<()>;

    /// Probe the first element matching `selector`
    async fn element_state(&self, tab: &Self::TabHandle, selector: &str) -> Result<ElementState>;

    /// Scroll the first element matching `selector` into view. Returns false if nothing matched.
    async fn scroll_into_view(&self, tab: &Self::TabHandle, selector: &str) -> Result<bool>;

    /// Serialized rendered DOM of the current page
    async fn page_html(&self, tab: &Self::TabHandle) -> Result<String>;

    /// Check if browser is still running
    fn is_running(&self) -> bool;

    /// Close the browser and every tab it owns
    async fn close(&mut self) -> Result<()>;
}
