use crate::core::{BrowserConfig, BrowserTrait, Config, ElementState};
use crate::errors::{Result, ScrapeError};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Scripted page served by [`MockBrowser`].
#[derive(Debug, Clone)]
pub struct MockPage {
    html: String,
    missing_probes: u32,
    never_ready: bool,
    hidden: bool,
    navigation_error: Option<String>,
    after_scroll: Option<(String, u32)>,
}

impl MockPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            missing_probes: 0,
            never_ready: false,
            hidden: false,
            navigation_error: None,
            after_scroll: None,
        }
    }

    /// A page whose URL cannot be loaded at all.
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            navigation_error: Some(reason.into()),
            ..Self::new("")
        }
    }

    /// Every element reads as missing for the first `probes` readiness probes.
    pub fn ready_after(mut self, probes: u32) -> Self {
        self.missing_probes = probes;
        self
    }

    /// Dynamic content never shows up.
    pub fn never_ready(mut self) -> Self {
        self.never_ready = true;
        self
    }

    /// The page turns into `loaded` once it has been scrolled and then probed
    /// `probes` more times, like content fetched lazily on scroll.
    pub fn loads_after_scroll(mut self, loaded: impl Into<String>, probes: u32) -> Self {
        self.after_scroll = Some((loaded.into(), probes));
        self
    }

    fn html(&self, probes_since_scroll: Option<u32>) -> &str {
        match (&self.after_scroll, probes_since_scroll) {
            (Some((loaded, needed)), Some(seen)) if seen > *needed => loaded,
            _ => &self.html,
        }
    }

    /// Elements are in the DOM but not visible.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

#[derive(Debug, Default)]
struct MockState {
    running: bool,
    launches: usize,
    closes: usize,
    scrolls: usize,
    next_tab: usize,
    current_url: Option<String>,
    probes: HashMap<String, u32>,
    since_scroll: Option<u32>,
    navigations: Vec<String>,
}

/// In-memory browser for tests. Clones share state, so a test can keep one
/// handle for inspection while the scraper owns another.
#[derive(Debug, Clone, Default)]
pub struct MockBrowser {
    pages: Arc<HashMap<String, MockPage>>,
    state: Arc<Mutex<MockState>>,
    fail_launch: bool,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, page: MockPage) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.into(), page);
        self
    }

    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn launches(&self) -> usize {
        self.state().launches
    }

    pub fn closes(&self) -> usize {
        self.state().closes
    }

    pub fn scrolls(&self) -> usize {
        self.state().scrolls
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state().navigations.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the recorded calls from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_page(&self) -> Result<(String, &MockPage)> {
        let url = self
            .state()
            .current_url
            .clone()
            .ok_or_else(|| ScrapeError::JavaScriptFailed("no page loaded".to_string()))?;
        let page = self
            .pages
            .get(&url)
            .ok_or_else(|| ScrapeError::JavaScriptFailed(format!("no page for {}", url)))?;
        Ok((url, page))
    }

    fn ensure_running(&self) -> Result<()> {
        if self.state().running {
            Ok(())
        } else {
            Err(ScrapeError::ChromeError("browser not launched".to_string()))
        }
    }
}

#[async_trait]
impl BrowserTrait for MockBrowser {
    type TabHandle = usize;

    async fn launch(&mut self, _config: &BrowserConfig) -> Result<()> {
        if self.fail_launch {
            return Err(ScrapeError::LaunchFailed("chrome binary not found".to_string()));
        }
        let mut state = self.state();
        state.running = true;
        state.launches += 1;
        Ok(())
    }

    async fn new_tab(&self) -> Result<Self::TabHandle> {
        self.ensure_running()?;
        let mut state = self.state();
        state.next_tab += 1;
        Ok(state.next_tab)
    }

    async fn navigate(&self, _tab: &Self::TabHandle, url: &str) -> Result<()> {
        self.ensure_running()?;
        let mut state = self.state();
        state.navigations.push(url.to_string());

        match self.pages.get(url) {
            None => Err(ScrapeError::NavigationFailed(format!("{}: HTTP 404", url))),
            Some(MockPage {
                navigation_error: Some(reason),
                ..
            }) => Err(ScrapeError::NavigationFailed(format!("{}: {}", url, reason))),
            Some(_) => {
                state.current_url = Some(url.to_string());
                state.probes.insert(url.to_string(), 0);
                state.since_scroll = None;
                Ok(())
            }
        }
    }

    async fn element_state(&self, _tab: &Self::TabHandle, selector: &str) -> Result<ElementState> {
        self.ensure_running()?;
        let (url, page) = self.current_page()?;

        let (probes, since_scroll) = {
            let mut state = self.state();
            if let Some(seen) = state.since_scroll.as_mut() {
                *seen += 1;
            }
            let since_scroll = state.since_scroll;
            let count = state.probes.entry(url).or_insert(0);
            *count += 1;
            (*count, since_scroll)
        };
        if page.never_ready || probes <= page.missing_probes {
            return Ok(ElementState::Missing);
        }

        let selector = Selector::parse(selector)
            .map_err(|e| ScrapeError::InvalidSelector(format!("{}: {}", selector, e)))?;
        if Html::parse_document(page.html(since_scroll)).select(&selector).next().is_none() {
            Ok(ElementState::Missing)
        } else if page.hidden {
            Ok(ElementState::Hidden)
        } else {
            Ok(ElementState::Visible)
        }
    }

    async fn scroll_into_view(&self, tab: &Self::TabHandle, selector: &str) -> Result<bool> {
        let present = self.element_state(tab, selector).await?.is_present();
        if present {
            let mut state = self.state();
            state.scrolls += 1;
            state.since_scroll.get_or_insert(0);
        }
        Ok(present)
    }

    async fn page_html(&self, _tab: &Self::TabHandle) -> Result<String> {
        self.ensure_running()?;
        let (_, page) = self.current_page()?;
        let since_scroll = self.state().since_scroll;
        Ok(page.html(since_scroll).to_string())
    }

    fn is_running(&self) -> bool {
        self.state().running
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state();
        state.running = false;
        state.closes += 1;
        state.current_url = None;
        state.since_scroll = None;
        Ok(())
    }
}

pub struct TestHelper;

impl TestHelper {
    /// Markup shaped like a profile page: a header plus one scorecard block
    /// per `(category, percent, total)` entry.
    pub fn profile_page(scorecards: &[(&str, &str, &str)]) -> String {
        let cards: String = scorecards
            .iter()
            .map(|(category, percent, total)| {
                format!(
                    r#"
        <div class="m-scorecard">
          <p class="m-scorecard__title">{}</p>
          <p class="m-scorecard__value">{}</p>
          <a class="m-scorecard__checks">{}</a>
        </div>"#,
                    category, percent, total
                )
            })
            .collect();

        format!(
            r#"<html><head><title>Profile</title></head><body>
      <header class="o-platform__header"><h1>Profile</h1></header>
      <section class="o-platform__content">{}
      </section>
    </body></html>"#,
            cards
        )
    }

    /// Scorecard markup without the header, for extractor-only tests.
    pub fn scorecard_page(scorecards: &[(&str, &str, &str)]) -> String {
        Self::profile_page(scorecards).replace(
            r#"<header class="o-platform__header"><h1>Profile</h1></header>"#,
            "",
        )
    }

    /// Defaults with short waits so timeouts resolve quickly under test.
    pub fn fast_config() -> Config {
        let mut config = Config::default();
        config.site.base_url = "https://example.com/people/".to_string();
        config.site.subjects = Vec::new();
        config.fetch.timeout_ms = 200;
        config.fetch.initial_poll_ms = 1;
        config.fetch.max_poll_ms = 10;
        config.fetch.content_grace_ms = 20;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_lifecycle() {
        let url = "https://example.com/people/alice";
        let mock = MockBrowser::new().with_page(url, MockPage::new(TestHelper::profile_page(&[])));
        let mut browser = mock.clone();

        browser.launch(&BrowserConfig::default()).await.unwrap();
        let tab = browser.new_tab().await.unwrap();
        browser.navigate(&tab, url).await.unwrap();
        assert_eq!(
            browser.element_state(&tab, ".o-platform__header").await.unwrap(),
            ElementState::Visible
        );
        assert_eq!(
            browser.element_state(&tab, ".m-scorecard").await.unwrap(),
            ElementState::Missing
        );
        browser.close().await.unwrap();

        assert_eq!(mock.launches(), 1);
        assert_eq!(mock.closes(), 1);
        assert!(!mock.is_running());
        assert_eq!(mock.navigations(), vec![url.to_string()]);
    }

    #[tokio::test]
    async fn test_lazy_page_changes_after_scroll() {
        let url = "https://example.com/people/alice";
        let loaded = TestHelper::profile_page(&[("True", "80%", "5")]);
        let mock = MockBrowser::new().with_page(
            url,
            MockPage::new(TestHelper::profile_page(&[])).loads_after_scroll(loaded.clone(), 1),
        );
        let mut browser = mock.clone();
        browser.launch(&BrowserConfig::default()).await.unwrap();
        let tab = browser.new_tab().await.unwrap();
        browser.navigate(&tab, url).await.unwrap();

        assert!(!browser.element_state(&tab, ".m-scorecard").await.unwrap().is_present());
        assert!(browser.scroll_into_view(&tab, ".o-platform__header").await.unwrap());
        assert!(!browser.element_state(&tab, ".m-scorecard").await.unwrap().is_present());
        assert!(browser.element_state(&tab, ".m-scorecard").await.unwrap().is_present());
        assert_eq!(browser.page_html(&tab).await.unwrap(), loaded);
    }

    #[test]
    fn test_unknown_url_fails_navigation() {
        let mut browser = MockBrowser::new();
        tokio_test::block_on(async {
            tokio_test::assert_ok!(browser.launch(&BrowserConfig::default()).await);
            let tab = browser.new_tab().await.unwrap();
            let err = tokio_test::assert_err!(browser.navigate(&tab, "https://example.com/nope").await);
            assert!(matches!(err, ScrapeError::NavigationFailed(_)));
        });
    }

    #[test]
    fn test_unlaunched_browser_has_no_tabs() {
        let browser = MockBrowser::new();
        assert!(tokio_test::block_on(browser.new_tab()).is_err());
        assert_eq!(browser.launches(), 0);
    }

    #[test]
    fn test_profile_page_fixture() {
        let page = TestHelper::profile_page(&[("True", "80%", "5")]);
        assert!(page.contains("o-platform__header"));
        assert_eq!(page.matches("m-scorecard__title").count(), 1);
        assert!(!TestHelper::scorecard_page(&[]).contains("o-platform__header"));
    }
}
