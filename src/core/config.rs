use crate::dom::FieldSelectors;
use crate::errors::{Result, ScrapeError};
use crate::types::Subject;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.politifact.com/personalities/";

pub const DEFAULT_SUBJECTS: [&str; 6] = [
    "donald-trump",
    "barack-obama",
    "joe-biden",
    "elizabeth-warren",
    "nancy-pelosi",
    "bernie-sanders",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub fetch: FetchConfig,
    pub site: SiteConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub disable_images: bool,
    pub args: Vec<String>,
    /// Idle timeout handed to Chrome for the DevTools connection.
    pub idle_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Element that only appears once the profile content has rendered.
    pub ready_selector: String,
    /// Element scrolled into view before waiting, to trigger lazy loading.
    pub scroll_selector: Option<String>,
    /// Lazily loaded content awaited after the ready condition holds. A page
    /// that never shows it within `content_grace_ms` is an empty profile.
    pub content_selector: Option<String>,
    pub content_grace_ms: u64,
    pub timeout_ms: u64,
    pub initial_poll_ms: u64,
    pub max_poll_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub subjects: Vec<Subject>,
    pub fields: FieldSelectors,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub failure_policy: FailurePolicy,
    /// Keep one browser alive across subjects instead of one per subject.
    pub reuse_session: bool,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failing subject, handing back the rows collected so far.
    #[default]
    Abort,
    /// Log the failure and move on to the next subject.
    SkipAndContinue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Written to stdout when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
    Jsonl,
}

impl Config {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Config = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ScrapeError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.site.base_url).map_err(|e| {
            ScrapeError::Configuration(format!("base_url '{}': {}", self.site.base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(ScrapeError::Configuration(format!(
                "base_url '{}' cannot be used as a base",
                self.site.base_url
            )));
        }

        if let Some(subject) = self.site.subjects.iter().find(|s| s.as_str().trim().is_empty()) {
            return Err(ScrapeError::Configuration(format!(
                "empty subject identifier: {:?}",
                subject.as_str()
            )));
        }
        if let Some(subject) = self.site.subjects.iter().find(|s| s.is_dot_segment()) {
            return Err(ScrapeError::Configuration(format!(
                "subject identifier {:?} is not a profile path segment",
                subject.as_str()
            )));
        }

        if self.fetch.ready_selector.trim().is_empty() {
            return Err(ScrapeError::Configuration(
                "fetch.ready_selector must not be empty".to_string(),
            ));
        }
        if let Some(content) = &self.fetch.content_selector {
            if content.trim().is_empty() {
                return Err(ScrapeError::Configuration(
                    "fetch.content_selector must not be empty when set".to_string(),
                ));
            }
        }
        if self.fetch.timeout_ms == 0 {
            return Err(ScrapeError::Configuration(
                "fetch.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.fetch.initial_poll_ms == 0 || self.fetch.initial_poll_ms > self.fetch.max_poll_ms {
            return Err(ScrapeError::Configuration(format!(
                "fetch.initial_poll_ms ({}) must be in 1..=max_poll_ms ({})",
                self.fetch.initial_poll_ms, self.fetch.max_poll_ms
            )));
        }

        self.site.fields.compile()?;
        Ok(())
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn content_grace(&self) -> Duration {
        Duration::from_millis(self.content_grace_ms)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            user_agent: None,
            disable_images: true,
            args: vec![],
            idle_timeout_ms: 30000,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            ready_selector: ".o-platform__header".to_string(),
            scroll_selector: Some(".o-platform__header".to_string()),
            content_selector: Some(".m-scorecard__title".to_string()),
            content_grace_ms: 5000,
            timeout_ms: 10000,
            initial_poll_ms: 100,
            max_poll_ms: 1000,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            subjects: DEFAULT_SUBJECTS.iter().map(|s| Subject::new(*s)).collect(),
            fields: FieldSelectors::default(),
        }
    }
}
