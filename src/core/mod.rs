pub mod browser;
pub mod config;

pub use browser::{BrowserTrait, ElementState};
pub use config::{
    BrowserConfig, Config, FailurePolicy, FetchConfig, OutputConfig, OutputFormat, RunConfig,
    SiteConfig, Viewport,
};
