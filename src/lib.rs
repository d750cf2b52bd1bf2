pub mod browser;
pub mod core;
pub mod dom;
pub mod errors;
pub mod scrape;
pub mod sink;
pub mod testing;
pub mod types;

pub use browser::{ChromeBrowser, PageFetcher};
pub use crate::core::{Config, FailurePolicy, OutputFormat};
pub use dom::{FieldSelectors, RecordExtractor, RenderedDocument};
pub use errors::{Result, ScrapeError};
pub use scrape::Scraper;
pub use types::*;
