pub mod chrome;
pub mod fetcher;
pub mod wait;

pub use chrome::ChromeBrowser;
pub use fetcher::PageFetcher;
pub use wait::WaitPolicy;
