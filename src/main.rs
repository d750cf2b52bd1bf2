use anyhow::Context;
use clap::{Parser, ValueEnum};
use scorecard_scraper::{
    sink, ChromeBrowser, Config, FailurePolicy, OutputFormat, ScrapeError, Scraper, Subject,
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Collect fact-check scorecards for a list of people.
#[derive(Debug, Parser)]
#[command(name = "scorecard-scraper", version)]
struct Cli {
    /// TOML config file; built-in defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subject to scrape (repeatable); replaces the configured list
    #[arg(short, long = "subject", value_name = "SLUG")]
    subjects: Vec<String>,

    /// Profile page base URL
    #[arg(long)]
    base_url: Option<String>,

    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum)]
    policy: Option<Policy>,

    /// Keep one browser open for the whole run
    #[arg(long)]
    reuse_session: bool,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Ready-condition timeout per page
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Csv,
    Json,
    Jsonl,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    Abort,
    Skip,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => Config::default(),
        };

        if !self.subjects.is_empty() {
            config.site.subjects = self.subjects.into_iter().map(Subject::from).collect();
        }
        if let Some(base_url) = self.base_url {
            config.site.base_url = base_url;
        }
        if let Some(format) = self.format {
            config.run.output.format = match format {
                Format::Table => OutputFormat::Table,
                Format::Csv => OutputFormat::Csv,
                Format::Json => OutputFormat::Json,
                Format::Jsonl => OutputFormat::Jsonl,
            };
        }
        if self.output.is_some() {
            config.run.output.path = self.output;
        }
        if let Some(policy) = self.policy {
            config.run.failure_policy = match policy {
                Policy::Abort => FailurePolicy::Abort,
                Policy::Skip => FailurePolicy::SkipAndContinue,
            };
        }
        if self.reuse_session {
            config.run.reuse_session = true;
        }
        if self.headful {
            config.browser.headless = false;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.fetch.timeout_ms = timeout_ms;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the result table.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_config()?;
    info!(
        subjects = config.site.subjects.len(),
        base_url = %config.site.base_url,
        "starting scorecard scrape"
    );

    let mut scraper = Scraper::new(ChromeBrowser::new(), &config)?;
    match scraper.run_report(&config.site.subjects).await {
        Ok(report) => {
            for skipped in &report.skipped {
                error!(subject = %skipped.subject, reason = %skipped.reason, "subject skipped");
            }
            sink::write_output(&report.rows, &config.run.output)?;
            Ok(())
        }
        Err(ScrapeError::Aborted {
            subject,
            partial,
            source,
        }) => {
            // Whatever was collected before the failure still reaches the sink.
            if !partial.is_empty() {
                sink::write_output(&partial, &config.run.output)?;
            }
            Err(anyhow::Error::new(*source)
                .context(format!("run aborted at subject '{}' after {} rows", subject, partial.len())))
        }
        Err(e) => Err(e.into()),
    }
}
