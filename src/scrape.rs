use crate::browser::PageFetcher;
use crate::core::{BrowserTrait, Config, FailurePolicy};
use crate::dom::RecordExtractor;
use crate::errors::{Result, ScrapeError};
use crate::types::{ResultSet, RunReport, ScorecardRow, SkippedSubject, Subject};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};
use url::Url;

/// Drives one scrape run: profile URL per subject, fetch, extract, collect.
pub struct Scraper<B: BrowserTrait> {
    fetcher: PageFetcher<B>,
    extractor: RecordExtractor,
    base_url: Url,
    ready_selector: String,
    timeout: Duration,
    policy: FailurePolicy,
}

impl<B: BrowserTrait> Scraper<B> {
    pub fn new(browser: B, config: &Config) -> Result<Self> {
        config.validate()?;
        let base_url = Url::parse(&config.site.base_url)
            .map_err(|e| ScrapeError::Configuration(format!("base_url: {}", e)))?;

        for (field, selector) in config.site.fields.iter() {
            debug!(%field, selector, "field selector");
        }

        Ok(Self {
            fetcher: PageFetcher::new(browser, config),
            extractor: RecordExtractor::new(&config.site.fields)?,
            base_url,
            ready_selector: config.fetch.ready_selector.clone(),
            timeout: config.fetch.timeout(),
            policy: config.run.failure_policy,
        })
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn fetcher(&self) -> &PageFetcher<B> {
        &self.fetcher
    }

    /// `base_url` with the subject appended as one percent-encoded path segment.
    pub fn profile_url(&self, subject: &Subject) -> Result<Url> {
        if subject.is_dot_segment() {
            return Err(ScrapeError::Configuration(format!(
                "subject identifier {:?} is not a profile path segment",
                subject.as_str()
            )));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ScrapeError::Configuration(format!("base_url '{}' cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .push(subject.as_str());
        Ok(url)
    }

    pub async fn scrape_subject(&mut self, subject: &Subject) -> Result<Vec<ScorecardRow>> {
        let url = self.profile_url(subject)?;
        let doc = self
            .fetcher
            .fetch(url.as_str(), &self.ready_selector, self.timeout)
            .await?;

        let rows = self.extractor.extract(&doc, subject);
        if rows.is_err() {
            // The page loaded but was unusable; start the next subject on a fresh session.
            if let Err(e) = self.fetcher.release().await {
                warn!(subject = %subject, error = %e, "failed to close browser session");
            }
        }
        rows
    }

    pub async fn run(&mut self, subjects: &[Subject]) -> Result<ResultSet> {
        Ok(self.run_report(subjects).await?.rows)
    }

    pub async fn run_report(&mut self, subjects: &[Subject]) -> Result<RunReport> {
        let run_id = uuid::Uuid::new_v4();
        let span = info_span!("run", %run_id);
        let started_at = Utc::now();

        let outcome = self.run_subjects(subjects).instrument(span.clone()).await;

        if let Err(e) = self.fetcher.shutdown().await {
            span.in_scope(|| warn!(error = %e, "failed to close browser session"));
        }

        let (rows, skipped) = outcome?;
        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            rows,
            skipped,
        };
        span.in_scope(|| {
            info!(
                rows = report.rows.len(),
                skipped = report.skipped.len(),
                elapsed_ms = report.elapsed_ms(),
                "run finished"
            )
        });
        Ok(report)
    }

    async fn run_subjects(
        &mut self,
        subjects: &[Subject],
    ) -> Result<(ResultSet, Vec<SkippedSubject>)> {
        let mut rows = ResultSet::new();
        let mut skipped = Vec::new();
        info!(subjects = subjects.len(), policy = ?self.policy, "run started");

        for subject in subjects {
            match self.scrape_subject(subject).await {
                Ok(found) => {
                    info!(subject = %subject, rows = found.len(), "subject scraped");
                    rows.extend(found);
                }
                Err(e) if self.policy == FailurePolicy::SkipAndContinue && e.is_per_subject() => {
                    warn!(subject = %subject, error = %e, "skipping subject");
                    skipped.push(SkippedSubject {
                        subject: subject.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(subject = %subject, error = %e, collected = rows.len(), "aborting run");
                    return Err(ScrapeError::Aborted {
                        subject: subject.clone(),
                        partial: rows,
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok((rows, skipped))
    }
}
