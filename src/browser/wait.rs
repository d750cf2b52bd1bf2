use crate::core::FetchConfig;
use crate::errors::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Polls a readiness predicate with exponential backoff until it holds or a
/// deadline passes. The last sleep is clipped so the deadline is never overshot.
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
}

impl WaitPolicy {
    pub fn new(initial_interval: Duration, max_interval: Duration) -> Self {
        Self {
            initial_interval,
            max_interval: max_interval.max(initial_interval),
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_poll_ms),
            Duration::from_millis(config.max_poll_ms),
        )
    }

    /// Returns `Some(attempts)` once `probe` yields true, `None` on deadline.
    /// Probe errors are treated as "not yet": the page may be mid-transition.
    pub async fn until<F, Fut>(&self, deadline: Instant, mut probe: F) -> Option<u32>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let mut interval = self.initial_interval;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match probe().await {
                Ok(true) => return Some(attempts),
                Ok(false) => {}
                Err(e) => debug!(attempts, error = %e, "readiness probe failed"),
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }

            tokio::time::sleep(interval.min(deadline - now)).await;
            interval = (interval * 2).min(self.max_interval);
        }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}
