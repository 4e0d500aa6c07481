//! Configurable retry with exponential backoff.
//!
//! The delay before retry `n` (0-indexed) is `base * multiplier^n`, capped
//! when a cap is set, and randomized ±50% when jitter is enabled.

use std::future::Future;
use std::time::Duration;

/// Backoff policy: attempt budget plus interval shape.
///
/// `max_attempts` counts the initial attempt, so `max_attempts = 3` means
/// one attempt plus two retries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    multiplier: f64,
    cap: Option<Duration>,
    jitter: bool,
}

impl Default for RetryPolicy {
    /// 3 attempts, 1s base delay, multiplier 2 — the classic 1s, 2s sequence.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            cap: None,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Cap each delay at `cap` regardless of exponential growth.
    #[must_use]
    pub fn cap(mut self, cap: Duration) -> Self {
        self.cap = Some(cap);
        self
    }

    /// Randomize each delay between 50% and 150% of its computed value.
    #[must_use]
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The delay before retry `attempt` (0-indexed, so the first retry is 0).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let interval = self
            .base_delay
            .mul_f64(self.multiplier.powi(i32::try_from(attempt).unwrap_or(i32::MAX)));
        let capped = match self.cap {
            Some(cap) => interval.min(cap),
            None => interval,
        };
        if self.jitter {
            randomize(capped)
        } else {
            capped
        }
    }

    /// All delays this policy will sleep, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts.saturating_sub(1)).map(|attempt| self.delay_for(attempt))
    }

    /// Drive `op` until it succeeds or the attempt budget is exhausted.
    /// `op` receives the 1-indexed attempt number. The final error is
    /// returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error when every attempt fails.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.max_attempts => return Err(err),
                Err(_) => {
                    tokio::time::sleep(self.delay_for(attempt - 1)).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn randomize(duration: Duration) -> Duration {
    use rand::Rng;
    let seconds = duration.as_secs_f64();
    let delta = seconds * 0.5;
    let randomized = rand::rng().random_range((seconds - delta)..=(seconds + delta));
    Duration::from_secs_f64(randomized.max(0.0))
}
