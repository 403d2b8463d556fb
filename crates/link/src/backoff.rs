use emg_config::ReconnectPolicy;
use rand::Rng;
use std::time::Duration;

/// Largest exponent applied to the initial delay; keeps the shift in range.
const MAX_EXPONENT: u32 = 16;

/// Capped exponential backoff with optional jitter.
///
/// Delay for attempt `n` (0-based) is `initial * 2^n`, randomized by
/// `± jitter * delay`, then capped at `max`.  With `max_attempts = None` the
/// sequence never ends.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial:      Duration,
    max:          Duration,
    jitter:       f64,
    max_attempts: Option<u32>,
    attempts:     u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
            jitter: 0.0,
            max_attempts: None,
            attempts: 0,
        }
    }

    pub fn from_policy(policy: &ReconnectPolicy) -> Self {
        Self::new(policy.initial_delay(), policy.max_delay())
            .with_jitter(policy.jitter)
            .with_max_attempts(policy.max_attempts)
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay before the next retry, or `None` once the attempt budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.max_attempts.is_some_and(|max| self.attempts >= max) {
            return None;
        }

        let exponent = self.attempts.min(MAX_EXPONENT);
        self.attempts += 1;

        let base = self.initial.saturating_mul(1 << exponent).min(self.max);
        if self.jitter == 0.0 {
            return Some(base);
        }

        let factor = 1.0 + rand::thread_rng().gen_range(-self.jitter..=self.jitter);
        Some(base.mul_f64(factor).min(self.max))
    }

    /// Forget past failures; the next delay starts from `initial` again.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Consecutive failures since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
