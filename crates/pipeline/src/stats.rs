use emg_core::Summary;

/// Running peak and mean over every reading of the session.
///
/// Independent of the display window: evicted readings still count.
#[derive(Debug, Clone)]
pub struct StatisticsEngine {
    peak:  f64,
    sum:   f64,
    count: u64,
}

impl Default for StatisticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsEngine {
    pub fn new() -> Self {
        Self {
            peak:  f64::NEG_INFINITY,
            sum:   0.0,
            count: 0,
        }
    }

    /// Fold `value` into the running statistics and return the updated summary.
    pub fn observe(&mut self, value: f64) -> Summary {
        self.peak = self.peak.max(value);
        self.sum += value;
        self.count += 1;
        self.current()
    }

    /// Current statistics, `None` until the first observation.
    #[must_use]
    pub fn summary(&self) -> Option<Summary> {
        (self.count > 0).then(|| self.current())
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    fn current(&self) -> Summary {
        Summary {
            peak:  self.peak,
            mean:  self.sum / self.count as f64,
            count: self.count,
        }
    }
}
