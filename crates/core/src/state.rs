use chrono::{DateTime, Local};

/// One scalar sensor sample together with its ingestion sequence index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Position in the session's reading sequence (0-based, never reset).
    pub index: u64,
    pub value: f64,
}

impl Reading {
    #[must_use]
    pub fn new(index: u64, value: f64) -> Self {
        Self { index, value }
    }

    /// X-axis category for this reading.
    #[must_use]
    pub fn label(&self) -> u64 {
        self.index
    }
}

/// Owned, point-in-time copy of the visible window, oldest reading first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowSnapshot {
    readings: Vec<Reading>,
}

impl WindowSnapshot {
    #[must_use]
    pub fn new(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// `(label, value)` pairs in display order.
    pub fn points(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.readings.iter().map(|r| (r.label(), r.value))
    }

    pub fn labels(&self) -> Vec<u64> {
        self.readings.iter().map(Reading::label).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.value).collect()
    }

    /// Smallest and largest value in the window, `None` when empty.
    #[must_use]
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut values = self.readings.iter().map(|r| r.value);
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// Lifetime statistics after the most recent observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Largest value seen this session (including evicted readings).
    pub peak:  f64,
    /// `sum / count` over every reading seen this session.
    pub mean:  f64,
    /// Number of readings observed this session.
    pub count: u64,
}

/// Everything a render surface needs for one redraw.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// The reading that triggered this frame.
    pub latest:      Reading,
    pub window:      WindowSnapshot,
    pub summary:     Summary,
    /// Wall-clock time the reading was ingested.
    pub received_at: DateTime<Local>,
}
