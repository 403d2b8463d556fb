use emg_core::{EmgError, Reading, Result, WindowSnapshot};

/// Fixed-capacity window over the most recent readings.
///
/// Storage is a ring: once full, each append overwrites the oldest slot and
/// advances `head`, so appends are O(1) and only [`snapshot`](Self::snapshot)
/// pays O(capacity) to lay the readings out oldest first.
#[derive(Debug, Clone)]
pub struct WindowBuffer {
    slots:      Vec<Reading>,
    capacity:   usize,
    /// Slot holding the oldest reading once the ring is full; 0 before that.
    head:       usize,
    next_index: u64,
}

impl WindowBuffer {
    /// Create an empty window.  A capacity of 0 is a configuration error.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(EmgError::Config("window capacity must be at least 1".into()));
        }

        Ok(Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            next_index: 0,
        })
    }

    /// Append `value` as the newest reading, evicting the oldest if full.
    pub fn append(&mut self, value: f64) -> Reading {
        let reading = Reading::new(self.next_index, value);
        self.next_index += 1;

        if self.is_full() {
            let evicted = std::mem::replace(&mut self.slots[self.head], reading);
            self.head = (self.head + 1) % self.capacity;
            tracing::trace!(index = evicted.index, "evicted reading");
        } else {
            self.slots.push(reading);
        }

        reading
    }

    /// Owned copy of the window, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> WindowSnapshot {
        let (newer, older) = self.slots.split_at(self.head);
        let mut readings = Vec::with_capacity(self.slots.len());
        readings.extend_from_slice(older);
        readings.extend_from_slice(newer);
        WindowSnapshot::new(readings)
    }

    /// Most recently appended reading.
    #[must_use]
    pub fn latest(&self) -> Option<Reading> {
        if self.slots.is_empty() {
            return None;
        }
        let newest = (self.head + self.slots.len() - 1) % self.slots.len();
        Some(self.slots[newest])
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sequence index the next append will receive.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, values: &[f64]) -> WindowBuffer {
        let mut window = WindowBuffer::new(capacity).unwrap();
        for &v in values {
            window.append(v);
        }
        window
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(WindowBuffer::new(0), Err(EmgError::Config(_))));
    }

    #[test]
    fn fills_from_the_front_before_evicting() {
        let window = filled(4, &[1.0, 2.0]);
        assert_eq!(window.len(), 2);
        assert!(!window.is_full());
        assert_eq!(window.snapshot().points().collect::<Vec<_>>(), vec![(0, 1.0), (1, 2.0)]);
    }

    #[test]
    fn evicts_oldest_first() {
        let window = filled(3, &[10.0, 11.0, 12.0, 13.0]);
        let snap = window.snapshot();

        assert_eq!(snap.len(), 3);
        assert!(!snap.values().contains(&10.0));
        assert_eq!(snap.points().collect::<Vec<_>>(), vec![(1, 11.0), (2, 12.0), (3, 13.0)]);
    }

    #[test]
    fn labels_stay_contiguous_after_many_wraps() {
        let values: Vec<f64> = (0..25).map(f64::from).collect();
        let window = filled(4, &values);

        assert_eq!(window.snapshot().labels(), vec![21, 22, 23, 24]);
        assert_eq!(window.next_index(), 25);
    }

    #[test]
    fn capacity_one_keeps_only_newest() {
        let window = filled(1, &[3.0, 4.0, 5.0]);
        assert_eq!(window.snapshot().points().collect::<Vec<_>>(), vec![(2, 5.0)]);
        assert_eq!(window.latest(), Some(Reading::new(2, 5.0)));
    }

    #[test]
    fn latest_tracks_newest_across_wrap() {
        let mut window = WindowBuffer::new(2).unwrap();
        assert_eq!(window.latest(), None);

        window.append(1.0);
        window.append(2.0);
        window.append(3.0);
        assert_eq!(window.latest(), Some(Reading::new(2, 3.0)));
    }

    #[test]
    fn snapshot_is_detached_from_later_appends() {
        let mut window = filled(2, &[1.0, 2.0]);
        let before = window.snapshot();

        window.append(3.0);

        assert_eq!(before.values(), vec![1.0, 2.0]);
        assert_eq!(window.snapshot().values(), vec![2.0, 3.0]);
    }
}
