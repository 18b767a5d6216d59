use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// One timestamped resource-usage reading. Immutable once appended.
///
/// `rows_written` is always recorded as 0; the column survives in the
/// persisted schema for compatibility with existing consumers of the CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub cpu_percent: f32,
    pub memory_used: u64,
    pub disk_used: u64,
    pub rows_written: u64,
}

/// Insertion-ordered buffer of observations. Only the sampling loop appends,
/// serially, so timestamps are non-decreasing. With `max_samples` set the
/// oldest observation is evicted when the cap is reached.
#[derive(Debug, Default)]
pub struct ObservationLog {
    entries: VecDeque<Observation>,
    max_samples: Option<usize>,
}

impl ObservationLog {
    pub fn new(max_samples: Option<usize>) -> Self {
        ObservationLog {
            entries: VecDeque::new(),
            max_samples,
        }
    }

    pub fn push(&mut self, observation: Observation) {
        if let Some(cap) = self.max_samples
            && self.entries.len() >= cap
        {
            self.entries.pop_front();
        }
        self.entries.push_back(observation);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Independent copy of the whole log, in stored order.
    pub fn snapshot(&self) -> Vec<Observation> {
        self.entries.iter().cloned().collect()
    }

    /// Observations with `start <= timestamp <= end`, in stored order.
    /// An inverted window matches nothing.
    pub fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Observation> {
        self.entries
            .iter()
            .filter(|o| o.timestamp >= start && o.timestamp <= end)
            .cloned()
            .collect()
    }
}
