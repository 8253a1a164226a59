//! Record of renders made during one session.
//!
//! The caller creates an [`AnalysisHistory`], hands it to each render by
//! `&mut`, and drops it when done. Nothing is shared between instances.

use crate::diff::ChangeCounts;
use crate::options::Mode;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRecord {
    /// Commit hash, `None` for staged changes
    pub commit: Option<String>,
    pub mode: Mode,
    pub files: usize,
    pub changes: ChangeCounts,
    /// Paths whose output was cut by the byte budget
    pub truncated: Vec<String>,
}

/// Bounded, oldest-first list of [`AnalysisRecord`]s.
#[derive(Debug, Clone)]
pub struct AnalysisHistory {
    capacity: usize,
    records: VecDeque<AnalysisRecord>,
}

impl AnalysisHistory {
    /// A history keeping at most `capacity` records; 0 keeps none.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a record, evicting the oldest when full.
    pub fn record(&mut self, record: AnalysisRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn records(&self) -> impl Iterator<Item = &AnalysisRecord> {
        self.records.iter()
    }

    pub fn latest(&self) -> Option<&AnalysisRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Totals over every record still held.
    pub fn totals(&self) -> ChangeCounts {
        self.records.iter().map(|r| r.changes).sum()
    }
}
