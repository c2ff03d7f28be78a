//! Local version bookkeeping
//!
//! A record exists for an id once this writer has added it, and is never
//! removed: deleting the remote entry keeps the record so a later re-add
//! under the same id continues the sequence instead of restarting at 0.

use parking_lot::Mutex;
use std::collections::HashMap;
use wmem_core::{Result, WmError, WorkingMemoryAddress};

fn untracked(id: &str, partition: &str) -> WmError {
    match WorkingMemoryAddress::new(partition, id) {
        Ok(address) => WmError::not_found(&address),
        Err(e) => e,
    }
}

/// Version of an entry as this writer last wrote it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionRecord {
    /// Current version, 0 after the first add
    pub version: u64,
}

/// Per-id versions for entries this writer has written
#[derive(Debug, Default)]
pub struct VersionTracker {
    records: Mutex<HashMap<String, VersionRecord>>,
}

impl VersionTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this writer has a record for the id
    pub fn is_versioned(&self, id: &str) -> bool {
        self.records.lock().contains_key(id)
    }

    /// Start tracking an id at version 0
    ///
    /// Calling this for an id that is already tracked is a bug in the caller.
    pub fn start_versioning(&self, id: &str) -> Result<()> {
        let mut records = self.records.lock();
        if records.contains_key(id) {
            return Err(WmError::internal(format!("{id} is already versioned")));
        }
        records.insert(id.to_string(), VersionRecord { version: 0 });
        Ok(())
    }

    /// Current version for the id, `NotFound` if untracked
    pub fn current_version(&self, id: &str, partition: &str) -> Result<u64> {
        self.records
            .lock()
            .get(id)
            .map(|record| record.version)
            .ok_or_else(|| untracked(id, partition))
    }

    /// Version the next add of this id will carry: 0 if untracked, current + 1 otherwise
    pub fn planned_add_version(&self, id: &str) -> u64 {
        self.records
            .lock()
            .get(id)
            .map_or(0, |record| record.version + 1)
    }

    /// Store current + 1 for a reused id and return it
    pub fn bump_on_re_add(&self, id: &str, partition: &str) -> Result<u64> {
        let mut records = self.records.lock();
        match records.get_mut(id) {
            Some(record) => {
                record.version += 1;
                Ok(record.version)
            }
            None => Err(untracked(id, partition)),
        }
    }

    /// Commit a successful add: version 0 for a new id, current + 1 otherwise
    ///
    /// Start and re-add bump happen under one lock, so concurrent commits for
    /// the same id never hand out the same version.
    pub fn record_add(&self, id: &str) -> u64 {
        let mut records = self.records.lock();
        match records.get_mut(id) {
            Some(record) => {
                record.version += 1;
                record.version
            }
            None => {
                records.insert(id.to_string(), VersionRecord { version: 0 });
                0
            }
        }
    }

    /// Raise the version after a successful overwrite
    ///
    /// Returns `None` for ids this writer never added; those stay untracked.
    pub fn bump_on_overwrite(&self, id: &str) -> Option<u64> {
        let mut records = self.records.lock();
        records.get_mut(id).map(|record| {
            record.version += 1;
            record.version
        })
    }

    /// Copy of all records, for diagnostics
    pub fn snapshot(&self) -> HashMap<String, VersionRecord> {
        self.records.lock().clone()
    }

    /// Number of tracked ids
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::Arc;

    #[test]
    fn test_unseen_ids_are_unversioned() {
        let tracker = VersionTracker::new();
        assert!(!tracker.is_versioned("x"));
        assert_eq!(tracker.planned_add_version("x"), 0);
        assert_matches!(
            tracker.current_version("x", "sa1"),
            Err(WmError::NotFound { .. })
        );
    }

    #[test]
    fn test_start_then_bump() {
        let tracker = VersionTracker::new();
        tracker.start_versioning("x").unwrap();
        assert_eq!(tracker.current_version("x", "sa1").unwrap(), 0);
        assert_eq!(tracker.planned_add_version("x"), 1);

        assert_eq!(tracker.bump_on_re_add("x", "sa1").unwrap(), 1);
        assert_eq!(tracker.bump_on_overwrite("x"), Some(2));
        assert_eq!(tracker.current_version("x", "sa1").unwrap(), 2);
    }

    #[test]
    fn test_double_start_is_internal_error() {
        let tracker = VersionTracker::new();
        tracker.start_versioning("x").unwrap();
        assert_matches!(tracker.start_versioning("x"), Err(WmError::Internal { .. }));
        assert_eq!(tracker.current_version("x", "sa1").unwrap(), 0);
    }

    #[test]
    fn test_untracked_overwrite_stays_untracked() {
        let tracker = VersionTracker::new();
        assert_eq!(tracker.bump_on_overwrite("theirs"), None);
        assert!(!tracker.is_versioned("theirs"));
        assert_matches!(
            tracker.bump_on_re_add("theirs", "sa1"),
            Err(WmError::NotFound { .. })
        );
    }

    #[test]
    fn test_record_add_starts_then_continues() {
        let tracker = VersionTracker::new();
        assert_eq!(tracker.record_add("x"), 0);
        assert_eq!(tracker.record_add("x"), 1);
        assert_eq!(tracker.bump_on_overwrite("x"), Some(2));
        assert_eq!(tracker.record_add("y"), 0);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["x"], VersionRecord { version: 2 });
        assert_eq!(snapshot["y"], VersionRecord { version: 0 });

        // a snapshot is a copy, not a view
        tracker.bump_on_overwrite("y");
        assert_eq!(snapshot["y"].version, 0);
        assert_eq!(tracker.current_version("y", "sa1").unwrap(), 1);
    }

    #[test]
    fn test_concurrent_first_adds_hand_out_each_version_once() {
        let tracker = Arc::new(VersionTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = tracker.clone();
                std::thread::spawn(move || {
                    (0..50).map(|_| tracker.record_add("x")).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..400).collect::<Vec<_>>());
    }

    #[test]
    fn test_concurrent_re_adds_never_share_a_version() {
        let tracker = Arc::new(VersionTracker::new());
        tracker.start_versioning("x").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = tracker.clone();
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| tracker.bump_on_re_add("x", "sa1").unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (1..=800).collect::<Vec<_>>());
    }
}
