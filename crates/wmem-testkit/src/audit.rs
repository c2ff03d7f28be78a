//! Recording audit sink

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wmem_core::{AuditSink, WriteOp, WriteRecord};

/// Keeps every record in memory
#[derive(Debug, Clone)]
pub struct RecordingAuditSink {
    records: Arc<Mutex<Vec<WriteRecord>>>,
    enabled: Arc<AtomicBool>,
}

impl Default for RecordingAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingAuditSink {
    /// A sink that accepts records
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// A sink below audit verbosity; the writer should not build records for it
    pub fn disabled() -> Self {
        let sink = Self::new();
        sink.set_enabled(false);
        sink
    }

    /// Turn recording on or off
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// All records, oldest first
    pub fn records(&self) -> Vec<WriteRecord> {
        self.records.lock().clone()
    }

    /// Operations of all records, oldest first
    pub fn ops(&self) -> Vec<WriteOp> {
        self.records.lock().iter().map(|r| r.op).collect()
    }

    /// The newest record
    pub fn last(&self) -> Option<WriteRecord> {
        self.records.lock().last().cloned()
    }
}

impl AuditSink for RecordingAuditSink {
    fn enabled(&self, _op: WriteOp) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn record(&self, record: WriteRecord) {
        self.records.lock().push(record);
    }
}
