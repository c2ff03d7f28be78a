//! Audit sinks backed by `tracing`

use tracing::{trace, Level};
use wmem_core::{AuditSink, WriteOp, WriteRecord};

/// Target for add records
pub const ADD_TARGET: &str = "wmem::audit::add";
/// Target for overwrite records
pub const OVERWRITE_TARGET: &str = "wmem::audit::overwrite";
/// Target for delete records
pub const DELETE_TARGET: &str = "wmem::audit::delete";

/// Emits each record as a TRACE event under a per-operation target
///
/// A subscriber filter such as `wmem::audit::overwrite=trace` selects exactly
/// the operations to keep.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn enabled(&self, op: WriteOp) -> bool {
        match op {
            WriteOp::Add => tracing::enabled!(target: ADD_TARGET, Level::TRACE),
            WriteOp::Overwrite => tracing::enabled!(target: OVERWRITE_TARGET, Level::TRACE),
            WriteOp::Delete => tracing::enabled!(target: DELETE_TARGET, Level::TRACE),
        }
    }

    fn record(&self, record: WriteRecord) {
        let line = record.to_line();
        match record.op {
            WriteOp::Add => trace!(target: ADD_TARGET, record = %line),
            WriteOp::Overwrite => trace!(target: OVERWRITE_TARGET, record = %line),
            WriteOp::Delete => trace!(target: DELETE_TARGET, record = %line),
        }
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn enabled(&self, _op: WriteOp) -> bool {
        false
    }

    fn record(&self, _record: WriteRecord) {}
}
