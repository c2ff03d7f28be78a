//! Audit trail effect interface

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of mutation recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOp {
    /// Entry added (or re-added under a reused id)
    Add,
    /// Entry body replaced
    Overwrite,
    /// Entry removed
    Delete,
}

impl WriteOp {
    /// Short code used in rendered audit lines
    pub fn code(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Overwrite => "ovr",
            Self::Delete => "del",
        }
    }
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One entry of the append-only write log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRecord {
    /// What happened
    pub op: WriteOp,
    /// When the writer saw the store accept it
    pub timestamp_ms: u64,
    /// Entry id
    pub entry_id: String,
    /// Partition of the entry
    pub partition: String,
    /// Runtime type name of the payload (absent for deletes)
    pub payload_type: Option<String>,
    /// Version after the mutation (absent for deletes and untracked overwrites)
    pub version: Option<u64>,
}

impl WriteRecord {
    /// Render as a comma separated line: `op,timestamp,id,partition[,type,version]`
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "{},{},{},{}",
            self.op, self.timestamp_ms, self.entry_id, self.partition
        );
        if let Some(payload_type) = &self.payload_type {
            line.push(',');
            line.push_str(payload_type);
            line.push(',');
            if let Some(version) = self.version {
                line.push_str(&version.to_string());
            }
        }
        line
    }
}

/// Consumer of write records
///
/// Sinks are verbosity-gated: the writer asks [`AuditSink::enabled`] first and
/// only builds a record when the answer is yes.
pub trait AuditSink: Send + Sync {
    /// Whether records for this operation would be kept
    fn enabled(&self, op: WriteOp) -> bool;

    /// Accept one record
    fn record(&self, record: WriteRecord);
}
