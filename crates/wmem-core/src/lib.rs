//! # wmem-core - Foundation
//!
//! **Purpose**: Types and collaborator interfaces shared by every working
//! memory writer.
//!
//! - YES addresses, writer identity, configuration, the unified error type
//! - YES effect traits for the store, lock authority, consistency authority,
//!   audit sink and clock
//! - NO write protocol logic (that's `wmem-writer`)
//! - NO stateful test doubles (that's `wmem-testkit`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Writer configuration
pub mod config;

/// Collaborator effect interfaces
pub mod effects;

/// Unified error type
pub mod errors;

/// Payload envelope
pub mod payload;

/// Addresses and writer identity
pub mod types;

pub use config::{IdentifierStyle, WriterConfig};
pub use effects::{
    AuditSink, ConsistencyAuthority, EntryVersionQuery, LockAuthority, PhysicalClock, SystemClock,
    WorkingMemoryStore, WriteOp, WriteRecord,
};
pub use errors::{Result, WmError, WmErrorKind};
pub use payload::EntryPayload;
pub use types::{WorkingMemoryAddress, WriterIdentity};
