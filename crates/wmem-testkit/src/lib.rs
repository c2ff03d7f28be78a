//! # wmem-testkit - Test Infrastructure
//!
//! Stateful doubles for every collaborator a working memory writer talks to,
//! plus logging setup and proptest strategies.
//!
//! Uses `parking_lot` locks that are never held across an await point, so the
//! doubles work from any runtime flavour.

#![warn(missing_docs)]

/// Scriptable lock and consistency authority
pub mod authority;

/// Recording audit sink
pub mod audit;

/// Proptest strategies
pub mod strategies;

/// In-memory store
pub mod store;

/// Deterministic clock
pub mod time;

pub use audit::RecordingAuditSink;
pub use authority::{AuthorityCalls, ScriptedAuthority};
pub use store::{MemoryWorkingMemory, StoreCalls, StoredEntry};
pub use time::{FixedClock, DEFAULT_TIME_MS};

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber honouring `RUST_LOG`; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
