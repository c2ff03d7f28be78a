//! # wmem-writer - Write Coordination
//!
//! **Purpose**: Negotiate safe, ordered mutations of a shared working memory
//! that many components write concurrently.
//!
//! - [`WriteCoordinator`]: add / overwrite / delete with optimistic versioning,
//!   lock-aware permission checks and an audit trail
//! - [`VersionTracker`]: per-entry versions this writer has produced
//! - [`IdentifierGenerator`]: short ids that never collide between writers
//! - [`WriteModeSelector`]: direct vs serializing writes for collocated stores
//!
//! Persistence, lock ownership and version truth belong to the collaborators
//! defined in `wmem-core`; this crate only decides whether and in what order
//! to call them.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use wmem_core::{WriterConfig, WorkingMemoryStore};
//! # use wmem_writer::{PermissiveAuthority, WriteCoordinator};
//! # async fn demo(store: Arc<dyn WorkingMemoryStore>) -> wmem_core::Result<()> {
//! let writer = WriteCoordinator::new(
//!     WriterConfig::new("planner", 3, "planning.sa"),
//!     store,
//!     Arc::new(PermissiveAuthority),
//!     Arc::new(PermissiveAuthority),
//! )?;
//! let id = writer.new_identifier();
//! writer.add(&id, Arc::new(String::from("goal"))).await?;
//! writer.overwrite(&id, Arc::new(String::from("revised goal"))).await?;
//! writer.delete(&id).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Audit sinks backed by tracing
pub mod audit;

/// The write protocol
pub mod coordinator;

/// Writer-local entry identifiers
pub mod identifiers;

/// Built-in lock and consistency policies
pub mod policy;

/// Local version bookkeeping
pub mod versioning;

/// Direct vs serializing write path
pub mod write_path;

pub use audit::{NullAuditSink, TracingAuditSink};
pub use coordinator::WriteCoordinator;
pub use identifiers::{decode_identifier, IdentifierGenerator};
pub use policy::{PermissiveAuthority, VersionConsistency};
pub use versioning::{VersionRecord, VersionTracker};
pub use write_path::{select_write_path, WriteModeSelector, WritePath};
