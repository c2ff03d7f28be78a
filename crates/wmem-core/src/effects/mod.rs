//! Collaborator interfaces consumed by a working memory writer
//!
//! The writer decides *whether* and *in what order* to mutate; everything
//! with its own authority (persistence, locks, version truth, audit durability,
//! time) sits behind one of these traits and is injected at construction.

pub mod audit;
pub mod authority;
pub mod store;
pub mod time;

pub use audit::{AuditSink, WriteOp, WriteRecord};
pub use authority::{ConsistencyAuthority, LockAuthority};
pub use store::{EntryVersionQuery, WorkingMemoryStore};
pub use time::{PhysicalClock, SystemClock};
