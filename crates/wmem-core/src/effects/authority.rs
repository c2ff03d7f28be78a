//! Lock and consistency authority interfaces
//!
//! Both are strategy objects: a single-writer deployment can plug in an
//! always-allow policy while production uses the real lock service.

use crate::{Result, WorkingMemoryAddress};
use async_trait::async_trait;

/// Decides who may delete or overwrite an entry
#[async_trait]
pub trait LockAuthority: Send + Sync {
    /// Whether this writer currently holds a delete lock on the address
    async fn holds_delete_lock(&self, address: &WorkingMemoryAddress) -> Result<bool>;

    /// Whether this writer currently holds an overwrite lock on the address
    async fn holds_overwrite_lock(&self, address: &WorkingMemoryAddress) -> Result<bool>;

    /// Whether policy lets an unlocked writer delete the entry
    async fn is_deletable(&self, address: &WorkingMemoryAddress) -> Result<bool>;

    /// Whether policy lets an unlocked writer overwrite the entry
    async fn is_overwritable(&self, address: &WorkingMemoryAddress) -> Result<bool>;
}

/// Decides whether a writer's copy of an entry is current
#[async_trait]
pub trait ConsistencyAuthority: Send + Sync {
    /// Whether a one-time check is still pending for a locked entry
    async fn needs_consistency_check(&self, address: &WorkingMemoryAddress) -> Result<bool>;

    /// Fail with `Consistency` if the writer's copy is stale
    async fn check_consistency(&self, address: &WorkingMemoryAddress) -> Result<()>;

    /// Clear the pending-check flag for a locked entry
    async fn mark_consistency_checked(&self, address: &WorkingMemoryAddress) -> Result<()>;
}
