//! Remote store effect interface

use crate::{EntryPayload, Result, WorkingMemoryAddress};
use async_trait::async_trait;

/// The store that persists entries and tells subscribers about changes
///
/// Each call completes (or fails) before returning. Rejections map onto
/// [`crate::WmError`]: `AlreadyExists` for an occupied add target, `NotFound`
/// for a missing overwrite/delete target, `UnknownPartition` for a partition
/// the store does not host, `Unreachable` for transport failures.
#[async_trait]
pub trait WorkingMemoryStore: Send + Sync {
    /// Whether an entry currently exists at the address
    async fn exists(&self, address: &WorkingMemoryAddress) -> Result<bool>;

    /// Add a new entry
    async fn add(
        &self,
        address: &WorkingMemoryAddress,
        type_name: &str,
        writer_id: &str,
        payload: EntryPayload,
    ) -> Result<()>;

    /// Replace the body of an existing entry
    async fn overwrite(
        &self,
        address: &WorkingMemoryAddress,
        type_name: &str,
        writer_id: &str,
        payload: EntryPayload,
    ) -> Result<()>;

    /// Remove an existing entry
    async fn delete(&self, address: &WorkingMemoryAddress, writer_id: &str) -> Result<()>;

    /// Whether this handle reaches a store in the writer's own address space
    ///
    /// Collocated handles skip the network and may alias payloads.
    fn is_collocated(&self) -> bool {
        false
    }
}

/// Read access to the store's authoritative version of an entry
#[async_trait]
pub trait EntryVersionQuery: Send + Sync {
    /// Authoritative version of the entry, `NotFound` if it does not exist
    async fn entry_version(&self, address: &WorkingMemoryAddress) -> Result<u64>;
}
