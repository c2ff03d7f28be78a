//! Built-in lock and consistency policies
//!
//! [`PermissiveAuthority`] suits a single writer that owns its partition.
//! [`VersionConsistency`] is the strict check: the writer's remembered version
//! must equal the store's.

use crate::versioning::VersionTracker;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use wmem_core::{
    ConsistencyAuthority, EntryVersionQuery, LockAuthority, Result, WmError, WorkingMemoryAddress,
};

/// Holds no locks, forbids nothing, never finds a stale copy
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveAuthority;

#[async_trait]
impl LockAuthority for PermissiveAuthority {
    async fn holds_delete_lock(&self, _address: &WorkingMemoryAddress) -> Result<bool> {
        Ok(false)
    }

    async fn holds_overwrite_lock(&self, _address: &WorkingMemoryAddress) -> Result<bool> {
        Ok(false)
    }

    async fn is_deletable(&self, _address: &WorkingMemoryAddress) -> Result<bool> {
        Ok(true)
    }

    async fn is_overwritable(&self, _address: &WorkingMemoryAddress) -> Result<bool> {
        Ok(true)
    }
}

#[async_trait]
impl ConsistencyAuthority for PermissiveAuthority {
    async fn needs_consistency_check(&self, _address: &WorkingMemoryAddress) -> Result<bool> {
        Ok(false)
    }

    async fn check_consistency(&self, _address: &WorkingMemoryAddress) -> Result<()> {
        Ok(())
    }

    async fn mark_consistency_checked(&self, _address: &WorkingMemoryAddress) -> Result<()> {
        Ok(())
    }
}

/// Compares this writer's versions against the store's
///
/// An entry this writer never versioned is stale by definition. Pending flags
/// are raised by whoever grants locks ([`VersionConsistency::mark_pending`])
/// and cleared by the writer once the one-time check has passed.
pub struct VersionConsistency {
    tracker: Arc<VersionTracker>,
    store: Arc<dyn EntryVersionQuery>,
    pending: Mutex<HashSet<WorkingMemoryAddress>>,
}

impl VersionConsistency {
    /// Check `tracker` against the versions reported by `store`
    pub fn new(tracker: Arc<VersionTracker>, store: Arc<dyn EntryVersionQuery>) -> Self {
        Self {
            tracker,
            store,
            pending: Mutex::new(HashSet::new()),
        }
    }

    /// Require one check before the next locked overwrite of the address
    pub fn mark_pending(&self, address: &WorkingMemoryAddress) {
        self.pending.lock().insert(address.clone());
    }

    /// Whether a check is pending for the address
    pub fn is_pending(&self, address: &WorkingMemoryAddress) -> bool {
        self.pending.lock().contains(address)
    }
}

#[async_trait]
impl ConsistencyAuthority for VersionConsistency {
    async fn needs_consistency_check(&self, address: &WorkingMemoryAddress) -> Result<bool> {
        Ok(self.is_pending(address))
    }

    async fn check_consistency(&self, address: &WorkingMemoryAddress) -> Result<()> {
        let local = match self.tracker.current_version(address.id(), address.partition()) {
            Ok(version) => version,
            Err(WmError::NotFound { .. }) => {
                return Err(WmError::consistency(address, "no local version for entry"));
            }
            Err(e) => return Err(e),
        };
        let remote = self.store.entry_version(address).await?;
        if local != remote {
            debug!(%address, local, remote, "stale local copy");
            return Err(WmError::consistency(
                address,
                format!("local version {local}, store version {remote}"),
            ));
        }
        Ok(())
    }

    async fn mark_consistency_checked(&self, address: &WorkingMemoryAddress) -> Result<()> {
        self.pending.lock().remove(address);
        Ok(())
    }
}
