//! Scriptable lock and consistency authority
//!
//! Tests grant and release locks, forbid operations, and mark entries stale,
//! then read back how often each decision point was consulted. Granting an
//! overwrite lock raises the pending consistency flag, the way a real lock
//! service does.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use wmem_core::{ConsistencyAuthority, LockAuthority, Result, WmError, WorkingMemoryAddress};

/// How often each authority entry point was called
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorityCalls {
    /// `is_overwritable` calls
    pub is_overwritable: usize,
    /// `is_deletable` calls
    pub is_deletable: usize,
    /// `check_consistency` calls
    pub check_consistency: usize,
    /// `mark_consistency_checked` calls
    pub mark_consistency_checked: usize,
}

#[derive(Debug, Default)]
struct AuthorityState {
    overwrite_locks: HashSet<WorkingMemoryAddress>,
    delete_locks: HashSet<WorkingMemoryAddress>,
    not_overwritable: HashSet<WorkingMemoryAddress>,
    not_deletable: HashSet<WorkingMemoryAddress>,
    pending: HashSet<WorkingMemoryAddress>,
    stale: HashSet<WorkingMemoryAddress>,
    calls: AuthorityCalls,
}

/// Lock and consistency authority driven entirely by the test
#[derive(Debug, Clone, Default)]
pub struct ScriptedAuthority {
    state: Arc<Mutex<AuthorityState>>,
}

impl ScriptedAuthority {
    /// Everything allowed, nothing locked, nothing stale
    pub fn new() -> Self {
        Self::default()
    }

    /// Give this writer an overwrite lock; a consistency check becomes pending
    pub fn grant_overwrite_lock(&self, address: &WorkingMemoryAddress) {
        let mut state = self.state.lock();
        state.overwrite_locks.insert(address.clone());
        state.pending.insert(address.clone());
    }

    /// Take the overwrite lock away again
    pub fn release_overwrite_lock(&self, address: &WorkingMemoryAddress) {
        let mut state = self.state.lock();
        state.overwrite_locks.remove(address);
        state.pending.remove(address);
    }

    /// Give this writer a delete lock
    pub fn grant_delete_lock(&self, address: &WorkingMemoryAddress) {
        self.state.lock().delete_locks.insert(address.clone());
    }

    /// Take the delete lock away again
    pub fn release_delete_lock(&self, address: &WorkingMemoryAddress) {
        self.state.lock().delete_locks.remove(address);
    }

    /// Policy refuses unlocked overwrites of the address
    pub fn forbid_overwrite(&self, address: &WorkingMemoryAddress) {
        self.state.lock().not_overwritable.insert(address.clone());
    }

    /// Policy refuses unlocked deletes of the address
    pub fn forbid_delete(&self, address: &WorkingMemoryAddress) {
        self.state.lock().not_deletable.insert(address.clone());
    }

    /// Consistency checks on the address fail
    pub fn mark_stale(&self, address: &WorkingMemoryAddress) {
        self.state.lock().stale.insert(address.clone());
    }

    /// Consistency checks on the address pass again
    pub fn mark_fresh(&self, address: &WorkingMemoryAddress) {
        self.state.lock().stale.remove(address);
    }

    /// Whether a one-time check is pending for the address
    pub fn is_pending(&self, address: &WorkingMemoryAddress) -> bool {
        self.state.lock().pending.contains(address)
    }

    /// Calls received so far
    pub fn calls(&self) -> AuthorityCalls {
        self.state.lock().calls
    }
}

#[async_trait]
impl LockAuthority for ScriptedAuthority {
    async fn holds_delete_lock(&self, address: &WorkingMemoryAddress) -> Result<bool> {
        Ok(self.state.lock().delete_locks.contains(address))
    }

    async fn holds_overwrite_lock(&self, address: &WorkingMemoryAddress) -> Result<bool> {
        Ok(self.state.lock().overwrite_locks.contains(address))
    }

    async fn is_deletable(&self, address: &WorkingMemoryAddress) -> Result<bool> {
        let mut state = self.state.lock();
        state.calls.is_deletable += 1;
        Ok(!state.not_deletable.contains(address))
    }

    async fn is_overwritable(&self, address: &WorkingMemoryAddress) -> Result<bool> {
        let mut state = self.state.lock();
        state.calls.is_overwritable += 1;
        Ok(!state.not_overwritable.contains(address))
    }
}

#[async_trait]
impl ConsistencyAuthority for ScriptedAuthority {
    async fn needs_consistency_check(&self, address: &WorkingMemoryAddress) -> Result<bool> {
        Ok(self.state.lock().pending.contains(address))
    }

    async fn check_consistency(&self, address: &WorkingMemoryAddress) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.check_consistency += 1;
        if state.stale.contains(address) {
            return Err(WmError::consistency(address, "scripted stale copy"));
        }
        Ok(())
    }

    async fn mark_consistency_checked(&self, address: &WorkingMemoryAddress) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.mark_consistency_checked += 1;
        state.pending.remove(address);
        Ok(())
    }
}
