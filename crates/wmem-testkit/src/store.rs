//! In-memory working memory store
//!
//! Behaves like the real store from a writer's point of view: it rejects adds
//! to occupied addresses, overwrites and deletes of missing ones, and keeps a
//! per-address version history across deletes so a re-added entry continues
//! where the deleted one stopped. Out-of-band helpers let a test play the part
//! of other writers.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use wmem_core::{
    EntryPayload, EntryVersionQuery, Result, WmError, WorkingMemoryAddress, WorkingMemoryStore,
};

/// An entry as the store holds it
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// Runtime type name supplied by the writer
    pub type_name: String,
    /// Component id of the last writer
    pub writer_id: String,
    /// The body
    pub payload: EntryPayload,
    /// Authoritative version
    pub version: u64,
}

/// Counts of calls the store has received
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    /// `exists` calls
    pub exists: usize,
    /// `add` calls, accepted or not
    pub add: usize,
    /// `overwrite` calls, accepted or not
    pub overwrite: usize,
    /// `delete` calls, accepted or not
    pub delete: usize,
}

#[derive(Debug, Default)]
struct StoreState {
    entries: HashMap<WorkingMemoryAddress, StoredEntry>,
    history: HashMap<WorkingMemoryAddress, u64>,
    calls: StoreCalls,
    unreachable: bool,
}

/// Stateful store for tests
#[derive(Debug, Clone)]
pub struct MemoryWorkingMemory {
    state: Arc<Mutex<StoreState>>,
    partitions: Option<HashSet<String>>,
    collocated: bool,
}

impl Default for MemoryWorkingMemory {
    fn default() -> Self {
        Self::remote()
    }
}

impl MemoryWorkingMemory {
    /// A store that presents itself as reached over the network
    pub fn remote() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            partitions: None,
            collocated: false,
        }
    }

    /// A store in the writer's own process
    pub fn collocated() -> Self {
        Self {
            collocated: true,
            ..Self::remote()
        }
    }

    /// Only host the listed partitions
    pub fn with_partitions<I, S>(mut self, partitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partitions = Some(partitions.into_iter().map(Into::into).collect());
        self
    }

    /// Make every call fail as if the network were down
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
    }

    /// Calls received so far
    pub fn calls(&self) -> StoreCalls {
        self.state.lock().calls
    }

    /// The entry at an address
    pub fn entry(&self, address: &WorkingMemoryAddress) -> Option<StoredEntry> {
        self.state.lock().entries.get(address).cloned()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether no entries are live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Put an entry in place as another writer would
    pub fn insert_foreign(
        &self,
        address: &WorkingMemoryAddress,
        writer_id: &str,
        payload: EntryPayload,
    ) {
        let mut state = self.state.lock();
        let version = next_version(&state.history, address);
        state.history.insert(address.clone(), version);
        state.entries.insert(
            address.clone(),
            StoredEntry {
                type_name: "foreign".to_string(),
                writer_id: writer_id.to_string(),
                payload,
                version,
            },
        );
    }

    /// Overwrite an entry as another writer would, moving its version on
    pub fn overwrite_foreign(
        &self,
        address: &WorkingMemoryAddress,
        writer_id: &str,
    ) -> Result<u64> {
        let mut state = self.state.lock();
        let entry = state
            .entries
            .get_mut(address)
            .ok_or_else(|| WmError::not_found(address))?;
        entry.version += 1;
        entry.writer_id = writer_id.to_string();
        let version = entry.version;
        state.history.insert(address.clone(), version);
        Ok(version)
    }

    /// Remove an entry as another writer would
    pub fn remove_foreign(&self, address: &WorkingMemoryAddress) -> Option<StoredEntry> {
        self.state.lock().entries.remove(address)
    }

    fn admit(&self, state: &StoreState, address: &WorkingMemoryAddress) -> Result<()> {
        if state.unreachable {
            return Err(WmError::unreachable("in-memory store marked unreachable"));
        }
        if let Some(partitions) = &self.partitions {
            if !partitions.contains(address.partition()) {
                return Err(WmError::unknown_partition(address.partition()));
            }
        }
        Ok(())
    }
}

fn next_version(
    history: &HashMap<WorkingMemoryAddress, u64>,
    address: &WorkingMemoryAddress,
) -> u64 {
    history.get(address).map_or(0, |v| v + 1)
}

#[async_trait]
impl WorkingMemoryStore for MemoryWorkingMemory {
    async fn exists(&self, address: &WorkingMemoryAddress) -> Result<bool> {
        let mut state = self.state.lock();
        state.calls.exists += 1;
        self.admit(&state, address)?;
        Ok(state.entries.contains_key(address))
    }

    async fn add(
        &self,
        address: &WorkingMemoryAddress,
        type_name: &str,
        writer_id: &str,
        payload: EntryPayload,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.add += 1;
        self.admit(&state, address)?;
        if state.entries.contains_key(address) {
            return Err(WmError::already_exists(address));
        }
        let version = next_version(&state.history, address);
        state.history.insert(address.clone(), version);
        state.entries.insert(
            address.clone(),
            StoredEntry {
                type_name: type_name.to_string(),
                writer_id: writer_id.to_string(),
                payload,
                version,
            },
        );
        Ok(())
    }

    async fn overwrite(
        &self,
        address: &WorkingMemoryAddress,
        type_name: &str,
        writer_id: &str,
        payload: EntryPayload,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.overwrite += 1;
        self.admit(&state, address)?;
        let entry = state
            .entries
            .get_mut(address)
            .ok_or_else(|| WmError::not_found(address))?;
        entry.version += 1;
        entry.type_name = type_name.to_string();
        entry.writer_id = writer_id.to_string();
        entry.payload = payload;
        let version = entry.version;
        state.history.insert(address.clone(), version);
        Ok(())
    }

    async fn delete(&self, address: &WorkingMemoryAddress, _writer_id: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.delete += 1;
        self.admit(&state, address)?;
        state
            .entries
            .remove(address)
            .map(|_| ())
            .ok_or_else(|| WmError::not_found(address))
    }

    fn is_collocated(&self) -> bool {
        self.collocated
    }
}

#[async_trait]
impl EntryVersionQuery for MemoryWorkingMemory {
    async fn entry_version(&self, address: &WorkingMemoryAddress) -> Result<u64> {
        let state = self.state.lock();
        self.admit(&state, address)?;
        state
            .entries
            .get(address)
            .map(|entry| entry.version)
            .ok_or_else(|| WmError::not_found(address))
    }
}
