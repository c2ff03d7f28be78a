//! Direct vs serializing write path
//!
//! When the store lives in the writer's own process, handing it the writer's
//! value means both sides share one allocation, and anything the writer does
//! to the value afterwards shows up in the store. The serializing path sends a
//! `bincode` copy instead. The choice is made when a store handle is assigned
//! and can be flipped explicitly afterwards.

use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use wmem_core::{EntryPayload, Result, WmError, WorkingMemoryStore};

/// How payloads reach the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WritePath {
    /// Hand over the caller's value as-is
    Direct,
    /// Encode the value so the store holds an independent copy
    Serializing,
}

/// Default path for a store handle
pub fn select_write_path(store: &dyn WorkingMemoryStore, serialize_collocated: bool) -> WritePath {
    if store.is_collocated() && serialize_collocated {
        WritePath::Serializing
    } else {
        WritePath::Direct
    }
}

/// Wrap a payload for the given path
pub fn prepare_payload<T>(path: WritePath, payload: &Arc<T>) -> Result<EntryPayload>
where
    T: Serialize + Send + Sync + 'static,
{
    match path {
        WritePath::Direct => Ok(EntryPayload::Shared(payload.clone())),
        WritePath::Serializing => bincode::serialize(payload.as_ref())
            .map(EntryPayload::Encoded)
            .map_err(|e| WmError::serialization(e.to_string())),
    }
}

struct StoreBinding {
    store: Arc<dyn WorkingMemoryStore>,
    path: WritePath,
}

/// Owns the store handle together with the path used to write to it
pub struct WriteModeSelector {
    binding: RwLock<StoreBinding>,
    serialize_collocated: bool,
}

impl WriteModeSelector {
    /// Bind a store handle and pick its default path
    pub fn new(store: Arc<dyn WorkingMemoryStore>, serialize_collocated: bool) -> Self {
        let path = select_write_path(store.as_ref(), serialize_collocated);
        debug!(?path, collocated = store.is_collocated(), "write path selected");
        Self {
            binding: RwLock::new(StoreBinding { store, path }),
            serialize_collocated,
        }
    }

    /// Replace the store handle and re-evaluate the path
    pub fn set_store(&self, store: Arc<dyn WorkingMemoryStore>) {
        let path = select_write_path(store.as_ref(), self.serialize_collocated);
        debug!(?path, collocated = store.is_collocated(), "store handle reassigned");
        *self.binding.write() = StoreBinding { store, path };
    }

    /// Store handle and path for one write
    pub fn current(&self) -> (Arc<dyn WorkingMemoryStore>, WritePath) {
        let binding = self.binding.read();
        (binding.store.clone(), binding.path)
    }

    /// The path writes currently take
    pub fn path(&self) -> WritePath {
        self.binding.read().path
    }

    /// Guarantee that later changes to written values never reach the store
    ///
    /// Only collocated handles change; remote handles copy anyway.
    pub fn force_serializing_writes(&self) {
        let mut binding = self.binding.write();
        if binding.store.is_collocated() {
            binding.path = WritePath::Serializing;
        }
    }

    /// Return to handing values over as-is
    ///
    /// Returns true when the store is collocated, i.e. writes now alias.
    pub fn restore_default_write_path(&self) -> bool {
        let mut binding = self.binding.write();
        binding.path = WritePath::Direct;
        binding.store.is_collocated()
    }
}

impl fmt::Debug for WriteModeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let binding = self.binding.read();
        f.debug_struct("WriteModeSelector")
            .field("path", &binding.path)
            .field("collocated", &binding.store.is_collocated())
            .field("serialize_collocated", &self.serialize_collocated)
            .finish()
    }
}
