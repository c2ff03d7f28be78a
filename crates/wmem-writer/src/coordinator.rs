//! Optimistic-versioning write protocol
//!
//! Per entry id, from this writer's point of view:
//!
//! ```text
//! UNVERSIONED --add--------------> VERSIONED(0)
//! VERSIONED(v) --add (re-add)----> VERSIONED(v+1)
//! VERSIONED(v) --overwrite ok----> VERSIONED(v+1)
//! VERSIONED(v) --delete ok-------> VERSIONED(v)    record kept, remote entry gone
//! ```
//!
//! Every rejected operation leaves the version tracker and the audit trail
//! untouched. Writes to the same id from this writer are serialized; writes
//! to different ids run concurrently.

use crate::audit::TracingAuditSink;
use crate::identifiers::IdentifierGenerator;
use crate::versioning::VersionTracker;
use crate::write_path::{prepare_payload, WriteModeSelector, WritePath};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;
use wmem_core::{
    AuditSink, ConsistencyAuthority, LockAuthority, PhysicalClock, Result, SystemClock, WmError,
    WorkingMemoryAddress, WorkingMemoryStore, WriteOp, WriteRecord, WriterConfig, WriterIdentity,
};

/// One async mutex per entry id, held for the whole of an operation
///
/// A slot exists only while some operation on the id holds or waits for it;
/// slots left behind by cancelled waiters go with the next release.
#[derive(Default)]
struct EntryLocks {
    slots: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl EntryLocks {
    async fn acquire(&self, id: &str) -> EntryGuard<'_> {
        let slot = self
            .slots
            .lock()
            .entry(id.to_string())
            .or_default()
            .clone();
        EntryGuard {
            owner: self,
            guard: Some(slot.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

/// Releases the entry mutex and drops every slot nobody holds or waits for
struct EntryGuard<'a> {
    owner: &'a EntryLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for EntryGuard<'_> {
    fn drop(&mut self) {
        // slots are only cloned under the map lock, so a count of 1 stays 1
        let mut slots = self.owner.slots.lock();
        drop(self.guard.take());
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
    }
}

/// Writes to working memory on behalf of one component
pub struct WriteCoordinator {
    identity: WriterIdentity,
    partition: String,
    ids: IdentifierGenerator,
    versions: Arc<VersionTracker>,
    selector: WriteModeSelector,
    locks: Arc<dyn LockAuthority>,
    consistency: Arc<dyn ConsistencyAuthority>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn PhysicalClock>,
    entry_locks: EntryLocks,
}

impl WriteCoordinator {
    /// Create a writer bound to `store`
    ///
    /// Audit records go to [`TracingAuditSink`] and timestamps come from the
    /// system clock unless replaced with the `with_*` methods.
    pub fn new(
        config: WriterConfig,
        store: Arc<dyn WorkingMemoryStore>,
        locks: Arc<dyn LockAuthority>,
        consistency: Arc<dyn ConsistencyAuthority>,
    ) -> Result<Self> {
        config.validate()?;
        let component_number = config.required_component_number()?;
        let ids = IdentifierGenerator::new(
            config.identifier_style,
            &config.component_id,
            component_number,
        );
        let selector = WriteModeSelector::new(store, config.serialize_collocated_writes);
        Ok(Self {
            identity: WriterIdentity::new(config.component_id, component_number),
            partition: config.partition,
            ids,
            versions: Arc::new(VersionTracker::new()),
            selector,
            locks,
            consistency,
            audit: Arc::new(TracingAuditSink),
            clock: Arc::new(SystemClock),
            entry_locks: EntryLocks::default(),
        })
    }

    /// Send audit records to `sink`
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// Timestamp audit records with `clock`
    pub fn with_clock(mut self, clock: Arc<dyn PhysicalClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a tracker shared with another party, e.g. a consistency authority
    ///
    /// Per-entry sections are local to one coordinator. If two coordinators
    /// share a tracker, their writes to the same id are not ordered against
    /// each other and each still gets a distinct version.
    pub fn with_version_tracker(mut self, versions: Arc<VersionTracker>) -> Self {
        self.versions = versions;
        self
    }

    /// Identity attached to every mutation
    pub fn identity(&self) -> &WriterIdentity {
        &self.identity
    }

    /// The writer's own partition
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// Local version records
    pub fn versions(&self) -> &Arc<VersionTracker> {
        &self.versions
    }

    /// The path writes currently take
    pub fn write_path(&self) -> WritePath {
        self.selector.path()
    }

    /// A fresh entry id, never returned before by this writer
    pub fn new_identifier(&self) -> String {
        self.ids.next()
    }

    /// Rebind to another store handle; the write path is re-evaluated
    pub fn set_store(&self, store: Arc<dyn WorkingMemoryStore>) {
        self.selector.set_store(store);
    }

    /// Make sure the store never aliases written values
    pub fn force_serializing_writes(&self) {
        self.selector.force_serializing_writes();
    }

    /// Hand values to the store as-is; returns true if they are now aliased
    pub fn restore_default_write_path(&self) -> bool {
        self.selector.restore_default_write_path()
    }

    fn own_address(&self, id: &str) -> Result<WorkingMemoryAddress> {
        WorkingMemoryAddress::new(self.partition.as_str(), id)
    }

    /// Add an entry to the writer's own partition
    pub async fn add<T>(&self, id: &str, payload: Arc<T>) -> Result<()>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let address = self.own_address(id)?;
        self.add_at(&address, payload).await.map_err(own_partition)
    }

    /// Add an entry to `partition`
    pub async fn add_in<T>(&self, id: &str, partition: &str, payload: Arc<T>) -> Result<()>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let address = WorkingMemoryAddress::new(partition, id)?;
        self.add_at(&address, payload).await
    }

    /// Add an entry at `address`
    ///
    /// Reusing an id this writer added before is a deliberate re-add and
    /// continues its version sequence. The store decides whether the address
    /// is free; an occupied address fails with `AlreadyExists`.
    pub async fn add_at<T>(&self, address: &WorkingMemoryAddress, payload: Arc<T>) -> Result<()>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let id = address.id();
        let _entry = self.entry_locks.acquire(id).await;

        let first_add = !self.versions.is_versioned(id);
        let planned = self.versions.planned_add_version(id);
        if first_add {
            debug!(entry_id = id, partition = address.partition(), "not versioned, starting at 0");
        } else {
            debug!(entry_id = id, partition = address.partition(), version = planned, "re-adding");
        }

        let type_name = std::any::type_name::<T>();
        let (store, path) = self.selector.current();
        let body = prepare_payload(path, &payload)?;
        store
            .add(address, type_name, &self.identity.component_id, body)
            .await
            .inspect_err(|e| debug!(%address, error = %e, "add rejected"))?;

        let version = self.versions.record_add(id);
        if version != planned {
            debug!(%address, planned, version, "tracker moved by another writer");
        }

        self.emit(WriteOp::Add, address, Some(type_name), Some(version));
        Ok(())
    }

    /// Overwrite an entry in the writer's own partition
    pub async fn overwrite<T>(&self, id: &str, payload: Arc<T>) -> Result<()>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let address = self.own_address(id)?;
        self.overwrite_at(&address, payload).await.map_err(own_partition)
    }

    /// Overwrite an entry in `partition`
    pub async fn overwrite_in<T>(&self, id: &str, partition: &str, payload: Arc<T>) -> Result<()>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let address = WorkingMemoryAddress::new(partition, id)?;
        self.overwrite_at(&address, payload).await
    }

    /// Overwrite the entry at `address`
    ///
    /// Without an overwrite lock the lock authority's policy must allow the
    /// overwrite and the consistency check always runs. Holding the lock skips
    /// the policy; the check then runs only while one is pending, once.
    pub async fn overwrite_at<T>(
        &self,
        address: &WorkingMemoryAddress,
        payload: Arc<T>,
    ) -> Result<()>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let id = address.id();
        let _entry = self.entry_locks.acquire(id).await;

        let (store, path) = self.selector.current();

        if !store.exists(address).await? {
            debug!(%address, "overwrite target missing");
            return Err(WmError::not_found(address));
        }

        if self.locks.holds_overwrite_lock(address).await? {
            if self.consistency.needs_consistency_check(address).await? {
                debug!(%address, "one-time consistency check for locked entry");
                // a failed check leaves the flag pending for the next attempt
                self.consistency.check_consistency(address).await?;
                self.consistency.mark_consistency_checked(address).await?;
            } else {
                debug!(%address, "skipping consistency check for locked entry");
            }
        } else {
            if !self.locks.is_overwritable(address).await? {
                debug!(%address, "overwrite not permitted");
                return Err(WmError::permission(address, "overwrite not allowed on locked entry"));
            }
            self.consistency.check_consistency(address).await?;
        }

        let type_name = std::any::type_name::<T>();
        let body = prepare_payload(path, &payload)?;
        store
            .overwrite(address, type_name, &self.identity.component_id, body)
            .await
            .inspect_err(|e| debug!(%address, error = %e, "overwrite rejected"))?;

        let version = self.versions.bump_on_overwrite(id);
        if version.is_none() {
            debug!(%address, "overwrote an entry this writer never added");
        }

        self.emit(WriteOp::Overwrite, address, Some(type_name), version);
        Ok(())
    }

    /// Delete an entry from the writer's own partition
    pub async fn delete(&self, id: &str) -> Result<()> {
        let address = self.own_address(id)?;
        self.delete_at(&address).await.map_err(own_partition)
    }

    /// Delete an entry from `partition`
    pub async fn delete_in(&self, id: &str, partition: &str) -> Result<()> {
        let address = WorkingMemoryAddress::new(partition, id)?;
        self.delete_at(&address).await
    }

    /// Delete the entry at `address`
    ///
    /// The local version record survives, so re-adding the id later continues
    /// its sequence.
    pub async fn delete_at(&self, address: &WorkingMemoryAddress) -> Result<()> {
        let _entry = self.entry_locks.acquire(address.id()).await;
        let (store, _) = self.selector.current();

        if !store.exists(address).await? {
            debug!(%address, "delete target missing");
            return Err(WmError::not_found(address));
        }

        if !self.locks.holds_delete_lock(address).await?
            && !self.locks.is_deletable(address).await?
        {
            debug!(%address, "delete not permitted");
            return Err(WmError::permission(address, "delete not allowed on locked entry"));
        }

        store
            .delete(address, &self.identity.component_id)
            .await
            .inspect_err(|e| debug!(%address, error = %e, "delete rejected"))?;

        self.emit(WriteOp::Delete, address, None, None);
        Ok(())
    }

    fn emit(
        &self,
        op: WriteOp,
        address: &WorkingMemoryAddress,
        payload_type: Option<&str>,
        version: Option<u64>,
    ) {
        if !self.audit.enabled(op) {
            return;
        }
        self.audit.record(WriteRecord {
            op,
            timestamp_ms: self.clock.now_ms(),
            entry_id: address.id().to_string(),
            partition: address.partition().to_string(),
            payload_type: payload_type.map(str::to_string),
            version,
        });
    }
}

/// The writer's own partition is never unknown to its store
fn own_partition(err: WmError) -> WmError {
    match err {
        WmError::UnknownPartition { partition } => {
            WmError::internal(format!("own partition {partition} unknown to store"))
        }
        other => other,
    }
}

impl fmt::Debug for WriteCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteCoordinator")
            .field("identity", &self.identity)
            .field("partition", &self.partition)
            .field("selector", &self.selector)
            .field("versioned_entries", &self.versions.len())
            .finish_non_exhaustive()
    }
}
