//! Addresses and writer identity
//!
//! A [`WorkingMemoryAddress`] names one slot in the shared memory. Both halves
//! are required to be non-empty, and the constructor is the only way to get
//! one, so holding an address means holding a valid address.

use crate::{Result, WmError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A (partition, entry id) pair naming one working memory slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawAddress")]
pub struct WorkingMemoryAddress {
    partition: String,
    id: String,
}

#[derive(Deserialize)]
struct RawAddress {
    partition: String,
    id: String,
}

impl TryFrom<RawAddress> for WorkingMemoryAddress {
    type Error = WmError;

    fn try_from(raw: RawAddress) -> Result<Self> {
        Self::new(raw.partition, raw.id)
    }
}

impl WorkingMemoryAddress {
    /// Create an address, rejecting empty partitions and ids
    pub fn new(partition: impl Into<String>, id: impl Into<String>) -> Result<Self> {
        let partition = partition.into();
        let id = id.into();
        if id.is_empty() {
            return Err(WmError::invalid("entry id must not be empty"));
        }
        if partition.is_empty() {
            return Err(WmError::invalid("partition must not be empty"));
        }
        Ok(Self { partition, id })
    }

    /// The partition (subarchitecture) this address lives in
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// The entry id within the partition
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for WorkingMemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.partition, self.id)
    }
}

/// Identity a writer attaches to every mutation it sends to the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WriterIdentity {
    /// Full component identity, unique across the deployment
    pub component_id: String,
    /// Compact number assigned to the component at launch, also unique
    pub component_number: u32,
}

impl WriterIdentity {
    /// Create a writer identity
    pub fn new(component_id: impl Into<String>, component_number: u32) -> Self {
        Self {
            component_id: component_id.into(),
            component_number,
        }
    }
}

impl fmt::Display for WriterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.component_id, self.component_number)
    }
}
