//! Shared fixtures for writer integration tests

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wmem_core::{WorkingMemoryAddress, WriterConfig};
use wmem_testkit::{FixedClock, MemoryWorkingMemory, RecordingAuditSink, ScriptedAuthority};
use wmem_writer::WriteCoordinator;

pub const PARTITION: &str = "sa1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub label: String,
    pub confidence: u32,
}

pub fn observation(label: &str, confidence: u32) -> Arc<Observation> {
    Arc::new(Observation {
        label: label.to_string(),
        confidence,
    })
}

pub fn addr(id: &str) -> WorkingMemoryAddress {
    WorkingMemoryAddress::new(PARTITION, id).unwrap()
}

/// A writer wired to test doubles it exposes for inspection
pub struct Harness {
    pub store: MemoryWorkingMemory,
    pub authority: ScriptedAuthority,
    pub audit: RecordingAuditSink,
    pub writer: WriteCoordinator,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemoryWorkingMemory::remote())
    }

    pub fn with_store(store: MemoryWorkingMemory) -> Self {
        wmem_testkit::init_tracing();
        let authority = ScriptedAuthority::new();
        let audit = RecordingAuditSink::new();
        let writer = WriteCoordinator::new(
            WriterConfig::new("comedian", 7, PARTITION),
            Arc::new(store.clone()),
            Arc::new(authority.clone()),
            Arc::new(authority.clone()),
        )
        .unwrap()
        .with_audit_sink(Arc::new(audit.clone()))
        .with_clock(Arc::new(FixedClock::default()));
        Self {
            store,
            authority,
            audit,
            writer,
        }
    }

    pub fn version(&self, id: &str) -> Option<u64> {
        self.writer.versions().current_version(id, PARTITION).ok()
    }
}
