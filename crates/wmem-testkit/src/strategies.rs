//! Proptest strategies for working memory addresses

use proptest::prelude::*;
use wmem_core::WorkingMemoryAddress;

/// Non-empty entry ids
pub fn arb_entry_id() -> impl Strategy<Value = String> {
    "[0-9A-Za-z:]{1,12}"
}

/// Non-empty partition names
pub fn arb_partition() -> impl Strategy<Value = String> {
    "[a-z]{1,6}(\\.sa)?"
}

/// Valid addresses
pub fn arb_address() -> impl Strategy<Value = WorkingMemoryAddress> {
    (arb_partition(), arb_entry_id()).prop_filter_map("empty address part", |(partition, id)| {
        WorkingMemoryAddress::new(partition, id).ok()
    })
}
