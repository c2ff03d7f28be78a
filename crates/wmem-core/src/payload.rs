//! Payload envelope handed to the store

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Entry body as it travels to the store
///
/// `Shared` aliases the writer's own allocation: a store in the same process
/// sees later interior mutation of the value. `Encoded` is a deep copy.
#[derive(Clone)]
pub enum EntryPayload {
    /// The writer's value, shared by reference
    Shared(Arc<dyn Any + Send + Sync>),
    /// A serialized copy of the writer's value
    Encoded(Vec<u8>),
}

impl EntryPayload {
    /// Whether this payload is a serialized copy
    pub fn is_encoded(&self) -> bool {
        matches!(self, Self::Encoded(_))
    }

    /// Downcast a shared payload to its concrete type
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Self::Shared(value) => Arc::clone(value).downcast::<T>().ok(),
            Self::Encoded(_) => None,
        }
    }

    /// The encoded bytes, if this is a serialized copy
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Shared(_) => None,
            Self::Encoded(bytes) => Some(bytes),
        }
    }
}

impl fmt::Debug for EntryPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared(_) => f.write_str("EntryPayload::Shared(..)"),
            Self::Encoded(bytes) => write!(f, "EntryPayload::Encoded({} bytes)", bytes.len()),
        }
    }
}
