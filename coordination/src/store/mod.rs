//! Entity store interface
//!
//! The coordination core never touches storage formats directly. Operations
//! read context through [`EntityStore`], hand it to a pure guard, and only then
//! write. Stores must serialize individual row writes and enforce each entity's
//! [`Entity::unique_key`] atomically, so two racing creators of a 1:1 child
//! cannot both succeed even when both passed their guard.
//!
//! [`MemoryStore`] is the reference adapter: typed rows kept as JSON values per
//! table, with a JSON snapshot for persistence between runs. [`FileStore`]
//! makes that snapshot the shared store for several processes.

pub mod file;
pub mod memory;
pub mod schema;

use serde::{de::DeserializeOwned, Serialize};

use crate::ids::EntityKind;

pub use file::FileStore;
pub use memory::{MemoryStore, Snapshot};

/// Error type for store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("{kind} {id} already exists")]
    Duplicate { kind: EntityKind, id: String },

    #[error("{kind} {id} not found")]
    Missing { kind: EntityKind, id: String },

    /// A uniqueness constraint rejected the write.
    #[error("{kind} {id} conflicts with {existing} on '{key}'")]
    Conflict {
        kind: EntityKind,
        id: String,
        existing: String,
        key: String,
    },

    /// The backing store could not be reached; callers may retry.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Lock poisoned")]
    LockPoisoned,

    #[error("Snapshot I/O error: {0}")]
    Io(String),
}

impl StoreError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A record the store can hold.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Table this record lives in.
    const KIND: EntityKind;

    /// Stable identifier (`PREFIX-NNN`).
    fn id(&self) -> &str;

    /// Key that must be unique among the live rows of this table.
    ///
    /// Used for 1:1 relations and "at most one active" invariants. `None`
    /// means the row takes part in no uniqueness constraint.
    fn unique_key(&self) -> Option<String> {
        None
    }
}

/// Point-in-time reads and single-row atomic writes over all entity tables.
pub trait EntityStore: Send + Sync {
    /// Allocate the next ID for a kind.
    fn next_id(&self, kind: EntityKind) -> StoreResult<String>;

    /// Fetch a row by ID.
    fn get<E: Entity>(&self, id: &str) -> StoreResult<Option<E>>;

    /// All rows of a table matching `filter`, ordered by ID.
    fn list<E: Entity>(&self, filter: impl Fn(&E) -> bool) -> StoreResult<Vec<E>>;

    /// Insert a new row. Fails on duplicate ID or unique-key conflict.
    fn insert<E: Entity>(&self, entity: &E) -> StoreResult<()>;

    /// Replace an existing row. Fails if missing or on unique-key conflict.
    fn update<E: Entity>(&self, entity: &E) -> StoreResult<()>;

    /// Remove a row. Removing a missing row is an error.
    fn delete<E: Entity>(&self, id: &str) -> StoreResult<()>;

    /// Existence predicate.
    fn exists<E: Entity>(&self, id: &str) -> StoreResult<bool> {
        Ok(self.get::<E>(id)?.is_some())
    }

    /// Number of rows matching `filter`.
    fn count<E: Entity>(&self, filter: impl Fn(&E) -> bool) -> StoreResult<usize> {
        Ok(self.list(filter)?.len())
    }

    /// First row matching `filter`, by ID order.
    fn find<E: Entity>(&self, filter: impl Fn(&E) -> bool) -> StoreResult<Option<E>> {
        Ok(self.list(filter)?.into_iter().next())
    }
}
