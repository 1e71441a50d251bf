//! In-memory entity store with JSON snapshot persistence
//!
//! Rows are kept as JSON values per table so that any [`Entity`] can be stored
//! without a per-type code path. A single `RwLock` serializes writes; the
//! unique-key check and the row write happen under the same write guard, which
//! is what makes the store a backstop for racing guard+write sequences.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::schema;
use super::{Entity, EntityStore, StoreError, StoreResult};
use crate::ids::{parse_id, EntityKind};

/// Current snapshot format version.
const SNAPSHOT_VERSION: u32 = 1;

/// One table: rows by ID plus the unique-key index.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Table {
    rows: BTreeMap<String, serde_json::Value>,
    /// unique key -> ID of the row holding it
    #[serde(default)]
    unique: HashMap<String, String>,
}

/// Complete store contents, as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    version: u32,
    /// Last allocated sequence per table
    sequences: BTreeMap<String, u64>,
    tables: BTreeMap<String, Table>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            sequences: BTreeMap::new(),
            tables: BTreeMap::new(),
        }
    }
}

impl Snapshot {
    /// Number of rows in a kind's table.
    pub fn row_count(&self, kind: EntityKind) -> usize {
        self.tables
            .get(schema::table(kind))
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }
}

/// Reference [`EntityStore`] adapter.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Snapshot>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from a snapshot
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    /// Load a snapshot file, or start empty if it does not exist yet
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No snapshot found, starting empty");
            return Ok(Self::new());
        }
        let bytes = std::fs::read(path).map_err(|e| StoreError::Io(e.to_string()))?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Deserialization(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::Deserialization(format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        Ok(Self::from_snapshot(snapshot))
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> StoreResult<Snapshot> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.clone())
    }

    /// Write the current contents to `path` (write-then-rename)
    pub fn save(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        let bytes = {
            let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
            serde_json::to_vec_pretty(&*state)
                .map_err(|e| StoreError::Serialization(e.to_string()))?
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes).map_err(|e| StoreError::Io(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| StoreError::Io(e.to_string()))?;
        debug!(path = %path.display(), "Snapshot saved");
        Ok(())
    }

    /// Claim `key` for `id`, failing if another row holds it.
    fn claim_unique<E: Entity>(table: &mut Table, entity: &E) -> StoreResult<()> {
        let id = entity.id();
        if let Some(key) = entity.unique_key() {
            if let Some(existing) = table.unique.get(&key) {
                if existing != id {
                    return Err(StoreError::Conflict {
                        kind: E::KIND,
                        id: id.to_string(),
                        existing: existing.clone(),
                        key,
                    });
                }
            }
        }
        table.unique.retain(|_, owner| owner != id);
        if let Some(key) = entity.unique_key() {
            table.unique.insert(key, id.to_string());
        }
        Ok(())
    }
}

fn to_value<E: Entity>(entity: &E) -> StoreResult<serde_json::Value> {
    serde_json::to_value(entity).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn from_value<E: Entity>(value: &serde_json::Value) -> StoreResult<E> {
    E::deserialize(value).map_err(|e| StoreError::Deserialization(e.to_string()))
}

impl EntityStore for MemoryStore {
    fn next_id(&self, kind: EntityKind) -> StoreResult<String> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let sequence = state
            .sequences
            .entry(schema::table(kind).to_string())
            .or_insert(0);
        *sequence += 1;
        Ok(kind.format_id(*sequence))
    }

    fn get<E: Entity>(&self, id: &str) -> StoreResult<Option<E>> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        match state
            .tables
            .get(schema::table(E::KIND))
            .and_then(|t| t.rows.get(id))
        {
            Some(value) => Ok(Some(from_value(value)?)),
            None => Ok(None),
        }
    }

    fn list<E: Entity>(&self, filter: impl Fn(&E) -> bool) -> StoreResult<Vec<E>> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        let Some(table) = state.tables.get(schema::table(E::KIND)) else {
            return Ok(Vec::new());
        };

        let mut rows = Vec::new();
        for value in table.rows.values() {
            let row: E = from_value(value)?;
            if filter(&row) {
                rows.push(row);
            }
        }
        rows.sort_by(|a, b| schema::id_order(a.id()).cmp(&schema::id_order(b.id())));
        Ok(rows)
    }

    fn insert<E: Entity>(&self, entity: &E) -> StoreResult<()> {
        let value = to_value(entity)?;
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let table_name = schema::table(E::KIND);
        let table = state.tables.entry(table_name.to_string()).or_default();

        if table.rows.contains_key(entity.id()) {
            return Err(StoreError::Duplicate {
                kind: E::KIND,
                id: entity.id().to_string(),
            });
        }
        Self::claim_unique(table, entity)?;
        table.rows.insert(entity.id().to_string(), value);

        // Keep allocation ahead of explicitly chosen IDs
        if let Some((kind, sequence)) = parse_id(entity.id()) {
            if kind == E::KIND {
                let current = state.sequences.entry(table_name.to_string()).or_insert(0);
                *current = (*current).max(sequence);
            }
        }
        Ok(())
    }

    fn update<E: Entity>(&self, entity: &E) -> StoreResult<()> {
        let value = to_value(entity)?;
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let table = state
            .tables
            .get_mut(schema::table(E::KIND))
            .filter(|t| t.rows.contains_key(entity.id()))
            .ok_or_else(|| StoreError::Missing {
                kind: E::KIND,
                id: entity.id().to_string(),
            })?;

        Self::claim_unique(table, entity)?;
        table.rows.insert(entity.id().to_string(), value);
        Ok(())
    }

    fn delete<E: Entity>(&self, id: &str) -> StoreResult<()> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let table = state
            .tables
            .get_mut(schema::table(E::KIND))
            .ok_or_else(|| StoreError::Missing {
                kind: E::KIND,
                id: id.to_string(),
            })?;
        if table.rows.remove(id).is_none() {
            return Err(StoreError::Missing {
                kind: E::KIND,
                id: id.to_string(),
            });
        }
        table.unique.retain(|_, owner| owner != id);
        Ok(())
    }
}
