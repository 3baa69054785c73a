//! Record store seam
//!
//! Created entities are mirrored into an external tabular store (one row per
//! course/chapter/lesson, child rows linked to their parent). The store is a
//! trait so the core stays testable without network access; paths written to
//! it keep their symbolic `$VAR` form so rows stay portable across machines.

use crate::error::Result;
use serde_json::Value;
use std::sync::Mutex;

/// Opaque handle to an inserted row, used to link child rows to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHandle(pub String);

/// Field map for one row. String-keyed JSON values keep the seam agnostic
/// of the backing store's column types.
pub type RecordFields = serde_json::Map<String, Value>;

/// External store of created entities.
pub trait RecordStore {
    /// Whether a row with this name already exists at the course level.
    fn exists(&self, name: &str) -> Result<bool>;

    /// Insert a row, optionally linked to a parent row.
    fn insert(&self, parent: Option<&RecordHandle>, fields: &RecordFields) -> Result<RecordHandle>;
}

#[derive(Debug, Clone)]
struct StoredRecord {
    parent: Option<String>,
    fields: RecordFields,
}

/// In-memory store. The default when no remote backend is configured, and
/// the test double.
#[derive(Default)]
pub struct MemoryRecordStore {
    rows: Mutex<Vec<StoredRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.lock().expect("store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of a row's fields (and its parent id) by insertion index.
    pub fn row(&self, index: usize) -> Option<(Option<String>, RecordFields)> {
        self.rows
            .lock()
            .expect("store lock")
            .get(index)
            .map(|r| (r.parent.clone(), r.fields.clone()))
    }
}

impl RecordStore for MemoryRecordStore {
    fn exists(&self, name: &str) -> Result<bool> {
        let rows = self.rows.lock().expect("store lock");
        Ok(rows.iter().any(|r| {
            r.parent.is_none() && r.fields.get("name").and_then(Value::as_str) == Some(name)
        }))
    }

    fn insert(&self, parent: Option<&RecordHandle>, fields: &RecordFields) -> Result<RecordHandle> {
        let mut rows = self.rows.lock().expect("store lock");
        let id = format!("mem-{}", rows.len());
        rows.push(StoredRecord {
            parent: parent.map(|p| p.0.clone()),
            fields: fields.clone(),
        });
        Ok(RecordHandle(id))
    }
}
