//! Label -> id lookups for categorical fields
//!
//! Loaded fresh for each diff/apply cycle; no caching guarantees across
//! operations. The console treats these as read-only reference data.

use crate::error::Result;
use crate::store::{row_id, Store};
use crate::value::Value;
use indexmap::IndexMap;

/// An immutable label -> id mapping loaded from a map table
#[derive(Debug, Clone)]
pub struct Lookup {
    table: String,
    entries: IndexMap<String, i64>,
}

impl Lookup {
    /// Load every (id, label) pair from `table`, ordered by id
    pub fn load(store: &Store, table: &str, label_column: &str) -> Result<Self> {
        let rows = store.query(
            &format!("SELECT id, {label_column} FROM {table} ORDER BY id"),
            &[],
        )?;
        let mut entries = IndexMap::new();
        for row in rows {
            let id = row_id(&row, "id")?;
            if let Some(Value::Text(label)) = row.get(label_column) {
                entries.insert(label.trim().to_string(), id);
            }
        }
        Ok(Self {
            table: table.to_string(),
            entries,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Resolve a label to its id; trimmed exact match
    pub fn id_for(&self, label: &str) -> Option<i64> {
        self.entries.get(label.trim()).copied()
    }

    /// Labels in id order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Labels excluding a reserved id (e.g. the intake status never shown in
    /// the editor dropdown)
    pub fn labels_excluding(&self, reserved_id: i64) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, id)| **id != reserved_id)
            .map(|(label, _)| label.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
