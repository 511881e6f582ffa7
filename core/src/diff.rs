//! Diff engine: minimal change-sets between baseline and working copy
//!
//! Comparison is per tracked field under the normalized-equality rule (both
//! sides trimmed, null and blank text equal), so an operator clearing a
//! field that was already null produces nothing. Rows with no net change are
//! absent from the batch entirely. Output order follows the working copy,
//! which is row-id order from export — deterministic, not edit order.

use crate::snapshot::Snapshot;
use crate::value::{normalized_eq, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One field's before/after for one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub id: i64,
    pub field: String,
    pub old: Value,
    pub new: Value,
}

/// Per-row update payload: only the fields that actually changed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowUpdate {
    pub id: i64,
    pub fields: IndexMap<String, Value>,
}

/// The minimal change-set for one snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeBatch {
    pub changes: Vec<FieldChange>,
    pub updates: Vec<RowUpdate>,
}

impl ChangeBatch {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Number of rows with at least one change
    pub fn row_count(&self) -> usize {
        self.updates.len()
    }
}

/// Compare working copy against baseline and emit only real differences.
pub fn diff(snapshot: &Snapshot) -> ChangeBatch {
    let mut batch = ChangeBatch::default();

    for (id, work) in &snapshot.working {
        let Some(base) = snapshot.baseline.get(id) else {
            // Working rows only ever come from export, so a missing baseline
            // row means the handle was edited by hand; ignore it.
            log::warn!("working row {id} has no baseline counterpart, skipping");
            continue;
        };

        let mut fields = IndexMap::new();
        for field in &snapshot.tracked {
            let old = base.get(field).unwrap_or(&Value::Null);
            let new = work.get(field).unwrap_or(&Value::Null);
            if normalized_eq(old, new) {
                continue;
            }
            let stored = storage_form(new);
            batch.changes.push(FieldChange {
                id: *id,
                field: field.clone(),
                old: old.clone(),
                new: stored.clone(),
            });
            fields.insert(field.clone(), stored);
        }

        if !fields.is_empty() {
            batch.updates.push(RowUpdate { id: *id, fields });
        }
    }

    batch
}

/// Trim edited text and convert blank back to null before it is written.
fn storage_form(value: &Value) -> Value {
    match value {
        Value::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::Text(trimmed.to_string())
            }
        }
        other => other.clone(),
    }
}
