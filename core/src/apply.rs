//! Reconciliation applier: writes a change batch back to the live table
//!
//! Label fields resolve against their lookup tables before anything is
//! written; a row whose edited label resolves to nothing is skipped and
//! reported, never guessed at. The surviving updates run in one transaction,
//! so the live table either absorbs the whole batch or none of it.

use crate::diff::ChangeBatch;
use crate::error::{OpsdeskError, Result};
use crate::lookup::Lookup;
use crate::snapshot::{EditTarget, TrackedField};
use crate::store::{to_duckdb, Store};
use crate::value::Value;
use duckdb::params_from_iter;
use std::collections::HashMap;

/// A row excluded from the batch because an edited label had no id
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub id: i64,
    pub field: String,
    pub label: String,
}

/// Outcome of one apply run
#[derive(Debug)]
pub struct ApplyResult {
    /// Rows actually written
    pub updated_count: usize,
    /// Rows dropped before the write because of unresolvable labels
    pub skipped: Vec<SkippedRow>,
}

/// Write a change batch to the target's live table.
pub fn apply(store: &mut Store, target: &EditTarget, batch: &ChangeBatch) -> Result<ApplyResult> {
    if batch.is_empty() {
        return Ok(ApplyResult {
            updated_count: 0,
            skipped: Vec::new(),
        });
    }

    // Load the lookup for every label field once, against current map state
    let mut lookups: HashMap<String, (String, Lookup)> = HashMap::new();
    for field in &target.tracked {
        if let TrackedField::Label {
            label_column,
            id_column,
            lookup_table,
            lookup_label_column,
        } = field
        {
            let lookup = Lookup::load(store, lookup_table, lookup_label_column)?;
            lookups.insert(label_column.clone(), (id_column.clone(), lookup));
        }
    }

    // Resolve every row fully before touching the table. A row with any
    // unresolvable label is dropped whole, even if its other edits are fine.
    let mut resolved: Vec<(i64, Vec<(String, Value)>)> = Vec::new();
    let mut skipped = Vec::new();

    'rows: for update in &batch.updates {
        let mut assignments = Vec::with_capacity(update.fields.len());
        for (field, value) in &update.fields {
            match lookups.get(field) {
                Some((id_column, lookup)) => {
                    let label = value.as_str().unwrap_or_default();
                    match lookup.id_for(label) {
                        Some(id) => assignments.push((id_column.clone(), Value::Int(id))),
                        None => {
                            log::warn!(
                                "row {}: '{}' not found in {}, skipping row",
                                update.id,
                                label,
                                lookup.table()
                            );
                            skipped.push(SkippedRow {
                                id: update.id,
                                field: field.clone(),
                                label: label.to_string(),
                            });
                            continue 'rows;
                        }
                    }
                }
                None => assignments.push((field.clone(), value.clone())),
            }
        }
        resolved.push((update.id, assignments));
    }

    let table = &target.table;
    let id_column = &target.id_column;
    let updated_count = store.transaction(|tx| {
        for (id, assignments) in &resolved {
            let set_clause: Vec<String> =
                assignments.iter().map(|(col, _)| format!("{col} = ?")).collect();
            let sql = format!(
                "UPDATE {table} SET {}, last_updated = current_timestamp WHERE {id_column} = ?",
                set_clause.join(", ")
            );
            let mut params: Vec<Value> =
                assignments.iter().map(|(_, value)| value.clone()).collect();
            params.push(Value::Int(*id));

            tx.execute(&sql, params_from_iter(params.iter().map(to_duckdb)))
                .map_err(|e| {
                    OpsdeskError::apply(format!("row {id} in {table} could not be updated"), e)
                })?;
        }
        Ok(resolved.len())
    })?;

    log::info!(
        "applied {updated_count} row update(s) to {table}, {} skipped",
        skipped.len()
    );

    Ok(ApplyResult {
        updated_count,
        skipped,
    })
}
