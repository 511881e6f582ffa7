//! Ingestion pipeline: uploaded tables into typed destination tables
//!
//! The pipeline validates required columns up front (nothing is touched on a
//! miss), normalizes every row through the mode's field specs, then performs
//! the load — idempotent table creation, optional clear, bulk insert — inside
//! a single transaction so a failed load leaves no partial rows behind.

use crate::error::{OpsdeskError, Result};
use crate::schema::{ColumnMap, IngestMode};
use crate::store::{to_duckdb, Store};
use crate::value::{normalize, FieldKind, RawValue, Value};
use duckdb::params_from_iter;
use indexmap::IndexMap;
use std::path::Path;

/// One row of an uploaded table, column name -> raw cell in upload order
pub type RawRecord = IndexMap<String, RawValue>;

/// A cell that failed to parse and was degraded to null
#[derive(Debug, Clone, PartialEq)]
pub struct CellWarning {
    /// Zero-based row index in the upload
    pub row: usize,
    pub column: String,
    pub raw: String,
}

/// A row dropped because a required field normalized to null
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub row: usize,
    pub field: String,
}

/// Outcome of one ingestion run
#[derive(Debug)]
pub struct IngestResult {
    pub rows_inserted: usize,
    /// Non-required cells that degraded to null instead of aborting their row
    pub warnings: Vec<CellWarning>,
    /// Rows excluded because a required field was unparseable
    pub rejected: Vec<RejectedRow>,
}

/// Read an uploaded CSV into raw records through the store's CSV reader, so
/// column discovery is dynamic and every cell arrives as text or null.
pub fn read_upload(store: &Store, path: &Path) -> Result<(Vec<String>, Vec<RawRecord>)> {
    if !path.is_file() {
        return Err(OpsdeskError::invalid_input(format!(
            "upload not found: {}",
            path.display()
        )));
    }
    let escaped = path.to_string_lossy().replace('\'', "''");
    store.execute_batch(&format!(
        "CREATE OR REPLACE TEMPORARY VIEW upload_view AS \
         SELECT * FROM read_csv('{escaped}', header=true, all_varchar=true)"
    ))?;

    let described = store.query("DESCRIBE upload_view", &[])?;
    let mut columns = Vec::new();
    for row in &described {
        if let Some(Value::Text(name)) = row.get("column_name") {
            columns.push(name.clone());
        }
    }

    let rows = store.query("SELECT * FROM upload_view", &[])?;
    let records = rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(column, value)| {
                    let raw = match value {
                        Value::Null => RawValue::Null,
                        Value::Text(s) => RawValue::Text(s),
                        Value::Int(i) => RawValue::Number(i as f64),
                        Value::Float(f) => RawValue::Number(f),
                    };
                    (column, raw)
                })
                .collect()
        })
        .collect();

    log::info!("read upload {} ({} columns)", path.display(), columns.len());
    Ok((columns, records))
}

/// Load raw records into the mode's destination table.
///
/// `replace` clears the destination first; repeated ingestion is idempotent
/// only under `replace=true`. With `replace=false` the same input loads
/// again as duplicate rows — callers opt into that deliberately.
pub fn ingest(
    store: &mut Store,
    mode: &IngestMode,
    columns: &[String],
    records: &[RawRecord],
    replace: bool,
) -> Result<IngestResult> {
    // Step 1: required columns, fail fast before any normalization or DDL
    let map = ColumnMap::resolve(columns, &mode.required_columns())?;

    // Step 2: normalize row by row; a bad cell degrades to null, a null
    // required field drops only its row
    let mut normalized: Vec<Vec<Value>> = Vec::with_capacity(records.len());
    let mut warnings = Vec::new();
    let mut rejected = Vec::new();

    'rows: for (row_idx, record) in records.iter().enumerate() {
        let mut out = Vec::with_capacity(mode.fields.len());
        for field in &mode.fields {
            let actual = map.actual(&field.source_column);
            let raw = record.get(actual).unwrap_or(&RawValue::Null);
            let value = normalize(raw, field.kind);

            if value.is_null() {
                if let Some(text) = raw.as_text() {
                    // Only numeric kinds warn: a placeholder text token is an
                    // expected null, a garbled number is data loss
                    let numeric = matches!(field.kind, FieldKind::Integer | FieldKind::Currency);
                    if numeric && crate::value::clean_text(&text).is_some() {
                        warnings.push(CellWarning {
                            row: row_idx,
                            column: field.source_column.clone(),
                            raw: text,
                        });
                    }
                }
                if field.required {
                    rejected.push(RejectedRow {
                        row: row_idx,
                        field: field.source_column.clone(),
                    });
                    continue 'rows;
                }
            }
            out.push(value);
        }
        normalized.push(out);
    }

    // Steps 3-5: schema/table creation, optional clear, bulk insert — one
    // transaction, so a reader never sees a half-loaded table
    let table = mode.qualified_table();
    let ddl = mode.create_table_sql();
    let column_list: Vec<&str> = mode.fields.iter().map(|f| f.column.as_str()).collect();
    let placeholders = vec!["?"; column_list.len()].join(", ");
    let insert_sql = format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        column_list.join(", ")
    );

    let rows_inserted = store.transaction(|tx| {
        tx.execute_batch(&ddl)?;
        if replace {
            tx.execute(&format!("DELETE FROM {table}"), [])?;
        }
        let mut stmt = tx.prepare(&insert_sql)?;
        for row in &normalized {
            stmt.execute(params_from_iter(row.iter().map(to_duckdb)))?;
        }
        Ok(normalized.len())
    })?;

    log::info!(
        "ingested {rows_inserted} row(s) into {table} (replace={replace}, {} warning(s), {} rejected)",
        warnings.len(),
        rejected.len()
    );

    Ok(IngestResult {
        rows_inserted,
        warnings,
        rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), RawValue::from(*v)))
            .collect()
    }

    #[test]
    fn test_missing_required_column_blocks_load() {
        let mut store = Store::open_in_memory().unwrap();
        let mode = IngestMode::find("all-industry").unwrap();

        let columns = vec!["Username".to_string(), "GMV".to_string()];
        let records = vec![record(&[("Username", "a"), ("GMV", "Rp1.000")])];

        let err = ingest(&mut store, &mode, &columns, &records, true).unwrap_err();
        assert!(matches!(err, OpsdeskError::MissingColumns { .. }));

        // Nothing was created, let alone loaded
        let tables = store.query(
            "SELECT table_name FROM information_schema.tables WHERE table_schema = 'leaderboard'",
            &[],
        );
        assert!(tables.unwrap().is_empty());
    }

    #[test]
    fn test_required_field_rejects_only_its_row() {
        let mut store = Store::open_in_memory().unwrap();
        let mode = IngestMode::find("all-level").unwrap();
        let columns: Vec<String> = mode
            .required_columns()
            .iter()
            .map(|c| c.to_string())
            .collect();

        let good = record(&[
            ("No", "1"),
            ("Creator Name", "Alpha"),
            ("Username", "alpha"),
            ("Post", "20"),
            ("Redemption GMV", "Rp2.500.000"),
            ("Status", "Dapat Hadiah"),
            ("Hadiah", "Rp150.000"),
            ("Level", "0"),
        ]);
        let bad = record(&[
            ("No", "2"),
            ("Creator Name", "Beta"),
            ("Username", ""), // required, normalizes to null
            ("Post", "5"),
            ("Redemption GMV", "Rp100.000"),
            ("Status", "Belum"),
            ("Hadiah", "-"),
            ("Level", "0"),
        ]);

        let result = ingest(&mut store, &mode, &columns, &[good, bad], true).unwrap();
        assert_eq!(result.rows_inserted, 1);
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].field, "Username");
    }

    #[test]
    fn test_malformed_cell_degrades_to_null_with_warning() {
        let mut store = Store::open_in_memory().unwrap();
        let mode = IngestMode::find("all-level").unwrap();
        let columns: Vec<String> = mode
            .required_columns()
            .iter()
            .map(|c| c.to_string())
            .collect();

        let row = record(&[
            ("No", "1"),
            ("Creator Name", "Alpha"),
            ("Username", "alpha"),
            ("Post", "abc"), // garbled integer
            ("Redemption GMV", "Rp1.000"),
            ("Status", "OK"),
            ("Hadiah", ""),
            ("Level", "1"),
        ]);

        let result = ingest(&mut store, &mode, &columns, &[row], true).unwrap();
        assert_eq!(result.rows_inserted, 1);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].column, "Post");

        let stored = store
            .query_one(
                "SELECT post_count, redemption_gmv_idr FROM leaderboard.creator_leaderboard_all_level",
                &[],
            )
            .unwrap();
        assert_eq!(stored.get("post_count"), Some(&Value::Null));
        assert_eq!(stored.get("redemption_gmv_idr"), Some(&Value::Int(1000)));
    }
}
