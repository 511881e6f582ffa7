//! Ingestion modes and input-column resolution
//!
//! An ingestion mode is pure configuration: which upload columns are
//! required, how each one normalizes, and which destination table the
//! normalized rows land in. Adding a new leaderboard upload shape means
//! adding a mode, not a code path.

use crate::error::{OpsdeskError, Result};
use crate::value::FieldKind;
use std::collections::HashMap;

/// One output field of an ingestion mode
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Column name expected in the upload, matched case-insensitively
    pub source_column: String,
    /// Destination column name
    pub column: String,
    pub kind: FieldKind,
    /// A required field that normalizes to null rejects its row
    pub required: bool,
}

impl FieldSpec {
    fn new(source: &str, column: &str, kind: FieldKind) -> Self {
        Self {
            source_column: source.to_string(),
            column: column.to_string(),
            kind,
            required: false,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// SQL type for the auto-created destination column
    pub fn sql_type(&self) -> &'static str {
        match self.kind {
            FieldKind::Integer => "INTEGER",
            FieldKind::Currency => "BIGINT",
            FieldKind::Text | FieldKind::Categorical => "TEXT",
        }
    }
}

/// Configuration for one upload shape: required columns, normalization
/// mapping and destination table.
#[derive(Debug, Clone)]
pub struct IngestMode {
    pub name: String,
    pub schema: String,
    pub table: String,
    pub fields: Vec<FieldSpec>,
}

impl IngestMode {
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    /// Upload columns that must be present for the load to proceed at all
    pub fn required_columns(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.source_column.as_str()).collect()
    }

    /// Idempotent DDL for the destination: schema, table, audit columns
    pub fn create_table_sql(&self) -> String {
        let mut columns: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("    {} {}", f.column, f.sql_type()))
            .collect();
        columns.push("    imported_at TIMESTAMP DEFAULT current_timestamp".to_string());
        columns.push("    last_updated TIMESTAMP DEFAULT current_timestamp".to_string());
        format!(
            "CREATE SCHEMA IF NOT EXISTS {};\nCREATE TABLE IF NOT EXISTS {} (\n{}\n);",
            self.schema,
            self.qualified_table(),
            columns.join(",\n")
        )
    }

    /// All built-in ingestion modes
    pub fn builtin() -> Vec<IngestMode> {
        vec![
            IngestMode {
                name: "all-level".to_string(),
                schema: "leaderboard".to_string(),
                table: "creator_leaderboard_all_level".to_string(),
                fields: vec![
                    FieldSpec::new("No", "rank_no", FieldKind::Integer),
                    FieldSpec::new("Creator Name", "creator_name", FieldKind::Text),
                    FieldSpec::new("Username", "username", FieldKind::Text).required(),
                    FieldSpec::new("Post", "post_count", FieldKind::Integer),
                    FieldSpec::new("Redemption GMV", "redemption_gmv_idr", FieldKind::Currency),
                    FieldSpec::new("Status", "status", FieldKind::Categorical),
                    FieldSpec::new("Hadiah", "hadiah_idr", FieldKind::Currency),
                    FieldSpec::new("Level", "level", FieldKind::Integer),
                ],
            },
            IngestMode {
                name: "all-industry".to_string(),
                schema: "leaderboard".to_string(),
                table: "creator_leaderboard_all_industry_bonus".to_string(),
                fields: vec![
                    FieldSpec::new("Username", "username", FieldKind::Text).required(),
                    FieldSpec::new("GMV", "gmv_idr", FieldKind::Currency),
                    FieldSpec::new("Order Accommodation", "order_accommodation", FieldKind::Integer),
                    FieldSpec::new("Order Dining", "order_dining", FieldKind::Integer),
                    FieldSpec::new("Order Things To Do", "order_things_to_do", FieldKind::Integer),
                    FieldSpec::new("Syarat Penjualan", "syarat_penjualan_idr", FieldKind::Currency),
                    FieldSpec::new("Kurang Penjualan", "kurang_penjualan_idr", FieldKind::Currency),
                    FieldSpec::new("Status", "status", FieldKind::Categorical),
                    FieldSpec::new("Bonus", "bonus_idr", FieldKind::Currency),
                ],
            },
        ]
    }

    /// Look up a built-in mode by name
    pub fn find(name: &str) -> Result<IngestMode> {
        Self::builtin()
            .into_iter()
            .find(|m| m.name == name)
            .ok_or_else(|| OpsdeskError::UnknownMode(name.to_string()))
    }
}

/// Case-insensitive, trimmed mapping from logical column names to the actual
/// column names of one input table. Resolved once per table so per-row
/// lookups are O(1).
#[derive(Debug)]
pub struct ColumnMap {
    resolved: HashMap<String, String>,
}

impl ColumnMap {
    /// Resolve every logical column against the table's actual columns.
    /// Fails naming every logical column that could not be found.
    pub fn resolve(actual_columns: &[String], logical: &[&str]) -> Result<ColumnMap> {
        let by_key: HashMap<String, &String> = actual_columns
            .iter()
            .map(|c| (c.trim().to_lowercase(), c))
            .collect();

        let mut resolved = HashMap::new();
        let mut missing = Vec::new();
        for name in logical {
            let key = name.trim().to_lowercase();
            match by_key.get(&key) {
                Some(actual) => {
                    resolved.insert(key, (*actual).clone());
                }
                None => missing.push(name.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(OpsdeskError::missing_columns(missing));
        }
        Ok(ColumnMap { resolved })
    }

    /// Actual column name for a logical one. Panics only if the logical name
    /// was never part of the resolved set, which is a caller bug.
    pub fn actual(&self, logical: &str) -> &str {
        &self.resolved[&logical.trim().to_lowercase()]
    }
}
