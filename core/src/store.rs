//! Store access layer over an embedded DuckDB database
//!
//! Thin wrapper giving the core three primitives: parameterized queries that
//! come back as ordered column->value rows, batch statement execution, and a
//! scoped transaction that rolls back on any early return.

use crate::error::{OpsdeskError, Result};
use crate::value::Value;
use chrono::{DateTime, Duration, NaiveDate};
use duckdb::types::{TimeUnit, Value as DuckValue};
use duckdb::{params_from_iter, Connection, Transaction};
use indexmap::IndexMap;
use std::path::Path;

/// One store row, keyed by column name in select order
pub type Row = IndexMap<String, Value>;

/// Handle to the operations database
pub struct Store {
    connection: Connection,
}

impl Store {
    /// Open (creating if absent) the database file at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let connection = Connection::open(path)?;
        Self::tune(&connection)?;
        Ok(Self { connection })
    }

    /// In-memory store, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        Self::tune(&connection)?;
        Ok(Self { connection })
    }

    fn tune(connection: &Connection) -> Result<()> {
        connection.execute("SET enable_progress_bar=false", [])?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Execute a single statement, returning the affected row count
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        let affected = self
            .connection
            .execute(sql, params_from_iter(params.iter().map(to_duckdb)))?;
        Ok(affected)
    }

    /// Execute several semicolon-separated statements
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.connection.execute_batch(sql)?;
        Ok(())
    }

    /// Run a query and collect every result row
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let mut stmt = self.connection.prepare(sql)?;
        let mapped = stmt.query_map(params_from_iter(params.iter().map(to_duckdb)), |row| {
            let stmt = row.as_ref();
            let mut out = Row::new();
            for (idx, name) in stmt.column_names().into_iter().enumerate() {
                let value: DuckValue = row.get(idx)?;
                out.insert(name.to_string(), from_duckdb(value));
            }
            Ok(out)
        })?;
        let mut rows = Vec::new();
        for row in mapped {
            rows.push(row?);
        }
        Ok(rows)
    }

    /// Run a query expected to produce exactly one row
    pub fn query_one(&self, sql: &str, params: &[Value]) -> Result<Row> {
        let mut rows = self.query(sql, params)?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            n => Err(OpsdeskError::invalid_input(format!(
                "expected exactly one row, query returned {n}"
            ))),
        }
    }

    /// Scoped transaction: committed only when the closure succeeds, rolled
    /// back on any error path (including panics unwinding through the drop).
    pub fn transaction<T>(&mut self, f: impl FnOnce(&Transaction) -> Result<T>) -> Result<T> {
        let tx = self.connection.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Idempotently create the operational tables the edit/save cycle works
    /// against, and seed the lookup tables on first run.
    pub fn ensure_ops_tables(&self) -> Result<()> {
        self.execute_batch(OPS_SCHEMA_SQL)?;
        self.execute_batch(OPS_SEED_SQL)?;
        log::debug!("operational tables ensured");
        Ok(())
    }
}

/// Convert a core value into a bindable DuckDB value
pub fn to_duckdb(value: &Value) -> DuckValue {
    match value {
        Value::Null => DuckValue::Null,
        Value::Int(i) => DuckValue::BigInt(*i),
        Value::Float(f) => DuckValue::Double(*f),
        Value::Text(s) => DuckValue::Text(s.clone()),
    }
}

/// Convert a DuckDB result value into a core value. Dates and timestamps
/// come back as ISO text so snapshots stay plain JSON.
pub fn from_duckdb(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Int(b as i64),
        DuckValue::TinyInt(i) => Value::Int(i as i64),
        DuckValue::SmallInt(i) => Value::Int(i as i64),
        DuckValue::Int(i) => Value::Int(i as i64),
        DuckValue::BigInt(i) => Value::Int(i),
        DuckValue::HugeInt(i) => match i64::try_from(i) {
            Ok(n) => Value::Int(n),
            Err(_) => Value::Text(i.to_string()),
        },
        DuckValue::UTinyInt(i) => Value::Int(i as i64),
        DuckValue::USmallInt(i) => Value::Int(i as i64),
        DuckValue::UInt(i) => Value::Int(i as i64),
        DuckValue::UBigInt(i) => Value::Int(i as i64),
        DuckValue::Float(f) => Value::Float(f as f64),
        DuckValue::Double(f) => Value::Float(f),
        DuckValue::Decimal(d) => {
            let text = d.to_string();
            match text.parse::<f64>() {
                Ok(f) => Value::Float(f),
                Err(_) => Value::Text(text),
            }
        }
        DuckValue::Text(s) => Value::Text(s),
        DuckValue::Date32(days) => match NaiveDate::from_ymd_opt(1970, 1, 1)
            .and_then(|epoch| epoch.checked_add_signed(Duration::days(days as i64)))
        {
            Some(date) => Value::Text(date.format("%Y-%m-%d").to_string()),
            None => Value::Null,
        },
        DuckValue::Timestamp(unit, raw) => {
            let micros = match unit {
                TimeUnit::Second => raw.saturating_mul(1_000_000),
                TimeUnit::Millisecond => raw.saturating_mul(1_000),
                TimeUnit::Microsecond => raw,
                TimeUnit::Nanosecond => raw / 1_000,
            };
            match DateTime::from_timestamp_micros(micros) {
                Some(ts) => Value::Text(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
                None => Value::Null,
            }
        }
        other => Value::Text(format!("{other:?}")),
    }
}

/// Pull a row's numeric identity out of the given column
pub fn row_id(row: &Row, id_column: &str) -> Result<i64> {
    row.get(id_column)
        .and_then(Value::as_int)
        .ok_or_else(|| OpsdeskError::invalid_input(format!("row has no numeric '{id_column}'")))
}

// Mirrors the console's live Postgres schema: registry + submissions plus the
// three label maps consulted by dropdowns and the reconciliation applier.
const OPS_SCHEMA_SQL: &str = r#"
CREATE SCHEMA IF NOT EXISTS public;

CREATE SEQUENCE IF NOT EXISTS public.agency_map_seq START 1001;
CREATE SEQUENCE IF NOT EXISTS public.category_map_seq START 1001;
CREATE SEQUENCE IF NOT EXISTS public.status_map_seq START 1001;
CREATE SEQUENCE IF NOT EXISTS public.creator_registry_seq START 1;
CREATE SEQUENCE IF NOT EXISTS public.content_submissions_seq START 1;

CREATE TABLE IF NOT EXISTS public.agency_map (
    id INTEGER PRIMARY KEY DEFAULT nextval('public.agency_map_seq'),
    agency_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS public.category_map (
    id INTEGER PRIMARY KEY DEFAULT nextval('public.category_map_seq'),
    category_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS public.status_map (
    id INTEGER PRIMARY KEY DEFAULT nextval('public.status_map_seq'),
    status_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS public.creator_registry (
    id INTEGER PRIMARY KEY DEFAULT nextval('public.creator_registry_seq'),
    agency_id INTEGER,
    tiktok_id TEXT NOT NULL,
    followers BIGINT,
    full_name TEXT,
    domicile TEXT,
    uid TEXT,
    phone_number TEXT,
    tiktok_link TEXT,
    binding_status TEXT,
    onboarding_date DATE,
    month_label TEXT,
    notes TEXT,
    created_at TIMESTAMP DEFAULT current_timestamp,
    last_updated TIMESTAMP DEFAULT current_timestamp
);

CREATE TABLE IF NOT EXISTS public.content_submissions (
    id INTEGER PRIMARY KEY DEFAULT nextval('public.content_submissions_seq'),
    submission_date TIMESTAMP,
    posting_date DATE,
    post_type TEXT,
    link_post TEXT,
    level INTEGER,
    notes TEXT,
    reason TEXT,
    creator_id INTEGER,
    management_id INTEGER,
    category_id INTEGER,
    status_id INTEGER,
    created_at TIMESTAMP DEFAULT current_timestamp,
    last_updated TIMESTAMP DEFAULT current_timestamp
);
"#;

// Status id 1 is the intake status and is never assignable from the editor.
const OPS_SEED_SQL: &str = r#"
INSERT INTO public.status_map (id, status_name)
SELECT * FROM (VALUES
    (1, 'Submitted'),
    (2, 'Pending'),
    (3, 'Approved'),
    (4, 'Rejected')
) v(id, status_name)
WHERE NOT EXISTS (SELECT 1 FROM public.status_map);

INSERT INTO public.agency_map (id, agency_name)
SELECT * FROM (VALUES
    (1, 'Adtree Digital Indonesia'),
    (2, 'Golden Maker'),
    (3, 'WH Management'),
    (4, 'TB Management'),
    (5, 'BTC Management'),
    (6, 'HM Agency')
) v(id, agency_name)
WHERE NOT EXISTS (SELECT 1 FROM public.agency_map);

INSERT INTO public.category_map (id, category_name)
SELECT * FROM (VALUES
    (1, 'Accommodation'),
    (2, 'Dining'),
    (3, 'Things To Do')
) v(id, category_name)
WHERE NOT EXISTS (SELECT 1 FROM public.category_map);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ops_tables_idempotent() {
        let store = Store::open_in_memory().unwrap();
        store.ensure_ops_tables().unwrap();
        store.ensure_ops_tables().unwrap();

        let statuses = store
            .query("SELECT id, status_name FROM public.status_map ORDER BY id", &[])
            .unwrap();
        assert_eq!(statuses.len(), 4);
        assert_eq!(statuses[0].get("status_name"), Some(&Value::text("Submitted")));
    }

    #[test]
    fn test_value_round_trip_through_store() {
        let store = Store::open_in_memory().unwrap();
        store
            .execute_batch("CREATE TABLE t (a BIGINT, b TEXT, c DOUBLE, d DATE)")
            .unwrap();
        store
            .execute(
                "INSERT INTO t VALUES (?, ?, ?, CAST(? AS DATE))",
                &[
                    Value::Int(42),
                    Value::text("hello"),
                    Value::Float(1.5),
                    Value::text("2026-01-31"),
                ],
            )
            .unwrap();

        let row = store.query_one("SELECT * FROM t", &[]).unwrap();
        assert_eq!(row.get("a"), Some(&Value::Int(42)));
        assert_eq!(row.get("b"), Some(&Value::text("hello")));
        assert_eq!(row.get("c"), Some(&Value::Float(1.5)));
        assert_eq!(row.get("d"), Some(&Value::text("2026-01-31")));
    }

    #[test]
    fn test_hugeint_outside_i64_range_stays_textual() {
        let store = Store::open_in_memory().unwrap();

        let row = store
            .query_one("SELECT CAST(42 AS HUGEINT) AS h", &[])
            .unwrap();
        assert_eq!(row.get("h"), Some(&Value::Int(42)));

        let row = store
            .query_one(
                "SELECT CAST(9223372036854775807 AS HUGEINT) * 10 AS h",
                &[],
            )
            .unwrap();
        assert_eq!(
            row.get("h"),
            Some(&Value::text("92233720368547758070"))
        );
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let mut store = Store::open_in_memory().unwrap();
        store.execute_batch("CREATE TABLE t (a BIGINT)").unwrap();

        let result: Result<()> = store.transaction(|tx| {
            tx.execute("INSERT INTO t VALUES (1)", [])?;
            Err(OpsdeskError::invalid_input("boom"))
        });
        assert!(result.is_err());

        let rows = store.query("SELECT * FROM t", &[]).unwrap();
        assert!(rows.is_empty(), "insert should have been rolled back");
    }
}
