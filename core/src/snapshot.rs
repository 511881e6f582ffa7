//! Snapshot capture and promotion for the edit/save cycle
//!
//! An export takes a filtered slice of a mutable table and freezes it twice:
//! the baseline (storage-faithful, true nulls) and the working copy the
//! operator edits (nulls shown as empty editable text). The pair, keyed by
//! row id, is everything diff and apply need — live table churn after the
//! export does not touch it.

use crate::error::{OpsdeskError, Result};
use crate::store::{row_id, Row, Store};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Filter applied at export time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive substring over the target's id-like column
    pub id_like: Option<String>,
}

/// A tracked (operator-editable) field of an edit target
#[derive(Debug, Clone)]
pub enum TrackedField {
    /// Written back to the destination column as-is
    Plain { column: String },
    /// Shown as a label, stored as the id the lookup table maps it to
    Label {
        label_column: String,
        id_column: String,
        lookup_table: String,
        lookup_label_column: String,
    },
}

impl TrackedField {
    fn plain(column: &str) -> Self {
        TrackedField::Plain {
            column: column.to_string(),
        }
    }

    fn label(label_column: &str, id_column: &str, lookup_table: &str, lookup_label: &str) -> Self {
        TrackedField::Label {
            label_column: label_column.to_string(),
            id_column: id_column.to_string(),
            lookup_table: lookup_table.to_string(),
            lookup_label_column: lookup_label.to_string(),
        }
    }

    /// Name of the field as it appears in exported rows
    pub fn column(&self) -> &str {
        match self {
            TrackedField::Plain { column } => column,
            TrackedField::Label { label_column, .. } => label_column,
        }
    }
}

/// A mutable destination table the edit/save cycle can operate on
#[derive(Debug, Clone)]
pub struct EditTarget {
    pub name: String,
    /// Schema-qualified table updates are written to
    pub table: String,
    pub id_column: String,
    /// Joined SELECT (ends in `WHERE 1=1`) producing the exported rows
    select_sql: String,
    /// Expression the date-range filter applies to
    date_expr: String,
    /// Column the id-like substring filter applies to
    id_like_expr: String,
    pub tracked: Vec<TrackedField>,
}

impl EditTarget {
    /// All built-in edit targets
    pub fn builtin() -> Vec<EditTarget> {
        vec![
            EditTarget {
                name: "content-submissions".to_string(),
                table: "public.content_submissions".to_string(),
                id_column: "id".to_string(),
                select_sql: "\
SELECT
    cs.id,
    cr.tiktok_id,
    cr.full_name,
    am.agency_name,
    CAST(cs.posting_date AS VARCHAR) AS posting_date,
    CAST(cs.submission_date AS VARCHAR) AS submission_date,
    cs.post_type,
    cs.link_post,
    cat.category_name,
    sm.status_name,
    cs.reason
FROM public.content_submissions cs
LEFT JOIN public.creator_registry cr ON cs.creator_id = cr.id
LEFT JOIN public.agency_map am ON cs.management_id = am.id
LEFT JOIN public.category_map cat ON cs.category_id = cat.id
LEFT JOIN public.status_map sm ON cs.status_id = sm.id
WHERE 1=1"
                    .to_string(),
                date_expr: "cs.posting_date".to_string(),
                id_like_expr: "cr.tiktok_id".to_string(),
                tracked: vec![
                    TrackedField::label("status_name", "status_id", "public.status_map", "status_name"),
                    TrackedField::plain("reason"),
                ],
            },
            EditTarget {
                name: "creator-registry".to_string(),
                table: "public.creator_registry".to_string(),
                id_column: "id".to_string(),
                select_sql: "\
SELECT
    cr.id,
    cr.tiktok_id,
    cr.full_name,
    am.agency_name,
    cr.followers,
    cr.domicile,
    cr.binding_status,
    CAST(cr.onboarding_date AS VARCHAR) AS onboarding_date,
    cr.month_label,
    cr.notes,
    CAST(cr.created_at AS VARCHAR) AS created_at
FROM public.creator_registry cr
LEFT JOIN public.agency_map am ON cr.agency_id = am.id
WHERE 1=1"
                    .to_string(),
                date_expr: "CAST(cr.created_at AS DATE)".to_string(),
                id_like_expr: "cr.tiktok_id".to_string(),
                tracked: vec![
                    TrackedField::label("agency_name", "agency_id", "public.agency_map", "agency_name"),
                    TrackedField::plain("full_name"),
                    TrackedField::plain("domicile"),
                    TrackedField::plain("binding_status"),
                    TrackedField::plain("notes"),
                ],
            },
        ]
    }

    /// Look up a built-in target by name
    pub fn find(name: &str) -> Result<EditTarget> {
        Self::builtin()
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| OpsdeskError::UnknownTarget(name.to_string()))
    }

    /// Build the export query for a filter; rows come back in id order
    fn export_sql(&self, filter: &SnapshotFilter) -> (String, Vec<Value>) {
        let mut sql = self.select_sql.clone();
        let mut params = Vec::new();

        if let Some(start) = filter.start_date {
            sql.push_str(&format!("\n  AND {} >= CAST(? AS DATE)", self.date_expr));
            params.push(Value::text(start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = filter.end_date {
            sql.push_str(&format!("\n  AND {} <= CAST(? AS DATE)", self.date_expr));
            params.push(Value::text(end.format("%Y-%m-%d").to_string()));
        }
        if let Some(pattern) = filter.id_like.as_deref() {
            let pattern = pattern.trim();
            if !pattern.is_empty() {
                sql.push_str(&format!("\n  AND {} ILIKE ?", self.id_like_expr));
                params.push(Value::text(format!("%{pattern}%")));
            }
        }

        sql.push_str(&format!("\nORDER BY {}", self.id_column));
        (sql, params)
    }
}

/// One exported batch: frozen baseline plus the operator's working copy,
/// both keyed by row id in export order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub target: String,
    pub captured_at: DateTime<Utc>,
    pub filter: SnapshotFilter,
    /// Tracked field names, in diff order
    pub tracked: Vec<String>,
    /// Storage-faithful copy; immutable except through `promote`
    pub baseline: IndexMap<i64, Row>,
    /// Display-oriented copy the operator edits; nulls become empty text
    pub working: IndexMap<i64, Row>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }
}

/// Export a filtered row-set from the target table into a fresh snapshot.
/// Any previously held snapshot is simply replaced by the caller.
pub fn export_snapshot(
    store: &Store,
    target: &EditTarget,
    filter: &SnapshotFilter,
) -> Result<Snapshot> {
    let (sql, params) = target.export_sql(filter);
    let rows = store.query(&sql, &params)?;

    let mut baseline = IndexMap::new();
    let mut working = IndexMap::new();
    for row in rows {
        let id = row_id(&row, &target.id_column)?;
        working.insert(id, blank_nulls(&row));
        baseline.insert(id, row);
    }

    log::info!(
        "exported {} row(s) from {} into a new snapshot",
        baseline.len(),
        target.name
    );

    Ok(Snapshot {
        target: target.name.clone(),
        captured_at: Utc::now(),
        filter: filter.clone(),
        tracked: target.tracked.iter().map(|f| f.column().to_string()).collect(),
        baseline,
        working,
    })
}

/// Promote the working copy to the new baseline after an apply. Rows listed
/// in `except` (those the applier skipped) keep their previous baseline, so
/// their edits stay pending for the next diff instead of vanishing unwritten.
/// Empty editable text converts back to null so the next diff compares
/// storage-faithful values.
pub fn promote(snapshot: &mut Snapshot, except: &[i64]) {
    snapshot.baseline = snapshot
        .working
        .iter()
        .map(|(id, row)| {
            if except.contains(id) {
                if let Some(base) = snapshot.baseline.get(id) {
                    return (*id, base.clone());
                }
            }
            (*id, restore_nulls(row))
        })
        .collect();
}

fn blank_nulls(row: &Row) -> Row {
    row.iter()
        .map(|(column, value)| {
            let shown = match value {
                Value::Null => Value::text(""),
                other => other.clone(),
            };
            (column.clone(), shown)
        })
        .collect()
}

fn restore_nulls(row: &Row) -> Row {
    row.iter()
        .map(|(column, value)| {
            let stored = match value {
                Value::Text(s) if s.trim().is_empty() => Value::Null,
                other => other.clone(),
            };
            (column.clone(), stored)
        })
        .collect()
}
