//! Output formatting utilities

use anyhow::Result;
use opsdesk_core::apply::ApplyResult;
use opsdesk_core::diff::ChangeBatch;
use opsdesk_core::ingest::IngestResult;
use opsdesk_core::schema::IngestMode;
use opsdesk_core::snapshot::Snapshot;
use opsdesk_core::store::Row;
use opsdesk_core::value::Value;
use std::path::Path;

const CREATOR_COLUMNS: &[&str] = &[
    "id",
    "tiktok_id",
    "full_name",
    "agency_name",
    "followers",
    "domicile",
    "binding_status",
    "whatsapp_link",
];

/// Pretty printer for opsdesk output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print the outcome of one ingestion run
    pub fn print_ingest_result(mode: &IngestMode, result: &IngestResult, replaced: bool) {
        let verb = if replaced { "Replaced" } else { "Appended" };
        println!(
            "✅ {verb} {} with {} row(s)",
            mode.qualified_table(),
            result.rows_inserted
        );

        if !result.warnings.is_empty() {
            println!("⚠️  {} cell(s) could not be parsed and loaded as null:", result.warnings.len());
            for warning in result.warnings.iter().take(10) {
                println!(
                    "├─ row {}: {} = '{}'",
                    warning.row + 1,
                    warning.column,
                    warning.raw
                );
            }
            if result.warnings.len() > 10 {
                println!("└─ ... and {} more", result.warnings.len() - 10);
            }
        }

        if !result.rejected.is_empty() {
            println!("❌ {} row(s) skipped (required field empty):", result.rejected.len());
            for rejected in &result.rejected {
                println!("├─ row {}: {}", rejected.row + 1, rejected.field);
            }
        }
    }

    /// Print a short description of a freshly exported snapshot
    pub fn print_snapshot_summary(snapshot: &Snapshot, path: &Path) {
        println!("📸 Exported {} row(s) from {}", snapshot.len(), snapshot.target);
        println!("├─ Captured: {}", snapshot.captured_at.format("%Y-%m-%d %H:%M:%S UTC"));
        if let Some(start) = snapshot.filter.start_date {
            println!("├─ From: {start}");
        }
        if let Some(end) = snapshot.filter.end_date {
            println!("├─ To: {end}");
        }
        if let Some(pattern) = snapshot.filter.id_like.as_deref() {
            println!("├─ Handle contains: {pattern}");
        }
        println!("├─ Editable fields: {}", snapshot.tracked.join(", "));
        println!("└─ Saved to: {}", path.display());
    }

    /// Print pending changes
    pub fn print_change_batch(batch: &ChangeBatch) {
        if batch.is_empty() {
            println!("✅ No changes detected.");
            return;
        }

        println!(
            "🔍 {} change(s) across {} row(s):",
            batch.changes.len(),
            batch.row_count()
        );
        for change in &batch.changes {
            println!(
                "├─ row {}: {}: '{}' → '{}'",
                change.id,
                change.field,
                change.old.render(),
                change.new.render()
            );
        }
    }

    /// Print apply outcome
    pub fn print_apply_result(result: &ApplyResult, batch: &ChangeBatch) {
        if batch.is_empty() {
            println!("✅ Nothing to apply.");
            return;
        }

        println!("✅ Applied {} row update(s)", result.updated_count);
        if !result.skipped.is_empty() {
            println!("⚠️  {} row(s) skipped:", result.skipped.len());
            for skipped in &result.skipped {
                println!(
                    "├─ row {}: {} '{}' has no match",
                    skipped.id, skipped.field, skipped.label
                );
            }
        }
    }

    /// Print registered creators as an aligned table
    pub fn print_creator_table(rows: &[Row]) {
        let mut widths: Vec<usize> = CREATOR_COLUMNS.iter().map(|c| c.len()).collect();
        let rendered: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                CREATOR_COLUMNS
                    .iter()
                    .enumerate()
                    .map(|(i, column)| {
                        let cell = row.get(*column).unwrap_or(&Value::Null).render();
                        widths[i] = widths[i].max(cell.len());
                        cell
                    })
                    .collect()
            })
            .collect();

        let header: Vec<String> = CREATOR_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column:<width$}", width = widths[i]))
            .collect();
        println!("{}", header.join("  "));
        println!("{}", "-".repeat(header.join("  ").len()));
        for cells in rendered {
            let line: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(i, cell)| format!("{cell:<width$}", width = widths[i]))
                .collect();
            println!("{}", line.join("  "));
        }
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format_ingest_result(result: &IngestResult) -> Result<String> {
        let json = serde_json::json!({
            "rows_inserted": result.rows_inserted,
            "warnings": result.warnings.iter().map(|w| serde_json::json!({
                "row": w.row,
                "column": w.column,
                "raw": w.raw,
            })).collect::<Vec<_>>(),
            "rejected": result.rejected.iter().map(|r| serde_json::json!({
                "row": r.row,
                "field": r.field,
            })).collect::<Vec<_>>(),
        });
        Ok(serde_json::to_string_pretty(&json)?)
    }

    pub fn format_apply_result(result: &ApplyResult) -> Result<String> {
        let json = serde_json::json!({
            "updated_count": result.updated_count,
            "skipped": result.skipped.iter().map(|s| serde_json::json!({
                "id": s.id,
                "field": s.field,
                "label": s.label,
            })).collect::<Vec<_>>(),
        });
        Ok(serde_json::to_string_pretty(&json)?)
    }

    pub fn format_rows(rows: &[Row]) -> Result<String> {
        Ok(serde_json::to_string_pretty(rows)?)
    }
}
