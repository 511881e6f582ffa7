//! Full edit/save cycle tests: export, edit, diff, apply, promote

mod common;

use common::seeded_session;
use chrono::NaiveDate;
use opsdesk_core::snapshot::{Snapshot, SnapshotFilter};
use opsdesk_core::{Session, Value};

fn january() -> SnapshotFilter {
    SnapshotFilter {
        start_date: NaiveDate::from_ymd_opt(2026, 1, 1),
        end_date: NaiveDate::from_ymd_opt(2026, 1, 31),
        id_like: None,
    }
}

fn edit(session: &mut Session, id: i64, field: &str, value: Value) {
    let mut row = session.snapshot().unwrap().working[&id].clone();
    row.insert(field.to_string(), value);
    session.edit_row(id, row).unwrap();
}

#[test]
fn test_export_respects_date_and_handle_filters() {
    let mut session = seeded_session();

    let snapshot = session.export("content-submissions", &january()).unwrap();
    let ids: Vec<i64> = snapshot.working.keys().copied().collect();
    assert_eq!(ids, vec![10, 12], "February submission is out of range");

    let filter = SnapshotFilter {
        id_like: Some("ZEE".to_string()),
        ..SnapshotFilter::default()
    };
    let snapshot = session.export("content-submissions", &filter).unwrap();
    let ids: Vec<i64> = snapshot.working.keys().copied().collect();
    assert_eq!(ids, vec![11], "handle filter is case-insensitive");
}

#[test]
fn test_untouched_export_diffs_to_nothing() {
    let mut session = seeded_session();
    session.export("content-submissions", &january()).unwrap();
    assert!(session.diff().unwrap().is_empty());
}

#[test]
fn test_review_cycle_for_one_submission() {
    let mut session = seeded_session();
    session.export("content-submissions", &january()).unwrap();

    // The exported working copy carries resolved labels, not ids
    let working = &session.snapshot().unwrap().working[&10];
    assert_eq!(working.get("status_name"), Some(&Value::text("Pending")));
    assert_eq!(working.get("agency_name"), Some(&Value::text("Adtree Digital Indonesia")));
    assert_eq!(working.get("posting_date"), Some(&Value::text("2026-01-15")));

    edit(&mut session, 10, "status_name", Value::text("Approved"));
    edit(&mut session, 10, "reason", Value::text("meets brief"));

    let batch = session.diff().unwrap();
    assert_eq!(batch.row_count(), 1, "row 12 was untouched");
    assert_eq!(batch.changes.len(), 2);

    let result = session.apply().unwrap();
    assert_eq!(result.updated_count, 1);
    assert!(result.skipped.is_empty());

    let row = session
        .store()
        .query_one(
            "SELECT status_id, reason FROM public.content_submissions WHERE id = 10",
            &[],
        )
        .unwrap();
    assert_eq!(row.get("status_id"), Some(&Value::Int(3)));
    assert_eq!(row.get("reason"), Some(&Value::text("meets brief")));

    // Promotion: the applied edit no longer counts as a pending change
    assert!(session.diff().unwrap().is_empty());
}

#[test]
fn test_unknown_status_label_skips_row_and_keeps_table_intact() {
    let mut session = seeded_session();
    session.export("content-submissions", &january()).unwrap();

    edit(&mut session, 10, "status_name", Value::text("Fast-Tracked"));
    edit(&mut session, 10, "reason", Value::text("should not land"));
    edit(&mut session, 12, "reason", Value::text("good catch"));

    let result = session.apply().unwrap();
    assert_eq!(result.updated_count, 1);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].id, 10);
    assert_eq!(result.skipped[0].label, "Fast-Tracked");

    let row = session
        .store()
        .query_one(
            "SELECT status_id, reason FROM public.content_submissions WHERE id = 10",
            &[],
        )
        .unwrap();
    assert_eq!(row.get("status_id"), Some(&Value::Int(2)), "skipped row untouched");
    assert_eq!(row.get("reason"), Some(&Value::Null));

    let row = session
        .store()
        .query_one(
            "SELECT reason FROM public.content_submissions WHERE id = 12",
            &[],
        )
        .unwrap();
    assert_eq!(row.get("reason"), Some(&Value::text("good catch")));

    // Row 12's applied edit is promoted; row 10's skipped edits stay pending
    let batch = session.diff().unwrap();
    assert_eq!(batch.row_count(), 1);
    assert_eq!(batch.changes.len(), 2);
    assert!(batch.changes.iter().all(|c| c.id == 10));
}

#[test]
fn test_blank_edit_of_null_field_is_not_a_change() {
    let mut session = seeded_session();
    session.export("content-submissions", &january()).unwrap();

    // reason is null in storage, shown as empty text; re-saving whitespace
    // over it must not produce a change
    edit(&mut session, 10, "reason", Value::text("   "));
    assert!(session.diff().unwrap().is_empty());
}

#[test]
fn test_snapshot_survives_json_round_trip() {
    let mut session = seeded_session();
    session.export("content-submissions", &january()).unwrap();
    edit(&mut session, 10, "status_name", Value::text("Rejected"));

    let serialized = serde_json::to_string_pretty(session.snapshot().unwrap()).unwrap();
    let restored: Snapshot = serde_json::from_str(&serialized).unwrap();

    let mut other = seeded_session();
    other.restore(restored).unwrap();
    let batch = other.diff().unwrap();
    assert_eq!(batch.changes.len(), 1);
    assert_eq!(batch.changes[0].id, 10);
    assert_eq!(batch.changes[0].new, Value::text("Rejected"));

    let result = other.apply().unwrap();
    assert_eq!(result.updated_count, 1);
}

#[test]
fn test_creator_registry_target_cycle() {
    let mut session = seeded_session();
    session
        .export("creator-registry", &SnapshotFilter::default())
        .unwrap();

    edit(&mut session, 2, "agency_name", Value::text("HM Agency"));
    edit(&mut session, 2, "binding_status", Value::text("Bound"));
    edit(&mut session, 2, "notes", Value::text("moved agencies in August"));

    let result = session.apply().unwrap();
    assert_eq!(result.updated_count, 1);

    let row = session
        .store()
        .query_one(
            "SELECT agency_id, binding_status, notes FROM public.creator_registry WHERE id = 2",
            &[],
        )
        .unwrap();
    assert_eq!(row.get("agency_id"), Some(&Value::Int(6)));
    assert_eq!(row.get("binding_status"), Some(&Value::text("Bound")));
    assert_eq!(row.get("notes"), Some(&Value::text("moved agencies in August")));
}

#[test]
fn test_live_churn_after_export_does_not_leak_into_diff() {
    let mut session = seeded_session();
    session.export("content-submissions", &january()).unwrap();

    // Another operator touches the live table after the export
    session
        .store()
        .execute(
            "UPDATE public.content_submissions SET status_id = 4 WHERE id = 12",
            &[],
        )
        .unwrap();

    // The snapshot pair is frozen; the concurrent write is invisible to diff
    assert!(session.diff().unwrap().is_empty());
}
