//! Reconciliation session: the export, edit, diff, apply cycle
//!
//! A session owns the store and at most one open snapshot. Exporting replaces
//! whatever snapshot was open, discarding its pending edits. Diff and apply
//! refuse to run without one. A successful apply promotes the working copy to
//! the new baseline, so re-running diff immediately afterwards reports
//! nothing.

use crate::apply::{self, ApplyResult};
use crate::diff::{self, ChangeBatch};
use crate::error::{OpsdeskError, Result};
use crate::snapshot::{self, EditTarget, Snapshot, SnapshotFilter};
use crate::store::Store;

pub struct Session {
    store: Store,
    snapshot: Option<Snapshot>,
}

impl Session {
    /// Wrap a store, ensuring the operational tables exist first
    pub fn new(store: Store) -> Result<Self> {
        store.ensure_ops_tables()?;
        Ok(Self {
            store,
            snapshot: None,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Export a fresh snapshot, replacing any open one and its edits.
    pub fn export(&mut self, target_name: &str, filter: &SnapshotFilter) -> Result<&Snapshot> {
        let target = EditTarget::find(target_name)?;
        if self.snapshot.is_some() {
            log::info!("replacing the open snapshot; pending edits are discarded");
        }
        let snapshot = snapshot::export_snapshot(&self.store, &target, filter)?;
        self.snapshot = Some(snapshot);
        Ok(self.snapshot.as_ref().unwrap())
    }

    /// Adopt a snapshot that was persisted elsewhere, typically one whose
    /// working copy an operator edited out of band.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<&Snapshot> {
        // Reject handles for targets this build does not know
        EditTarget::find(&snapshot.target)?;
        self.snapshot = Some(snapshot);
        Ok(self.snapshot.as_ref().unwrap())
    }

    /// Replace the open snapshot's working row for `id`
    pub fn edit_row(&mut self, id: i64, row: crate::store::Row) -> Result<()> {
        let snapshot = self.snapshot.as_mut().ok_or(OpsdeskError::NoSnapshot)?;
        if !snapshot.working.contains_key(&id) {
            return Err(OpsdeskError::invalid_input(format!(
                "row {id} is not part of the open snapshot"
            )));
        }
        snapshot.working.insert(id, row);
        Ok(())
    }

    /// Diff the open snapshot's working copy against its baseline
    pub fn diff(&self) -> Result<ChangeBatch> {
        let snapshot = self.snapshot.as_ref().ok_or(OpsdeskError::NoSnapshot)?;
        Ok(diff::diff(snapshot))
    }

    /// Apply the open snapshot's pending changes to the live table.
    ///
    /// On success the written rows' working copies become the new baseline
    /// and the snapshot stays open, so the operator can keep editing the same
    /// batch. Rows the applier skipped keep their old baseline, leaving their
    /// edits pending for a corrected retry.
    pub fn apply(&mut self) -> Result<ApplyResult> {
        let snapshot = self.snapshot.as_ref().ok_or(OpsdeskError::NoSnapshot)?;
        let target = EditTarget::find(&snapshot.target)?;
        let batch = diff::diff(snapshot);
        let result = apply::apply(&mut self.store, &target, &batch)?;

        let skipped_ids: Vec<i64> = result.skipped.iter().map(|s| s.id).collect();
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot::promote(snapshot, &skipped_ids);
        }
        Ok(result)
    }

    /// Drop the open snapshot without applying anything
    pub fn discard(&mut self) {
        self.snapshot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use chrono::NaiveDate;

    fn session_with_data() -> Session {
        let store = Store::open_in_memory().unwrap();
        let mut session = Session::new(store).unwrap();
        session
            .store()
            .execute(
                "INSERT INTO public.creator_registry (id, tiktok_id, full_name) \
                 VALUES (1, 'alpha', 'Alpha')",
                &[],
            )
            .unwrap();
        session
            .store()
            .execute(
                "INSERT INTO public.content_submissions \
                 (id, creator_id, posting_date, status_id) \
                 VALUES (10, 1, CAST('2026-01-15' AS DATE), 2)",
                &[],
            )
            .unwrap();
        session
    }

    #[test]
    fn test_diff_without_snapshot_fails() {
        let store = Store::open_in_memory().unwrap();
        let session = Session::new(store).unwrap();
        assert!(matches!(session.diff(), Err(OpsdeskError::NoSnapshot)));
    }

    #[test]
    fn test_full_cycle_promotes_baseline() {
        let mut session = session_with_data();
        let filter = SnapshotFilter {
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 31),
            id_like: None,
        };
        session.export("content-submissions", &filter).unwrap();
        assert_eq!(session.snapshot().unwrap().len(), 1);

        let mut row = session.snapshot().unwrap().working[&10].clone();
        row.insert("status_name".to_string(), Value::text("Approved"));
        session.edit_row(10, row).unwrap();

        assert_eq!(session.diff().unwrap().row_count(), 1);
        let result = session.apply().unwrap();
        assert_eq!(result.updated_count, 1);

        // Promotion means the same edit no longer diffs
        assert!(session.diff().unwrap().is_empty());
    }

    #[test]
    fn test_skipped_rows_keep_their_edits_pending() {
        let mut session = session_with_data();
        session
            .export("content-submissions", &SnapshotFilter::default())
            .unwrap();
        let mut row = session.snapshot().unwrap().working[&10].clone();
        row.insert("status_name".to_string(), Value::text("Escalated"));
        session.edit_row(10, row).unwrap();

        let result = session.apply().unwrap();
        assert_eq!(result.updated_count, 0);
        assert_eq!(result.skipped.len(), 1);

        // The skipped edit is still pending, not promoted away unwritten
        let batch = session.diff().unwrap();
        assert_eq!(batch.row_count(), 1);
        assert_eq!(batch.changes[0].new, Value::text("Escalated"));

        // Correcting the label and retrying lands it
        let mut row = session.snapshot().unwrap().working[&10].clone();
        row.insert("status_name".to_string(), Value::text("Approved"));
        session.edit_row(10, row).unwrap();
        let result = session.apply().unwrap();
        assert_eq!(result.updated_count, 1);
        assert!(result.skipped.is_empty());
        assert!(session.diff().unwrap().is_empty());
    }

    #[test]
    fn test_export_replaces_pending_edits() {
        let mut session = session_with_data();
        session
            .export("content-submissions", &SnapshotFilter::default())
            .unwrap();

        let mut row = session.snapshot().unwrap().working[&10].clone();
        row.insert("reason".to_string(), Value::text("draft note"));
        session.edit_row(10, row).unwrap();
        assert!(!session.diff().unwrap().is_empty());

        session
            .export("content-submissions", &SnapshotFilter::default())
            .unwrap();
        assert!(session.diff().unwrap().is_empty(), "edits were discarded");
    }

    #[test]
    fn test_edit_unknown_row_rejected() {
        let mut session = session_with_data();
        session
            .export("content-submissions", &SnapshotFilter::default())
            .unwrap();
        let err = session.edit_row(999, crate::store::Row::new()).unwrap_err();
        assert!(matches!(err, OpsdeskError::InvalidInput { .. }));
    }
}
