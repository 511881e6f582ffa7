//! Content submission intake
//!
//! Intake resolves the creator by handle and carries the creator's agency
//! onto the submission as its management. The post link is the natural
//! duplicate key: a link that already exists in the table (ignoring
//! surrounding whitespace) rejects the submission outright. New rows start
//! in the reserved intake status and move on through the edit/save cycle.

use crate::error::{OpsdeskError, Result};
use crate::lookup::Lookup;
use crate::store::{row_id, Store};
use crate::value::Value;
use chrono::{Local, NaiveDate};

const INTAKE_STATUS: &str = "Submitted";

/// A validated new content submission
#[derive(Debug, Clone)]
pub struct NewSubmission {
    /// Handle of an already-registered creator
    pub tiktok_id: String,
    /// Category label, must match a configured category exactly
    pub category_name: String,
    pub post_type: String,
    pub link_post: String,
    /// Defaults to today when absent
    pub posting_date: Option<NaiveDate>,
}

/// Validate and insert a new submission, returning its assigned id.
pub fn insert_submission(store: &Store, submission: &NewSubmission) -> Result<i64> {
    let link = validate_link(&submission.link_post)?;
    if link_already_submitted(store, &link)? {
        return Err(OpsdeskError::DuplicateLink(link));
    }

    let handle = submission.tiktok_id.trim();
    let creators = store.query(
        "SELECT id, agency_id FROM public.creator_registry WHERE tiktok_id = ?",
        &[Value::text(handle)],
    )?;
    let creator = creators
        .first()
        .ok_or_else(|| OpsdeskError::invalid_input(format!("unknown creator: {handle}")))?;
    let creator_id = row_id(creator, "id")?;
    // The creator's agency may be unset; the submission then carries none
    let management_id = creator.get("agency_id").cloned().unwrap_or(Value::Null);

    let categories = Lookup::load(store, "public.category_map", "category_name")?;
    let category_id = categories.id_for(&submission.category_name).ok_or_else(|| {
        OpsdeskError::invalid_input(format!("unknown category: {}", submission.category_name))
    })?;

    let statuses = Lookup::load(store, "public.status_map", "status_name")?;
    let status_id = statuses
        .id_for(INTAKE_STATUS)
        .ok_or_else(|| OpsdeskError::invalid_input("intake status is not configured"))?;

    let posting_date = submission
        .posting_date
        .unwrap_or_else(|| Local::now().date_naive());

    let row = store.query_one(
        "INSERT INTO public.content_submissions \
         (submission_date, posting_date, creator_id, management_id, \
          category_id, status_id, post_type, link_post) \
         VALUES (current_timestamp, CAST(? AS DATE), ?, ?, ?, ?, ?, ?) \
         RETURNING id",
        &[
            Value::text(posting_date.format("%Y-%m-%d").to_string()),
            Value::Int(creator_id),
            management_id,
            Value::Int(category_id),
            Value::Int(status_id),
            Value::text(submission.post_type.trim()),
            Value::Text(link),
        ],
    )?;
    let id = row_id(&row, "id")?;
    log::info!("recorded submission {id} for {handle}");
    Ok(id)
}

/// Whether a trimmed link already exists in the submissions table
pub fn link_already_submitted(store: &Store, link: &str) -> Result<bool> {
    let rows = store.query(
        "SELECT 1 AS hit FROM public.content_submissions \
         WHERE TRIM(link_post) = TRIM(?) LIMIT 1",
        &[Value::text(link)],
    )?;
    Ok(!rows.is_empty())
}

/// Check the post link's shape and return it trimmed.
fn validate_link(raw: &str) -> Result<String> {
    let link = raw.trim();
    if link.is_empty() {
        return Err(OpsdeskError::invalid_input("post link is required"));
    }
    if !link.to_lowercase().contains("tiktok") {
        return Err(OpsdeskError::invalid_input(
            "invalid post link, must contain 'tiktok'",
        ));
    }
    if link.contains('@') {
        return Err(OpsdeskError::invalid_input(
            "post link must not contain the @ symbol",
        ));
    }
    if link.contains(' ') {
        return Err(OpsdeskError::invalid_input(
            "post link must not contain spaces",
        ));
    }
    Ok(link.to_string())
}
