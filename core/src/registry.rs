//! Creator registry: intake of new creator profiles
//!
//! Intake applies the console's validation rules before anything reaches the
//! store. Identity fields are mandatory; followers and notes are the only
//! optional ones. The phone number is stored in full international form and
//! the profile link is derived, never typed by the operator.

use crate::error::{OpsdeskError, Result};
use crate::lookup::Lookup;
use crate::store::{row_id, Row, Store};
use crate::value::Value;
use chrono::{Local, NaiveDate};

const PHONE_COUNTRY_CODE: &str = "+62";

/// A validated new-creator submission
#[derive(Debug, Clone)]
pub struct NewCreator {
    pub agency_name: String,
    pub tiktok_id: String,
    /// Exact count if known; zero means unknown and stores as null
    pub followers: u64,
    pub full_name: String,
    pub domicile: String,
    pub uid: String,
    /// National part only, without the country code
    pub phone: String,
    pub notes: Option<String>,
}

/// Filter for listing registered creators
#[derive(Debug, Clone, Default)]
pub struct CreatorFilter {
    /// Exact handle match; none lists everyone
    pub tiktok_id: Option<String>,
    /// Earliest registration date to include
    pub start_date: Option<NaiveDate>,
    /// Latest registration date to include
    pub end_date: Option<NaiveDate>,
}

/// Validate and insert a new creator, returning its assigned id.
///
/// New profiles always start unbound with no onboarding date; both are
/// maintained later through the registry edit target.
pub fn insert_creator(store: &Store, creator: &NewCreator) -> Result<i64> {
    let tiktok_id = creator.tiktok_id.trim();
    if tiktok_id.is_empty() {
        return Err(OpsdeskError::invalid_input("TikTok ID cannot be empty"));
    }
    if tiktok_id.starts_with('@') {
        return Err(OpsdeskError::invalid_input(
            "TikTok ID must not start with '@'",
        ));
    }
    if tiktok_id.contains(' ') {
        return Err(OpsdeskError::invalid_input(
            "TikTok ID must not contain spaces",
        ));
    }
    if creator.full_name.trim().is_empty() {
        return Err(OpsdeskError::invalid_input("full name is required"));
    }
    if creator.domicile.trim().is_empty() {
        return Err(OpsdeskError::invalid_input("domicile is required"));
    }
    let uid = creator.uid.trim();
    if uid.is_empty() || !uid.chars().all(|c| c.is_ascii_digit()) {
        return Err(OpsdeskError::invalid_input(
            "UID is required and must contain digits only",
        ));
    }
    let phone = validate_phone(&creator.phone)?;

    let agencies = Lookup::load(store, "public.agency_map", "agency_name")?;
    let agency_id = agencies.id_for(&creator.agency_name).ok_or_else(|| {
        OpsdeskError::invalid_input(format!("unknown agency: {}", creator.agency_name))
    })?;

    let tiktok_link = format!("https://www.tiktok.com/@{tiktok_id}");
    let month_label = Local::now().format("%Y-%m").to_string();
    let followers = if creator.followers > 0 {
        Value::Int(creator.followers as i64)
    } else {
        Value::Null
    };
    let notes = match creator.notes.as_deref().map(str::trim) {
        Some(n) if !n.is_empty() => Value::text(n),
        _ => Value::Null,
    };

    let row = store.query_one(
        "INSERT INTO public.creator_registry \
         (agency_id, tiktok_id, followers, full_name, domicile, uid, \
          phone_number, tiktok_link, binding_status, month_label, notes) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         RETURNING id",
        &[
            Value::Int(agency_id),
            Value::text(tiktok_id),
            followers,
            Value::text(creator.full_name.trim()),
            Value::text(creator.domicile.trim()),
            Value::text(uid),
            Value::Text(phone),
            Value::Text(tiktok_link),
            Value::text("Unbound"),
            Value::Text(month_label),
            notes,
        ],
    )?;
    let id = row_id(&row, "id")?;
    log::info!("registered creator {tiktok_id} as id {id}");
    Ok(id)
}

/// List registered creators with agency labels resolved, newest first.
/// Each row carries a derived `whatsapp_link` alongside the stored phone.
pub fn fetch_creators(store: &Store, filter: &CreatorFilter) -> Result<Vec<Row>> {
    let mut sql = String::from(
        "\
SELECT
    cr.id,
    cr.tiktok_id,
    cr.full_name,
    am.agency_name,
    cr.followers,
    cr.domicile,
    cr.uid,
    cr.phone_number,
    cr.tiktok_link,
    cr.binding_status,
    CAST(cr.onboarding_date AS VARCHAR) AS onboarding_date,
    cr.month_label,
    cr.notes,
    CAST(cr.created_at AS VARCHAR) AS created_at
FROM public.creator_registry cr
LEFT JOIN public.agency_map am ON cr.agency_id = am.id
WHERE 1=1",
    );
    let mut params = Vec::new();
    if let Some(handle) = filter.tiktok_id.as_deref() {
        let handle = handle.trim();
        if !handle.is_empty() {
            sql.push_str("\n  AND cr.tiktok_id = ?");
            params.push(Value::text(handle));
        }
    }
    if let Some(start) = filter.start_date {
        sql.push_str("\n  AND CAST(cr.created_at AS DATE) >= CAST(? AS DATE)");
        params.push(Value::text(start.format("%Y-%m-%d").to_string()));
    }
    if let Some(end) = filter.end_date {
        sql.push_str("\n  AND CAST(cr.created_at AS DATE) <= CAST(? AS DATE)");
        params.push(Value::text(end.format("%Y-%m-%d").to_string()));
    }
    sql.push_str("\nORDER BY cr.created_at DESC, cr.id DESC");

    let mut rows = store.query(&sql, &params)?;
    for row in &mut rows {
        let link = row
            .get("phone_number")
            .and_then(Value::as_str)
            .map(|phone| format!("https://wa.me/{}", phone.trim_start_matches('+')));
        row.insert(
            "whatsapp_link".to_string(),
            link.map_or(Value::Null, Value::Text),
        );
    }
    Ok(rows)
}

/// Check the national phone part and prepend the country code.
fn validate_phone(raw: &str) -> Result<String> {
    let phone = raw.trim();
    if phone.is_empty() {
        return Err(OpsdeskError::invalid_input("phone number cannot be empty"));
    }
    if phone.starts_with('+') || phone.starts_with("62") {
        return Err(OpsdeskError::invalid_input(
            "phone number must not include the +62 country code",
        ));
    }
    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(OpsdeskError::invalid_input(
            "phone number must contain digits only",
        ));
    }
    Ok(format!("{PHONE_COUNTRY_CODE}{phone}"))
}
