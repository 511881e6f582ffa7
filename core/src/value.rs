//! Field normalization: loosely-typed upload cells to typed domain values
//!
//! Uploads arrive as text (or nothing) per cell. Every cell is pushed through
//! a kind-directed normalizer that either produces a typed value or null;
//! normalization never fails. Callers decide later whether a null is
//! acceptable for the field in question.

use serde::{Deserialize, Serialize};

/// Placeholder tokens that stand for "no value" in uploaded text cells
const NULL_TOKENS: [&str; 5] = ["", ".", "-", "nan", "none"];

/// Currency prefix stripped from money cells, matched case-insensitively
const CURRENCY_PREFIX: &str = "rp";

/// A raw cell as read from an uploaded table: text, number, or nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Null,
}

impl RawValue {
    /// Stringify the cell so typed and textual input normalize uniformly.
    /// Whole-number floats render without a fractional part, so `12.0` and
    /// `"12"` take the same path through the integer normalizer.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Null => None,
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

/// A typed domain value as stored in the destination table.
///
/// Serialized untagged so snapshot working copies stay hand-editable JSON:
/// null, numbers and strings round-trip as themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Display rendering; null renders as the empty string.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }
}

/// Target kind for field normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    /// Whole-number minor units (rupiah), stored as BIGINT
    Currency,
    Text,
    /// Trimmed label; validity against an allowed set is the caller's job
    Categorical,
}

/// Normalize one raw cell to its typed value. Total: unparseable input
/// yields `Value::Null`, never an error.
pub fn normalize(raw: &RawValue, kind: FieldKind) -> Value {
    let Some(text) = raw.as_text() else {
        return Value::Null;
    };
    match kind {
        FieldKind::Integer => clean_int(&text).map_or(Value::Null, Value::Int),
        FieldKind::Currency => clean_currency(&text).map_or(Value::Null, Value::Int),
        FieldKind::Text => clean_text(&text).map_or(Value::Null, Value::Text),
        FieldKind::Categorical => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::Text(trimmed.to_string())
            }
        }
    }
}

fn is_placeholder(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    NULL_TOKENS.contains(&lower.as_str())
}

fn digits_and_sign(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect()
}

/// Parse an integer from loosely formatted text: thousands separators and
/// stray non-digit characters are stripped, a leading minus survives.
pub fn clean_int(raw: &str) -> Option<i64> {
    if is_placeholder(raw) {
        return None;
    }
    let digits = digits_and_sign(raw.trim());
    if digits.is_empty() || digits == "-" {
        return None;
    }
    digits.parse().ok()
}

/// Parse a currency amount like `"Rp334.022.643"` into whole minor units.
/// The `Rp` prefix is matched case-insensitively; dot, comma and space all
/// count as thousands separators.
pub fn clean_currency(raw: &str) -> Option<i64> {
    if is_placeholder(raw) {
        return None;
    }
    let mut s = raw.trim();
    let mut negative = false;
    // The minus may sit on either side of the prefix ("-Rp5.000", "Rp-5.000")
    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest.trim_start();
    }
    if s.len() >= CURRENCY_PREFIX.len()
        && s[..CURRENCY_PREFIX.len()].eq_ignore_ascii_case(CURRENCY_PREFIX)
    {
        s = &s[CURRENCY_PREFIX.len()..];
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest.trim_start();
    }
    let digits: String = s
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | ' '))
        .filter(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    let amount: i64 = digits.parse().ok()?;
    Some(if negative { -amount } else { amount })
}

/// Trim text; placeholder tokens normalize to none.
pub fn clean_text(raw: &str) -> Option<String> {
    if is_placeholder(raw) {
        return None;
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Format whole rupiah with the display convention used across the console:
/// `334022643` -> `"Rp334.022.643"`.
pub fn format_currency(n: i64) -> String {
    let negative = n < 0;
    let mut digits = n.unsigned_abs().to_string();
    let mut grouped = String::new();
    while digits.len() > 3 {
        let tail = digits.split_off(digits.len() - 3);
        grouped = if grouped.is_empty() {
            tail
        } else {
            format!("{tail}.{grouped}")
        };
    }
    grouped = if grouped.is_empty() {
        digits
    } else {
        format!("{digits}.{grouped}")
    };
    if negative {
        format!("Rp-{grouped}")
    } else {
        format!("Rp{grouped}")
    }
}

/// Canonical comparison form: trimmed, with null and blank text collapsed.
fn canon(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Int(i) => Some(i.to_string()),
        Value::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 {
                Some(format!("{}", *f as i64))
            } else {
                Some(f.to_string())
            }
        }
    }
}

/// Equality rule used by the diff engine: both sides trimmed, null and
/// empty text treated as equal, numeric text equal to its number.
pub fn normalized_eq(a: &Value, b: &Value) -> bool {
    canon(a) == canon(b)
}
