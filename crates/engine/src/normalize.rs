//! Row normalization.
//!
//! Statement rows come from several backend deployments that never agreed
//! on field names. [`normalize`] maps any JSON value onto a
//! [`NormalizedRow`], trying one alias list per canonical field (first
//! present, non-null key wins). It never fails: anything that is not a JSON
//! object yields [`NormalizedRow::default`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::MoneyCents;

const ID_KEYS: [&str; 6] = ["id", "tx_id", "transaction_id", "uuid", "numero", "seq"];
const TIMESTAMP_KEYS: [&str; 5] = ["data", "created_at", "timestamp", "dt", "date"];
const KIND_KEYS: [&str; 3] = ["tipo", "type", "kind"];
const AMOUNT_KEYS: [&str; 4] = ["valor", "amount", "value", "total"];
const CENTS_KEY: &str = "valor_centavos";
const DESCRIPTION_KEYS: [&str; 5] = ["descricao", "description", "memo", "obs", "note"];

/// Direction of a statement row.
///
/// Explicit labels coming from the backend are kept even when they are not
/// one of the two known directions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum RowKind {
    Credit,
    Debit,
    Other(String),
}

impl RowKind {
    /// Maps an explicit backend label (any case) to a kind.
    pub fn from_label(label: &str) -> Self {
        let upper = label.trim().to_uppercase();
        match upper.as_str() {
            "CREDIT" | "CREDITO" | "CRÉDITO" | "C" => Self::Credit,
            "DEBIT" | "DEBITO" | "DÉBITO" | "D" => Self::Debit,
            _ => Self::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Credit => "CREDIT",
            Self::Debit => "DEBIT",
            Self::Other(label) => label.as_str(),
        }
    }
}

/// Canonical statement row.
///
/// `kind` is `None` only for the all-defaults row produced from a
/// non-object input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedRow {
    pub id: String,
    /// RFC 3339 (UTC, milliseconds) when the source date parsed, else the
    /// raw source text, else empty.
    pub timestamp: String,
    pub kind: Option<RowKind>,
    /// Signed amount: debits are negative once a debit marker was applied.
    pub amount: MoneyCents,
    pub description: String,
}

impl NormalizedRow {
    /// Label used in tables and CSV files; empty when no kind is known.
    pub fn kind_label(&self) -> &str {
        self.kind.as_ref().map(RowKind::as_str).unwrap_or("")
    }

    pub fn is_credit(&self) -> bool {
        self.kind == Some(RowKind::Credit)
    }

    pub fn is_debit(&self) -> bool {
        self.kind == Some(RowKind::Debit)
    }
}

/// Normalizes a single raw backend record.
pub fn normalize(raw: &Value) -> NormalizedRow {
    let Some(obj) = raw.as_object() else {
        return NormalizedRow::default();
    };

    let id = first_present(obj, &ID_KEYS)
        .map(scalar_text)
        .unwrap_or_default();

    let timestamp = first_present(obj, &TIMESTAMP_KEYS)
        .map(normalize_timestamp)
        .unwrap_or_default();

    let explicit_kind = first_present(obj, &KIND_KEYS)
        .map(scalar_text)
        .filter(|label| !label.is_empty())
        .map(|label| RowKind::from_label(&label));

    let mut amount = match first_present(obj, &AMOUNT_KEYS) {
        Some(value) => amount_from_value(value),
        None => obj
            .get(CENTS_KEY)
            .map(cents_from_value)
            .unwrap_or(MoneyCents::ZERO),
    };

    // Debit markers flip the sign before the kind is inferred from it.
    if has_debit_marker(obj) && amount.is_positive() {
        amount = -amount;
    }

    // An explicit kind wins even when it disagrees with the sign.
    let kind = explicit_kind.unwrap_or(if amount.is_negative() {
        RowKind::Debit
    } else {
        RowKind::Credit
    });

    let description = first_present(obj, &DESCRIPTION_KEYS)
        .map(description_text)
        .unwrap_or_default();

    NormalizedRow {
        id,
        timestamp,
        kind: Some(kind),
        amount,
        description,
    }
}

/// Normalizes a response body. Anything other than a JSON array is treated
/// as an empty page.
pub fn normalize_all(body: &Value) -> Vec<NormalizedRow> {
    body.as_array()
        .map(|items| items.iter().map(normalize).collect())
        .unwrap_or_default()
}

/// Parses the date formats seen in statement payloads.
///
/// The first space is read as the date/time separator. Naive date-times and
/// bare dates are taken as UTC.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let candidate = input.trim().replacen(' ', "T", 1);
    if candidate.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&candidate) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&candidate, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(&candidate, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| obj.get(*key).filter(|value| !value.is_null()))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn normalize_timestamp(value: &Value) -> String {
    if is_falsy(value) {
        return String::new();
    }
    let raw = scalar_text(value);
    match parse_timestamp(&raw) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => raw,
    }
}

fn amount_from_value(value: &Value) -> MoneyCents {
    match value {
        Value::Number(number) => number
            .as_f64()
            .map(MoneyCents::from_major_lossy)
            .unwrap_or(MoneyCents::ZERO),
        Value::String(text) => MoneyCents::parse_lenient(text).unwrap_or(MoneyCents::ZERO),
        _ => MoneyCents::ZERO,
    }
}

fn cents_from_value(value: &Value) -> MoneyCents {
    let cents = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) if text.trim().is_empty() => Some(0.0),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    match cents {
        Some(cents) if cents.is_finite() => MoneyCents::new(cents.round() as i64),
        _ => MoneyCents::ZERO,
    }
}

fn has_debit_marker(obj: &Map<String, Value>) -> bool {
    obj.get("sign").and_then(Value::as_str) == Some("-")
        || obj.get("debito").and_then(Value::as_bool) == Some(true)
}

fn description_text(value: &Value) -> String {
    if is_falsy(value) {
        return String::new();
    }
    scalar_text(value)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::String(text) => text.is_empty(),
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}
