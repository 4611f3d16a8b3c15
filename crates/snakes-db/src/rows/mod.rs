//! Row → JSON conversion, one decoder per backend.
//!
//! Rows are handed to clients as opaque JSON objects keyed by column name.
//! Column order is kept (serde_json is built with `preserve_order`).
//!
//! | column | JSON |
//! |---|---|
//! | NULL | `null` |
//! | integer kinds (incl. MySQL `TINYINT(1)`, `YEAR`, `BIT`) | number |
//! | float kinds | number (`null` when not finite) |
//! | boolean (PostgreSQL `BOOL`) | `true` / `false` |
//! | decimal / numeric | string, exact digits |
//! | date | `YYYY-MM-DD` |
//! | datetime / timestamp | RFC 3339, milliseconds, UTC |
//! | time | `HH:MM:SS[.fff]` |
//! | JSON documents | embedded JSON |
//! | UUID | hyphenated string |
//! | text, enum, set | string |
//! | binary | base64 string |

pub mod any;
pub mod mysql;
pub mod postgres;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{NaiveDateTime, SecondsFormat};
use serde_json::{Number, Value};

/// One row as a JSON object keyed by column name.
pub type JsonRow = serde_json::Map<String, Value>;

fn float(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

fn bytes(raw: &[u8]) -> Value {
    Value::String(STANDARD.encode(raw))
}

/// Zone-less datetimes are read as UTC.
fn datetime(v: NaiveDateTime) -> Value {
    Value::String(v.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// A JSON document stored as text; kept as a plain string if it does not parse.
fn document(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
