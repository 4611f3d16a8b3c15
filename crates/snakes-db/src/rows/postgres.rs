//! PostgreSQL rows, read from the native driver.
//!
//! PostgreSQL decoders are strict about widths, so each column is read with the
//! Rust type matching its reported type name. `NUMERIC` is rendered from its
//! wire form so no digits are lost.

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde_json::Value;
use sqlx::postgres::{PgRow, PgValueFormat, PgValueRef};
use sqlx::types::{JsonValue, Uuid};
use sqlx::{Column, Row, TypeInfo, ValueRef};

use super::{JsonRow, bytes, datetime, float};

/// How a PostgreSQL column is turned into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Uuid,
    Json,
    Bytea,
    Text,
}

fn kind(type_name: &str) -> Kind {
    match type_name {
        "BOOL" => Kind::Bool,
        "INT2" => Kind::Int2,
        "INT4" => Kind::Int4,
        "INT8" => Kind::Int8,
        "FLOAT4" => Kind::Float4,
        "FLOAT8" => Kind::Float8,
        "NUMERIC" => Kind::Numeric,
        "DATE" => Kind::Date,
        "TIME" => Kind::Time,
        "TIMESTAMP" => Kind::Timestamp,
        "TIMESTAMPTZ" => Kind::TimestampTz,
        "UUID" => Kind::Uuid,
        "JSON" | "JSONB" => Kind::Json,
        "BYTEA" => Kind::Bytea,
        // TEXT, VARCHAR, BPCHAR, NAME, CITEXT and user-defined enums.
        _ => Kind::Text,
    }
}

/// Convert a whole row, column by column.
pub fn row_to_json(row: &PgRow) -> Result<JsonRow, sqlx::Error> {
    let mut map = JsonRow::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        map.insert(
            column.name().to_owned(),
            column_value(row, idx, kind(column.type_info().name()))?,
        );
    }
    Ok(map)
}

pub fn rows_to_json(rows: &[PgRow]) -> Result<Vec<JsonRow>, sqlx::Error> {
    rows.iter().map(row_to_json).collect()
}

fn column_value(row: &PgRow, idx: usize, kind: Kind) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    Ok(match kind {
        Kind::Bool => Value::Bool(row.try_get(idx)?),
        Kind::Int2 => Value::from(row.try_get::<i16, _>(idx)?),
        Kind::Int4 => Value::from(row.try_get::<i32, _>(idx)?),
        Kind::Int8 => Value::from(row.try_get::<i64, _>(idx)?),
        Kind::Float4 => float(f64::from(row.try_get::<f32, _>(idx)?)),
        Kind::Float8 => float(row.try_get::<f64, _>(idx)?),
        Kind::Numeric => Value::String(numeric(raw, idx)?),
        Kind::Date => Value::String(row.try_get::<NaiveDate, _>(idx)?.format("%Y-%m-%d").to_string()),
        Kind::Time => Value::String(row.try_get::<NaiveTime, _>(idx)?.to_string()),
        Kind::Timestamp => datetime(row.try_get::<NaiveDateTime, _>(idx)?),
        Kind::TimestampTz => Value::String(
            row.try_get::<DateTime<Utc>, _>(idx)?
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
        Kind::Uuid => Value::String(row.try_get::<Uuid, _>(idx)?.hyphenated().to_string()),
        Kind::Json => row.try_get::<JsonValue, _>(idx)?,
        Kind::Bytea => bytes(&row.try_get::<Vec<u8>, _>(idx)?),
        Kind::Text => Value::String(row.try_get_unchecked::<String, _>(idx)?),
    })
}

fn numeric(raw: PgValueRef<'_>, idx: usize) -> Result<String, sqlx::Error> {
    let decoded = match raw.format() {
        PgValueFormat::Text => raw.as_str().ok().map(str::to_owned),
        PgValueFormat::Binary => raw.as_bytes().ok().and_then(numeric_text),
    };
    decoded.ok_or_else(|| sqlx::Error::ColumnDecode {
        index: idx.to_string(),
        source: "malformed NUMERIC value".into(),
    })
}

/// Render a binary `NUMERIC`: a header of digit count, weight, sign and display
/// scale, then base-10000 digit groups, most significant first.
fn numeric_text(buf: &[u8]) -> Option<String> {
    let word = |at: usize| Some(u16::from_be_bytes([*buf.get(at)?, *buf.get(at + 1)?]));

    let ndigits = usize::from(word(0)?);
    let weight = i32::from(word(2)? as i16);
    let sign = word(4)?;
    let scale = usize::from(word(6)?);
    if buf.len() != 8 + 2 * ndigits {
        return None;
    }
    let digits: Vec<u16> = (0..ndigits).map(|i| word(8 + 2 * i)).collect::<Option<_>>()?;
    let group = |i: i32| {
        usize::try_from(i)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    match sign {
        0x0000 => {}
        0x4000 => out.push('-'),
        0xC000 => return Some("NaN".into()),
        0xD000 => return Some("Infinity".into()),
        0xF000 => return Some("-Infinity".into()),
        _ => return None,
    }

    if weight < 0 {
        out.push('0');
    } else {
        let _ = write!(out, "{}", group(0));
        for i in 1..=weight {
            let _ = write!(out, "{:04}", group(i));
        }
    }

    if scale > 0 {
        let mut fraction = String::with_capacity(scale + 4);
        let mut i = weight + 1;
        while fraction.len() < scale {
            let _ = write!(fraction, "{:04}", group(i));
            i += 1;
        }
        fraction.truncate(scale);
        out.push('.');
        out.push_str(&fraction);
    }

    Some(out)
}
