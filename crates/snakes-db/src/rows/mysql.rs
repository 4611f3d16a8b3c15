//! MySQL / MariaDB rows, read from the native driver.
//!
//! Each column is decoded according to its reported type name. The decoders
//! are invoked unchecked: the type name already picked one that fits, and
//! sqlx's integer decoders read any width the protocol sends.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use super::{JsonRow, bytes, datetime, document, float};

/// How a MySQL column is turned into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Signed,
    Unsigned,
    Float,
    Double,
    Decimal,
    Date,
    DateTime,
    Time,
    Json,
    Bit,
    Binary,
    Text,
}

fn kind(type_name: &str) -> Kind {
    if type_name.ends_with(" UNSIGNED") {
        return Kind::Unsigned;
    }
    match type_name {
        // TINYINT(1) is reported as BOOLEAN; it still holds 0..=255.
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            Kind::Signed
        }
        "FLOAT" => Kind::Float,
        "DOUBLE" => Kind::Double,
        "DECIMAL" => Kind::Decimal,
        "DATE" => Kind::Date,
        "DATETIME" | "TIMESTAMP" => Kind::DateTime,
        "TIME" => Kind::Time,
        "JSON" => Kind::Json,
        "BIT" => Kind::Bit,
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "GEOMETRY" => {
            Kind::Binary
        }
        _ => Kind::Text,
    }
}

/// Convert a whole row, column by column.
pub fn row_to_json(row: &MySqlRow) -> Result<JsonRow, sqlx::Error> {
    let mut map = JsonRow::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        map.insert(
            column.name().to_owned(),
            column_value(row, idx, kind(column.type_info().name()))?,
        );
    }
    Ok(map)
}

pub fn rows_to_json(rows: &[MySqlRow]) -> Result<Vec<JsonRow>, sqlx::Error> {
    rows.iter().map(row_to_json).collect()
}

fn column_value(row: &MySqlRow, idx: usize, kind: Kind) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(Value::Null);
    }
    Ok(match kind {
        Kind::Signed => Value::from(row.try_get_unchecked::<i64, _>(idx)?),
        Kind::Unsigned => Value::from(row.try_get_unchecked::<u64, _>(idx)?),
        Kind::Float => float(f64::from(row.try_get_unchecked::<f32, _>(idx)?)),
        Kind::Double => float(row.try_get_unchecked::<f64, _>(idx)?),
        Kind::Decimal => Value::String(row.try_get_unchecked::<String, _>(idx)?),
        Kind::Date => Value::String(
            row.try_get_unchecked::<NaiveDate, _>(idx)?
                .format("%Y-%m-%d")
                .to_string(),
        ),
        Kind::DateTime => datetime(row.try_get_unchecked::<NaiveDateTime, _>(idx)?),
        Kind::Time => Value::String(row.try_get_unchecked::<NaiveTime, _>(idx)?.to_string()),
        Kind::Json => document(row.try_get_unchecked::<String, _>(idx)?),
        Kind::Bit => Value::from(bits(&row.try_get_unchecked::<Vec<u8>, _>(idx)?)),
        Kind::Binary => bytes(&row.try_get_unchecked::<Vec<u8>, _>(idx)?),
        Kind::Text => Value::String(row.try_get_unchecked::<String, _>(idx)?),
    })
}

/// `BIT(n)` arrives as big-endian bytes, at most 8 of them.
fn bits(raw: &[u8]) -> u64 {
    raw.iter().fold(0, |acc, b| (acc << 8) | u64::from(*b))
}
