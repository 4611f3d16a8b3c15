//! SQLite rows, read through `sqlx::Any`.
//!
//! `Any` only decodes primitives (integers, floats, bool, text, bytes). SQLite
//! stores nothing else, so each column is decoded into the first primitive it
//! accepts.

use serde_json::Value;
use sqlx::{Column, Row, ValueRef, any::AnyRow};

use super::{JsonRow, bytes, float};

/// Convert a whole row, column by column.
pub fn row_to_json(row: &AnyRow) -> Result<JsonRow, sqlx::Error> {
    let mut map = JsonRow::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_owned(), column_value(row, idx)?);
    }
    Ok(map)
}

pub fn rows_to_json(rows: &[AnyRow]) -> Result<Vec<JsonRow>, sqlx::Error> {
    rows.iter().map(row_to_json).collect()
}

fn column_value(row: &AnyRow, idx: usize) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(Value::Null);
    }
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return Ok(Value::from(v));
    }
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return Ok(float(v));
    }
    if let Ok(v) = row.try_get::<f32, _>(idx) {
        return Ok(float(f64::from(v)));
    }
    if let Ok(v) = row.try_get::<bool, _>(idx) {
        return Ok(Value::Bool(v));
    }
    if let Ok(v) = row.try_get::<String, _>(idx) {
        return Ok(Value::String(v));
    }
    // Last resort; its error names the column and type when nothing fits.
    let raw: Vec<u8> = row.try_get(idx)?;
    Ok(bytes(&raw))
}
