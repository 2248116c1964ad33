//! Conversions between Tabula cell values and SQLite's dynamic types, plus
//! identifier quoting.
//!
//! BLOBs have no [`Value`] variant; they are read out as standard base64 text
//! and decoded back to bytes when bound against a BLOB column.

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rusqlite::types::{Value as SqlValue, ValueRef};
use tabula_core::{row::Value, schema::ColumnType};

// ─── Identifiers ──────────────────────────────────────────────────────────────

/// Double-quote an identifier, doubling any embedded quotes.
pub fn quote_ident(name: &str) -> String {
  format!("\"{}\"", name.replace('"', "\"\""))
}

// ─── Values ───────────────────────────────────────────────────────────────────

fn encode_value(v: &Value) -> SqlValue {
  match v {
    Value::Null => SqlValue::Null,
    Value::Integer(i) => SqlValue::Integer(*i),
    Value::Real(r) => SqlValue::Real(*r),
    Value::Text(s) => SqlValue::Text(s.clone()),
  }
}

/// Encode a cell bound for a column of type `column_type`. Text bound for a
/// BLOB column must be base64.
pub fn encode_for_column(
  v: &Value,
  column_type: &ColumnType,
) -> Result<SqlValue, base64::DecodeError> {
  match v {
    Value::Text(s) if column_type.is_blob() => B64.decode(s).map(SqlValue::Blob),
    _ => Ok(encode_value(v)),
  }
}

pub fn decode_value(v: ValueRef<'_>) -> Value {
  match v {
    ValueRef::Null => Value::Null,
    ValueRef::Integer(i) => Value::Integer(i),
    ValueRef::Real(r) => Value::Real(r),
    ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
    ValueRef::Blob(b) => Value::Text(B64.encode(b)),
  }
}
