//! Table and column metadata discovered at runtime.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::row::Row;

// ─── Column types ────────────────────────────────────────────────────────────

/// The declared type of a column, as reported by the backend.
///
/// Only the three names the editor coerces against are distinguished; every
/// other declaration is kept verbatim in [`ColumnType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnType {
  Integer,
  Real,
  Text,
  Other(String),
}

impl ColumnType {
  /// Classify a declared type string, case-insensitively.
  pub fn from_declared(declared: &str) -> Self {
    match declared.to_ascii_uppercase().as_str() {
      "INTEGER" => Self::Integer,
      "REAL" => Self::Real,
      "TEXT" => Self::Text,
      _ => Self::Other(declared.to_owned()),
    }
  }

  /// Columns declared with a BLOB type. Their cells travel as base64 text.
  pub fn is_blob(&self) -> bool {
    matches!(self, Self::Other(raw) if raw.to_ascii_uppercase().contains("BLOB"))
  }

  pub fn as_declared(&self) -> &str {
    match self {
      Self::Integer => "INTEGER",
      Self::Real => "REAL",
      Self::Text => "TEXT",
      Self::Other(raw) => raw,
    }
  }
}

impl From<String> for ColumnType {
  fn from(s: String) -> Self { Self::from_declared(&s) }
}

impl From<ColumnType> for String {
  fn from(t: ColumnType) -> Self { t.as_declared().to_owned() }
}

// ─── Columns and tables ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
  pub name:        String,
  pub column_type: ColumnType,
}

impl Column {
  pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
    Self { name: name.into(), column_type }
  }
}

/// A named relation with its ordered, typed column schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
  pub name:    String,
  pub columns: Vec<Column>,
}

impl Table {
  pub fn column_names(&self) -> impl Iterator<Item = &str> {
    self.columns.iter().map(|c| c.name.as_str())
  }
}

/// Table name → ordered column names; the shape the join builder consumes.
pub type ColumnMap = BTreeMap<String, Vec<String>>;

// ─── Table data ──────────────────────────────────────────────────────────────

/// Response of the fetch-table-data call: the ordered column names, every row,
/// and the declared type of each column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
  pub columns: Vec<String>,
  pub data:    Vec<Row>,
  /// Columns missing from this map are treated as untyped.
  #[serde(default)]
  pub types:   BTreeMap<String, ColumnType>,
}

impl TableData {
  /// Pair each column with its declared type, in column order.
  pub fn table(&self, name: impl Into<String>) -> Table {
    let columns = self
      .columns
      .iter()
      .map(|c| {
        let column_type = self
          .types
          .get(c)
          .cloned()
          .unwrap_or_else(|| ColumnType::Other(String::new()));
        Column::new(c.clone(), column_type)
      })
      .collect();
    Table { name: name.into(), columns }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn declared_types_match_case_insensitively() {
    assert_eq!(ColumnType::from_declared("integer"), ColumnType::Integer);
    assert_eq!(ColumnType::from_declared("Real"), ColumnType::Real);
    assert_eq!(ColumnType::from_declared("TEXT"), ColumnType::Text);
    assert_eq!(
      ColumnType::from_declared("VARCHAR(20)"),
      ColumnType::Other("VARCHAR(20)".into())
    );
  }

  #[test]
  fn blob_declarations_are_recognised() {
    assert!(ColumnType::from_declared("BLOB").is_blob());
    assert!(ColumnType::from_declared("longblob").is_blob());
    assert!(!ColumnType::from_declared("").is_blob());
    assert!(!ColumnType::Text.is_blob());
  }

  #[test]
  fn table_data_pairs_columns_with_types_in_order() {
    let data: TableData = serde_json::from_str(
      r#"{"columns":["name","id","blob"],"data":[],"types":{"id":"INTEGER","name":"TEXT"}}"#,
    )
    .unwrap();
    let table = data.table("A");
    assert_eq!(table.column_names().collect::<Vec<_>>(), ["name", "id", "blob"]);
    assert_eq!(table.columns[0].column_type, ColumnType::Text);
    assert_eq!(table.columns[1].column_type, ColumnType::Integer);
    assert_eq!(table.columns[2].column_type, ColumnType::Other(String::new()));
  }
}
