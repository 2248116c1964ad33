//! Row drafts and per-column input coercion.

use tabula_core::{
  row::{Row, Value},
  schema::{Column, ColumnType, Table},
};
use thiserror::Error;

/// A field value that cannot be submitted. Always names the offending column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("{column}: value is required")]
  Empty { column: String },

  #[error("{column}: {input:?} is not an integer")]
  NotInteger { column: String, input: String },

  #[error("{column}: {input:?} is not a real number")]
  NotReal { column: String, input: String },
}

impl ValidationError {
  pub fn column(&self) -> &str {
    match self {
      Self::Empty { column } | Self::NotInteger { column, .. } | Self::NotReal { column, .. } => {
        column
      }
    }
  }
}

/// Coerce one raw field against its column's declared type.
///
/// Whitespace-only input counts as empty. Numeric types parse the trimmed
/// text; TEXT and undeclared types keep the input verbatim.
pub fn coerce(column: &Column, input: &str) -> Result<Value, ValidationError> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Err(ValidationError::Empty { column: column.name.clone() });
  }
  match column.column_type {
    ColumnType::Integer => trimmed
      .parse::<i64>()
      .map(Value::Integer)
      .map_err(|_| ValidationError::NotInteger {
        column: column.name.clone(),
        input:  input.to_owned(),
      }),
    ColumnType::Real => match trimmed.parse::<f64>() {
      Ok(r) if r.is_finite() => Ok(Value::Real(r)),
      _ => Err(ValidationError::NotReal {
        column: column.name.clone(),
        input:  input.to_owned(),
      }),
    },
    ColumnType::Text | ColumnType::Other(_) => Ok(Value::Text(input.to_owned())),
  }
}

// ─── Draft ────────────────────────────────────────────────────────────────────

/// Uncommitted field text for one row, one entry per column in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
  fields: Vec<String>,
}

impl Draft {
  /// An all-empty draft for an insert.
  pub fn empty(table: &Table) -> Self {
    Self { fields: vec![String::new(); table.columns.len()] }
  }

  /// Pre-fill from a row's current values; nulls and missing cells become
  /// empty fields.
  pub fn from_row(table: &Table, row: &Row) -> Self {
    let fields = table
      .column_names()
      .map(|c| row.get(c).map(Value::to_string).unwrap_or_default())
      .collect();
    Self { fields }
  }

  pub fn fields(&self) -> &[String] { &self.fields }

  pub fn field(&self, index: usize) -> Option<&str> { self.fields.get(index).map(String::as_str) }

  pub fn set(&mut self, index: usize, text: impl Into<String>) {
    if let Some(field) = self.fields.get_mut(index) {
      *field = text.into();
    }
  }

  pub fn push_char(&mut self, index: usize, c: char) {
    if let Some(field) = self.fields.get_mut(index) {
      field.push(c);
    }
  }

  pub fn pop_char(&mut self, index: usize) {
    if let Some(field) = self.fields.get_mut(index) {
      field.pop();
    }
  }

  /// Coerce every field in column order, stopping at the first failure.
  pub fn coerce(&self, table: &Table) -> Result<Row, ValidationError> {
    let mut cells = Vec::with_capacity(table.columns.len());
    for (i, column) in table.columns.iter().enumerate() {
      let input = self.fields.get(i).map(String::as_str).unwrap_or_default();
      cells.push((column.name.clone(), coerce(column, input)?));
    }
    Ok(cells.into_iter().collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn table() -> Table {
    Table {
      name:    "T".into(),
      columns: vec![
        Column::new("n", ColumnType::Integer),
        Column::new("r", ColumnType::Real),
        Column::new("t", ColumnType::Text),
        Column::new("o", ColumnType::Other("BLOB".into())),
      ],
    }
  }

  #[test]
  fn integer_parses_trimmed_text() {
    let col = Column::new("n", ColumnType::Integer);
    assert_eq!(coerce(&col, "7"), Ok(Value::Integer(7)));
    assert_eq!(coerce(&col, " -12 "), Ok(Value::Integer(-12)));
    for bad in ["abc", "7.5", "1e3", "99999999999999999999"] {
      assert_eq!(
        coerce(&col, bad),
        Err(ValidationError::NotInteger { column: "n".into(), input: bad.into() })
      );
    }
  }

  #[test]
  fn real_must_be_finite() {
    let col = Column::new("r", ColumnType::Real);
    assert_eq!(coerce(&col, "2.5"), Ok(Value::Real(2.5)));
    assert_eq!(coerce(&col, "3"), Ok(Value::Real(3.0)));
    for bad in ["abc", "inf", "NaN", "1e400"] {
      assert!(matches!(coerce(&col, bad), Err(ValidationError::NotReal { .. })), "{bad}");
    }
  }

  #[test]
  fn text_and_other_pass_through_unchanged() {
    let text = Column::new("t", ColumnType::Text);
    let other = Column::new("o", ColumnType::Other(String::new()));
    assert_eq!(coerce(&text, " padded "), Ok(Value::Text(" padded ".into())));
    assert_eq!(coerce(&other, "42"), Ok(Value::Text("42".into())));
  }

  #[test]
  fn empty_input_names_the_column_for_every_type() {
    for column in table().columns {
      for input in ["", "   "] {
        let err = coerce(&column, input).unwrap_err();
        assert_eq!(err, ValidationError::Empty { column: column.name.clone() });
        assert_eq!(err.column(), column.name);
      }
    }
  }

  #[test]
  fn draft_coerce_stops_at_first_bad_field() {
    let table = table();
    let mut draft = Draft::empty(&table);
    draft.set(0, "x");
    draft.set(1, "");
    let err = draft.coerce(&table).unwrap_err();
    assert_eq!(err.column(), "n");

    draft.set(0, "1");
    draft.set(1, "0.5");
    draft.set(2, "hi");
    draft.set(3, "raw");
    let row = draft.coerce(&table).unwrap();
    assert_eq!(row.columns().collect::<Vec<_>>(), ["n", "r", "t", "o"]);
    assert_eq!(row.get("n"), Some(&Value::Integer(1)));
    assert_eq!(row.get("r"), Some(&Value::Real(0.5)));
  }

  #[test]
  fn draft_from_row_renders_null_as_empty() {
    let table = table();
    let row: Row = [
      ("n", Value::Integer(3)),
      ("r", Value::Null),
      ("t", Value::from("a")),
    ]
    .into_iter()
    .collect();
    let draft = Draft::from_row(&table, &row);
    assert_eq!(draft.fields(), ["3", "", "a", ""]);
  }

  #[test]
  fn editing_out_of_range_is_ignored() {
    let table = table();
    let mut draft = Draft::empty(&table);
    draft.push_char(0, '4');
    draft.push_char(0, '2');
    draft.pop_char(0);
    draft.push_char(9, 'z');
    assert_eq!(draft.field(0), Some("4"));
    assert_eq!(draft.field(9), None);
  }
}
