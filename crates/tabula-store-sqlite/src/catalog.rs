//! Synchronous catalogue lookups, run inside `tokio_rusqlite` closures.
//!
//! Every table or column name that reaches generated SQL is checked here
//! first, then quoted.

use rusqlite::Connection;
use tabula_core::row::Row;

use crate::{Error, Result, encode::quote_ident};

/// User tables in catalogue order; SQLite's internal tables are skipped.
pub fn table_names(conn: &Connection) -> Result<Vec<String>> {
  let mut stmt = conn.prepare(
    "SELECT name FROM sqlite_master
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
     ORDER BY rowid",
  )?;
  let names = stmt
    .query_map([], |r| r.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(names)
}

/// `(name, declared type)` per column, in declaration order.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<(String, String)>> {
  check_table(conn, table)?;
  let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
  let columns = stmt
    .query_map([], |r| Ok((r.get::<_, String>(1)?, r.get::<_, String>(2)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(columns)
}

pub fn column_names(conn: &Connection, table: &str) -> Result<Vec<String>> {
  Ok(
    table_columns(conn, table)?
      .into_iter()
      .map(|(name, _)| name)
      .collect(),
  )
}

pub fn check_table(conn: &Connection, table: &str) -> Result<()> {
  if table_names(conn)?.iter().any(|t| t == table) {
    Ok(())
  } else {
    Err(Error::InvalidTable(table.to_owned()))
  }
}

/// Check that every key of `row` is a column of `table`. With `include_all`,
/// the row must also cover every column.
pub fn check_fields(
  conn: &Connection,
  table: &str,
  row: &Row,
  include_all: bool,
) -> Result<()> {
  let columns = column_names(conn, table)?;
  let bad = |reason: String| Error::BadFields { table: table.to_owned(), reason };

  if let Some(unknown) = row.columns().find(|k| !columns.iter().any(|c| c.as_str() == *k)) {
    return Err(bad(format!("unknown column {unknown:?}")));
  }
  if include_all && row.len() != columns.len() {
    return Err(bad(format!(
      "expected all {} columns, got {}",
      columns.len(),
      row.len()
    )));
  }
  Ok(())
}
