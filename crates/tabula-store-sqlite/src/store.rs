//! [`SqliteStore`] — the SQLite implementation of [`Database`].

use std::{collections::HashMap, path::Path};

use rusqlite::{Connection, OpenFlags, params_from_iter, types::Value as SqlValue};
use tabula_core::{
  join::JoinRequest,
  row::{Row, RowUpdate, Value},
  schema::{ColumnMap, ColumnType, TableData},
  store::Database,
};

use crate::{
  Error, Result,
  catalog::{check_fields, check_table, column_names, table_columns, table_names},
  encode::{decode_value, encode_for_column, quote_ident},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tabula database backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open the existing database at `path`. A missing file is an error, not a
  /// fresh empty database.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
      | OpenFlags::SQLITE_OPEN_URI
      | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = tokio_rusqlite::Connection::open_with_flags(path, flags).await?;
    Ok(Self { conn })
  }

  /// Open an in-memory database — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Ok(Self { conn })
  }

  /// Run a batch of raw SQL, e.g. to seed a fresh database.
  pub async fn execute_batch(&self, sql: impl Into<String>) -> Result<()> {
    let sql = sql.into();
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the connection thread, keeping its typed error.
  async fn with_conn<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }
}

// ─── Database impl ───────────────────────────────────────────────────────────

impl Database for SqliteStore {
  type Error = Error;

  // ── Catalogue ─────────────────────────────────────────────────────────────

  async fn list_tables(&self) -> Result<Vec<String>> {
    self.with_conn(|conn| table_names(conn)).await
  }

  async fn list_columns(&self) -> Result<ColumnMap> {
    self
      .with_conn(|conn| {
        let mut map = ColumnMap::new();
        for table in table_names(conn)? {
          let columns = column_names(conn, &table)?;
          map.insert(table, columns);
        }
        Ok(map)
      })
      .await
  }

  // ── Rows ──────────────────────────────────────────────────────────────────

  async fn fetch_table(&self, table: &str) -> Result<TableData> {
    let table = table.to_owned();
    self
      .with_conn(move |conn| {
        let declared = table_columns(conn, &table)?;
        let columns: Vec<String> = declared.iter().map(|(n, _)| n.clone()).collect();
        let types = declared
          .into_iter()
          .map(|(n, t)| (n, ColumnType::from_declared(&t)))
          .collect();

        let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote_ident(&table)))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
        let data = stmt
          .query_map([], |r| {
            let mut cells = Vec::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
              cells.push((name.clone(), decode_value(r.get_ref(i)?)));
            }
            Ok(cells.into_iter().collect::<Row>())
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(TableData { columns, data, types })
      })
      .await
  }

  async fn insert_row(&self, table: &str, values: &Row) -> Result<()> {
    let table = table.to_owned();
    let values = values.clone();
    self
      .with_conn(move |conn| {
        check_fields(conn, &table, &values, true)?;

        let columns: Vec<String> = values.columns().map(quote_ident).collect();
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
          "INSERT INTO {} ({}) VALUES ({})",
          quote_ident(&table),
          columns.join(", "),
          placeholders.join(", ")
        );
        let params = bind_row(conn, &table, &values)?;
        conn.execute(&sql, params_from_iter(params))?;
        tracing::info!(table = %table, "inserted row");
        Ok(())
      })
      .await
  }

  async fn update_row(&self, table: &str, update: &RowUpdate) -> Result<()> {
    let table = table.to_owned();
    let update = update.clone();
    self
      .with_conn(move |conn| {
        check_fields(conn, &table, &update.values, false)?;
        check_fields(conn, &table, &update.identifiers, false)?;
        require_non_empty(&table, &update.values, "values")?;
        require_non_empty(&table, &update.identifiers, "identifiers")?;

        let n = update.values.len();
        let set_clause = update
          .values
          .columns()
          .enumerate()
          .map(|(i, c)| format!("{} = ?{}", quote_ident(c), i + 1))
          .collect::<Vec<_>>()
          .join(", ");
        let where_clause = where_clause(&update.identifiers, n);
        let sql = format!(
          "UPDATE {} SET {set_clause} WHERE {where_clause}",
          quote_ident(&table)
        );
        let mut params = bind_row(conn, &table, &update.values)?;
        params.extend(bind_row(conn, &table, &update.identifiers)?);
        let changed = conn.execute(&sql, params_from_iter(params))?;
        tracing::info!(table = %table, changed, "updated rows");
        Ok(())
      })
      .await
  }

  async fn delete_row(&self, table: &str, identifiers: &Row) -> Result<()> {
    let table = table.to_owned();
    let identifiers = identifiers.clone();
    self
      .with_conn(move |conn| {
        check_fields(conn, &table, &identifiers, false)?;
        require_non_empty(&table, &identifiers, "identifiers")?;

        let sql = format!(
          "DELETE FROM {} WHERE {}",
          quote_ident(&table),
          where_clause(&identifiers, 0)
        );
        let params = bind_row(conn, &table, &identifiers)?;
        let changed = conn.execute(&sql, params_from_iter(params))?;
        tracing::info!(table = %table, changed, "deleted rows");
        Ok(())
      })
      .await
  }

  // ── Queries ───────────────────────────────────────────────────────────────

  async fn join(&self, request: &JoinRequest) -> Result<Vec<Row>> {
    request.validate()?;
    let request = request.clone();
    self.with_conn(move |conn| run_join(conn, &request)).await
  }
}

// ─── SQL helpers ─────────────────────────────────────────────────────────────

fn require_non_empty(table: &str, row: &Row, what: &str) -> Result<()> {
  if row.is_empty() {
    return Err(Error::BadFields {
      table:  table.to_owned(),
      reason: format!("no {what} given"),
    });
  }
  Ok(())
}

/// Encode `row`'s cells in order, against the declared types of `table`.
fn bind_row(conn: &Connection, table: &str, row: &Row) -> Result<Vec<SqlValue>> {
  let types: HashMap<String, ColumnType> = table_columns(conn, table)?
    .into_iter()
    .map(|(name, declared)| (name, ColumnType::from_declared(&declared)))
    .collect();
  row
    .iter()
    .map(|(column, value)| {
      let column_type = types
        .get(column)
        .cloned()
        .unwrap_or_else(|| ColumnType::Other(String::new()));
      encode_for_column(value, &column_type).map_err(|e| Error::BadFields {
        table:  table.to_owned(),
        reason: format!("column {column:?} holds a blob, not base64 text: {e}"),
      })
    })
    .collect()
}

/// Null-safe equality on every identifier column; placeholders start after
/// `offset` already-bound parameters.
fn where_clause(identifiers: &Row, offset: usize) -> String {
  identifiers
    .columns()
    .enumerate()
    .map(|(i, c)| format!("{} IS ?{}", quote_ident(c), offset + i + 1))
    .collect::<Vec<_>>()
    .join(" AND ")
}

fn run_join(conn: &Connection, request: &JoinRequest) -> Result<Vec<Row>> {
  check_table(conn, &request.primary_table)?;
  for table in &request.secondary_tables {
    check_table(conn, table)?;
  }
  for cond in request.clauses.iter().flatten() {
    for (table, column) in [
      (&cond.left_table, &cond.left_column),
      (&cond.right_table, &cond.right_column),
    ] {
      if !column_names(conn, table)?.contains(column) {
        return Err(Error::BadFields {
          table:  table.clone(),
          reason: format!("unknown join column {column:?}"),
        });
      }
    }
  }

  // Output columns are the primary table's followed by each secondary's, which
  // is the order `SELECT *` yields for a chain of inner joins.
  let mut origin: Vec<(String, String)> = Vec::new();
  for table in std::iter::once(&request.primary_table).chain(&request.secondary_tables) {
    for column in column_names(conn, table)? {
      origin.push((table.clone(), column));
    }
  }

  let mut sql = format!("SELECT * FROM {}", quote_ident(&request.primary_table));
  for (table, group) in request.secondary_tables.iter().zip(&request.clauses) {
    let on = group
      .iter()
      .map(|c| {
        format!(
          "{}.{} = {}.{}",
          quote_ident(&c.left_table),
          quote_ident(&c.left_column),
          quote_ident(&c.right_table),
          quote_ident(&c.right_column)
        )
      })
      .collect::<Vec<_>>()
      .join(" AND ");
    sql.push_str(&format!(" JOIN {} ON {on}", quote_ident(table)));
  }
  tracing::debug!(%sql, "running join");

  let mut stmt = conn.prepare(&sql)?;
  let width = stmt.column_count();
  let rows = stmt
    .query_map([], |r| {
      let mut cells = Vec::with_capacity(width);
      for i in 0..width {
        cells.push(decode_value(r.get_ref(i)?));
      }
      Ok(cells)
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(
    rows
      .into_iter()
      .map(|cells| merge_join_row(&origin, cells))
      .collect(),
  )
}

/// Key each cell by its column name. A repeated name whose value differs from
/// the one already present is keyed `table.column` instead.
fn merge_join_row(origin: &[(String, String)], cells: Vec<Value>) -> Row {
  let mut entries: Vec<(String, Value)> = Vec::with_capacity(cells.len());
  for ((table, column), value) in origin.iter().zip(cells) {
    let clashes = entries
      .iter()
      .any(|(k, existing)| k == column && *existing != value);
    let key = if clashes {
      format!("{table}.{column}")
    } else {
      column.clone()
    };
    entries.push((key, value));
  }
  entries.into_iter().collect()
}
