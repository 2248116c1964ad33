//! In-process recording `Database` for controller tests.

use std::sync::{
  Mutex, MutexGuard,
  atomic::{AtomicBool, Ordering},
};

use tabula_core::{
  join::JoinRequest,
  row::{Row, RowUpdate, Value},
  schema::{ColumnMap, ColumnType, TableData},
  store::{ClassifyError, Database},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("fake backend failure")]
pub struct FakeError;

impl ClassifyError for FakeError {
  fn is_invalid_request(&self) -> bool { false }
}

/// One recorded call, with the exact payload it carried.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
  ListTables,
  ListColumns,
  FetchTable(String),
  Insert(String, Row),
  Update(String, RowUpdate),
  Delete(String, Row),
  Join(JoinRequest),
}

/// Tables held in memory. Mutations apply with full-snapshot matching so a
/// refetch observes them.
#[derive(Default)]
pub struct FakeDb {
  tables:        Mutex<Vec<(String, TableData)>>,
  calls:         Mutex<Vec<Call>>,
  join_rows:     Mutex<Vec<Row>>,
  failing:       AtomicBool,
  failing_fetch: AtomicBool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
  m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl FakeDb {
  /// `A(id INTEGER, name TEXT)`, `B(id INTEGER, aid INTEGER)` and
  /// `C(id INTEGER, score REAL, note VARCHAR)`, one row in `A`.
  pub fn three_tables() -> Self {
    let db = Self::default();
    db.add_table(
      "A",
      &[("id", "INTEGER"), ("name", "TEXT")],
      vec![row(&[("id", Value::Integer(1)), ("name", Value::from("x"))])],
    );
    db.add_table("B", &[("id", "INTEGER"), ("aid", "INTEGER")], vec![]);
    db.add_table(
      "C",
      &[("id", "INTEGER"), ("score", "REAL"), ("note", "VARCHAR")],
      vec![],
    );
    db
  }

  pub fn add_table(&self, name: &str, columns: &[(&str, &str)], data: Vec<Row>) {
    let table = TableData {
      columns: columns.iter().map(|(c, _)| (*c).to_owned()).collect(),
      data,
      types: columns
        .iter()
        .map(|(c, t)| ((*c).to_owned(), ColumnType::from_declared(t)))
        .collect(),
    };
    lock(&self.tables).push((name.to_owned(), table));
  }

  pub fn set_failing(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

  /// Fail only `fetch_table`, so mutations succeed but their refetch does not.
  pub fn set_failing_fetch(&self, failing: bool) {
    self.failing_fetch.store(failing, Ordering::SeqCst);
  }

  pub fn set_join_rows(&self, rows: Vec<Row>) { *lock(&self.join_rows) = rows; }

  pub fn calls(&self) -> Vec<Call> { lock(&self.calls).clone() }

  pub fn clear_calls(&self) { lock(&self.calls).clear(); }

  pub fn rows(&self, table: &str) -> Vec<Row> {
    lock(&self.tables)
      .iter()
      .find(|(n, _)| n == table)
      .map(|(_, t)| t.data.clone())
      .unwrap_or_default()
  }

  fn record(&self, call: Call) -> Result<(), FakeError> {
    lock(&self.calls).push(call);
    if self.failing.load(Ordering::SeqCst) {
      return Err(FakeError);
    }
    Ok(())
  }

  fn with_table<T>(&self, table: &str, f: impl FnOnce(&mut TableData) -> T) -> Result<T, FakeError> {
    let mut tables = lock(&self.tables);
    let (_, data) = tables.iter_mut().find(|(n, _)| n == table).ok_or(FakeError)?;
    Ok(f(data))
  }
}

pub fn row(cells: &[(&str, Value)]) -> Row { cells.iter().cloned().collect() }

fn matches(row: &Row, identifiers: &Row) -> bool {
  identifiers.iter().all(|(c, v)| row.get(c) == Some(v))
}

impl Database for FakeDb {
  type Error = FakeError;

  async fn list_tables(&self) -> Result<Vec<String>, FakeError> {
    self.record(Call::ListTables)?;
    Ok(lock(&self.tables).iter().map(|(n, _)| n.clone()).collect())
  }

  async fn list_columns(&self) -> Result<ColumnMap, FakeError> {
    self.record(Call::ListColumns)?;
    Ok(
      lock(&self.tables)
        .iter()
        .map(|(n, t)| (n.clone(), t.columns.clone()))
        .collect(),
    )
  }

  async fn fetch_table(&self, table: &str) -> Result<TableData, FakeError> {
    self.record(Call::FetchTable(table.to_owned()))?;
    if self.failing_fetch.load(Ordering::SeqCst) {
      return Err(FakeError);
    }
    self.with_table(table, |t| t.clone())
  }

  async fn insert_row(&self, table: &str, values: &Row) -> Result<(), FakeError> {
    self.record(Call::Insert(table.to_owned(), values.clone()))?;
    self.with_table(table, |t| t.data.push(values.clone()))
  }

  async fn update_row(&self, table: &str, update: &RowUpdate) -> Result<(), FakeError> {
    self.record(Call::Update(table.to_owned(), update.clone()))?;
    self.with_table(table, |t| {
      for r in t.data.iter_mut().filter(|r| matches(r, &update.identifiers)) {
        let merged: Row = r
          .iter()
          .map(|(c, v)| (c, update.values.get(c).unwrap_or(v).clone()))
          .collect();
        *r = merged;
      }
    })
  }

  async fn delete_row(&self, table: &str, identifiers: &Row) -> Result<(), FakeError> {
    self.record(Call::Delete(table.to_owned(), identifiers.clone()))?;
    self.with_table(table, |t| t.data.retain(|r| !matches(r, identifiers)))
  }

  async fn join(&self, request: &JoinRequest) -> Result<Vec<Row>, FakeError> {
    self.record(Call::Join(request.clone()))?;
    Ok(lock(&self.join_rows).clone())
  }
}
