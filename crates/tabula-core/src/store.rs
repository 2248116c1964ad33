//! The `Database` trait.
//!
//! Implemented on both sides of the wire: by `tabula-store-sqlite` over a real
//! SQLite file, and by the terminal client's HTTP `ApiClient`. The JSON API
//! serves any implementation, and the client's controllers consume any
//! implementation, so tests can swap either end.

use std::future::Future;

use crate::{
  join::JoinRequest,
  row::{Row, RowUpdate},
  schema::{ColumnMap, TableData},
};

/// Lets the HTTP layer tell a caller's mistake from a backend failure
/// without knowing the concrete error type.
pub trait ClassifyError {
  /// `true` when the request named an unknown table or column, carried the
  /// wrong fields, or was otherwise malformed.
  fn is_invalid_request(&self) -> bool;
}

/// Abstraction over a relational database exposed table by table.
///
/// Rows are addressed by their full identifier snapshot; there is no primary
/// key. All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait Database: Send + Sync {
  type Error: std::error::Error + ClassifyError + Send + Sync + 'static;

  // ── Catalogue ─────────────────────────────────────────────────────────

  /// Every user table, in catalogue order.
  fn list_tables(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Every user table's ordered column names.
  fn list_columns(
    &self,
  ) -> impl Future<Output = Result<ColumnMap, Self::Error>> + Send + '_;

  // ── Rows ──────────────────────────────────────────────────────────────

  /// Columns, declared types and all rows of `table`.
  fn fetch_table<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<TableData, Self::Error>> + Send + 'a;

  /// Insert a row; `values` must name every column of `table`.
  fn insert_row<'a>(
    &'a self,
    table: &'a str,
    values: &'a Row,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Replace every row matching `update.identifiers` with `update.values`.
  fn update_row<'a>(
    &'a self,
    table: &'a str,
    update: &'a RowUpdate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete every row matching `identifiers`.
  fn delete_row<'a>(
    &'a self,
    table: &'a str,
    identifiers: &'a Row,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Queries ───────────────────────────────────────────────────────────

  /// Inner-join `request.primary_table` with each secondary table in order.
  fn join<'a>(
    &'a self,
    request: &'a JoinRequest,
  ) -> impl Future<Output = Result<Vec<Row>, Self::Error>> + Send + 'a;
}
