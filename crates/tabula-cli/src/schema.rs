//! Per-view cache of table and column metadata.

use std::collections::HashMap;

use tabula_core::{
  schema::{ColumnMap, Table, TableData},
  store::Database,
};

/// Holds the table list, the name-only column map used by joins and the
/// typed schema of each table fetched for editing.
///
/// Entries are replaced wholesale on every load. A failed load unsets the
/// entry it was loading and returns the error; nothing is retried.
#[derive(Debug, Default, Clone)]
pub struct SchemaCache {
  tables:  Option<Vec<String>>,
  columns: Option<ColumnMap>,
  schemas: HashMap<String, Table>,
}

impl SchemaCache {
  pub fn new() -> Self { Self::default() }

  // ── Loading ───────────────────────────────────────────────────────────────

  pub async fn load_tables<D: Database>(&mut self, db: &D) -> Result<&[String], D::Error> {
    self.tables = None;
    let tables = db.list_tables().await?;
    Ok(self.tables.insert(tables).as_slice())
  }

  pub async fn load_columns<D: Database>(&mut self, db: &D) -> Result<&ColumnMap, D::Error> {
    self.columns = None;
    let columns = db.list_columns().await?;
    Ok(&*self.columns.insert(columns))
  }

  /// Fetch `table`'s data, storing its typed schema. The rows are handed back
  /// to the caller rather than cached.
  pub async fn load_table<D: Database>(
    &mut self,
    db: &D,
    table: &str,
  ) -> Result<TableData, D::Error> {
    self.schemas.remove(table);
    let data = db.fetch_table(table).await?;
    self.schemas.insert(table.to_owned(), data.table(table));
    Ok(data)
  }

  /// Drop the typed schema of `table`, e.g. after its data went stale.
  pub fn forget(&mut self, table: &str) { self.schemas.remove(table); }

  // ── Accessors ─────────────────────────────────────────────────────────────

  pub fn tables(&self) -> &[String] { self.tables.as_deref().unwrap_or_default() }

  pub fn table_count(&self) -> usize { self.tables().len() }

  pub fn contains(&self, table: &str) -> bool { self.tables().iter().any(|t| t == table) }

  /// Column names of `table`, in declaration order.
  pub fn columns_of(&self, table: &str) -> Option<&[String]> {
    self.columns.as_ref()?.get(table).map(Vec::as_slice)
  }

  pub fn schema_of(&self, table: &str) -> Option<&Table> { self.schemas.get(table) }
}
