//! Schema-driven row editor for a single table.
//!
//! Each fetched row is `Viewing` until an edit begins, at which point a
//! [`Draft`] pre-filled from its values shadows it. A separate insert slot
//! holds at most one pending new row. Every successful mutation discards all
//! drafts and refetches the whole table; nothing is patched locally.

use std::collections::BTreeMap;

use tabula_core::{
  row::{Row, RowUpdate},
  schema::Table,
  store::Database,
};
use thiserror::Error;

use crate::{
  form::{Draft, ValidationError},
  schema::SchemaCache,
};

/// Status text for any failed server call.
pub const REQUEST_FAILED: &str = "Request failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
  Viewing,
  Editing,
  InsertPending,
}

/// Addresses either a fetched row (by position) or the insert slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
  Row(usize),
  Insert,
}

#[derive(Debug, Error)]
pub enum CrudError {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("Request failed")]
  Network,

  #[error("no row {0}")]
  NoSuchRow(usize),

  #[error("row {0} is not being edited")]
  NotEditing(usize),

  #[error("an insert is already pending")]
  InsertPending,

  #[error("no insert is pending")]
  NoInsert,

  #[error("table schema is not loaded")]
  NotLoaded,
}

// ─── View model ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
  pub text: String,
  /// Set for a fetched `NULL`, which renders as empty text.
  pub null: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
  pub state: RowState,
  pub cells: Vec<Cell>,
}

/// Everything the table screen draws, derived from controller state alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
  pub header:         Vec<String>,
  /// Fetched rows in order, then the insert row when one is pending.
  pub rows:           Vec<RowView>,
  pub insert_enabled: bool,
  pub error:          Option<String>,
}

/// Build the table view. Pure: identical inputs give identical output.
pub fn render(
  schema: Option<&Table>,
  rows: &[Row],
  drafts: &BTreeMap<usize, Draft>,
  insert: Option<&Draft>,
  error: Option<&str>,
) -> TableView {
  let header: Vec<String> = schema
    .map(|t| t.column_names().map(str::to_owned).collect())
    .unwrap_or_default();

  let draft_cells = |draft: &Draft| -> Vec<Cell> {
    draft
      .fields()
      .iter()
      .map(|text| Cell { text: text.clone(), null: false })
      .collect()
  };

  let mut views: Vec<RowView> = rows
    .iter()
    .enumerate()
    .map(|(i, row)| match drafts.get(&i) {
      Some(draft) => RowView { state: RowState::Editing, cells: draft_cells(draft) },
      None => RowView {
        state: RowState::Viewing,
        cells: header
          .iter()
          .map(|c| match row.get(c) {
            Some(v) => Cell { text: v.to_string(), null: v.is_null() },
            None => Cell { text: String::new(), null: true },
          })
          .collect(),
      },
    })
    .collect();

  if let Some(draft) = insert {
    views.push(RowView { state: RowState::InsertPending, cells: draft_cells(draft) });
  }

  TableView {
    header,
    rows: views,
    insert_enabled: schema.is_some() && insert.is_none(),
    error: error.map(str::to_owned),
  }
}

// ─── Controller ──────────────────────────────────────────────────────────────

pub struct CrudTableController {
  name:   String,
  cache:  SchemaCache,
  rows:   Vec<Row>,
  drafts: BTreeMap<usize, Draft>,
  insert: Option<Draft>,
  error:  Option<String>,
}

impl CrudTableController {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name:   name.into(),
      cache:  SchemaCache::new(),
      rows:   Vec::new(),
      drafts: BTreeMap::new(),
      insert: None,
      error:  None,
    }
  }

  pub fn name(&self) -> &str { &self.name }

  pub fn rows(&self) -> &[Row] { &self.rows }

  pub fn schema(&self) -> Option<&Table> { self.cache.schema_of(&self.name) }

  pub fn error(&self) -> Option<&str> { self.error.as_deref() }

  pub fn state(&self, slot: Slot) -> Option<RowState> {
    match slot {
      Slot::Row(i) if i < self.rows.len() => Some(if self.drafts.contains_key(&i) {
        RowState::Editing
      } else {
        RowState::Viewing
      }),
      Slot::Row(_) => None,
      Slot::Insert => self.insert.as_ref().map(|_| RowState::InsertPending),
    }
  }

  pub fn insert_enabled(&self) -> bool { self.schema().is_some() && self.insert.is_none() }

  pub fn view(&self) -> TableView {
    render(
      self.schema(),
      &self.rows,
      &self.drafts,
      self.insert.as_ref(),
      self.error.as_deref(),
    )
  }

  // ── Loading ───────────────────────────────────────────────────────────────

  /// Populate the schema and rows for a fresh view of the table.
  pub async fn activate<D: Database>(&mut self, db: &D) -> Result<(), CrudError> {
    self.refetch(db).await
  }

  /// Replace every row with a fresh fetch, discarding all drafts.
  ///
  /// On failure the stale rows are dropped too, so the view never shows
  /// data the server may no longer hold.
  pub async fn refetch<D: Database>(&mut self, db: &D) -> Result<(), CrudError> {
    self.drafts.clear();
    self.insert = None;
    match self.cache.load_table(db, &self.name).await {
      Ok(data) => {
        self.rows = data.data;
        self.error = None;
        Ok(())
      }
      Err(e) => {
        tracing::warn!(table = %self.name, error = %e, "table fetch failed");
        self.rows.clear();
        self.cache.forget(&self.name);
        Err(self.fail(CrudError::Network))
      }
    }
  }

  // ── Local transitions ─────────────────────────────────────────────────────

  /// `Viewing → Editing`, pre-filling the draft from the row. A row already
  /// being edited keeps its draft.
  pub fn begin_edit(&mut self, index: usize) -> Result<(), CrudError> {
    let table = self.schema().ok_or(CrudError::NotLoaded)?;
    let row = self.rows.get(index).ok_or(CrudError::NoSuchRow(index))?;
    let draft = Draft::from_row(table, row);
    self.drafts.entry(index).or_insert(draft);
    self.error = None;
    Ok(())
  }

  /// `Editing → Viewing`, discarding the draft. No server call.
  pub fn cancel_edit(&mut self, index: usize) -> Result<(), CrudError> {
    self.drafts.remove(&index).ok_or(CrudError::NotEditing(index))?;
    self.error = None;
    Ok(())
  }

  /// Open the insert slot with an empty draft.
  pub fn begin_insert(&mut self) -> Result<(), CrudError> {
    if self.insert.is_some() {
      return Err(CrudError::InsertPending);
    }
    let table = self.schema().ok_or(CrudError::NotLoaded)?;
    self.insert = Some(Draft::empty(table));
    self.error = None;
    Ok(())
  }

  pub fn cancel_insert(&mut self) -> Result<(), CrudError> {
    self.insert.take().ok_or(CrudError::NoInsert)?;
    self.error = None;
    Ok(())
  }

  pub fn draft(&self, slot: Slot) -> Option<&Draft> {
    match slot {
      Slot::Row(i) => self.drafts.get(&i),
      Slot::Insert => self.insert.as_ref(),
    }
  }

  pub fn draft_mut(&mut self, slot: Slot) -> Option<&mut Draft> {
    match slot {
      Slot::Row(i) => self.drafts.get_mut(&i),
      Slot::Insert => self.insert.as_mut(),
    }
  }

  // ── Mutations ─────────────────────────────────────────────────────────────

  /// Submit the draft of row `index`, identified by its last-fetched values.
  ///
  /// A validation or server failure leaves the row in `Editing` with its
  /// draft intact.
  pub async fn save_edit<D: Database>(&mut self, db: &D, index: usize) -> Result<(), CrudError> {
    let draft = self.drafts.get(&index).ok_or(CrudError::NotEditing(index))?;
    let table = self.schema().ok_or(CrudError::NotLoaded)?;
    let values = match draft.coerce(table) {
      Ok(values) => values,
      Err(e) => return Err(self.fail(e.into())),
    };
    let identifiers = self
      .rows
      .get(index)
      .cloned()
      .ok_or(CrudError::NoSuchRow(index))?;
    let update = RowUpdate { values, identifiers };

    if let Err(e) = db.update_row(&self.name, &update).await {
      tracing::warn!(table = %self.name, error = %e, "update failed");
      return Err(self.fail(CrudError::Network));
    }
    tracing::info!(table = %self.name, row = index, "row updated");
    self.refetch(db).await
  }

  /// Submit the pending insert. Failure keeps the insert slot open.
  pub async fn save_insert<D: Database>(&mut self, db: &D) -> Result<(), CrudError> {
    let draft = self.insert.as_ref().ok_or(CrudError::NoInsert)?;
    let table = self.schema().ok_or(CrudError::NotLoaded)?;
    let values = match draft.coerce(table) {
      Ok(values) => values,
      Err(e) => return Err(self.fail(e.into())),
    };

    if let Err(e) = db.insert_row(&self.name, &values).await {
      tracing::warn!(table = %self.name, error = %e, "insert failed");
      return Err(self.fail(CrudError::Network));
    }
    tracing::info!(table = %self.name, "row inserted");
    self.refetch(db).await
  }

  /// Delete row `index`, sending its complete current value mapping.
  pub async fn delete<D: Database>(&mut self, db: &D, index: usize) -> Result<(), CrudError> {
    let identifiers = self
      .rows
      .get(index)
      .cloned()
      .ok_or(CrudError::NoSuchRow(index))?;

    if let Err(e) = db.delete_row(&self.name, &identifiers).await {
      tracing::warn!(table = %self.name, error = %e, "delete failed");
      return Err(self.fail(CrudError::Network));
    }
    tracing::info!(table = %self.name, row = index, "row deleted");
    self.refetch(db).await
  }

  fn fail(&mut self, err: CrudError) -> CrudError {
    self.error = Some(err.to_string());
    err
  }
}
