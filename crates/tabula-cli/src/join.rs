//! Interactive multi-table join builder.
//!
//! Holds a primary table and an ordered list of clause forms whose selectors
//! cascade: picking a table on either side of a condition repopulates that
//! side's column choices. The clause count stays within
//! `1..=table_count - 1` for the builder's whole lifetime.

use tabula_core::{
  join::{JoinClause, JoinCondition, JoinSpec},
  row::Row,
  store::Database,
};
use thiserror::Error;

use crate::schema::SchemaCache;

pub const NOT_ENOUGH_TABLES: &str = "Not enough tables in db to join!";
pub const SERVER_ERROR: &str = "Server Error";

#[derive(Debug, Error)]
pub enum JoinError {
  #[error("Not enough tables in db to join!")]
  NotEnoughTables,

  #[error("a join over these tables takes at most {max} clauses")]
  TooManyClauses { max: usize },

  #[error("a join needs at least one clause")]
  TooFewClauses,

  #[error("no clause {0}")]
  NoSuchClause(usize),

  #[error("unknown table {0:?}")]
  UnknownTable(String),

  #[error("table {table:?} has no column {column:?}")]
  UnknownColumn { table: String, column: String },

  #[error("Server Error")]
  Network,

  #[error(transparent)]
  Spec(#[from] tabula_core::Error),
}

// ─── Clause form ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
  Left,
  Right,
}

/// The five selectors of one join clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseForm {
  pub secondary_table: String,
  pub left_table:      String,
  pub left_column:     String,
  pub right_table:     String,
  pub right_column:    String,
}

impl ClauseForm {
  pub fn table(&self, side: Side) -> &str {
    match side {
      Side::Left => &self.left_table,
      Side::Right => &self.right_table,
    }
  }

  pub fn column(&self, side: Side) -> &str {
    match side {
      Side::Left => &self.left_column,
      Side::Right => &self.right_column,
    }
  }

  fn to_clause(&self) -> JoinClause {
    JoinClause {
      secondary_table: self.secondary_table.clone(),
      condition:       JoinCondition {
        left_table:   self.left_table.clone(),
        left_column:  self.left_column.clone(),
        right_table:  self.right_table.clone(),
        right_column: self.right_column.clone(),
      },
    }
  }
}

// ─── Result ──────────────────────────────────────────────────────────────────

/// Join output laid out for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
  pub header: Vec<String>,
  pub rows:   Vec<Vec<String>>,
}

impl ResultTable {
  /// The header is the first row's keys in their order. `None` when there are
  /// no rows.
  pub fn from_rows(rows: &[Row]) -> Option<Self> {
    let header: Vec<String> = rows.first()?.columns().map(str::to_owned).collect();
    let rows = rows
      .iter()
      .map(|row| {
        header
          .iter()
          .map(|c| row.get(c).map(ToString::to_string).unwrap_or_default())
          .collect()
      })
      .collect();
    Some(Self { header, rows })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JoinResult {
  /// No query issued yet, or the last one matched nothing.
  #[default]
  Nothing,
  Rows(ResultTable),
  ServerError,
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// What the join screen shows after activation.
pub enum JoinPage {
  /// Fewer than two tables exist; no controls are offered.
  Unavailable,
  Ready(JoinQueryBuilder),
}

pub struct JoinQueryBuilder {
  cache:         SchemaCache,
  primary_table: String,
  clauses:       Vec<ClauseForm>,
  result:        JoinResult,
}

impl JoinQueryBuilder {
  /// Load the table list and column map, then build the initial form.
  pub async fn activate<D: Database>(db: &D) -> Result<JoinPage, JoinError> {
    let mut cache = SchemaCache::new();
    if let Err(e) = cache.load_tables(db).await {
      tracing::warn!(error = %e, "loading tables for join failed");
      return Err(JoinError::Network);
    }
    if let Err(e) = cache.load_columns(db).await {
      tracing::warn!(error = %e, "loading columns for join failed");
      return Err(JoinError::Network);
    }
    match Self::new(cache) {
      Ok(builder) => Ok(JoinPage::Ready(builder)),
      Err(JoinError::NotEnoughTables) => Ok(JoinPage::Unavailable),
      Err(e) => Err(e),
    }
  }

  /// A builder with one clause, every selector on the first table.
  pub fn new(cache: SchemaCache) -> Result<Self, JoinError> {
    if cache.table_count() < 2 {
      return Err(JoinError::NotEnoughTables);
    }
    let first = cache.tables()[0].clone();
    let mut builder = Self {
      cache,
      primary_table: first,
      clauses: Vec::new(),
      result: JoinResult::Nothing,
    };
    let clause = builder.default_clause();
    builder.clauses.push(clause);
    Ok(builder)
  }

  fn default_clause(&self) -> ClauseForm {
    let table = self.primary_default().to_owned();
    let column = self.first_column(&table).to_owned();
    ClauseForm {
      secondary_table: table.clone(),
      left_table:      table.clone(),
      left_column:     column.clone(),
      right_table:     table,
      right_column:    column,
    }
  }

  fn primary_default(&self) -> &str {
    self.cache.tables().first().map(String::as_str).unwrap_or_default()
  }

  fn first_column(&self, table: &str) -> &str {
    self
      .cache
      .columns_of(table)
      .and_then(<[String]>::first)
      .map(String::as_str)
      .unwrap_or_default()
  }

  // ── Accessors ─────────────────────────────────────────────────────────────

  pub fn tables(&self) -> &[String] { self.cache.tables() }

  pub fn primary_table(&self) -> &str { &self.primary_table }

  pub fn clauses(&self) -> &[ClauseForm] { &self.clauses }

  pub fn result(&self) -> &JoinResult { &self.result }

  pub fn max_clauses(&self) -> usize { self.cache.table_count().saturating_sub(1) }

  pub fn can_add(&self) -> bool { self.clauses.len() < self.max_clauses() }

  pub fn can_remove(&self) -> bool { self.clauses.len() > 1 }

  /// The columns a clause side may choose from: those of its current table.
  pub fn column_options(&self, index: usize, side: Side) -> Result<&[String], JoinError> {
    let clause = self.clause(index)?;
    Ok(self.cache.columns_of(clause.table(side)).unwrap_or_default())
  }

  fn clause(&self, index: usize) -> Result<&ClauseForm, JoinError> {
    self.clauses.get(index).ok_or(JoinError::NoSuchClause(index))
  }

  fn clause_mut(&mut self, index: usize) -> Result<&mut ClauseForm, JoinError> {
    self.clauses.get_mut(index).ok_or(JoinError::NoSuchClause(index))
  }

  fn check_table(&self, table: &str) -> Result<(), JoinError> {
    if self.cache.contains(table) {
      Ok(())
    } else {
      Err(JoinError::UnknownTable(table.to_owned()))
    }
  }

  // ── Edits ─────────────────────────────────────────────────────────────────

  pub fn set_primary_table(&mut self, table: &str) -> Result<(), JoinError> {
    self.check_table(table)?;
    self.primary_table = table.to_owned();
    Ok(())
  }

  /// Append a default clause unless the count is already at its maximum.
  pub fn add_clause(&mut self) -> Result<(), JoinError> {
    if !self.can_add() {
      return Err(JoinError::TooManyClauses { max: self.max_clauses() });
    }
    let clause = self.default_clause();
    self.clauses.push(clause);
    Ok(())
  }

  /// Drop the last clause unless it is the only one.
  pub fn remove_clause(&mut self) -> Result<(), JoinError> {
    if !self.can_remove() {
      return Err(JoinError::TooFewClauses);
    }
    self.clauses.pop();
    Ok(())
  }

  pub fn set_secondary_table(&mut self, index: usize, table: &str) -> Result<(), JoinError> {
    self.check_table(table)?;
    self.clause_mut(index)?.secondary_table = table.to_owned();
    Ok(())
  }

  /// Point one side of a condition at `table`, resetting that side's column
  /// to the table's first. The other side is untouched.
  pub fn set_table(&mut self, index: usize, side: Side, table: &str) -> Result<(), JoinError> {
    self.check_table(table)?;
    let column = self.first_column(table).to_owned();
    let clause = self.clause_mut(index)?;
    let (t, c) = match side {
      Side::Left => (&mut clause.left_table, &mut clause.left_column),
      Side::Right => (&mut clause.right_table, &mut clause.right_column),
    };
    *t = table.to_owned();
    *c = column;
    Ok(())
  }

  /// Choose a column on one side; it must belong to that side's table.
  pub fn set_column(&mut self, index: usize, side: Side, column: &str) -> Result<(), JoinError> {
    let clause = self.clause(index)?;
    let table = clause.table(side);
    let known = self
      .cache
      .columns_of(table)
      .is_some_and(|cols| cols.iter().any(|c| c == column));
    if !known {
      return Err(JoinError::UnknownColumn {
        table:  table.to_owned(),
        column: column.to_owned(),
      });
    }
    let clause = self.clause_mut(index)?;
    match side {
      Side::Left => clause.left_column = column.to_owned(),
      Side::Right => clause.right_column = column.to_owned(),
    }
    Ok(())
  }

  // ── Query ─────────────────────────────────────────────────────────────────

  pub fn spec(&self) -> Result<JoinSpec, JoinError> {
    let clauses = self.clauses.iter().map(ClauseForm::to_clause).collect();
    Ok(JoinSpec::new(
      self.primary_table.clone(),
      clauses,
      self.cache.table_count(),
    )?)
  }

  /// Run the join and replace the result area. A failure clears any earlier
  /// result and shows the server error indicator instead.
  pub async fn submit<D: Database>(&mut self, db: &D) -> Result<(), JoinError> {
    let request = self.spec()?.to_request();
    match db.join(&request).await {
      Ok(rows) => {
        tracing::debug!(rows = rows.len(), "join returned");
        self.result = ResultTable::from_rows(&rows)
          .map(JoinResult::Rows)
          .unwrap_or_default();
        Ok(())
      }
      Err(e) => {
        tracing::warn!(error = %e, "join failed");
        self.result = JoinResult::ServerError;
        Err(JoinError::Network)
      }
    }
  }
}
