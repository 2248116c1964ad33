//! Error type for `tabula-store-sqlite`.

use tabula_core::store::ClassifyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] tabula_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("invalid table: {0}")]
  InvalidTable(String),

  /// The supplied row does not fit the table's columns.
  #[error("bad fields for {table}: {reason}")]
  BadFields { table: String, reason: String },
}

impl ClassifyError for Error {
  fn is_invalid_request(&self) -> bool {
    matches!(
      self,
      Error::Core(_) | Error::InvalidTable(_) | Error::BadFields { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
