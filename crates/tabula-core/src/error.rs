//! Error types for `tabula-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A join spec must carry between one and `total_tables - 1` clauses.
  #[error("a join over {total_tables} tables needs 1..={max} clauses, got {count}")]
  JoinCardinality {
    count:        usize,
    max:          usize,
    total_tables: usize,
  },

  #[error("malformed join request: {0}")]
  MalformedJoin(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
