//! SQLite backend for Tabula.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Tables are discovered from the
//! catalogue at call time; the store owns no schema of its own.

mod catalog;
mod encode;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
