//! Core types and trait definitions for Tabula.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! backend store, the JSON API and the terminal client all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod join;
pub mod row;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
