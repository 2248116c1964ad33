//! JSON REST API for Tabula.
//!
//! Exposes an axum [`Router`] backed by any [`tabula_core::store::Database`].
//! Transport concerns (binding, tracing layers) are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tabula_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod join;
pub mod rows;
pub mod tables;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use tabula_core::store::Database;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: Database + 'static,
{
  Router::new()
    // Catalogue
    .route("/get_tables", get(tables::list_tables::<S>))
    .route("/get_columns", get(tables::list_columns::<S>))
    .route("/get_all/{table}", get(tables::get_all::<S>))
    // Mutations
    .route("/insert/{table}", post(rows::insert::<S>))
    .route("/update/{table}", post(rows::update::<S>))
    .route("/delete/{table}", post(rows::delete::<S>))
    // Queries
    .route("/join", post(join::handler::<S>))
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────
