//! HTTP server assembly for Tabula.
//!
//! Nests the JSON API from [`tabula_api`] under `/api` and wraps it in request
//! tracing. The binary in `main.rs` owns configuration loading and binding.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use serde::Deserialize;
use tabula_core::store::Database;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered with
/// `TABULA_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  /// SQLite file to serve. It must already exist.
  pub database_path: PathBuf,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router for `store`.
pub fn app<S>(store: Arc<S>) -> Router
where
  S: Database + 'static,
{
  Router::new()
    .nest("/api", tabula_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tabula_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  #[tokio::test]
  async fn api_is_nested_under_prefix() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.execute_batch("CREATE TABLE t (a TEXT);").await.unwrap();
    let store = Arc::new(store);

    let resp = app(store.clone())
      .oneshot(Request::get("/api/get_tables").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(
      serde_json::from_slice::<Vec<String>>(&bytes).unwrap(),
      ["t"]
    );

    let resp = app(store)
      .oneshot(Request::get("/get_tables").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
