//! Handlers for row mutations.
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `POST` | `/insert/{table}` | column → value mapping covering every column |
//! | `POST` | `/update/{table}` | `{"values": {...}, "identifiers": {...}}` |
//! | `POST` | `/delete/{table}` | identifier mapping (the full original row) |
//!
//! All three answer `204 No Content` on success.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use tabula_core::{
  row::{Row, RowUpdate},
  store::Database,
};

use crate::error::ApiError;

/// `POST /insert/{table}`
pub async fn insert<S>(
  State(store): State<Arc<S>>,
  Path(table): Path<String>,
  Json(values): Json<Row>,
) -> Result<StatusCode, ApiError>
where
  S: Database,
{
  store
    .insert_row(&table, &values)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /update/{table}`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(table): Path<String>,
  Json(body): Json<RowUpdate>,
) -> Result<StatusCode, ApiError>
where
  S: Database,
{
  store
    .update_row(&table, &body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /delete/{table}`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  Path(table): Path<String>,
  Json(identifiers): Json<Row>,
) -> Result<StatusCode, ApiError>
where
  S: Database,
{
  store
    .delete_row(&table, &identifiers)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
