//! Handlers for the catalogue and table-data endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/get_tables` | Ordered table names |
//! | `GET`  | `/get_columns` | Table name → ordered column names |
//! | `GET`  | `/get_all/{table}` | `{columns, data, types}`; 400 for an unknown table |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use tabula_core::{
  schema::{ColumnMap, TableData},
  store::Database,
};

use crate::error::ApiError;

/// `GET /get_tables`
pub async fn list_tables<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<String>>, ApiError>
where
  S: Database,
{
  let tables = store.list_tables().await.map_err(ApiError::from_store)?;
  Ok(Json(tables))
}

/// `GET /get_columns`
pub async fn list_columns<S>(State(store): State<Arc<S>>) -> Result<Json<ColumnMap>, ApiError>
where
  S: Database,
{
  let columns = store.list_columns().await.map_err(ApiError::from_store)?;
  Ok(Json(columns))
}

/// `GET /get_all/{table}`
pub async fn get_all<S>(
  State(store): State<Arc<S>>,
  Path(table): Path<String>,
) -> Result<Json<TableData>, ApiError>
where
  S: Database,
{
  let data = store
    .fetch_table(&table)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(data))
}
