//! Handler for `POST /join`.
//!
//! Body: `{"primaryTable": "A", "secondaryTables": ["B"], "clauses":
//! [[["A", "id", "B", "aid"]]]}`. Each entry of `clauses` is a group of
//! conditions for the secondary table at the same index.

use std::sync::Arc;

use axum::{Json, extract::State};
use tabula_core::{join::JoinRequest, row::Row, store::Database};

use crate::error::ApiError;

/// `POST /join`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Json(request): Json<JoinRequest>,
) -> Result<Json<Vec<Row>>, ApiError>
where
  S: Database,
{
  tracing::debug!(
    primary = %request.primary_table,
    secondary = ?request.secondary_tables,
    "join request"
  );
  let rows = store.join(&request).await.map_err(ApiError::from_store)?;
  Ok(Json(rows))
}
