//! Async HTTP client wrapping the Tabula JSON API.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::{Client, Method, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use tabula_core::{
  join::JoinRequest,
  row::{Row, RowUpdate},
  schema::{ColumnMap, TableData},
  store::{ClassifyError, Database},
};
use thiserror::Error;

/// Connection settings for the Tabula API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// A failed API call. The response body is never parsed; any non-2xx status
/// is reported as-is.
#[derive(Debug, Error)]
pub enum ClientError {
  #[error("{method} {url} failed: {source}")]
  Transport {
    method: Method,
    url:    Url,
    #[source]
    source: reqwest::Error,
  },

  #[error("{method} {url} → {status}")]
  Status {
    method: Method,
    url:    Url,
    status: StatusCode,
  },
}

impl ClassifyError for ClientError {
  fn is_invalid_request(&self) -> bool {
    matches!(self, ClientError::Status { status, .. } if status.is_client_error())
  }
}

/// Async HTTP client for the Tabula JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  base:   Url,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let base = Url::parse(&config.base_url)
      .with_context(|| format!("invalid server URL {:?}", config.base_url))?;
    if base.cannot_be_a_base() {
      bail!("server URL {:?} cannot carry a path", config.base_url);
    }
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, base })
  }

  /// `<base>/api/<segments…>`, each segment percent-encoded.
  fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    // `new` rejects cannot-be-a-base URLs, so this always succeeds.
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().push("api").extend(segments);
    }
    url
  }

  async fn send<B: Serialize + ?Sized>(
    &self,
    method: Method,
    url: Url,
    body: Option<&B>,
  ) -> Result<reqwest::Response, ClientError> {
    tracing::debug!(%method, %url, "api request");
    let mut req = self.client.request(method.clone(), url.clone());
    if let Some(body) = body {
      req = req.json(body);
    }
    let resp = req.send().await.map_err(|source| ClientError::Transport {
      method: method.clone(),
      url:    url.clone(),
      source,
    })?;

    let status = resp.status();
    if !status.is_success() {
      tracing::warn!(%method, %url, %status, "api request rejected");
      return Err(ClientError::Status { method, url, status });
    }
    Ok(resp)
  }

  async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
    let url = self.endpoint(segments);
    let resp = self.send::<()>(Method::GET, url.clone(), None).await?;
    resp.json().await.map_err(|source| ClientError::Transport {
      method: Method::GET,
      url,
      source,
    })
  }

  async fn post<B: Serialize + ?Sized>(
    &self,
    segments: &[&str],
    body: &B,
  ) -> Result<reqwest::Response, ClientError> {
    self
      .send(Method::POST, self.endpoint(segments), Some(body))
      .await
  }
}

// ─── Database impl ────────────────────────────────────────────────────────────

impl Database for ApiClient {
  type Error = ClientError;

  /// `GET /api/get_tables`
  async fn list_tables(&self) -> Result<Vec<String>, ClientError> {
    self.get_json(&["get_tables"]).await
  }

  /// `GET /api/get_columns`
  async fn list_columns(&self) -> Result<ColumnMap, ClientError> {
    self.get_json(&["get_columns"]).await
  }

  /// `GET /api/get_all/<table>`
  async fn fetch_table(&self, table: &str) -> Result<TableData, ClientError> {
    self.get_json(&["get_all", table]).await
  }

  /// `POST /api/insert/<table>`
  async fn insert_row(&self, table: &str, values: &Row) -> Result<(), ClientError> {
    self.post(&["insert", table], values).await?;
    Ok(())
  }

  /// `POST /api/update/<table>`
  async fn update_row(&self, table: &str, update: &RowUpdate) -> Result<(), ClientError> {
    self.post(&["update", table], update).await?;
    Ok(())
  }

  /// `POST /api/delete/<table>`
  async fn delete_row(&self, table: &str, identifiers: &Row) -> Result<(), ClientError> {
    self.post(&["delete", table], identifiers).await?;
    Ok(())
  }

  /// `POST /api/join`
  async fn join(&self, request: &JoinRequest) -> Result<Vec<Row>, ClientError> {
    let url = self.endpoint(&["join"]);
    let resp = self.send(Method::POST, url.clone(), Some(request)).await?;
    resp.json().await.map_err(|source| ClientError::Transport {
      method: Method::POST,
      url,
      source,
    })
  }
}

// ─── End-to-end tests ─────────────────────────────────────────────────────────
