//! tabula-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), layers `TABULA_*`
//! environment variables and command-line overrides on top, opens the SQLite
//! file and serves the JSON API over HTTP.
//!
//! ```
//! tabula-server reg.sqlite --port 5000
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use tabula_server::ServerConfig;
use tabula_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tabula database browser server")]
struct Cli {
  /// The SQLite database file to serve (overrides `database_path`).
  database: Option<PathBuf>,

  /// The port to listen on (overrides `port`).
  #[arg(short, long)]
  port: Option<u16>,

  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration: defaults < file < environment < command line.
  let settings = config::Config::builder()
    .set_default("host", "0.0.0.0")?
    .set_default("port", 5000_i64)?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("TABULA"))
    .set_override_option(
      "database_path",
      cli.database.map(|p| p.to_string_lossy().into_owned()),
    )?
    .set_override_option("port", cli.port.map(i64::from))?
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig (is database_path set?)")?;

  // Expand `~` in the database path.
  let database_path = expand_tilde(&server_cfg.database_path);

  anyhow::ensure!(
    database_path.is_file(),
    "no database file at {database_path:?}"
  );
  let store = SqliteStore::open(&database_path)
    .await
    .with_context(|| format!("failed to open database at {database_path:?}"))?;

  let app = tabula_server::app(Arc::new(store));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(database = %database_path.display(), "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
