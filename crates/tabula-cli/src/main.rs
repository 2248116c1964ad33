//! `tabula` — terminal browser for a Tabula database server.
//!
//! # Usage
//!
//! ```
//! tabula --url http://localhost:5000
//! tabula --open /tables/courses
//! tabula --config ~/.config/tabula/config.toml --log-file /tmp/tabula.log
//! ```

mod app;
mod client;
mod crud;
#[cfg(test)]
mod fake;
mod form;
mod join;
mod schema;
mod ui;

use std::{
  fs::File,
  io,
  path::{Path, PathBuf},
  sync::Mutex,
  time::Duration,
};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:5000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tabula", about = "Terminal browser for a Tabula database server")]
struct Args {
  /// Path to a TOML config file (url, open, log_file).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the tabula server (default: http://localhost:5000).
  #[arg(long, env = "TABULA_URL")]
  url: Option<String>,

  /// Screen to open first: `/`, `/join` or `/tables/<name>`.
  #[arg(long)]
  open: Option<String>,

  /// Write logs to this file. Nothing is logged without it.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      Option<String>,
  #[serde(default)]
  open:     Option<String>,
  #[serde(default)]
  log_file: Option<PathBuf>,
}

fn init_tracing(path: &Path) -> Result<()> {
  let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_ansi(false)
    .with_writer(Mutex::new(file))
    .init();
  Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  if let Some(path) = args.log_file.or(file_cfg.log_file) {
    init_tracing(&path)?;
  }
  let api_config = ApiConfig {
    base_url: args
      .url
      .or(file_cfg.url)
      .unwrap_or_else(|| DEFAULT_URL.to_owned()),
  };
  let start = args.open.or(file_cfg.open).unwrap_or_else(|| "/".to_owned());

  let client = ApiClient::new(api_config)?;
  let mut app = App::new(client);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Load the table list, then open the requested screen.
  let run_result = match app.load_tables().await {
    Ok(()) => {
      app.open_path(&start).await;
      run_event_loop(&mut terminal, &mut app).await
    }
    Err(e) => Err(e.context("loading tables")),
  };

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

/// Each key is handled to completion, server calls included, before the next
/// one is read, so a control cannot be triggered twice while its request is
/// in flight.
async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, &*app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && key.kind == KeyEventKind::Press
      && !app.handle_key(key).await?
    {
      break;
    }
  }

  Ok(())
}
