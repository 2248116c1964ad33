//! Application state machine and event dispatcher.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use tabula_core::store::Database;
use thiserror::Error;

use crate::{
  client::ApiClient,
  crud::{CrudTableController, RowState, Slot},
  join::{JoinError, JoinPage, JoinQueryBuilder, Side},
};

pub const SITE_TITLE: &str = "SQLite Web Browser";

// ─── Routes ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
  Home,
  Table(String),
  Join,
}

/// A path that names no screen. Never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
  #[error("malformed path {0:?}")]
  Malformed(String),

  #[error("unknown table {0:?}")]
  UnknownTable(String),
}

impl Route {
  /// `/`, `/join` (or `/join/result`) or `/tables/<name>` where `<name>` is
  /// one of `tables`.
  pub fn parse(path: &str, tables: &[String]) -> Result<Self, SchemaError> {
    let trimmed = path.trim();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    match trimmed {
      "" => return Ok(Self::Home),
      "/join" | "/join/result" => return Ok(Self::Join),
      _ => {}
    }
    let name = trimmed
      .strip_prefix("/tables/")
      .filter(|n| !n.is_empty() && !n.contains('/'))
      .ok_or_else(|| SchemaError::Malformed(path.to_owned()))?;
    if !tables.iter().any(|t| t == name) {
      return Err(SchemaError::UnknownTable(name.to_owned()));
    }
    Ok(Self::Table(name.to_owned()))
  }

  /// Like [`Route::parse`], but logs the failure and falls back to home.
  pub fn resolve(path: &str, tables: &[String]) -> Self {
    Self::parse(path, tables).unwrap_or_else(|e| {
      tracing::warn!(%path, error = %e, "unroutable path, showing home");
      Self::Home
    })
  }

  pub fn path(&self) -> String {
    match self {
      Self::Home => "/".into(),
      Self::Table(name) => format!("/tables/{name}"),
      Self::Join => "/join".into(),
    }
  }
}

// ─── Views ────────────────────────────────────────────────────────────────────

/// Row and column cursor over one table.
pub struct TablePage {
  pub controller: CrudTableController,
  /// Index into the rendered rows; one past the fetched rows is the insert row.
  pub cursor_row: usize,
  pub cursor_col: usize,
}

impl TablePage {
  pub fn slot(&self) -> Slot {
    if self.cursor_row < self.controller.rows().len() {
      Slot::Row(self.cursor_row)
    } else {
      Slot::Insert
    }
  }

  fn row_count(&self) -> usize {
    self.controller.rows().len() + usize::from(self.controller.state(Slot::Insert).is_some())
  }

  fn clamp(&mut self) {
    self.cursor_row = self.cursor_row.min(self.row_count().saturating_sub(1));
    let width = self.controller.schema().map_or(0, |t| t.columns.len());
    self.cursor_col = self.cursor_col.min(width.saturating_sub(1));
  }

  fn editing(&self) -> bool {
    matches!(
      self.controller.state(self.slot()),
      Some(RowState::Editing | RowState::InsertPending)
    )
  }
}

/// One focusable selector on the join screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinField {
  Primary,
  Secondary(usize),
  Table(usize, Side),
  Column(usize, Side),
}

pub enum JoinScreen {
  Unavailable,
  /// Loading the catalogue failed.
  Failed,
  Ready {
    builder: JoinQueryBuilder,
    focus:   usize,
  },
}

/// Every selector of `builder` in display order.
pub fn join_fields(builder: &JoinQueryBuilder) -> Vec<JoinField> {
  let mut fields = vec![JoinField::Primary];
  for i in 0..builder.clauses().len() {
    fields.extend([
      JoinField::Secondary(i),
      JoinField::Table(i, Side::Left),
      JoinField::Column(i, Side::Left),
      JoinField::Table(i, Side::Right),
      JoinField::Column(i, Side::Right),
    ]);
  }
  fields
}

pub enum View {
  Home,
  Table(TablePage),
  Join(JoinScreen),
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<D: Database = ApiClient> {
  /// Every table on the server, in catalogue order.
  pub tables: Vec<String>,

  pub view: View,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Current fuzzy-filter string (only active when `filter_active`).
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* table list.
  pub list_cursor: usize,

  pub client: Arc<D>,
}

impl<D: Database> App<D> {
  pub fn new(client: D) -> Self {
    Self {
      tables:        Vec::new(),
      view:          View::Home,
      status_msg:    String::new(),
      filter:        String::new(),
      filter_active: false,
      list_cursor:   0,
      client:        Arc::new(client),
    }
  }

  pub fn title(&self) -> String {
    match &self.view {
      View::Home => SITE_TITLE.to_owned(),
      View::Table(page) => format!("{SITE_TITLE} - {}", page.controller.name()),
      View::Join(_) => format!("{SITE_TITLE} - Join"),
    }
  }

  pub fn route(&self) -> Route {
    match &self.view {
      View::Home => Route::Home,
      View::Table(page) => Route::Table(page.controller.name().to_owned()),
      View::Join(_) => Route::Join,
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  pub async fn load_tables(&mut self) -> anyhow::Result<()> {
    self.status_msg = "Loading tables…".into();
    match self.client.list_tables().await {
      Ok(tables) => {
        self.tables = tables;
        self.list_cursor = 0;
        self.status_msg.clear();
        Ok(())
      }
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        Err(e.into())
      }
    }
  }

  /// Resolve `path` against the known tables and show that screen.
  pub async fn open_path(&mut self, path: &str) {
    let route = Route::resolve(path, &self.tables);
    self.navigate(route).await;
  }

  pub async fn navigate(&mut self, route: Route) {
    tracing::debug!(path = %route.path(), "navigating");
    self.status_msg.clear();
    self.view = match route {
      Route::Home => View::Home,
      Route::Table(name) => {
        let mut controller = CrudTableController::new(name);
        if let Err(e) = controller.activate(&*self.client).await {
          self.status_msg = e.to_string();
        }
        View::Table(TablePage { controller, cursor_row: 0, cursor_col: 0 })
      }
      Route::Join => View::Join(match JoinQueryBuilder::activate(&*self.client).await {
        Ok(JoinPage::Ready(builder)) => JoinScreen::Ready { builder, focus: 0 },
        Ok(JoinPage::Unavailable) => JoinScreen::Unavailable,
        Err(e) => {
          self.status_msg = e.to_string();
          JoinScreen::Failed
        }
      }),
    };
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// Tables that match the current filter query.
  pub fn filtered_tables(&self) -> Vec<&str> {
    if self.filter.is_empty() {
      return self.tables.iter().map(String::as_str).collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .tables
      .iter()
      .filter(|t| matcher.fuzzy_match(t, &self.filter).is_some())
      .map(String::as_str)
      .collect()
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }
    if self.filter_active {
      self.handle_filter_key(key).await;
      return Ok(true);
    }
    match self.view {
      View::Home => self.handle_home_key(key).await,
      View::Table(_) => self.handle_table_key(key).await,
      View::Join(_) => self.handle_join_key(key).await,
    }
  }

  async fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
        // A single match opens straight away.
        let single = match self.filtered_tables().as_slice() {
          [only] => Some((*only).to_owned()),
          _ => None,
        };
        if let Some(table) = single {
          self.navigate(Route::Table(table)).await;
        }
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
  }

  async fn handle_home_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Char('q') => return Ok(false),

      KeyCode::Down | KeyCode::Char('j') => {
        if self.list_cursor + 1 < self.filtered_tables().len() {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }

      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        let selected = self.filtered_tables().get(self.list_cursor).map(|t| (*t).to_owned());
        if let Some(table) = selected {
          self.navigate(Route::Table(table)).await;
        }
      }
      KeyCode::Char('J') => self.navigate(Route::Join).await,
      KeyCode::Char('r') => self.load_tables().await?,

      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }

      _ => {}
    }
    Ok(true)
  }

  async fn handle_table_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    let client = Arc::clone(&self.client);
    let View::Table(page) = &mut self.view else {
      return Ok(true);
    };
    let slot = page.slot();
    let editing = page.editing();

    let outcome = match key.code {
      // Field editing
      KeyCode::Char(c) if editing => {
        let col = page.cursor_col;
        if let Some(draft) = page.controller.draft_mut(slot) {
          draft.push_char(col, c);
        }
        Ok(())
      }
      KeyCode::Backspace if editing => {
        let col = page.cursor_col;
        if let Some(draft) = page.controller.draft_mut(slot) {
          draft.pop_char(col);
        }
        Ok(())
      }
      KeyCode::Enter if editing => match slot {
        Slot::Row(i) => page.controller.save_edit(&*client, i).await,
        Slot::Insert => page.controller.save_insert(&*client).await,
      },
      KeyCode::Esc if editing => match slot {
        Slot::Row(i) => page.controller.cancel_edit(i),
        Slot::Insert => page.controller.cancel_insert(),
      },

      // Commands
      KeyCode::Char('q') => return Ok(false),
      KeyCode::Esc => {
        self.view = View::Home;
        self.status_msg.clear();
        return Ok(true);
      }
      KeyCode::Char('e') => match slot {
        Slot::Row(i) => page.controller.begin_edit(i),
        Slot::Insert => Ok(()),
      },
      KeyCode::Char('i') => page.controller.begin_insert().map(|()| {
        page.cursor_row = page.controller.rows().len();
      }),
      KeyCode::Char('d') => match slot {
        Slot::Row(i) => page.controller.delete(&*client, i).await,
        Slot::Insert => Ok(()),
      },
      KeyCode::Char('r') => page.controller.refetch(&*client).await,
      KeyCode::Char('j') => {
        page.cursor_row += 1;
        Ok(())
      }
      KeyCode::Char('k') => {
        page.cursor_row = page.cursor_row.saturating_sub(1);
        Ok(())
      }
      KeyCode::Char('l') => {
        page.cursor_col += 1;
        Ok(())
      }
      KeyCode::Char('h') => {
        page.cursor_col = page.cursor_col.saturating_sub(1);
        Ok(())
      }

      // Navigation, in either mode
      KeyCode::Down => {
        page.cursor_row += 1;
        Ok(())
      }
      KeyCode::Up => {
        page.cursor_row = page.cursor_row.saturating_sub(1);
        Ok(())
      }
      KeyCode::Tab | KeyCode::Right => {
        page.cursor_col += 1;
        Ok(())
      }
      KeyCode::BackTab | KeyCode::Left => {
        page.cursor_col = page.cursor_col.saturating_sub(1);
        Ok(())
      }

      _ => Ok(()),
    };

    page.clamp();
    match outcome {
      Ok(()) => self.status_msg.clear(),
      Err(e) => self.status_msg = e.to_string(),
    }
    Ok(true)
  }

  async fn handle_join_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    let client = Arc::clone(&self.client);
    let View::Join(screen) = &mut self.view else {
      return Ok(true);
    };

    match key.code {
      KeyCode::Char('q') => return Ok(false),
      KeyCode::Esc => {
        self.view = View::Home;
        self.status_msg.clear();
        return Ok(true);
      }
      _ => {}
    }

    let JoinScreen::Ready { builder, focus } = screen else {
      return Ok(true);
    };

    let outcome = match key.code {
      KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
        *focus += 1;
        Ok(())
      }
      KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => {
        *focus = focus.saturating_sub(1);
        Ok(())
      }
      KeyCode::Right | KeyCode::Char('l') => cycle(builder, *focus, 1),
      KeyCode::Left | KeyCode::Char('h') => cycle(builder, *focus, -1),
      KeyCode::Char('a') => builder.add_clause(),
      KeyCode::Char('x') => builder.remove_clause(),
      KeyCode::Enter => builder.submit(&*client).await,
      _ => Ok(()),
    };

    *focus = (*focus).min(join_fields(builder).len().saturating_sub(1));
    match outcome {
      Ok(()) => self.status_msg.clear(),
      Err(e) => self.status_msg = e.to_string(),
    }
    Ok(true)
  }
}

/// Step the selector at `focus` through its options, wrapping at either end.
fn cycle(builder: &mut JoinQueryBuilder, focus: usize, step: isize) -> Result<(), JoinError> {
  let Some(&field) = join_fields(builder).get(focus) else {
    return Ok(());
  };
  let (options, current): (Vec<String>, String) = match field {
    JoinField::Primary => (builder.tables().to_vec(), builder.primary_table().to_owned()),
    JoinField::Secondary(i) => (
      builder.tables().to_vec(),
      builder.clauses()[i].secondary_table.clone(),
    ),
    JoinField::Table(i, side) => (
      builder.tables().to_vec(),
      builder.clauses()[i].table(side).to_owned(),
    ),
    JoinField::Column(i, side) => (
      builder.column_options(i, side)?.to_vec(),
      builder.clauses()[i].column(side).to_owned(),
    ),
  };
  if options.is_empty() {
    return Ok(());
  }
  let at = options.iter().position(|o| *o == current).unwrap_or(0);
  let next = &options[(at as isize + step).rem_euclid(options.len() as isize) as usize];

  match field {
    JoinField::Primary => builder.set_primary_table(next),
    JoinField::Secondary(i) => builder.set_secondary_table(i, next),
    JoinField::Table(i, side) => builder.set_table(i, side, next),
    JoinField::Column(i, side) => builder.set_column(i, side, next),
  }
}
