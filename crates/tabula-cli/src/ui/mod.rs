//! TUI rendering — orchestrates all panes.

pub mod join_view;
pub mod table_list;
pub mod table_view;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};
use tabula_core::store::Database;

use crate::{
  app::{App, JoinScreen, View},
  crud::RowState,
  join::SERVER_ERROR,
};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<D: Database>(f: &mut Frame, app: &App<D>) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  match &app.view {
    View::Home => table_list::draw(f, rows[1], app),
    View::Table(page) => table_view::draw(f, rows[1], page),
    View::Join(screen) => join_view::draw(f, rows[1], screen),
  }
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<D: Database>(f: &mut Frame, area: Rect, app: &App<D>) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    format!(" {}", app.title()),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(format!("{date} "), Style::default().fg(Color::Gray));

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);
  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<D: Database>(f: &mut Frame, area: Rect, app: &App<D>) {
  let (mode_label, hints, view_error) = match &app.view {
    View::Home if app.filter_active => (
      "SEARCH",
      "Type to filter  Esc cancel  Enter select",
      None,
    ),
    View::Home => (
      "TABLES",
      "↑↓/jk navigate  Enter open  J join  / search  r reload  q quit",
      None,
    ),
    View::Table(page) => {
      let editing = page
        .controller
        .state(page.slot())
        .is_some_and(|s| s != RowState::Viewing);
      let hints = if editing {
        "Type to edit  Tab next field  Enter save  Esc cancel"
      } else {
        "e edit  i insert  d delete  r refresh  Esc back  q quit"
      };
      ("TABLE", hints, page.controller.error().map(str::to_owned))
    }
    View::Join(screen) => (
      "JOIN",
      "↑↓ select  ←→ change  a add  x remove  Enter run  Esc back",
      match screen {
        JoinScreen::Failed => Some(SERVER_ERROR.to_owned()),
        _ => None,
      },
    ),
  };

  let (status, style) = if !app.status_msg.is_empty() {
    (app.status_msg.clone(), Style::default().fg(Color::Yellow))
  } else if let Some(err) = view_error {
    (err, Style::default().fg(Color::Red))
  } else {
    (hints.to_owned(), Style::default().fg(Color::DarkGray))
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let line = Line::from(vec![mode_span, Span::styled(format!("  {status}"), style)]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
