//! Home screen — the list of tables.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use tabula_core::store::Database;

use crate::app::App;

/// Render the table list into `area`.
pub fn draw<D: Database>(f: &mut Frame, area: Rect, app: &App<D>) {
  let filtered = app.filtered_tables();
  let total = app.tables.len();

  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Tables ({}/{}) ", filtered.len(), total)
  } else {
    format!(" Tables ({total}) ")
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  // Filter bar on the last inner line.
  if (app.filter_active || !app.filter.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      y: inner_area.y + inner_area.height - 1,
      height: 1,
      ..inner_area
    };
    inner_area.height -= 1;

    let filter_text = if app.filter_active {
      format!("/{}_", app.filter)
    } else {
      format!("/{}", app.filter)
    };
    f.render_widget(
      Paragraph::new(filter_text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  let items: Vec<ListItem> = filtered.iter().map(|t| ListItem::new(*t)).collect();

  let mut state = ListState::default();
  state.select((!filtered.is_empty()).then_some(app.list_cursor));

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner_area,
    &mut state,
  );
}
