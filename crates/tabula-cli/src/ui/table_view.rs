//! Table screen — rows of one table with per-row edit state.

use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  text::Span,
  widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

use crate::{app::TablePage, crud::RowState};

pub fn draw(f: &mut Frame, area: Rect, page: &TablePage) {
  let view = page.controller.view();

  let insert_hint = if view.insert_enabled { "" } else { " [insert pending]" };
  let block = Block::default()
    .title(format!(
      " {} ({} rows){insert_hint} ",
      page.controller.name(),
      page.controller.rows().len()
    ))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  if view.header.is_empty() {
    let inner = block.inner(area);
    f.render_widget(block, area);
    let text = view.error.as_deref().unwrap_or("No columns.");
    f.render_widget(
      Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray))),
      inner,
    );
    return;
  }

  let header = Row::new(view.header.iter().map(|h| {
    Cell::from(h.as_str()).style(Style::default().add_modifier(Modifier::BOLD))
  }))
  .style(Style::default().fg(Color::Cyan));

  let rows = view.rows.iter().enumerate().map(|(r, row)| {
    let editing = row.state != RowState::Viewing;
    let cells = row.cells.iter().enumerate().map(|(c, cell)| {
      let focused = editing && r == page.cursor_row && c == page.cursor_col;
      let text = if focused { format!("{}_", cell.text) } else { cell.text.clone() };
      let style = if focused {
        Style::default().fg(Color::Black).bg(Color::Yellow)
      } else if cell.null {
        Style::default().fg(Color::DarkGray)
      } else {
        Style::default()
      };
      Cell::from(text).style(style)
    });
    let style = match row.state {
      RowState::Viewing => Style::default(),
      RowState::Editing => Style::default().fg(Color::Yellow),
      RowState::InsertPending => Style::default().fg(Color::Green),
    };
    Row::new(cells).style(style)
  });

  let widths = vec![Constraint::Fill(1); view.header.len()];
  let mut state = TableState::default();
  state.select((!view.rows.is_empty()).then_some(page.cursor_row));

  f.render_stateful_widget(
    Table::new(rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
    area,
    &mut state,
  );
}
