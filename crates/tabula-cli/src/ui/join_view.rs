//! Join screen — clause selectors above the result table.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

use crate::{
  app::{JoinField, JoinScreen, join_fields},
  join::{JoinQueryBuilder, JoinResult, NOT_ENOUGH_TABLES, SERVER_ERROR, Side},
};

pub fn draw(f: &mut Frame, area: Rect, screen: &JoinScreen) {
  let (builder, focus) = match screen {
    JoinScreen::Ready { builder, focus } => (builder, *focus),
    JoinScreen::Unavailable => return draw_message(f, area, NOT_ENOUGH_TABLES, Color::Red),
    JoinScreen::Failed => return draw_message(f, area, SERVER_ERROR, Color::Red),
  };

  let form_height = 3 + builder.clauses().len() as u16 * 2;
  let panes = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(form_height), Constraint::Min(0)])
    .split(area);

  draw_form(f, panes[0], builder, focus);
  draw_result(f, panes[1], builder.result());
}

fn draw_message(f: &mut Frame, area: Rect, text: &str, color: Color) {
  let block = Block::default()
    .title(" Join ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(
    Paragraph::new(Span::styled(text.to_owned(), Style::default().fg(color))),
    inner,
  );
}

// ─── Form ─────────────────────────────────────────────────────────────────────

fn draw_form(f: &mut Frame, area: Rect, builder: &JoinQueryBuilder, focus: usize) {
  let focused = join_fields(builder).get(focus).copied();
  let selector = |field: JoinField, value: &str| -> Span<'static> {
    let style = if Some(field) == focused {
      Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::White)
    };
    Span::styled(format!("‹{value}›"), style)
  };
  let label = |text: &str| Span::styled(text.to_owned(), Style::default().fg(Color::DarkGray));

  let mut lines = vec![Line::from(vec![
    label("SELECT * FROM "),
    selector(JoinField::Primary, builder.primary_table()),
  ])];
  for (i, clause) in builder.clauses().iter().enumerate() {
    lines.push(Line::from(vec![
      label("  JOIN "),
      selector(JoinField::Secondary(i), &clause.secondary_table),
    ]));
    lines.push(Line::from(vec![
      label("    ON "),
      selector(JoinField::Table(i, Side::Left), &clause.left_table),
      label("."),
      selector(JoinField::Column(i, Side::Left), &clause.left_column),
      label(" = "),
      selector(JoinField::Table(i, Side::Right), &clause.right_table),
      label("."),
      selector(JoinField::Column(i, Side::Right), &clause.right_column),
    ]));
  }

  let title = format!(
    " Join ({}/{} clauses{}{}) ",
    builder.clauses().len(),
    builder.max_clauses(),
    if builder.can_add() { "  a add" } else { "" },
    if builder.can_remove() { "  x remove" } else { "" },
  );
  f.render_widget(
    Paragraph::new(lines).block(
      Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray)),
    ),
    area,
  );
}

// ─── Result ───────────────────────────────────────────────────────────────────

fn draw_result(f: &mut Frame, area: Rect, result: &JoinResult) {
  match result {
    // An empty result looks exactly like no query at all.
    JoinResult::Nothing => {}
    JoinResult::ServerError => draw_message(f, area, SERVER_ERROR, Color::Red),
    JoinResult::Rows(table) => {
      let header = Row::new(table.header.iter().map(|h| Cell::from(h.as_str())))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
      let rows = table
        .rows
        .iter()
        .map(|r| Row::new(r.iter().map(|c| Cell::from(c.as_str()))));
      let widths = vec![Constraint::Fill(1); table.header.len()];
      f.render_widget(
        Table::new(rows, widths).header(header).block(
          Block::default()
            .title(format!(" Result ({} rows) ", table.rows.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
        ),
        area,
      );
    }
  }
}
