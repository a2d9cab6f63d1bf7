//! Record lists and the read-only record view.

use mendan_core::model::Contact;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Style},
  text::{Line, Span},
  widgets::{Paragraph, Row, Table, TableState, Wrap},
};

use super::{cursor, dim, label, overlay, panel};
use crate::records::{ListMode, RecordList, creator_of, format_date, persons_of, title_of};

pub fn draw(f: &mut Frame, area: Rect, list: &RecordList) {
  let title = match list.mode() {
    ListMode::Drafts => "Drafts",
    ListMode::History => "History",
    ListMode::Search => "Search records",
  };
  let block = panel(title, true);
  let mut inner = block.inner(area);
  f.render_widget(block, area);

  // Keyword bar on top in search mode.
  if list.mode() == ListMode::Search {
    let bar = Rect { height: 1, ..inner };
    let caret = if list.editing_keyword { "_" } else { "" };
    let style = if list.editing_keyword {
      Style::default().fg(Color::Yellow)
    } else {
      dim()
    };
    f.render_widget(
      Paragraph::new(format!("/{}{caret}", list.keyword)).style(style),
      bar,
    );
    inner.y += 2;
    inner.height = inner.height.saturating_sub(2);
  }

  let parts = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Min(0), Constraint::Length(1)])
    .split(inner);

  if list.rows().is_empty() {
    let message = if list.is_loading() {
      "Loading…"
    } else if list.is_loaded() {
      list.mode().empty_message()
    } else if list.mode() == ListMode::Search {
      "Type a keyword and press Enter."
    } else {
      ""
    };
    f.render_widget(Paragraph::new(message).style(dim()), parts[0]);
  } else {
    let rows = list.rows().iter().map(|c| {
      Row::new(vec![
        format_date(c.contact_date),
        title_of(c).to_string(),
        persons_of(c),
        creator_of(c).to_string(),
      ])
    });
    let mut state = TableState::default();
    state.select(Some(list.cursor));
    f.render_stateful_widget(
      Table::new(rows, [
        Constraint::Length(11),
        Constraint::Percentage(40),
        Constraint::Percentage(35),
        Constraint::Min(8),
      ])
      .header(Row::new(vec!["Date", "Title", "Persons", "Creator"]).style(label()))
      .row_highlight_style(cursor()),
      parts[0],
      &mut state,
    );
  }

  let window = list.window();
  let mut pager = vec![Span::raw(format!("page {}", window.page()))];
  if window.has_prev() {
    pager.push(Span::styled("  [ prev", dim()));
  }
  if window.has_next() {
    pager.push(Span::styled("  ] next", dim()));
  }
  f.render_widget(Paragraph::new(Line::from(pager)), parts[1]);

  if let Some(contact) = &list.detail {
    draw_detail(f, area, contact, list.detail_scroll);
  }
}

fn draw_detail(f: &mut Frame, area: Rect, contact: &Contact, scroll: u16) {
  let rect = overlay(
    f,
    area,
    area.width.saturating_sub(8),
    area.height.saturating_sub(2),
  );

  let field = |name: &'static str, value: String| {
    Line::from(vec![Span::styled(format!("{name:<12}"), label()), Span::raw(value)])
  };
  let companions = contact
    .companions
    .iter()
    .map(|c| c.name.as_str())
    .collect::<Vec<_>>()
    .join(", ");

  let mut lines = vec![
    field("Date", format_date(contact.contact_date)),
    field("Location", contact.location.clone().unwrap_or_default()),
    field("Title", title_of(contact).to_string()),
    field("Persons", persons_of(contact)),
    field("Companions", companions),
    field("Created by", creator_of(contact).to_string()),
    Line::from(""),
    Line::styled("Summary", label()),
  ];
  lines.extend(
    contact
      .summary_text
      .as_deref()
      .unwrap_or("")
      .lines()
      .map(|l| Line::from(l.to_string())),
  );
  lines.push(Line::from(""));
  lines.push(Line::styled("Notes", label()));
  lines.extend(
    contact
      .raw_text
      .as_deref()
      .unwrap_or("")
      .lines()
      .map(|l| Line::from(l.to_string())),
  );

  f.render_widget(
    Paragraph::new(lines)
      .block(panel(title_of(contact), true))
      .wrap(Wrap { trim: false })
      .scroll((scroll, 0)),
    rect,
  );
}
