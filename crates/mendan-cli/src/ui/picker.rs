//! Person / coworker search modal.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Style},
  text::{Line, Span},
  widgets::{List, ListItem, ListState, Paragraph},
};

use super::{cursor, dim, label, overlay, panel};
use crate::picker::{Phase, Picker};

pub fn draw(f: &mut Frame, area: Rect, picker: &Picker) {
  let rect = overlay(f, area, 60, 16);
  let block = panel(picker.target().title(), true);
  let inner = block.inner(rect);
  f.render_widget(block, rect);

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(2), // keyword
      Constraint::Min(0),    // results
      Constraint::Length(1), // pager
    ])
    .split(inner);

  f.render_widget(
    Paragraph::new(Line::from(vec![
      Span::styled("Keyword  ", label()),
      Span::raw(format!("{}_", picker.keyword())),
    ])),
    rows[0],
  );

  match picker.phase() {
    Phase::Closed => {}
    Phase::Idle => {
      f.render_widget(Paragraph::new("Enter a keyword and press Enter.").style(dim()), rows[1]);
    }
    Phase::Loading => {
      f.render_widget(Paragraph::new("Searching…").style(dim()), rows[1]);
    }
    Phase::Results if picker.results().is_empty() => {
      f.render_widget(Paragraph::new("No results").style(dim()), rows[1]);
    }
    Phase::Results => {
      let target = picker.target();
      let items: Vec<ListItem> = picker
        .results()
        .iter()
        .map(|hit| {
          let mut spans = vec![Span::raw(hit.name.clone())];
          if let Some(aff) = hit.affiliation(target) {
            spans.push(Span::styled(format!("  {aff}"), dim()));
          }
          if let Some(pos) = &hit.position {
            spans.push(Span::styled(format!("  {pos}"), dim()));
          }
          ListItem::new(Line::from(spans))
        })
        .collect();
      let mut state = ListState::default();
      state.select(Some(picker.cursor));
      f.render_stateful_widget(
        List::new(items).highlight_style(cursor()),
        rows[1],
        &mut state,
      );
    }
  }

  let window = picker.window();
  let arrow = |on: bool, s: &'static str| {
    Span::styled(
      s,
      if on {
        Style::default().fg(Color::White)
      } else {
        dim()
      },
    )
  };
  let mut pager = vec![
    arrow(window.has_prev(), "← prev  "),
    Span::raw(window.label()),
    arrow(window.has_next(), "  next →"),
  ];
  if picker.is_resolving() {
    pager.push(Span::styled("  adding…", dim()));
  }
  f.render_widget(Paragraph::new(Line::from(pager)), rows[2]);
}
