//! Main menu.

use mendan_core::model::Coworker;
use ratatui::{
  Frame,
  layout::Rect,
  text::{Line, Span},
  widgets::{List, ListItem, ListState, Paragraph},
};

use super::{cursor as cursor_style, dim, overlay, panel};
use crate::app::MENU;

pub fn draw(f: &mut Frame, area: Rect, cursor: usize, user: Option<&Coworker>) {
  let rect = overlay(f, area, 40, MENU.len() as u16 + 5);
  let block = panel("Menu", true);
  let inner = block.inner(rect);
  f.render_widget(block, rect);

  let greeting = match user {
    Some(u) => format!("Hello, {}.", u.name),
    None => "Hello.".into(),
  };
  let head = Rect { height: 2, ..inner };
  f.render_widget(Paragraph::new(Line::styled(greeting, dim())), head);

  let items: Vec<ListItem> = MENU
    .iter()
    .map(|(name, _)| ListItem::new(Line::from(Span::raw(format!("  {name}")))))
    .collect();
  let mut state = ListState::default();
  state.select(Some(cursor));

  let body = Rect {
    y: inner.y + 2,
    height: inner.height.saturating_sub(2),
    ..inner
  };
  f.render_stateful_widget(
    List::new(items).highlight_style(cursor_style()),
    body,
    &mut state,
  );
}
