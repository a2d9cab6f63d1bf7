//! Alert and confirmation overlays.

use ratatui::{
  Frame,
  layout::Rect,
  text::Line,
  widgets::{Paragraph, Wrap},
};

use super::{dim, overlay, panel};
use crate::app::Dialog;

pub fn draw(f: &mut Frame, area: Rect, dialog: &Dialog) {
  let (title, message, hint) = match dialog {
    Dialog::Alert(message) => ("Notice", message, "Press any key"),
    Dialog::Confirm { message, .. } => ("Confirm", message, "[y] yes  [n] no"),
  };
  let rect = overlay(f, area, 50, 7);
  let block = panel(title, true);
  let lines = vec![
    Line::from(""),
    Line::from(message.as_str()),
    Line::from(""),
    Line::styled(hint, dim()),
  ];
  f.render_widget(
    Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
    rect,
  );
}
