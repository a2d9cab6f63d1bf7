//! Sign-in screen.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Style},
  text::{Line, Span},
  widgets::Paragraph,
};

use super::{dim, label, overlay, panel};
use crate::login::{LoginField, LoginForm};

pub fn draw(f: &mut Frame, area: Rect, form: &LoginForm) {
  let rect = overlay(f, area, 48, 9);
  let block = panel("Sign in", true);
  let inner = block.inner(rect);
  f.render_widget(block, rect);

  let field = |name: &str, value: String, which: LoginField| {
    let focused = form.focus == which;
    let caret = if focused { "_" } else { "" };
    Line::from(vec![
      Span::styled(format!("{name:<10}"), label()),
      Span::styled(
        format!("{value}{caret}"),
        if focused { Style::default() } else { dim() },
      ),
    ])
  };

  let mut lines = vec![
    Line::from(""),
    field("User id", form.user_id.clone(), LoginField::UserId),
    field(
      "Password",
      "*".repeat(form.password.chars().count()),
      LoginField::Password,
    ),
    Line::from(""),
  ];
  if form.is_submitting() {
    lines.push(Line::styled("Signing in…", dim()));
  } else if let Some(error) = &form.error {
    lines.push(Line::styled(error.clone(), Style::default().fg(Color::Red)));
  }

  f.render_widget(Paragraph::new(lines), inner);
}
