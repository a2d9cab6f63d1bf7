//! TUI rendering: orchestrates all screens and overlays.

pub mod compose;
pub mod dialog;
pub mod login;
pub mod menu;
pub mod picker;
pub mod records;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph},
};

use crate::{
  app::{App, Screen},
  compose::Field,
};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  match &app.screen {
    Screen::Login(form) => login::draw(f, rows[1], form),
    Screen::Menu { cursor } => menu::draw(f, rows[1], *cursor, app.user().as_ref()),
    Screen::Compose { form, .. } => compose::draw(f, rows[1], form),
    Screen::Records(list) => records::draw(f, rows[1], list),
  }
  draw_status(f, rows[2], app);

  if app.picker.is_open() {
    picker::draw(f, area, &app.picker);
  }
  if let Some(d) = &app.dialog {
    dialog::draw(f, area, d);
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    format!(" mendan  {}", app.route().title()),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let who = app
    .user()
    .map(|u| format!("{}  ", u.name))
    .unwrap_or_default();
  let right = Span::styled(
    format!("{who}{date} "),
    Style::default().fg(Color::Gray),
  );

  // Simple left-right header: pad the middle.
  let left_width = left.width() as u16;
  let right_width = right.width() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = if app.dialog.is_some() {
    ("CONFIRM", "y/Enter yes  n/Esc no")
  } else if app.picker.is_open() {
    (
      "PICK",
      "Type keyword  Enter search/select  ←→ page  ↑↓ move  Esc close",
    )
  } else {
    match &app.screen {
      Screen::Login(_) => ("SIGN IN", "Tab switch field  Enter sign in  Ctrl-C quit"),
      Screen::Menu { .. } => ("MENU", "↑↓/jk move  Enter open  q quit"),
      Screen::Compose { form, .. } => match form.focus {
        Field::Persons | Field::Companions => (
          "COMPOSE",
          "Enter add  ←→ pick  Del remove  Tab next  ^S save  ^D draft  Esc discard",
        ),
        _ => (
          "COMPOSE",
          "Tab next field  ^G summarize  ^S save  ^D save draft  Esc discard",
        ),
      },
      Screen::Records(list) if list.detail.is_some() => ("DETAIL", "↑↓/jk scroll  Esc back"),
      Screen::Records(list) if list.editing_keyword => {
        ("SEARCH", "Type keyword  Enter search  Esc cancel")
      }
      Screen::Records(_) => (
        "LIST",
        "↑↓/jk move  Enter view  [ ] page  d discard  e edit  / search  Esc menu",
      ),
    }
  };

  let status = if app.status.is_empty() {
    hints.to_string()
  } else {
    app.status.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(
    format!("  {status}"),
    Style::default().fg(Color::DarkGray),
  );

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}

// ─── Shared helpers ───────────────────────────────────────────────────────────

/// A bordered block with the usual styling; highlighted when focused.
pub(crate) fn panel(title: &str, focused: bool) -> Block<'_> {
  let border = if focused {
    Style::default().fg(Color::Cyan)
  } else {
    Style::default().fg(Color::DarkGray)
  };
  Block::default()
    .title(format!(" {title} "))
    .borders(Borders::ALL)
    .border_style(border)
}

/// Clear and return a centered rectangle of `width` x `height` cells.
pub(crate) fn overlay(f: &mut Frame, area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  let rect = Rect {
    x: area.x + (area.width - width) / 2,
    y: area.y + (area.height - height) / 2,
    width,
    height,
  };
  f.render_widget(Clear, rect);
  rect
}

pub(crate) fn dim() -> Style { Style::default().fg(Color::DarkGray) }

pub(crate) fn label() -> Style {
  Style::default()
    .fg(Color::Cyan)
    .add_modifier(Modifier::BOLD)
}

pub(crate) fn cursor() -> Style {
  Style::default()
    .bg(Color::Blue)
    .fg(Color::White)
    .add_modifier(Modifier::BOLD)
}
