//! Authoring form.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::Style,
  text::{Line, Span},
  widgets::{Paragraph, Wrap},
};

use super::{cursor, dim, panel};
use crate::compose::{ComposeForm, Field, SUMMARY_INPUT_LIMIT};

pub fn draw(f: &mut Frame, area: Rect, form: &ComposeForm) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(3),      // date + location
      Constraint::Length(3),      // persons
      Constraint::Length(3),      // companions
      Constraint::Length(3),      // title
      Constraint::Min(5),         // body
      Constraint::Percentage(30), // summary
    ])
    .split(area);
  let top = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Length(18), Constraint::Min(0)])
    .split(rows[0]);

  text(f, top[0], form, Field::Date, &form.date);
  text(f, top[1], form, Field::Location, &form.location);
  chips(
    f,
    rows[1],
    form,
    Field::Persons,
    form.persons.iter().map(|c| format!("{} ({})", c.name, c.company)),
  );
  chips(
    f,
    rows[2],
    form,
    Field::Companions,
    form.companions.iter().map(|c| c.name.clone()),
  );
  text(f, rows[3], form, Field::Title, &form.title);
  text(f, rows[4], form, Field::Body, &form.body);
  text(f, rows[5], form, Field::Summary, &form.summary);
}

fn title_for(form: &ComposeForm, field: Field) -> String {
  match field {
    Field::Body => {
      let count = form.body.chars().count();
      format!("{} {count}/{SUMMARY_INPUT_LIMIT}", field.label())
    }
    Field::Summary if form.is_summarizing() => format!("{} (generating…)", field.label()),
    Field::Title if form.is_saving() => format!("{} (saving…)", field.label()),
    Field::Title if form.editing().is_some() => format!("{} (editing draft)", field.label()),
    _ => field.label().to_string(),
  }
}

fn text(f: &mut Frame, area: Rect, form: &ComposeForm, field: Field, value: &str) {
  let focused = form.focus == field;
  let title = title_for(form, field);
  let block = panel(&title, focused);
  let content = if focused {
    format!("{value}_")
  } else {
    value.to_string()
  };
  f.render_widget(
    Paragraph::new(content).block(block).wrap(Wrap { trim: false }),
    area,
  );
}

fn chips(
  f: &mut Frame,
  area: Rect,
  form: &ComposeForm,
  field: Field,
  entries: impl Iterator<Item = String>,
) {
  let focused = form.focus == field;
  let mut spans: Vec<Span> = entries
    .enumerate()
    .flat_map(|(i, name)| {
      let style = if focused && i == form.chip {
        cursor()
      } else {
        Style::default()
      };
      [Span::styled(format!("[{name}]"), style), Span::raw(" ")]
    })
    .collect();
  if spans.is_empty() {
    let hint = if focused { "Press Enter to add." } else { "none" };
    spans.push(Span::styled(hint, dim()));
  }
  f.render_widget(
    Paragraph::new(Line::from(spans)).block(panel(field.label(), focused)),
    area,
  );
}
