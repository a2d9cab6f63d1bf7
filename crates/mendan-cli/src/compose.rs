//! The meeting-record authoring form.
//!
//! Holds the people involved, the free-text fields and the two in-flight
//! flags. Like the picker, each request is split into a `begin_*` half that
//! validates and builds the payload and a `finish_*` half that applies the
//! answer and yields the message to show.

use chrono::NaiveDate;
use mendan_core::{
  ApiError, Result,
  api::RecordApi,
  model::{BusinessCard, Contact, ContactFormData, ContactStatus, Coworker, Picked},
  selection::Selection,
};
use thiserror::Error;

/// Longest body, in characters, the summarizer accepts.
pub const SUMMARY_INPUT_LIMIT: usize = 10_000;

/// Reasons an action is refused before any request goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Invalid {
  #[error("Enter the meeting notes before summarizing.")]
  EmptyBody,
  #[error("Notes must be 10,000 characters or fewer to summarize.")]
  BodyTooLong,
  #[error("Select at least one contact person.")]
  NoPersons,
  #[error("Dates must look like YYYY-MM-DD.")]
  BadDate,
  #[error("Still working on the previous request.")]
  Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Date,
  Location,
  Persons,
  Companions,
  Title,
  Body,
  Summary,
}

impl Field {
  const ORDER: [Field; 7] = [
    Field::Date,
    Field::Location,
    Field::Persons,
    Field::Companions,
    Field::Title,
    Field::Body,
    Field::Summary,
  ];

  fn index(self) -> usize {
    Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
  }

  pub fn next(self) -> Self { Self::ORDER[(self.index() + 1) % Self::ORDER.len()] }

  pub fn prev(self) -> Self {
    Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Date => "Date",
      Self::Location => "Location",
      Self::Persons => "Contact persons",
      Self::Companions => "Companions",
      Self::Title => "Title",
      Self::Body => "Notes",
      Self::Summary => "Summary",
    }
  }

  /// Fields that take free text.
  pub fn is_text(self) -> bool { !matches!(self, Self::Persons | Self::Companions) }

  /// Fields where Enter inserts a newline.
  pub fn is_multiline(self) -> bool { matches!(self, Self::Body | Self::Summary) }
}

#[derive(Debug, Clone)]
pub struct ComposeForm {
  /// The draft being edited, if this form was opened on one.
  editing:        Option<i64>,
  pub persons:    Selection<BusinessCard>,
  pub companions: Selection<Coworker>,
  pub date:       String,
  pub location:   String,
  pub title:      String,
  pub body:       String,
  pub summary:    String,
  /// Carried through unchanged when editing a draft.
  details:        Option<String>,
  pub focus:      Field,
  /// Highlighted entry in the focused selection list.
  pub chip:       usize,
  saving:         bool,
  summarizing:    bool,
}

impl ComposeForm {
  /// A blank form dated `today`.
  pub fn new(today: NaiveDate) -> Self {
    Self {
      editing:     None,
      persons:     Selection::new(),
      companions:  Selection::new(),
      date:        today.format("%Y-%m-%d").to_string(),
      location:    String::new(),
      title:       String::new(),
      body:        String::new(),
      summary:     String::new(),
      details:     None,
      focus:       Field::Date,
      chip:        0,
      saving:      false,
      summarizing: false,
    }
  }

  /// A form holding an existing draft; saving it updates that draft.
  pub fn from_draft(contact: Contact) -> Self {
    Self {
      editing:     Some(contact.id),
      persons:     contact.persons.into_iter().collect(),
      companions:  contact.companions.into_iter().collect(),
      date:        contact
        .contact_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default(),
      location:    contact.location.unwrap_or_default(),
      title:       contact.title.unwrap_or_default(),
      body:        contact.raw_text.unwrap_or_default(),
      summary:     contact.summary_text.unwrap_or_default(),
      details:     contact.details,
      focus:       Field::Date,
      chip:        0,
      saving:      false,
      summarizing: false,
    }
  }

  pub fn editing(&self) -> Option<i64> { self.editing }

  pub fn is_saving(&self) -> bool { self.saving }

  pub fn is_summarizing(&self) -> bool { self.summarizing }

  // ── Participants ──────────────────────────────────────────────────────────

  pub fn add_person(&mut self, card: BusinessCard) -> bool { self.persons.insert(card) }

  pub fn add_companion(&mut self, coworker: Coworker) -> bool {
    self.companions.insert(coworker)
  }

  /// Add whatever a picker handed back to the matching list.
  pub fn add_picked(&mut self, picked: Picked) -> bool {
    match picked {
      Picked::Card(card) => self.add_person(card),
      Picked::Coworker(coworker) => self.add_companion(coworker),
    }
  }

  pub fn remove_person(&mut self, id: i64) -> Option<BusinessCard> {
    let removed = self.persons.remove(id);
    self.clamp_chip();
    removed
  }

  pub fn remove_companion(&mut self, id: i64) -> Option<Coworker> {
    let removed = self.companions.remove(id);
    self.clamp_chip();
    removed
  }

  /// Drop the highlighted entry of the focused selection list.
  pub fn remove_highlighted(&mut self) {
    match self.focus {
      Field::Persons => {
        if let Some(id) = self.persons.get(self.chip).map(|c| c.id) {
          self.remove_person(id);
        }
      }
      Field::Companions => {
        if let Some(id) = self.companions.get(self.chip).map(|c| c.id) {
          self.remove_companion(id);
        }
      }
      _ => {}
    }
  }

  fn focused_len(&self) -> usize {
    match self.focus {
      Field::Persons => self.persons.len(),
      Field::Companions => self.companions.len(),
      _ => 0,
    }
  }

  fn clamp_chip(&mut self) {
    self.chip = self.chip.min(self.focused_len().saturating_sub(1));
  }

  pub fn chip_next(&mut self) {
    if self.chip + 1 < self.focused_len() {
      self.chip += 1;
    }
  }

  pub fn chip_prev(&mut self) { self.chip = self.chip.saturating_sub(1); }

  // ── Focus and text ────────────────────────────────────────────────────────

  pub fn focus_next(&mut self) {
    self.focus = self.focus.next();
    self.chip = 0;
  }

  pub fn focus_prev(&mut self) {
    self.focus = self.focus.prev();
    self.chip = 0;
  }

  fn text_mut(&mut self, field: Field) -> Option<&mut String> {
    match field {
      Field::Date => Some(&mut self.date),
      Field::Location => Some(&mut self.location),
      Field::Title => Some(&mut self.title),
      Field::Body => Some(&mut self.body),
      Field::Summary => Some(&mut self.summary),
      Field::Persons | Field::Companions => None,
    }
  }

  pub fn push_char(&mut self, c: char) {
    let focus = self.focus;
    if let Some(text) = self.text_mut(focus) {
      text.push(c);
    }
  }

  pub fn pop_char(&mut self) {
    let focus = self.focus;
    if let Some(text) = self.text_mut(focus) {
      text.pop();
    }
  }

  pub fn newline(&mut self) {
    if self.focus.is_multiline() {
      self.push_char('\n');
    }
  }

  // ── Summarizing ───────────────────────────────────────────────────────────

  /// Validate the body and mark a summary as in flight. Returns the text to
  /// send.
  pub fn begin_summarize(&mut self) -> std::result::Result<String, Invalid> {
    if self.summarizing {
      return Err(Invalid::Busy);
    }
    if self.body.trim().is_empty() {
      return Err(Invalid::EmptyBody);
    }
    if self.body.chars().count() > SUMMARY_INPUT_LIMIT {
      return Err(Invalid::BodyTooLong);
    }
    self.summarizing = true;
    Ok(self.body.clone())
  }

  /// Apply a summary answer and return the message to show.
  ///
  /// A generated summary replaces whatever was in the field.
  pub fn finish_summarize(&mut self, result: Result<String>) -> String {
    self.summarizing = false;
    match result {
      Ok(summary) => {
        self.summary = summary;
        "Summary generated.".into()
      }
      Err(e) => {
        tracing::warn!(error = %e, "summary generation failed");
        summary_failure_message(&e)
      }
    }
  }

  // ── Saving ────────────────────────────────────────────────────────────────

  /// Validate the form and mark a save as in flight. Returns the payload.
  pub fn begin_submit(
    &mut self,
    status: ContactStatus,
  ) -> std::result::Result<ContactFormData, Invalid> {
    if self.saving {
      return Err(Invalid::Busy);
    }
    if self.persons.is_empty() {
      return Err(Invalid::NoPersons);
    }
    let contact_date = match self.date.trim() {
      "" => None,
      raw => Some(
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| Invalid::BadDate)?,
      ),
    };

    let form = ContactFormData {
      contact_date,
      location: present(&self.location),
      title: present(&self.title),
      summary_text: present(&self.summary),
      raw_text: present(&self.body),
      details: self.details.clone(),
      status,
      person_ids: self.persons.keys(),
      companion_ids: self.companions.keys(),
    };
    self.saving = true;
    Ok(form)
  }

  /// Apply a save answer. `Ok` carries the success message, `Err` the
  /// failure message; the form is left intact either way.
  pub fn finish_submit(
    &mut self,
    status: ContactStatus,
    result: Result<Contact>,
  ) -> std::result::Result<&'static str, &'static str> {
    self.saving = false;
    match result {
      Ok(contact) => {
        tracing::info!(id = contact.id, ?status, "meeting record saved");
        Ok(match status {
          ContactStatus::Finalized => "Meeting record saved.",
          ContactStatus::Draft => "Draft saved.",
        })
      }
      Err(e) => {
        tracing::warn!(error = %e, "saving meeting record failed");
        Err("Saving failed.")
      }
    }
  }
}

/// `None` for blank input, the untrimmed text otherwise.
fn present(text: &str) -> Option<String> {
  (!text.trim().is_empty()).then(|| text.to_owned())
}

/// What to tell the user when summarizing fails.
pub fn summary_failure_message(err: &ApiError) -> String {
  if let Some(detail) = err.detail() {
    return detail.to_owned();
  }
  match err.status() {
    Some(400) => "There is a problem with the input.".into(),
    Some(500) => "A server error occurred.".into(),
    _ if err.is_offline() => "Check your network connection.".into(),
    _ => "Summary generation failed.".into(),
  }
}

/// Create a record, or update `editing` when the form holds a draft.
pub async fn save<A: RecordApi>(
  api: &A,
  editing: Option<i64>,
  form: &ContactFormData,
) -> Result<Contact> {
  match editing {
    Some(id) => api.update_contact(id, form).await,
    None => api.create_contact(form).await,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fake::{FakeApi, card, contact, coworker};

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 7, 1).unwrap() }

  fn form_with_person() -> ComposeForm {
    let mut form = ComposeForm::new(today());
    form.add_person(card(101, "Yamada Kenji", "Acme KK"));
    form
  }

  #[test]
  fn selections_ignore_duplicates() {
    let mut form = ComposeForm::new(today());
    assert!(form.add_person(card(1, "A", "X")));
    assert!(!form.add_person(card(1, "A again", "X")));
    assert!(form.add_picked(Picked::Coworker(coworker(7, "B"))));
    assert!(!form.add_picked(Picked::Coworker(coworker(7, "B"))));
    assert_eq!(form.persons.keys(), vec![1]);
    assert_eq!(form.companions.keys(), vec![7]);

    assert!(form.remove_person(1).is_some());
    assert!(form.remove_person(1).is_none());
    assert!(form.remove_companion(7).is_some());
  }

  #[test]
  fn remove_highlighted_drops_focused_entry() {
    let mut form = ComposeForm::new(today());
    form.add_person(card(1, "A", "X"));
    form.add_person(card(2, "B", "X"));
    form.focus = Field::Persons;
    form.chip_next();
    form.remove_highlighted();
    assert_eq!(form.persons.keys(), vec![1]);
    assert_eq!(form.chip, 0);
  }

  #[test]
  fn summarize_validates_body() {
    let mut form = ComposeForm::new(today());
    form.body = "   \n ".into();
    assert_eq!(form.begin_summarize(), Err(Invalid::EmptyBody));

    form.body = "x".repeat(SUMMARY_INPUT_LIMIT + 1);
    assert_eq!(form.begin_summarize(), Err(Invalid::BodyTooLong));
    assert!(!form.is_summarizing());

    // Surrounding whitespace still counts towards the limit.
    form.body = format!("{}\n", "a".repeat(SUMMARY_INPUT_LIMIT));
    assert_eq!(form.begin_summarize(), Err(Invalid::BodyTooLong));
    assert!(!form.is_summarizing());

    form.body = "あ".repeat(SUMMARY_INPUT_LIMIT);
    assert!(form.begin_summarize().is_ok());
    assert_eq!(form.begin_summarize(), Err(Invalid::Busy));
  }

  #[tokio::test]
  async fn summary_overwrites_field() {
    let api = FakeApi::default();
    let mut form = ComposeForm::new(today());
    form.body = "  Talked about the roadmap.  ".into();
    form.summary = "old summary".into();

    let text = form.begin_summarize().unwrap();
    assert_eq!(text, "  Talked about the roadmap.  ");
    let message = form.finish_summarize(api.summarize(&text).await);
    assert_eq!(message, "Summary generated.");
    assert_eq!(form.summary, "summary:   Talked a");
    assert!(!form.is_summarizing());
  }

  #[test]
  fn summary_failures_map_to_messages() {
    let cases = [
      (
        ApiError::Status {
          status: 500,
          detail: Some("Model unavailable".into()),
        },
        "Model unavailable",
      ),
      (
        ApiError::Status {
          status: 400,
          detail: None,
        },
        "There is a problem with the input.",
      ),
      (
        ApiError::Status {
          status: 500,
          detail: None,
        },
        "A server error occurred.",
      ),
      (
        ApiError::Transport {
          offline: true,
          message: "refused".into(),
        },
        "Check your network connection.",
      ),
      (
        ApiError::Status {
          status: 502,
          detail: None,
        },
        "Summary generation failed.",
      ),
    ];
    for (err, expected) in cases {
      assert_eq!(summary_failure_message(&err), expected, "{err:?}");
    }
  }

  #[test]
  fn failed_summary_keeps_existing_text() {
    let mut form = ComposeForm::new(today());
    form.body = "notes".into();
    form.summary = "keep me".into();
    form.begin_summarize().unwrap();
    form.finish_summarize(Err(ApiError::Decode("bad".into())));
    assert_eq!(form.summary, "keep me");
  }

  #[test]
  fn submit_requires_a_person() {
    let mut form = ComposeForm::new(today());
    form.add_companion(coworker(1, "Sato Hanako"));
    for status in [ContactStatus::Draft, ContactStatus::Finalized] {
      assert_eq!(form.begin_submit(status), Err(Invalid::NoPersons));
    }
    assert!(!form.is_saving());
  }

  #[test]
  fn submit_rejects_malformed_date() {
    let mut form = form_with_person();
    form.date = "01/07/2024".into();
    assert_eq!(
      form.begin_submit(ContactStatus::Draft),
      Err(Invalid::BadDate)
    );
  }

  #[test]
  fn blank_fields_are_sent_as_absent() {
    let mut form = form_with_person();
    form.add_companion(coworker(3, "Tanaka Ichiro"));
    form.date.clear();
    form.title = "  ".into();
    form.body = "Agreed on terms.".into();

    let data = form.begin_submit(ContactStatus::Finalized).unwrap();
    assert_eq!(data.contact_date, None);
    assert_eq!(data.location, None);
    assert_eq!(data.title, None);
    assert_eq!(data.summary_text, None);
    assert_eq!(data.raw_text.as_deref(), Some("Agreed on terms."));
    assert_eq!(data.person_ids, vec![101]);
    assert_eq!(data.companion_ids, vec![3]);
    assert!(form.is_saving());
    assert_eq!(
      form.begin_submit(ContactStatus::Finalized),
      Err(Invalid::Busy)
    );
  }

  #[tokio::test]
  async fn new_form_creates_and_draft_form_updates() {
    let api = FakeApi::default();

    let mut fresh = form_with_person();
    let created = fresh.begin_submit(ContactStatus::Finalized).unwrap();
    assert_eq!(created.contact_date, Some(today()));
    let result = save(&api, fresh.editing(), &created).await;
    assert_eq!(
      fresh.finish_submit(ContactStatus::Finalized, result),
      Ok("Meeting record saved.")
    );

    let mut draft = ComposeForm::from_draft(contact(42, ContactStatus::Draft));
    assert_eq!(draft.editing(), Some(42));
    assert_eq!(draft.title, "Meeting 42");
    assert_eq!(draft.date, "2024-06-01");
    let updated = draft.begin_submit(ContactStatus::Draft).unwrap();
    let result = save(&api, draft.editing(), &updated).await;
    assert_eq!(
      draft.finish_submit(ContactStatus::Draft, result),
      Ok("Draft saved.")
    );

    assert_eq!(api.calls(), vec!["create_contact", "update_contact"]);
    let saved = api.saved();
    assert_eq!(saved, vec![created, updated]);
    assert_eq!(saved[0].status, ContactStatus::Finalized);
    assert_eq!(saved[1].status, ContactStatus::Draft);
  }

  #[tokio::test]
  async fn failed_save_keeps_form() {
    let api = FakeApi::default();
    api.fail_with(ApiError::Status {
      status: 422,
      detail: Some("persons: field required".into()),
    });
    let mut form = form_with_person();
    form.title = "Kickoff".into();

    let data = form.begin_submit(ContactStatus::Finalized).unwrap();
    let result = save(&api, None, &data).await;
    assert_eq!(
      form.finish_submit(ContactStatus::Finalized, result),
      Err("Saving failed.")
    );
    assert_eq!(form.title, "Kickoff");
    assert_eq!(form.persons.len(), 1);
    assert!(!form.is_saving());
  }

  #[test]
  fn focus_cycles_through_fields() {
    let mut form = ComposeForm::new(today());
    for _ in 0..7 {
      form.focus_next();
    }
    assert_eq!(form.focus, Field::Date);
    form.focus_prev();
    assert_eq!(form.focus, Field::Summary);
    form.push_char('a');
    form.newline();
    form.push_char('b');
    assert_eq!(form.summary, "a\nb");
  }
}
