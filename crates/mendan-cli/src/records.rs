//! Paginated record lists: drafts, history and keyword search.

use chrono::NaiveDate;
use mendan_core::{
  Result,
  api::RecordApi,
  model::{Contact, SearchRequest},
  paging::{LIST_PAGE_SIZE, PageWindow},
};

use crate::ticket::{self, Ticket};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
  Drafts,
  History,
  Search,
}

impl ListMode {
  pub fn empty_message(self) -> &'static str {
    match self {
      Self::Drafts => "No drafts.",
      Self::History => "No meeting records yet.",
      Self::Search => "No matching meeting records.",
    }
  }

  pub fn discard_prompt(self) -> &'static str {
    match self {
      Self::Drafts => "Discard this draft?",
      Self::History | Self::Search => "Discard this meeting record?",
    }
  }

  fn discarded_message(self) -> &'static str {
    match self {
      Self::Drafts => "Draft discarded.",
      Self::History | Self::Search => "Meeting record discarded.",
    }
  }
}

/// A page request, ready to hand to [`run_fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetch {
  Drafts { page: u32, per_page: u32 },
  History { page: u32, per_page: u32 },
  Search(SearchRequest),
}

#[derive(Debug)]
pub struct RecordList {
  mode:                 ListMode,
  pub keyword:          String,
  /// Keystrokes go to the keyword rather than the list.
  pub editing_keyword:  bool,
  rows:                 Vec<Contact>,
  window:               PageWindow,
  /// At least one fetch has completed.
  loaded:               bool,
  pub cursor:           usize,
  pending:              Option<(Ticket, u32)>,
  pending_detail:       Option<Ticket>,
  /// Record shown in the read-only overlay.
  pub detail:           Option<Contact>,
  pub detail_scroll:    u16,
}

impl RecordList {
  pub fn new(mode: ListMode) -> Self {
    Self {
      mode,
      keyword: String::new(),
      editing_keyword: mode == ListMode::Search,
      rows: Vec::new(),
      window: PageWindow::first(LIST_PAGE_SIZE),
      loaded: false,
      cursor: 0,
      pending: None,
      pending_detail: None,
      detail: None,
      detail_scroll: 0,
    }
  }

  pub fn mode(&self) -> ListMode { self.mode }

  pub fn rows(&self) -> &[Contact] { &self.rows }

  pub fn window(&self) -> PageWindow { self.window }

  pub fn is_loading(&self) -> bool { self.pending.is_some() }

  pub fn is_loaded(&self) -> bool { self.loaded }

  pub fn selected(&self) -> Option<&Contact> { self.rows.get(self.cursor) }

  pub fn cursor_down(&mut self) {
    if self.cursor + 1 < self.rows.len() {
      self.cursor += 1;
    }
  }

  pub fn cursor_up(&mut self) { self.cursor = self.cursor.saturating_sub(1); }

  // ── Fetching ──────────────────────────────────────────────────────────────

  /// Start loading `page`. Search mode needs a non-blank keyword.
  pub fn begin_fetch(&mut self, page: u32) -> Option<(Ticket, Fetch)> {
    let page = page.max(1);
    let per_page = LIST_PAGE_SIZE;
    let fetch = match self.mode {
      ListMode::Drafts => Fetch::Drafts { page, per_page },
      ListMode::History => Fetch::History { page, per_page },
      ListMode::Search => {
        let keyword = self.keyword.trim();
        if keyword.is_empty() {
          return None;
        }
        Fetch::Search(SearchRequest {
          keyword: keyword.to_owned(),
          page,
          per_page,
        })
      }
    };
    let ticket = ticket::issue();
    self.pending = Some((ticket, page));
    Some((ticket, fetch))
  }

  /// Reload the page currently shown.
  pub fn refresh(&mut self) -> Option<(Ticket, Fetch)> {
    self.begin_fetch(self.window.page())
  }

  pub fn next_page(&mut self) -> Option<(Ticket, Fetch)> {
    let page = self.window.next()?;
    self.begin_fetch(page)
  }

  pub fn prev_page(&mut self) -> Option<(Ticket, Fetch)> {
    let page = self.window.prev()?;
    self.begin_fetch(page)
  }

  /// Apply the rows for `ticket`. Returns `false` if the answer was stale.
  ///
  /// A failed fetch keeps the rows already shown.
  pub fn finish_fetch(&mut self, ticket: Ticket, result: Result<Vec<Contact>>) -> bool {
    let page = match self.pending {
      Some((t, page)) if t == ticket => page,
      _ => {
        tracing::debug!(ticket, "dropping stale record page");
        return false;
      }
    };
    self.pending = None;

    match result {
      Ok(rows) => {
        self.window = PageWindow::fetched(LIST_PAGE_SIZE, page, rows.len(), None);
        self.rows = rows;
        self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
        self.loaded = true;
      }
      Err(e) => {
        tracing::warn!(error = %e, mode = ?self.mode, page, "loading records failed");
      }
    }
    true
  }

  // ── Detail ────────────────────────────────────────────────────────────────

  /// Start fetching the highlighted record for the read-only view.
  pub fn begin_view(&mut self) -> Option<(Ticket, i64)> {
    let id = self.selected()?.id;
    let ticket = ticket::issue();
    self.pending_detail = Some(ticket);
    Some((ticket, id))
  }

  /// Show the fetched record. `Err` carries the message to show.
  pub fn finish_view(
    &mut self,
    ticket: Ticket,
    result: Result<Contact>,
  ) -> std::result::Result<(), &'static str> {
    if self.pending_detail != Some(ticket) {
      return Ok(());
    }
    self.pending_detail = None;
    match result {
      Ok(contact) => {
        self.detail = Some(contact);
        self.detail_scroll = 0;
        Ok(())
      }
      Err(e) => {
        tracing::warn!(error = %e, "loading meeting record failed");
        Err("Could not load the meeting record.")
      }
    }
  }

  pub fn close_detail(&mut self) {
    self.detail = None;
    self.detail_scroll = 0;
  }

  // ── Discarding ────────────────────────────────────────────────────────────

  /// The message to show once a delete of a row in this list has answered.
  pub fn discard_message(&self, result: &Result<()>) -> &'static str {
    match result {
      Ok(()) => self.mode.discarded_message(),
      Err(e) => {
        tracing::warn!(error = %e, "discarding meeting record failed");
        "Discarding failed."
      }
    }
  }
}

/// Run a page request.
pub async fn run_fetch<A: RecordApi>(api: &A, fetch: &Fetch) -> Result<Vec<Contact>> {
  match fetch {
    Fetch::Drafts { page, per_page } => api.list_drafts(*page, *per_page).await,
    Fetch::History { page, per_page } => api.list_history(*page, *per_page).await,
    Fetch::Search(request) => api.search_contacts(request).await.map(|r| r.items),
  }
}

// ─── Row formatting ──────────────────────────────────────────────────────────

pub fn format_date(date: Option<NaiveDate>) -> String {
  date
    .map(|d| d.format("%Y-%m-%d").to_string())
    .unwrap_or_else(|| "no date".into())
}

pub fn title_of(contact: &Contact) -> &str {
  contact
    .title
    .as_deref()
    .filter(|t| !t.trim().is_empty())
    .unwrap_or("(untitled)")
}

pub fn creator_of(contact: &Contact) -> &str {
  contact
    .creator
    .as_ref()
    .map(|c| c.name.as_str())
    .unwrap_or("unknown")
}

/// Names of the contact persons, comma separated.
pub fn persons_of(contact: &Contact) -> String {
  contact
    .persons
    .iter()
    .map(|p| p.name.as_str())
    .collect::<Vec<_>>()
    .join(", ")
}

#[cfg(test)]
mod tests {
  use mendan_core::{ApiError, model::ContactStatus};

  use super::*;
  use crate::fake::{FakeApi, contact, coworker};

  fn api_with(drafts: i64, finals: i64) -> FakeApi {
    let api = FakeApi::default();
    {
      let mut contacts = api.contacts.lock().unwrap();
      contacts.extend((1..=drafts).map(|id| contact(id, ContactStatus::Draft)));
      contacts.extend(
        (1..=finals).map(|id| contact(1000 + id, ContactStatus::Finalized)),
      );
    }
    api
  }

  async fn load(list: &mut RecordList, api: &FakeApi, request: Option<(Ticket, Fetch)>) {
    let (ticket, fetch) = request.expect("fetch should start");
    let result = run_fetch(api, &fetch).await;
    assert!(list.finish_fetch(ticket, result));
  }

  #[tokio::test]
  async fn exactly_full_last_page_still_offers_next() {
    let api = api_with(20, 0);
    let mut list = RecordList::new(ListMode::Drafts);

    let first = list.begin_fetch(1);
    load(&mut list, &api, first).await;
    assert_eq!(list.rows().len(), 10);
    assert!(!list.window().has_prev());
    assert!(list.window().has_next());

    let second = list.next_page();
    load(&mut list, &api, second).await;
    assert_eq!(list.window().page(), 2);
    assert!(list.window().has_next());

    let third = list.next_page();
    load(&mut list, &api, third).await;
    assert!(list.rows().is_empty());
    assert!(!list.window().has_next());
    assert!(list.window().has_prev());
  }

  #[tokio::test]
  async fn history_lists_finalized_records_only() {
    let api = api_with(3, 4);
    let mut list = RecordList::new(ListMode::History);
    let first = list.begin_fetch(1);
    load(&mut list, &api, first).await;
    assert_eq!(list.rows().len(), 4);
    assert!(!list.window().has_next());
    assert_eq!(api.calls(), vec!["list_history"]);
  }

  #[tokio::test]
  async fn search_needs_a_keyword() {
    let api = api_with(2, 2);
    let mut list = RecordList::new(ListMode::Search);
    assert!(list.editing_keyword);
    assert!(list.begin_fetch(1).is_none());

    list.keyword = " Meeting 1001 ".into();
    let fetch = list.begin_fetch(1);
    load(&mut list, &api, fetch).await;
    assert_eq!(list.rows().len(), 1);
    assert_eq!(list.rows()[0].id, 1001);
  }

  #[tokio::test]
  async fn stale_page_is_dropped() {
    let api = api_with(15, 0);
    let mut list = RecordList::new(ListMode::Drafts);
    let (old, old_fetch) = list.begin_fetch(1).unwrap();
    let (new, new_fetch) = list.begin_fetch(2).unwrap();

    let fresh = run_fetch(&api, &new_fetch).await;
    assert!(list.finish_fetch(new, fresh));
    let late = run_fetch(&api, &old_fetch).await;
    assert!(!list.finish_fetch(old, late));
    assert_eq!(list.window().page(), 2);
    assert_eq!(list.rows().len(), 5);
  }

  #[tokio::test]
  async fn failed_fetch_keeps_rows() {
    let api = api_with(3, 0);
    let mut list = RecordList::new(ListMode::Drafts);
    let first = list.begin_fetch(1);
    load(&mut list, &api, first).await;

    api.fail_with(ApiError::Status {
      status: 500,
      detail: None,
    });
    let again = list.refresh();
    load(&mut list, &api, again).await;
    assert_eq!(list.rows().len(), 3);
    assert!(!list.is_loading());
  }

  #[tokio::test]
  async fn view_shows_full_record() {
    let api = api_with(2, 0);
    let mut list = RecordList::new(ListMode::Drafts);
    let first = list.begin_fetch(1);
    load(&mut list, &api, first).await;
    list.cursor_down();

    let (ticket, id) = list.begin_view().unwrap();
    assert_eq!(id, 2);
    let result = api.get_contact(id).await;
    assert_eq!(list.finish_view(ticket, result), Ok(()));
    assert_eq!(list.detail.as_ref().map(|c| c.id), Some(2));

    list.close_detail();
    let (ticket, _) = list.begin_view().unwrap();
    assert_eq!(
      list.finish_view(ticket, api.get_contact(999).await),
      Err("Could not load the meeting record.")
    );
    assert!(list.detail.is_none());
  }

  #[tokio::test]
  async fn discard_then_refresh() {
    let api = api_with(2, 0);
    let mut list = RecordList::new(ListMode::Drafts);
    let first = list.begin_fetch(1);
    load(&mut list, &api, first).await;
    assert_eq!(list.mode().discard_prompt(), "Discard this draft?");

    let id = list.selected().unwrap().id;
    let result = api.delete_contact(id).await;
    assert_eq!(list.discard_message(&result), "Draft discarded.");
    let again = list.refresh();
    load(&mut list, &api, again).await;
    assert_eq!(list.rows().len(), 1);

    let failed = Err(ApiError::Status {
      status: 500,
      detail: None,
    });
    assert_eq!(list.discard_message(&failed), "Discarding failed.");
  }

  #[test]
  fn rows_fill_in_missing_fields() {
    let mut c = contact(1, ContactStatus::Draft);
    c.contact_date = None;
    c.title = Some(" ".into());
    assert_eq!(format_date(c.contact_date), "no date");
    assert_eq!(title_of(&c), "(untitled)");
    assert_eq!(creator_of(&c), "unknown");
    assert_eq!(persons_of(&c), "Yamada Kenji");

    c.creator = Some(coworker(1, "Sato Hanako"));
    c.contact_date = NaiveDate::from_ymd_opt(2024, 1, 9);
    assert_eq!(creator_of(&c), "Sato Hanako");
    assert_eq!(format_date(c.contact_date), "2024-01-09");
  }
}
