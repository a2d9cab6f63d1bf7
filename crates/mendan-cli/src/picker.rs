//! The person / coworker picker.
//!
//! A modal that searches one directory by keyword, pages through the
//! results and hands a single fully-fetched entity back to its owner.
//!
//! ```text
//! Closed ─open→ Idle ─search→ Loading ─ok→ Results[p] ─pick→ Closed
//!                               ↑                │
//!                               └── change page ─┘
//! ```
//!
//! Closing from any state clears the keyword, results and page. Requests
//! are split into a `begin_*` half that yields a ticket and a `finish_*`
//! half that ignores any answer whose ticket is not the latest.

use mendan_core::{
  Result,
  api::RecordApi,
  model::{Picked, SearchHit, SearchRequest, SearchResponse, SearchTarget},
  paging::{PICKER_PAGE_SIZE, PageWindow},
};

use crate::ticket::{self, Ticket};

/// Where the picker stands, for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Closed,
  /// Open, nothing searched yet.
  Idle,
  Loading,
  /// Showing the answer to the last search, possibly empty.
  Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Waiting {
  Search { ticket: Ticket, page: u32 },
  Resolve { ticket: Ticket },
}

#[derive(Debug)]
pub struct Picker {
  target:   SearchTarget,
  open:     bool,
  keyword:  String,
  /// Keyword edited since the last search.
  dirty:    bool,
  results:  Vec<SearchHit>,
  window:   PageWindow,
  searched: bool,
  waiting:  Option<Waiting>,
  pub cursor: usize,
}

impl Default for Picker {
  fn default() -> Self {
    Self {
      target:   SearchTarget::External,
      open:     false,
      keyword:  String::new(),
      dirty:    false,
      results:  Vec::new(),
      window:   PageWindow::first(PICKER_PAGE_SIZE),
      searched: false,
      waiting:  None,
      cursor:   0,
    }
  }
}

impl Picker {
  pub fn new() -> Self { Self::default() }

  /// Open on a blank search of `target`.
  pub fn open(&mut self, target: SearchTarget) {
    *self = Self {
      target,
      open: true,
      ..Self::default()
    };
  }

  /// Close and forget everything. Answers still in flight are dropped on
  /// arrival.
  pub fn close(&mut self) {
    *self = Self {
      target: self.target,
      ..Self::default()
    };
  }

  pub fn is_open(&self) -> bool { self.open }

  pub fn target(&self) -> SearchTarget { self.target }

  pub fn keyword(&self) -> &str { &self.keyword }

  pub fn results(&self) -> &[SearchHit] { &self.results }

  pub fn window(&self) -> PageWindow { self.window }

  pub fn phase(&self) -> Phase {
    if !self.open {
      Phase::Closed
    } else if matches!(self.waiting, Some(Waiting::Search { .. })) {
      Phase::Loading
    } else if self.searched {
      Phase::Results
    } else {
      Phase::Idle
    }
  }

  /// `true` while the full entity for a pick is being fetched.
  pub fn is_resolving(&self) -> bool {
    matches!(self.waiting, Some(Waiting::Resolve { .. }))
  }

  /// Whether Enter should run a search rather than pick the cursor row.
  pub fn wants_search(&self) -> bool { self.dirty || self.results.is_empty() }

  // ── Keyword editing ───────────────────────────────────────────────────────

  pub fn push_char(&mut self, c: char) {
    self.keyword.push(c);
    self.dirty = true;
  }

  pub fn pop_char(&mut self) {
    self.keyword.pop();
    self.dirty = true;
  }

  pub fn set_keyword(&mut self, keyword: &str) {
    self.keyword = keyword.to_owned();
    self.dirty = true;
  }

  // ── Cursor ────────────────────────────────────────────────────────────────

  pub fn cursor_down(&mut self) {
    if self.cursor + 1 < self.results.len() {
      self.cursor += 1;
    }
  }

  pub fn cursor_up(&mut self) { self.cursor = self.cursor.saturating_sub(1); }

  pub fn cursor_hit(&self) -> Option<&SearchHit> { self.results.get(self.cursor) }

  // ── Searching ─────────────────────────────────────────────────────────────

  /// Start a search for `page` with the current keyword.
  ///
  /// Returns `None`, and changes nothing, when the keyword is blank.
  pub fn begin_search(&mut self, page: u32) -> Option<(Ticket, SearchRequest)> {
    let keyword = self.keyword.trim();
    if !self.open || keyword.is_empty() {
      return None;
    }
    let request = SearchRequest {
      keyword:  keyword.to_owned(),
      page:     page.max(1),
      per_page: PICKER_PAGE_SIZE,
    };
    let ticket = ticket::issue();
    self.waiting = Some(Waiting::Search {
      ticket,
      page: request.page,
    });
    self.dirty = false;
    Some((ticket, request))
  }

  /// Re-run the last keyword at page `page`.
  pub fn change_page(&mut self, page: u32) -> Option<(Ticket, SearchRequest)> {
    self.begin_search(page)
  }

  pub fn next_page(&mut self) -> Option<(Ticket, SearchRequest)> {
    let page = self.window.next()?;
    self.change_page(page)
  }

  pub fn prev_page(&mut self) -> Option<(Ticket, SearchRequest)> {
    let page = self.window.prev()?;
    self.change_page(page)
  }

  /// Apply the answer to search `ticket`. Returns `false` if it was stale.
  pub fn finish_search(
    &mut self,
    ticket: Ticket,
    result: Result<SearchResponse<SearchHit>>,
  ) -> bool {
    let page = match self.waiting {
      Some(Waiting::Search { ticket: t, page }) if t == ticket => page,
      _ => {
        tracing::debug!(ticket, "dropping stale picker search");
        return false;
      }
    };
    self.waiting = None;
    self.searched = true;
    self.cursor = 0;

    match result {
      Ok(resp) => {
        let mut items = resp.items;
        items.truncate(PICKER_PAGE_SIZE as usize);
        self.window = PageWindow::fetched(
          PICKER_PAGE_SIZE,
          page,
          items.len(),
          Some(resp.total_pages),
        );
        self.results = items;
      }
      Err(e) => {
        tracing::warn!(error = %e, target = ?self.target, "picker search failed");
        self.results.clear();
        self.window = PageWindow::first(PICKER_PAGE_SIZE);
      }
    }
    true
  }

  // ── Picking ───────────────────────────────────────────────────────────────

  /// The question to ask before picking `hit`.
  pub fn confirm_prompt(&self, hit: &SearchHit) -> String {
    format!("Select {}?", hit.label(self.target))
  }

  /// Start fetching the full entity behind `hit`, once the user confirmed.
  pub fn begin_resolve(&mut self, hit: &SearchHit) -> Option<(Ticket, i64)> {
    if !self.open {
      return None;
    }
    let ticket = ticket::issue();
    self.waiting = Some(Waiting::Resolve { ticket });
    Some((ticket, hit.id))
  }

  /// Apply the fetched entity. On success the picker closes and the entity
  /// is returned; on failure the picker stays open with its results.
  pub fn finish_resolve(&mut self, ticket: Ticket, result: Result<Picked>) -> Option<Picked> {
    if self.waiting != Some(Waiting::Resolve { ticket }) {
      tracing::debug!(ticket, "dropping stale picker resolve");
      return None;
    }
    self.waiting = None;

    match result {
      Ok(picked) => {
        self.close();
        Some(picked)
      }
      Err(e) => {
        tracing::warn!(error = %e, "could not fetch picked entity");
        None
      }
    }
  }
}

/// Run a search against the directory `target` names.
pub async fn run_search<A: RecordApi>(
  api: &A,
  target: SearchTarget,
  request: &SearchRequest,
) -> Result<SearchResponse<SearchHit>> {
  match target {
    SearchTarget::External => api.search_business_cards(request).await,
    SearchTarget::Internal => api.search_coworkers(request).await,
  }
}

/// Fetch the full entity with `id` from the directory `target` names.
pub async fn resolve<A: RecordApi>(api: &A, target: SearchTarget, id: i64) -> Result<Picked> {
  match target {
    SearchTarget::External => api.get_business_card(id).await.map(Picked::Card),
    SearchTarget::Internal => api.get_coworker(id).await.map(Picked::Coworker),
  }
}

#[cfg(test)]
mod tests {
  use mendan_core::ApiError;

  use super::*;
  use crate::fake::FakeApi;

  async fn search(picker: &mut Picker, api: &FakeApi, page: u32) -> bool {
    let Some((ticket, request)) = picker.change_page(page) else {
      return false;
    };
    let result = run_search(api, picker.target(), &request).await;
    picker.finish_search(ticket, result)
  }

  async fn pick(picker: &mut Picker, api: &FakeApi) -> Option<Picked> {
    let hit = picker.cursor_hit()?.clone();
    let (ticket, id) = picker.begin_resolve(&hit)?;
    let result = resolve(api, picker.target(), id).await;
    picker.finish_resolve(ticket, result)
  }

  #[tokio::test]
  async fn blank_keyword_sends_nothing() {
    let api = FakeApi::with_cards(3);
    let mut picker = Picker::new();
    picker.open(SearchTarget::External);

    for keyword in ["", "   ", "\t"] {
      picker.set_keyword(keyword);
      assert!(!search(&mut picker, &api, 1).await);
    }
    assert!(api.calls().is_empty());
    assert_eq!(picker.phase(), Phase::Idle);
    assert!(picker.results().is_empty());
  }

  #[tokio::test]
  async fn next_follows_page_fullness() {
    let api = FakeApi::with_cards(7);
    let mut picker = Picker::new();
    picker.open(SearchTarget::External);
    picker.set_keyword("Yamada");

    assert!(search(&mut picker, &api, 1).await);
    assert_eq!(picker.results().len(), 5);
    assert!(picker.window().has_next());
    assert_eq!(picker.window().total_pages(), Some(2));

    let (ticket, request) = picker.next_page().unwrap();
    assert_eq!(request.page, 2);
    let result = run_search(&api, picker.target(), &request).await;
    picker.finish_search(ticket, result);
    assert_eq!(picker.results().len(), 2);
    assert!(!picker.window().has_next());
    assert_eq!(picker.window().prev(), Some(1));
  }

  #[tokio::test]
  async fn reopening_starts_blank() {
    let api = FakeApi::with_cards(7);
    let mut picker = Picker::new();
    picker.open(SearchTarget::External);
    picker.set_keyword("Yamada");
    search(&mut picker, &api, 2).await;
    picker.cursor_down();

    picker.close();
    assert_eq!(picker.phase(), Phase::Closed);
    picker.open(SearchTarget::Internal);

    assert_eq!(picker.keyword(), "");
    assert!(picker.results().is_empty());
    assert_eq!(picker.window().page(), 1);
    assert_eq!(picker.cursor, 0);
    assert_eq!(picker.phase(), Phase::Idle);
  }

  #[tokio::test]
  async fn late_answer_after_close_is_dropped() {
    let api = FakeApi::with_cards(3);
    let mut picker = Picker::new();
    picker.open(SearchTarget::External);
    picker.set_keyword("Yamada");
    let (ticket, request) = picker.begin_search(1).unwrap();

    picker.close();
    picker.open(SearchTarget::External);

    let result = run_search(&api, SearchTarget::External, &request).await;
    assert!(!picker.finish_search(ticket, result));
    assert!(picker.results().is_empty());
  }

  #[tokio::test]
  async fn superseded_search_is_dropped() {
    let api = FakeApi::with_cards(7);
    let mut picker = Picker::new();
    picker.open(SearchTarget::External);
    picker.set_keyword("Yamada");
    let (first, first_req) = picker.begin_search(1).unwrap();
    let (second, second_req) = picker.begin_search(2).unwrap();

    let late = run_search(&api, picker.target(), &first_req).await;
    let fresh = run_search(&api, picker.target(), &second_req).await;
    assert!(picker.finish_search(second, fresh));
    assert!(!picker.finish_search(first, late));
    assert_eq!(picker.window().page(), 2);
  }

  #[tokio::test]
  async fn failed_search_clears_results() {
    let api = FakeApi::with_cards(3);
    let mut picker = Picker::new();
    picker.open(SearchTarget::External);
    picker.set_keyword("Yamada");
    search(&mut picker, &api, 1).await;
    assert_eq!(picker.results().len(), 3);

    api.fail_with(ApiError::Status {
      status: 500,
      detail: None,
    });
    search(&mut picker, &api, 1).await;
    assert!(picker.results().is_empty());
    assert_eq!(picker.phase(), Phase::Results);
  }

  #[tokio::test]
  async fn pick_fetches_full_entity_and_closes() {
    let api = FakeApi::with_cards(3);
    let mut picker = Picker::new();
    picker.open(SearchTarget::External);
    picker.set_keyword("Yamada");
    search(&mut picker, &api, 1).await;
    picker.cursor_down();

    let hit = picker.cursor_hit().unwrap().clone();
    assert_eq!(picker.confirm_prompt(&hit), "Select Yamada 2 (Acme KK)?");

    let picked = pick(&mut picker, &api).await;
    match picked {
      Some(Picked::Card(card)) => {
        assert_eq!(card.id, 2);
        assert_eq!(card.memo.as_deref(), Some("full record"));
      }
      other => panic!("unexpected pick: {other:?}"),
    }
    assert!(!picker.is_open());
    assert_eq!(
      api.calls(),
      vec!["search_business_cards", "get_business_card"]
    );
  }

  #[tokio::test]
  async fn failed_fetch_keeps_picker_open() {
    let api = FakeApi::with_cards(3);
    let mut picker = Picker::new();
    picker.open(SearchTarget::External);
    picker.set_keyword("Yamada");
    search(&mut picker, &api, 1).await;

    api.fail_with(ApiError::Transport {
      offline: true,
      message: "down".into(),
    });
    assert!(pick(&mut picker, &api).await.is_none());
    assert!(picker.is_open());
    assert_eq!(picker.results().len(), 3);
    assert!(!picker.is_resolving());
  }

  #[tokio::test]
  async fn internal_target_picks_coworkers() {
    let api = FakeApi::with_cards(0);
    let mut picker = Picker::new();
    picker.open(SearchTarget::Internal);
    picker.set_keyword("Sato");
    search(&mut picker, &api, 1).await;

    let hit = picker.cursor_hit().unwrap().clone();
    assert_eq!(picker.confirm_prompt(&hit), "Select Sato Hanako?");
    assert!(matches!(
      pick(&mut picker, &api).await,
      Some(Picked::Coworker(c)) if c.id == 1
    ));
  }
}
