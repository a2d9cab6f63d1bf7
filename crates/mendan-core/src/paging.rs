//! Page cursors and the "is there another page?" heuristic.
//!
//! The record list endpoints report neither a total count nor a page count,
//! so a page that comes back exactly full is assumed to have a successor.
//! A final page that happens to be exactly full therefore still offers
//! "next", and the following fetch comes back empty. The card and coworker
//! searches do report `total_pages`; it is kept for display but navigation
//! follows the same rule everywhere.

/// Page size of the record lists (drafts, history, record search).
pub const LIST_PAGE_SIZE: u32 = 10;

/// Page size of the person / coworker picker.
pub const PICKER_PAGE_SIZE: u32 = 5;

/// Where a paginated view stands after its most recent fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
  page:        u32,
  per_page:    u32,
  /// Rows returned for `page`.
  len:         usize,
  /// Page count reported by the backend, when it reports one.
  total_pages: Option<u32>,
}

impl PageWindow {
  /// A window positioned on page 1 with nothing fetched yet.
  pub fn first(per_page: u32) -> Self {
    Self {
      page: 1,
      per_page,
      len: 0,
      total_pages: None,
    }
  }

  /// Record the outcome of fetching `page`.
  pub fn fetched(
    per_page: u32,
    page: u32,
    len: usize,
    total_pages: Option<u32>,
  ) -> Self {
    Self {
      page: page.max(1),
      per_page,
      len,
      total_pages,
    }
  }

  pub fn page(&self) -> u32 { self.page }

  pub fn total_pages(&self) -> Option<u32> { self.total_pages }

  pub fn has_prev(&self) -> bool { self.page > 1 }

  /// `true` iff the last fetch filled the page exactly.
  pub fn has_next(&self) -> bool { self.len == self.per_page as usize }

  /// The page "previous" should load, if it is enabled.
  pub fn prev(&self) -> Option<u32> { self.has_prev().then(|| self.page - 1) }

  /// The page "next" should load, if it is enabled.
  pub fn next(&self) -> Option<u32> { self.has_next().then(|| self.page + 1) }

  /// A short `page / total` label; the total is a guess when the backend
  /// did not report one. It never claims fewer pages than "next" can reach.
  pub fn label(&self) -> String {
    let reachable = self.next().unwrap_or(self.page);
    let total = self.total_pages.unwrap_or(reachable);
    format!("{} / {}", self.page, total.max(reachable))
  }
}
