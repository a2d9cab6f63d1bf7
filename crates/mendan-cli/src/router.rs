//! Routes and the sign-in guard.

/// A destination in the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  Login,
  Menu,
  /// The authoring form, blank or holding a draft.
  Compose,
  Drafts,
  History,
  Search,
}

impl Route {
  /// Routes reachable without a session.
  pub fn is_public(self) -> bool { matches!(self, Self::Login) }

  pub fn title(self) -> &'static str {
    match self {
      Self::Login => "Sign in",
      Self::Menu => "Menu",
      Self::Compose => "New record",
      Self::Drafts => "Drafts",
      Self::History => "History",
      Self::Search => "Search records",
    }
  }
}

/// Where a navigation to `target` actually lands.
pub fn guard(target: Route, authenticated: bool) -> Route {
  if authenticated || target.is_public() {
    target
  } else {
    Route::Login
  }
}
