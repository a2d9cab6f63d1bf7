//! Application state machine and event dispatcher.
//!
//! Key handling never waits on the network. Requests run as spawned tasks
//! and report back through an [`Outcome`] channel that the event loop
//! drains between frames.

use std::future::Future;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use mendan_client::{ApiClient, SessionChange, SessionState};
use mendan_core::{
  Result,
  api::RecordApi,
  model::{Contact, ContactStatus, Coworker, Picked, SearchHit, SearchResponse, SearchTarget},
};
use tokio::sync::{mpsc, watch};

use crate::{
  compose::{self, ComposeForm, Field},
  login::LoginForm,
  picker::{self, Picker},
  records::{self, ListMode, RecordList},
  router::{self, Route},
  ticket::{self, Ticket},
};

pub const SESSION_EXPIRED: &str = "Session expired. Please sign in again.";

/// Entries of the main menu, in display order.
pub const MENU: [(&str, MenuAction); 5] = [
  ("New record", MenuAction::Go(Route::Compose)),
  ("Drafts", MenuAction::Go(Route::Drafts)),
  ("History", MenuAction::Go(Route::History)),
  ("Search", MenuAction::Go(Route::Search)),
  ("Sign out", MenuAction::SignOut),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
  Go(Route),
  SignOut,
}

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum Screen {
  Login(LoginForm),
  Menu {
    cursor: usize,
  },
  Compose {
    form:     ComposeForm,
    /// Identifies this form instance to the requests it starts.
    instance: Ticket,
  },
  Records(RecordList),
}

/// What a confirmation dialog does when accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
  SelectHit(SearchHit),
  DiscardForm,
  DeleteRecord { id: i64, mode: ListMode },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
  Alert(String),
  Confirm { message: String, action: Pending },
}

/// The answer to a spawned request.
#[derive(Debug)]
pub enum Outcome {
  LoggedIn(Result<Coworker>),
  LoggedOut,
  PickerResults(Ticket, Result<SearchResponse<SearchHit>>),
  PickerResolved(Ticket, Result<Picked>),
  Summarized(Ticket, Result<String>),
  Saved(Ticket, ContactStatus, Result<Contact>),
  Rows(Ticket, Result<Vec<Contact>>),
  Detail(Ticket, Result<Contact>),
  DraftLoaded(Result<Contact>),
  Deleted(ListMode, Result<()>),
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub screen: Screen,

  /// The person / coworker modal; only ever open over the compose form.
  pub picker: Picker,

  /// Alert or confirmation shown over everything else.
  pub dialog: Option<Dialog>,

  /// One-line status message shown in the status bar.
  pub status: String,

  client:   ApiClient,
  outcomes: mpsc::UnboundedReceiver<Outcome>,
  sender:   mpsc::UnboundedSender<Outcome>,
  session:  watch::Receiver<SessionState>,
}

impl App {
  /// Start on the menu when a stored session exists, else on sign-in.
  pub fn new(client: ApiClient) -> Self {
    let (sender, outcomes) = mpsc::unbounded_channel();
    let session = client.session().subscribe();
    let mut app = Self {
      screen: Screen::Login(LoginForm::new()),
      picker: Picker::new(),
      dialog: None,
      status: String::new(),
      client,
      outcomes,
      sender,
      session,
    };
    app.navigate(Route::Menu);
    app
  }

  pub fn route(&self) -> Route {
    match &self.screen {
      Screen::Login(_) => Route::Login,
      Screen::Menu { .. } => Route::Menu,
      Screen::Compose { .. } => Route::Compose,
      Screen::Records(list) => match list.mode() {
        ListMode::Drafts => Route::Drafts,
        ListMode::History => Route::History,
        ListMode::Search => Route::Search,
      },
    }
  }

  /// The signed-in user, if any.
  pub fn user(&self) -> Option<Coworker> { self.client.session().user() }

  /// Switch screens, subject to the sign-in guard. Any modal is dropped.
  pub fn navigate(&mut self, target: Route) {
    let route = router::guard(target, self.client.session().is_authenticated());
    self.picker.close();
    self.dialog = None;
    self.screen = match route {
      Route::Login => Screen::Login(LoginForm::new()),
      Route::Menu => Screen::Menu { cursor: 0 },
      Route::Compose => Screen::Compose {
        form:     ComposeForm::new(chrono::Local::now().date_naive()),
        instance: ticket::issue(),
      },
      Route::Drafts => Screen::Records(RecordList::new(ListMode::Drafts)),
      Route::History => Screen::Records(RecordList::new(ListMode::History)),
      Route::Search => Screen::Records(RecordList::new(ListMode::Search)),
    };
    tracing::debug!(?target, ?route, "navigate");

    if let Screen::Records(list) = &mut self.screen
      && let Some(request) = list.begin_fetch(1)
    {
      self.spawn_fetch(request);
    }
  }

  fn alert(&mut self, message: impl Into<String>) {
    self.dialog = Some(Dialog::Alert(message.into()));
  }

  // ── Requests ──────────────────────────────────────────────────────────────

  fn spawn<F>(&self, task: F)
  where
    F: Future<Output = Outcome> + Send + 'static,
  {
    let sender = self.sender.clone();
    tokio::spawn(async move {
      // The receiver only goes away with the app itself.
      let _ = sender.send(task.await);
    });
  }

  fn spawn_fetch(&self, (ticket, fetch): (Ticket, records::Fetch)) {
    let client = self.client.clone();
    self.spawn(async move { Outcome::Rows(ticket, records::run_fetch(&client, &fetch).await) });
  }

  /// Apply every outcome that has already arrived.
  pub fn drain(&mut self) {
    while let Ok(outcome) = self.outcomes.try_recv() {
      self.apply(outcome);
    }
    self.sync_session();
  }

  /// Wait for the next outcome and apply it.
  pub async fn settle(&mut self) {
    if let Some(outcome) = self.outcomes.recv().await {
      self.apply(outcome);
    }
    self.sync_session();
  }

  /// React to session changes made outside the app, i.e. a 401 answered to
  /// any request.
  pub fn sync_session(&mut self) {
    if !self.session.has_changed().unwrap_or(false) {
      return;
    }
    let change = self.session.borrow_and_update().change;
    match change {
      SessionChange::Expired | SessionChange::SignedOut
        if self.route() != Route::Login =>
      {
        self.picker.close();
        self.dialog = None;
        self.screen = Screen::Login(match change {
          SessionChange::Expired => LoginForm::with_message(SESSION_EXPIRED),
          _ => LoginForm::new(),
        });
        if change == SessionChange::Expired {
          self.status = SESSION_EXPIRED.into();
        }
      }
      _ => {}
    }
  }

  pub fn apply(&mut self, outcome: Outcome) {
    match outcome {
      Outcome::LoggedIn(result) => match result {
        Ok(user) => {
          self.navigate(Route::Menu);
          self.status = format!("Signed in as {}.", user.name);
        }
        Err(e) => {
          if let Screen::Login(form) = &mut self.screen {
            form.fail(&e);
          }
        }
      },

      Outcome::LoggedOut => {
        self.navigate(Route::Login);
        self.status = "Signed out.".into();
      }

      Outcome::PickerResults(ticket, result) => {
        let failed = result.is_err();
        if self.picker.finish_search(ticket, result) && failed {
          self.status = "Search failed.".into();
        }
      }

      Outcome::PickerResolved(ticket, result) => {
        let failed = result.is_err();
        match self.picker.finish_resolve(ticket, result) {
          Some(picked) => {
            if let Screen::Compose { form, .. } = &mut self.screen {
              form.add_picked(picked);
            }
          }
          None if failed => self.status = "Could not add the selection.".into(),
          None => {}
        }
      }

      Outcome::Summarized(origin, result) => match &mut self.screen {
        Screen::Compose { form, instance } if *instance == origin => {
          let ok = result.is_ok();
          let message = form.finish_summarize(result);
          if ok {
            self.status = message;
          } else {
            self.alert(message);
          }
        }
        _ => tracing::debug!("summary arrived after its form closed"),
      },

      Outcome::Saved(origin, status, result) => match &mut self.screen {
        Screen::Compose { form, instance } if *instance == origin => {
          match form.finish_submit(status, result) {
            Ok(message) => {
              self.navigate(Route::Menu);
              self.alert(message);
            }
            Err(message) => self.alert(message),
          }
        }
        _ => tracing::debug!("save answered after its form closed"),
      },

      Outcome::Rows(ticket, result) => {
        if let Screen::Records(list) = &mut self.screen {
          let failed = result.is_err();
          if list.finish_fetch(ticket, result) && failed {
            self.status = "Could not load meeting records.".into();
          }
        }
      }

      Outcome::Detail(ticket, result) => {
        if let Screen::Records(list) = &mut self.screen
          && let Err(message) = list.finish_view(ticket, result)
        {
          self.alert(message);
        }
      }

      Outcome::DraftLoaded(result) => match result {
        Ok(contact) if self.route() == Route::Drafts => {
          self.picker.close();
          self.dialog = None;
          self.screen = Screen::Compose {
            form:     ComposeForm::from_draft(contact),
            instance: ticket::issue(),
          };
        }
        Ok(_) => {}
        Err(e) => {
          tracing::warn!(error = %e, "loading draft failed");
          self.alert("Could not load the meeting record.");
        }
      },

      Outcome::Deleted(mode, result) => {
        if let Screen::Records(list) = &mut self.screen
          && list.mode() == mode
        {
          let message = list.discard_message(&result);
          let refresh = result.is_ok().then(|| list.refresh()).flatten();
          self.alert(message);
          if let Some(request) = refresh {
            self.spawn_fetch(request);
          }
        } else {
          tracing::debug!(?mode, "delete answered after its list closed");
        }
      }
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    if self.dialog.is_some() {
      self.handle_dialog_key(key);
      return true;
    }
    if self.picker.is_open() {
      self.handle_picker_key(key);
      return true;
    }

    match self.screen {
      Screen::Login(_) => self.handle_login_key(key),
      Screen::Menu { .. } => return self.handle_menu_key(key),
      Screen::Compose { .. } => self.handle_compose_key(key),
      Screen::Records(_) => return self.handle_records_key(key),
    }
    true
  }

  fn handle_dialog_key(&mut self, key: KeyEvent) {
    let Some(dialog) = self.dialog.take() else {
      return;
    };
    let Dialog::Confirm { message, action } = dialog else {
      // Any key dismisses an alert.
      return;
    };
    match key.code {
      KeyCode::Char('y') | KeyCode::Enter => self.accept(action),
      KeyCode::Char('n') | KeyCode::Esc => {}
      _ => self.dialog = Some(Dialog::Confirm { message, action }),
    }
  }

  fn accept(&mut self, action: Pending) {
    match action {
      Pending::SelectHit(hit) => {
        if let Some((ticket, id)) = self.picker.begin_resolve(&hit) {
          let client = self.client.clone();
          let target = self.picker.target();
          self.spawn(async move {
            Outcome::PickerResolved(ticket, picker::resolve(&client, target, id).await)
          });
        }
      }
      Pending::DiscardForm => {
        self.navigate(Route::Menu);
        self.status = "Discarded.".into();
      }
      Pending::DeleteRecord { id, mode } => {
        let client = self.client.clone();
        self.spawn(async move { Outcome::Deleted(mode, client.delete_contact(id).await) });
      }
    }
  }

  fn handle_picker_key(&mut self, key: KeyEvent) {
    let request = match key.code {
      KeyCode::Esc => {
        self.picker.close();
        None
      }
      KeyCode::Enter if self.picker.is_resolving() => None,
      KeyCode::Enter if self.picker.wants_search() => self.picker.begin_search(1),
      KeyCode::Enter => {
        if let Some(hit) = self.picker.cursor_hit().cloned() {
          self.dialog = Some(Dialog::Confirm {
            message: self.picker.confirm_prompt(&hit),
            action:  Pending::SelectHit(hit),
          });
        }
        None
      }
      KeyCode::Down => {
        self.picker.cursor_down();
        None
      }
      KeyCode::Up => {
        self.picker.cursor_up();
        None
      }
      KeyCode::Right => self.picker.next_page(),
      KeyCode::Left => self.picker.prev_page(),
      KeyCode::Backspace => {
        self.picker.pop_char();
        None
      }
      KeyCode::Char(c) => {
        self.picker.push_char(c);
        None
      }
      _ => None,
    };

    if let Some((ticket, search)) = request {
      let client = self.client.clone();
      let target = self.picker.target();
      self.spawn(async move {
        Outcome::PickerResults(ticket, picker::run_search(&client, target, &search).await)
      });
    }
  }

  fn handle_login_key(&mut self, key: KeyEvent) {
    let Screen::Login(form) = &mut self.screen else {
      return;
    };
    match key.code {
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.toggle_focus(),
      KeyCode::Backspace => form.pop_char(),
      KeyCode::Char(c) => form.push_char(c),
      KeyCode::Enter => {
        if let Some((user_id, password)) = form.begin_submit() {
          let client = self.client.clone();
          self.spawn(async move {
            Outcome::LoggedIn(client.login(user_id, &password).await)
          });
        }
      }
      _ => {}
    }
  }

  fn handle_menu_key(&mut self, key: KeyEvent) -> bool {
    let Screen::Menu { cursor } = &mut self.screen else {
      return true;
    };
    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Char('j') | KeyCode::Down => *cursor = (*cursor + 1).min(MENU.len() - 1),
      KeyCode::Char('k') | KeyCode::Up => *cursor = cursor.saturating_sub(1),
      KeyCode::Enter => match MENU[*cursor].1 {
        MenuAction::Go(route) => self.navigate(route),
        MenuAction::SignOut => {
          let client = self.client.clone();
          self.spawn(async move {
            if let Err(e) = client.logout().await {
              tracing::warn!(error = %e, "logout request failed");
            }
            Outcome::LoggedOut
          });
        }
      },
      _ => {}
    }
    true
  }

  fn handle_compose_key(&mut self, key: KeyEvent) {
    let Screen::Compose { form, instance } = &mut self.screen else {
      return;
    };
    let instance = *instance;
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
      KeyCode::Char('s') if ctrl => self.submit(ContactStatus::Finalized),
      KeyCode::Char('d') if ctrl => self.submit(ContactStatus::Draft),
      KeyCode::Char('g') if ctrl => match form.begin_summarize() {
        Ok(text) => {
          self.status = "Generating summary…".into();
          let client = self.client.clone();
          self.spawn(async move {
            Outcome::Summarized(instance, client.summarize(&text).await)
          });
        }
        Err(invalid) => self.alert(invalid.to_string()),
      },
      KeyCode::Char('x') if ctrl => self.confirm_discard(),
      KeyCode::Esc => self.confirm_discard(),
      KeyCode::Tab => form.focus_next(),
      KeyCode::BackTab => form.focus_prev(),
      KeyCode::Enter => match form.focus {
        Field::Persons => self.picker.open(SearchTarget::External),
        Field::Companions => self.picker.open(SearchTarget::Internal),
        f if f.is_multiline() => form.newline(),
        _ => form.focus_next(),
      },
      KeyCode::Backspace | KeyCode::Delete if !form.focus.is_text() => {
        form.remove_highlighted()
      }
      KeyCode::Backspace => form.pop_char(),
      KeyCode::Right if !form.focus.is_text() => form.chip_next(),
      KeyCode::Left if !form.focus.is_text() => form.chip_prev(),
      KeyCode::Char(c) if !ctrl => form.push_char(c),
      _ => {}
    }
  }

  fn confirm_discard(&mut self) {
    self.dialog = Some(Dialog::Confirm {
      message: "Discard this record without saving?".into(),
      action:  Pending::DiscardForm,
    });
  }

  fn submit(&mut self, status: ContactStatus) {
    let Screen::Compose { form, instance } = &mut self.screen else {
      return;
    };
    let instance = *instance;
    match form.begin_submit(status) {
      Ok(data) => {
        self.status = "Saving…".into();
        let client = self.client.clone();
        let editing = form.editing();
        self.spawn(async move {
          Outcome::Saved(instance, status, compose::save(&client, editing, &data).await)
        });
      }
      Err(invalid) => self.alert(invalid.to_string()),
    }
  }

  fn handle_records_key(&mut self, key: KeyEvent) -> bool {
    let Screen::Records(list) = &mut self.screen else {
      return true;
    };

    if list.detail.is_some() {
      match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => list.close_detail(),
        KeyCode::Char('j') | KeyCode::Down => list.detail_scroll += 1,
        KeyCode::Char('k') | KeyCode::Up => {
          list.detail_scroll = list.detail_scroll.saturating_sub(1)
        }
        _ => {}
      }
      return true;
    }

    if list.editing_keyword {
      let request = match key.code {
        KeyCode::Esc => {
          list.editing_keyword = false;
          None
        }
        KeyCode::Enter => {
          list.editing_keyword = false;
          list.cursor = 0;
          list.begin_fetch(1)
        }
        KeyCode::Backspace => {
          list.keyword.pop();
          None
        }
        KeyCode::Char(c) => {
          list.keyword.push(c);
          None
        }
        _ => None,
      };
      if let Some(request) = request {
        self.spawn_fetch(request);
      }
      return true;
    }

    let mode = list.mode();
    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Esc => self.navigate(Route::Menu),
      KeyCode::Char('j') | KeyCode::Down => list.cursor_down(),
      KeyCode::Char('k') | KeyCode::Up => list.cursor_up(),
      KeyCode::Char('/') if mode == ListMode::Search => list.editing_keyword = true,
      KeyCode::Char(']') | KeyCode::Right => {
        if let Some(request) = list.next_page() {
          list.cursor = 0;
          self.spawn_fetch(request);
        }
      }
      KeyCode::Char('[') | KeyCode::Left => {
        if let Some(request) = list.prev_page() {
          list.cursor = 0;
          self.spawn_fetch(request);
        }
      }
      KeyCode::Char('r') => {
        if let Some(request) = list.refresh() {
          self.spawn_fetch(request);
        }
      }
      KeyCode::Enter => {
        if let Some((ticket, id)) = list.begin_view() {
          let client = self.client.clone();
          self.spawn(async move { Outcome::Detail(ticket, client.get_contact(id).await) });
        }
      }
      KeyCode::Char('d') if mode != ListMode::Search => {
        if let Some(id) = list.selected().map(|c| c.id) {
          self.dialog = Some(Dialog::Confirm {
            message: mode.discard_prompt().into(),
            action:  Pending::DeleteRecord { id, mode },
          });
        }
      }
      KeyCode::Char('e') if mode == ListMode::Drafts => {
        if let Some(id) = list.selected().map(|c| c.id) {
          let client = self.client.clone();
          self.spawn(async move { Outcome::DraftLoaded(client.get_contact(id).await) });
        }
      }
      _ => {}
    }
    true
  }
}
