//! The signed-in session: bearer token plus cached user profile.
//!
//! A [`SessionContext`] is hydrated once at startup from a [`SessionStore`]
//! and afterwards changes only through [`SessionContext::sign_in`],
//! [`SessionContext::sign_out`] and [`SessionContext::expire`]. Every change
//! is published on a `watch` channel.

use std::{
  fs, io,
  path::PathBuf,
  sync::{Arc, Mutex},
};

use mendan_core::model::Coworker;
use thiserror::Error;
use tokio::sync::watch;

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("session storage error at {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("stored user profile is not valid JSON: {0}")]
  Json(#[from] serde_json::Error),
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// A bearer token and the profile of whoever it belongs to.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
  pub access_token: String,
  /// Absent when only the token survived on disk.
  pub user:         Option<Coworker>,
}

impl std::fmt::Debug for Session {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Session")
      .field("access_token", &"<redacted>")
      .field("user", &self.user)
      .finish()
  }
}

/// Why the session last changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
  /// Loaded from storage at startup.
  Hydrated,
  SignedIn,
  /// The user signed out.
  SignedOut,
  /// The backend rejected the token (401).
  Expired,
}

/// The value published to subscribers.
#[derive(Debug, Clone)]
pub struct SessionState {
  pub session: Option<Arc<Session>>,
  pub change:  SessionChange,
}

// ─── Storage ─────────────────────────────────────────────────────────────────

/// Where a session persists between runs.
pub trait SessionStore: Send + Sync {
  fn load(&self) -> Result<Option<Session>, SessionError>;
  fn save(&self, session: &Session) -> Result<(), SessionError>;
  /// Remove both the token and the profile.
  fn clear(&self) -> Result<(), SessionError>;
}

const TOKEN_FILE: &str = "access_token";
const USER_FILE: &str = "user.json";

/// Two files in a state directory: `access_token` (plain text) and
/// `user.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
  dir: PathBuf,
}

impl FileStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

  fn read_optional(&self, name: &str) -> Result<Option<String>, SessionError> {
    let path = self.dir.join(name);
    match fs::read_to_string(&path) {
      Ok(raw) => Ok(Some(raw)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(source) => Err(SessionError::Io { path, source }),
    }
  }

  fn write(&self, name: &str, contents: &str) -> Result<(), SessionError> {
    let path = self.dir.join(name);
    fs::write(&path, contents).map_err(|source| SessionError::Io { path, source })
  }

  fn remove(&self, name: &str) -> Result<(), SessionError> {
    let path = self.dir.join(name);
    match fs::remove_file(&path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      Err(source) => Err(SessionError::Io { path, source }),
    }
  }
}

impl SessionStore for FileStore {
  fn load(&self) -> Result<Option<Session>, SessionError> {
    let Some(token) = self.read_optional(TOKEN_FILE)? else {
      return Ok(None);
    };
    let token = token.trim();
    if token.is_empty() {
      return Ok(None);
    }

    let user = match self.read_optional(USER_FILE)? {
      Some(raw) => Some(serde_json::from_str(&raw)?),
      None => None,
    };

    Ok(Some(Session {
      access_token: token.to_owned(),
      user,
    }))
  }

  fn save(&self, session: &Session) -> Result<(), SessionError> {
    fs::create_dir_all(&self.dir).map_err(|source| SessionError::Io {
      path: self.dir.clone(),
      source,
    })?;
    self.write(TOKEN_FILE, &session.access_token)?;
    match &session.user {
      Some(user) => self.write(USER_FILE, &serde_json::to_string(user)?),
      None => self.remove(USER_FILE),
    }
  }

  fn clear(&self) -> Result<(), SessionError> {
    self.remove(TOKEN_FILE)?;
    self.remove(USER_FILE)
  }
}

/// Keeps the session in memory only. Used by tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
  slot: Mutex<Option<Session>>,
}

impl MemoryStore {
  pub fn with_session(session: Session) -> Self {
    Self {
      slot: Mutex::new(Some(session)),
    }
  }
}

impl SessionStore for MemoryStore {
  fn load(&self) -> Result<Option<Session>, SessionError> {
    Ok(self.slot.lock().unwrap_or_else(|p| p.into_inner()).clone())
  }

  fn save(&self, session: &Session) -> Result<(), SessionError> {
    *self.slot.lock().unwrap_or_else(|p| p.into_inner()) = Some(session.clone());
    Ok(())
  }

  fn clear(&self) -> Result<(), SessionError> {
    *self.slot.lock().unwrap_or_else(|p| p.into_inner()) = None;
    Ok(())
  }
}

// ─── Context ─────────────────────────────────────────────────────────────────

struct Inner {
  store: Box<dyn SessionStore>,
  state: watch::Sender<SessionState>,
}

/// The single owner of the signed-in session.
///
/// Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct SessionContext {
  inner: Arc<Inner>,
}

impl SessionContext {
  /// Load whatever `store` holds and take ownership of it.
  ///
  /// A store that cannot be read is cleared and the context starts signed
  /// out.
  pub fn hydrate(store: impl SessionStore + 'static) -> Self {
    let session = match store.load() {
      Ok(session) => session.map(Arc::new),
      Err(e) => {
        tracing::warn!(error = %e, "discarding unreadable stored session");
        if let Err(e) = store.clear() {
          tracing::warn!(error = %e, "could not clear stored session");
        }
        None
      }
    };
    tracing::debug!(signed_in = session.is_some(), "session hydrated");
    let (state, _) = watch::channel(SessionState {
      session,
      change: SessionChange::Hydrated,
    });
    Self {
      inner: Arc::new(Inner {
        store: Box::new(store),
        state,
      }),
    }
  }

  /// A signed-out context that persists nothing.
  pub fn in_memory() -> Self { Self::hydrate(MemoryStore::default()) }

  /// Snapshot of the current session.
  pub fn current(&self) -> Option<Arc<Session>> {
    self.inner.state.borrow().session.clone()
  }

  pub fn token(&self) -> Option<String> {
    self.current().map(|s| s.access_token.clone())
  }

  pub fn user(&self) -> Option<Coworker> {
    self.current().and_then(|s| s.user.clone())
  }

  pub fn is_authenticated(&self) -> bool {
    self.inner.state.borrow().session.is_some()
  }

  /// Receive every subsequent change. The current value counts as seen.
  pub fn subscribe(&self) -> watch::Receiver<SessionState> {
    self.inner.state.subscribe()
  }

  /// Install a freshly issued session and persist it.
  ///
  /// The in-memory session changes even if persisting fails; the failure is
  /// logged and the session simply will not survive a restart.
  pub fn sign_in(&self, session: Session) {
    if let Err(e) = self.inner.store.save(&session) {
      tracing::warn!(error = %e, "could not persist session");
    }
    tracing::info!(
      user = session.user.as_ref().map(|u| u.id),
      "signed in"
    );
    self.publish(Some(Arc::new(session)), SessionChange::SignedIn);
  }

  /// Forget the session at the user's request.
  pub fn sign_out(&self) {
    self.clear(SessionChange::SignedOut);
    tracing::info!("signed out");
  }

  /// Forget the session because the backend rejected it.
  pub fn expire(&self) {
    self.clear(SessionChange::Expired);
    tracing::info!("session expired");
  }

  /// Expire the session only if it still holds `token`, the one a rejected
  /// request was sent with. Returns whether it expired.
  pub fn expire_token(&self, token: Option<&str>) -> bool {
    if self.token().as_deref() != token {
      tracing::debug!("rejected token was already replaced");
      return false;
    }
    self.expire();
    true
  }

  fn clear(&self, change: SessionChange) {
    if let Err(e) = self.inner.store.clear() {
      tracing::warn!(error = %e, "could not clear stored session");
    }
    self.publish(None, change);
  }

  fn publish(&self, session: Option<Arc<Session>>, change: SessionChange) {
    self.inner.state.send_replace(SessionState { session, change });
  }
}
