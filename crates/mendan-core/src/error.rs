//! Error type shared by every backend call.

use thiserror::Error;

/// A failed call against the records API.
///
/// HTTP-specific detail is reduced to plain data here so that the core crate
/// stays transport-agnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
  /// The backend answered 401. The session has already been invalidated by
  /// the time a caller sees this.
  #[error("unauthorized")]
  Unauthorized { detail: Option<String> },

  /// Any other non-success status.
  #[error("server answered {status}")]
  Status {
    status: u16,
    /// The `detail` field of the error body, when the backend supplied one.
    detail: Option<String>,
  },

  /// The request never produced a response.
  #[error("transport error: {message}")]
  Transport {
    /// `true` when the connection itself could not be established.
    offline: bool,
    message: String,
  },

  #[error("unexpected response body: {0}")]
  Decode(String),
}

impl ApiError {
  /// The server-supplied `detail` message, if any.
  pub fn detail(&self) -> Option<&str> {
    match self {
      Self::Unauthorized { detail } | Self::Status { detail, .. } => {
        detail.as_deref()
      }
      _ => None,
    }
  }

  /// The HTTP status the failure carried, if it got that far.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Unauthorized { .. } => Some(401),
      Self::Status { status, .. } => Some(*status),
      _ => None,
    }
  }

  pub fn is_offline(&self) -> bool {
    matches!(self, Self::Transport { offline: true, .. })
  }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;
