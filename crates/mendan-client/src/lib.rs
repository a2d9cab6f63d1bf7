//! HTTP side of mendan: the session context and the typed API client.
//!
//! The client funnels every response through one place, so a 401 from any
//! endpoint expires the shared [`session::SessionContext`] and every
//! subscriber hears about it.

pub mod client;
pub mod session;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use client::{ApiClient, ApiConfig};
pub use session::{Session, SessionChange, SessionContext, SessionError, SessionState};
