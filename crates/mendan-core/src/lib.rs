//! Core types and trait definitions for the mendan meeting-record client.
//!
//! This crate is deliberately free of HTTP and terminal dependencies. The
//! client crate implements [`api::RecordApi`] over HTTP; the CLI drives its
//! workflows through that trait.

pub mod api;
pub mod error;
pub mod model;
pub mod paging;
pub mod selection;

pub use error::{ApiError, Result};
