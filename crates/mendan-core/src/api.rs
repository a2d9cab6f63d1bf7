//! The `RecordApi` trait: everything the workflows need from the backend.
//!
//! Implemented over HTTP by `mendan-client`. Workflows in the CLI depend on
//! this abstraction so they can be exercised against an in-memory fake.
//! Sign-in and sign-out are not part of it; they belong to the session.

use std::future::Future;

use crate::{
  Result,
  model::{
    BusinessCard, Contact, ContactFormData, Coworker, SearchHit, SearchRequest,
    SearchResponse,
  },
};

/// Abstraction over the meeting-records backend.
///
/// All methods return `Send` futures so calls can be spawned onto a
/// multi-threaded runtime.
pub trait RecordApi: Send + Sync {
  // ── Business cards ────────────────────────────────────────────────────

  /// `POST /business-cards/search`: abbreviated projections only.
  fn search_business_cards<'a>(
    &'a self,
    request: &'a SearchRequest,
  ) -> impl Future<Output = Result<SearchResponse<SearchHit>>> + Send + 'a;

  /// `GET /business-cards/{id}`
  fn get_business_card(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<BusinessCard>> + Send + '_;

  // ── Coworkers ─────────────────────────────────────────────────────────

  /// `POST /coworkers/search`: abbreviated projections only.
  fn search_coworkers<'a>(
    &'a self,
    request: &'a SearchRequest,
  ) -> impl Future<Output = Result<SearchResponse<SearchHit>>> + Send + 'a;

  /// `GET /coworkers/{id}`
  fn get_coworker(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Coworker>> + Send + '_;

  // ── Contacts ──────────────────────────────────────────────────────────

  /// `POST /contacts/`
  fn create_contact<'a>(
    &'a self,
    form: &'a ContactFormData,
  ) -> impl Future<Output = Result<Contact>> + Send + 'a;

  /// `PUT /contacts/{id}`
  fn update_contact<'a>(
    &'a self,
    id: i64,
    form: &'a ContactFormData,
  ) -> impl Future<Output = Result<Contact>> + Send + 'a;

  /// `GET /contacts/{id}`
  fn get_contact(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Contact>> + Send + '_;

  /// `GET /contacts/drafts?page&per_page`
  fn list_drafts(
    &self,
    page: u32,
    per_page: u32,
  ) -> impl Future<Output = Result<Vec<Contact>>> + Send + '_;

  /// `GET /contacts/history?page&per_page`
  fn list_history(
    &self,
    page: u32,
    per_page: u32,
  ) -> impl Future<Output = Result<Vec<Contact>>> + Send + '_;

  /// `POST /contacts/search`
  fn search_contacts<'a>(
    &'a self,
    request: &'a SearchRequest,
  ) -> impl Future<Output = Result<SearchResponse<Contact>>> + Send + 'a;

  /// `DELETE /contacts/{id}`
  fn delete_contact(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// `POST /contacts/summarize`: returns the summary text.
  fn summarize<'a>(
    &'a self,
    text: &'a str,
  ) -> impl Future<Output = Result<String>> + Send + 'a;
}
