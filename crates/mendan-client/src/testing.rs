//! An in-process stand-in for the records backend.
//!
//! Serves the same routes as the real API from an in-memory [`StubState`] on
//! `127.0.0.1:0`. Every call is recorded so tests can assert what was sent.

use std::{
  collections::HashMap,
  net::SocketAddr,
  sync::{Arc, Mutex, MutexGuard},
};

use axum::{
  Json, Router,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
  routing::{get, post},
};
use chrono::{NaiveDate, NaiveDateTime};
use mendan_core::model::{
  BusinessCard, Contact, ContactFormData, ContactStatus, Coworker,
  LoginRequest, LoginResponse, SearchRequest, SearchResponse, SummaryRequest,
  SummaryResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::Notify;

/// The password every seeded coworker signs in with.
pub const STUB_PASSWORD: &str = "password";

/// One call the stub received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
  pub route:  &'static str,
  /// The bearer token presented, if any.
  pub bearer: Option<String>,
}

/// Everything the stub knows.
#[derive(Debug, Default)]
pub struct StubState {
  pub cards:           Vec<BusinessCard>,
  pub coworkers:       Vec<Coworker>,
  pub contacts:        Vec<Contact>,
  pub requests:        Vec<Recorded>,
  /// Answer 401 to every authenticated route, as if the token had expired.
  pub reject_tokens:   bool,
  /// Make `/contacts/summarize` fail with this status and optional detail.
  pub summary_failure: Option<(u16, Option<String>)>,
  /// While set, `GET /contacts/{id}` decides its answer on arrival but
  /// sends it only once this is notified.
  pub hold:            Option<Arc<Notify>>,
  tokens:              HashMap<String, i64>,
  next_contact_id:     i64,
}

impl StubState {
  /// Four coworkers and a handful of business cards.
  pub fn seeded() -> Self {
    let coworker = |id, name: &str, email: &str, department_id| Coworker {
      id,
      name: name.into(),
      position: None,
      email: email.into(),
      sso_id: None,
      department_id: Some(department_id),
    };
    let card = |id, name: &str, company: &str, department: &str| BusinessCard {
      id,
      name: name.into(),
      company: company.into(),
      department: Some(department.into()),
      position: Some("Manager".into()),
      memo: Some(format!("met {name} at the trade fair")),
    };

    Self {
      coworkers: vec![
        coworker(1, "Yamada Taro", "taro@example.com", 10),
        coworker(2, "Sato Hanako", "hanako@example.com", 10),
        coworker(3, "Tanaka Ichiro", "ichiro@example.com", 20),
        coworker(4, "Suzuki Misaki", "misaki@example.com", 20),
      ],
      cards: vec![
        card(101, "Yamada Kenji", "Acme KK", "Sales"),
        card(102, "Yamada Yuko", "Beta Trading", "Purchasing"),
        card(103, "Kobayashi Ren", "Acme KK", "Engineering"),
      ],
      next_contact_id: 1,
      ..Self::default()
    }
  }

  /// Issue a valid token for `user_id` without going through login.
  pub fn issue_token(&mut self, user_id: i64) -> String {
    let token = format!("stub-token-{user_id}-{}", self.tokens.len() + 1);
    self.tokens.insert(token.clone(), user_id);
    token
  }

  fn authorize(
    &mut self,
    headers: &HeaderMap,
    route: &'static str,
  ) -> Result<i64, Response> {
    let bearer = headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.strip_prefix("Bearer "))
      .map(str::to_owned);
    self.requests.push(Recorded {
      route,
      bearer: bearer.clone(),
    });

    if self.reject_tokens {
      return Err(reject(StatusCode::UNAUTHORIZED, "Token has expired"));
    }
    bearer
      .and_then(|t| self.tokens.get(&t).copied())
      .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Not authenticated"))
  }

  fn materialize(
    &mut self,
    id: Option<i64>,
    creator_id: i64,
    form: ContactFormData,
  ) -> Contact {
    let id = id.unwrap_or_else(|| {
      let id = self.next_contact_id.max(1);
      self.next_contact_id = id + 1;
      id
    });
    let persons = form
      .person_ids
      .iter()
      .filter_map(|pid| self.cards.iter().find(|c| c.id == *pid).cloned())
      .collect();
    let companions = form
      .companion_ids
      .iter()
      .filter_map(|cid| self.coworkers.iter().find(|c| c.id == *cid).cloned())
      .collect();
    let creator = self.coworkers.iter().find(|c| c.id == creator_id).cloned();

    Contact {
      id,
      contact_date: form.contact_date,
      location: form.location,
      title: form.title,
      summary_text: form.summary_text,
      raw_text: form.raw_text,
      details: form.details,
      status: form.status,
      department_id: creator.as_ref().and_then(|c| c.department_id),
      coworker_id: Some(creator_id),
      created_at: stub_timestamp(),
      persons,
      companions,
      creator,
    }
  }
}

/// The summary the stub produces for `text`.
pub fn stub_summary(text: &str) -> String {
  format!("summary of {} characters", text.chars().count())
}

fn stub_timestamp() -> NaiveDateTime {
  NaiveDate::from_ymd_opt(2024, 5, 1)
    .and_then(|d| d.and_hms_opt(9, 0, 0))
    .unwrap_or_default()
}

// ─── Server ──────────────────────────────────────────────────────────────────

type Shared = Arc<Mutex<StubState>>;

/// A running stub. The server task lives as long as the runtime.
pub struct StubBackend {
  pub addr:  SocketAddr,
  pub state: Shared,
}

impl StubBackend {
  pub async fn spawn(state: StubState) -> std::io::Result<Self> {
    let state = Arc::new(Mutex::new(state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(state.clone());
    tokio::spawn(async move {
      if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "stub backend stopped");
      }
    });
    Ok(Self { addr, state })
  }

  /// Base URL to hand to an `ApiConfig`.
  pub fn base_url(&self) -> String { format!("http://{}", self.addr) }

  pub fn state(&self) -> MutexGuard<'_, StubState> { lock(&self.state) }
}

fn router(state: Shared) -> Router {
  Router::new()
    .route("/api/auth/login", post(login))
    .route("/api/auth/logout", post(logout))
    .route("/api/business-cards/search", post(search_cards))
    .route("/api/business-cards/{id}", get(get_card))
    .route("/api/coworkers/search", post(search_coworkers))
    .route("/api/coworkers/{id}", get(get_coworker))
    .route("/api/contacts/", post(create_contact))
    .route("/api/contacts/drafts", get(list_drafts))
    .route("/api/contacts/history", get(list_history))
    .route("/api/contacts/search", post(search_contacts))
    .route("/api/contacts/summarize", post(summarize))
    .route(
      "/api/contacts/{id}",
      get(get_contact).put(update_contact).delete(delete_contact),
    )
    .with_state(state)
}

fn lock(state: &Shared) -> MutexGuard<'_, StubState> {
  state.lock().unwrap_or_else(|p| p.into_inner())
}

fn reject(status: StatusCode, detail: &str) -> Response {
  (status, Json(json!({ "detail": detail }))).into_response()
}

fn paged<T: Serialize>(all: Vec<T>, page: u32, per_page: u32) -> SearchResponse<T> {
  let per_page = per_page.max(1);
  let page = page.max(1);
  let total = all.len() as u64;
  let total_pages = all.len().div_ceil(per_page as usize) as u32;
  let items = all
    .into_iter()
    .skip(((page - 1) * per_page) as usize)
    .take(per_page as usize)
    .collect();
  SearchResponse {
    items,
    total,
    page,
    per_page,
    total_pages,
  }
}

fn contains(haystack: &str, needle: &str) -> bool {
  haystack.to_lowercase().contains(&needle.to_lowercase())
}

// ─── Handlers ────────────────────────────────────────────────────────────────

async fn login(State(s): State<Shared>, Json(body): Json<LoginRequest>) -> Response {
  let mut st = lock(&s);
  st.requests.push(Recorded {
    route:  "POST /auth/login",
    bearer: None,
  });
  let user = st.coworkers.iter().find(|c| c.id == body.user_id).cloned();
  match user {
    Some(user) if body.password == STUB_PASSWORD => {
      let access_token = st.issue_token(user.id);
      Json(LoginResponse {
        access_token,
        token_type: "bearer".into(),
        user,
      })
      .into_response()
    }
    _ => reject(StatusCode::UNAUTHORIZED, "Incorrect user id or password"),
  }
}

async fn logout(State(s): State<Shared>, headers: HeaderMap) -> Response {
  let mut st = lock(&s);
  if let Err(r) = st.authorize(&headers, "POST /auth/logout") {
    return r;
  }
  Json(json!({ "message": "logged out" })).into_response()
}

async fn search_cards(
  State(s): State<Shared>,
  headers: HeaderMap,
  Json(req): Json<SearchRequest>,
) -> Response {
  let mut st = lock(&s);
  if let Err(r) = st.authorize(&headers, "POST /business-cards/search") {
    return r;
  }
  let hits: Vec<Value> = st
    .cards
    .iter()
    .filter(|c| contains(&c.name, &req.keyword) || contains(&c.company, &req.keyword))
    .map(|c| json!({ "id": c.id, "name": c.name, "company": c.company, "position": c.position }))
    .collect();
  Json(paged(hits, req.page, req.per_page)).into_response()
}

async fn get_card(
  State(s): State<Shared>,
  headers: HeaderMap,
  Path(id): Path<i64>,
) -> Response {
  let mut st = lock(&s);
  if let Err(r) = st.authorize(&headers, "GET /business-cards/{id}") {
    return r;
  }
  match st.cards.iter().find(|c| c.id == id) {
    Some(card) => Json(card.clone()).into_response(),
    None => reject(StatusCode::NOT_FOUND, "Business card not found"),
  }
}

async fn search_coworkers(
  State(s): State<Shared>,
  headers: HeaderMap,
  Json(req): Json<SearchRequest>,
) -> Response {
  let mut st = lock(&s);
  if let Err(r) = st.authorize(&headers, "POST /coworkers/search") {
    return r;
  }
  let hits: Vec<Value> = st
    .coworkers
    .iter()
    .filter(|c| contains(&c.name, &req.keyword))
    .map(|c| json!({ "id": c.id, "name": c.name, "department": c.department_id }))
    .collect();
  Json(paged(hits, req.page, req.per_page)).into_response()
}

async fn get_coworker(
  State(s): State<Shared>,
  headers: HeaderMap,
  Path(id): Path<i64>,
) -> Response {
  let mut st = lock(&s);
  if let Err(r) = st.authorize(&headers, "GET /coworkers/{id}") {
    return r;
  }
  match st.coworkers.iter().find(|c| c.id == id) {
    Some(coworker) => Json(coworker.clone()).into_response(),
    None => reject(StatusCode::NOT_FOUND, "Coworker not found"),
  }
}

async fn create_contact(
  State(s): State<Shared>,
  headers: HeaderMap,
  Json(form): Json<ContactFormData>,
) -> Response {
  let mut st = lock(&s);
  let user_id = match st.authorize(&headers, "POST /contacts/") {
    Ok(id) => id,
    Err(r) => return r,
  };
  let contact = st.materialize(None, user_id, form);
  st.contacts.push(contact.clone());
  Json(contact).into_response()
}

async fn update_contact(
  State(s): State<Shared>,
  headers: HeaderMap,
  Path(id): Path<i64>,
  Json(form): Json<ContactFormData>,
) -> Response {
  let mut st = lock(&s);
  let user_id = match st.authorize(&headers, "PUT /contacts/{id}") {
    Ok(id) => id,
    Err(r) => return r,
  };
  let Some(pos) = st.contacts.iter().position(|c| c.id == id) else {
    return reject(StatusCode::NOT_FOUND, "Contact not found");
  };
  let contact = st.materialize(Some(id), user_id, form);
  st.contacts[pos] = contact.clone();
  Json(contact).into_response()
}

async fn get_contact(
  State(s): State<Shared>,
  headers: HeaderMap,
  Path(id): Path<i64>,
) -> Response {
  let (answer, hold) = {
    let mut st = lock(&s);
    let answer = match st.authorize(&headers, "GET /contacts/{id}") {
      Err(r) => r,
      Ok(_) => match st.contacts.iter().find(|c| c.id == id) {
        Some(contact) => Json(contact.clone()).into_response(),
        None => reject(StatusCode::NOT_FOUND, "Contact not found"),
      },
    };
    (answer, st.hold.clone())
  };
  if let Some(hold) = hold {
    hold.notified().await;
  }
  answer
}

async fn delete_contact(
  State(s): State<Shared>,
  headers: HeaderMap,
  Path(id): Path<i64>,
) -> Response {
  let mut st = lock(&s);
  if let Err(r) = st.authorize(&headers, "DELETE /contacts/{id}") {
    return r;
  }
  let before = st.contacts.len();
  st.contacts.retain(|c| c.id != id);
  if st.contacts.len() == before {
    return reject(StatusCode::NOT_FOUND, "Contact not found");
  }
  Json(json!({ "message": "deleted" })).into_response()
}

#[derive(Deserialize)]
struct PageParams {
  page:     u32,
  per_page: u32,
}

fn list_by_status(
  s: &Shared,
  headers: &HeaderMap,
  route: &'static str,
  status: ContactStatus,
  params: &PageParams,
) -> Response {
  let mut st = lock(s);
  if let Err(r) = st.authorize(headers, route) {
    return r;
  }
  let rows: Vec<Contact> = st
    .contacts
    .iter()
    .filter(|c| c.status == status)
    .cloned()
    .collect();
  Json(paged(rows, params.page, params.per_page).items).into_response()
}

async fn list_drafts(
  State(s): State<Shared>,
  headers: HeaderMap,
  Query(params): Query<PageParams>,
) -> Response {
  list_by_status(&s, &headers, "GET /contacts/drafts", ContactStatus::Draft, &params)
}

async fn list_history(
  State(s): State<Shared>,
  headers: HeaderMap,
  Query(params): Query<PageParams>,
) -> Response {
  list_by_status(
    &s,
    &headers,
    "GET /contacts/history",
    ContactStatus::Finalized,
    &params,
  )
}

async fn search_contacts(
  State(s): State<Shared>,
  headers: HeaderMap,
  Json(req): Json<SearchRequest>,
) -> Response {
  let mut st = lock(&s);
  if let Err(r) = st.authorize(&headers, "POST /contacts/search") {
    return r;
  }
  let rows: Vec<Contact> = st
    .contacts
    .iter()
    .filter(|c| {
      c.title.as_deref().is_some_and(|t| contains(t, &req.keyword))
        || c.persons.iter().any(|p| contains(&p.name, &req.keyword))
    })
    .cloned()
    .collect();
  Json(paged(rows, req.page, req.per_page)).into_response()
}

async fn summarize(
  State(s): State<Shared>,
  headers: HeaderMap,
  Json(req): Json<SummaryRequest>,
) -> Response {
  let mut st = lock(&s);
  if let Err(r) = st.authorize(&headers, "POST /contacts/summarize") {
    return r;
  }
  if let Some((status, detail)) = st.summary_failure.clone() {
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    return match detail {
      Some(d) => reject(code, &d),
      None => code.into_response(),
    };
  }
  Json(SummaryResponse {
    summary: stub_summary(&req.text),
  })
  .into_response()
}
