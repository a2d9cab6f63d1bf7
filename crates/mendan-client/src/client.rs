//! Async HTTP client wrapping the records JSON API.

use std::time::Duration;

use mendan_core::{
  ApiError, Result,
  api::RecordApi,
  model::{
    BusinessCard, Contact, ContactFormData, Coworker, LoginRequest,
    LoginResponse, SearchHit, SearchRequest, SearchResponse, SummaryRequest,
    SummaryResponse,
  },
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};

use crate::session::{Session, SessionContext};

/// Connection settings for the records API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Origin of the backend, without the `/api` prefix.
  pub base_url: String,
  /// Per-request timeout. `None` waits indefinitely.
  pub timeout:  Option<Duration>,
}

/// Async HTTP client for the records REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] and the session are both
/// `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:  Client,
  config:  ApiConfig,
  session: SessionContext,
}

/// Error body shape used by the backend: `{"detail": "..."}`, or a list of
/// validation problems each carrying a `msg`.
#[derive(Deserialize)]
struct ErrorBody {
  #[serde(default)]
  detail: Option<serde_json::Value>,
}

impl ErrorBody {
  fn into_detail(self) -> Option<String> {
    match self.detail? {
      serde_json::Value::String(s) => Some(s),
      serde_json::Value::Array(items) => items
        .iter()
        .find_map(|i| i.get("msg").and_then(|m| m.as_str()))
        .map(str::to_owned),
      _ => None,
    }
  }
}

impl ApiClient {
  pub fn new(config: ApiConfig, session: SessionContext) -> reqwest::Result<Self> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.timeout {
      builder = builder.timeout(timeout);
    }
    let client = builder.build()?;
    Ok(Self {
      client,
      config,
      session,
    })
  }

  pub fn session(&self) -> &SessionContext { &self.session }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  /// Send `req` with the bearer token attached and turn any non-success
  /// status into an [`ApiError`].
  async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
    tracing::debug!(%what, "request");
    let token = self.session.token();
    let req = match &token {
      Some(token) => req.bearer_auth(token),
      None => req,
    };
    let resp = req.send().await.map_err(|e| {
      tracing::warn!(%what, error = %e, "request failed");
      ApiError::Transport {
        offline: e.is_connect(),
        message: format!("{what}: {e}"),
      }
    })?;
    self.check(resp, token.as_deref(), what).await
  }

  /// The one place responses are judged. A 401 expires the session that
  /// sent the request; a session signed in since then is left alone.
  async fn check(
    &self,
    resp: Response,
    sent: Option<&str>,
    what: &str,
  ) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }

    let detail = resp
      .json::<ErrorBody>()
      .await
      .ok()
      .and_then(ErrorBody::into_detail);

    if status == StatusCode::UNAUTHORIZED {
      tracing::warn!(%what, "unauthorized");
      self.session.expire_token(sent);
      return Err(ApiError::Unauthorized { detail });
    }

    tracing::warn!(%what, status = status.as_u16(), ?detail, "request rejected");
    Err(ApiError::Status {
      status: status.as_u16(),
      detail,
    })
  }

  async fn fetch<T: DeserializeOwned>(
    &self,
    req: RequestBuilder,
    what: &str,
  ) -> Result<T> {
    let resp = self.send(req, what).await?;
    resp
      .json()
      .await
      .map_err(|e| ApiError::Decode(format!("{what}: {e}")))
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  /// `POST /api/auth/login`: on success the session is signed in and the
  /// user's profile returned.
  pub async fn login(&self, user_id: i64, password: &str) -> Result<Coworker> {
    let body = LoginRequest {
      user_id,
      password: password.to_owned(),
    };
    let resp: LoginResponse = self
      .fetch(
        self.client.post(self.url("/auth/login")).json(&body),
        "POST /auth/login",
      )
      .await?;

    let user = resp.user.clone();
    self.session.sign_in(Session {
      access_token: resp.access_token,
      user:         Some(resp.user),
    });
    Ok(user)
  }

  /// `POST /api/auth/logout`: the local session is cleared whatever the
  /// backend answers.
  pub async fn logout(&self) -> Result<()> {
    let result = self
      .send(self.client.post(self.url("/auth/logout")), "POST /auth/logout")
      .await
      .map(drop);
    self.session.sign_out();
    result
  }
}

impl RecordApi for ApiClient {
  // ── Business cards ────────────────────────────────────────────────────────

  async fn search_business_cards(
    &self,
    request: &SearchRequest,
  ) -> Result<SearchResponse<SearchHit>> {
    self
      .fetch(
        self.client.post(self.url("/business-cards/search")).json(request),
        "POST /business-cards/search",
      )
      .await
  }

  async fn get_business_card(&self, id: i64) -> Result<BusinessCard> {
    self
      .fetch(
        self.client.get(self.url(&format!("/business-cards/{id}"))),
        "GET /business-cards/{id}",
      )
      .await
  }

  // ── Coworkers ─────────────────────────────────────────────────────────────

  async fn search_coworkers(
    &self,
    request: &SearchRequest,
  ) -> Result<SearchResponse<SearchHit>> {
    self
      .fetch(
        self.client.post(self.url("/coworkers/search")).json(request),
        "POST /coworkers/search",
      )
      .await
  }

  async fn get_coworker(&self, id: i64) -> Result<Coworker> {
    self
      .fetch(
        self.client.get(self.url(&format!("/coworkers/{id}"))),
        "GET /coworkers/{id}",
      )
      .await
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  async fn create_contact(&self, form: &ContactFormData) -> Result<Contact> {
    self
      .fetch(
        self.client.post(self.url("/contacts/")).json(form),
        "POST /contacts/",
      )
      .await
  }

  async fn update_contact(
    &self,
    id: i64,
    form: &ContactFormData,
  ) -> Result<Contact> {
    self
      .fetch(
        self.client.put(self.url(&format!("/contacts/{id}"))).json(form),
        "PUT /contacts/{id}",
      )
      .await
  }

  async fn get_contact(&self, id: i64) -> Result<Contact> {
    self
      .fetch(
        self.client.get(self.url(&format!("/contacts/{id}"))),
        "GET /contacts/{id}",
      )
      .await
  }

  async fn list_drafts(&self, page: u32, per_page: u32) -> Result<Vec<Contact>> {
    self
      .fetch(
        self
          .client
          .get(self.url("/contacts/drafts"))
          .query(&[("page", page), ("per_page", per_page)]),
        "GET /contacts/drafts",
      )
      .await
  }

  async fn list_history(&self, page: u32, per_page: u32) -> Result<Vec<Contact>> {
    self
      .fetch(
        self
          .client
          .get(self.url("/contacts/history"))
          .query(&[("page", page), ("per_page", per_page)]),
        "GET /contacts/history",
      )
      .await
  }

  async fn search_contacts(
    &self,
    request: &SearchRequest,
  ) -> Result<SearchResponse<Contact>> {
    self
      .fetch(
        self.client.post(self.url("/contacts/search")).json(request),
        "POST /contacts/search",
      )
      .await
  }

  async fn delete_contact(&self, id: i64) -> Result<()> {
    self
      .send(
        self.client.delete(self.url(&format!("/contacts/{id}"))),
        "DELETE /contacts/{id}",
      )
      .await
      .map(drop)
  }

  async fn summarize(&self, text: &str) -> Result<String> {
    let body = SummaryRequest {
      text: text.to_owned(),
    };
    let resp: SummaryResponse = self
      .fetch(
        self.client.post(self.url("/contacts/summarize")).json(&body),
        "POST /contacts/summarize",
      )
      .await?;
    Ok(resp.summary)
  }
}
