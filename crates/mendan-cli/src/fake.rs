//! In-memory [`RecordApi`] for workflow tests.

use std::sync::Mutex;

use chrono::NaiveDate;
use mendan_core::{
  ApiError, Result,
  api::RecordApi,
  model::{
    BusinessCard, Contact, ContactFormData, ContactStatus, Coworker, SearchHit,
    SearchRequest, SearchResponse,
  },
};

#[derive(Default)]
pub struct FakeApi {
  pub cards:     Vec<BusinessCard>,
  pub coworkers: Vec<Coworker>,
  pub contacts:  Mutex<Vec<Contact>>,
  /// Every form sent to create or update, in order.
  pub saved:     Mutex<Vec<ContactFormData>>,
  /// Names of the calls made, in order.
  pub calls:     Mutex<Vec<&'static str>>,
  /// When set, every call fails with this error.
  pub failure:   Mutex<Option<ApiError>>,
}

pub fn card(id: i64, name: &str, company: &str) -> BusinessCard {
  BusinessCard {
    id,
    name: name.into(),
    company: company.into(),
    department: Some("Sales".into()),
    position: None,
    memo: Some("full record".into()),
  }
}

pub fn coworker(id: i64, name: &str) -> Coworker {
  Coworker {
    id,
    name: name.into(),
    position: None,
    email: format!("{id}@example.com"),
    sso_id: None,
    department_id: Some(1),
  }
}

pub fn contact(id: i64, status: ContactStatus) -> Contact {
  Contact {
    id,
    contact_date: NaiveDate::from_ymd_opt(2024, 6, 1),
    location: None,
    title: Some(format!("Meeting {id}")),
    summary_text: None,
    raw_text: Some("notes".into()),
    details: None,
    status,
    department_id: None,
    coworker_id: None,
    created_at: NaiveDate::from_ymd_opt(2024, 6, 1)
      .and_then(|d| d.and_hms_opt(10, 0, 0))
      .unwrap(),
    persons: vec![card(1, "Yamada Kenji", "Acme KK")],
    companions: vec![],
    creator: None,
  }
}

fn page_of<T: Clone>(all: &[T], page: u32, per_page: u32) -> Vec<T> {
  all
    .iter()
    .skip(((page.max(1) - 1) * per_page) as usize)
    .take(per_page as usize)
    .cloned()
    .collect()
}

impl FakeApi {
  /// Cards named `Yamada 1` .. `Yamada n` plus a few coworkers.
  pub fn with_cards(n: i64) -> Self {
    Self {
      cards: (1..=n).map(|i| card(i, &format!("Yamada {i}"), "Acme KK")).collect(),
      coworkers: vec![coworker(1, "Sato Hanako"), coworker(2, "Tanaka Ichiro")],
      ..Self::default()
    }
  }

  pub fn fail_with(&self, err: ApiError) { *self.failure.lock().unwrap() = Some(err); }

  pub fn calls(&self) -> Vec<&'static str> { self.calls.lock().unwrap().clone() }

  pub fn saved(&self) -> Vec<ContactFormData> { self.saved.lock().unwrap().clone() }

  fn record(&self, call: &'static str) -> Result<()> {
    self.calls.lock().unwrap().push(call);
    match self.failure.lock().unwrap().clone() {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }

  fn hits<T>(
    items: &[T],
    request: &SearchRequest,
    hit: impl Fn(&T) -> SearchHit,
  ) -> SearchResponse<SearchHit> {
    let matching: Vec<SearchHit> = items
      .iter()
      .map(hit)
      .filter(|h| h.name.contains(&request.keyword))
      .collect();
    SearchResponse {
      total:       matching.len() as u64,
      total_pages: matching.len().div_ceil(request.per_page as usize) as u32,
      items:       page_of(&matching, request.page, request.per_page),
      page:        request.page,
      per_page:    request.per_page,
    }
  }

  fn list(&self, status: ContactStatus, page: u32, per_page: u32) -> Vec<Contact> {
    let all: Vec<Contact> = self
      .contacts
      .lock()
      .unwrap()
      .iter()
      .filter(|c| c.status == status)
      .cloned()
      .collect();
    page_of(&all, page, per_page)
  }

  fn store(&self, id: i64, form: &ContactFormData) -> Contact {
    self.saved.lock().unwrap().push(form.clone());
    Contact {
      title: form.title.clone(),
      ..contact(id, form.status)
    }
  }
}

impl RecordApi for FakeApi {
  async fn search_business_cards(
    &self,
    request: &SearchRequest,
  ) -> Result<SearchResponse<SearchHit>> {
    self.record("search_business_cards")?;
    Ok(Self::hits(&self.cards, request, |c| SearchHit {
      id:         c.id,
      name:       c.name.clone(),
      company:    Some(c.company.clone()),
      department: None,
      position:   c.position.clone(),
    }))
  }

  async fn get_business_card(&self, id: i64) -> Result<BusinessCard> {
    self.record("get_business_card")?;
    self.cards.iter().find(|c| c.id == id).cloned().ok_or(ApiError::Status {
      status: 404,
      detail: None,
    })
  }

  async fn search_coworkers(
    &self,
    request: &SearchRequest,
  ) -> Result<SearchResponse<SearchHit>> {
    self.record("search_coworkers")?;
    Ok(Self::hits(&self.coworkers, request, |c| SearchHit {
      id:         c.id,
      name:       c.name.clone(),
      company:    None,
      department: c.department_id.map(|d| d.to_string()),
      position:   None,
    }))
  }

  async fn get_coworker(&self, id: i64) -> Result<Coworker> {
    self.record("get_coworker")?;
    self.coworkers.iter().find(|c| c.id == id).cloned().ok_or(ApiError::Status {
      status: 404,
      detail: None,
    })
  }

  async fn create_contact(&self, form: &ContactFormData) -> Result<Contact> {
    self.record("create_contact")?;
    Ok(self.store(100, form))
  }

  async fn update_contact(&self, id: i64, form: &ContactFormData) -> Result<Contact> {
    self.record("update_contact")?;
    Ok(self.store(id, form))
  }

  async fn get_contact(&self, id: i64) -> Result<Contact> {
    self.record("get_contact")?;
    self
      .contacts
      .lock()
      .unwrap()
      .iter()
      .find(|c| c.id == id)
      .cloned()
      .ok_or(ApiError::Status {
        status: 404,
        detail: None,
      })
  }

  async fn list_drafts(&self, page: u32, per_page: u32) -> Result<Vec<Contact>> {
    self.record("list_drafts")?;
    Ok(self.list(ContactStatus::Draft, page, per_page))
  }

  async fn list_history(&self, page: u32, per_page: u32) -> Result<Vec<Contact>> {
    self.record("list_history")?;
    Ok(self.list(ContactStatus::Finalized, page, per_page))
  }

  async fn search_contacts(
    &self,
    request: &SearchRequest,
  ) -> Result<SearchResponse<Contact>> {
    self.record("search_contacts")?;
    let all: Vec<Contact> = self
      .contacts
      .lock()
      .unwrap()
      .iter()
      .filter(|c| c.title.as_deref().is_some_and(|t| t.contains(&request.keyword)))
      .cloned()
      .collect();
    Ok(SearchResponse {
      total:       all.len() as u64,
      total_pages: all.len().div_ceil(request.per_page as usize) as u32,
      items:       page_of(&all, request.page, request.per_page),
      page:        request.page,
      per_page:    request.per_page,
    })
  }

  async fn delete_contact(&self, id: i64) -> Result<()> {
    self.record("delete_contact")?;
    self.contacts.lock().unwrap().retain(|c| c.id != id);
    Ok(())
  }

  async fn summarize(&self, text: &str) -> Result<String> {
    self.record("summarize")?;
    Ok(format!("summary: {}", text.chars().take(10).collect::<String>()))
  }
}
