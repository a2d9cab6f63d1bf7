//! Wire types for the records API.
//!
//! Field names follow the backend's JSON exactly; identities are the
//! backend's integer primary keys.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::selection::Keyed;

// ─── People ──────────────────────────────────────────────────────────────────

/// An external contact, as captured from a business card.
///
/// Read-only from the client's side; cards are created in another system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessCard {
  pub id:         i64,
  pub name:       String,
  pub company:    String,
  #[serde(default)]
  pub department: Option<String>,
  #[serde(default)]
  pub position:   Option<String>,
  #[serde(default)]
  pub memo:       Option<String>,
}

/// An internal member of staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coworker {
  pub id:            i64,
  pub name:          String,
  #[serde(default)]
  pub position:      Option<String>,
  pub email:         String,
  #[serde(default)]
  pub sso_id:        Option<String>,
  #[serde(default)]
  pub department_id: Option<i64>,
}

impl Keyed for BusinessCard {
  fn key(&self) -> i64 { self.id }
}

impl Keyed for Coworker {
  fn key(&self) -> i64 { self.id }
}

// ─── Meeting records ─────────────────────────────────────────────────────────

/// Whether a record is still being worked on.
///
/// Travels as the integers `0` and `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ContactStatus {
  Draft,
  Finalized,
}

impl TryFrom<u8> for ContactStatus {
  type Error = String;

  fn try_from(raw: u8) -> Result<Self, Self::Error> {
    match raw {
      0 => Ok(Self::Draft),
      1 => Ok(Self::Finalized),
      other => Err(format!("unknown contact status {other}")),
    }
  }
}

impl From<ContactStatus> for u8 {
  fn from(status: ContactStatus) -> Self {
    match status {
      ContactStatus::Draft => 0,
      ContactStatus::Finalized => 1,
    }
  }
}

/// A meeting record with its participants resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
  pub id:            i64,
  #[serde(default)]
  pub contact_date:  Option<NaiveDate>,
  #[serde(default)]
  pub location:      Option<String>,
  #[serde(default)]
  pub title:         Option<String>,
  #[serde(default)]
  pub summary_text:  Option<String>,
  #[serde(default)]
  pub raw_text:      Option<String>,
  #[serde(default)]
  pub details:       Option<String>,
  pub status:        ContactStatus,
  #[serde(default)]
  pub department_id: Option<i64>,
  #[serde(default)]
  pub coworker_id:   Option<i64>,
  #[serde(with = "timestamp")]
  pub created_at:    NaiveDateTime,
  #[serde(default)]
  pub persons:       Vec<BusinessCard>,
  #[serde(default)]
  pub companions:    Vec<Coworker>,
  /// Some endpoints call this `coworker`.
  #[serde(default, alias = "coworker")]
  pub creator:       Option<Coworker>,
}

/// Body of `POST /contacts/` and `PUT /contacts/{id}`.
///
/// Absent optional fields are omitted from the JSON entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFormData {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub contact_date:  Option<NaiveDate>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub location:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title:         Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub summary_text:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub raw_text:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub details:       Option<String>,
  pub status:        ContactStatus,
  pub person_ids:    Vec<i64>,
  pub companion_ids: Vec<i64>,
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
  pub user_id:  i64,
  pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
  pub access_token: String,
  pub token_type:   String,
  pub user:         Coworker,
}

// ─── Search ──────────────────────────────────────────────────────────────────

/// Body shared by every keyword-search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
  pub keyword:  String,
  pub page:     u32,
  pub per_page: u32,
}

/// One page of keyword-search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse<T> {
  pub items:       Vec<T>,
  pub total:       u64,
  pub page:        u32,
  pub per_page:    u32,
  pub total_pages: u32,
}

/// The abbreviated projection returned by the card and coworker search
/// endpoints. Fetch the full entity by `id` when it is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
  pub id:         i64,
  pub name:       String,
  #[serde(default)]
  pub company:    Option<String>,
  #[serde(default, deserialize_with = "lenient_text")]
  pub department: Option<String>,
  #[serde(default)]
  pub position:   Option<String>,
}

/// Which directory a picker searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
  /// Business cards of people outside the company.
  External,
  /// Coworkers.
  Internal,
}

impl SearchTarget {
  pub fn title(self) -> &'static str {
    match self {
      Self::External => "Search contact persons",
      Self::Internal => "Search coworkers",
    }
  }
}

impl SearchHit {
  /// How the candidate is named when asking the user to confirm a pick.
  pub fn label(&self, target: SearchTarget) -> String {
    match (target, self.company.as_deref()) {
      (SearchTarget::External, Some(company)) => {
        format!("{} ({company})", self.name)
      }
      _ => self.name.clone(),
    }
  }

  /// Secondary line shown under the name in result lists.
  pub fn affiliation(&self, target: SearchTarget) -> Option<&str> {
    match target {
      SearchTarget::External => self.company.as_deref(),
      SearchTarget::Internal => self.department.as_deref(),
    }
  }
}

/// A fully-resolved entity chosen through a picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Picked {
  Card(BusinessCard),
  Coworker(Coworker),
}

// ─── Summaries ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
  pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResponse {
  pub summary: String,
}

// ─── Serde helpers ───────────────────────────────────────────────────────────

/// Accept either a string or a number and keep it as text.
fn lenient_text<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<serde_json::Value>::deserialize(de)?;
  Ok(match raw {
    None | Some(serde_json::Value::Null) => None,
    Some(serde_json::Value::String(s)) => Some(s),
    Some(other) => Some(other.to_string()),
  })
}

/// Timestamps arrive either naive (`2024-05-01T09:30:00`, optionally with
/// fractional seconds) or RFC 3339 with an offset. Offsets are dropped after
/// conversion to UTC.
mod timestamp {
  use chrono::{DateTime, NaiveDateTime};
  use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

  const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

  pub fn serialize<S>(at: &NaiveDateTime, ser: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    ser.serialize_str(&at.format(FORMAT).to_string())
  }

  pub fn deserialize<'de, D>(de: D) -> Result<NaiveDateTime, D::Error>
  where
    D: Deserializer<'de>,
  {
    let raw = String::deserialize(de)?;
    if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
      return Ok(at.naive_utc());
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
      .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
      .map_err(|e| D::Error::custom(format!("bad timestamp {raw:?}: {e}")))
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn status_travels_as_integer() {
    assert_eq!(serde_json::to_value(ContactStatus::Draft).unwrap(), json!(0));
    assert_eq!(
      serde_json::from_value::<ContactStatus>(json!(1)).unwrap(),
      ContactStatus::Finalized
    );
    assert!(serde_json::from_value::<ContactStatus>(json!(2)).is_err());
  }

  #[test]
  fn contact_accepts_naive_and_offset_timestamps() {
    let naive: Contact = serde_json::from_value(json!({
      "id": 3,
      "status": 1,
      "created_at": "2024-05-01T09:30:00.123456",
    }))
    .unwrap();
    assert_eq!(naive.created_at.format("%H:%M").to_string(), "09:30");
    assert!(naive.persons.is_empty());

    let offset: Contact = serde_json::from_value(json!({
      "id": 3,
      "status": 0,
      "created_at": "2024-05-01T09:30:00+09:00",
    }))
    .unwrap();
    assert_eq!(offset.created_at.format("%H:%M").to_string(), "00:30");
  }

  #[test]
  fn contact_reads_creator_under_either_name() {
    let contact: Contact = serde_json::from_value(json!({
      "id": 9,
      "status": 1,
      "created_at": "2024-05-01T09:30:00",
      "coworker": { "id": 1, "name": "Yamada Taro", "email": "taro@example.com" },
    }))
    .unwrap();
    assert_eq!(contact.creator.map(|c| c.name).as_deref(), Some("Yamada Taro"));
  }

  #[test]
  fn form_data_omits_absent_fields() {
    let form = ContactFormData {
      contact_date:  NaiveDate::from_ymd_opt(2024, 5, 1),
      location:      None,
      title:         Some("Kickoff".into()),
      summary_text:  None,
      raw_text:      None,
      details:       None,
      status:        ContactStatus::Finalized,
      person_ids:    vec![4],
      companion_ids: vec![],
    };
    assert_eq!(
      serde_json::to_value(&form).unwrap(),
      json!({
        "contact_date": "2024-05-01",
        "title": "Kickoff",
        "status": 1,
        "person_ids": [4],
        "companion_ids": [],
      })
    );
  }

  #[test]
  fn hit_labels_depend_on_target() {
    let hit: SearchHit = serde_json::from_value(json!({
      "id": 7,
      "name": "Yamada Hanako",
      "company": "Acme KK",
      "department": 12,
    }))
    .unwrap();
    assert_eq!(hit.label(SearchTarget::External), "Yamada Hanako (Acme KK)");
    assert_eq!(hit.label(SearchTarget::Internal), "Yamada Hanako");
    assert_eq!(hit.affiliation(SearchTarget::Internal), Some("12"));
  }
}
