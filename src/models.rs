// SPDX-License-Identifier: Apache-2.0
//! Data models for the portfolio API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use surrealdb::sql::Thing;

/// Record identifier.
///
/// SurrealDB returns record ids as `Thing` values (`table:key`); the API
/// exposes only the bare key string. Deserialization accepts both forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Thing(Thing),
            Text(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Thing(thing) => RecordId(thing.id.to_raw()),
            Repr::Text(text) => RecordId(text),
        })
    }
}

/// A message submitted through the public contact form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub replied: bool,
    pub reply_message: Option<String>,
    pub replied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A validated contact submission, ready to store.
///
/// Field values are kept exactly as submitted.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

/// One row of the submission throttle ledger.
///
/// `window_start` marks when the source address opened its current
/// window; `submission_count` is how many submissions it has recorded
/// since then.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitRecord {
    pub id: RecordId,
    pub ip_address: String,
    pub window_start: DateTime<Utc>,
    pub submission_count: u32,
}

/// Site owner profile shown on the public site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: RecordId,
    pub full_name: String,
    pub title: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub office_location: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable profile fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInput {
    pub full_name: String,
    pub title: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub office_location: Option<String>,
    pub profile_image_url: Option<String>,
}

/// A published paper or article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    pub id: RecordId,
    pub title: String,
    pub authors: String,
    pub journal: Option<String>,
    pub year: Option<i32>,
    pub doi: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub publication_type: Option<String>,
    pub citation_count: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable publication fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationInput {
    pub title: String,
    pub authors: String,
    pub journal: Option<String>,
    pub year: Option<i32>,
    pub doi: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub publication_type: Option<String>,
    pub citation_count: Option<i32>,
}

/// A research project listed on the public site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchProject {
    pub id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub detailed_description: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub funding_source: Option<String>,
    pub funding_amount: Option<f64>,
    pub collaborators: Option<Vec<String>>,
    pub publications: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub project_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable research project fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchProjectInput {
    pub title: String,
    pub description: Option<String>,
    pub detailed_description: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub funding_source: Option<String>,
    pub funding_amount: Option<f64>,
    pub collaborators: Option<Vec<String>>,
    pub publications: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub project_url: Option<String>,
}

/// A current or former student in the research group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: RecordId,
    pub name: String,
    pub degree_level: String,
    pub program: Option<String>,
    pub research_area: Option<String>,
    pub thesis_title: Option<String>,
    pub status: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub website_url: Option<String>,
    pub year_started: Option<i32>,
    pub graduation_year: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable student fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentInput {
    pub name: String,
    pub degree_level: String,
    pub program: Option<String>,
    pub research_area: Option<String>,
    pub thesis_title: Option<String>,
    pub status: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub website_url: Option<String>,
    pub year_started: Option<i32>,
    pub graduation_year: Option<i32>,
}

/// An image in the site gallery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub alt_text: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable gallery image fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryImageInput {
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub alt_text: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}
