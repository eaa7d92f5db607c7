// SPDX-License-Identifier: Apache-2.0
//! SurrealDB integration for portfolio content and the submission ledger

use crate::{
    error::{AppError, Result},
    models::{
        GalleryImage, GalleryImageInput, Message, NewMessage, Profile, ProfileInput, Publication,
        PublicationInput, RateLimitRecord, ResearchProject, ResearchProjectInput, Student,
        StudentInput,
    },
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Serialize, Serializer};
use surrealdb::{
    engine::local::{Db, Mem},
    Surreal,
};
use uuid::Uuid;

#[cfg(feature = "rocksdb")]
use surrealdb::engine::local::RocksDb;

/// Database connection wrapper
#[derive(Clone)]
pub struct Database {
    db: Surreal<Db>,
}

/// Stored timestamps keep a fixed six-digit fractional part so the
/// strings sort lexically in chronological order and equality binds
/// match stored values byte for byte.
fn serialize_micros<S: Serializer>(
    dt: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Wraps input fields with creation timestamps.
#[derive(Serialize)]
struct Stamped<'a, T: Serialize> {
    #[serde(flatten)]
    data: &'a T,
    #[serde(serialize_with = "serialize_micros")]
    created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_micros")]
    updated_at: DateTime<Utc>,
}

/// Wraps input fields with a refreshed update timestamp.
#[derive(Serialize)]
struct Timestamped<'a, T: Serialize> {
    #[serde(flatten)]
    data: &'a T,
    #[serde(serialize_with = "serialize_micros")]
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct MessageContent<'a> {
    name: &'a str,
    email: &'a str,
    subject: Option<&'a str>,
    message: &'a str,
    is_read: bool,
    replied: bool,
    #[serde(serialize_with = "serialize_micros")]
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ReadFlagPatch {
    is_read: bool,
}

#[derive(Serialize)]
struct ReplyPatch<'a> {
    replied: bool,
    reply_message: &'a str,
    #[serde(serialize_with = "serialize_micros")]
    replied_at: DateTime<Utc>,
    is_read: bool,
}

#[derive(Serialize)]
struct RateLimitContent<'a> {
    ip_address: &'a str,
    #[serde(serialize_with = "serialize_micros")]
    window_start: DateTime<Utc>,
    submission_count: u32,
}

impl Database {
    /// Connect to SurrealDB
    pub async fn connect(path: &str) -> Result<Self> {
        let db = match path {
            "memory" => Surreal::new::<Mem>(()).await?,
            #[cfg(feature = "rocksdb")]
            other => Surreal::new::<RocksDb>(other).await?,
            #[cfg(not(feature = "rocksdb"))]
            other => {
                return Err(AppError::Internal(format!(
                    "Database path {other:?} requires the `rocksdb` feature"
                )))
            }
        };

        // Use namespace and database
        db.use_ns("portfolio").use_db("site").await?;

        // Initialize schema
        Self::init_schema(&db).await?;

        Ok(Self { db })
    }

    /// Initialize database schema. Runs on every boot; a repeated
    /// DEFINE overwrites the definition without touching stored rows.
    async fn init_schema(db: &Surreal<Db>) -> Result<()> {
        // Contact messages table. Timestamps are stored as RFC 3339
        // strings at fixed precision; comparisons happen on parsed
        // values in Rust.
        db.query(
            r#"
            DEFINE TABLE messages SCHEMAFULL;
            DEFINE FIELD name ON messages TYPE string;
            DEFINE FIELD email ON messages TYPE string;
            DEFINE FIELD subject ON messages TYPE option<string>;
            DEFINE FIELD message ON messages TYPE string;
            DEFINE FIELD is_read ON messages TYPE bool;
            DEFINE FIELD replied ON messages TYPE bool;
            DEFINE FIELD reply_message ON messages TYPE option<string>;
            DEFINE FIELD replied_at ON messages TYPE option<string>;
            DEFINE FIELD created_at ON messages TYPE string;
        "#,
        )
        .await?;

        // Submission throttle ledger
        db.query(
            r#"
            DEFINE TABLE contact_rate_limits SCHEMAFULL;
            DEFINE FIELD ip_address ON contact_rate_limits TYPE string;
            DEFINE FIELD window_start ON contact_rate_limits TYPE string;
            DEFINE FIELD submission_count ON contact_rate_limits TYPE int;

            DEFINE INDEX ip_idx ON contact_rate_limits COLUMNS ip_address;
        "#,
        )
        .await?;

        // Site owner profile
        db.query(
            r#"
            DEFINE TABLE profiles SCHEMAFULL;
            DEFINE FIELD full_name ON profiles TYPE string;
            DEFINE FIELD title ON profiles TYPE option<string>;
            DEFINE FIELD department ON profiles TYPE option<string>;
            DEFINE FIELD bio ON profiles TYPE option<string>;
            DEFINE FIELD email ON profiles TYPE option<string>;
            DEFINE FIELD phone ON profiles TYPE option<string>;
            DEFINE FIELD office_location ON profiles TYPE option<string>;
            DEFINE FIELD profile_image_url ON profiles TYPE option<string>;
            DEFINE FIELD created_at ON profiles TYPE string;
            DEFINE FIELD updated_at ON profiles TYPE string;
        "#,
        )
        .await?;

        // Publications table
        db.query(
            r#"
            DEFINE TABLE publications SCHEMAFULL;
            DEFINE FIELD title ON publications TYPE string;
            DEFINE FIELD authors ON publications TYPE string;
            DEFINE FIELD journal ON publications TYPE option<string>;
            DEFINE FIELD year ON publications TYPE option<int>;
            DEFINE FIELD doi ON publications TYPE option<string>;
            DEFINE FIELD url ON publications TYPE option<string>;
            DEFINE FIELD abstract ON publications TYPE option<string>;
            DEFINE FIELD publication_type ON publications TYPE option<string>;
            DEFINE FIELD citation_count ON publications TYPE option<int>;
            DEFINE FIELD created_at ON publications TYPE string;
            DEFINE FIELD updated_at ON publications TYPE string;
        "#,
        )
        .await?;

        // Research projects table
        db.query(
            r#"
            DEFINE TABLE research_projects SCHEMAFULL;
            DEFINE FIELD title ON research_projects TYPE string;
            DEFINE FIELD description ON research_projects TYPE option<string>;
            DEFINE FIELD detailed_description ON research_projects TYPE option<string>;
            DEFINE FIELD status ON research_projects TYPE option<string>;
            DEFINE FIELD start_date ON research_projects TYPE option<string>;
            DEFINE FIELD end_date ON research_projects TYPE option<string>;
            DEFINE FIELD funding_source ON research_projects TYPE option<string>;
            DEFINE FIELD funding_amount ON research_projects TYPE option<number>;
            DEFINE FIELD collaborators ON research_projects TYPE option<array>;
            DEFINE FIELD publications ON research_projects TYPE option<array>;
            DEFINE FIELD image_url ON research_projects TYPE option<string>;
            DEFINE FIELD project_url ON research_projects TYPE option<string>;
            DEFINE FIELD created_at ON research_projects TYPE string;
            DEFINE FIELD updated_at ON research_projects TYPE string;
        "#,
        )
        .await?;

        // Students table
        db.query(
            r#"
            DEFINE TABLE students SCHEMAFULL;
            DEFINE FIELD name ON students TYPE string;
            DEFINE FIELD degree_level ON students TYPE string;
            DEFINE FIELD program ON students TYPE option<string>;
            DEFINE FIELD research_area ON students TYPE option<string>;
            DEFINE FIELD thesis_title ON students TYPE option<string>;
            DEFINE FIELD status ON students TYPE option<string>;
            DEFINE FIELD email ON students TYPE option<string>;
            DEFINE FIELD bio ON students TYPE option<string>;
            DEFINE FIELD image_url ON students TYPE option<string>;
            DEFINE FIELD linkedin_url ON students TYPE option<string>;
            DEFINE FIELD website_url ON students TYPE option<string>;
            DEFINE FIELD year_started ON students TYPE option<int>;
            DEFINE FIELD graduation_year ON students TYPE option<int>;
            DEFINE FIELD created_at ON students TYPE string;
            DEFINE FIELD updated_at ON students TYPE string;
        "#,
        )
        .await?;

        // Gallery table
        db.query(
            r#"
            DEFINE TABLE gallery SCHEMAFULL;
            DEFINE FIELD title ON gallery TYPE string;
            DEFINE FIELD description ON gallery TYPE option<string>;
            DEFINE FIELD image_url ON gallery TYPE string;
            DEFINE FIELD alt_text ON gallery TYPE option<string>;
            DEFINE FIELD display_order ON gallery TYPE int;
            DEFINE FIELD is_active ON gallery TYPE bool;
            DEFINE FIELD created_at ON gallery TYPE string;
            DEFINE FIELD updated_at ON gallery TYPE string;
        "#,
        )
        .await?;

        Ok(())
    }

    // ----- contact messages -----

    /// Store a validated contact submission
    pub async fn create_message(&self, input: &NewMessage) -> Result<Message> {
        let id = Uuid::new_v4().to_string();
        let created: Option<Message> = self
            .db
            .create(("messages", id.as_str()))
            .content(MessageContent {
                name: &input.name,
                email: &input.email,
                subject: input.subject.as_deref(),
                message: &input.message,
                is_read: false,
                replied: false,
                created_at: Utc::now(),
            })
            .await?;

        created.ok_or_else(|| AppError::Internal("Failed to store message".to_string()))
    }

    /// List all messages, newest first
    pub async fn list_messages(&self) -> Result<Vec<Message>> {
        self.list_entities("SELECT * FROM messages ORDER BY created_at DESC")
            .await
    }

    /// Get a message by ID
    pub async fn get_message(&self, id: &str) -> Result<Message> {
        self.require_entity("messages", id).await
    }

    /// Flag a message as read or unread
    pub async fn set_message_read(&self, id: &str, is_read: bool) -> Result<Message> {
        // UPDATE on a missing record would create it, so resolve first.
        self.require_entity::<Message>("messages", id).await?;

        let updated: Option<Message> = self
            .db
            .update(("messages", id))
            .merge(ReadFlagPatch { is_read })
            .await?;

        updated.ok_or_else(|| AppError::RecordNotFound(format!("messages:{id}")))
    }

    /// Record a reply to a message, marking it read
    pub async fn reply_to_message(&self, id: &str, reply: &str) -> Result<Message> {
        self.require_entity::<Message>("messages", id).await?;

        let updated: Option<Message> = self
            .db
            .update(("messages", id))
            .merge(ReplyPatch {
                replied: true,
                reply_message: reply,
                replied_at: Utc::now(),
                is_read: true,
            })
            .await?;

        updated.ok_or_else(|| AppError::RecordNotFound(format!("messages:{id}")))
    }

    /// Delete a message
    pub async fn delete_message(&self, id: &str) -> Result<()> {
        self.delete_entity::<Message>("messages", id).await
    }

    // ----- submission throttle ledger -----

    /// Find the most recent ledger row for a source address whose window
    /// started at or after `cutoff`
    pub async fn find_active_rate_limit(
        &self,
        ip: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<RateLimitRecord>> {
        let mut result = self
            .db
            .query("SELECT * FROM contact_rate_limits WHERE ip_address = $ip")
            .bind(("ip", ip))
            .await?;

        let rows: Vec<RateLimitRecord> = result.take(0)?;
        Ok(rows
            .into_iter()
            .filter(|row| row.window_start >= cutoff)
            .max_by_key(|row| row.window_start))
    }

    /// Open a new ledger window for a source address with one submission
    pub async fn start_rate_limit_window(
        &self,
        ip: &str,
        window_start: DateTime<Utc>,
    ) -> Result<RateLimitRecord> {
        let id = Uuid::new_v4().to_string();
        let created: Option<RateLimitRecord> = self
            .db
            .create(("contact_rate_limits", id.as_str()))
            .content(RateLimitContent {
                ip_address: ip,
                window_start,
                submission_count: 1,
            })
            .await?;

        created.ok_or_else(|| AppError::Internal("Failed to open ledger window".to_string()))
    }

    /// Add one submission to the window that started at `window_start`.
    /// Returns `None` when the row no longer exists.
    pub async fn increment_rate_limit(
        &self,
        ip: &str,
        window_start: DateTime<Utc>,
    ) -> Result<Option<RateLimitRecord>> {
        let mut result = self
            .db
            .query(
                "UPDATE contact_rate_limits SET submission_count += 1 \
                 WHERE ip_address = $ip AND window_start = $window_start \
                 RETURN AFTER",
            )
            .bind(("ip", ip))
            .bind((
                "window_start",
                window_start.to_rfc3339_opts(SecondsFormat::Micros, true),
            ))
            .await?;

        let rows: Vec<RateLimitRecord> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    /// Delete ledger rows whose window started before `cutoff`.
    /// Returns the number of rows removed.
    pub async fn sweep_expired_rate_limits(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let rows: Vec<RateLimitRecord> = self.db.select("contact_rate_limits").await?;

        let mut deleted = 0u64;
        for row in rows {
            if row.window_start < cutoff {
                let _: Option<RateLimitRecord> = self
                    .db
                    .delete(("contact_rate_limits", row.id.as_str()))
                    .await?;
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    /// List every row in the submission ledger
    pub async fn list_rate_limits(&self) -> Result<Vec<RateLimitRecord>> {
        Ok(self.db.select("contact_rate_limits").await?)
    }

    // ----- site owner profile -----

    /// Get the site owner profile, if one has been created
    pub async fn get_profile(&self) -> Result<Option<Profile>> {
        let mut result = self
            .db
            .query("SELECT * FROM profiles ORDER BY created_at ASC LIMIT 1")
            .await?;

        let profiles: Vec<Profile> = result.take(0)?;
        Ok(profiles.into_iter().next())
    }

    /// Create or update the site owner profile
    pub async fn upsert_profile(&self, input: &ProfileInput) -> Result<Profile> {
        if let Some(existing) = self.get_profile().await? {
            let updated: Option<Profile> = self
                .db
                .update(("profiles", existing.id.as_str()))
                .merge(Timestamped {
                    data: input,
                    updated_at: Utc::now(),
                })
                .await?;

            updated.ok_or_else(|| {
                AppError::RecordNotFound(format!("profiles:{}", existing.id))
            })
        } else {
            self.create_entity("profiles", input).await
        }
    }

    // ----- publications -----

    /// List publications, newest year first
    pub async fn list_publications(&self) -> Result<Vec<Publication>> {
        self.list_entities("SELECT * FROM publications ORDER BY year DESC")
            .await
    }

    /// Create a publication
    pub async fn create_publication(&self, input: &PublicationInput) -> Result<Publication> {
        self.create_entity("publications", input).await
    }

    /// Update a publication
    pub async fn update_publication(
        &self,
        id: &str,
        input: &PublicationInput,
    ) -> Result<Publication> {
        self.update_entity("publications", id, input).await
    }

    /// Delete a publication
    pub async fn delete_publication(&self, id: &str) -> Result<()> {
        self.delete_entity::<Publication>("publications", id).await
    }

    // ----- research projects -----

    /// List research projects, newest first
    pub async fn list_research_projects(&self) -> Result<Vec<ResearchProject>> {
        self.list_entities("SELECT * FROM research_projects ORDER BY created_at DESC")
            .await
    }

    /// Create a research project
    pub async fn create_research_project(
        &self,
        input: &ResearchProjectInput,
    ) -> Result<ResearchProject> {
        self.create_entity("research_projects", input).await
    }

    /// Update a research project
    pub async fn update_research_project(
        &self,
        id: &str,
        input: &ResearchProjectInput,
    ) -> Result<ResearchProject> {
        self.update_entity("research_projects", id, input).await
    }

    /// Delete a research project
    pub async fn delete_research_project(&self, id: &str) -> Result<()> {
        self.delete_entity::<ResearchProject>("research_projects", id)
            .await
    }

    // ----- students -----

    /// List students, most recent intake first
    pub async fn list_students(&self) -> Result<Vec<Student>> {
        self.list_entities("SELECT * FROM students ORDER BY year_started DESC")
            .await
    }

    /// Create a student entry
    pub async fn create_student(&self, input: &StudentInput) -> Result<Student> {
        self.create_entity("students", input).await
    }

    /// Update a student entry
    pub async fn update_student(&self, id: &str, input: &StudentInput) -> Result<Student> {
        self.update_entity("students", id, input).await
    }

    /// Delete a student entry
    pub async fn delete_student(&self, id: &str) -> Result<()> {
        self.delete_entity::<Student>("students", id).await
    }

    // ----- gallery -----

    /// List gallery images in display order, optionally including
    /// inactive ones
    pub async fn list_gallery(&self, include_inactive: bool) -> Result<Vec<GalleryImage>> {
        let query = if include_inactive {
            "SELECT * FROM gallery ORDER BY display_order ASC"
        } else {
            "SELECT * FROM gallery WHERE is_active = true ORDER BY display_order ASC"
        };
        self.list_entities(query).await
    }

    /// Create a gallery image
    pub async fn create_gallery_image(&self, input: &GalleryImageInput) -> Result<GalleryImage> {
        self.create_entity("gallery", input).await
    }

    /// Update a gallery image
    pub async fn update_gallery_image(
        &self,
        id: &str,
        input: &GalleryImageInput,
    ) -> Result<GalleryImage> {
        self.update_entity("gallery", id, input).await
    }

    /// Delete a gallery image
    pub async fn delete_gallery_image(&self, id: &str) -> Result<()> {
        self.delete_entity::<GalleryImage>("gallery", id).await
    }

    // ----- shared helpers -----

    async fn list_entities<E>(&self, query: &str) -> Result<Vec<E>>
    where
        E: DeserializeOwned,
    {
        let mut result = self.db.query(query).await?;
        Ok(result.take(0)?)
    }

    async fn require_entity<E>(&self, table: &str, id: &str) -> Result<E>
    where
        E: DeserializeOwned,
    {
        let record: Option<E> = self.db.select((table, id)).await?;
        record.ok_or_else(|| AppError::RecordNotFound(format!("{table}:{id}")))
    }

    async fn create_entity<I, E>(&self, table: &str, input: &I) -> Result<E>
    where
        I: Serialize,
        E: DeserializeOwned,
    {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let created: Option<E> = self
            .db
            .create((table, id.as_str()))
            .content(Stamped {
                data: input,
                created_at: now,
                updated_at: now,
            })
            .await?;

        created.ok_or_else(|| AppError::Internal(format!("Failed to create {table} record")))
    }

    async fn update_entity<I, E>(&self, table: &str, id: &str, input: &I) -> Result<E>
    where
        I: Serialize,
        E: DeserializeOwned,
    {
        self.require_entity::<E>(table, id).await?;

        let updated: Option<E> = self
            .db
            .update((table, id))
            .merge(Timestamped {
                data: input,
                updated_at: Utc::now(),
            })
            .await?;

        updated.ok_or_else(|| AppError::RecordNotFound(format!("{table}:{id}")))
    }

    async fn delete_entity<E>(&self, table: &str, id: &str) -> Result<()>
    where
        E: DeserializeOwned,
    {
        self.require_entity::<E>(table, id).await?;
        let _: Option<E> = self.db.delete((table, id)).await?;
        Ok(())
    }
}
