// SPDX-License-Identifier: Apache-2.0

//! HTTP handlers for the portfolio API.
//!
//! Three route families share one router:
//! - the public contact gateway (`POST /api/contact`), throttled per
//!   source address
//! - public content reads (profile, publications, projects, students,
//!   gallery)
//! - the token-guarded admin API for message triage and content editing

use crate::{
    auth,
    config::Config,
    db::Database,
    error::{AppError, Result},
    limiter::{QuotaDecision, SubmissionLimiter},
    metrics,
    models::{
        GalleryImage, GalleryImageInput, Message, Profile, ProfileInput, Publication,
        PublicationInput, ResearchProject, ResearchProjectInput, Student, StudentInput,
    },
    validator,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info, warn};

/// Headers consulted for the client address, in trust order.
const SOURCE_ADDRESS_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

/// Bucket shared by requests that carry no address header at all.
const UNKNOWN_SOURCE: &str = "unknown";

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub limiter: SubmissionLimiter,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Public contact form payload.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// Body returned when a submission is stored.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Body returned when the submission quota is exhausted.
#[derive(Debug, Serialize)]
pub struct RateLimitedResponse {
    pub error: &'static str,
    #[serde(rename = "rateLimited")]
    pub rate_limited: bool,
}

/// Body returned for any submission failure.
#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub error: &'static str,
}

/// Read-flag update for a message.
#[derive(Debug, Deserialize)]
pub struct ReadFlagRequest {
    pub is_read: bool,
}

/// Reply to a message.
#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub reply_message: String,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/messages", get(list_messages))
        .route("/messages/:id", delete(delete_message))
        .route("/messages/:id/read", post(set_message_read))
        .route("/messages/:id/reply", post(reply_to_message))
        .route("/profile", put(upsert_profile))
        .route("/publications", post(create_publication))
        .route(
            "/publications/:id",
            put(update_publication).delete(delete_publication),
        )
        .route("/research-projects", post(create_research_project))
        .route(
            "/research-projects/:id",
            put(update_research_project).delete(delete_research_project),
        )
        .route("/students", post(create_student))
        .route("/students/:id", put(update_student).delete(delete_student))
        .route("/gallery", get(list_gallery_admin).post(create_gallery_image))
        .route(
            "/gallery/:id",
            put(update_gallery_image).delete(delete_gallery_image),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let mut router = Router::new()
        .route("/health", get(health))
        .route(
            "/api/contact",
            post(submit_contact).options(contact_preflight),
        )
        .route("/api/profile", get(get_profile))
        .route("/api/publications", get(list_publications))
        .route("/api/research-projects", get(list_research_projects))
        .route("/api/students", get(list_students))
        .route("/api/gallery", get(list_gallery))
        .nest("/api/admin", admin);

    if state.config.metrics.enabled {
        router = router.route(&state.config.metrics.path, get(metrics_handler));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "portfolio-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus metrics endpoint.
pub async fn metrics_handler() -> String {
    metrics::render()
}

/// CORS preflight for the contact endpoint. Never touches storage.
pub async fn contact_preflight() -> StatusCode {
    StatusCode::OK
}

/// Accept a contact form submission.
///
/// Malformed payloads and storage failures both surface the same
/// generic failure body; only the quota rejection is distinguishable,
/// matching what the public form displays.
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: std::result::Result<Json<SubmitRequest>, JsonRejection>,
) -> Response {
    let source = source_address(&headers);
    debug!(source = %source, "Processing contact submission");

    let Ok(Json(req)) = payload else {
        warn!(source = %source, "Contact submission body unreadable");
        metrics::CONTACT_REJECTED.inc();
        return submission_failed();
    };

    let submission = match validator::validate_submission(
        req.name.as_deref(),
        req.email.as_deref(),
        req.subject.as_deref(),
        req.message.as_deref(),
    ) {
        Ok(submission) => submission,
        Err(err) => {
            info!(source = %source, error = %err, "Contact submission invalid");
            metrics::CONTACT_REJECTED.inc();
            return submission_failed();
        }
    };

    match state.limiter.check(&source).await {
        Ok(QuotaDecision::Allowed { count }) => {
            debug!(source = %source, count, "Submission within quota");
        }
        Ok(QuotaDecision::Limited) => {
            info!(source = %source, "Submission rejected by rate limit");
            metrics::CONTACT_RATE_LIMITED.inc();
            return submission_rate_limited();
        }
        Err(err) => {
            // Ledger unavailable: fail closed rather than admit
            // unmetered submissions.
            error!(source = %source, error = %err, "Rate limit check failed");
            metrics::CONTACT_FAILED.inc();
            return submission_failed();
        }
    }

    match state.db.create_message(&submission).await {
        Ok(message) => {
            info!(source = %source, id = %message.id, "Contact message stored");
            metrics::CONTACT_ACCEPTED.inc();
            submission_accepted()
        }
        Err(err) => {
            error!(source = %source, error = %err, "Failed to store contact message");
            metrics::CONTACT_FAILED.inc();
            submission_failed()
        }
    }
}

// ----- public content -----

/// Fetch the site owner profile.
pub async fn get_profile(State(state): State<Arc<AppState>>) -> Result<Json<Profile>> {
    let profile = state
        .db
        .get_profile()
        .await?
        .ok_or_else(|| AppError::RecordNotFound("profile".to_string()))?;
    Ok(Json(profile))
}

/// List publications.
pub async fn list_publications(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Publication>>> {
    Ok(Json(state.db.list_publications().await?))
}

/// List research projects.
pub async fn list_research_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ResearchProject>>> {
    Ok(Json(state.db.list_research_projects().await?))
}

/// List students.
pub async fn list_students(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Student>>> {
    Ok(Json(state.db.list_students().await?))
}

/// List active gallery images.
pub async fn list_gallery(State(state): State<Arc<AppState>>) -> Result<Json<Vec<GalleryImage>>> {
    Ok(Json(state.db.list_gallery(false).await?))
}

// ----- admin: message triage -----

/// List every stored message, newest first.
pub async fn list_messages(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Message>>> {
    Ok(Json(state.db.list_messages().await?))
}

/// Flag a message read or unread.
pub async fn set_message_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ReadFlagRequest>,
) -> Result<Json<Message>> {
    Ok(Json(state.db.set_message_read(&id, req.is_read).await?))
}

/// Record a reply to a message.
pub async fn reply_to_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ReplyRequest>,
) -> Result<Json<Message>> {
    if req.reply_message.trim().is_empty() {
        return Err(AppError::Validation(
            "reply_message must not be empty".to_string(),
        ));
    }
    Ok(Json(state.db.reply_to_message(&id, &req.reply_message).await?))
}

/// Delete a message.
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.db.delete_message(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----- admin: content management -----

/// Create or replace the site owner profile.
pub async fn upsert_profile(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ProfileInput>,
) -> Result<Json<Profile>> {
    Ok(Json(state.db.upsert_profile(&input).await?))
}

/// Create a publication.
pub async fn create_publication(
    State(state): State<Arc<AppState>>,
    Json(input): Json<PublicationInput>,
) -> Result<Json<Publication>> {
    Ok(Json(state.db.create_publication(&input).await?))
}

/// Update a publication.
pub async fn update_publication(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<PublicationInput>,
) -> Result<Json<Publication>> {
    Ok(Json(state.db.update_publication(&id, &input).await?))
}

/// Delete a publication.
pub async fn delete_publication(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.db.delete_publication(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create a research project.
pub async fn create_research_project(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ResearchProjectInput>,
) -> Result<Json<ResearchProject>> {
    Ok(Json(state.db.create_research_project(&input).await?))
}

/// Update a research project.
pub async fn update_research_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<ResearchProjectInput>,
) -> Result<Json<ResearchProject>> {
    Ok(Json(state.db.update_research_project(&id, &input).await?))
}

/// Delete a research project.
pub async fn delete_research_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.db.delete_research_project(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create a student entry.
pub async fn create_student(
    State(state): State<Arc<AppState>>,
    Json(input): Json<StudentInput>,
) -> Result<Json<Student>> {
    Ok(Json(state.db.create_student(&input).await?))
}

/// Update a student entry.
pub async fn update_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<StudentInput>,
) -> Result<Json<Student>> {
    Ok(Json(state.db.update_student(&id, &input).await?))
}

/// Delete a student entry.
pub async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.db.delete_student(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List all gallery images, inactive included.
pub async fn list_gallery_admin(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GalleryImage>>> {
    Ok(Json(state.db.list_gallery(true).await?))
}

/// Create a gallery image.
pub async fn create_gallery_image(
    State(state): State<Arc<AppState>>,
    Json(input): Json<GalleryImageInput>,
) -> Result<Json<GalleryImage>> {
    validator::validate_image_url(&input.image_url)?;
    Ok(Json(state.db.create_gallery_image(&input).await?))
}

/// Update a gallery image.
pub async fn update_gallery_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<GalleryImageInput>,
) -> Result<Json<GalleryImage>> {
    validator::validate_image_url(&input.image_url)?;
    Ok(Json(state.db.update_gallery_image(&id, &input).await?))
}

/// Delete a gallery image.
pub async fn delete_gallery_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.db.delete_gallery_image(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----- helpers -----

/// Determine the source address for quota bucketing.
///
/// `x-forwarded-for` may carry a proxy chain; the client is the first
/// hop. Requests with no usable header share the "unknown" bucket.
pub fn source_address(headers: &HeaderMap) -> String {
    for name in SOURCE_ADDRESS_HEADERS {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            let first = value.split(',').next().unwrap_or(value).trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    UNKNOWN_SOURCE.to_string()
}

fn submission_accepted() -> Response {
    (
        StatusCode::OK,
        Json(SubmitResponse {
            success: true,
            message: "Message sent successfully!",
        }),
    )
        .into_response()
}

fn submission_rate_limited() -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(RateLimitedResponse {
            error: "Rate limit exceeded. Please wait before submitting again.",
            rate_limited: true,
        }),
    )
        .into_response()
}

fn submission_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(FailureResponse {
            error: "Failed to send message. Please try again.",
        }),
    )
        .into_response()
}
