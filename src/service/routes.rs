//! Axum routes for the reunion board service.

use std::path::PathBuf;

use axum::{
    extract::{
        multipart::{Field, Multipart},
        rejection::JsonRejection,
        DefaultBodyLimit, Json, Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::services::{ServeDir, ServeFile};

use crate::auth::AuthConfig;
use crate::board::{paths, JSON_CONTENT_TYPE};
use crate::comments::{Page, PageQuery, GENERAL_PAGE_SIZE, PHOTO_PAGE_SIZE};
use crate::error::BoardError;
use crate::roster::{MergeOutcome, RejectReason};
use crate::store::ObjectStore;
use crate::types::{Attendance, Comment, CommentDraft, GeneralComment, PhotoComment, PublicParticipant, Registration};

use super::middleware::{basic_auth, record_registration, record_upload};
use super::state::ServiceState;

/// Most multipart parts accepted per upload request.
pub const MAX_UPLOAD_PARTS: usize = 8;

/// File fields accepted by the registration form.
pub const PROFILE_PHOTO_FIELDS: [&str; 2] = ["profilePhoto1998", "profilePhoto2023"];

/// Form field carrying a gallery upload.
pub const GALLERY_PHOTO_FIELD: &str = "photo";

// ============================================================================
// Request/Response Types
// ============================================================================

/// `{ "message": ... }` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Gallery listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoListResponse {
    /// Photo URLs, newest first.
    #[serde(rename = "photoURLs")]
    pub photo_urls: Vec<String>,
}

/// Admin listing of profile photo keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedPhotosResponse {
    /// Every key under `uploads/`.
    pub all_uploaded_photos: Vec<String>,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Readiness response with dependency status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub storage: bool,
}

/// Error body; clients read either `error` or `message` depending on the route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    /// `{ "error": ... }`
    Error {
        /// Error text.
        error: String,
    },
    /// `{ "message": ... }`
    Message {
        /// Error text.
        message: String,
    },
}

/// Error response with a fixed status and body.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// JSON body.
    pub body: ErrorBody,
}

impl ErrorResponse {
    /// `{ "error": ... }` with `status`.
    pub fn error(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody::Error { error: error.into() },
        }
    }

    /// `{ "message": ... }` with `status`.
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody::Message {
                message: message.into(),
            },
        }
    }

    /// Log `err` and answer 500 with `error`.
    fn internal(err: &BoardError, error: &str) -> Self {
        tracing::error!(error = %err, "Request failed");
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<BoardError> for ErrorResponse {
    fn from(err: BoardError) -> Self {
        match &err {
            BoardError::MissingUserAgent => Self::error(StatusCode::INTERNAL_SERVER_ERROR, "Invalid Username"),
            BoardError::Roster(e) => Self::error(StatusCode::BAD_REQUEST, e.to_string()),
            BoardError::Comment(e) => Self::error(StatusCode::BAD_REQUEST, e.to_string()),
            BoardError::Validation(m) => Self::error(StatusCode::BAD_REQUEST, m.clone()),
            BoardError::NotFound(_) => Self::error(StatusCode::NOT_FOUND, "Not found"),
            BoardError::Conflict { .. } => Self::error(StatusCode::CONFLICT, err.to_string()),
            BoardError::Backend(_) | BoardError::Corrupt { .. } => Self::internal(&err, "Internal Server Error"),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        if self.status.is_client_error() {
            tracing::warn!(status = self.status.as_u16(), body = ?self.body, "Request error");
        }
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = Result<T, ErrorResponse>;

// ============================================================================
// Multipart
// ============================================================================

/// A file part read from a multipart form.
#[derive(Debug)]
struct UploadedFile {
    field: String,
    file_name: Option<String>,
    content_type: String,
    body: Vec<u8>,
}

fn multipart_error(err: impl std::fmt::Display) -> ErrorResponse {
    ErrorResponse::error(StatusCode::BAD_REQUEST, format!("Invalid multipart body: {}", err))
}

async fn read_file(mut field: Field<'_>, name: String, limit: usize) -> ApiResult<UploadedFile> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let mut body = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if body.len() + chunk.len() > limit {
            return Err(ErrorResponse::error(
                StatusCode::BAD_REQUEST,
                format!("File too large: {}", name),
            ));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(UploadedFile {
        field: name,
        file_name,
        content_type,
        body,
    })
}

/// Read every part, split into text fields and files on the allowed names.
async fn read_form(
    mut multipart: Multipart,
    file_fields: &[&str],
    limit: usize,
) -> ApiResult<(Vec<(String, String)>, Vec<UploadedFile>)> {
    let mut texts = Vec::new();
    let mut files = Vec::new();
    let mut parts = 0;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        parts += 1;
        if parts > MAX_UPLOAD_PARTS {
            return Err(ErrorResponse::error(StatusCode::BAD_REQUEST, "Too many parts"));
        }
        let name = field.name().unwrap_or_default().to_string();
        if field.file_name().is_some() {
            if !file_fields.contains(&name.as_str()) {
                return Err(ErrorResponse::error(
                    StatusCode::BAD_REQUEST,
                    format!("Unexpected field: {}", name),
                ));
            }
            files.push(read_file(field, name, limit).await?);
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            texts.push((name, value));
        }
    }
    Ok((texts, files))
}

fn registration_from(texts: Vec<(String, String)>) -> Registration {
    let mut registration = Registration::default();
    for (name, value) in texts {
        match name.as_str() {
            "firstName" => registration.first_name = value,
            "lastName" => registration.last_name = value,
            "contact" | "email" => registration.contact = value,
            "attendance" => registration.attendance = Attendance::from(value),
            "pwd" => registration.pwd = value,
            _ => {}
        }
    }
    registration
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Register or update a participant, storing any profile photos.
async fn register_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let limit = state.board.config().upload_max_bytes;
    let (texts, photos) = read_form(multipart, &PROFILE_PHOTO_FIELDS, limit).await?;
    let registration = registration_from(texts);
    let user_agent = headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok());

    let outcome = state.board.register(&registration, user_agent).await?;
    record_registration(&outcome);

    let status = match outcome {
        MergeOutcome::Inserted => StatusCode::CREATED,
        MergeOutcome::Updated => StatusCode::OK,
        MergeOutcome::Rejected(RejectReason::CapacityExceeded) => {
            return Err(ErrorResponse::message(StatusCode::INTERNAL_SERVER_ERROR, "Server is Full"));
        }
        MergeOutcome::Rejected(RejectReason::PasswordMismatch) => {
            return Err(ErrorResponse::message(
                StatusCode::BAD_REQUEST,
                "Participant cannot be updated",
            ));
        }
    };

    for photo in photos {
        let bytes = photo.body.len();
        state
            .board
            .upload_profile_photo(&registration, &photo.field, photo.body, &photo.content_type)
            .await?;
        record_upload("profile", bytes);
    }

    let message = if status == StatusCode::CREATED {
        "Participant registered successfully"
    } else {
        "Participant updated successfully"
    };
    Ok((status, MessageResponse::new(message)))
}

/// Public roster.
async fn participants_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
) -> ApiResult<Json<Vec<PublicParticipant>>> {
    let participants = state.board.participants().await?;
    Ok(Json(participants))
}

/// Serve a participant's profile photo.
async fn participant_photo_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
    Path((participant_name, photo_name)): Path<(String, String)>,
) -> ApiResult<Response> {
    let photo = state
        .board
        .participant_photo(&participant_name, &photo_name)
        .await
        .map_err(photo_error)?;
    let content_type = photo.content_type.unwrap_or_else(|| "image/jpeg".to_string());
    Ok(([(header::CONTENT_TYPE, content_type)], photo.body).into_response())
}

fn photo_error(err: BoardError) -> ErrorResponse {
    match err {
        BoardError::NotFound(_) => ErrorResponse::error(StatusCode::NOT_FOUND, "Photo not found"),
        other => other.into(),
    }
}

/// Recent gallery photo URLs.
async fn photos_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
) -> ApiResult<Json<PhotoListResponse>> {
    let photo_urls = state
        .board
        .recent_photos()
        .await
        .map_err(|e| ErrorResponse::internal(&e, "Error fetching photos"))?;
    Ok(Json(PhotoListResponse { photo_urls }))
}

/// Serve a gallery photo.
async fn photo_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
    Path(photo_name): Path<String>,
) -> ApiResult<Response> {
    let photo = state.board.photo(&photo_name).await.map_err(photo_error)?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], photo.body).into_response())
}

/// Add a gallery photo.
async fn add_photo_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
    multipart: Multipart,
) -> ApiResult<Json<MessageResponse>> {
    let limit = state.board.config().upload_max_bytes;
    let (_, files) = read_form(multipart, &[GALLERY_PHOTO_FIELD], limit).await?;
    let photo = files
        .into_iter()
        .next()
        .ok_or_else(|| ErrorResponse::error(StatusCode::BAD_REQUEST, "No photo uploaded"))?;

    let bytes = photo.body.len();
    let original_name = photo.file_name.unwrap_or_else(|| GALLERY_PHOTO_FIELD.to_string());
    state
        .board
        .add_photo(&original_name, photo.body, &photo.content_type)
        .await?;
    record_upload("gallery", bytes);
    Ok(MessageResponse::new("photo uploaded"))
}

/// Add a general or photo comment.
async fn add_comment_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
    draft: Result<Json<CommentDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let Json(draft) = draft.map_err(|e| ErrorResponse::error(StatusCode::BAD_REQUEST, e.body_text()))?;
    let comment = state.board.add_comment(draft).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// One page of the general board.
async fn comments_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<GeneralComment>>> {
    let page = Page::from_query(&query, GENERAL_PAGE_SIZE);
    let comments = state
        .board
        .general_comments(page)
        .await
        .map_err(|e| ErrorResponse::internal(&e, "Comments not supported"))?;
    Ok(Json(comments))
}

/// One page of a photo's thread.
async fn photo_comments_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
    Path(photo_name): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<PhotoComment>>> {
    let page = Page::from_query(&query, PHOTO_PAGE_SIZE);
    let comments = state
        .board
        .photo_comments(&photo_name, page)
        .await
        .map_err(|e| ErrorResponse::internal(&e, "Photo Comments not supported"))?;
    Ok(Json(comments))
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

async fn raw_blob<S: ObjectStore + 'static>(state: &ServiceState<S>, key: &str) -> ApiResult<Response> {
    let body = state.board.raw_blob(key).await?;
    Ok(([(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response())
}

async fn admin_participants_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
) -> ApiResult<Response> {
    raw_blob(&state, paths::PARTICIPANTS).await
}

async fn admin_replace_participants_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
    Json(value): Json<serde_json::Value>,
) -> ApiResult<Json<MessageResponse>> {
    state.board.replace_participants(value).await?;
    Ok(MessageResponse::new("Participants updated"))
}

async fn admin_comments_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
) -> ApiResult<Response> {
    raw_blob(&state, paths::COMMENTS).await
}

async fn admin_replace_comments_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
    Json(value): Json<serde_json::Value>,
) -> ApiResult<Json<MessageResponse>> {
    state.board.replace_comments(value).await?;
    Ok(MessageResponse::new("Comments updated"))
}

async fn admin_auth_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
    Json(config): Json<AuthConfig>,
) -> ApiResult<Json<MessageResponse>> {
    state.board.set_auth_config(&config).await?;
    Ok(MessageResponse::new("Auth updated"))
}

async fn admin_uploaded_photos_handler<S: ObjectStore + 'static>(State(state): State<ServiceState<S>>) -> Response {
    match state.board.uploaded_photos().await {
        Ok(all_uploaded_photos) => Json(UploadedPhotosResponse { all_uploaded_photos }).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Uploaded photo listing failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error fetching uploaded photos").into_response()
        }
    }
}

async fn admin_delete_photo_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
    Path(photo_name): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.board.delete_photo(&photo_name).await?;
    Ok(MessageResponse::new("Photo deleted"))
}

async fn admin_init_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
    Path(name): Path<String>,
    Json(value): Json<serde_json::Value>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let key = state.board.init_blob(&name, &value).await?;
    Ok((StatusCode::CREATED, MessageResponse::new(format!("{} initialized", key))))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Liveness probe. Does not check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe. Returns 503 when the store is unreachable.
async fn readiness_handler<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let storage = state.board.is_healthy().await;
    let status = if storage {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(ReadinessResponse { ready: storage, storage }))
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the reunion board service.
pub fn create_router<S: ObjectStore + 'static>(state: ServiceState<S>) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.upload_body_limit());

    let api = Router::new()
        // Participants
        .route("/api/register", post(register_handler::<S>).layer(upload_limit))
        .route("/api/participants", get(participants_handler::<S>))
        .route(
            "/api/participant-photos/:participantName/:photoName",
            get(participant_photo_handler::<S>),
        )
        // Gallery
        .route("/api/photos", get(photos_handler::<S>))
        .route("/api/photos/:photoName", get(photo_handler::<S>))
        .route("/api/photos/:photoName/comments", get(photo_comments_handler::<S>))
        .route("/api/photo/add", post(add_photo_handler::<S>).layer(upload_limit))
        // Comments
        .route(
            "/api/comments",
            get(comments_handler::<S>).post(add_comment_handler::<S>),
        )
        // Administration
        .route(
            "/admin/participants",
            get(admin_participants_handler::<S>).put(admin_replace_participants_handler::<S>),
        )
        .route(
            "/admin/comments",
            get(admin_comments_handler::<S>).put(admin_replace_comments_handler::<S>),
        )
        .route("/admin/auth", put(admin_auth_handler::<S>))
        .route("/admin/uploadedphotos", get(admin_uploaded_photos_handler::<S>))
        .route("/admin/photos/:photoName", delete(admin_delete_photo_handler::<S>))
        .route("/admin/init/:name", put(admin_init_handler::<S>))
        // Health checks
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler::<S>))
        .with_state(state.clone());

    let index_path = PathBuf::from(&state.config.assets_dir).join(&state.config.index_file);
    let mut index = Router::new().route_service("/", ServeFile::new(index_path));
    if state.config.require_basic_auth {
        index = index.route_layer(middleware::from_fn_with_state(state.clone(), basic_auth::<S>));
    }

    api.merge(index)
        .nest_service("/assets", ServeDir::new(&state.config.assets_dir))
}
