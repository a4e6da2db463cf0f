//! Reunion Board REST Service
//!
//! Exposes the [`crate::board::EventBoard`] over HTTP.
//!
//! ## Endpoints
//!
//! - `POST /api/register` - Register or update a participant (multipart)
//! - `GET /api/participants` - Public roster
//! - `GET /api/participant-photos/:participantName/:photoName` - Profile photo
//! - `GET /api/photos` - Recent gallery photo URLs
//! - `GET /api/photos/:photoName` - Gallery photo
//! - `GET /api/photos/:photoName/comments` - Photo thread page
//! - `POST /api/photo/add` - Gallery upload (multipart)
//! - `GET /api/comments` - General board page
//! - `POST /api/comments` - Add a comment
//! - `/admin/*` - Blob pass-through for administrators
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /` - Index page behind basic auth
//! - `GET /assets/*` - Static files

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{basic_auth, metrics_middleware, normalize_path, record_registration, record_upload};
pub use routes::{create_router, ErrorBody, ErrorResponse, MessageResponse};
pub use state::ServiceState;
