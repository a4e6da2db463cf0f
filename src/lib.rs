//! # reunion-board
//!
//! Registration, photo gallery and comment board for a class reunion.
//!
//! All state lives in an object store as whole JSON blobs and image objects.
//! The board answers three questions:
//!
//! > Who is coming? What photos were shared? What did people say?
//!
//! ## Architecture
//!
//! ```text
//! HTTP request → EventBoard → ObjectStore::get → pure transform → ObjectStore::put
//!                                  ↓
//!                 names / roster / comments / gallery / sorter
//! ```
//!
//! The pure components never touch storage. [`board::EventBoard`] owns the
//! blob layout and the read-modify-write cycle, and [`config::WriteMode`]
//! decides how concurrent writers are treated.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod board;
pub mod canonical;
pub mod comments;
pub mod config;
pub mod error;
pub mod gallery;
pub mod names;
pub mod roster;
pub mod sorter;
pub mod store;
pub mod types;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use auth::{AuthConfig, Credentials};
pub use board::{EventBoard, Snapshot};
pub use comments::{CommentError, Page, PageQuery};
pub use config::{BoardConfig, ServiceConfig, StorageBackend, WriteMode};
pub use error::{BoardError, Result};
pub use names::{names_equal, normalize, storage_name};
pub use roster::{upsert, Merge, MergeOutcome, RejectReason, RosterError};
pub use sorter::{sort_by_attribute, Collate};
pub use store::{InMemoryObjectStore, ObjectStore, ObjectSummary, PutCondition, PutOutcome, StoredObject};
#[cfg(feature = "s3")]
pub use store::S3ObjectStore;
pub use types::{
    Attendance, Comment, CommentDraft, GeneralComment, Participant, PhotoComment, PublicParticipant, Registration,
};
