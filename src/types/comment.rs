//! Comment records.
//!
//! The comment log is one JSON array. A comment carrying `photoName` belongs
//! to that photo's thread, every other comment to the general board. The
//! presence of the field is the variant tag, so the two kinds are modelled as
//! an untagged enum and serialize to the same flat shape the web client
//! reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix the web client puts in front of a photo's object name.
pub const PHOTO_REF_PREFIX: &str = "/photos/";

/// A comment posted to the general board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralComment {
    /// Optional heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Author name.
    #[serde(default)]
    pub author: String,
    /// Comment body.
    #[serde(default)]
    pub message: String,
    /// Creation time; absent on entries written before timestamps existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A comment attached to one gallery photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoComment {
    /// Optional heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Author name; may be empty.
    #[serde(default)]
    pub author: String,
    /// Comment body; may be empty.
    #[serde(default)]
    pub message: String,
    /// Photo reference, normally `/photos/{name}`.
    pub photo_name: String,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl PhotoComment {
    /// Whether this comment belongs to the thread of photo `name`.
    pub fn is_about(&self, name: &str) -> bool {
        self.photo_name
            .strip_prefix(PHOTO_REF_PREFIX)
            .is_some_and(|rest| rest == name)
    }
}

/// One entry of the comment log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Comment {
    /// Attached to a photo.
    Photo(PhotoComment),
    /// Posted to the general board.
    General(GeneralComment),
}

impl Comment {
    /// Creation time, if recorded.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Photo(c) => c.timestamp,
            Self::General(c) => c.timestamp,
        }
    }
}

/// A comment as submitted by a client, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentDraft {
    /// Optional heading.
    pub title: Option<String>,
    /// Author name.
    pub author: Option<String>,
    /// Comment body.
    pub message: Option<String>,
    /// Photo reference; selects the photo thread when present.
    pub photo_name: Option<String>,
}
