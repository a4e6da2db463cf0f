//! Participant roster records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a participant plans to attend.
///
/// Anything other than `"Yes"` or `"No"` is kept verbatim as `Unknown`, so a
/// roster written by an older client round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Attendance {
    /// Attending.
    Yes,
    /// Not attending.
    No,
    /// Unrecognized or missing answer.
    Unknown(String),
}

impl Attendance {
    /// Parse an attendance answer.
    pub fn from_str(s: &str) -> Self {
        match s {
            "Yes" => Self::Yes,
            "No" => Self::No,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl Default for Attendance {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl From<String> for Attendance {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

impl From<Attendance> for String {
    fn from(a: Attendance) -> Self {
        a.to_string()
    }
}

impl fmt::Display for Attendance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "Yes"),
            Self::No => write!(f, "No"),
            Self::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

/// A roster entry as stored in `db/participants.json`.
///
/// Every field is optional in stored JSON; legacy blobs contain bare `{}`
/// entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Participant {
    /// Opaque sequence value assigned by an administrator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<serde_json::Value>,
    /// Storage-form first name.
    pub first_name: String,
    /// Storage-form last name.
    pub last_name: String,
    /// Free-form contact details.
    #[serde(alias = "email")]
    pub contact: String,
    /// School or class, assigned by an administrator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    /// Attendance answer.
    pub attendance: Attendance,
    /// Password token; empty means the entry is open for updates.
    pub pwd: String,
}

/// `uploads/{LAST}_{FIRST}` for storage-form names.
pub fn upload_folder(first_name: &str, last_name: &str) -> String {
    format!("uploads/{}_{}", last_name, first_name)
}

/// A participant as shown on the public roster, without the password token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicParticipant {
    /// Opaque sequence value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<serde_json::Value>,
    /// Storage-form first name.
    pub first_name: String,
    /// Storage-form last name.
    pub last_name: String,
    /// Contact details.
    pub contact: String,
    /// School or class.
    pub school: Option<String>,
    /// Attendance answer.
    pub attendance: Attendance,
}

impl From<Participant> for PublicParticipant {
    fn from(p: Participant) -> Self {
        Self {
            sequence_number: p.sequence_number,
            first_name: p.first_name,
            last_name: p.last_name,
            contact: p.contact,
            school: p.school,
            attendance: p.attendance,
        }
    }
}

/// A registration form submission, with names as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Registration {
    /// First name as submitted.
    pub first_name: String,
    /// Last name as submitted.
    pub last_name: String,
    /// Contact details.
    #[serde(alias = "email")]
    pub contact: String,
    /// Attendance answer.
    pub attendance: Attendance,
    /// Submitted password token; the web client always sends an empty one.
    pub pwd: String,
}
