//! Basic-auth credentials guarding the index page.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Realm announced in `WWW-Authenticate` challenges.
pub const REALM: &str = "Restricted";

/// Credentials stored in `db/auth.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Expected user name.
    pub username: String,
    /// Expected password.
    pub password: String,
}

impl AuthConfig {
    /// Whether `credentials` match these.
    pub fn accepts(&self, credentials: &Credentials) -> bool {
        self.username == credentials.username && self.password == credentials.password
    }
}

/// Credentials presented by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Decode an `Authorization: Basic ...` header value.
///
/// Returns `None` for other schemes, bad base64, non-UTF-8 payloads, or a
/// payload without the `:` separator.
pub fn parse_basic(header: &str) -> Option<Credentials> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// `WWW-Authenticate` header value for a 401 response.
pub fn challenge() -> String {
    format!("Basic realm=\"{}\"", REALM)
}
