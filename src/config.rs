//! Environment-driven configuration.
//!
//! ## Board settings
//!
//! - `ROSTER_CAPACITY`: maximum roster size (default: 200)
//! - `PHOTO_CAP`: photos returned by the gallery listing (default: 50)
//! - `PHOTO_BLOCKLIST`: comma-separated keys or key prefixes hidden from the
//!   gallery (default: empty)
//! - `WRITE_MODE`: `last-writer-wins` or `optimistic` (default: last-writer-wins)
//! - `WRITE_MAX_ATTEMPTS`: attempts per optimistic write (default: 3)
//! - `UPLOAD_MAX_BYTES`: per-file upload limit (default: 5 MiB)
//!
//! ## Service settings
//!
//! - `HOST` (default: 0.0.0.0), `PORT` (default: 3000)
//! - `STORAGE_BACKEND`: `memory` or `s3` (default: memory)
//! - `ASSETS_DIR`: static asset directory (default: assets)
//! - `INDEX_FILE`: page served at `/` (default: index.html)
//! - `REQUIRE_BASIC_AUTH`: guard `/` with basic auth (default: true)

use std::str::FromStr;

use crate::gallery::DEFAULT_PHOTO_CAP;
use crate::roster::DEFAULT_CAPACITY;

/// How read-modify-write cycles treat concurrent writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Unconditional whole-blob writes. A concurrent writer's change can be
    /// silently lost.
    LastWriterWins,
    /// Version-checked writes, re-read and retried on conflict.
    Optimistic {
        /// Total attempts before giving up with a conflict error.
        max_attempts: u32,
    },
}

impl WriteMode {
    /// Parse a mode name.
    pub fn parse(s: &str, max_attempts: u32) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "last-writer-wins" | "lww" | "" => Some(Self::LastWriterWins),
            "optimistic" => Some(Self::Optimistic {
                max_attempts: max_attempts.max(1),
            }),
            _ => None,
        }
    }

    /// Number of read-modify-write attempts this mode allows.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::LastWriterWins => 1,
            Self::Optimistic { max_attempts } => *max_attempts,
        }
    }
}

impl Default for WriteMode {
    fn default() -> Self {
        Self::LastWriterWins
    }
}

/// Settings for [`crate::board::EventBoard`].
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Maximum roster size.
    pub roster_capacity: usize,
    /// Gallery listing size.
    pub photo_cap: usize,
    /// Keys or prefixes hidden from the gallery.
    pub photo_blocklist: Vec<String>,
    /// Concurrency behaviour of mutating operations.
    pub write_mode: WriteMode,
    /// Per-file upload limit in bytes.
    pub upload_max_bytes: usize,
}

impl BoardConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_attempts = env_parse("WRITE_MAX_ATTEMPTS").unwrap_or(3);
        let write_mode = match std::env::var("WRITE_MODE") {
            Ok(raw) => WriteMode::parse(&raw, max_attempts).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unknown WRITE_MODE, using last-writer-wins");
                WriteMode::LastWriterWins
            }),
            Err(_) => defaults.write_mode,
        };
        Self {
            roster_capacity: env_parse("ROSTER_CAPACITY").unwrap_or(defaults.roster_capacity),
            photo_cap: env_parse("PHOTO_CAP").unwrap_or(defaults.photo_cap),
            photo_blocklist: std::env::var("PHOTO_BLOCKLIST")
                .map(|raw| parse_list(&raw))
                .unwrap_or(defaults.photo_blocklist),
            write_mode,
            upload_max_bytes: env_parse("UPLOAD_MAX_BYTES").unwrap_or(defaults.upload_max_bytes),
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            roster_capacity: DEFAULT_CAPACITY,
            photo_cap: DEFAULT_PHOTO_CAP,
            photo_blocklist: Vec::new(),
            write_mode: WriteMode::LastWriterWins,
            upload_max_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Which object store the service runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local, lost on restart.
    Memory,
    /// AWS S3 (requires the `s3` feature).
    S3,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "s3" => Ok(Self::S3),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

/// Settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Storage backend.
    pub backend: StorageBackend,
    /// Directory served under `/assets`.
    pub assets_dir: String,
    /// File served at `/`.
    pub index_file: String,
    /// Whether `/` requires basic auth.
    pub require_basic_auth: bool,
}

impl ServiceConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        let backend = match std::env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.backend,
        };
        Ok(Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            backend,
            assets_dir: std::env::var("ASSETS_DIR").unwrap_or(defaults.assets_dir),
            index_file: std::env::var("INDEX_FILE").unwrap_or(defaults.index_file),
            require_basic_auth: std::env::var("REQUIRE_BASIC_AUTH")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.require_basic_auth),
        })
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            backend: StorageBackend::Memory,
            assets_dir: "assets".to_string(),
            index_file: "index.html".to_string(),
            require_basic_auth: true,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
