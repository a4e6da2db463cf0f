//! The event board: pure components composed with an object store.
//!
//! Every operation re-reads the blobs it needs. Mutations follow one
//! read-modify-write cycle per attempt:
//!
//! ```text
//! get(blob) → decode → pure transform → encode → put(blob, condition)
//! ```
//!
//! Under [`WriteMode::LastWriterWins`] the put is unconditional and a
//! concurrent writer's change can be lost. Under [`WriteMode::Optimistic`]
//! the put is conditioned on the version that was read, and a lost race
//! restarts the cycle from a fresh read.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::auth::AuthConfig;
use crate::comments::{self, Page};
use crate::config::{BoardConfig, WriteMode};
use crate::error::{BoardError, Result};
use crate::gallery::{self, PHOTOS_PREFIX};
use crate::names::storage_name;
use crate::roster::{self, MergeOutcome};
use crate::store::{ObjectStore, PutCondition, PutOutcome, StoredObject};
use crate::types::{
    upload_folder, Comment, CommentDraft, GeneralComment, Participant, PhotoComment, PublicParticipant,
    Registration,
};

/// Object keys of the JSON collections.
pub mod paths {
    /// Participant roster.
    pub const PARTICIPANTS: &str = "db/participants.json";
    /// Comment log.
    pub const COMMENTS: &str = "db/comments.json";
    /// Basic-auth credentials.
    pub const AUTH: &str = "db/auth.json";
    /// Folder of participant profile photos.
    pub const UPLOADS_PREFIX: &str = "uploads/";

    /// Key of an arbitrary named JSON blob.
    pub fn db_blob(name: &str) -> String {
        format!("db/{}.json", name)
    }
}

/// Content type of JSON blobs.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A decoded blob together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    /// Decoded value; the type's default when the blob does not exist.
    pub value: T,
    /// Version of the blob, `None` when it does not exist.
    pub version: Option<String>,
}

/// Decision of a mutation step.
enum Step<T, R> {
    /// Write `T` back and return `R`.
    Write(T, R),
    /// Leave the blob untouched and return `R`.
    Skip(R),
}

/// JSON layout of a written blob.
#[derive(Debug, Clone, Copy)]
enum Layout {
    Compact,
    Pretty,
}

/// Registration, gallery and comment operations over an object store.
pub struct EventBoard<S: ObjectStore> {
    store: S,
    config: BoardConfig,
}

impl<S: ObjectStore> EventBoard<S> {
    /// Create a board over `store`.
    pub fn new(store: S, config: BoardConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active configuration.
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Blob plumbing
    // ------------------------------------------------------------------

    async fn fetch(&self, key: &str) -> Result<Option<StoredObject>> {
        self.store.get(key).await.map_err(|e| {
            warn!(key, error = %e, "Object store read failed");
            BoardError::backend(e)
        })
    }

    async fn read<T: DeserializeOwned + Default>(&self, key: &str) -> Result<Snapshot<T>> {
        match self.fetch(key).await? {
            Some(object) => {
                let value = serde_json::from_slice(&object.body).map_err(|e| BoardError::corrupt(key, e))?;
                Ok(Snapshot {
                    value,
                    version: object.version,
                })
            }
            None => {
                debug!(key, "Blob missing, starting from empty collection");
                Ok(Snapshot {
                    value: T::default(),
                    version: None,
                })
            }
        }
    }

    async fn write<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        layout: Layout,
        condition: PutCondition,
    ) -> Result<PutOutcome> {
        let body = match layout {
            Layout::Compact => serde_json::to_vec(value),
            Layout::Pretty => serde_json::to_vec_pretty(value),
        }
        .map_err(|e| BoardError::corrupt(key, e))?;

        self.store
            .put(key, body, JSON_CONTENT_TYPE, condition)
            .await
            .map_err(|e| {
                warn!(key, error = %e, "Object store write failed");
                BoardError::backend(e)
            })
    }

    fn condition_for(&self, version: Option<&str>) -> PutCondition {
        match (self.config.write_mode, version) {
            (WriteMode::LastWriterWins, _) => PutCondition::Always,
            (WriteMode::Optimistic { .. }, Some(v)) => PutCondition::IfMatch(v.to_string()),
            (WriteMode::Optimistic { .. }, None) => PutCondition::IfAbsent,
        }
    }

    async fn mutate<T, R, F>(&self, key: &str, layout: Layout, mut step: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnMut(T) -> Result<Step<T, R>>,
    {
        let attempts = self.config.write_mode.attempts();
        for attempt in 1..=attempts {
            let snapshot: Snapshot<T> = self.read(key).await?;
            let (value, result) = match step(snapshot.value)? {
                Step::Skip(result) => return Ok(result),
                Step::Write(value, result) => (value, result),
            };

            let condition = self.condition_for(snapshot.version.as_deref());
            match self.write(key, &value, layout, condition).await? {
                PutOutcome::Written { .. } => return Ok(result),
                PutOutcome::PreconditionFailed => {
                    warn!(key, attempt, attempts, "Concurrent write detected, retrying from a fresh read");
                }
            }
        }
        Err(BoardError::Conflict {
            key: key.to_string(),
            attempts,
        })
    }

    // ------------------------------------------------------------------
    // Participants
    // ------------------------------------------------------------------

    /// Read the roster with its version.
    pub async fn load_roster(&self) -> Result<Snapshot<Vec<Participant>>> {
        self.read(paths::PARTICIPANTS).await
    }

    /// Write a roster computed from `base`, honouring the write mode.
    ///
    /// Returns `PreconditionFailed` when optimistic mode detects that the
    /// roster changed since `base` was read.
    pub async fn commit_roster(
        &self,
        base: &Snapshot<Vec<Participant>>,
        roster: &[Participant],
    ) -> Result<PutOutcome> {
        let condition = self.condition_for(base.version.as_deref());
        self.write(paths::PARTICIPANTS, roster, Layout::Pretty, condition).await
    }

    /// Register or update a participant.
    ///
    /// Requests with a missing or empty user agent are refused before the
    /// roster is read.
    pub async fn register(&self, registration: &Registration, user_agent: Option<&str>) -> Result<MergeOutcome> {
        let user_agent = user_agent.filter(|ua| !ua.is_empty());
        let Some(user_agent) = user_agent else {
            warn!("Registration without user agent refused");
            return Err(BoardError::MissingUserAgent);
        };
        debug!(user_agent, "Registration received");

        let capacity = self.config.roster_capacity;
        let outcome = self
            .mutate(paths::PARTICIPANTS, Layout::Pretty, |roster: Vec<Participant>| {
                let merge = roster::upsert(roster, registration, capacity)?;
                Ok(if merge.outcome.is_mutation() {
                    Step::Write(merge.roster, merge.outcome)
                } else {
                    Step::Skip(merge.outcome)
                })
            })
            .await?;

        info!(
            last_name = %storage_name(&registration.last_name),
            outcome = ?outcome,
            "Registration processed"
        );
        Ok(outcome)
    }

    /// Roster as shown publicly, without password tokens.
    pub async fn participants(&self) -> Result<Vec<PublicParticipant>> {
        let roster = self.load_roster().await?;
        Ok(roster.value.into_iter().map(PublicParticipant::from).collect())
    }

    /// Store a profile photo uploaded with a registration.
    ///
    /// Returns the object key, `uploads/{LAST}_{FIRST}/{field}`.
    pub async fn upload_profile_photo(
        &self,
        registration: &Registration,
        field: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        if field.is_empty() || field.contains('/') {
            return Err(BoardError::validation(format!("invalid photo field: {}", field)));
        }
        let folder = upload_folder(
            &storage_name(&registration.first_name),
            &storage_name(&registration.last_name),
        );
        let key = format!("{}/{}", folder, field);
        self.put_bytes(&key, body, content_type).await?;
        info!(key = %key, "Profile photo stored");
        Ok(key)
    }

    /// Fetch a participant's profile photo.
    pub async fn participant_photo(&self, participant_name: &str, photo_name: &str) -> Result<StoredObject> {
        let key = format!("{}{}/{}", paths::UPLOADS_PREFIX, participant_name, photo_name);
        self.fetch(&key).await?.ok_or(BoardError::NotFound(key))
    }

    /// Keys of every uploaded profile photo.
    pub async fn uploaded_photos(&self) -> Result<Vec<String>> {
        let listing = self.store.list(paths::UPLOADS_PREFIX).await.map_err(BoardError::backend)?;
        Ok(listing.into_iter().map(|o| o.key).collect())
    }

    // ------------------------------------------------------------------
    // Gallery
    // ------------------------------------------------------------------

    /// URLs of the most recent gallery photos, newest first.
    pub async fn recent_photos(&self) -> Result<Vec<String>> {
        let listing = self.store.list(PHOTOS_PREFIX).await.map_err(|e| {
            warn!(error = %e, "Photo listing failed");
            BoardError::backend(e)
        })?;
        let keys = gallery::list_recent_photos(&listing, &self.config.photo_blocklist, self.config.photo_cap);
        Ok(keys.iter().map(|k| gallery::photo_url(k)).collect())
    }

    /// Fetch a gallery photo.
    pub async fn photo(&self, photo_name: &str) -> Result<StoredObject> {
        let key = format!("{}{}", PHOTOS_PREFIX, photo_name);
        self.fetch(&key).await?.ok_or(BoardError::NotFound(key))
    }

    /// Store a gallery upload and return its key.
    pub async fn add_photo(&self, original_name: &str, body: Vec<u8>, content_type: &str) -> Result<String> {
        let key = gallery::upload_key(original_name, Utc::now());
        self.put_bytes(&key, body, content_type).await?;
        info!(key = %key, "Gallery photo stored");
        Ok(key)
    }

    /// Remove a gallery photo.
    pub async fn delete_photo(&self, photo_name: &str) -> Result<()> {
        let key = format!("{}{}", PHOTOS_PREFIX, photo_name);
        self.store.delete(&key).await.map_err(BoardError::backend)?;
        info!(key = %key, "Gallery photo deleted");
        Ok(())
    }

    async fn put_bytes(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        if body.len() > self.config.upload_max_bytes {
            return Err(BoardError::validation(format!(
                "file exceeds {} bytes",
                self.config.upload_max_bytes
            )));
        }
        self.store
            .put(key, body, content_type, PutCondition::Always)
            .await
            .map_err(BoardError::backend)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    /// Read the comment log with its version.
    pub async fn load_comments(&self) -> Result<Snapshot<Vec<Comment>>> {
        self.read(paths::COMMENTS).await
    }

    /// Validate, stamp and prepend a comment.
    pub async fn add_comment(&self, draft: CommentDraft) -> Result<Comment> {
        let comment = comments::build_comment(draft, Utc::now())?;
        let stored = comment.clone();
        self.mutate(paths::COMMENTS, Layout::Compact, |log: Vec<Comment>| {
            Ok(Step::Write(comments::prepend(log, stored.clone()), ()))
        })
        .await?;
        info!(
            photo = matches!(comment, Comment::Photo(_)),
            timestamp = ?comment.timestamp(),
            "Comment added"
        );
        Ok(comment)
    }

    /// One page of the general board.
    pub async fn general_comments(&self, page: Page) -> Result<Vec<GeneralComment>> {
        let log = self.load_comments().await?;
        Ok(comments::list_general(&log.value, page))
    }

    /// One page of a photo's thread.
    pub async fn photo_comments(&self, photo_name: &str, page: Page) -> Result<Vec<PhotoComment>> {
        let log = self.load_comments().await?;
        Ok(comments::list_for_photo(&log.value, photo_name, page))
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// Raw bytes of a JSON collection.
    pub async fn raw_blob(&self, key: &str) -> Result<Vec<u8>> {
        self.fetch(key)
            .await?
            .map(|o| o.body)
            .ok_or_else(|| BoardError::NotFound(key.to_string()))
    }

    /// Replace the whole roster.
    pub async fn replace_participants(&self, value: serde_json::Value) -> Result<()> {
        let roster: Vec<Participant> =
            serde_json::from_value(value).map_err(|e| BoardError::validation(e.to_string()))?;
        self.write(paths::PARTICIPANTS, &roster, Layout::Pretty, PutCondition::Always)
            .await?;
        info!(count = roster.len(), "Roster overwritten");
        Ok(())
    }

    /// Replace the whole comment log.
    pub async fn replace_comments(&self, value: serde_json::Value) -> Result<()> {
        let log: Vec<Comment> = serde_json::from_value(value).map_err(|e| BoardError::validation(e.to_string()))?;
        self.write(paths::COMMENTS, &log, Layout::Compact, PutCondition::Always)
            .await?;
        info!(count = log.len(), "Comment log overwritten");
        Ok(())
    }

    /// Read the basic-auth credentials.
    pub async fn auth_config(&self) -> Result<Option<AuthConfig>> {
        match self.fetch(paths::AUTH).await? {
            Some(object) => serde_json::from_slice(&object.body)
                .map(Some)
                .map_err(|e| BoardError::corrupt(paths::AUTH, e)),
            None => Ok(None),
        }
    }

    /// Replace the basic-auth credentials.
    pub async fn set_auth_config(&self, config: &AuthConfig) -> Result<()> {
        self.write(paths::AUTH, config, Layout::Pretty, PutCondition::Always).await?;
        info!("Auth config updated");
        Ok(())
    }

    /// Create or overwrite the named JSON blob `db/{name}.json`.
    pub async fn init_blob(&self, name: &str, value: &serde_json::Value) -> Result<String> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(BoardError::validation(format!("invalid blob name: {}", name)));
        }
        let key = paths::db_blob(name);
        self.write(&key, value, Layout::Pretty, PutCondition::Always).await?;
        info!(key = %key, "Blob initialized");
        Ok(key)
    }

    /// Whether the store is reachable.
    pub async fn is_healthy(&self) -> bool {
        self.store.is_healthy().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::RejectReason;
    use crate::store::InMemoryObjectStore;
    use crate::types::Attendance;

    fn board() -> EventBoard<InMemoryObjectStore> {
        EventBoard::new(InMemoryObjectStore::new(), BoardConfig::default())
    }

    fn registration(first: &str, last: &str) -> Registration {
        Registration {
            first_name: first.into(),
            last_name: last.into(),
            attendance: Attendance::Yes,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_requires_user_agent() {
        let board = board();
        let err = board.register(&registration("a", "b"), None).await.unwrap_err();
        assert!(matches!(err, BoardError::MissingUserAgent));
        let err = board.register(&registration("a", "b"), Some("")).await.unwrap_err();
        assert!(matches!(err, BoardError::MissingUserAgent));
        assert!(board.store().is_empty());
    }

    #[tokio::test]
    async fn test_register_accepts_whitespace_user_agent() {
        let board = board();
        let outcome = board.register(&registration("a", "b"), Some(" ")).await.unwrap();
        assert_eq!(outcome, MergeOutcome::Inserted);
    }

    #[tokio::test]
    async fn test_register_then_update() {
        let board = board();
        let first = board.register(&registration("anna maria", "doe"), Some("agent")).await.unwrap();
        let second = board.register(&registration("Anna Maria", "Doe"), Some("agent")).await.unwrap();
        assert_eq!(first, MergeOutcome::Inserted);
        assert_eq!(second, MergeOutcome::Updated);
        assert_eq!(board.load_roster().await.unwrap().value.len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_registration_does_not_write() {
        let board = EventBoard::new(
            InMemoryObjectStore::new(),
            BoardConfig {
                roster_capacity: 0,
                ..BoardConfig::default()
            },
        );
        let outcome = board.register(&registration("a", "b"), Some("agent")).await.unwrap();
        assert_eq!(outcome, MergeOutcome::Rejected(RejectReason::CapacityExceeded));
        assert!(board.store().body(paths::PARTICIPANTS).is_none());
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let board = board();
        board.store().set_offline(true);
        let err = board.register(&registration("a", "b"), Some("agent")).await.unwrap_err();
        assert!(matches!(err, BoardError::Backend(_)));
    }

    #[tokio::test]
    async fn test_corrupt_roster_is_reported() {
        let board = board();
        board.store().insert(paths::PARTICIPANTS, b"not json".to_vec(), Utc::now());
        let err = board.participants().await.unwrap_err();
        assert!(matches!(err, BoardError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_add_comment_prepends() {
        let board = board();
        let draft = |m: &str| CommentDraft {
            author: Some("A".into()),
            message: Some(m.into()),
            ..Default::default()
        };
        board.add_comment(draft("first")).await.unwrap();
        board.add_comment(draft("second")).await.unwrap();

        let page = board.general_comments(Page::new(10, 1)).await.unwrap();
        assert_eq!(page[0].message, "second");
        assert_eq!(page[1].message, "first");
    }

    #[tokio::test]
    async fn test_profile_photo_key() {
        let board = board();
        let key = board
            .upload_profile_photo(&registration("anna maria", "doe"), "profilePhoto1998", b"img".to_vec(), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(key, "uploads/DOE_ANNA-MARIA/profilePhoto1998");
        let photo = board.participant_photo("DOE_ANNA-MARIA", "profilePhoto1998").await.unwrap();
        assert_eq!(photo.body, b"img");
    }

    #[tokio::test]
    async fn test_upload_limit() {
        let board = EventBoard::new(
            InMemoryObjectStore::new(),
            BoardConfig {
                upload_max_bytes: 2,
                ..BoardConfig::default()
            },
        );
        let err = board.add_photo("a.jpg", b"abc".to_vec(), "image/jpeg").await.unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
    }

    #[tokio::test]
    async fn test_init_blob_rejects_paths() {
        let board = board();
        let err = board.init_blob("../secrets", &serde_json::json!([])).await.unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
        let key = board.init_blob("auth", &serde_json::json!({})).await.unwrap();
        assert_eq!(key, "db/auth.json");
    }
}
