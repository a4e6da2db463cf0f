//! Photo gallery ranking and upload keys.

use chrono::{DateTime, Utc};

use crate::names::{keep_latin_only, transliterate_greek};
use crate::store::ObjectSummary;

/// Folder that holds gallery photos.
pub const PHOTOS_PREFIX: &str = "photos/";

/// Number of photos returned by the gallery listing unless configured.
pub const DEFAULT_PHOTO_CAP: usize = 50;

/// Whether `key` is excluded by a blocklist entry (exact or prefix match).
pub fn is_blocked(key: &str, blocklist: &[String]) -> bool {
    blocklist.iter().any(|entry| key.starts_with(entry.as_str()))
}

/// Most recently modified photo keys, newest first.
///
/// Folder markers and blocked keys are dropped, the rest is sorted by
/// modification time, reversed, and cut to `cap` entries.
pub fn list_recent_photos(listing: &[ObjectSummary], blocklist: &[String], cap: usize) -> Vec<String> {
    let mut photos: Vec<&ObjectSummary> = listing
        .iter()
        .filter(|o| !o.key.ends_with('/'))
        .filter(|o| !is_blocked(&o.key, blocklist))
        .collect();
    photos.sort_by_key(|o| o.last_modified);
    photos.reverse();
    photos.into_iter().take(cap).map(|o| o.key.clone()).collect()
}

/// URL under which the web client fetches a photo key.
pub fn photo_url(key: &str) -> String {
    format!("api/{}", key)
}

/// Object key for a gallery upload.
///
/// The original file name is transliterated and reduced to ASCII letters and
/// digits, then prefixed with the upload time in milliseconds.
pub fn upload_key(original_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}{}-{}",
        PHOTOS_PREFIX,
        now.timestamp_millis(),
        keep_latin_only(&transliterate_greek(original_name))
    )
}
