//! Content-derived version tags.
//!
//! The in-memory store tags each object with a hash of its bytes, the same
//! way S3 derives an ETag from content. Equal bytes give equal versions, so
//! rewriting identical content never invalidates a reader's precondition.

use xxhash_rust::xxh64::xxh64;

/// Compute the content hash of a byte slice.
pub fn content_hash(bytes: &[u8]) -> u64 {
    xxh64(bytes, 0)
}

/// Compute the content hash and return it as a quoted hex tag.
pub fn content_version(bytes: &[u8]) -> String {
    format!("\"{:016x}\"", content_hash(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let h1 = content_version(b"[]");
        let h2 = content_version(b"[]");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 18);
    }

    #[test]
    fn test_content_changes_version() {
        assert_ne!(content_version(b"[]"), content_version(b"[{}]"));
    }
}
