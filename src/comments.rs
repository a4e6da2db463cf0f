//! Comment partitioning, pagination and creation.
//!
//! The log is kept newest first. The general board and each photo thread are
//! disjoint views over it, and pages are cut from a view without reordering.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::types::{Comment, CommentDraft, GeneralComment, PhotoComment, PHOTO_REF_PREFIX};

/// Page size for the general board when none is requested.
pub const GENERAL_PAGE_SIZE: usize = 100;

/// Page size for a photo thread when none is requested.
pub const PHOTO_PAGE_SIZE: usize = 10;

/// Message returned when a general comment lacks an author or a body.
pub const REQUIRED_FIELDS_MESSAGE: &str = "Συντάκτης και Μήνυμα είναι υποχρεωτικά πεδία";

/// Raw pagination query parameters.
///
/// Values stay strings so that garbage input falls back to defaults instead
/// of failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    /// Requested page size.
    pub page_size: Option<String>,
    /// Requested page number, starting at 1.
    pub page_number: Option<String>,
}

/// A resolved page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    size: usize,
    number: usize,
}

impl Page {
    /// Create a page request; zero values are raised to 1.
    pub fn new(size: usize, number: usize) -> Self {
        Self {
            size: size.max(1),
            number: number.max(1),
        }
    }

    /// Resolve a query against a default page size.
    ///
    /// Missing, non-numeric, zero or negative values use the defaults.
    pub fn from_query(query: &PageQuery, default_size: usize) -> Self {
        let parse = |v: &Option<String>| {
            v.as_deref()
                .and_then(|s| s.trim().parse::<usize>().ok())
                .filter(|n| *n > 0)
        };
        Self::new(
            parse(&query.page_size).unwrap_or(default_size),
            parse(&query.page_number).unwrap_or(1),
        )
    }

    /// Index range `[start, end)` this page covers, before clamping.
    pub fn bounds(&self) -> (usize, usize) {
        let start = self.number.saturating_sub(1).saturating_mul(self.size);
        (start, start.saturating_add(self.size))
    }
}

/// Cut one page out of a sequence.
pub fn paginate<T>(items: impl IntoIterator<Item = T>, page: Page) -> Vec<T> {
    let (start, end) = page.bounds();
    items.into_iter().skip(start).take(end - start).collect()
}

/// Comments on the general board, newest first.
pub fn general(log: &[Comment]) -> impl Iterator<Item = &GeneralComment> {
    log.iter().filter_map(|c| match c {
        Comment::General(g) => Some(g),
        Comment::Photo(_) => None,
    })
}

/// Comments in the thread of photo `name`, newest first.
pub fn for_photo<'a>(log: &'a [Comment], name: &'a str) -> impl Iterator<Item = &'a PhotoComment> {
    log.iter().filter_map(move |c| match c {
        Comment::Photo(p) if p.is_about(name) => Some(p),
        _ => None,
    })
}

/// One page of the general board.
pub fn list_general(log: &[Comment], page: Page) -> Vec<GeneralComment> {
    paginate(general(log).cloned(), page)
}

/// One page of a photo thread.
pub fn list_for_photo(log: &[Comment], name: &str, page: Page) -> Vec<PhotoComment> {
    paginate(for_photo(log, name).cloned(), page)
}

/// Errors from comment validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommentError {
    /// A general comment without an author or a body.
    #[error("Συντάκτης και Μήνυμα είναι υποχρεωτικά πεδία")]
    MissingRequiredFields,

    /// A photo reference outside the photo folder.
    #[error("Invalid photo reference: {0}")]
    InvalidPhotoRef(String),
}

/// Validate a draft and stamp it with `now`.
///
/// Photo comments may have an empty author and body; general comments need
/// both. A blank photo reference counts as absent.
pub fn build_comment(draft: CommentDraft, now: DateTime<Utc>) -> Result<Comment, CommentError> {
    let CommentDraft { title, author, message, photo_name } = draft;
    match photo_name.filter(|p| !p.trim().is_empty()) {
        Some(photo_name) if !photo_name.starts_with(PHOTO_REF_PREFIX) => {
            Err(CommentError::InvalidPhotoRef(photo_name))
        }
        Some(photo_name) => Ok(Comment::Photo(PhotoComment {
            title,
            author: author.unwrap_or_default(),
            message: message.unwrap_or_default(),
            photo_name,
            timestamp: Some(now),
        })),
        None => {
            let author = author.filter(|a| !a.trim().is_empty());
            let message = message.filter(|m| !m.trim().is_empty());
            match (author, message) {
                (Some(author), Some(message)) => Ok(Comment::General(GeneralComment {
                    title,
                    author,
                    message,
                    timestamp: Some(now),
                })),
                _ => Err(CommentError::MissingRequiredFields),
            }
        }
    }
}

/// Put a new comment at the front of the log.
pub fn prepend(mut log: Vec<Comment>, comment: Comment) -> Vec<Comment> {
    log.insert(0, comment);
    log
}
