//! Core record types for the board.

pub mod participant;
pub mod comment;

pub use participant::{Attendance, Participant, PublicParticipant, Registration, upload_folder};
pub use comment::{Comment, CommentDraft, GeneralComment, PhotoComment, PHOTO_REF_PREFIX};
