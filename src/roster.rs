//! Participant merge engine.
//!
//! Decides whether a registration inserts a new roster entry, replaces an
//! existing one, or is rejected, and produces the resulting roster. The
//! function is pure: persisting the result is the caller's job.
//!
//! ## Rules
//!
//! 1. Names are brought to storage form (`names::storage_name`).
//! 2. A roster at or above capacity rejects every registration, including
//!    updates of existing entries. The capacity check runs before the
//!    identity search.
//! 3. Identity is `(first_name, last_name)` under `names::names_equal`.
//! 4. A matching entry is replaced only when its password token is empty or
//!    equals the submitted one. The replacement keeps the old `school` and
//!    `sequence_number`.
//! 5. The roster is re-sorted by last name after every accepted change.

use crate::names::{names_equal, storage_name};
use crate::sorter::sort_by_attribute;
use crate::types::{Participant, Registration};

/// Maximum roster size unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 200;

/// Why a registration was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The roster is full.
    CapacityExceeded,
    /// The existing entry is password protected and the password differs.
    PasswordMismatch,
}

/// Result of merging one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A new entry was added.
    Inserted,
    /// An existing entry was replaced.
    Updated,
    /// Nothing changed.
    Rejected(RejectReason),
}

impl MergeOutcome {
    /// Whether the roster changed and must be written back.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// The roster after a merge, with the decision that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    /// New roster (identical to the input when rejected).
    pub roster: Vec<Participant>,
    /// What happened.
    pub outcome: MergeOutcome,
}

/// Errors from malformed registrations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    /// A name is empty after normalization.
    #[error("first and last name are required")]
    MissingName,
}

/// Merge `incoming` into `roster`.
pub fn upsert(
    mut roster: Vec<Participant>,
    incoming: &Registration,
    capacity: usize,
) -> Result<Merge, RosterError> {
    let first_name = storage_name(&incoming.first_name);
    let last_name = storage_name(&incoming.last_name);
    if first_name.is_empty() || last_name.is_empty() {
        return Err(RosterError::MissingName);
    }

    if roster.len() >= capacity {
        return Ok(Merge {
            roster,
            outcome: MergeOutcome::Rejected(RejectReason::CapacityExceeded),
        });
    }

    let existing = roster.iter().position(|p| {
        names_equal(&p.first_name, &first_name) && names_equal(&p.last_name, &last_name)
    });

    let mut record = Participant {
        sequence_number: None,
        first_name,
        last_name,
        contact: incoming.contact.clone(),
        school: None,
        attendance: incoming.attendance.clone(),
        pwd: incoming.pwd.clone(),
    };

    let outcome = match existing {
        None => MergeOutcome::Inserted,
        Some(index) => {
            let stored = &roster[index];
            if !stored.pwd.is_empty() && stored.pwd != incoming.pwd {
                return Ok(Merge {
                    roster,
                    outcome: MergeOutcome::Rejected(RejectReason::PasswordMismatch),
                });
            }
            let stored = roster.remove(index);
            record.school = stored.school;
            record.sequence_number = stored.sequence_number;
            MergeOutcome::Updated
        }
    };

    roster.push(record);
    let roster = sort_by_attribute(&roster, |p| p.last_name.as_str());
    Ok(Merge { roster, outcome })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attendance;

    fn registration(first: &str, last: &str) -> Registration {
        Registration {
            first_name: first.to_string(),
            last_name: last.to_string(),
            contact: "john.doe@example.com".to_string(),
            attendance: Attendance::Yes,
            pwd: String::new(),
        }
    }

    fn stored(first: &str, last: &str, school: &str, pwd: &str) -> Participant {
        Participant {
            first_name: first.to_string(),
            last_name: last.to_string(),
            school: Some(school.to_string()),
            pwd: pwd.to_string(),
            attendance: Attendance::No,
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_into_empty_roster() {
        let merge = upsert(vec![], &registration("anna maria", "doe"), DEFAULT_CAPACITY).unwrap();
        assert_eq!(merge.outcome, MergeOutcome::Inserted);
        assert_eq!(merge.roster.len(), 1);
        let p = &merge.roster[0];
        assert_eq!(p.first_name, "ANNA-MARIA");
        assert_eq!(p.last_name, "DOE");
        assert_eq!(p.attendance, Attendance::Yes);
        assert_eq!(p.pwd, "");
        assert_eq!(p.school, None);
    }

    #[test]
    fn test_update_matches_fuzzy_identity_and_keeps_school() {
        let mut old = stored("anna-maria", "Doe", "1o", "");
        old.sequence_number = Some(serde_json::json!(17));
        let roster = vec![old, stored("Jane", "Doe", "2o", "")];

        let merge = upsert(roster, &registration("anna maria", "doe"), DEFAULT_CAPACITY).unwrap();
        assert_eq!(merge.outcome, MergeOutcome::Updated);
        assert_eq!(merge.roster.len(), 2);

        let updated = merge.roster.iter().find(|p| p.first_name == "ANNA-MARIA").unwrap();
        assert_eq!(updated.school.as_deref(), Some("1o"));
        assert_eq!(updated.sequence_number, Some(serde_json::json!(17)));
        assert_eq!(updated.attendance, Attendance::Yes);
        assert_eq!(updated.contact, "john.doe@example.com");
    }

    #[test]
    fn test_accented_registration_updates_plain_entry() {
        let roster = vec![stored("NIKOS", "PAPADOPOULOS", "3o", "")];
        let merge = upsert(roster, &registration("Níkos", "Papadópoulos"), DEFAULT_CAPACITY).unwrap();
        assert_eq!(merge.outcome, MergeOutcome::Updated);
        assert_eq!(merge.roster.len(), 1);
    }

    #[test]
    fn test_password_mismatch_leaves_roster_unchanged() {
        let roster = vec![stored("JOHN", "DOE", "1o", "secret")];
        let merge = upsert(roster.clone(), &registration("john", "doe"), DEFAULT_CAPACITY).unwrap();
        assert_eq!(merge.outcome, MergeOutcome::Rejected(RejectReason::PasswordMismatch));
        assert_eq!(merge.roster, roster);
    }

    #[test]
    fn test_matching_password_allows_update() {
        let roster = vec![stored("JOHN", "DOE", "1o", "secret")];
        let mut incoming = registration("john", "doe");
        incoming.pwd = "secret".to_string();
        let merge = upsert(roster, &incoming, DEFAULT_CAPACITY).unwrap();
        assert_eq!(merge.outcome, MergeOutcome::Updated);
    }

    #[test]
    fn test_capacity_blocks_even_updates() {
        let mut roster: Vec<_> = (0..DEFAULT_CAPACITY - 1)
            .map(|i| stored(&format!("P{}", i), "X", "", ""))
            .collect();
        roster.push(stored("JOHN", "DOE", "1o", ""));

        let merge = upsert(roster, &registration("john", "doe"), DEFAULT_CAPACITY).unwrap();
        assert_eq!(merge.outcome, MergeOutcome::Rejected(RejectReason::CapacityExceeded));
        assert_eq!(merge.roster.len(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_roster_sorted_by_last_name() {
        let roster = vec![stored("A", "SMITH", "", ""), stored("B", "ADAMS", "", "")];
        let merge = upsert(roster, &registration("c", "jones"), DEFAULT_CAPACITY).unwrap();
        let last: Vec<_> = merge.roster.iter().map(|p| p.last_name.as_str()).collect();
        assert_eq!(last, vec!["ADAMS", "JONES", "SMITH"]);
    }

    #[test]
    fn test_blank_name_is_an_error() {
        let err = upsert(vec![], &registration("  ", "doe"), DEFAULT_CAPACITY).unwrap_err();
        assert_eq!(err, RosterError::MissingName);
    }
}
