//! Property tests for the pure board components.

use proptest::prelude::*;

use reunion_board::comments::{for_photo, general, paginate, Page};
use reunion_board::names::{names_equal, normalize};
use reunion_board::roster::{upsert, MergeOutcome};
use reunion_board::sorter::{sort_by_attribute, Collate};
use reunion_board::types::{Comment, GeneralComment, PhotoComment};
use reunion_board::{Attendance, Participant, Registration};

const NAME_POOL: &[&str] = &["Anna", "ANNA", "Ánna", "anna maria", "Bill", "μαρία", "ΜΑΡΊΑ", "Νίκος"];
const PHOTO_POOL: &[&str] = &["a.jpg", "b.jpg", "c.jpg"];

fn arb_name() -> impl Strategy<Value = String> {
    "[a-zA-Zα-ωΑ-Ωάέήίόύώς ]{0,16}"
}

fn arb_registration() -> impl Strategy<Value = Registration> {
    (prop::sample::select(NAME_POOL), prop::sample::select(NAME_POOL), "[a-z]{0,2}").prop_map(
        |(first, last, pwd)| Registration {
            first_name: first.to_string(),
            last_name: last.to_string(),
            attendance: Attendance::Yes,
            pwd,
            ..Default::default()
        },
    )
}

fn arb_comment() -> impl Strategy<Value = Comment> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(|message| Comment::General(GeneralComment {
            title: None,
            author: "A".to_string(),
            message,
            timestamp: None,
        })),
        (prop::sample::select(PHOTO_POOL), "[a-z]{1,8}").prop_map(|(photo, message)| {
            Comment::Photo(PhotoComment {
                title: None,
                author: "B".to_string(),
                message,
                photo_name: format!("/photos/{}", photo),
                timestamp: None,
            })
        }),
    ]
}

/// A comment log whose messages record their own position, `m<index>`.
fn arb_log() -> impl Strategy<Value = Vec<Comment>> {
    prop::collection::vec(arb_comment(), 0..60).prop_map(|log| {
        log.into_iter()
            .enumerate()
            .map(|(i, comment)| match comment {
                Comment::General(g) => Comment::General(GeneralComment {
                    message: format!("m{}", i),
                    ..g
                }),
                Comment::Photo(p) => Comment::Photo(PhotoComment {
                    message: format!("m{}", i),
                    ..p
                }),
            })
            .collect()
    })
}

proptest! {
    /// Normalizing twice changes nothing.
    #[test]
    fn prop_normalize_is_idempotent(name in arb_name()) {
        let once = normalize(&name);
        prop_assert_eq!(normalize(&once), once);
    }

    /// Case never distinguishes two names.
    #[test]
    fn prop_names_equal_ignores_case(name in arb_name()) {
        prop_assert!(names_equal(&name, &name.to_uppercase()));
        prop_assert!(names_equal(&name.to_lowercase(), &name));
    }

    /// Any upsert sequence keeps one entry per identity and respects capacity.
    #[test]
    fn prop_upsert_sequence_invariants(
        registrations in prop::collection::vec(arb_registration(), 0..40),
        capacity in 1usize..8,
    ) {
        let mut roster: Vec<Participant> = Vec::new();
        for registration in &registrations {
            let before = roster.len();
            let merge = upsert(roster, registration, capacity).unwrap();
            roster = merge.roster;

            prop_assert!(roster.len() <= capacity);
            match merge.outcome {
                MergeOutcome::Inserted => prop_assert_eq!(roster.len(), before + 1),
                MergeOutcome::Updated | MergeOutcome::Rejected(_) => prop_assert_eq!(roster.len(), before),
            }

            for (i, a) in roster.iter().enumerate() {
                for b in &roster[i + 1..] {
                    prop_assert!(
                        !(names_equal(&a.first_name, &b.first_name) && names_equal(&a.last_name, &b.last_name)),
                        "duplicate identity {} {}", a.first_name, a.last_name
                    );
                }
            }
            let sorted = sort_by_attribute(&roster, |p| p.last_name.as_str());
            prop_assert_eq!(&sorted, &roster);
        }
    }

    /// The views partition the log: each keeps log order, and together they
    /// hold every entry exactly once.
    #[test]
    fn prop_partition_is_complete(log in arb_log()) {
        let index_of = |message: &str| -> usize { message[1..].parse().unwrap() };

        let mut views: Vec<Vec<(usize, Comment)>> = vec![general(&log)
            .map(|g| (index_of(&g.message), Comment::General(g.clone())))
            .collect()];
        for photo in PHOTO_POOL {
            views.push(
                for_photo(&log, photo)
                    .map(|p| (index_of(&p.message), Comment::Photo(p.clone())))
                    .collect(),
            );
        }

        for view in &views {
            for pair in view.windows(2) {
                prop_assert!(pair[0].0 < pair[1].0, "view out of log order");
            }
        }

        let mut merged: Vec<(usize, Comment)> = views.into_iter().flatten().collect();
        merged.sort_by_key(|(i, _)| *i);
        let indices: Vec<usize> = merged.iter().map(|(i, _)| *i).collect();
        prop_assert_eq!(indices, (0..log.len()).collect::<Vec<_>>());

        let rebuilt: Vec<Comment> = merged.into_iter().map(|(_, c)| c).collect();
        prop_assert_eq!(rebuilt, log);
    }

    /// A page is the `[(n-1)*size, n*size)` window of the sequence.
    #[test]
    fn prop_paginate_window(len in 0usize..300, size in 1usize..60, number in 1usize..12) {
        let items: Vec<usize> = (0..len).collect();
        let page = paginate(items.iter().copied(), Page::new(size, number));

        let start = ((number - 1) * size).min(len);
        let end = (number * size).min(len);
        prop_assert_eq!(page, items[start..end].to_vec());
    }

    /// Sorting yields a permutation in non-decreasing collation order.
    #[test]
    fn prop_sort_orders_and_preserves(names in prop::collection::vec(arb_name(), 0..30)) {
        let sorted = sort_by_attribute(&names, |n| n.as_str());

        prop_assert_eq!(sorted.len(), names.len());
        for pair in sorted.windows(2) {
            prop_assert_ne!(pair[0].as_str().collate(pair[1].as_str()), std::cmp::Ordering::Greater);
        }
        let mut a = names.clone();
        let mut b = sorted.clone();
        a.sort();
        b.sort();
        prop_assert_eq!(a, b);
    }
}
