//! Stable, collation-aware ordering of record collections.
//!
//! Records are ordered by a typed attribute projection. Text attributes
//! collate at primary strength (case and accents ignored), numeric attributes
//! compare numerically. Because the projection has a single return type, a
//! collection cannot mix text and numeric keys.
//!
//! Text collation compares normalized code points. Letters that canonical
//! decomposition leaves whole (`ø`, `ß`, `ł`, `æ`) sort after `z` instead of
//! next to their base letter.

use std::cmp::Ordering;

use crate::names::normalize;

/// A value that can be used as a sort attribute.
pub trait Collate {
    /// Compare two attribute values.
    fn collate(&self, other: &Self) -> Ordering;
}

impl Collate for str {
    fn collate(&self, other: &Self) -> Ordering {
        normalize(self).cmp(&normalize(other))
    }
}

impl Collate for String {
    fn collate(&self, other: &Self) -> Ordering {
        self.as_str().collate(other.as_str())
    }
}

impl<T: Collate + ?Sized> Collate for &T {
    fn collate(&self, other: &Self) -> Ordering {
        (**self).collate(*other)
    }
}

macro_rules! collate_integer {
    ($($ty:ty),*) => {
        $(impl Collate for $ty {
            fn collate(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }
        })*
    };
}

collate_integer!(i32, i64, u32, u64, usize);

impl Collate for f64 {
    fn collate(&self, other: &Self) -> Ordering {
        // NaN sorts after every number.
        self.partial_cmp(other).unwrap_or_else(|| self.is_nan().cmp(&other.is_nan()))
    }
}

/// Return a new vector of `records` ordered by `attribute`.
///
/// The sort is stable: records with equal keys keep their relative order.
///
/// # Example
///
/// ```rust
/// use reunion_board::sorter::sort_by_attribute;
///
/// let names = vec!["charlie", "Álvaro", "bob"];
/// let sorted = sort_by_attribute(&names, |n| *n);
/// assert_eq!(sorted, vec!["Álvaro", "bob", "charlie"]);
/// ```
pub fn sort_by_attribute<'a, T, K, F>(records: &'a [T], attribute: F) -> Vec<T>
where
    T: Clone,
    K: Collate,
    F: Fn(&'a T) -> K,
{
    let mut keyed: Vec<(K, &'a T)> = records.iter().map(|r| (attribute(r), r)).collect();
    keyed.sort_by(|a, b| a.0.collate(&b.0));
    keyed.into_iter().map(|(_, r)| r.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        name: &'static str,
        age: i64,
        score: &'static str,
    }

    fn people() -> Vec<Person> {
        vec![
            Person { name: "Alice", age: 30, score: "C" },
            Person { name: "Charlie", age: 25, score: "A" },
            Person { name: "Bob", age: 35, score: "B" },
        ]
    }

    #[test]
    fn test_sort_by_text_attribute() {
        let sorted = sort_by_attribute(&people(), |p| p.name);
        let names: Vec<_> = sorted.iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Charlie"]);
    }

    #[test]
    fn test_sort_by_numeric_attribute() {
        let sorted = sort_by_attribute(&people(), |p| p.age);
        let names: Vec<_> = sorted.iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Charlie", "Alice", "Bob"]);
    }

    #[test]
    fn test_sort_by_letter_grades() {
        let sorted = sort_by_attribute(&people(), |p| p.score);
        let names: Vec<_> = sorted.iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Charlie", "Bob", "Alice"]);
    }

    #[test]
    fn test_does_not_mutate_input() {
        let input = people();
        let _ = sort_by_attribute(&input, |p| p.age);
        assert_eq!(input, people());
    }

    #[test]
    fn test_case_and_accent_insensitive_is_stable() {
        let input = vec![("b", 1), ("á", 2), ("A", 3), ("a", 4)];
        let sorted = sort_by_attribute(&input, |r| r.0);
        assert_eq!(sorted, vec![("á", 2), ("A", 3), ("a", 4), ("b", 1)]);
    }

    #[test]
    fn test_nan_sorts_last() {
        let input = vec![f64::NAN, 2.0, 1.0];
        let sorted = sort_by_attribute(&input, |v| *v);
        assert_eq!(sorted[0], 1.0);
        assert_eq!(sorted[1], 2.0);
        assert!(sorted[2].is_nan());
    }
}
