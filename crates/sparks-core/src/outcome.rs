//! # Outcome Pair
//!
//! The universal return shape of every lookup: `(found, value)`.
//!
//! ## Why Not Just `Option`?
//! A lookup that finds nothing is an expected, non-fatal result. `Outcome`
//! keeps that signal next to a payload that is always valid to touch:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Lookup                      found    value                             │
//! │  ──────────────────────────  ─────    ──────────────────────────        │
//! │  single, row exists          true     Some(entity)                      │
//! │  single, no row              false    None                              │
//! │  list, rows exist            true     vec![..] (non-empty)              │
//! │  list, no rows               false    vec![]                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The fields are private so a `found = false` outcome can only be built with
//! the zero value of its payload.

use serde::{Deserialize, Serialize};

/// Result of a lookup that may legitimately find nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome<T> {
    found: bool,
    value: T,
}

impl<T> Outcome<T> {
    /// Whether the lookup matched anything.
    #[inline]
    pub fn is_found(&self) -> bool {
        self.found
    }

    /// Borrows the payload. Only meaningful after checking [`Outcome::is_found`].
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// Splits into the `(found, value)` pair.
    pub fn into_parts(self) -> (bool, T) {
        (self.found, self.value)
    }
}

impl<T: Default> Outcome<T> {
    /// The not-found outcome, carrying the payload's zero value.
    pub fn not_found() -> Self {
        Outcome {
            found: false,
            value: T::default(),
        }
    }
}

impl<T> Outcome<Option<T>> {
    /// A successful single-entity lookup.
    pub fn found(value: T) -> Self {
        Outcome {
            found: true,
            value: Some(value),
        }
    }

    pub fn from_option(value: Option<T>) -> Self {
        Outcome {
            found: value.is_some(),
            value,
        }
    }

    /// Discards the flag; the option already encodes it.
    pub fn into_option(self) -> Option<T> {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<Option<U>> {
        Outcome::from_option(self.value.map(f))
    }
}

impl<T> Outcome<Vec<T>> {
    /// `found` is true iff the list is non-empty.
    pub fn from_list(value: Vec<T>) -> Self {
        Outcome {
            found: !value.is_empty(),
            value,
        }
    }
}

impl<T> From<Option<T>> for Outcome<Option<T>> {
    fn from(value: Option<T>) -> Self {
        Outcome::from_option(value)
    }
}

impl<T> From<Vec<T>> for Outcome<Vec<T>> {
    fn from(value: Vec<T>) -> Self {
        Outcome::from_list(value)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_carries_zero_value() {
        let single: Outcome<Option<String>> = Outcome::not_found();
        assert!(!single.is_found());
        assert_eq!(single.value(), &None);

        let list: Outcome<Vec<u8>> = Outcome::not_found();
        assert!(!list.is_found());
        assert!(list.value().is_empty());
    }

    #[test]
    fn test_list_flag_follows_emptiness() {
        assert!(Outcome::from_list(vec![1]).is_found());
        assert!(!Outcome::from_list(Vec::<i32>::new()).is_found());
    }

    #[test]
    fn test_single_constructors() {
        let hit = Outcome::found(5);
        assert_eq!(hit.clone().into_parts(), (true, Some(5)));
        assert_eq!(hit.map(|v| v * 2).into_option(), Some(10));

        let miss: Outcome<Option<i32>> = None.into();
        assert_eq!(miss.into_parts(), (false, None));
    }

    #[test]
    fn test_serializes_as_pair() {
        let json = serde_json::to_string(&Outcome::found("a")).unwrap();
        assert_eq!(json, r#"{"found":true,"value":"a"}"#);
    }
}
