//! Watch patterns matched against incoming event kinds.

use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use super::Event;
use crate::error::SagaError;

/// Wildcard accepted by [`Pattern::from`].
pub const WILDCARD: &str = "*";

/// Decides which events a watch registration reacts to.
#[derive(Clone)]
pub enum Pattern {
    /// Every event.
    Any,
    /// Events of exactly this kind.
    Kind(String),
    /// Events whose kind is any of these.
    OneOf(SmallVec<[String; 2]>),
    /// Events for which the predicate holds.
    Predicate(Rc<dyn Fn(&Event) -> bool>),
}

impl Pattern {
    /// Build a predicate pattern.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Event) -> bool + 'static,
    {
        Self::Predicate(Rc::new(f))
    }

    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Self::Any => true,
            Self::Kind(kind) => kind == event.kind(),
            Self::OneOf(kinds) => kinds.iter().any(|kind| kind == event.kind()),
            Self::Predicate(f) => f(event),
        }
    }

    /// Reject patterns that can never match a well-formed event.
    pub fn validate(&self) -> Result<(), SagaError> {
        match self {
            Self::Kind(kind) if kind.is_empty() => Err(SagaError::EmptyPattern),
            Self::OneOf(kinds) if kinds.is_empty() || kinds.iter().any(String::is_empty) => {
                Err(SagaError::EmptyPattern)
            }
            _ => Ok(()),
        }
    }
}

impl From<&str> for Pattern {
    fn from(kind: &str) -> Self {
        if kind == WILDCARD {
            Self::Any
        } else {
            Self::Kind(kind.to_string())
        }
    }
}

impl From<String> for Pattern {
    fn from(kind: String) -> Self {
        Self::from(kind.as_str())
    }
}

impl From<&[&str]> for Pattern {
    fn from(kinds: &[&str]) -> Self {
        Self::OneOf(kinds.iter().map(|kind| kind.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Pattern {
    fn from(kinds: [&str; N]) -> Self {
        Self::from(&kinds[..])
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Any, Self::Any) => true,
            (Self::Kind(a), Self::Kind(b)) => a == b,
            (Self::OneOf(a), Self::OneOf(b)) => a == b,
            (Self::Predicate(a), Self::Predicate(b)) => {
                Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(WILDCARD),
            Self::Kind(kind) => write!(f, "{kind:?}"),
            Self::OneOf(kinds) => f.debug_list().entries(kinds).finish(),
            Self::Predicate(_) => f.write_str("<predicate>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matches_everything() {
        let pattern = Pattern::from("*");
        assert_eq!(pattern, Pattern::Any);
        assert!(pattern.matches(&Event::new("A")));
        assert!(pattern.matches(&Event::new("B")));
    }

    #[test]
    fn kind_and_one_of() {
        let kind = Pattern::from("FRUITS_WANTED");
        assert!(kind.matches(&Event::new("FRUITS_WANTED")));
        assert!(!kind.matches(&Event::new("VEGGIES_WANTED")));

        let either = Pattern::from(["FRUITS_WANTED", "VEGGIES_WANTED"]);
        assert!(either.matches(&Event::new("VEGGIES_WANTED")));
        assert!(!either.matches(&Event::new("MEAT_WANTED")));
    }

    #[test]
    fn predicate_sees_payload() {
        let pattern = Pattern::predicate(|event| event.get("payload").is_some());
        assert!(pattern.matches(&Event::with_payload("X", 1)));
        assert!(!pattern.matches(&Event::new("X")));
        assert_eq!(pattern, pattern.clone());
        assert_ne!(pattern, Pattern::predicate(|_| true));
    }

    #[test]
    fn empty_patterns_are_rejected() {
        assert_eq!(Pattern::from("").validate(), Err(SagaError::EmptyPattern));
        assert_eq!(
            Pattern::OneOf(SmallVec::new()).validate(),
            Err(SagaError::EmptyPattern)
        );
        assert!(Pattern::Any.validate().is_ok());
    }
}
