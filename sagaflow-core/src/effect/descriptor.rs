//! Effect Descriptors
//!
//! A descriptor is an inert value describing a side effect a computation
//! wants performed. Building one does nothing; the interpreter performs it
//! later, once a driver hands it over. Because descriptors compare by
//! field, a test can step a computation and check what it *asked for*
//! without executing anything.
//!
//! Construction validates shape only: a non-empty event kind, a pattern
//! that can match, and an argument count agreeing with the target's
//! declared arity.

use super::{Args, Event, Pattern, Target};
use crate::error::SagaError;

/// The four effect kinds a computation may yield.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send an event to the store. Resumes with the event itself.
    Dispatch { event: Event },

    /// Call a function, or run a computation factory to completion behind
    /// an opaque boundary. Resumes with the settled value.
    Invoke { target: Target, args: Args },

    /// Run a computation factory inline: its yields are interpreted as if
    /// they came from the delegating computation.
    InvokeDelegate { target: Target, args: Args },

    /// Spawn `target` for every future event matching `pattern`.
    WatchEvery {
        pattern: Pattern,
        target: Target,
        args: Args,
    },
}

impl Effect {
    pub fn dispatch(event: Event) -> Result<Self, SagaError> {
        if event.kind().is_empty() {
            return Err(SagaError::EmptyKind);
        }
        Ok(Self::Dispatch { event })
    }

    pub fn invoke(target: &Target, args: Args) -> Result<Self, SagaError> {
        target.check_arity(args.len())?;
        Ok(Self::Invoke {
            target: target.clone(),
            args,
        })
    }

    pub fn delegate(target: &Target, args: Args) -> Result<Self, SagaError> {
        target.check_arity(args.len())?;
        Ok(Self::InvokeDelegate {
            target: target.clone(),
            args,
        })
    }

    /// The target may take either `args` alone or `args` followed by the
    /// triggering event.
    pub fn watch_every(
        pattern: impl Into<Pattern>,
        target: &Target,
        args: Args,
    ) -> Result<Self, SagaError> {
        let pattern = pattern.into();
        pattern.validate()?;
        if !target.wants_event(args.len()) {
            target.check_arity(args.len())?;
        }
        Ok(Self::WatchEvery {
            pattern,
            target: target.clone(),
            args,
        })
    }

    /// Short label used in log output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dispatch { .. } => "dispatch",
            Self::Invoke { .. } => "invoke",
            Self::InvokeDelegate { .. } => "delegate",
            Self::WatchEvery { .. } => "watch_every",
        }
    }
}
