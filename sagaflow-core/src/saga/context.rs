//! Saga Context
//!
//! The handle a [`GeneratorSaga`](super::GeneratorSaga) body yields effects
//! through. Each helper builds its descriptor first; a construction error is
//! returned straight away and the computation never suspends on it.

use genawaiter::rc::Co;
use serde_json::Value;

use super::Resume;
use crate::effect::{Args, Effect, Event, Pattern, Settled, Target};
use crate::error::SagaError;

pub struct SagaContext {
    co: Co<Effect, Resume>,
}

impl SagaContext {
    pub(crate) fn new(co: Co<Effect, Resume>) -> Self {
        Self { co }
    }

    /// Yield an already built descriptor and wait for its result.
    pub async fn perform(&self, effect: Effect) -> Settled {
        self.co.yield_(effect).await
    }

    /// Dispatch an event. Resolves to the dispatched event.
    pub async fn put(&self, event: Event) -> Result<Event, SagaError> {
        let effect = Effect::dispatch(event.clone())?;
        self.perform(effect).await?;
        Ok(event)
    }

    /// Invoke a function or run a factory behind an opaque boundary.
    pub async fn call(&self, target: &Target, args: Args) -> Settled {
        let effect = Effect::invoke(target, args)?;
        self.perform(effect).await
    }

    /// Run a factory inline, as if its yields were this computation's own.
    pub async fn delegate(&self, target: &Target, args: Args) -> Settled {
        let effect = Effect::delegate(target, args)?;
        self.perform(effect).await
    }

    /// Spawn `target` for every future event matching `pattern`.
    pub async fn watch_every(
        &self,
        pattern: impl Into<Pattern>,
        target: &Target,
        args: Args,
    ) -> Result<(), SagaError> {
        let effect = Effect::watch_every(pattern, target, args)?;
        self.perform(effect).await.map(|_: Value| ())
    }
}
