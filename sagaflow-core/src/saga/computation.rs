//! Computations
//!
//! A computation is a suspendable sequence of steps. Each call to
//! [`Computation::step`] either suspends with an effect the computation wants
//! performed, or finishes with its result. The value passed into `step` is
//! the outcome of the previously yielded effect; an `Err` is the
//! error-injection path through which interpretation failures reach the
//! computation.
//!
//! Only a driver steps a computation during a run. Outside a run, stepping
//! by hand is how a test checks which effects a computation asks for:
//!
//! ```rust,ignore
//! let mut saga = fetch_fruit.instantiate(args![]);
//! assert_eq!(
//!     saga.step(Ok(Value::Null)),
//!     Step::Suspended(Effect::invoke(&fetch, args![])?)
//! );
//! ```
//!
//! The first resume value a computation sees is `Ok(Value::Null)` and is
//! ignored by every built-in computation.

use std::fmt;
use std::future::Future;

use futures_util::future::LocalBoxFuture;
use genawaiter::rc::Gen;
use genawaiter::GeneratorState;
use serde_json::Value;

use super::SagaContext;
use crate::effect::{Args, Effect, Settled, Target};

/// Resume value fed to a computation: the previous effect's result, or the
/// error it failed with.
pub type Resume = Settled;

/// The result of advancing a computation by one step.
#[derive(Debug, PartialEq)]
pub enum Step {
    /// The computation is paused until `effect` has been interpreted.
    Suspended(Effect),
    /// The computation finished.
    Done(Settled),
}

/// A suspendable unit of logic driven by a [`Driver`](super::Driver).
pub trait Computation {
    /// Advance to the next suspension point or to completion.
    ///
    /// Must not be called again after returning [`Step::Done`].
    fn step(&mut self, resume: Resume) -> Step;
}

impl fmt::Debug for dyn Computation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<computation>")
    }
}

type GeneratorBody = LocalBoxFuture<'static, Settled>;

/// A computation written as an `async` body that yields effects through a
/// [`SagaContext`].
///
/// The body must only await futures returned by the context. Asynchronous
/// work belongs in an `Invoke` of a [`Target::future`].
///
/// # Panics
///
/// [`Computation::step`] panics (inside `genawaiter`) if the body awaits any
/// other future and that future returns `Pending`.
pub struct GeneratorSaga {
    gen: Gen<Effect, Resume, GeneratorBody>,
}

impl GeneratorSaga {
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: FnOnce(SagaContext) -> Fut,
        Fut: Future<Output = Settled> + 'static,
    {
        let gen = Gen::new(move |co| -> GeneratorBody { Box::pin(body(SagaContext::new(co))) });
        Self { gen }
    }
}

impl Computation for GeneratorSaga {
    fn step(&mut self, resume: Resume) -> Step {
        match self.gen.resume_with(resume) {
            GeneratorState::Yielded(effect) => Step::Suspended(effect),
            GeneratorState::Complete(settled) => Step::Done(settled),
        }
    }
}

/// Yields a fixed list of effects in order.
///
/// Finishes with the result of the last effect (`Null` when empty). An
/// injected error ends the sequence with that error.
#[derive(Debug)]
pub struct EffectSequence {
    effects: std::vec::IntoIter<Effect>,
    started: bool,
    last: Value,
}

impl EffectSequence {
    pub fn new(effects: Vec<Effect>) -> Self {
        Self {
            effects: effects.into_iter(),
            started: false,
            last: Value::Null,
        }
    }
}

impl Computation for EffectSequence {
    fn step(&mut self, resume: Resume) -> Step {
        if self.started {
            match resume {
                Ok(value) => self.last = value,
                Err(err) => return Step::Done(Err(err)),
            }
        }
        self.started = true;

        match self.effects.next() {
            Some(effect) => Step::Suspended(effect),
            None => Step::Done(Ok(std::mem::take(&mut self.last))),
        }
    }
}

/// The degenerate one-step computation of an ordinary function: yields a
/// single `Invoke` and finishes with its result.
#[derive(Debug)]
pub struct SingleInvoke {
    invoke: Option<Effect>,
}

impl SingleInvoke {
    pub fn new(target: Target, args: Args) -> Self {
        Self {
            invoke: Some(Effect::Invoke { target, args }),
        }
    }
}

impl Computation for SingleInvoke {
    fn step(&mut self, resume: Resume) -> Step {
        match self.invoke.take() {
            Some(effect) => Step::Suspended(effect),
            None => Step::Done(resume),
        }
    }
}

/// A hand-written state machine.
pub struct StepFn<F>(F);

/// Wrap a closure as a computation.
pub fn from_fn<F>(f: F) -> StepFn<F>
where
    F: FnMut(Resume) -> Step,
{
    StepFn(f)
}

impl<F> Computation for StepFn<F>
where
    F: FnMut(Resume) -> Step,
{
    fn step(&mut self, resume: Resume) -> Step {
        (self.0)(resume)
    }
}
