//! Saga Runtime
//!
//! This module drives computations and interprets the effects they yield.
//!
//! # Concepts
//!
//! ## Computations
//!
//! A [`Computation`] is a suspendable sequence of steps. Every step either
//! suspends with an [`Effect`](crate::effect::Effect) or finishes with a
//! value. Generator-style sagas ([`GeneratorSaga`]) are the usual way to
//! write one; [`EffectSequence`] and [`from_fn`] cover fixed lists and
//! hand-written state machines.
//!
//! ## Drivers
//!
//! A [`Driver`] owns exactly one computation and feeds it the result of each
//! effect it yielded. Delegated computations run as extra frames of the same
//! driver; opaque invocations of a factory get a child driver of their own.
//!
//! ## Watches
//!
//! `WatchEvery` effects add standing registrations to the [`WatchManager`].
//! Every dispatched event is matched against them and each match launches a
//! fresh computation.
//!
//! ## Scheduler
//!
//! The [`Scheduler`] owns the shared runtime state and is the entry point:
//! `run` a root computation, `dispatch` host events, `settle` pending work.
//!
//! # Scheduling model
//!
//! Single-threaded and cooperative. A computation gives up control only by
//! yielding an effect, and only an `Invoke` whose target returns a pending
//! result makes its driver actually wait. Effects of one computation are
//! interpreted in yield order, and a dispatched event reaches the store and
//! the watch manager before the dispatching computation resumes.

mod computation;
mod context;
mod driver;
mod interpreter;
mod runtime;
mod scheduler;
mod task;
mod watch;

pub use computation::{
    from_fn, Computation, EffectSequence, GeneratorSaga, Resume, SingleInvoke, Step, StepFn,
};
pub use context::SagaContext;
pub use driver::Driver;
pub use scheduler::Scheduler;
pub use task::{TaskFailure, TaskHandle, TaskId, TaskOrigin};
pub use watch::{Registration, Spawn, WatchId, WatchManager};
