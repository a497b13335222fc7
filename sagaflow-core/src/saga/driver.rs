//! Coroutine Driver
//!
//! A driver advances one computation step by step. It does not interpret
//! effects itself: each yielded effect goes to the interpreter, and the
//! interpreted result (or error) comes back in as the next resume value.
//!
//! # Delegation
//!
//! `InvokeDelegate` is the one effect handled at this layer. The driver keeps
//! a stack of frames; a delegated computation is pushed on top and stepped by
//! the same loop, so its yields are interpreted exactly as if the parent had
//! yielded them. When the top frame finishes, it is popped and the parent
//! resumes with its value or error. An error no frame handles ends the
//! driver.
//!
//! # Suspension
//!
//! The driver is a `Future`. It returns `Pending` only while waiting on a
//! pending result from an `Invoke` (including an opaque child driver that is
//! itself waiting); everything else runs inside a single `poll`.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures_util::future::LocalBoxFuture;
use serde_json::Value;
use smallvec::{smallvec, SmallVec};

use super::interpreter::{self, Interpreted, Scope};
use super::runtime::Runtime;
use super::{Computation, Resume, Step, TaskId};
use crate::effect::Settled;
use crate::error::SagaError;

enum Slot {
    /// Ready to step the top frame with this value.
    Resume(Resume),
    /// Waiting for an interpreted effect to settle.
    Waiting(LocalBoxFuture<'static, Settled>),
    /// The last frame finished.
    Finished,
}

/// Drives one computation (plus any computations it delegates to) to
/// completion.
pub struct Driver {
    id: TaskId,
    root: TaskId,
    /// Nesting inherited from opaque parents.
    depth: usize,
    frames: SmallVec<[Box<dyn Computation>; 2]>,
    slot: Slot,
    runtime: Rc<Runtime>,
}

impl Driver {
    pub(crate) fn new(
        id: TaskId,
        root: TaskId,
        depth: usize,
        computation: Box<dyn Computation>,
        runtime: Rc<Runtime>,
    ) -> Self {
        Self {
            id,
            root,
            depth,
            frames: smallvec![computation],
            slot: Slot::Resume(Ok(Value::Null)),
            runtime,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Opaque parents plus live delegation frames.
    pub fn nesting(&self) -> usize {
        self.depth + self.frames.len()
    }

    fn scope(&self) -> Scope {
        Scope {
            task: self.id,
            root: self.root,
            depth: self.nesting(),
        }
    }

    fn push_frame(&mut self, computation: Box<dyn Computation>) -> Slot {
        let limit = self.runtime.config().max_delegation_depth;
        if self.nesting() >= limit {
            tracing::debug!(limit, "delegation refused");
            return Slot::Resume(Err(SagaError::DepthExceeded { limit }));
        }
        self.frames.push(computation);
        tracing::trace!(frames = self.frames.len(), "delegated");
        Slot::Resume(Ok(Value::Null))
    }
}

impl Future for Driver {
    type Output = Settled;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Settled> {
        let this = self.get_mut();
        let span = tracing::debug_span!("saga", task = %this.id);
        let _enter = span.enter();

        loop {
            let resume = match std::mem::replace(&mut this.slot, Slot::Finished) {
                Slot::Resume(resume) => resume,
                Slot::Waiting(mut pending) => match pending.as_mut().poll(cx) {
                    Poll::Ready(settled) => settled,
                    Poll::Pending => {
                        this.slot = Slot::Waiting(pending);
                        return Poll::Pending;
                    }
                },
                Slot::Finished => return Poll::Ready(Err(SagaError::Exhausted)),
            };

            let Some(frame) = this.frames.last_mut() else {
                return Poll::Ready(Err(SagaError::Exhausted));
            };

            match frame.step(resume) {
                Step::Suspended(effect) => {
                    tracing::trace!(effect = effect.label(), "suspended");
                    this.slot = match interpreter::interpret(&this.runtime, this.scope(), effect) {
                        Interpreted::Settled(settled) => Slot::Resume(settled),
                        Interpreted::Pending(pending) => Slot::Waiting(pending),
                        Interpreted::Delegate(computation) => this.push_frame(computation),
                    };
                }
                Step::Done(settled) => {
                    this.frames.pop();
                    if this.frames.is_empty() {
                        return Poll::Ready(settled);
                    }
                    this.slot = Slot::Resume(settled);
                }
            }
        }
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("frames", &self.frames.len())
            .field("waiting", &matches!(self.slot, Slot::Waiting(_)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::effect::{Effect, Event, Target};
    use crate::saga::{from_fn, EffectSequence};
    use crate::store::{RecordingStore, Store};
    use crate::SchedulerConfig;
    use futures_util::task::noop_waker_ref;

    fn runtime(store: &Rc<RecordingStore>, config: SchedulerConfig) -> Rc<Runtime> {
        Runtime::new(store.clone(), config)
    }

    fn poll_once(driver: &mut Driver) -> Poll<Settled> {
        let mut cx = Context::from_waker(noop_waker_ref());
        Pin::new(driver).poll(&mut cx)
    }

    fn put(payload: &str) -> Effect {
        Effect::dispatch(Event::with_payload("FRUIT", payload)).unwrap()
    }

    #[test]
    fn synchronous_computation_finishes_in_one_poll() {
        let store = Rc::new(RecordingStore::default());
        let id = TaskId::new();
        let mut driver = Driver::new(
            id,
            id,
            0,
            Box::new(EffectSequence::new(vec![put("apple"), put("kiwi")])),
            runtime(&store, SchedulerConfig::default()),
        );

        assert!(matches!(poll_once(&mut driver), Poll::Ready(Ok(_))));
        assert_eq!(store.kinds(), vec!["FRUIT", "FRUIT"]);
        assert!(matches!(
            poll_once(&mut driver),
            Poll::Ready(Err(SagaError::Exhausted))
        ));
    }

    #[test]
    fn delegated_frames_share_the_event_log() {
        let store = Rc::new(RecordingStore::default());
        let inner = Target::sequence("inner", vec![put("apple"), put("kiwi")]);
        let outer = EffectSequence::new(vec![
            put("banana"),
            Effect::delegate(&inner, args![]).unwrap(),
            put("mango"),
        ]);
        let id = TaskId::new();
        let mut driver = Driver::new(
            id,
            id,
            0,
            Box::new(outer),
            runtime(&store, SchedulerConfig::default()),
        );

        assert!(matches!(poll_once(&mut driver), Poll::Ready(Ok(_))));
        let payloads: Vec<_> = store
            .dispatched()
            .iter()
            .map(|event| event.get("payload").cloned().unwrap_or_default())
            .collect();
        assert_eq!(payloads, vec!["banana", "apple", "kiwi", "mango"]);
    }

    #[test]
    fn delegation_past_the_limit_is_injected() {
        let store = Rc::new(RecordingStore::default());
        let config = SchedulerConfig {
            max_delegation_depth: 1,
            ..SchedulerConfig::default()
        };
        let inner = Target::sequence("inner", vec![put("apple")]);
        let delegate = Effect::delegate(&inner, args![]).unwrap();
        let mut asked = false;
        let computation = from_fn(move |resume| {
            if !asked {
                asked = true;
                Step::Suspended(delegate.clone())
            } else {
                Step::Done(resume)
            }
        });
        let id = TaskId::new();
        let mut driver = Driver::new(id, id, 0, Box::new(computation), runtime(&store, config));

        assert!(matches!(
            poll_once(&mut driver),
            Poll::Ready(Err(SagaError::DepthExceeded { limit: 1 }))
        ));
        assert!(store.dispatched().is_empty());
    }
}
