//! Effect Interpreter
//!
//! Performs the real work behind a descriptor, once per suspension:
//!
//! - `Dispatch` records the event in the store and notifies the watch
//!   manager before returning, so watchers of that event (including ones
//!   registered by the dispatching chain) have already been launched when
//!   the dispatcher resumes. The result is the event itself.
//! - `Invoke` calls an ordinary function, or runs a factory's computation in
//!   a child driver behind an opaque boundary.
//! - `InvokeDelegate` hands the new computation back to the driver.
//! - `WatchEvery` registers with the watch manager and resumes with `Null`.

use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use serde_json::Value;

use super::driver::Driver;
use super::runtime::Runtime;
use super::{Computation, TaskId};
use crate::effect::{Args, Effect, Outcome, Settled, Target, TargetBody};
use crate::error::SagaError;

/// Where an effect came from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope {
    pub(crate) task: TaskId,
    pub(crate) root: TaskId,
    pub(crate) depth: usize,
}

pub(crate) enum Interpreted {
    /// The effect finished synchronously.
    Settled(Settled),
    /// The effect's result is still pending.
    Pending(LocalBoxFuture<'static, Settled>),
    /// The driver should run this computation as a new frame.
    Delegate(Box<dyn Computation>),
}

pub(crate) fn interpret(runtime: &Rc<Runtime>, scope: Scope, effect: Effect) -> Interpreted {
    match effect {
        Effect::Dispatch { event } => {
            tracing::debug!(task = %scope.task, kind = event.kind(), "dispatch");
            let result = Value::from(event.clone());
            runtime.dispatch(event);
            Interpreted::Settled(Ok(result))
        }
        Effect::Invoke { target, args } => invoke(runtime, scope, &target, args),
        Effect::InvokeDelegate { target, args } => {
            tracing::debug!(task = %scope.task, callee = target.name(), "delegate");
            Interpreted::Delegate(target.instantiate(args))
        }
        Effect::WatchEvery {
            pattern,
            target,
            args,
        } => {
            runtime.register_watch(pattern, target, args, scope.root);
            Interpreted::Settled(Ok(Value::Null))
        }
    }
}

fn invoke(runtime: &Rc<Runtime>, scope: Scope, target: &Target, args: Args) -> Interpreted {
    tracing::debug!(task = %scope.task, callee = target.name(), args = args.len(), "invoke");

    match target.body() {
        TargetBody::Function(function) => match function(args) {
            Outcome::Ready(settled) => {
                if let Err(error) = &settled {
                    tracing::debug!(callee = target.name(), %error, "invoke failed");
                }
                Interpreted::Settled(settled)
            }
            Outcome::Pending(pending) => Interpreted::Pending(pending),
        },
        TargetBody::Factory(factory) => {
            let limit = runtime.config().max_delegation_depth;
            if scope.depth >= limit {
                return Interpreted::Settled(Err(SagaError::DepthExceeded { limit }));
            }
            let child = Driver::new(
                TaskId::new(),
                scope.root,
                scope.depth,
                factory(args),
                Rc::clone(runtime),
            );
            tracing::trace!(parent = %scope.task, child = %child.id(), "opaque invoke");
            Interpreted::Pending(Box::pin(child))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::effect::{Event, Pattern};
    use crate::store::{RecordingStore, Store};
    use crate::SchedulerConfig;

    fn setup() -> (Rc<RecordingStore>, Rc<Runtime>, Scope) {
        let store = Rc::new(RecordingStore::default());
        let runtime = Runtime::new(store.clone(), SchedulerConfig::default());
        let id = TaskId::new();
        let scope = Scope {
            task: id,
            root: id,
            depth: 1,
        };
        (store, runtime, scope)
    }

    #[test]
    fn dispatch_records_once_and_returns_event() {
        let (store, runtime, scope) = setup();
        let event = Event::with_payload("FRUIT", "apple");

        match interpret(&runtime, scope, Effect::dispatch(event.clone()).unwrap()) {
            Interpreted::Settled(Ok(value)) => assert_eq!(value, Value::from(event.clone())),
            _ => panic!("dispatch should settle immediately"),
        }
        assert_eq!(store.dispatched(), vec![event]);
    }

    #[test]
    fn synchronous_invoke_returns_value_unchanged() {
        let (_, runtime, scope) = setup();
        let concat = Target::function("concat", |args| {
            Ok(Value::from(
                args.iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(","),
            ))
        });

        match interpret(&runtime, scope, Effect::invoke(&concat, args!["a", "b"]).unwrap()) {
            Interpreted::Settled(Ok(value)) => assert_eq!(value, "a,b"),
            _ => panic!("function should settle immediately"),
        }
    }

    #[test]
    fn failing_invoke_settles_with_error() {
        let (_, runtime, scope) = setup();
        let failing = Target::function("failing", |_| Err(SagaError::raised("no fruit")));

        assert!(matches!(
            interpret(&runtime, scope, Effect::invoke(&failing, args![]).unwrap()),
            Interpreted::Settled(Err(SagaError::Raised(_)))
        ));
    }

    #[test]
    fn factory_invoke_is_opaque_and_pending() {
        let (_, runtime, scope) = setup();
        let saga = Target::sequence("seq", Vec::new());

        assert!(matches!(
            interpret(&runtime, scope, Effect::invoke(&saga, args![]).unwrap()),
            Interpreted::Pending(_)
        ));
        assert!(matches!(
            interpret(&runtime, scope, Effect::delegate(&saga, args![]).unwrap()),
            Interpreted::Delegate(_)
        ));
    }

    #[test]
    fn watch_every_registers_under_root() {
        let (_, runtime, scope) = setup();
        let handler = Target::function("handler", |_| Ok(Value::Null));

        assert!(matches!(
            interpret(
                &runtime,
                scope,
                Effect::watch_every("A", &handler, args![]).unwrap()
            ),
            Interpreted::Settled(Ok(Value::Null))
        ));
        assert_eq!(
            runtime.watches().borrow().patterns_for(scope.root),
            vec![&Pattern::from("A")]
        );
    }
}
