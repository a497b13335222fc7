//! Invocation Targets
//!
//! A target is what `Invoke`, `InvokeDelegate` and `WatchEvery` point at. It
//! comes in two shapes:
//!
//! - an ordinary function, which returns either a settled value or a pending
//!   asynchronous result ([`Outcome`]);
//! - a computation factory, which produces a fresh [`Computation`] for every
//!   invocation.
//!
//! Targets are cheap to clone (an `Rc` under the hood) and compare by
//! identity, so a test can assert that a saga yielded "a call to *this*
//! function" without running it.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use serde_json::Value;

use super::{Args, Effect};
use crate::error::SagaError;
use crate::saga::{Computation, EffectSequence, GeneratorSaga, SagaContext, SingleInvoke};

/// A settled result: the value a computation resumes with, or the error
/// injected into it.
pub type Settled = Result<Value, SagaError>;

/// What an ordinary function returns when invoked.
pub enum Outcome {
    /// The function finished synchronously.
    Ready(Settled),
    /// The function started asynchronous work; the caller resumes once it
    /// settles.
    Pending(LocalBoxFuture<'static, Settled>),
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(settled) => f.debug_tuple("Ready").field(settled).finish(),
            Self::Pending(_) => f.write_str("Pending"),
        }
    }
}

type FunctionBody = dyn Fn(Args) -> Outcome;
type FactoryBody = dyn Fn(Args) -> Box<dyn Computation>;

#[derive(Clone)]
pub(crate) enum TargetBody {
    Function(Rc<FunctionBody>),
    Factory(Rc<FactoryBody>),
}

/// A named reference to an ordinary function or a computation factory.
#[derive(Clone)]
pub struct Target {
    name: Rc<str>,
    arity: Option<usize>,
    body: TargetBody,
}

impl Target {
    /// An ordinary synchronous function.
    pub fn function<F>(name: &str, f: F) -> Self
    where
        F: Fn(Args) -> Settled + 'static,
    {
        Self::outcome(name, move |args| Outcome::Ready(f(args)))
    }

    /// An ordinary function returning a pending asynchronous result.
    pub fn future<F, Fut>(name: &str, f: F) -> Self
    where
        F: Fn(Args) -> Fut + 'static,
        Fut: Future<Output = Settled> + 'static,
    {
        Self::outcome(name, move |args| Outcome::Pending(Box::pin(f(args))))
    }

    /// An ordinary function that decides per call whether it settles now.
    pub fn outcome<F>(name: &str, f: F) -> Self
    where
        F: Fn(Args) -> Outcome + 'static,
    {
        Self::from_body(name, TargetBody::Function(Rc::new(f)))
    }

    /// A generator-style computation factory.
    ///
    /// The body receives a [`SagaContext`] to yield effects through and the
    /// invocation arguments.
    ///
    /// ```rust,ignore
    /// let saga = Target::saga("dispatch_fruit", |cx, args| async move {
    ///     cx.put(Event::with_payload("FRUIT_ADDED", args[0].clone())).await?;
    ///     Ok(Value::Null)
    /// });
    /// ```
    pub fn saga<F, Fut>(name: &str, f: F) -> Self
    where
        F: Fn(SagaContext, Args) -> Fut + 'static,
        Fut: Future<Output = Settled> + 'static,
    {
        let body = Rc::new(f);
        Self::factory(name, move |args| {
            let body = Rc::clone(&body);
            GeneratorSaga::new(move |cx| body(cx, args))
        })
    }

    /// A factory producing a hand-written computation.
    pub fn factory<F, C>(name: &str, f: F) -> Self
    where
        F: Fn(Args) -> C + 'static,
        C: Computation + 'static,
    {
        Self::from_body(
            name,
            TargetBody::Factory(Rc::new(move |args| Box::new(f(args)) as Box<dyn Computation>)),
        )
    }

    /// A factory whose computations yield `effects` in order.
    pub fn sequence(name: &str, effects: Vec<Effect>) -> Self {
        Self::factory(name, move |_| EffectSequence::new(effects.clone()))
    }

    fn from_body(name: &str, body: TargetBody) -> Self {
        Self {
            name: Rc::from(name),
            arity: None,
            body,
        }
    }

    /// Declare the exact number of arguments this target takes.
    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = Some(arity);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    /// Whether this target produces computations rather than values.
    pub fn is_factory(&self) -> bool {
        matches!(self.body, TargetBody::Factory(_))
    }

    pub(crate) fn body(&self) -> &TargetBody {
        &self.body
    }

    /// Fail unless `got` arguments satisfy the declared arity.
    pub fn check_arity(&self, got: usize) -> Result<(), SagaError> {
        match self.arity {
            Some(expected) if expected != got => Err(SagaError::Arity {
                target: self.name.to_string(),
                expected,
                got,
            }),
            _ => Ok(()),
        }
    }

    /// Whether a watcher invocation with `bound` arguments should also
    /// receive the triggering event.
    pub fn wants_event(&self, bound: usize) -> bool {
        self.arity.map_or(true, |arity| arity == bound + 1)
    }

    /// Produce a fresh computation for one invocation.
    ///
    /// Ordinary functions become a single-step computation that yields one
    /// `Invoke` of themselves and finishes with its result.
    pub fn instantiate(&self, args: Args) -> Box<dyn Computation> {
        match &self.body {
            TargetBody::Function(_) => Box::new(SingleInvoke::new(self.clone(), args)),
            TargetBody::Factory(factory) => factory(args),
        }
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        let same_body = match (&self.body, &other.body) {
            (TargetBody::Function(a), TargetBody::Function(b)) => {
                Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
            }
            (TargetBody::Factory(a), TargetBody::Factory(b)) => {
                Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
            }
            _ => false,
        };
        same_body && self.name == other.name && self.arity == other.arity
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_factory() { "factory" } else { "function" };
        write!(f, "{kind} {}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::saga::Step;

    #[test]
    fn clones_are_equal_and_distinct_targets_are_not() {
        let a = Target::function("noop", |_| Ok(Value::Null));
        let b = Target::function("noop", |_| Ok(Value::Null));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn arity_is_checked_only_when_declared() {
        let open = Target::function("open", |_| Ok(Value::Null));
        assert!(open.check_arity(7).is_ok());

        let fixed = open.with_arity(2);
        assert!(fixed.check_arity(2).is_ok());
        assert_eq!(
            fixed.check_arity(1),
            Err(SagaError::Arity {
                target: "open".into(),
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn wants_event_follows_arity() {
        let open = Target::function("open", |_| Ok(Value::Null));
        assert!(open.wants_event(0));
        assert!(open.clone().with_arity(2).wants_event(1));
        assert!(!open.with_arity(1).wants_event(1));
    }

    #[test]
    fn function_instantiates_as_single_invoke() {
        let add = Target::function("add", |_| Ok(Value::Null));
        let mut computation = add.instantiate(args!["apple"]);

        match computation.step(Ok(Value::Null)) {
            Step::Suspended(effect) => assert_eq!(
                effect,
                Effect::Invoke {
                    target: add.clone(),
                    args: args!["apple"],
                }
            ),
            Step::Done(_) => panic!("expected a suspension"),
        }
        assert!(matches!(
            computation.step(Ok(Value::from(3))),
            Step::Done(Ok(v)) if v == Value::from(3)
        ));
    }

    #[test]
    fn debug_shows_kind_and_name() {
        let saga = Target::saga("root", |_, _| async { Ok(Value::Null) });
        assert_eq!(format!("{saga:?}"), "factory root");
        assert!(saga.is_factory());
    }
}
