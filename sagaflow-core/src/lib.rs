//! Sagaflow Core
//!
//! An effect-interpreting coroutine scheduler. Computations ("sagas") yield
//! inert effect descriptors instead of performing side effects themselves;
//! the scheduler interprets each descriptor and resumes the computation
//! with the result. It implements:
//!
//! - Effect descriptors: dispatch, invoke, invoke-and-delegate, watch-every
//! - Coroutine drivers with transparent delegation and error injection
//! - A watch manager spawning a fresh computation per matching event
//! - A single-threaded cooperative scheduler bridged to a host store
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `effect`: Events, patterns, targets and the `Effect` descriptor
//! - `saga`: Computations, drivers, the interpreter, watches and the scheduler
//! - `store`: The host store contract and an in-memory recording store
//! - `config` / `error`: Scheduler settings and error types
//!
//! # Example
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use sagaflow_core::{args, Event, RecordingStore, Scheduler, Target};
//!
//! let store = Rc::new(RecordingStore::default());
//! let scheduler = Scheduler::new(store.clone());
//!
//! let saga = Target::saga("fruit", |cx, _| async move {
//!     cx.put(Event::with_payload("FRUIT", "apple")).await?;
//!     cx.put(Event::with_payload("FRUIT", "orange")).await?;
//!     Ok(serde_json::Value::Null)
//! });
//!
//! scheduler.run(&saga, args![]);
//! assert_eq!(store.kinds(), vec!["FRUIT", "FRUIT"]);
//! ```

pub mod config;
pub mod effect;
pub mod error;
pub mod saga;
pub mod store;

pub use config::{ConfigError, SchedulerConfig};
pub use effect::{Args, Effect, Event, Outcome, Pattern, Settled, Target};
pub use error::SagaError;
pub use saga::{Computation, SagaContext, Scheduler, Step, TaskHandle};
pub use store::{RecordingStore, Store};

#[doc(hidden)]
pub mod __private {
    pub use serde_json::json;
}
