//! Scheduler
//!
//! The top-level coordinator of one running system. A `Scheduler` is an
//! ordinary value: create one per store, start root computations with
//! [`Scheduler::run`], forward host events with [`Scheduler::dispatch`], and
//! await [`Scheduler::settle`] when computations wait on asynchronous work.
//! Dropping it tears everything down.
//!
//! All drivers interleave on the current thread. Synchronous work completes
//! inside `run`/`dispatch`; drivers that suspend on a pending result are
//! moved onto the scheduler's own `tokio::task::LocalSet` and resume there.
//! Pending results that depend on tokio (timers, channels) need a tokio
//! runtime on the current thread.

use std::fmt;
use std::rc::Rc;

use tokio::task::LocalSet;

use super::runtime::{ParkedTask, Runtime};
use super::task::{TaskFailure, TaskHandle, TaskOrigin};
use crate::config::SchedulerConfig;
use crate::effect::{Args, Event, Pattern, Target};
use crate::error::SagaError;
use crate::store::Store;

pub struct Scheduler {
    runtime: Rc<Runtime>,
    local: LocalSet,
}

impl Scheduler {
    /// Create a scheduler with default settings.
    pub fn new(store: Rc<dyn Store>) -> Self {
        Self::with_config(store, SchedulerConfig::default())
    }

    pub fn with_config(store: Rc<dyn Store>, config: SchedulerConfig) -> Self {
        tracing::debug!(scheduler = %config.name, "scheduler created");
        Self {
            runtime: Runtime::new(store, config),
            local: LocalSet::new(),
        }
    }

    /// Start a root computation.
    ///
    /// The computation is driven right away; this returns once it finishes
    /// or first waits on a pending result.
    pub fn run(&self, root: &Target, args: Args) -> TaskHandle {
        self.runtime
            .start(root.instantiate(args), TaskOrigin::Root, None)
    }

    /// Forward an event that originated in the host store.
    ///
    /// The store records it and every matching watcher is launched before
    /// this returns. An event with an empty kind is rejected, as it is for
    /// a yielded `Dispatch`, and reaches neither the store nor any watcher.
    pub fn dispatch(&self, event: Event) -> Result<(), SagaError> {
        if event.kind().is_empty() {
            return Err(SagaError::EmptyKind);
        }
        tracing::debug!(kind = event.kind(), "external dispatch");
        self.runtime.dispatch(event);
        Ok(())
    }

    /// Drive suspended computations until no root or spawned computation is
    /// live.
    pub async fn settle(&self) {
        loop {
            self.launch_parked();
            if self.runtime.live() == 0 {
                break;
            }
            self.local.run_until(self.runtime.changed()).await;
        }
    }

    fn launch_parked(&self) {
        while let Some(ParkedTask { driver, handle }) = self.runtime.take_parked() {
            let runtime = Rc::clone(&self.runtime);
            self.local.spawn_local(async move {
                let settled = driver.await;
                runtime.finish(&handle, settled);
            });
        }
    }

    /// Root and spawned computations that have not finished.
    pub fn live_tasks(&self) -> usize {
        self.runtime.live()
    }

    pub fn is_idle(&self) -> bool {
        self.runtime.live() == 0
    }

    /// Total number of root and spawned computations started.
    pub fn started_tasks(&self) -> u64 {
        self.runtime.started()
    }

    /// Number of standing watch registrations.
    pub fn watch_count(&self) -> usize {
        self.runtime.watches().borrow().len()
    }

    /// Patterns currently watched, in registration order.
    pub fn watched_patterns(&self) -> Vec<Pattern> {
        self.runtime
            .watches()
            .borrow()
            .registrations()
            .map(|registration| registration.pattern.clone())
            .collect()
    }

    /// Unrecovered failures of root and spawned computations, oldest first.
    pub fn failures(&self) -> Vec<TaskFailure> {
        self.runtime.failures()
    }

    pub fn store(&self) -> &Rc<dyn Store> {
        self.runtime.store()
    }

    pub fn config(&self) -> &SchedulerConfig {
        self.runtime.config()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.runtime.teardown();
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("name", &self.runtime.config().name)
            .field("live", &self.runtime.live())
            .field("watches", &self.watch_count())
            .finish()
    }
}
