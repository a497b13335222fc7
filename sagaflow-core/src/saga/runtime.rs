//! Saga Runtime
//!
//! The runtime is the state every driver of one scheduler shares: the store,
//! the watch manager, the count of live tasks and the queue of tasks that
//! suspended on a pending result. It is reached through `Rc<Runtime>`;
//! everything runs on one thread, so interior mutability is plain
//! `Cell`/`RefCell`.
//!
//! # How a task runs
//!
//! 1. `start` creates a driver and polls it once, right away, with a no-op
//!    waker. Synchronous work (and every synchronous watcher it triggers)
//!    completes inside that call.
//!
//! 2. A driver that returns `Pending` is parked. The scheduler moves parked
//!    drivers onto its `LocalSet`, where they are polled again with a real
//!    waker and resume once their pending result settles.
//!
//! 3. `finish` records the outcome on the task's handle. An error that
//!    escaped the task is logged and kept in the failure log; it touches
//!    nothing else.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures_util::task::noop_waker_ref;
use tokio::sync::Notify;

use super::driver::Driver;
use super::task::{TaskFailure, TaskHandle, TaskId, TaskOrigin};
use super::watch::WatchManager;
use super::Computation;
use crate::config::SchedulerConfig;
use crate::effect::{Args, Event, Pattern, Settled, Target};
use crate::store::Store;

/// A task that suspended on its first poll and waits to be moved onto the
/// scheduler's executor.
pub(crate) struct ParkedTask {
    pub(crate) driver: Driver,
    pub(crate) handle: TaskHandle,
}

pub(crate) struct Runtime {
    config: SchedulerConfig,
    store: Rc<dyn Store>,
    watches: RefCell<WatchManager>,
    live: Cell<usize>,
    started: Cell<u64>,
    parked: RefCell<VecDeque<ParkedTask>>,
    failures: RefCell<VecDeque<TaskFailure>>,
    wake: Notify,
}

impl Runtime {
    pub(crate) fn new(store: Rc<dyn Store>, config: SchedulerConfig) -> Rc<Self> {
        Rc::new(Self {
            config,
            store,
            watches: RefCell::new(WatchManager::new()),
            live: Cell::new(0),
            started: Cell::new(0),
            parked: RefCell::new(VecDeque::new()),
            failures: RefCell::new(VecDeque::new()),
            wake: Notify::new(),
        })
    }

    pub(crate) fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> &Rc<dyn Store> {
        &self.store
    }

    /// Start a root or spawned task and drive it until it finishes or
    /// first suspends.
    ///
    /// `root` is the chain the task belongs to: `None` makes the task its
    /// own root.
    pub(crate) fn start(
        self: &Rc<Self>,
        computation: Box<dyn Computation>,
        origin: TaskOrigin,
        root: Option<TaskId>,
    ) -> TaskHandle {
        let id = TaskId::new();
        let root = root.unwrap_or(id);
        let handle = TaskHandle::new(id, origin);

        self.live.set(self.live.get() + 1);
        self.started.set(self.started.get() + 1);
        tracing::debug!(task = %id, %root, ?origin, "task started");

        let mut driver = Driver::new(id, root, 0, computation, Rc::clone(self));
        let mut cx = Context::from_waker(noop_waker_ref());
        match Pin::new(&mut driver).poll(&mut cx) {
            Poll::Ready(settled) => self.finish(&handle, settled),
            Poll::Pending => {
                tracing::trace!(task = %id, "task parked");
                self.parked.borrow_mut().push_back(ParkedTask {
                    driver,
                    handle: handle.clone(),
                });
                self.wake.notify_one();
            }
        }
        handle
    }

    pub(crate) fn finish(&self, handle: &TaskHandle, settled: Settled) {
        self.live.set(self.live.get().saturating_sub(1));

        match &settled {
            Ok(_) => tracing::debug!(task = %handle.id(), "task finished"),
            Err(error) => {
                tracing::warn!(
                    task = %handle.id(),
                    origin = ?handle.origin(),
                    %error,
                    "task failed"
                );
                self.record_failure(TaskFailure {
                    task: handle.id(),
                    origin: handle.origin(),
                    error: error.clone(),
                });
            }
        }
        handle.complete(settled);

        if self.live.get() == 0 {
            self.wake.notify_one();
        }
    }

    fn record_failure(&self, failure: TaskFailure) {
        let capacity = self.config.failure_log_capacity;
        if capacity == 0 {
            return;
        }
        let mut failures = self.failures.borrow_mut();
        while failures.len() >= capacity {
            failures.pop_front();
        }
        failures.push_back(failure);
    }

    /// Record `event` in the store and launch every watcher it matches.
    ///
    /// Watchers are driven eagerly, in registration order, before this
    /// returns; any that suspend are parked.
    pub(crate) fn dispatch(self: &Rc<Self>, event: Event) {
        self.store.dispatch(&event);

        let spawns = self.watches.borrow().notify(&event);
        for spawn in spawns {
            tracing::debug!(
                watch = %spawn.watch,
                kind = event.kind(),
                callee = spawn.target.name(),
                "watch matched"
            );
            let origin = TaskOrigin::Watch(spawn.watch);
            let owner = spawn.owner;
            self.start(spawn.into_computation(), origin, Some(owner));
        }
    }

    pub(crate) fn register_watch(
        &self,
        pattern: Pattern,
        target: Target,
        args: Args,
        owner: TaskId,
    ) {
        self.watches.borrow_mut().register(pattern, target, args, owner);
    }

    pub(crate) fn watches(&self) -> &RefCell<WatchManager> {
        &self.watches
    }

    pub(crate) fn take_parked(&self) -> Option<ParkedTask> {
        self.parked.borrow_mut().pop_front()
    }

    /// Resolves when a task parks or the last live task finishes.
    pub(crate) async fn changed(&self) {
        self.wake.notified().await;
    }

    pub(crate) fn live(&self) -> usize {
        self.live.get()
    }

    pub(crate) fn started(&self) -> u64 {
        self.started.get()
    }

    pub(crate) fn failures(&self) -> Vec<TaskFailure> {
        self.failures.borrow().iter().cloned().collect()
    }

    /// Drop watches and parked tasks. Parked drivers hold an `Rc` back to
    /// the runtime, so this also breaks that cycle.
    pub(crate) fn teardown(&self) {
        let parked = std::mem::take(&mut *self.parked.borrow_mut());
        self.watches.borrow_mut().clear();
        tracing::info!(
            scheduler = %self.config.name,
            live = self.live.get(),
            dropped = parked.len(),
            "scheduler torn down"
        );
        drop(parked);
    }
}
