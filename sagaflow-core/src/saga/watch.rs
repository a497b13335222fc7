//! Watch Manager
//!
//! Keeps the standing `WatchEvery` registrations and decides which of them
//! fire for an event. It never runs user code: [`WatchManager::notify`]
//! returns one [`Spawn`] per match and the scheduler launches them, so a
//! slow watcher cannot hold up matching of later events or other
//! registrations.
//!
//! # Ordering
//!
//! Registrations are kept in registration order (`IndexMap`) and evaluated
//! in that order for every event. Once launched, spawned computations make
//! progress independently of each other.

use std::fmt;

use indexmap::IndexMap;

use super::{Computation, TaskId};
use crate::effect::{Args, Event, Pattern, Target};

/// Identifier of a registration within one watch manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(u64);

impl WatchId {
    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch#{}", self.0)
    }
}

/// A standing rule: spawn `target(args..)` for every event matching
/// `pattern`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub pattern: Pattern,
    pub target: Target,
    pub args: Args,
    /// Root task whose chain registered this watch.
    pub owner: TaskId,
}

/// A computation to launch for one matching event.
#[derive(Debug)]
pub struct Spawn {
    pub watch: WatchId,
    pub owner: TaskId,
    pub target: Target,
    pub args: Args,
}

impl Spawn {
    /// Build the fresh computation for this match.
    pub fn into_computation(self) -> Box<dyn Computation> {
        self.target.instantiate(self.args)
    }
}

/// Ordered set of watch registrations.
#[derive(Debug, Default)]
pub struct WatchManager {
    registrations: IndexMap<WatchId, Registration>,
    next_id: u64,
}

impl WatchManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registration. Registering the same pattern or target again adds
    /// an independent registration.
    pub fn register(
        &mut self,
        pattern: Pattern,
        target: Target,
        args: Args,
        owner: TaskId,
    ) -> WatchId {
        let id = WatchId(self.next_id);
        self.next_id += 1;

        tracing::debug!(watch = %id, ?pattern, callee = target.name(), %owner, "watch registered");
        self.registrations.insert(
            id,
            Registration {
                pattern,
                target,
                args,
                owner,
            },
        );
        id
    }

    /// Collect one spawn per registration matching `event`, in registration
    /// order.
    ///
    /// The triggering event is appended to the registration's arguments when
    /// the target takes it.
    pub fn notify(&self, event: &Event) -> Vec<Spawn> {
        self.registrations
            .iter()
            .filter(|(_, registration)| registration.pattern.matches(event))
            .map(|(&watch, registration)| {
                let mut args = registration.args.clone();
                if registration.target.wants_event(args.len()) {
                    args.push(event.clone().into());
                }
                Spawn {
                    watch,
                    owner: registration.owner,
                    target: registration.target.clone(),
                    args,
                }
            })
            .collect()
    }

    pub fn get(&self, id: WatchId) -> Option<&Registration> {
        self.registrations.get(&id)
    }

    /// Registrations in registration order.
    pub fn registrations(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.values()
    }

    /// Patterns registered by the chain rooted at `owner`.
    pub fn patterns_for(&self, owner: TaskId) -> Vec<&Pattern> {
        self.registrations
            .values()
            .filter(|registration| registration.owner == owner)
            .map(|registration| &registration.pattern)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Drop every registration.
    pub fn clear(&mut self) {
        self.registrations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use serde_json::{json, Value};

    fn handler(name: &str) -> Target {
        Target::function(name, |_| Ok(Value::Null))
    }

    #[test]
    fn notify_matches_in_registration_order() {
        let mut watches = WatchManager::new();
        let owner = TaskId::new();
        let first = watches.register("A".into(), handler("first"), args![], owner);
        let _other = watches.register("B".into(), handler("other"), args![], owner);
        let second = watches.register(Pattern::Any, handler("second"), args![], owner);

        let spawns = watches.notify(&Event::new("A"));
        let ids: Vec<_> = spawns.iter().map(|spawn| spawn.watch).collect();
        assert_eq!(ids, vec![first, second]);
        assert_eq!(spawns[0].target.name(), "first");
    }

    #[test]
    fn each_notify_yields_fresh_spawns() {
        let mut watches = WatchManager::new();
        watches.register("A".into(), handler("h"), args![], TaskId::new());

        assert_eq!(watches.notify(&Event::new("A")).len(), 1);
        assert_eq!(watches.notify(&Event::new("A")).len(), 1);
        assert!(watches.notify(&Event::new("Z")).is_empty());
    }

    #[test]
    fn event_is_appended_when_target_takes_it() {
        let mut watches = WatchManager::new();
        let owner = TaskId::new();
        watches.register("A".into(), handler("variadic"), args![1], owner);
        watches.register("A".into(), handler("exact").with_arity(1), args![1], owner);
        watches.register("A".into(), handler("trailing").with_arity(2), args![1], owner);

        let spawns = watches.notify(&Event::with_payload("A", "x"));
        let event = json!({ "type": "A", "payload": "x" });
        assert_eq!(spawns[0].args, args![1, event.clone()]);
        assert_eq!(spawns[1].args, args![1]);
        assert_eq!(spawns[2].args, args![1, event]);
    }

    #[test]
    fn patterns_are_tracked_per_owner() {
        let mut watches = WatchManager::new();
        let a = TaskId::new();
        let b = TaskId::new();
        watches.register("A".into(), handler("h"), args![], a);
        watches.register("B".into(), handler("h"), args![], b);

        assert_eq!(watches.patterns_for(a), vec![&Pattern::from("A")]);
        assert_eq!(watches.len(), 2);

        watches.clear();
        assert!(watches.is_empty());
    }
}
