//! Effect Descriptors
//!
//! This module holds the inert data a computation yields: events, watch
//! patterns, invocation targets and the [`Effect`] enum tying them
//! together. Nothing here performs work; see [`crate::saga`] for the
//! runtime that interprets these values.

mod descriptor;
mod event;
mod pattern;
mod target;

pub use descriptor::Effect;
pub use event::Event;
pub use pattern::{Pattern, WILDCARD};
pub use target::{Outcome, Settled, Target};
pub(crate) use target::TargetBody;

use serde_json::Value;
use smallvec::SmallVec;

/// Ordered arguments of an invocation.
pub type Args = SmallVec<[Value; 4]>;

/// Build [`Args`] from expressions, each converted with `serde_json::json!`.
///
/// ```rust,ignore
/// let args = args!["apple", 2, basket.clone()];
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::effect::Args::new()
    };
    ($($arg:expr),+ $(,)?) => {
        $crate::effect::Args::from_vec(vec![$($crate::__private::json!($arg)),+])
    };
}
