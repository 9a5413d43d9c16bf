//! Subscriber types for the reactive system.
//!
//! A Subscriber is any computation that depends on reactive values and can
//! be re-run when one of them changes. Effects are the only subscribers the
//! crate creates itself, but the dependency store only needs the two
//! capabilities captured by the [`Subscriber`] trait: an identity for
//! set-membership and a way to run.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a subscriber.
///
/// Identity is by reference, not by body: two effects built from identical
/// closures get distinct IDs and are distinct subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

impl EffectId {
    /// Generate a new unique effect ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect#{}", self.0)
    }
}

/// A computation that can be notified when its dependencies change.
///
/// The dependency store holds subscribers weakly and calls [`run`] on every
/// live subscriber of a triggered key.
///
/// [`run`]: Subscriber::run
pub trait Subscriber: Send + Sync {
    /// The identity used to deduplicate subscriptions.
    fn id(&self) -> EffectId;

    /// Re-run the computation.
    fn run(&self);
}
