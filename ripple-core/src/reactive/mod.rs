//! Reactive Primitives
//!
//! This module implements the dependency-tracking core: the dependency
//! store, the tracking context, effects, and the three kinds of reactive
//! state built on them (reactive objects, refs and computed values).
//!
//! # Concepts
//!
//! ## Tracking
//!
//! Every reactive read calls [`track`] with the read's target and key. If an
//! effect is running on the current thread, the store records that the
//! effect depends on that `(target, key)`. Reads outside any effect record
//! nothing.
//!
//! ## Triggering
//!
//! Every successful write that changes a value calls [`trigger`], which runs
//! each effect recorded for that `(target, key)` immediately, one after the
//! other, on the writer's call stack. A write returns only once every effect
//! it triggered (transitively) has finished.
//!
//! ## Effects
//!
//! An [`Effect`] runs once when created and again whenever something it read
//! changes.
//!
//! ## Reactive objects, refs and computeds
//!
//! A [`Reactive`] wraps a key-value [`Record`](crate::Record) and tracks
//! each key. A [`Ref`] is a single value tracked under the key `"value"`. A
//! [`Computed`] is a ref kept current by an effect that re-runs a getter.
//!
//! # Limitations
//!
//! - No batching: two writes run dependents twice.
//! - No cleanup: an effect stays subscribed to keys it no longer reads.
//! - No cycle detection: an effect whose writes keep re-triggering itself
//!   recurses without bound.

mod cell;
mod computed;
mod context;
mod effect;
mod proxy;
mod store;
mod subscriber;

pub use cell::{create_ref, Ref, VALUE_KEY};
pub use computed::{computed, Computed};
pub use context::ReactiveContext;
pub use effect::{effect, Effect};
pub use proxy::{reactive, reactive_with, Reactive};
pub use store::{track, trigger, Dependency, DependencyStore, TargetId};
pub use subscriber::{EffectId, Subscriber};
