//! Ripple Core
//!
//! A minimal dependency-tracking reactivity runtime. Plain data and derived
//! computations are written as ordinary reads and writes; the runtime
//! records which computation read which piece of state and re-runs exactly
//! the affected computations when that state changes.
//!
//! It provides:
//!
//! - A dependency store mapping `(target, key)` to subscribed effects
//! - A per-thread tracking context with stack discipline for nested effects
//! - Reactive objects, refs and computed values built on `track`/`trigger`
//!
//! # Architecture
//!
//! - `reactive`: dependency tracking and the reactive primitives
//! - `value`: the host data model wrapped by reactive objects
//! - `error`: the crate error type
//!
//! # Example
//!
//! ```rust,ignore
//! use ripple_core::{computed, effect, reactive};
//!
//! let product = reactive([("price", 5), ("quantity", 2)]);
//!
//! let p = product.clone();
//! let sale_price = computed(move || p.get("price").as_f64().unwrap_or(0.0) * 0.9);
//!
//! let p = product.clone();
//! let sale = sale_price.clone();
//! let total = computed(move || sale.get() * p.get("quantity").as_f64().unwrap_or(0.0));
//!
//! let t = total.clone();
//! effect(move || println!("total = {}", t.get()));
//! // prints "total = 9"
//!
//! product.set("price", 10)?;
//! // prints "total = 18"
//! ```

pub mod error;
pub mod reactive;
pub mod value;

pub use error::{Error, ReactiveError, Result};
pub use reactive::{
    computed, create_ref, effect, reactive, reactive_with, track, trigger, Computed, Effect,
    Reactive, Ref,
};
pub use value::{ChangeDetection, Record, Value};
