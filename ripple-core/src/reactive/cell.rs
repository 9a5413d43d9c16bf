//! Ref Implementation
//!
//! A Ref is a single reactive value. It is its own target in the dependency
//! store and has exactly one tracked key, [`VALUE_KEY`].
//!
//! # How Refs Work
//!
//! 1. Reading the value inside an effect subscribes the effect to
//!    `(ref, "value")`.
//!
//! 2. Writing a value that differs from the current one stores it, then
//!    triggers every subscriber. Writing an equal value does nothing.
//!
//! # Thread Safety
//!
//! The value sits behind an `RwLock`. The lock is released before
//! subscribers run, so an effect may read or write the ref it was
//! triggered by.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;

use super::store::{track, trigger, DependencyStore, TargetId};

/// The only key a [`Ref`] tracks.
pub const VALUE_KEY: &str = "value";

struct RefInner<T> {
    id: TargetId,
    value: RwLock<T>,
    equals: fn(&T, &T) -> bool,
}

impl<T> Drop for RefInner<T> {
    fn drop(&mut self) {
        DependencyStore::global().evict(self.id);
    }
}

/// A reactive cell holding a value of type `T`.
///
/// Clones share the cell: they are the same target.
///
/// # Example
///
/// ```rust,ignore
/// let count = Ref::new(0);
///
/// // Read the value (tracked inside an effect)
/// let value = count.get();
///
/// // Update the value (notifies subscribers if it changed)
/// count.set(5);
/// ```
pub struct Ref<T> {
    inner: Arc<RefInner<T>>,
}

impl<T> Ref<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new ref with the given initial value.
    pub fn new(value: T) -> Self
    where
        T: PartialEq,
    {
        Self::with_equals(value, |a, b| a == b)
    }

    /// Create a ref that uses `equals` to decide whether a write changed it.
    pub fn with_equals(value: T, equals: fn(&T, &T) -> bool) -> Self {
        Self {
            inner: Arc::new(RefInner {
                id: TargetId::new(),
                value: RwLock::new(value),
                equals,
            }),
        }
    }

    /// The ref's identity in the dependency store.
    pub fn id(&self) -> TargetId {
        self.inner.id
    }

    /// Get the current value, tracking the read.
    pub fn get(&self) -> T {
        let value = self.inner.value.read().clone();
        track(self.inner.id, VALUE_KEY);
        value
    }

    /// Pass the current value to `f`, tracking the read.
    ///
    /// `f` sees a snapshot taken before it runs; the lock is not held while
    /// it runs, so `f` may write this ref.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.get();
        f(&value)
    }

    /// Get the current value without tracking the read.
    pub fn get_untracked(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Set a new value, notifying subscribers if it changed.
    ///
    /// Returns whether the value changed.
    pub fn set(&self, value: T) -> bool {
        let changed = {
            let mut guard = self.inner.value.write();
            if (self.inner.equals)(&guard, &value) {
                false
            } else {
                *guard = value;
                true
            }
        };

        if changed {
            trigger(self.inner.id, VALUE_KEY);
        }
        changed
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> T,
    {
        let current = self.get_untracked();
        self.set(f(&current))
    }

    /// Get the number of subscribers, including stale ones.
    pub fn subscriber_count(&self) -> usize {
        DependencyStore::global().subscriber_count(self.inner.id, VALUE_KEY)
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Debug> Debug for Ref<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ref")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.read())
            .finish()
    }
}

/// Create a reactive cell holding `value`.
pub fn create_ref<T>(value: T) -> Ref<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    Ref::new(value)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Effect;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn ref_get_and_set() {
        let cell = Ref::new(0);
        assert_eq!(cell.get(), 0);

        assert!(cell.set(42));
        assert_eq!(cell.get(), 42);
    }

    #[test]
    fn ref_update() {
        let cell = Ref::new(10);
        cell.update(|v| v + 5);
        assert_eq!(cell.get(), 15);
    }

    #[test]
    fn ref_notifies_only_on_change() {
        let cell = Ref::new(0);
        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();

        let reader = cell.clone();
        let _effect = Effect::new(move || {
            reader.get();
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        assert!(!cell.set(0));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        assert!(cell.set(1));
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn ref_with_tracks() {
        let cell = Ref::new(String::from("a"));
        let len = Arc::new(AtomicI32::new(0));
        let len_clone = len.clone();

        let reader = cell.clone();
        let _effect = Effect::new(move || {
            let n = reader.with(|s| s.len());
            len_clone.store(n as i32, Ordering::SeqCst);
        });

        cell.set(String::from("abc"));
        assert_eq!(len.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn ref_with_may_write_the_same_ref() {
        let cell = Ref::new(1);

        let doubled = cell.with(|v| {
            cell.set(v * 2);
            v * 2
        });

        assert_eq!(doubled, 2);
        assert_eq!(cell.get_untracked(), 2);
    }

    #[test]
    fn ref_update_may_read_the_same_ref() {
        let cell = Ref::new(3);
        let reader = cell.clone();

        assert!(cell.update(|v| v + reader.get_untracked()));
        assert_eq!(cell.get_untracked(), 6);
    }

    #[test]
    fn ref_with_custom_equality() {
        // Changes smaller than a tenth are not changes
        let cell = Ref::with_equals(1.0_f64, |a, b| (a - b).abs() < 0.1);

        assert!(!cell.set(1.05));
        assert_eq!(cell.get_untracked(), 1.0);

        assert!(cell.set(1.5));
        assert_eq!(cell.get_untracked(), 1.5);
    }

    #[test]
    fn ref_clone_shares_state() {
        let cell1 = Ref::new(0);
        let cell2 = cell1.clone();

        cell1.set(42);
        assert_eq!(cell2.get(), 42);
        assert_eq!(cell1.id(), cell2.id());
    }

    #[test]
    fn ref_ids_are_unique() {
        let r1 = create_ref(0);
        let r2 = create_ref(0);
        assert_ne!(r1.id(), r2.id());
    }

    #[test]
    fn dropping_ref_evicts_its_dependencies() {
        let cell = Ref::new(1);
        let id = cell.id();

        let reader = cell.clone();
        let effect = Effect::scoped(move || {
            reader.get();
        });
        assert_eq!(cell.subscriber_count(), 1);
        assert!(DependencyStore::global().contains_target(id));

        // The effect closure owns a handle too
        drop(effect);
        drop(cell);

        assert!(!DependencyStore::global().contains_target(id));
    }
}
