//! Computed Implementation
//!
//! A Computed is a derived value: a [`Ref`] whose contents are written by an
//! internal [`Effect`] that runs a getter.
//!
//! # How Computeds Work
//!
//! 1. On creation, the effect runs the getter once and stores the result.
//!    The getter's reads subscribe the effect to its upstream sources.
//!
//! 2. When an upstream source changes, the effect re-runs the getter and
//!    writes the new result into the ref.
//!
//! 3. If the result differs from the cached one, that write triggers the
//!    computed's own subscribers.
//!
//! Propagation therefore takes two hops (upstream write -> getter re-run ->
//! computed write -> dependents re-run), and it all happens at write time.
//! Reading a computed never recomputes it; it only returns the cache.
//!
//! Dependents subscribe to the computed's ref, not to its upstream sources.
//! A getter that reads nothing reactive is evaluated once and never again.

use std::fmt::Debug;

use super::cell::Ref;
use super::effect::Effect;
use super::store::TargetId;

/// An eagerly maintained derived value.
///
/// # Type Parameters
///
/// - `T`: The type of the computed value. The `PartialEq` bound lets a
///   recomputation that yields the same value skip notifying dependents.
pub struct Computed<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// The cached result. `None` until the first evaluation completes.
    value: Ref<Option<T>>,

    /// Recomputes `value`. Owned here so the computed lives as long as it does.
    effect: Effect,
}

impl<T> Computed<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a computed value, evaluating `getter` immediately.
    pub fn new<F>(getter: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let value = Ref::new(None);

        let cache = value.clone();
        let effect = Effect::scoped(move || {
            cache.set(Some(getter()));
        });

        Self { value, effect }
    }

    /// Get the cached value, tracking the read.
    ///
    /// # Panics
    ///
    /// Panics if called before the first evaluation has completed, which can
    /// only happen from inside the getter's own first run.
    pub fn get(&self) -> T {
        self.try_get()
            .expect("computed read before its first evaluation completed")
    }

    /// Get the cached value, tracking the read. `None` before the first
    /// evaluation has completed.
    pub fn try_get(&self) -> Option<T> {
        self.value.get()
    }

    /// Get the cached value without tracking the read.
    pub fn get_untracked(&self) -> Option<T> {
        self.value.get_untracked()
    }

    /// The computed's identity in the dependency store.
    pub fn target_id(&self) -> TargetId {
        self.value.id()
    }

    /// The effect that keeps this value current.
    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    /// Get the number of dependents.
    pub fn dependent_count(&self) -> usize {
        self.value.subscriber_count()
    }
}

impl<T> Clone for Computed<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            effect: self.effect.clone(),
        }
    }
}

impl<T> Debug for Computed<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.target_id())
            .field("value", &self.get_untracked())
            .field("evaluations", &self.effect.run_count())
            .field("dependent_count", &self.dependent_count())
            .finish()
    }
}

/// Derive a value from reactive sources, kept current at write time.
pub fn computed<T, F>(getter: F) -> Computed<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Computed::new(getter)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    #[test]
    fn computed_evaluates_on_creation() {
        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();

        let value = Computed::new(move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
            42
        });

        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert_eq!(value.get_untracked(), Some(42));
    }

    #[test]
    fn computed_reads_do_not_recompute() {
        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();

        let value = Computed::new(move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
            42
        });

        assert_eq!(value.get(), 42);
        assert_eq!(value.get(), 42);
        assert_eq!(value.get(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn computed_recomputes_when_source_changes() {
        let source = Ref::new(3);

        let reader = source.clone();
        let doubled = computed(move || reader.get() * 2);
        assert_eq!(doubled.get(), 6);

        source.set(5);

        // Already current before anyone reads it
        assert_eq!(doubled.get_untracked(), Some(10));
        assert_eq!(doubled.effect().run_count(), 2);
    }

    #[test]
    fn computed_without_sources_never_updates() {
        let value = computed(|| 7);

        assert_eq!(value.get(), 7);
        assert_eq!(value.effect().dependency_count(), 0);
        assert_eq!(value.effect().run_count(), 1);
        assert_eq!(value.dependent_count(), 0);
    }

    #[test]
    fn unchanged_result_does_not_notify_dependents() {
        let source = Ref::new(4);
        let reader = source.clone();
        let is_even = computed(move || reader.get() % 2 == 0);

        let dependent_runs = Arc::new(AtomicI32::new(0));
        let runs_clone = dependent_runs.clone();
        let parity = is_even.clone();
        let _effect = Effect::new(move || {
            parity.get();
            runs_clone.fetch_add(1, Ordering::SeqCst);
        });

        source.set(6);
        assert_eq!(is_even.effect().run_count(), 2);
        assert_eq!(dependent_runs.load(Ordering::SeqCst), 1);

        source.set(7);
        assert_eq!(dependent_runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn computed_clone_shares_state() {
        let source = Ref::new(1);
        let reader = source.clone();
        let value1 = computed(move || reader.get() + 1);
        let value2 = value1.clone();

        assert_eq!(value1.target_id(), value2.target_id());

        source.set(10);
        assert_eq!(value2.get(), 11);
    }
}
