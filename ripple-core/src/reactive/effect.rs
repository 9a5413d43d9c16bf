//! Effect Implementation
//!
//! An Effect is a computation that re-runs whenever a reactive value it read
//! changes.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs immediately, inside a reactive context,
//!    so every reactive read it performs subscribes it.
//!
//! 2. When a write triggers one of those subscriptions, the effect is run
//!    again, synchronously, on the writer's call stack. The re-run reads
//!    (and so re-subscribes) whatever it reads this time.
//!
//! 3. Subscriptions from earlier runs are not removed. An effect that used
//!    to read a key keeps being re-run when that key changes.
//!
//! # Lifetime
//!
//! An effect created with [`effect`] or [`Effect::new`] keeps running for
//! the rest of the process whether or not its handle is kept; the handle is
//! only needed to [`dispose`](Effect::dispose) or inspect it. Such effects
//! (and the targets their closures capture) are never reclaimed unless
//! disposed.
//!
//! [`Effect::scoped`] opts into handle-owned lifetime instead: the dependency
//! store only holds effects weakly, so a scoped effect stops once every
//! handle to it is dropped. [`Computed`](super::Computed) owns a scoped
//! effect, so dropping the computed stops its recomputation.
//!
//! # Cycles
//!
//! There is no cycle detection. An effect that writes a key it also reads
//! re-runs itself recursively until the write stops changing the value; if
//! it never does, the recursion does not end.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexSet;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use super::context::ReactiveContext;
use super::store::Dependency;
use super::subscriber::{EffectId, Subscriber};

/// Effects kept alive by [`Effect::detach`].
static DETACHED: Mutex<Vec<Arc<EffectInner>>> = Mutex::new(Vec::new());

struct EffectInner {
    id: EffectId,

    /// Self-reference handed to the context while running.
    this: Weak<EffectInner>,

    /// The effect function.
    run: Box<dyn Fn() + Send + Sync>,

    /// Every dependency ever tracked by this effect.
    dependencies: RwLock<IndexSet<Dependency>>,

    disposed: AtomicBool,

    run_count: AtomicUsize,
}

impl EffectInner {
    fn execute(&self) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }

        let runs = self.run_count.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(effect = %self.id, run = runs, "run effect");

        // Enter a reactive context to track dependencies
        let ctx = ReactiveContext::enter(self.id, self.this.clone());

        (self.run)();

        let new_deps = ReactiveContext::get_dependencies();
        drop(ctx);

        // Stale subscriptions persist in the store, so accumulate rather than replace.
        self.dependencies.write().extend(new_deps);
    }
}

impl Subscriber for EffectInner {
    fn id(&self) -> EffectId {
        self.id
    }

    fn run(&self) {
        self.execute();
    }
}

/// A computation that re-runs when its dependencies change.
///
/// # Example
///
/// ```rust,ignore
/// let count = Ref::new(0);
///
/// let counter = count.clone();
/// let effect = Effect::new(move || {
///     println!("Count is: {}", counter.get());
/// });
///
/// count.set(5);  // Prints: "Count is: 5"
/// ```
pub struct Effect {
    inner: Arc<EffectInner>,
}

impl Effect {
    /// Create a new effect with the given function.
    ///
    /// The function runs immediately to establish initial dependencies. The
    /// effect stays alive after the returned handle is dropped; only
    /// [`dispose`](Effect::dispose) stops it.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let effect = Self::scoped(run);
        effect.pin();
        effect
    }

    /// Create an effect that lives only as long as its handles.
    ///
    /// Once every clone of the returned handle is dropped, the effect is
    /// skipped and pruned the next time one of its dependencies triggers.
    #[must_use = "a scoped effect stops running once every handle to it is dropped"]
    pub fn scoped<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let inner = Arc::new_cyclic(|this| EffectInner {
            id: EffectId::new(),
            this: this.clone(),
            run: Box::new(run),
            dependencies: RwLock::new(IndexSet::new()),
            disposed: AtomicBool::new(false),
            run_count: AtomicUsize::new(0),
        });

        inner.execute();

        Self { inner }
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> EffectId {
        self.inner.id
    }

    /// Run the effect now, as a trigger would.
    pub fn run(&self) {
        self.inner.execute();
    }

    /// Stop the effect. A disposed effect never runs again.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(effect = %self.inner.id, "dispose effect");

        let released = {
            let mut detached = DETACHED.lock();
            detached
                .iter()
                .position(|inner| inner.id == self.inner.id)
                .map(|index| detached.swap_remove(index))
        };
        drop(released);
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Keep a scoped effect running for the rest of the process without
    /// holding a handle. Only [`dispose`](Effect::dispose) stops a detached
    /// effect. Effects from [`Effect::new`] are already detached.
    pub fn detach(self) {
        debug!(effect = %self.inner.id, "detach effect");
        self.pin();
    }

    fn pin(&self) {
        if self.is_disposed() {
            return;
        }
        let mut detached = DETACHED.lock();
        if !detached.iter().any(|inner| inner.id == self.inner.id) {
            detached.push(Arc::clone(&self.inner));
        }
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }

    /// Every `(target, key)` this effect has read, in first-read order.
    pub fn dependencies(&self) -> Vec<Dependency> {
        self.inner.dependencies.read().iter().cloned().collect()
    }

    /// Get the number of dependencies.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.read().len()
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Run `run` now and again whenever a reactive value it read changes.
///
/// The returned handle may be discarded; the effect keeps running until it
/// is disposed.
pub fn effect<F>(run: F) -> Effect
where
    F: Fn() + Send + Sync + 'static,
{
    Effect::new(run)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
