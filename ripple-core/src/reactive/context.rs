//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a reactive value is
//! read, the current computation is subscribed to it.
//!
//! # Implementation
//!
//! We use a thread-local stack rather than a single "active effect" slot.
//! Entering an effect pushes it; leaving pops it, which restores whatever
//! was active before. Clearing the slot unconditionally on exit would lose
//! the outer effect as soon as a nested one finishes (an effect whose write
//! triggers another effect, a computed read inside an effect), so reads made
//! by the outer effect after that point would go untracked.
//!
//! Each thread has its own stack, so one thread's running effect never
//! captures reads made on another thread.

use std::cell::RefCell;
use std::sync::Weak;

use smallvec::SmallVec;

use super::store::Dependency;
use super::subscriber::{EffectId, Subscriber};

thread_local! {
    static CONTEXT_STACK: RefCell<SmallVec<[ContextEntry; 4]>> = RefCell::new(SmallVec::new());
}

/// An entry in the reactive context stack.
struct ContextEntry {
    /// The effect being run.
    effect_id: EffectId,
    /// Handle the dependency store subscribes.
    subscriber: Weak<dyn Subscriber>,
    /// Dependencies read during this run, in read order, deduplicated.
    dependencies: Vec<Dependency>,
}

/// Guard that pops the context when dropped.
///
/// This keeps the stack balanced even if the computation panics.
pub struct ReactiveContext {
    effect_id: EffectId,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given subscriber.
    ///
    /// While this context is on top of the stack, tracked reads subscribe
    /// `subscriber`. The context is exited when the returned guard is dropped.
    pub fn enter(effect_id: EffectId, subscriber: Weak<dyn Subscriber>) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                effect_id,
                subscriber,
                dependencies: Vec::new(),
            });
        });

        Self { effect_id }
    }

    /// Check if there is an active reactive context.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Number of computations currently running on this thread.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }

    /// Get the current effect ID, if any.
    pub fn current_effect() -> Option<EffectId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().map(|entry| entry.effect_id))
    }

    /// Get the current subscriber, if any.
    pub(crate) fn current_subscriber() -> Option<(EffectId, Weak<dyn Subscriber>)> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| (entry.effect_id, entry.subscriber.clone()))
        })
    }

    /// Record a dependency of the current computation.
    pub fn track_dependency(dependency: Dependency) {
        CONTEXT_STACK.with(|stack| {
            if let Some(entry) = stack.borrow_mut().last_mut() {
                if !entry.dependencies.contains(&dependency) {
                    entry.dependencies.push(dependency);
                }
            }
        });
    }

    /// Get the dependencies collected in the current context.
    pub fn get_dependencies() -> Vec<Dependency> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.dependencies.clone())
                .unwrap_or_default()
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.effect_id, self.effect_id,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.effect_id, entry.effect_id
                );
            }
        });
    }
}
