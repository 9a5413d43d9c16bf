//! Dependency Store
//!
//! The store is the dependency graph: for every target it maps each tracked
//! key to the set of effects that read it.
//!
//! ```text
//! TargetId ──► key ──► { effect, effect, ... }
//! ```
//!
//! # How It Works
//!
//! 1. When a reactive value is read inside a running effect, [`track`] adds
//!    that effect to the set for `(target, key)`. Sets are insertion-ordered
//!    and deduplicated by [`EffectId`], so reading the same key twice in one
//!    run subscribes once.
//!
//! 2. When a reactive value changes, [`trigger`] snapshots the set for
//!    `(target, key)` and runs each live effect synchronously, in
//!    subscription order, each to completion before the next.
//!
//! 3. Nothing is unsubscribed when an effect re-runs and stops reading a key.
//!    Such stale subscriptions stay until the target goes away.
//!
//! # Ownership
//!
//! The store never owns what it points at. Effects are held weakly, so an
//! effect whose handles are all dropped is skipped (and pruned) on the next
//! trigger. Targets evict their own entry when their last handle is
//! dropped, so a reclaimed object takes its dependency map with it.
//!
//! # Thread Safety
//!
//! Entries live in a sharded concurrent map. No shard lock is held while a
//! subscriber runs, so effects are free to track and trigger recursively.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use dashmap::DashMap;
use indexmap::{IndexMap, IndexSet};
use tracing::trace;

use super::context::ReactiveContext;
use super::subscriber::{EffectId, Subscriber};

/// Identity of a tracked object or cell.
///
/// Targets are identified by reference, not by value: two reactive objects
/// holding equal data are different targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

impl TargetId {
    /// Generate a new unique target ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// One edge source in the graph: a key on a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub target: TargetId,
    pub key: String,
}

impl Dependency {
    pub fn new(target: TargetId, key: impl Into<String>) -> Self {
        Self {
            target,
            key: key.into(),
        }
    }
}

/// A weakly held subscriber, compared by effect identity.
#[derive(Clone)]
struct SubscriberRef {
    id: EffectId,
    subscriber: Weak<dyn Subscriber>,
}

impl PartialEq for SubscriberRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SubscriberRef {}

impl Hash for SubscriberRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

type KeyMap = IndexMap<String, IndexSet<SubscriberRef>>;

/// Map of target -> key -> subscribed effects.
#[derive(Default)]
pub struct DependencyStore {
    targets: DashMap<TargetId, KeyMap>,
}

impl DependencyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store used by [`track`] and [`trigger`].
    pub fn global() -> &'static DependencyStore {
        static STORE: OnceLock<DependencyStore> = OnceLock::new();
        STORE.get_or_init(DependencyStore::new)
    }

    /// Subscribe `subscriber` to `(target, key)`.
    ///
    /// Returns `false` if it was already subscribed.
    pub fn subscribe(
        &self,
        target: TargetId,
        key: &str,
        id: EffectId,
        subscriber: Weak<dyn Subscriber>,
    ) -> bool {
        let entry = SubscriberRef { id, subscriber };
        let mut keys = self.targets.entry(target).or_default();

        if let Some(subscribers) = keys.get_mut(key) {
            return subscribers.insert(entry);
        }

        keys.entry(key.to_owned()).or_default().insert(entry)
    }

    /// Run every live subscriber of `(target, key)`.
    ///
    /// Returns how many subscribers ran.
    pub fn trigger(&self, target: TargetId, key: &str) -> usize {
        // Snapshot under the shard lock, run after releasing it.
        let (live, saw_dead) = {
            let Some(keys) = self.targets.get(&target) else {
                return 0;
            };
            let Some(subscribers) = keys.get(key) else {
                return 0;
            };

            let mut saw_dead = false;
            let live: Vec<Arc<dyn Subscriber>> = subscribers
                .iter()
                .filter_map(|entry| {
                    let upgraded = entry.subscriber.upgrade();
                    saw_dead |= upgraded.is_none();
                    upgraded
                })
                .collect();
            (live, saw_dead)
        };

        if saw_dead {
            self.prune(target, key);
        }

        trace!(%target, key, subscribers = live.len(), "trigger");

        for subscriber in &live {
            subscriber.run();
        }

        live.len()
    }

    /// Drop subscribers of `(target, key)` whose effect no longer exists.
    fn prune(&self, target: TargetId, key: &str) {
        if let Some(mut keys) = self.targets.get_mut(&target) {
            if let Some(subscribers) = keys.get_mut(key) {
                subscribers.retain(|entry| entry.subscriber.strong_count() > 0);
            }
        }
    }

    /// Remove every dependency entry of `target`.
    ///
    /// Called when a target is reclaimed.
    pub fn evict(&self, target: TargetId) -> bool {
        let evicted = self.targets.remove(&target).is_some();
        if evicted {
            trace!(%target, "evict");
        }
        evicted
    }

    /// Number of subscribers recorded for `(target, key)`, live or not.
    pub fn subscriber_count(&self, target: TargetId, key: &str) -> usize {
        self.targets
            .get(&target)
            .and_then(|keys| keys.get(key).map(IndexSet::len))
            .unwrap_or(0)
    }

    /// Check whether `target` has a dependency map.
    pub fn contains_target(&self, target: TargetId) -> bool {
        self.targets.contains_key(&target)
    }

    /// Number of targets with a dependency map.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}

/// Record that the running effect depends on `(target, key)`.
///
/// Outside of any effect this is a no-op: untracked reads never enter the
/// graph.
pub fn track(target: TargetId, key: &str) {
    let Some((effect, subscriber)) = ReactiveContext::current_subscriber() else {
        return;
    };

    ReactiveContext::track_dependency(Dependency::new(target, key));
    let inserted = DependencyStore::global().subscribe(target, key, effect, subscriber);

    trace!(%target, key, %effect, inserted, "track");
}

/// Re-run every effect that depends on `(target, key)`.
///
/// Returns how many effects ran. Writing a key nobody has read is a no-op.
pub fn trigger(target: TargetId, key: &str) -> usize {
    DependencyStore::global().trigger(target, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicI32;

    struct MockSubscriber {
        id: EffectId,
        runs: AtomicI32,
        log: Option<Arc<Mutex<Vec<EffectId>>>>,
    }

    impl MockSubscriber {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                id: EffectId::new(),
                runs: AtomicI32::new(0),
                log: None,
            })
        }

        fn logging(log: &Arc<Mutex<Vec<EffectId>>>) -> Arc<Self> {
            Arc::new(Self {
                id: EffectId::new(),
                runs: AtomicI32::new(0),
                log: Some(log.clone()),
            })
        }

        fn runs(&self) -> i32 {
            self.runs.load(Ordering::SeqCst)
        }
    }

    impl Subscriber for MockSubscriber {
        fn id(&self) -> EffectId {
            self.id
        }

        fn run(&self) {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if let Some(log) = &self.log {
                log.lock().push(self.id);
            }
        }
    }

    fn subscribe(store: &DependencyStore, target: TargetId, key: &str, sub: &Arc<MockSubscriber>) -> bool {
        let weak: Weak<dyn Subscriber> = Arc::downgrade(sub) as Weak<dyn Subscriber>;
        store.subscribe(target, key, sub.id, weak)
    }

    #[test]
    fn subscribe_is_idempotent() {
        let store = DependencyStore::new();
        let target = TargetId::new();
        let sub = MockSubscriber::new();

        assert!(subscribe(&store, target, "x", &sub));
        assert!(!subscribe(&store, target, "x", &sub));
        assert_eq!(store.subscriber_count(target, "x"), 1);

        store.trigger(target, "x");
        assert_eq!(sub.runs(), 1);
    }

    #[test]
    fn trigger_runs_each_subscriber_once_in_order() {
        let store = DependencyStore::new();
        let target = TargetId::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = MockSubscriber::logging(&log);
        let second = MockSubscriber::logging(&log);

        subscribe(&store, target, "x", &first);
        subscribe(&store, target, "x", &second);

        assert_eq!(store.trigger(target, "x"), 2);
        assert_eq!(*log.lock(), vec![first.id, second.id]);
    }

    #[test]
    fn trigger_without_subscribers_is_noop() {
        let store = DependencyStore::new();
        let target = TargetId::new();
        let sub = MockSubscriber::new();

        assert_eq!(store.trigger(target, "x"), 0);

        subscribe(&store, target, "x", &sub);
        assert_eq!(store.trigger(target, "y"), 0);
        assert_eq!(sub.runs(), 0);
    }

    #[test]
    fn keys_are_isolated() {
        let store = DependencyStore::new();
        let target = TargetId::new();
        let reads_a = MockSubscriber::new();
        let reads_b = MockSubscriber::new();

        subscribe(&store, target, "a", &reads_a);
        subscribe(&store, target, "b", &reads_b);

        store.trigger(target, "a");
        assert_eq!(reads_a.runs(), 1);
        assert_eq!(reads_b.runs(), 0);
    }

    #[test]
    fn dropped_subscribers_are_skipped_and_pruned() {
        let store = DependencyStore::new();
        let target = TargetId::new();
        let kept = MockSubscriber::new();
        let dropped = MockSubscriber::new();

        subscribe(&store, target, "x", &kept);
        subscribe(&store, target, "x", &dropped);
        drop(dropped);

        assert_eq!(store.subscriber_count(target, "x"), 2);
        assert_eq!(store.trigger(target, "x"), 1);
        assert_eq!(store.subscriber_count(target, "x"), 1);
        assert_eq!(kept.runs(), 1);
    }

    #[test]
    fn evict_removes_target_entries() {
        let store = DependencyStore::new();
        let target = TargetId::new();
        let sub = MockSubscriber::new();

        subscribe(&store, target, "x", &sub);
        assert!(store.contains_target(target));
        assert_eq!(store.target_count(), 1);

        assert!(store.evict(target));
        assert!(!store.contains_target(target));
        assert!(!store.evict(target));

        assert_eq!(store.trigger(target, "x"), 0);
        assert_eq!(sub.runs(), 0);
    }

    #[test]
    fn track_outside_effect_records_nothing() {
        let target = TargetId::new();

        track(target, "x");

        assert!(!DependencyStore::global().contains_target(target));
        assert_eq!(trigger(target, "x"), 0);
    }
}
