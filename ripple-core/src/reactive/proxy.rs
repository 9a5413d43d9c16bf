//! Reactive Objects
//!
//! [`Reactive`] wraps a plain [`Record`] so that every read of a key tracks
//! it and every successful, value-changing write triggers it. Callers never
//! call [`track`] or [`trigger`] themselves.
//!
//! The wrapper is its own target. The record it was built from is moved in;
//! a [`snapshot`](Reactive::snapshot) taken back out is plain data, and
//! reading it tracks nothing.
//!
//! Keys are tracked independently, including keys added after wrapping.
//! Nested records come back as plain values: wrapping is not deep.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;

use super::store::{track, trigger, DependencyStore, TargetId};
use crate::error::Result;
use crate::value::{ChangeDetection, Record, Value};

struct ReactiveInner {
    id: TargetId,
    record: RwLock<Record>,
    change: ChangeDetection,
}

impl Drop for ReactiveInner {
    fn drop(&mut self) {
        DependencyStore::global().evict(self.id);
    }
}

/// A record whose reads are tracked and whose writes trigger.
///
/// Clones share the record: they are the same target.
///
/// # Example
///
/// ```rust,ignore
/// let product = reactive([("price", 5), ("quantity", 2)]);
///
/// let p = product.clone();
/// effect(move || {
///     let total = p.get("price").as_f64().unwrap_or(0.0) * p.get("quantity").as_f64().unwrap_or(0.0);
///     println!("total = {total}");
/// });
///
/// product.set("price", 10)?; // prints "total = 20"
/// ```
pub struct Reactive {
    inner: Arc<ReactiveInner>,
}

impl Reactive {
    /// Wrap `record` using ordinary inequality for change detection.
    pub fn new(record: impl Into<Record>) -> Self {
        Self::with_change_detection(record, ChangeDetection::default())
    }

    /// Wrap `record`, deciding "changed" with `change`.
    pub fn with_change_detection(record: impl Into<Record>, change: ChangeDetection) -> Self {
        Self {
            inner: Arc::new(ReactiveInner {
                id: TargetId::new(),
                record: RwLock::new(record.into()),
                change,
            }),
        }
    }

    /// Parse a JSON object and wrap it.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(Record::from_json(json)?))
    }

    /// The object's identity in the dependency store.
    pub fn id(&self) -> TargetId {
        self.inner.id
    }

    /// How this object decides whether a write changed a key.
    pub fn change_detection(&self) -> ChangeDetection {
        self.inner.change
    }

    /// Read `key`, tracking it. Missing keys read as [`Value::Undefined`].
    pub fn get(&self, key: &str) -> Value {
        let value = self
            .inner
            .record
            .read()
            .get(key)
            .cloned()
            .unwrap_or_default();
        track(self.inner.id, key);
        value
    }

    /// Check whether `key` is present, tracking it.
    pub fn contains_key(&self, key: &str) -> bool {
        let present = self.inner.record.read().contains_key(key);
        track(self.inner.id, key);
        present
    }

    /// Write `value` under `key`.
    ///
    /// Triggers `key` only if the write succeeded and the value changed.
    /// Adding a new key is a write like any other. A write rejected by the
    /// record is returned unchanged and triggers nothing.
    ///
    /// Returns whether the value changed.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();

        let changed = {
            let mut record = self.inner.record.write();
            let old = record.write(key, value.clone())?.unwrap_or_default();
            self.inner.change.changed(&old, &value)
        };

        if changed {
            trigger(self.inner.id, key);
        }
        Ok(changed)
    }

    /// Remove `key`, triggering it if a value was removed.
    pub fn remove(&self, key: &str) -> Result<Option<Value>> {
        let removed = self.inner.record.write().remove(key)?;

        if removed.is_some() {
            trigger(self.inner.id, key);
        }
        Ok(removed)
    }

    /// Copy of the underlying record. Not tracked.
    pub fn snapshot(&self) -> Record {
        self.inner.record.read().clone()
    }

    /// Serialize the underlying record. Not tracked.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&*self.inner.record.read())?)
    }

    /// Get the number of subscribers of `key`, including stale ones.
    pub fn subscriber_count(&self, key: &str) -> usize {
        DependencyStore::global().subscriber_count(self.inner.id, key)
    }
}

impl Clone for Reactive {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Debug for Reactive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reactive")
            .field("id", &self.inner.id)
            .field("record", &*self.inner.record.read())
            .finish()
    }
}

/// Wrap a record so its reads track and its writes trigger.
pub fn reactive(record: impl Into<Record>) -> Reactive {
    Reactive::new(record)
}

/// [`reactive`] with an explicit change-detection rule.
pub fn reactive_with(record: impl Into<Record>, change: ChangeDetection) -> Reactive {
    Reactive::with_change_detection(record, change)
}
