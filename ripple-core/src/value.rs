//! Host Values
//!
//! Reactive objects wrap plain key-value data. This module defines that
//! data: a dynamically typed [`Value`] and the insertion-ordered [`Record`]
//! that holds named values.
//!
//! A `Record` also carries the small part of host object semantics that the
//! reactive layer has to respect: individual keys may be read-only, and the
//! whole record may be frozen. Writes that violate either fail with an
//! [`Error`] and never reach the dependency graph.
//!
//! # Equality
//!
//! Values compare structurally. Numbers follow IEEE comparison under the
//! derived `PartialEq`, so `NaN != NaN`; [`ChangeDetection::SameValue`] opts
//! into a comparison where `NaN` equals itself.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A dynamically typed host value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// Every number is a double, as in the host language.
    Number(f64),
    /// A string.
    String(String),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A nested record. Nested records are plain data; reading one out of a
    /// reactive object does not wrap it.
    Object(Record),
    /// The value of a key that was never set. Serializes as `null`.
    #[default]
    #[serde(skip_deserializing)]
    Undefined,
}

impl Value {
    /// Returns `true` for [`Value::Undefined`].
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// The number, if this is a [`Value::Number`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean, if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The string, if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The nested record, if this is a [`Value::Object`].
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Object(record) => Some(record),
            _ => None,
        }
    }

    /// Same-value comparison: like `==`, except `NaN` equals `NaN` and
    /// `0.0` is distinct from `-0.0`.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                (a.is_nan() && b.is_nan()) || (a == b && a.is_sign_negative() == b.is_sign_negative())
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_value(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, x)| b.get(key).is_some_and(|y| x.same_value(y)))
            }
            _ => self == other,
        }
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

number_from!(i32, i64, u32, u64, usize, f32, f64);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// How a reactive object decides that a write changed a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChangeDetection {
    /// Ordinary inequality. Writing `NaN` over `NaN` counts as a change.
    #[default]
    Inequality,
    /// [`Value::same_value`]. Writing `NaN` over `NaN` is a no-op.
    SameValue,
}

impl ChangeDetection {
    /// Returns `true` if replacing `old` with `new` is a change.
    pub fn changed(self, old: &Value, new: &Value) -> bool {
        match self {
            ChangeDetection::Inequality => old != new,
            ChangeDetection::SameValue => !old.same_value(new),
        }
    }
}

/// An insertion-ordered map of named values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "IndexMap<String, Value>", into = "IndexMap<String, Value>")]
pub struct Record {
    fields: IndexMap<String, Value>,
    readonly: HashSet<String>,
    frozen: bool,
}

impl Record {
    /// An empty, writable record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a record from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(record) => Ok(record),
            _ => Err(Error::NotAnObject),
        }
    }

    /// Builder-style insert, ignoring host write rules.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Define `key` with `value` and make it read-only.
    pub fn define_readonly(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        self.fields.insert(key.clone(), value.into());
        self.readonly.insert(key);
    }

    /// Forbid every further write and removal.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether [`freeze`](Record::freeze) has been called.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Whether `key` was defined read-only.
    pub fn is_readonly(&self, key: &str) -> bool {
        self.frozen || self.readonly.contains(key)
    }

    /// The value at `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no keys.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Write `value` under `key`, honouring read-only keys and freezing.
    ///
    /// Returns the previous value, or `None` if the key is new.
    pub fn write(&mut self, key: &str, value: Value) -> Result<Option<Value>> {
        self.check_writable(key)?;
        Ok(self.fields.insert(key.to_owned(), value))
    }

    /// Remove `key`, honouring read-only keys and freezing.
    ///
    /// Insertion order of the remaining keys is preserved.
    pub fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        if !self.fields.contains_key(key) {
            return Ok(None);
        }
        self.check_writable(key)?;
        Ok(self.fields.shift_remove(key))
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.frozen {
            return Err(Error::Frozen { key: key.to_owned() });
        }
        if self.readonly.contains(key) {
            return Err(Error::ReadOnly { key: key.to_owned() });
        }
        Ok(())
    }
}

// Write rules are host metadata, not data.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl From<IndexMap<String, Value>> for Record {
    fn from(fields: IndexMap<String, Value>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }
}

impl From<Record> for IndexMap<String, Value> {
    fn from(record: Record) -> Self {
        record.fields
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<IndexMap<_, _>>()
            .into()
    }
}
