//! Key subsets, defaults and snapshots.
//!
//! A [`Snapshot`] always holds exactly the keys it was read for: the stored
//! value where one is present, the default otherwise.

use super::error::{Error, Result};
use crate::storage::ChangeSet;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Ordered set of setting keys one read or watch is scoped to.
///
/// Duplicates are allowed and harmless. Cloning is cheap.
#[derive(Clone, PartialEq, Eq)]
pub struct KeySet(Arc<[String]>);

impl KeySet {
    /// Build a key set from any list of key names.
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    /// The keys, in the order given.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// True if `key` is one of the keys.
    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|k| k == key)
    }

    /// True if any changed key in the batch belongs to this set.
    pub fn intersects(&self, changes: &ChangeSet) -> bool {
        self.0.iter().any(|key| changes.contains_key(key))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<S: Into<String>> FromIterator<S> for KeySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Fallback values, fixed for the lifetime of a store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Defaults(Arc<Map<String, Value>>);

impl Defaults {
    /// Build defaults from any value that serializes to an object,
    /// such as a settings struct or a `json!({ ... })` literal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAnObject`] if `value` serializes to anything other
    /// than an object, or [`Error::Encode`] if serialization fails.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        to_object(value).map(Self::from_map)
    }

    /// Build defaults from an already-decoded object.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(Arc::new(map))
    }

    /// The default for `key`, if one is configured.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// All configured defaults.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Keys with a configured default.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge stored values over the defaults for `keys`.
    ///
    /// A stored value wins when it is present and not `null`; falsy values
    /// like `0`, `false` and `""` are kept. A key with neither a stored value
    /// nor a default maps to `null`.
    pub fn resolve(&self, keys: &KeySet, stored: &Map<String, Value>) -> Snapshot {
        let mut values = Map::new();
        for key in keys.as_slice() {
            let value = match stored.get(key) {
                Some(value) if !value.is_null() => value.clone(),
                _ => self.get(key).cloned().unwrap_or(Value::Null),
            };
            values.insert(key.clone(), value);
        }
        Snapshot { values }
    }
}

/// Settings restricted to the keys they were read for.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    values: Map<String, Value>,
}

impl Snapshot {
    /// Decode the value of `key` as `V`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the key was not part of the read or its
    /// value does not deserialize into `V`.
    pub fn get<V: DeserializeOwned>(&self, key: &str) -> Result<V> {
        let value = self.values.get(key).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| Error::decode(key, e))
    }

    /// The raw value of `key`.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Decode the whole snapshot into a caller-declared shape, typically a
    /// struct holding just the requested fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the snapshot does not match `P`.
    pub fn deserialize<P: DeserializeOwned>(&self) -> Result<P> {
        serde_json::from_value(Value::Object(self.values.clone()))
            .map_err(|e| Error::decode("<snapshot>", e))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }
}

/// Serialize `value` and require the result to be an object.
pub(crate) fn to_object<T: Serialize + ?Sized>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value).map_err(Error::encode)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::NotAnObject {
            kind: kind_of(&other),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
