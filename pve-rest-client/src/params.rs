//! Request parameters.
//!
//! Parameters are collected in a flat, ordered [`ParameterMap`]. Unset values never make it into
//! the map, and indexed families such as `net0`, `net1`, ... are flattened into their prefixed
//! names before they are stored, so the map always reflects exactly what goes over the wire.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use serde::ser::{self, SerializeMap};
use serde::Serialize;
use serde_json::{Map, Value};

/// Flat, insertion ordered mapping of parameter names to values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterMap {
    entries: Vec<(String, Value)>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set a parameter, replacing an earlier value of the same name in place.
    ///
    /// `null` and empty strings count as "not set" and are ignored.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        if is_unset(&value) {
            return self;
        }

        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, old)) => *old = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    /// Builder style variant of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set an optional parameter, does nothing for `None`.
    pub fn maybe_insert<T: Into<Value>>(
        &mut self,
        name: impl Into<String>,
        value: Option<T>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.insert(name, value);
        }
        self
    }

    /// Flatten an indexed family into `{prefix}{index}` parameters.
    ///
    /// ```
    /// use pve_rest_client::ParameterMap;
    ///
    /// let mut params = ParameterMap::new();
    /// params.insert_indexed("net", [(0, "virtio,bridge=vmbr0"), (2, "e1000,bridge=vmbr1")]);
    ///
    /// assert_eq!(params.get("net0").unwrap(), "virtio,bridge=vmbr0");
    /// assert_eq!(params.get("net2").unwrap(), "e1000,bridge=vmbr1");
    /// assert!(params.get("net1").is_none());
    /// ```
    pub fn insert_indexed<I, V>(&mut self, prefix: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = (usize, V)>,
        V: Into<Value>,
    {
        for (index, value) in values {
            self.insert(format!("{prefix}{index}"), value);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(n, value)| (n == name).then_some(value))
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// The JSON body sent with `POST` and `PUT` requests.
    ///
    /// Booleans are converted to `1`/`0` since that is what the API expects for flags.
    pub fn to_json_body(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(name, value)| (name.clone(), wire_value(value)))
            .collect();
        Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut this = Self::new();
        for (name, value) in iter {
            this.insert(name, value);
        }
        this
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for ParameterMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl Serialize for ParameterMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Convert a parameter value into the representation sent to the API.
pub(crate) fn wire_value(value: &Value) -> Value {
    match value {
        Value::Bool(b) => Value::from(u8::from(*b)),
        Value::Array(list) => Value::Array(list.iter().map(wire_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(name, value)| (name.clone(), wire_value(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Serialize a typed request into its parameters.
///
/// The value has to serialize into an object (or `null` for "no parameters"). Fields which
/// serialize to `null` or an empty string are left out.
pub fn to_parameters<T: Serialize + ?Sized>(params: &T) -> Result<ParameterMap, serde_json::Error> {
    match serde_json::to_value(params)? {
        Value::Null => Ok(ParameterMap::new()),
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(ser::Error::custom(format!(
            "request parameters must be an object, got {other}"
        ))),
    }
}

/// Indicates the index used to access an [`IndexedParams`] is out of bounds.
#[derive(Default, Debug, Clone, Copy)]
pub struct OutOfBounds;

impl fmt::Display for OutOfBounds {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("index out of bounds")
    }
}

impl std::error::Error for OutOfBounds {}

/// A sparse indexed parameter family like `net0` ... `net31` for typed requests.
///
/// Serializes as a map of `{prefix}{index}` entries, so it is meant to be used with
/// `#[serde(flatten)]`.
#[derive(Clone, Debug)]
pub struct IndexedParams<T, const MAX: usize> {
    prefix: &'static str,
    inner: BTreeMap<usize, T>,
}

impl<T, const MAX: usize> IndexedParams<T, { MAX }> {
    /// Create a new empty family.
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            inner: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.inner.get(&index)
    }

    /// Insert an element at a specific index.
    ///
    /// Fails if the index is out of bounds.
    pub fn insert(&mut self, index: usize, item: T) -> Result<Option<T>, OutOfBounds> {
        if index >= MAX {
            Err(OutOfBounds)
        } else {
            Ok(self.inner.insert(index, item))
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<T> {
        self.inner.remove(&index)
    }

    /// "Add" an element at the lowest unused index.
    pub fn add(&mut self, item: T) -> Option<usize> {
        let index = (0..MAX).find(|index| !self.inner.contains_key(index))?;
        self.inner.insert(index, item);
        Some(index)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, usize, T> {
        self.inner.iter()
    }
}

impl<T: Serialize, const MAX: usize> Serialize for IndexedParams<T, { MAX }> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.inner.len()))?;
        for (index, value) in &self.inner {
            map.serialize_entry(&format!("{}{index}", self.prefix), value)?;
        }
        map.end()
    }
}
