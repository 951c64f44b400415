//! The named-value environment a computation runs in.
//!
//! A [`Context`] maps names to values. Computations read the context that is
//! current on their thread (see [`crate::scope`]) to learn what they are
//! computing for, and use [`Context::hash`] as part of their cache key.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Number, Value};
use tracing::{debug, trace};

use crate::data::{self, DataType, FromData};
use crate::errors::{ContextError, Result};
use crate::hash::{ContextHash, ContextHasher};
use crate::name::Name;
use crate::ownership::{Entry, Ownership};
use crate::signal::ChangedSignal;

/// Name of the entry every default-constructed context starts with.
pub const FRAME: &str = "frame";

/// An ordered mapping from names to values.
///
/// Entries are kept sorted by name, so iteration, [`hash`](Context::hash)
/// and equality never depend on insertion order. There is no `Clone`:
/// use [`copy`](Context::copy) and say how the copy should hold its values.
pub struct Context {
    entries: BTreeMap<Name, Entry>,
    // Boxed and created on first use; most contexts are short lived and never observed.
    changed: Option<Box<ChangedSignal>>,
}

impl Context {
    /// A context holding only `frame = 1.0`.
    pub fn new() -> Self {
        let mut context = Self::empty();
        context.set(FRAME, 1.0);
        context
    }

    /// A context with no entries at all.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
            changed: None,
        }
    }

    /// Copies every entry, holding each value as `ownership` says.
    ///
    /// The copy never inherits observers. With [`Ownership::Borrowed`] the
    /// values stay owned by `self` (or whatever owns them), which must
    /// therefore outlive the copy.
    pub fn copy(&self, ownership: Ownership) -> Self {
        trace!(entries = self.entries.len(), %ownership, "copying context");
        Self {
            entries: self
                .entries
                .iter()
                .map(|(name, entry)| (name.clone(), entry.copy_as(ownership)))
                .collect(),
            changed: None,
        }
    }

    /// Builds a context from a JSON object, on top of the default `frame` entry.
    pub fn from_json_object(object: &Value) -> Result<Self> {
        let Value::Object(map) = object else {
            return Err(ContextError::InvalidArgument(format!(
                "expected a JSON object of context entries, got {}",
                DataType::of(object)
            )));
        };
        let mut context = Self::new();
        for (name, value) in map {
            context.set(name, value.clone());
        }
        Ok(context)
    }

    /// Stores `value` under `name`, replacing any previous entry.
    ///
    /// Non-finite floats have no JSON representation and convert to null;
    /// use [`set_float`](Context::set_float) to reject them instead.
    pub fn set(&mut self, name: impl Into<Name>, value: impl Into<Value>) {
        self.insert(name.into(), Entry::Shared(Arc::new(value.into())));
    }

    /// Stores an already-shared value, taking one more reference to it.
    pub fn set_data(&mut self, name: impl Into<Name>, value: Arc<Value>) {
        self.insert(name.into(), Entry::Shared(value));
    }

    /// Stores a view of `value` without taking a reference.
    ///
    /// Whoever owns `value` must keep it alive for as long as this entry is read.
    pub fn set_borrowed(&mut self, name: impl Into<Name>, value: &Arc<Value>) {
        self.insert(name.into(), Entry::Borrowed(Arc::downgrade(value)));
    }

    /// Stores a float, failing without touching the context if it is NaN or infinite.
    pub fn set_float(&mut self, name: impl Into<Name>, value: f64) -> Result<()> {
        let name = name.into();
        let number = Number::from_f64(value).ok_or_else(|| {
            ContextError::InvalidArgument(format!("context entry \"{name}\" must be finite, got {value}"))
        })?;
        self.insert(name, Entry::Shared(Arc::new(Value::Number(number))));
        Ok(())
    }

    fn insert(&mut self, name: Name, entry: Entry) {
        self.entries.insert(name.clone(), entry);
        self.notify(&name);
    }

    /// Removes the entry for `name`. Returns false if there was none.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.entries.remove_entry(name) {
            Some((name, _)) => {
                debug!(%name, "removed context entry");
                self.notify(&name);
                true
            }
            None => false,
        }
    }

    fn notify(&self, name: &Name) {
        if let Some(signal) = &self.changed {
            signal.emit(self, name);
        }
    }

    /// Reads the entry for `name` as a `T`.
    pub fn get<T: FromData>(&self, name: &str) -> Result<T> {
        let entry = self.entries.get(name).ok_or_else(|| ContextError::NotFound {
            name: name.to_owned(),
        })?;
        entry.with_value(|value| {
            T::from_data(value).ok_or_else(|| ContextError::TypeMismatch {
                name: name.to_owned(),
                expected: T::TYPE_NAME,
                found: DataType::of(value),
            })
        })
    }

    /// Like [`get`](Context::get), but a missing entry yields `default`.
    ///
    /// An entry of the wrong type is still an error.
    pub fn get_or<T: FromData>(&self, name: &str, default: T) -> Result<T> {
        match self.get(name) {
            Err(ContextError::NotFound { .. }) => Ok(default),
            other => other,
        }
    }

    /// The stored value itself, if present.
    pub fn get_data(&self, name: &str) -> Option<Arc<Value>> {
        self.entries.get(name).map(Entry::data)
    }

    pub(crate) fn with_entry<R>(&self, name: &str, f: impl FnOnce(&Value) -> R) -> Option<R> {
        self.entries.get(name).map(|entry| entry.with_value(f))
    }

    pub fn data_type(&self, name: &str) -> Option<DataType> {
        self.with_entry(name, DataType::of)
    }

    /// How this context holds the value under `name`.
    pub fn ownership(&self, name: &str) -> Option<Ownership> {
        self.entries.get(name).map(Entry::ownership)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entry names in canonical order.
    pub fn names(&self) -> impl Iterator<Item = &Name> + '_ {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `get::<f64>("frame")`.
    pub fn frame(&self) -> Result<f64> {
        self.get(FRAME)
    }

    /// `set("frame", frame)`, rejecting NaN and infinities.
    pub fn set_frame(&mut self, frame: f64) -> Result<()> {
        self.set_float(FRAME, frame)
    }

    /// Content fingerprint: each entry's name then its value, in name order.
    ///
    /// Contexts that compare equal always hash equal, however their entries
    /// were inserted or are held.
    pub fn hash(&self) -> ContextHash {
        let mut hasher = ContextHasher::new();
        for (name, entry) in &self.entries {
            hasher.append_str(name.as_str());
            entry.with_value(|value| data::append_hash(value, &mut hasher));
        }
        hasher.finish()
    }

    /// Observers of entry changes, created on first access.
    pub fn changed_signal(&mut self) -> &mut ChangedSignal {
        self.changed.get_or_insert_with(Default::default)
    }

    /// Whether [`changed_signal`](Context::changed_signal) has ever been requested.
    pub fn has_changed_signal(&self) -> bool {
        self.changed.is_some()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        self.entries
            .iter()
            .zip(&other.entries)
            .all(|((name, entry), (other_name, other_entry))| {
                name == other_name
                    && entry.with_value(|a| other_entry.with_value(|b| a == b))
            })
    }
}

impl Eq for Context {}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, entry) in &self.entries {
            entry.with_value(|value| {
                map.entry(name, &format_args!("{value} ({})", entry.ownership()));
            });
        }
        map.finish()
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, entry) in &self.entries {
            entry.with_value(|value| map.serialize_entry(name, value))?;
        }
        map.end()
    }
}
