use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ContextError;

/// How a context holds the value behind one of its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    /// A view of a value owned elsewhere. Holds no strong reference, so the
    /// owner must outlive the view.
    Borrowed,
    /// One strong reference to a value that others may also hold.
    Shared,
    /// An independent clone owned by this entry alone.
    Copied,
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Ownership::Borrowed => "borrowed",
            Ownership::Shared => "shared",
            Ownership::Copied => "copied",
        })
    }
}

impl FromStr for Ownership {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "borrowed" => Ok(Ownership::Borrowed),
            "shared" => Ok(Ownership::Shared),
            "copied" => Ok(Ownership::Copied),
            other => Err(ContextError::InvalidArgument(format!(
                "unknown ownership mode `{other}` (expected borrowed, shared or copied)"
            ))),
        }
    }
}

/// A stored value together with the way it is held.
pub(crate) enum Entry {
    Borrowed(Weak<Value>),
    Shared(Arc<Value>),
    Copied(Arc<Value>),
}

impl Entry {
    pub(crate) fn ownership(&self) -> Ownership {
        match self {
            Entry::Borrowed(_) => Ownership::Borrowed,
            Entry::Shared(_) => Ownership::Shared,
            Entry::Copied(_) => Ownership::Copied,
        }
    }

    /// Strong handle to the value.
    ///
    /// # Panics
    ///
    /// Panics if this is a borrowed view whose owner has already released
    /// the value. That is a broken lifetime contract on the caller's side.
    pub(crate) fn data(&self) -> Arc<Value> {
        match self {
            Entry::Shared(v) | Entry::Copied(v) => v.clone(),
            Entry::Borrowed(w) => match w.upgrade() {
                Some(v) => v,
                None => panic!("borrowed context entry outlived the value it views"),
            },
        }
    }

    /// Runs `f` against the value without taking a new reference for owned entries.
    pub(crate) fn with_value<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        match self {
            Entry::Shared(v) | Entry::Copied(v) => f(v),
            Entry::Borrowed(_) => f(&self.data()),
        }
    }

    /// Builds the entry a copy made with `ownership` holds for this one.
    ///
    /// The mode applies uniformly: the source entry's own mode never leaks
    /// into the copy.
    pub(crate) fn copy_as(&self, ownership: Ownership) -> Entry {
        match ownership {
            Ownership::Copied => Entry::Copied(Arc::new(self.with_value(Value::clone))),
            Ownership::Shared => Entry::Shared(self.data()),
            Ownership::Borrowed => match self {
                Entry::Borrowed(w) => Entry::Borrowed(w.clone()),
                Entry::Shared(v) | Entry::Copied(v) => Entry::Borrowed(Arc::downgrade(v)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn copied_entries_hold_an_independent_value() {
        let source = Entry::Shared(Arc::new(json!("a")));
        let copy = source.copy_as(Ownership::Copied);
        let (Entry::Shared(a), Entry::Copied(b)) = (&source, &copy) else {
            panic!("unexpected entry kinds");
        };
        assert!(!Arc::ptr_eq(a, b));
        assert_eq!(Arc::strong_count(a), 1);
        assert_eq!(**b, json!("a"));
    }

    #[test]
    fn shared_entries_add_exactly_one_reference() {
        let value = Arc::new(json!(2));
        let source = Entry::Shared(value.clone());
        let copy = source.copy_as(Ownership::Shared);
        assert_eq!(Arc::strong_count(&value), 3);
        drop(copy);
        assert_eq!(Arc::strong_count(&value), 2);
        drop(source);
        assert_eq!(Arc::strong_count(&value), 1);
    }

    #[test]
    fn borrowed_entries_add_no_reference() {
        let value = Arc::new(json!(2));
        let source = Entry::Shared(value.clone());
        let view = source.copy_as(Ownership::Borrowed);
        assert_eq!(Arc::strong_count(&value), 2);
        assert_eq!(view.ownership(), Ownership::Borrowed);
        assert_eq!(*view.data(), json!(2));
        drop(view);
        assert_eq!(Arc::strong_count(&value), 2);
    }

    #[test]
    fn shared_copy_of_a_view_promotes_it() {
        let value = Arc::new(json!(true));
        let view = Entry::Borrowed(Arc::downgrade(&value));
        let shared = view.copy_as(Ownership::Shared);
        drop(value);
        assert_eq!(*shared.data(), json!(true));
    }

    #[test]
    #[should_panic(expected = "outlived")]
    fn dangling_view_is_detected() {
        let value = Arc::new(json!(1));
        let view = Entry::Borrowed(Arc::downgrade(&value));
        drop(value);
        view.data();
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!("Shared".parse::<Ownership>().unwrap(), Ownership::Shared);
        assert!("owned".parse::<Ownership>().is_err());
    }
}
