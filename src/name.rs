use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use serde::{Serialize, Serializer};

static INTERNER: LazyLock<RwLock<HashSet<Arc<str>>>> = LazyLock::new(Default::default);

/// Interned entry name.
///
/// Equal text always shares one allocation, so clones are a reference
/// count bump and equality usually resolves on the pointer. Names order
/// lexicographically by text, which is the canonical entry order.
#[derive(Clone)]
pub struct Name(Arc<str>);

impl Name {
    pub fn new(text: &str) -> Self {
        // The set is only ever inserted into, so a poisoned lock still holds a valid set.
        if let Some(existing) = INTERNER.read().unwrap_or_else(PoisonError::into_inner).get(text) {
            return Name(existing.clone());
        }
        let mut set = INTERNER.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have interned the text between the two locks.
        if let Some(existing) = set.get(text) {
            return Name(existing.clone());
        }
        let interned: Arc<str> = Arc::from(text);
        set.insert(interned.clone());
        Name(interned)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for Name {}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        if Arc::ptr_eq(&self.0, &other.0) {
            return Ordering::Equal;
        }
        self.0.cmp(&other.0)
    }
}

// Must agree with `str`'s Hash so that `Borrow<str>` lookups work.
impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Name::new(text)
    }
}

impl From<String> for Name {
    fn from(text: String) -> Self {
        Name::new(&text)
    }
}

impl From<&String> for Name {
    fn from(text: &String) -> Self {
        Name::new(text)
    }
}

impl From<&Name> for Name {
    fn from(name: &Name) -> Self {
        name.clone()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
