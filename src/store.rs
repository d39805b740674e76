//! Cache store.
//!
//! The [`CacheStore`] maps normalized request keys to the last resolved value of that request.
//! Values are stored type-erased, so one store can hold responses for any request type. They get
//! cast back into a concrete type when read.
use std::{any::Any, cell::RefCell, collections::BTreeMap, fmt, rc::Rc};

/// Type-erased resolved value. Holds an `Option<T>`.
type Entry = Rc<dyn Any>;

/// In-memory store of resolved values.
///
/// Cloning the store is cheap, clones share the same entries. Entries are never evicted, they
/// live until they are deleted or the store is dropped. Concurrent writers to the same key
/// overwrite each other, the last write wins.
#[derive(Clone, Default)]
pub struct CacheStore {
    entries: Rc<RefCell<BTreeMap<String, Entry>>>,
}

impl PartialEq for CacheStore {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("keys", &self.keys())
            .finish()
    }
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the resolved value stored for this key.
    ///
    /// Returns `None` if there is no entry, or if the entry was stored with a different type.
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<Option<T>> {
        let entry = self.entries.borrow().get(key).cloned()?;
        match entry.downcast_ref::<Option<T>>() {
            Some(value) => Some(value.clone()),
            None => {
                warn!(
                    "cache entry {key:?} is not of type {}",
                    std::any::type_name::<T>()
                );
                None
            }
        }
    }

    /// Store the resolved value for this key, replacing any previous entry.
    pub fn set<T: 'static>(&self, key: &str, value: Option<T>) {
        debug!("cache set {key:?}");
        self.entries
            .borrow_mut()
            .insert(key.to_string(), Rc::new(value));
    }

    /// Delete the entry for this key. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        debug!("cache delete {key:?}");
        self.entries.borrow_mut().remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Keys of all entries, in order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    /// Delete all entries.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}
