//! In-memory storage area shared by several execution contexts.
//!
//! Each [`MemoryStorage`] handle returned by [`MemoryStorage::open_context`]
//! plays the role of one browser tab on the same origin: writes are visible
//! to all of them, and every *other* context is notified, exactly like the
//! browser `storage` event.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{ChangeListener, KeyValueStore, Listeners, StorageChange, StorageScope, StorageSubscription};
use crate::logging::report_debug;

/// One execution context on a shared area. Clones are the same context; the
/// context is unregistered when the last clone is dropped.
#[derive(Clone)]
pub struct MemoryStorage {
    context: Rc<Context>,
}

struct Context {
    area: Rc<SharedArea>,
    id: u64,
    listeners: Listeners,
}

impl Drop for Context {
    fn drop(&mut self) {
        self.area
            .contexts
            .borrow_mut()
            .retain(|(context_id, _)| *context_id != self.id);
    }
}

struct SharedArea {
    scope: StorageScope,
    entries: RefCell<BTreeMap<String, String>>,
    contexts: RefCell<Vec<(u64, Listeners)>>,
    next_context_id: Cell<u64>,
}

impl MemoryStorage {
    pub fn new(scope: StorageScope) -> Self {
        let area = Rc::new(SharedArea {
            scope,
            entries: RefCell::new(BTreeMap::new()),
            contexts: RefCell::new(Vec::new()),
            next_context_id: Cell::new(0),
        });
        Self::attach(area)
    }

    /// Another execution context on the same storage area.
    pub fn open_context(&self) -> Self {
        Self::attach(Rc::clone(&self.context.area))
    }

    fn attach(area: Rc<SharedArea>) -> Self {
        let id = area.next_context_id.get();
        area.next_context_id.set(id + 1);
        let listeners = Listeners::default();
        area.contexts.borrow_mut().push((id, listeners.clone()));
        Self {
            context: Rc::new(Context { area, id, listeners }),
        }
    }

    /// Number of live contexts on this area, this one included.
    pub fn context_count(&self) -> usize {
        self.context.area.contexts.borrow().len()
    }

    /// Remove every key, like `Storage.clear()`.
    pub fn clear(&self) {
        self.context.area.entries.borrow_mut().clear();
        self.broadcast(StorageChange {
            key: None,
            new_value: None,
        });
    }

    pub fn len(&self) -> usize {
        self.context.area.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn broadcast(&self, change: StorageChange) {
        report_debug!(
            "[MemoryStorage] context {} changed {:?}",
            self.context.id,
            change.key
        );
        // Entries must not be borrowed here, listeners re-read them
        let others = self
            .context
            .area
            .contexts
            .borrow()
            .iter()
            .filter(|(context_id, _)| *context_id != self.context.id)
            .map(|(_, listeners)| listeners.clone())
            .collect::<Vec<_>>();
        for listeners in others {
            listeners.notify(&change);
        }
    }
}

impl KeyValueStore for MemoryStorage {
    fn scope(&self) -> StorageScope {
        self.context.area.scope
    }

    fn get(&self, key: &str) -> Option<String> {
        self.context.area.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.context
            .area
            .entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        self.broadcast(StorageChange {
            key: Some(key.to_owned()),
            new_value: Some(value.to_owned()),
        });
    }

    fn remove(&self, key: &str) {
        let removed = self.context.area.entries.borrow_mut().remove(key);
        if removed.is_some() {
            self.broadcast(StorageChange {
                key: Some(key.to_owned()),
                new_value: None,
            });
        }
    }

    fn subscribe(&self, listener: ChangeListener) -> StorageSubscription {
        self.context.listeners.add(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::KeyValueStoreExt;

    fn recorder(storage: &MemoryStorage) -> (Rc<RefCell<Vec<StorageChange>>>, StorageSubscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let subscription = storage.subscribe(Box::new({
            let seen = seen.clone();
            move |change| seen.borrow_mut().push(change.clone())
        }));
        (seen, subscription)
    }

    #[test]
    fn contexts_share_entries() {
        let first_tab = MemoryStorage::new(StorageScope::Session);
        let second_tab = first_tab.open_context();

        first_tab.set("log", "[\"a\"]");
        assert_eq!(second_tab.get("log").as_deref(), Some("[\"a\"]"));

        second_tab.remove("log");
        assert_eq!(first_tab.get("log"), None);
    }

    #[test]
    fn only_other_contexts_are_notified() {
        let first_tab = MemoryStorage::new(StorageScope::Session);
        let second_tab = first_tab.open_context();
        let (seen_by_first, _first_subscription) = recorder(&first_tab);
        let (seen_by_second, _second_subscription) = recorder(&second_tab);

        first_tab.set("log", "[]");

        assert!(seen_by_first.borrow().is_empty());
        assert_eq!(
            *seen_by_second.borrow(),
            vec![StorageChange {
                key: Some("log".to_owned()),
                new_value: Some("[]".to_owned()),
            }]
        );
    }

    #[test]
    fn removing_missing_key_is_silent() {
        let first_tab = MemoryStorage::new(StorageScope::Persistent);
        let second_tab = first_tab.open_context();
        let (seen, _subscription) = recorder(&second_tab);

        first_tab.remove("code");
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn clear_notifies_without_key() {
        let first_tab = MemoryStorage::new(StorageScope::Session);
        let second_tab = first_tab.open_context();
        let (seen, _subscription) = recorder(&second_tab);

        first_tab.set_json("log", &["x"]).unwrap();
        first_tab.clear();

        assert!(first_tab.is_empty());
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(seen.borrow().last().and_then(|change| change.key.clone()), None);
    }

    #[test]
    fn clones_are_the_same_context() {
        let tab = MemoryStorage::new(StorageScope::Session);
        let same_tab = tab.clone();
        let (seen, _subscription) = recorder(&tab);

        same_tab.set("log", "[]");
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn dropped_contexts_are_unregistered() {
        let first_tab = MemoryStorage::new(StorageScope::Session);
        let same_tab = first_tab.clone();
        assert_eq!(first_tab.context_count(), 1);

        for _ in 0..3 {
            let other_tab = first_tab.open_context();
            let _subscription = other_tab.subscribe(Box::new(|_| {}));
            assert_eq!(first_tab.context_count(), 2);
        }
        assert_eq!(first_tab.context_count(), 1);

        drop(same_tab);
        assert_eq!(first_tab.context_count(), 1);
        first_tab.set("log", "[]");
    }

    #[test]
    fn area_outlives_the_context_that_created_it() {
        let first_tab = MemoryStorage::new(StorageScope::Session);
        let second_tab = first_tab.open_context();
        first_tab.set("log", "[\"a\"]");
        drop(first_tab);

        assert_eq!(second_tab.context_count(), 1);
        assert_eq!(second_tab.get("log").as_deref(), Some("[\"a\"]"));
    }
}
