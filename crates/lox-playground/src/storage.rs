//! Key-value storage shared between execution contexts (browser tabs).
//!
//! Every write is a full overwrite of its key. Other contexts learn about a
//! write through a change notification and re-read; there is no locking.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde::de::DeserializeOwned;

pub mod memory;

pub use memory::MemoryStorage;

/// How long stored values live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageScope {
    /// Cleared when the browser tab / session ends.
    Session,
    /// Survives browser restarts.
    Persistent,
}

/// A write observed from another execution context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageChange {
    /// `None` when the whole storage area was cleared.
    pub key: Option<String>,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
}

impl StorageChange {
    /// Does this change (possibly) affect `key`?
    pub fn affects(&self, key: &str) -> bool {
        self.key.as_deref().is_none_or(|changed| changed == key)
    }
}

pub type ChangeListener = Box<dyn Fn(&StorageChange)>;

/// Synchronous string storage.
///
/// Implementations never fail the caller: an unavailable backend behaves like
/// [`NoopStorage`].
pub trait KeyValueStore {
    fn scope(&self) -> StorageScope;

    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str);

    fn remove(&self, key: &str);

    /// Listen for writes made by *other* execution contexts.
    ///
    /// The listener stays registered until the returned subscription is dropped.
    fn subscribe(&self, listener: ChangeListener) -> StorageSubscription;
}

/// Typed access on top of [`KeyValueStore`], values are stored as JSON.
pub trait KeyValueStoreExt: KeyValueStore {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<Result<T, serde_json::Error>> {
        self.get(key).map(|json| serde_json::from_str(&json))
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(value)?;
        self.set(key, &json);
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

/// Keeps a change listener registered. Dropping it unsubscribes.
#[must_use = "the listener is removed when the subscription is dropped"]
pub struct StorageSubscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl StorageSubscription {
    pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// A subscription that was never attached to anything.
    pub fn inert() -> Self {
        Self { unsubscribe: None }
    }
}

impl Drop for StorageSubscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

/// Registry of change listeners for one execution context.
#[derive(Clone, Default)]
pub struct Listeners {
    slots: Rc<RefCell<ListenerSlots>>,
}

#[derive(Default)]
struct ListenerSlots {
    next_id: u64,
    listeners: Vec<(u64, Rc<dyn Fn(&StorageChange)>)>,
}

impl Listeners {
    pub fn add(&self, listener: ChangeListener) -> StorageSubscription {
        let id = {
            let mut slots = self.slots.borrow_mut();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.listeners.push((id, Rc::from(listener)));
            id
        };
        let slots: Weak<RefCell<ListenerSlots>> = Rc::downgrade(&self.slots);
        StorageSubscription::new(move || {
            if let Some(slots) = slots.upgrade() {
                slots.borrow_mut().listeners.retain(|(slot_id, _)| *slot_id != id);
            }
        })
    }

    pub fn notify(&self, change: &StorageChange) {
        // Listeners may (un)subscribe while being notified
        let listeners = self
            .slots
            .borrow()
            .listeners
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect::<Vec<_>>();
        for listener in listeners {
            listener(change);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Storage that is disabled or unavailable.
///
/// Reads return nothing, writes are dropped.
#[derive(Clone, Copy, Debug)]
pub struct NoopStorage {
    scope: StorageScope,
}

impl NoopStorage {
    pub fn new(scope: StorageScope) -> Self {
        Self { scope }
    }
}

impl KeyValueStore for NoopStorage {
    fn scope(&self) -> StorageScope {
        self.scope
    }

    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) {}

    fn remove(&self, _key: &str) {}

    fn subscribe(&self, _listener: ChangeListener) -> StorageSubscription {
        StorageSubscription::inert()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn change(key: &str) -> StorageChange {
        StorageChange {
            key: Some(key.to_owned()),
            new_value: Some("[]".to_owned()),
        }
    }

    #[test]
    fn noop_storage_drops_writes() {
        let storage = NoopStorage::new(StorageScope::Persistent);
        storage.set("code", "print(1);");
        assert_eq!(storage.get("code"), None);
        assert!(storage.get_json::<String>("code").is_none());
        assert!(storage.set_json("log", &["a"]).is_ok());
        assert_eq!(storage.get("log"), None);
    }

    #[test]
    fn change_without_key_affects_everything() {
        let cleared = StorageChange { key: None, new_value: None };
        assert!(cleared.affects("log"));
        assert!(change("log").affects("log"));
        assert!(!change("code").affects("log"));
    }

    #[test]
    fn dropping_subscription_removes_listener() {
        let listeners = Listeners::default();
        let calls = Rc::new(Cell::new(0));

        let subscription = listeners.add(Box::new({
            let calls = calls.clone();
            move |_| calls.set(calls.get() + 1)
        }));
        listeners.notify(&change("log"));
        assert_eq!(calls.get(), 1);

        drop(subscription);
        assert!(listeners.is_empty());
        listeners.notify(&change("log"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn listener_may_unsubscribe_itself_during_notify() {
        let listeners = Listeners::default();
        let own_subscription: Rc<RefCell<Option<StorageSubscription>>> = Rc::default();

        let subscription = listeners.add(Box::new({
            let own_subscription = own_subscription.clone();
            move |_| drop(own_subscription.borrow_mut().take())
        }));
        *own_subscription.borrow_mut() = Some(subscription);

        listeners.notify(&change("log"));
        assert!(listeners.is_empty());
    }
}
