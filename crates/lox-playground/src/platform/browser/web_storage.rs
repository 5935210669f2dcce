//! `window.sessionStorage` / `window.localStorage` backends.
//!
//! Writes from other tabs arrive as `storage` events on the window, which are
//! forwarded to the subscribed listeners.

use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Storage, StorageEvent, Window};

use crate::logging::{report_debug, report_error};
use crate::storage::{
    ChangeListener, KeyValueStore, Listeners, NoopStorage, StorageChange, StorageScope,
    StorageSubscription,
};

pub struct WebStorage {
    scope: StorageScope,
    storage: Storage,
    listeners: Listeners,
    _storage_events: Option<StorageEventListener>,
}

impl WebStorage {
    /// The storage area for `scope`, or a [`NoopStorage`] when the browser
    /// refuses access (disabled storage, sandboxed iframe, ...).
    pub fn open(scope: StorageScope) -> Rc<dyn KeyValueStore> {
        match Self::try_open(scope) {
            Some(storage) => Rc::new(storage),
            None => {
                report_error!("{scope:?} web storage is unavailable, nothing will be persisted");
                Rc::new(NoopStorage::new(scope))
            }
        }
    }

    pub fn try_open(scope: StorageScope) -> Option<Self> {
        let window = web_sys::window()?;
        let storage = match scope {
            StorageScope::Session => window.session_storage(),
            StorageScope::Persistent => window.local_storage(),
        }
        .ok()??;
        let listeners = Listeners::default();
        let storage_events = StorageEventListener::attach(&window, storage.clone(), listeners.clone());
        Some(Self {
            scope,
            storage,
            listeners,
            _storage_events: storage_events,
        })
    }
}

impl KeyValueStore for WebStorage {
    fn scope(&self) -> StorageScope {
        self.scope
    }

    fn get(&self, key: &str) -> Option<String> {
        match self.storage.get_item(key) {
            Ok(value) => value,
            Err(error) => {
                report_error!("Failed to read '{key}' from {:?} storage: {error:?}", self.scope);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        // Typically a full quota, the value is dropped
        if let Err(error) = self.storage.set_item(key, value) {
            report_error!("Failed to store '{key}' in {:?} storage: {error:?}", self.scope);
        }
    }

    fn remove(&self, key: &str) {
        if let Err(error) = self.storage.remove_item(key) {
            report_error!("Failed to remove '{key}' from {:?} storage: {error:?}", self.scope);
        }
    }

    fn subscribe(&self, listener: ChangeListener) -> StorageSubscription {
        self.listeners.add(listener)
    }
}

/// `storage` event handler registered on the window, removed on drop.
struct StorageEventListener {
    window: Window,
    closure: Closure<dyn FnMut(StorageEvent)>,
}

impl StorageEventListener {
    fn attach(window: &Window, storage: Storage, listeners: Listeners) -> Option<Self> {
        let closure = Closure::wrap(Box::new(move |event: StorageEvent| {
            // The window receives events for both storage areas
            let same_area = event
                .storage_area()
                .is_some_and(|area| js_sys::Object::is(&area, &storage));
            if !same_area {
                return;
            }
            let change = StorageChange {
                key: event.key(),
                new_value: event.new_value(),
            };
            report_debug!("[WebStorage] storage event for {:?}", change.key);
            listeners.notify(&change);
        }) as Box<dyn FnMut(StorageEvent)>);

        if let Err(error) =
            window.add_event_listener_with_callback("storage", closure.as_ref().unchecked_ref())
        {
            report_error!("Failed to listen for storage events: {error:?}");
            return None;
        }
        Some(Self {
            window: window.clone(),
            closure,
        })
    }
}

impl Drop for StorageEventListener {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("storage", self.closure.as_ref().unchecked_ref());
    }
}
