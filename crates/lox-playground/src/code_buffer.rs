//! The editable source text.

use std::borrow::Cow;
use std::rc::Rc;

use zoon::Mutable;
use zoon::signal::MutableSignalCloned;

use crate::logging::report_debug;
use crate::storage::KeyValueStore;

/// Current editor text, written through to cross-session storage on every change.
///
/// The text is stored as is, not JSON-encoded.
#[derive(Clone)]
pub struct CodeBuffer {
    text: Mutable<Rc<Cow<'static, str>>>,
    default_code: Rc<Cow<'static, str>>,
    store: Rc<dyn KeyValueStore>,
    key: Cow<'static, str>,
}

impl CodeBuffer {
    /// Restore the text stored under `key`, or start from `default_code`.
    pub fn new(
        store: Rc<dyn KeyValueStore>,
        key: impl Into<Cow<'static, str>>,
        default_code: impl Into<Cow<'static, str>>,
    ) -> Self {
        let key = key.into();
        let default_code = Rc::new(default_code.into());
        let text = match store.get(&key) {
            Some(stored) => Rc::new(Cow::Owned(stored)),
            None => Rc::clone(&default_code),
        };
        Self {
            text: Mutable::new(text),
            default_code,
            store,
            key,
        }
    }

    pub fn get_code(&self) -> String {
        self.text.lock_ref().to_string()
    }

    pub fn set_code(&self, text: impl Into<String>) {
        let text = Rc::new(Cow::Owned(text.into()));
        self.persist(&text);
        self.text.set(text);
    }

    /// Back to the default the buffer was created with.
    pub fn reset_code(&self) {
        let default_code = Rc::clone(&self.default_code);
        self.persist(&default_code);
        self.text.set(default_code);
    }

    pub fn default_code(&self) -> &str {
        &self.default_code
    }

    pub fn code_signal(&self) -> MutableSignalCloned<Rc<Cow<'static, str>>> {
        self.text.signal_cloned()
    }

    fn persist(&self, text: &str) {
        report_debug!("[CodeBuffer] storing {} bytes under '{}'", text.len(), self.key);
        self.store.set(&self.key, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CODE_STORAGE_KEY, DEFAULT_CODE};
    use crate::storage::{MemoryStorage, NoopStorage, StorageScope};

    fn buffer(storage: &MemoryStorage) -> CodeBuffer {
        CodeBuffer::new(Rc::new(storage.clone()), CODE_STORAGE_KEY, DEFAULT_CODE)
    }

    #[test]
    fn starts_with_default_example() {
        let storage = MemoryStorage::new(StorageScope::Persistent);
        let code = buffer(&storage);
        assert_eq!(code.get_code(), DEFAULT_CODE);
        assert!(code.get_code().contains("test_variable"));
    }

    #[test]
    fn set_code_survives_reload() {
        let storage = MemoryStorage::new(StorageScope::Persistent);
        buffer(&storage).set_code("print(1+1);");

        let reloaded = buffer(&storage);
        assert_eq!(reloaded.get_code(), "print(1+1);");
    }

    #[test]
    fn reset_restores_default_not_stored_value() {
        let storage = MemoryStorage::new(StorageScope::Persistent);
        buffer(&storage).set_code("print(\"stored\");");

        let code = buffer(&storage);
        code.set_code("print(2);");
        code.set_code("print(3);");
        code.reset_code();

        assert_eq!(code.get_code(), DEFAULT_CODE);
        assert_eq!(buffer(&storage).get_code(), DEFAULT_CODE);
    }

    #[test]
    fn code_is_stored_as_plain_text() {
        let storage = MemoryStorage::new(StorageScope::Persistent);
        buffer(&storage).set_code("print(\"hi\");");
        assert_eq!(storage.get(CODE_STORAGE_KEY).as_deref(), Some("print(\"hi\");"));

        // Written by another tool, not JSON
        storage.set(CODE_STORAGE_KEY, "print(1);\nprint(2);");
        assert_eq!(buffer(&storage).get_code(), "print(1);\nprint(2);");
    }

    #[test]
    fn works_without_storage() {
        let code = CodeBuffer::new(
            Rc::new(NoopStorage::new(StorageScope::Persistent)),
            CODE_STORAGE_KEY,
            "print(0);",
        );
        code.set_code("print(1);");
        assert_eq!(code.get_code(), "print(1);");
        code.reset_code();
        assert_eq!(code.get_code(), "print(0);");
    }
}
