//! File-based cross-session storage, one file per key.
//!
//! Writes go to a sibling `.tmp` file that is renamed over the value, so a
//! crash mid-write leaves the previous value readable.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::logging::report_error;
use crate::storage::{ChangeListener, KeyValueStore, StorageScope, StorageSubscription};

const TMP_SUFFIX: &str = ".tmp";

pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// `None` for keys that are not a single plain file name (`..`, `a/b`, ...).
    fn path(&self, key: &str) -> Option<PathBuf> {
        let mut components = Path::new(key).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if !key.ends_with(TMP_SUFFIX) => {
                Some(self.base_path.join(name))
            }
            _ => None,
        }
    }

    fn save(&self, path: &Path, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.base_path)?;
        let mut tmp_path = path.as_os_str().to_owned();
        tmp_path.push(TMP_SUFFIX);
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, path)
    }
}

impl KeyValueStore for FileStorage {
    fn scope(&self) -> StorageScope {
        StorageScope::Persistent
    }

    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)?).ok()
    }

    fn set(&self, key: &str, value: &str) {
        let Some(path) = self.path(key) else {
            report_error!("Refusing to store invalid key '{key}'");
            return;
        };
        if let Err(error) = self.save(&path, value) {
            report_error!("Failed to store '{key}' in {}: {error}", self.base_path.display());
        }
    }

    fn remove(&self, key: &str) {
        let Some(path) = self.path(key) else {
            return;
        };
        match fs::remove_file(path) {
            Err(error) if error.kind() != io::ErrorKind::NotFound => {
                report_error!("Failed to remove '{key}' from {}: {error}", self.base_path.display());
            }
            _ => {}
        }
    }

    /// Files carry no change notifications, a single process is the only writer.
    fn subscribe(&self, _listener: ChangeListener) -> StorageSubscription {
        StorageSubscription::inert()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::code_buffer::CodeBuffer;
    use crate::config::{CODE_STORAGE_KEY, DEFAULT_CODE};

    #[test]
    fn values_survive_new_instances() {
        let dir = tempfile::tempdir().unwrap();
        FileStorage::new(dir.path()).set("code", "print(1+1);");

        let storage = FileStorage::new(dir.path());
        assert_eq!(storage.get("code").as_deref(), Some("print(1+1);"));

        storage.remove("code");
        assert_eq!(storage.get("code"), None);
        storage.remove("code");
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("state"));
        storage.set("log", "[]");
        assert_eq!(storage.get("log").as_deref(), Some("[]"));
    }

    #[test]
    fn code_buffer_across_process_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let open = || CodeBuffer::new(Rc::new(FileStorage::new(dir.path())), CODE_STORAGE_KEY, DEFAULT_CODE);

        assert_eq!(open().get_code(), DEFAULT_CODE);
        open().set_code("print(1+1);");
        assert_eq!(open().get_code(), "print(1+1);");
    }

    #[test]
    fn unwritable_location_degrades_to_dropped_writes() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let storage = FileStorage::new(blocker.join("state"));
        storage.set("code", "\"lost\"");
        assert_eq!(storage.get("code"), None);
    }

    #[test]
    fn overwrite_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.set("log", "[\"a\"]");
        storage.set("log", "[\"a\",\"b\"]");

        assert_eq!(storage.get("log").as_deref(), Some("[\"a\",\"b\"]"));
        let names = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(names, ["log"]);
    }

    #[test]
    fn interrupted_write_keeps_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.set("code", "print(1);");
        // What a crash between write and rename leaves behind
        fs::write(dir.path().join("code.tmp"), "print(").unwrap();

        assert_eq!(FileStorage::new(dir.path()).get("code").as_deref(), Some("print(1);"));
    }

    #[test]
    fn keys_cannot_escape_the_base_directory() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("state");
        let storage = FileStorage::new(&base);

        for key in ["../escaped", "nested/key", "/absolute", "..", "", "code.tmp"] {
            storage.set(key, "x");
            assert_eq!(storage.get(key), None, "key {key:?}");
            storage.remove(key);
        }
        assert!(!dir.path().join("escaped").exists());
        assert!(!base.exists());
    }
}
