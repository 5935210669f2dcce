//! Append-only output log, persisted per browser session.
//!
//! Tabs sharing the session storage reconcile by re-reading the whole log
//! whenever another tab writes it. The last write wins: if two tabs append at
//! the same time, one of the two lines can be overwritten. There is no merge.

use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use zoon::futures_signals::signal_vec::{MutableSignalVec, MutableVec};

use crate::logging::{report_debug, report_error};
use crate::module::OutputSink;
use crate::storage::{KeyValueStore, KeyValueStoreExt, StorageSubscription};

const ERROR_PREFIX: &str = "Error: ";
const PROGRESS_PREFIX: &str = "Progress: ";

/// What kind of message an output line carries, derived from its prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Output,
    Error,
    Progress,
}

impl LineKind {
    pub fn classify(line: &str) -> Self {
        if line.starts_with(ERROR_PREFIX) {
            Self::Error
        } else if line.starts_with(PROGRESS_PREFIX) {
            Self::Progress
        } else {
            Self::Output
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    pub kind: LineKind,
    pub text: String,
}

impl From<String> for LogLine {
    fn from(text: String) -> Self {
        Self {
            kind: LineKind::classify(&text),
            text,
        }
    }
}

#[derive(Clone)]
pub struct LogStore {
    inner: Rc<LogStoreInner>,
}

struct LogStoreInner {
    lines: MutableVec<String>,
    store: Rc<dyn KeyValueStore>,
    key: Cow<'static, str>,
    subscription: RefCell<Option<StorageSubscription>>,
}

impl LogStore {
    /// Restore the log stored under `key` and follow writes from other tabs.
    pub fn new(store: Rc<dyn KeyValueStore>, key: impl Into<Cow<'static, str>>) -> Self {
        let key = key.into();
        let lines = read_lines(store.as_ref(), &key).unwrap_or_default();
        let inner = Rc::new(LogStoreInner {
            lines: MutableVec::new_with_values(lines),
            store,
            key,
            subscription: RefCell::new(None),
        });

        let weak_inner: Weak<LogStoreInner> = Rc::downgrade(&inner);
        let subscription = inner.store.subscribe(Box::new(move |change| {
            let Some(inner) = weak_inner.upgrade() else {
                return;
            };
            if change.affects(&inner.key) {
                inner.reconcile();
            }
        }));
        *inner.subscription.borrow_mut() = Some(subscription);

        Self { inner }
    }

    /// Current lines, oldest first.
    pub fn get_log(&self) -> Vec<String> {
        self.inner.lines.lock_ref().to_vec()
    }

    pub fn entries(&self) -> Vec<LogLine> {
        self.inner
            .lines
            .lock_ref()
            .iter()
            .cloned()
            .map(LogLine::from)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lines.lock_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn append(&self, line: impl Into<String>) {
        let mut lines = self.inner.lines.lock_mut();
        lines.push_cloned(line.into());
        self.inner.persist(&lines);
    }

    pub fn clear(&self) {
        let mut lines = self.inner.lines.lock_mut();
        lines.clear();
        self.inner.persist(&lines);
    }

    /// Replace the in-memory log with the persisted one.
    pub fn reconcile(&self) {
        self.inner.reconcile();
    }

    /// The module's output channel, appending every emitted line.
    pub fn output_sink(&self) -> OutputSink {
        let log = self.clone();
        OutputSink::new(move |line| log.append(line))
    }

    pub fn lines_signal_vec(&self) -> MutableSignalVec<String> {
        self.inner.lines.signal_vec_cloned()
    }
}

impl LogStoreInner {
    fn persist(&self, lines: &[String]) {
        report_debug!("[LogStore] storing {} lines under '{}'", lines.len(), self.key);
        if let Err(error) = self.store.set_json(&self.key, lines) {
            report_error!("Failed to store log: {error:#}");
        }
    }

    fn reconcile(&self) {
        // A removed or unreadable log reconciles to empty
        let persisted = read_lines(self.store.as_ref(), &self.key).unwrap_or_default();
        report_debug!("[LogStore] reconciled to {} persisted lines", persisted.len());
        let mut lines = self.lines.lock_mut();
        if lines[..] != persisted[..] {
            lines.replace_cloned(persisted);
        }
    }
}

fn read_lines(store: &dyn KeyValueStore, key: &str) -> Option<Vec<String>> {
    match store.get_json::<Vec<String>>(key)? {
        Ok(lines) => Some(lines),
        Err(error) => {
            report_error!("Failed to deserialize stored log '{key}': {error:#}");
            None
        }
    }
}
