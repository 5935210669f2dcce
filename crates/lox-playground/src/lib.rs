//! Core of the Lox browser playground.
//!
//! Loads the compiled interpreter module once, gates execution until it is
//! ready, and keeps the editor text and the output log in web storage so they
//! survive reloads and stay in sync across tabs.

mod logging;

pub mod bridge;
pub mod code_buffer;
pub mod config;
pub mod log_store;
pub mod module;
pub mod platform;
pub mod session;
pub mod storage;

pub use zoon;

pub use bridge::{LoadFuture, ModuleBridge, ModuleStatus, RunError};
pub use code_buffer::CodeBuffer;
pub use config::PlaygroundConfig;
pub use log_store::{LineKind, LogLine, LogStore};
pub use module::{LoadError, ModuleHandle, ModuleLoader, OutputSink};
pub use session::{PlaygroundSession, PlaygroundStores};
pub use storage::{KeyValueStore, KeyValueStoreExt, MemoryStorage, NoopStorage, StorageScope};
