//! Browser glue: web storage, the wasm interpreter module, zoon tasks.
//!
//! Everything here calls browser APIs and only works on `wasm32`.

use std::rc::Rc;

use crate::config::PlaygroundConfig;
use crate::session::{PlaygroundSession, PlaygroundStores};
use crate::storage::StorageScope;

pub mod api;
pub mod task_spawner;
pub mod wasm_module;
pub mod web_storage;

pub use api::install_automation_api;
pub use task_spawner::TaskSpawner;
pub use wasm_module::WasmModuleLoader;
pub use web_storage::WebStorage;

/// Open both storage scopes, build the session and start loading the module.
pub fn start(config: &PlaygroundConfig) -> PlaygroundSession {
    let stores = PlaygroundStores {
        persistent: WebStorage::open(StorageScope::Persistent),
        session: WebStorage::open(StorageScope::Session),
    };
    let session = PlaygroundSession::new(
        config,
        stores,
        WasmModuleLoader::new(config.module_url.clone()),
        Rc::new(TaskSpawner),
    );
    // The load is already spawned, nobody has to await it
    drop(session.begin_load());
    session
}
