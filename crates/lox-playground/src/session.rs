//! Everything one playground page needs, built once and passed around.

use std::rc::Rc;

use zoon::futures_util::task::LocalSpawn;
use zoon::signal::{Signal, SignalExt};

use crate::bridge::{LoadFuture, ModuleBridge, RunError};
use crate::code_buffer::CodeBuffer;
use crate::config::PlaygroundConfig;
use crate::log_store::LogStore;
use crate::module::ModuleLoader;
use crate::storage::KeyValueStore;

/// The two storage scopes a session persists into.
#[derive(Clone)]
pub struct PlaygroundStores {
    /// Editor text, survives browser restarts.
    pub persistent: Rc<dyn KeyValueStore>,
    /// Output log, lives as long as the browser session.
    pub session: Rc<dyn KeyValueStore>,
}

/// The action surface consumed by the rendering layer.
#[derive(Clone)]
pub struct PlaygroundSession {
    code: CodeBuffer,
    log: LogStore,
    bridge: ModuleBridge,
}

impl PlaygroundSession {
    pub fn new(
        config: &PlaygroundConfig,
        stores: PlaygroundStores,
        loader: impl ModuleLoader + 'static,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Self {
        let code = CodeBuffer::new(
            stores.persistent,
            config.code_key.clone(),
            config.default_code.clone(),
        );
        let log = LogStore::new(stores.session, config.log_key.clone());
        let bridge = ModuleBridge::new(loader, log.output_sink(), spawner);
        Self { code, log, bridge }
    }

    pub fn code(&self) -> &CodeBuffer {
        &self.code
    }

    pub fn log(&self) -> &LogStore {
        &self.log
    }

    pub fn bridge(&self) -> &ModuleBridge {
        &self.bridge
    }

    pub fn get_code(&self) -> String {
        self.code.get_code()
    }

    pub fn set_code(&self, text: impl Into<String>) {
        self.code.set_code(text)
    }

    pub fn reset_code(&self) {
        self.code.reset_code()
    }

    pub fn begin_load(&self) -> LoadFuture {
        self.bridge.begin_load()
    }

    pub fn is_ready(&self) -> bool {
        self.bridge.is_ready()
    }

    /// `true` while a Run control must be disabled: before the module is
    /// ready, and for good after a failed load.
    pub fn run_disabled_signal(&self) -> impl Signal<Item = bool> + use<> {
        self.bridge.ready_signal().map(|ready| !ready)
    }

    pub fn run(&self, source_text: &str) -> Result<(), RunError> {
        self.bridge.run(source_text)
    }

    /// Run whatever is in the editor.
    pub fn run_code(&self) -> Result<(), RunError> {
        let source_text = self.code.get_code();
        self.bridge.run(&source_text)
    }

    pub fn get_log(&self) -> Vec<String> {
        self.log.get_log()
    }

    pub fn clear_log(&self) {
        self.log.clear()
    }
}
