//! One-shot loading of the interpreter module and gated execution.
//!
//! ```text
//! Uninitialized --begin_load--> Loading --ok--> Ready
//!                                  |
//!                                  +---err---> Failed
//! ```
//!
//! Only the first `begin_load` calls the loader. Callers arriving while the
//! module is loading get the same in-flight future. `Ready` and `Failed` are
//! final for the lifetime of the bridge; a failed load is never retried.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use zoon::Mutable;
use zoon::futures_util::future::{self, FutureExt, LocalBoxFuture, Shared};
use zoon::futures_util::task::{LocalSpawn, LocalSpawnExt};
use zoon::signal::{MutableSignal, MutableSignalCloned};

use crate::logging::{report, report_debug, report_error};
use crate::module::{LoadError, ModuleHandle, ModuleLoader, OutputSink};

/// Resolves once the module is ready or has failed to load.
pub type LoadFuture = Shared<LocalBoxFuture<'static, Result<(), LoadError>>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleStatus {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            ModuleStatus::Uninitialized => "uninitialized",
            ModuleStatus::Loading => "loading",
            ModuleStatus::Ready => "ready",
            ModuleStatus::Failed => "failed",
        };
        f.write_str(status)
    }
}

/// `run` was called while the module could not execute anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunError {
    NotReady { status: ModuleStatus },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::NotReady { status } => {
                write!(f, "interpreter module is not ready (status: {status})")
            }
        }
    }
}

impl std::error::Error for RunError {}

enum ModuleState {
    Uninitialized,
    Loading(LoadFuture),
    Ready(Rc<dyn ModuleHandle>),
    Failed(LoadError),
}

impl ModuleState {
    fn status(&self) -> ModuleStatus {
        match self {
            ModuleState::Uninitialized => ModuleStatus::Uninitialized,
            ModuleState::Loading(_) => ModuleStatus::Loading,
            ModuleState::Ready(_) => ModuleStatus::Ready,
            ModuleState::Failed(_) => ModuleStatus::Failed,
        }
    }
}

/// Sole owner of the interpreter module handle.
#[derive(Clone)]
pub struct ModuleBridge {
    inner: Rc<BridgeInner>,
}

struct BridgeInner {
    loader: Box<dyn ModuleLoader>,
    output: OutputSink,
    spawner: Rc<dyn LocalSpawn>,
    state: RefCell<ModuleState>,
    ready: Mutable<bool>,
    load_error: Mutable<Option<LoadError>>,
}

impl ModuleBridge {
    /// `output` is handed to the module during initialization; `spawner`
    /// drives the load in the background.
    pub fn new(
        loader: impl ModuleLoader + 'static,
        output: OutputSink,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Self {
        Self {
            inner: Rc::new(BridgeInner {
                loader: Box::new(loader),
                output,
                spawner,
                state: RefCell::new(ModuleState::Uninitialized),
                ready: Mutable::new(false),
                load_error: Mutable::new(None),
            }),
        }
    }

    /// Start loading the module unless that already happened.
    ///
    /// The returned future does not have to be awaited, the load runs on the
    /// spawner either way.
    pub fn begin_load(&self) -> LoadFuture {
        let load = {
            let mut state = self.inner.state.borrow_mut();
            match &*state {
                ModuleState::Loading(load) => {
                    report_debug!("[ModuleBridge] begin_load while loading, joining in-flight load");
                    return load.clone();
                }
                ModuleState::Ready(_) => return resolved(Ok(())),
                ModuleState::Failed(error) => return resolved(Err(error.clone())),
                ModuleState::Uninitialized => {}
            }
            report!("[ModuleBridge] Loading interpreter module");
            let initialize = self.inner.loader.initialize(self.inner.output.clone());
            let load = finish_load(Rc::downgrade(&self.inner), initialize)
                .boxed_local()
                .shared();
            *state = ModuleState::Loading(load.clone());
            load
        };

        if let Err(error) = self.inner.spawner.spawn_local(load.clone().map(|_| ())) {
            let error = LoadError::Spawn(error.to_string());
            self.inner.fail(error.clone());
            return resolved(Err(error));
        }
        load
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.get()
    }

    pub fn ready_signal(&self) -> MutableSignal<bool> {
        self.inner.ready.signal()
    }

    pub fn status(&self) -> ModuleStatus {
        self.inner.state.borrow().status()
    }

    pub fn load_error(&self) -> Option<LoadError> {
        self.inner.load_error.get_cloned()
    }

    pub fn load_error_signal(&self) -> MutableSignalCloned<Option<LoadError>> {
        self.inner.load_error.signal_cloned()
    }

    /// Hand `source_text`, unmodified, to the module.
    ///
    /// Callers must only run once [`is_ready`](Self::is_ready) is true;
    /// otherwise this is rejected with [`RunError::NotReady`]. Output arrives
    /// through the module's output sink, not through the return value.
    pub fn run(&self, source_text: &str) -> Result<(), RunError> {
        let handle = match &*self.inner.state.borrow() {
            ModuleState::Ready(handle) => Rc::clone(handle),
            state => {
                return Err(RunError::NotReady {
                    status: state.status(),
                });
            }
        };
        report_debug!("[ModuleBridge] executing {} bytes", source_text.len());
        handle.execute(source_text);
        Ok(())
    }
}

impl BridgeInner {
    fn become_ready(&self, handle: Rc<dyn ModuleHandle>) {
        *self.state.borrow_mut() = ModuleState::Ready(handle);
        self.ready.set(true);
        report!("[ModuleBridge] Interpreter module ready");
    }

    fn fail(&self, error: LoadError) {
        report_error!("Interpreter module failed to load: {error}");
        *self.state.borrow_mut() = ModuleState::Failed(error.clone());
        self.load_error.set(Some(error));
    }
}

async fn finish_load(
    inner: Weak<BridgeInner>,
    initialize: LocalBoxFuture<'static, Result<Rc<dyn ModuleHandle>, LoadError>>,
) -> Result<(), LoadError> {
    let result = initialize.await;
    let Some(inner) = inner.upgrade() else {
        return result.map(|_| ());
    };
    match result {
        Ok(handle) => {
            inner.become_ready(handle);
            Ok(())
        }
        Err(error) => {
            inner.fail(error.clone());
            Err(error)
        }
    }
}

fn resolved(result: Result<(), LoadError>) -> LoadFuture {
    future::ready(result).boxed_local().shared()
}
