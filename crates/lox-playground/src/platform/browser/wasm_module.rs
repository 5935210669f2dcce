//! Loads the interpreter compiled with wasm-bindgen.
//!
//! The module's JS glue is imported dynamically. It must export:
//! - `default()`: the wasm-bindgen `init`, fetching and instantiating the binary
//! - `run(source)`: executes a program
//! - `set_output(callback)`: registers the callback receiving output lines

use std::borrow::Cow;
use std::rc::Rc;

use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use zoon::futures_util::future::{FutureExt, LocalBoxFuture};

use crate::logging::report;
use crate::module::{LoadError, ModuleHandle, ModuleLoader, OutputSink};

#[wasm_bindgen(inline_js = "export function import_module(url) { return import(url); }")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn import_module(url: &str) -> Result<Promise, JsValue>;
}

pub struct WasmModuleLoader {
    module_url: Cow<'static, str>,
}

impl WasmModuleLoader {
    pub fn new(module_url: impl Into<Cow<'static, str>>) -> Self {
        Self {
            module_url: module_url.into(),
        }
    }
}

impl ModuleLoader for WasmModuleLoader {
    fn initialize(
        &self,
        output: OutputSink,
    ) -> LocalBoxFuture<'static, Result<Rc<dyn ModuleHandle>, LoadError>> {
        let module_url = self.module_url.to_string();
        async move {
            report!("[WasmModuleLoader] Importing {module_url}");
            let import = import_module(&module_url).map_err(|error| LoadError::Import(describe(&error)))?;
            let module = JsFuture::from(import)
                .await
                .map_err(|error| LoadError::Import(describe(&error)))?;

            let init = export(&module, "default")?;
            let initialized = init
                .call0(&JsValue::NULL)
                .map_err(|error| LoadError::Instantiate(describe(&error)))?;
            JsFuture::from(Promise::resolve(&initialized))
                .await
                .map_err(|error| LoadError::Instantiate(describe(&error)))?;

            let run = export(&module, "run")?;
            let set_output = export(&module, "set_output")?;
            let on_output = Closure::wrap(Box::new({
                let output = output.clone();
                move |line: String| output.emit(line)
            }) as Box<dyn Fn(String)>);
            set_output
                .call1(&JsValue::NULL, on_output.as_ref())
                .map_err(|error| LoadError::Instantiate(describe(&error)))?;

            Ok::<_, LoadError>(Rc::new(WasmModuleHandle {
                run,
                output,
                _on_output: on_output,
            }) as Rc<dyn ModuleHandle>)
        }
        .boxed_local()
    }
}

struct WasmModuleHandle {
    run: Function,
    output: OutputSink,
    // The module calls into this closure for as long as the handle lives
    _on_output: Closure<dyn Fn(String)>,
}

impl ModuleHandle for WasmModuleHandle {
    fn execute(&self, source_text: &str) {
        // A panicking interpreter surfaces as a thrown `RuntimeError`
        if let Err(error) = self.run.call1(&JsValue::NULL, &JsValue::from_str(source_text)) {
            self.output.emit(format!("Error: {}", describe(&error)));
        }
    }
}

fn export(module: &JsValue, name: &'static str) -> Result<Function, LoadError> {
    Reflect::get(module, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
        .ok_or(LoadError::MissingExport(name))
}

fn describe(error: &JsValue) -> String {
    if let Some(error) = error.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    error.as_string().unwrap_or_else(|| format!("{error:?}"))
}
