//! `window.loxPlayground`, the session's action surface for browser automation.
//!
//! ```js
//! loxPlayground.setCode("print(1 + 1);");
//! if (loxPlayground.isReady()) loxPlayground.run();
//! loxPlayground.getLog(); // ["2", ...]
//! ```

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::{Closure, WasmClosure};

use crate::logging::report;
use crate::session::PlaygroundSession;

const API_NAME: &str = "loxPlayground";

pub fn install_automation_api(session: &PlaygroundSession) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let api = Object::new();

    let is_ready = {
        let session = session.clone();
        Closure::wrap(Box::new(move || session.is_ready()) as Box<dyn Fn() -> bool>)
    };
    set_function(&api, "isReady", is_ready)?;

    let get_code = {
        let session = session.clone();
        Closure::wrap(Box::new(move || session.get_code()) as Box<dyn Fn() -> String>)
    };
    set_function(&api, "getCode", get_code)?;

    let set_code = {
        let session = session.clone();
        Closure::wrap(Box::new(move |code: String| session.set_code(code)) as Box<dyn Fn(String)>)
    };
    set_function(&api, "setCode", set_code)?;

    let reset_code = {
        let session = session.clone();
        Closure::wrap(Box::new(move || session.reset_code()) as Box<dyn Fn()>)
    };
    set_function(&api, "resetCode", reset_code)?;

    // `false` when the module is not ready yet, nothing is run then
    let run = {
        let session = session.clone();
        Closure::wrap(Box::new(move || session.run_code().is_ok()) as Box<dyn Fn() -> bool>)
    };
    set_function(&api, "run", run)?;

    let get_log = {
        let session = session.clone();
        Closure::wrap(Box::new(move || {
            session
                .get_log()
                .into_iter()
                .map(JsValue::from)
                .collect::<Array>()
        }) as Box<dyn Fn() -> Array>)
    };
    set_function(&api, "getLog", get_log)?;

    let clear_log = {
        let session = session.clone();
        Closure::wrap(Box::new(move || session.clear_log()) as Box<dyn Fn()>)
    };
    set_function(&api, "clearLog", clear_log)?;

    Reflect::set(&window, &JsValue::from_str(API_NAME), &api)?;
    report!("[Playground] window.{API_NAME} installed");
    Ok(())
}

fn set_function<T: ?Sized + WasmClosure>(
    api: &Object,
    name: &str,
    closure: Closure<T>,
) -> Result<(), JsValue> {
    Reflect::set(api, &JsValue::from_str(name), closure.as_ref())?;
    // Lives as long as the page
    closure.forget();
    Ok(())
}
