//! Console reporting.
//!
//! In the browser everything goes to the devtools console through zoon.
//! Native builds (tests, native hosts) go through the `log` facade instead,
//! because the console bindings only exist on `wasm32`.

#[cfg(target_arch = "wasm32")]
macro_rules! report {
    ($($arg:tt)*) => {
        zoon::println!($($arg)*)
    };
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! report {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[cfg(target_arch = "wasm32")]
macro_rules! report_error {
    ($($arg:tt)*) => {
        zoon::eprintln!($($arg)*)
    };
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! report_error {
    ($($arg:tt)*) => {
        log::error!($($arg)*)
    };
}

/// Only emits with the `debug-logging` feature.
macro_rules! report_debug {
    ($($arg:tt)*) => {
        if cfg!(feature = "debug-logging") {
            $crate::logging::report!($($arg)*);
        }
    };
}

pub(crate) use report;
pub(crate) use report_debug;
pub(crate) use report_error;
