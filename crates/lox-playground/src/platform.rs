pub mod browser;

#[cfg(not(target_arch = "wasm32"))]
pub mod native;
