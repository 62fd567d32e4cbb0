mod api;
mod app;
mod auto_expand;
mod components;
mod config;
mod expansion;
mod logging;
mod models;
mod pages;
mod state;
mod storage;
mod stores;
mod tree;

use crate::app::App;
use crate::config::EnvConfig;
use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    logging::init_logging(&EnvConfig::from_window());
    tracing::debug!("mounting app");
    mount_to_body(App);
}
