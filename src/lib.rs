//! Browser bootstrap for the embedded pinball binary.
//!
//! Installs the host `Module` object the binary reads at startup, keeps the
//! canvas fitted to its display area, replays controller input as keyboard
//! events, and finally injects the binary's loader script.

pub mod bridge;
pub mod config;
pub mod display;
pub mod input;
pub mod loader;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, HtmlCanvasElement, HtmlElement, Window};

use crate::config::{BootConfig, CANVAS_ID, STATUS_ID};
use crate::display::DisplayScaler;

pub(crate) fn window() -> Window {
    web_sys::window().expect("missing window")
}

pub(crate) fn js_value_to_string(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

pub(crate) fn set_boot_status(document: &Document, status: &str) {
    if let Some(el) = document.document_element() {
        let _ = el.set_attribute("data-boot-status", status);
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let search = web_sys::window()
        .and_then(|win| win.location().search().ok())
        .unwrap_or_default();
    let config = BootConfig::from_query(&search);
    if console_log::init_with_level(config.log_level).is_err() {
        web_sys::console::warn_1(&JsValue::from_str("logger already initialized"));
    }

    if let Err(err) = start_impl(&config) {
        let message = format!("fatal: {}", js_value_to_string(&err));

        if let Some(win) = web_sys::window() {
            if let Some(doc) = win.document() {
                set_boot_status(&doc, "error");
                if let Some(status) = doc.get_element_by_id(STATUS_ID) {
                    status.set_text_content(Some(&message));
                }
            }
        }

        web_sys::console::error_1(&err);
    }
}

fn start_impl(config: &BootConfig) -> Result<(), JsValue> {
    let win = window();
    let document = win
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    log::debug!("boot config: {:?}", config);

    let canvas = document
        .get_element_by_id(CANVAS_ID)
        .ok_or_else(|| JsValue::from_str("Missing canvas"))?
        .dyn_into::<HtmlCanvasElement>()?;
    let status = document
        .get_element_by_id(STATUS_ID)
        .ok_or_else(|| JsValue::from_str("Missing status element"))?
        .dyn_into::<HtmlElement>()?;

    set_boot_status(&document, "loading");

    bridge::install_host_module(&canvas, &status)?;
    bridge::install_context_loss_guard(&canvas)?;
    DisplayScaler::new(canvas, config.fit).install()?;
    input::start_input_loop(
        document.clone(),
        config.layout,
        input::controller_source(config.source),
    )?;

    if let Some(load) = loader::load_game_script(&document, &config.game_script_url)? {
        spawn_local(async move {
            let src = load.src().to_string();
            match load.finished().await {
                Ok(()) => log::info!("{} loaded", src),
                Err(err) => {
                    log::error!("failed to load {}: {}", src, js_value_to_string(&err));
                    if let Some(doc) = web_sys::window().and_then(|win| win.document()) {
                        set_boot_status(&doc, "error");
                    }
                }
            }
        });
    }

    Ok(())
}
