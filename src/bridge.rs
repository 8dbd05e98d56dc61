//! Host module object read by the embedded game binary at startup.

use js_sys::{Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, HtmlCanvasElement, HtmlElement};

use crate::{js_value_to_string, set_boot_status, window};

pub const MODULE_GLOBAL: &str = "Module";
const CONTEXT_LOST_MESSAGE: &str = "WebGL context lost. Please reload the page.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusDisplay {
    Hidden,
    Text(String),
}

/// Maps a `setStatus` argument to what the status element should show.
pub fn status_display(text: Option<&str>) -> StatusDisplay {
    match text {
        None | Some("") => StatusDisplay::Hidden,
        Some(text) => match download_progress(text) {
            Some(percent) => StatusDisplay::Text(format!("Downloading... {}%", percent)),
            None => StatusDisplay::Text(text.to_string()),
        },
    }
}

/// Finds the first `(current/total)` group and returns the rounded percentage.
pub fn download_progress(text: &str) -> Option<u64> {
    text.match_indices('(').find_map(|(at, _)| {
        let rest = &text[at + 1..];
        let (current, rest) = leading_digits(rest)?;
        let rest = rest.strip_prefix('/')?;
        let (total, rest) = leading_digits(rest)?;
        if !rest.starts_with(')') || total == 0.0 {
            return None;
        }
        // Math.round semantics: halves go up.
        Some((current * 100.0 / total + 0.5).floor() as u64)
    })
}

/// Digit runs are read as f64 so arbitrarily long counts still parse.
fn leading_digits(text: &str) -> Option<(f64, &str)> {
    let end = text
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(text.len(), |(i, _)| i);
    if end == 0 {
        return None;
    }
    let value = text[..end].parse::<f64>().ok()?;
    Some((value, &text[end..]))
}

/// The status indicator is hidden exactly when no dependencies remain.
pub fn dependencies_done(left: Option<f64>) -> bool {
    left == Some(0.0)
}

fn apply_status(status: &HtmlElement, display: StatusDisplay) {
    match display {
        StatusDisplay::Hidden => {
            let _ = status.style().set_property("display", "none");
        }
        StatusDisplay::Text(text) => status.set_text_content(Some(&text)),
    }
}

fn set_callback<F>(module: &Object, name: &str, callback: F) -> Result<(), JsValue>
where
    F: FnMut(JsValue) + 'static,
{
    let closure = Closure::wrap(Box::new(callback) as Box<dyn FnMut(JsValue)>);
    Reflect::set(module, &JsValue::from_str(name), closure.as_ref())?;
    closure.forget();
    Ok(())
}

/// Builds the host module object and publishes it as `window.Module`.
pub fn install_host_module(
    canvas: &HtmlCanvasElement,
    status: &HtmlElement,
) -> Result<Object, JsValue> {
    let module = Object::new();
    Reflect::set(&module, &JsValue::from_str("canvas"), canvas)?;

    set_callback(&module, "print", |text| {
        log::info!("{}", js_value_to_string(&text));
    })?;
    set_callback(&module, "printErr", |text| {
        log::error!("{}", js_value_to_string(&text));
    })?;

    let status_text = status.clone();
    set_callback(&module, "setStatus", move |text| {
        let text = text.as_string();
        log::debug!("setStatus {:?}", text);
        apply_status(&status_text, status_display(text.as_deref()));
    })?;

    let status_deps = status.clone();
    set_callback(&module, "monitorRunDependencies", move |left| {
        log::debug!("run dependencies left: {}", js_value_to_string(&left));
        if dependencies_done(left.as_f64()) {
            apply_status(&status_deps, StatusDisplay::Hidden);
            if let Some(document) = window().document() {
                set_boot_status(&document, "running");
            }
        }
    })?;

    Reflect::set(&window(), &JsValue::from_str(MODULE_GLOBAL), &module)?;
    log::info!("host module installed");
    Ok(module)
}

/// The embedded binary cannot rebuild its GL state, so a lost context means
/// a reload: tell the user and keep the browser from attempting a restore.
pub fn install_context_loss_guard(canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
    let on_ctxlost = Closure::wrap(Box::new(move |event: Event| {
        log::error!("webglcontextlost");
        if let Some(document) = window().document() {
            set_boot_status(&document, "context_lost");
        }
        if let Err(err) = window().alert_with_message(CONTEXT_LOST_MESSAGE) {
            log::warn!("alert failed: {}", js_value_to_string(&err));
        }
        event.prevent_default();
    }) as Box<dyn FnMut(_)>);

    canvas.add_event_listener_with_callback(
        "webglcontextlost",
        on_ctxlost.as_ref().unchecked_ref(),
    )?;
    on_ctxlost.forget();
    Ok(())
}
