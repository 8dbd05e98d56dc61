//! Injects the game's own bootstrap script.

use js_sys::Promise;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlScriptElement};

const LOADER_MARKER: &str = "data-game-loader";

/// Pending load of the injected script.
pub struct ScriptLoad {
    src: String,
    done: Promise,
}

impl ScriptLoad {
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Resolves on the script's `load` event and fails on `error`.
    pub async fn finished(self) -> Result<(), JsValue> {
        JsFuture::from(self.done).await?;
        Ok(())
    }
}

/// Appends an async `<script src>` to the body. Must run after the host
/// module is installed. Returns `None` if a game script was already injected
/// into this document.
pub fn load_game_script(document: &Document, src: &str) -> Result<Option<ScriptLoad>, JsValue> {
    if document
        .query_selector(&format!("script[{}]", LOADER_MARKER))?
        .is_some()
    {
        log::debug!("game script already injected");
        return Ok(None);
    }

    let script = document
        .create_element("script")?
        .dyn_into::<HtmlScriptElement>()?;
    script.set_src(src);
    script.set_async(true);
    script.set_attribute(LOADER_MARKER, "")?;

    let target = script.clone();
    let done = Promise::new(&mut |resolve, reject| {
        target.set_onload(Some(&resolve));
        target.set_onerror(Some(&reject));
    });

    document
        .body()
        .ok_or_else(|| JsValue::from_str("Missing body"))?
        .append_child(&script)?;
    log::info!("loading {}", src);

    Ok(Some(ScriptLoad {
        src: src.to_string(),
        done,
    }))
}
