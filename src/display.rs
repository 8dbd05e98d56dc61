//! Canvas fitting. The game renders at its own intrinsic resolution; this
//! module scales the element so it fits a target area without distortion.

use js_sys::Array;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, HtmlCanvasElement, MutationObserver, MutationObserverInit};

use crate::{js_value_to_string, window};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FitPolicy {
    /// Scale into a constant frame with a top-left anchored transform.
    FixedFrame { width: f64, height: f64 },
    /// Scale into the window by resizing the element itself.
    Viewport,
}

/// CSS mutations for one fit computation.
#[derive(Clone, Debug, PartialEq)]
pub enum FitStyle {
    Transform { scale: f64 },
    Size { width: f64, height: f64 },
}

/// Uniform scale for fitting `game` into `target`, or `None` while the game
/// size is still unknown.
pub fn fit_scale(
    game_width: f64,
    game_height: f64,
    target_width: f64,
    target_height: f64,
) -> Option<f64> {
    if game_width <= 0.0 || game_height <= 0.0 {
        return None;
    }
    Some((target_width / game_width).min(target_height / game_height))
}

pub fn fit_style(policy: FitPolicy, game: (f64, f64), viewport: (f64, f64)) -> Option<FitStyle> {
    let (game_width, game_height) = game;
    match policy {
        FitPolicy::FixedFrame { width, height } => {
            let scale = fit_scale(game_width, game_height, width, height)?;
            Some(FitStyle::Transform { scale })
        }
        FitPolicy::Viewport => {
            let scale = fit_scale(game_width, game_height, viewport.0, viewport.1)?;
            Some(FitStyle::Size {
                width: game_width * scale,
                height: game_height * scale,
            })
        }
    }
}

fn viewport_size() -> Result<(f64, f64), JsValue> {
    let win = window();
    let width = win.inner_width()?.as_f64().unwrap_or(0.0);
    let height = win.inner_height()?.as_f64().unwrap_or(0.0);
    Ok((width, height))
}

#[derive(Clone)]
pub struct DisplayScaler {
    canvas: HtmlCanvasElement,
    policy: FitPolicy,
}

impl DisplayScaler {
    pub fn new(canvas: HtmlCanvasElement, policy: FitPolicy) -> Self {
        Self { canvas, policy }
    }

    /// Recomputes and applies the fit. Returns the applied style, or `None`
    /// when the canvas has no intrinsic size yet and nothing was touched.
    pub fn refit(&self) -> Result<Option<FitStyle>, JsValue> {
        let game = (self.canvas.width() as f64, self.canvas.height() as f64);
        let viewport = match self.policy {
            FitPolicy::Viewport => viewport_size()?,
            FitPolicy::FixedFrame { .. } => (0.0, 0.0),
        };

        let Some(style) = fit_style(self.policy, game, viewport) else {
            log::debug!("refit skipped: canvas is {}x{}", game.0, game.1);
            return Ok(None);
        };

        let css = self.canvas.style();
        match style {
            FitStyle::Transform { scale } => {
                css.set_property("transform-origin", "0 0")?;
                css.set_property("transform", &format!("scale({})", scale))?;
            }
            FitStyle::Size { width, height } => {
                css.set_property("width", &format!("{}px", width))?;
                css.set_property("height", &format!("{}px", height))?;
            }
        }
        log::debug!("refit {}x{}: {:?}", game.0, game.1, style);
        Ok(Some(style))
    }

    /// Hooks the canvas attribute and window resize signals up to `refit`,
    /// then runs one fit immediately.
    pub fn install(self) -> Result<(), JsValue> {
        let scaler_attr = self.clone();
        let on_canvas_resize = Closure::wrap(Box::new(
            move |_records: Array, _observer: MutationObserver| {
                if let Err(err) = scaler_attr.refit() {
                    log::warn!("refit after canvas resize failed: {}", js_value_to_string(&err));
                }
            },
        ) as Box<dyn FnMut(Array, MutationObserver)>);

        let observer = MutationObserver::new(on_canvas_resize.as_ref().unchecked_ref())?;
        let options = MutationObserverInit::new();
        options.set_attributes(true);
        options.set_attribute_filter(&Array::of2(
            &JsValue::from_str("width"),
            &JsValue::from_str("height"),
        ));
        observer.observe_with_options(&self.canvas, &options)?;
        on_canvas_resize.forget();

        let scaler_window = self.clone();
        let on_window_resize = Closure::wrap(Box::new(move |_event: Event| {
            if let Err(err) = scaler_window.refit() {
                log::warn!("refit after window resize failed: {}", js_value_to_string(&err));
            }
        }) as Box<dyn FnMut(_)>);
        window()
            .add_event_listener_with_callback("resize", on_window_resize.as_ref().unchecked_ref())?;
        on_window_resize.forget();

        self.refit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF_FRAME: FitPolicy = FitPolicy::FixedFrame {
        width: 336.0,
        height: 262.0,
    };

    #[test]
    fn half_size_target_scales_by_half() {
        assert_eq!(fit_scale(672.0, 524.0, 336.0, 262.0), Some(0.5));
        assert_eq!(
            fit_style(HALF_FRAME, (672.0, 524.0), (1920.0, 1080.0)),
            Some(FitStyle::Transform { scale: 0.5 })
        );
        assert_eq!(
            fit_style(FitPolicy::Viewport, (672.0, 524.0), (336.0, 262.0)),
            Some(FitStyle::Size {
                width: 336.0,
                height: 262.0
            })
        );
    }

    #[test]
    fn tighter_axis_wins() {
        // Wide viewport: height limits.
        assert_eq!(fit_scale(600.0, 400.0, 1200.0, 600.0), Some(1.5));
        // Tall viewport: width limits.
        assert_eq!(fit_scale(600.0, 400.0, 300.0, 900.0), Some(0.5));
    }

    #[test]
    fn unknown_game_size_skips() {
        assert_eq!(fit_scale(0.0, 524.0, 336.0, 262.0), None);
        assert_eq!(fit_scale(672.0, 0.0, 336.0, 262.0), None);
        assert_eq!(fit_style(HALF_FRAME, (0.0, 0.0), (0.0, 0.0)), None);
        assert_eq!(fit_style(FitPolicy::Viewport, (0.0, 300.0), (800.0, 600.0)), None);
    }
}
