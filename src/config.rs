//! Boot configuration: compiled-in defaults with page query overrides.
//!
//! Recognised keys: `fit=fixed|viewport`, `frame=WxH`, `players=1|2`,
//! `pad=global|gamepad|off`, `game=<url>`, `log=<level>`. Anything that does
//! not parse keeps its default.

use crate::display::FitPolicy;
use crate::input::{Layout, SourceKind};

pub const CANVAS_ID: &str = "canvas";
pub const STATUS_ID: &str = "status";
pub const GAME_SCRIPT_URL: &str = "/SpaceCadetPinball.js";
pub const FRAME_WIDTH: f64 = 336.0;
pub const FRAME_HEIGHT: f64 = 262.0;

#[derive(Clone, Debug, PartialEq)]
pub struct BootConfig {
    pub fit: FitPolicy,
    pub layout: Layout,
    pub source: SourceKind,
    pub game_script_url: String,
    pub log_level: log::Level,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            fit: FitPolicy::FixedFrame {
                width: FRAME_WIDTH,
                height: FRAME_HEIGHT,
            },
            layout: Layout::OnePlayer,
            source: SourceKind::GlobalPlayers,
            game_script_url: GAME_SCRIPT_URL.to_string(),
            log_level: log::Level::Info,
        }
    }
}

impl BootConfig {
    /// Builds a config from `location.search` (with or without the leading `?`).
    pub fn from_query(search: &str) -> Self {
        let mut config = Self::default();
        let mut viewport = false;
        let mut frame = (FRAME_WIDTH, FRAME_HEIGHT);

        for (key, value) in query_pairs(search) {
            match key {
                "fit" => match value {
                    "viewport" => viewport = true,
                    "fixed" => viewport = false,
                    _ => {}
                },
                "frame" => {
                    if let Some(parsed) = parse_frame(value) {
                        frame = parsed;
                    }
                }
                "players" => match value {
                    "1" => config.layout = Layout::OnePlayer,
                    "2" => config.layout = Layout::TwoPlayer,
                    _ => {}
                },
                "pad" => match value {
                    "global" => config.source = SourceKind::GlobalPlayers,
                    "gamepad" => config.source = SourceKind::GamepadApi,
                    "off" => config.source = SourceKind::Disabled,
                    _ => {}
                },
                "game" if !value.is_empty() => config.game_script_url = value.to_string(),
                "log" => {
                    if let Ok(level) = value.parse::<log::Level>() {
                        config.log_level = level;
                    }
                }
                _ => {}
            }
        }

        config.fit = if viewport {
            FitPolicy::Viewport
        } else {
            FitPolicy::FixedFrame {
                width: frame.0,
                height: frame.1,
            }
        };
        config
    }
}

fn query_pairs(search: &str) -> impl Iterator<Item = (&str, &str)> {
    search
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
}

fn parse_frame(value: &str) -> Option<(f64, f64)> {
    let (w, h) = value.split_once(['x', 'X'])?;
    let w = w.parse::<f64>().ok()?;
    let h = h.parse::<f64>().ok()?;
    (w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0).then_some((w, h))
}
