//! Controller to keyboard translation.
//!
//! The game only listens for keyboard input, so controller state is polled
//! once per animation frame and every press/release edge is replayed as a
//! synthetic `keydown`/`keyup` on the document.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Gamepad, GamepadButton, KeyboardEvent, KeyboardEventInit};

use crate::{js_value_to_string, window};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Player {
    One,
    Two,
}

impl Player {
    fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    Up,
    Down,
    Left,
    Right,
}

/// A logical control: one button on one player's controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Control {
    pub player: Player,
    pub button: Button,
}

impl Control {
    pub const COUNT: usize = 12;

    const fn new(player: Player, button: Button) -> Self {
        Self { player, button }
    }

    fn slot(self) -> usize {
        let button = match self.button {
            Button::A => 0,
            Button::B => 1,
            Button::Up => 2,
            Button::Down => 3,
            Button::Left => 4,
            Button::Right => 5,
        };
        self.player.index() * 6 + button
    }
}

/// The exact key fields the game matches on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Key {
    pub key: &'static str,
    pub code: &'static str,
    pub key_code: u32,
}

const LEFT_FLIPPER: Key = Key {
    key: "z",
    code: "KeyZ",
    key_code: 90,
};
const RIGHT_FLIPPER: Key = Key {
    key: "/",
    code: "Slash",
    key_code: 191,
};
const PLUNGER: Key = Key {
    key: " ",
    code: "Space",
    key_code: 32,
};
const BUMP_UP: Key = Key {
    key: "ArrowUp",
    code: "ArrowUp",
    key_code: 38,
};
const BUMP_LEFT: Key = Key {
    key: "x",
    code: "KeyX",
    key_code: 88,
};
const BUMP_RIGHT: Key = Key {
    key: ".",
    code: "Period",
    key_code: 190,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    pub control: Control,
    pub key: Key,
}

const fn bind(player: Player, button: Button, key: Key) -> Binding {
    Binding {
        control: Control::new(player, button),
        key,
    }
}

const ONE_PLAYER: [Binding; 6] = [
    bind(Player::One, Button::Left, LEFT_FLIPPER),
    bind(Player::One, Button::Right, RIGHT_FLIPPER),
    bind(Player::One, Button::Down, PLUNGER),
    bind(Player::One, Button::Up, BUMP_UP),
    bind(Player::One, Button::A, BUMP_LEFT),
    bind(Player::One, Button::B, BUMP_RIGHT),
];

// Player one works the left flipper, player two the right one. Both can
// launch and bump the table up. The d-pad direction pointing across the
// table nudges from the player's own side.
const TWO_PLAYER: [Binding; 12] = [
    bind(Player::One, Button::Left, LEFT_FLIPPER),
    bind(Player::One, Button::A, LEFT_FLIPPER),
    bind(Player::One, Button::B, BUMP_LEFT),
    bind(Player::One, Button::Right, BUMP_LEFT),
    bind(Player::One, Button::Down, PLUNGER),
    bind(Player::One, Button::Up, BUMP_UP),
    bind(Player::Two, Button::Right, RIGHT_FLIPPER),
    bind(Player::Two, Button::A, RIGHT_FLIPPER),
    bind(Player::Two, Button::B, BUMP_RIGHT),
    bind(Player::Two, Button::Left, BUMP_RIGHT),
    bind(Player::Two, Button::Down, PLUNGER),
    bind(Player::Two, Button::Up, BUMP_UP),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    OnePlayer,
    TwoPlayer,
}

impl Layout {
    pub fn bindings(self) -> &'static [Binding] {
        match self {
            Layout::OnePlayer => &ONE_PLAYER,
            Layout::TwoPlayer => &TWO_PLAYER,
        }
    }

    fn players(self) -> usize {
        match self {
            Layout::OnePlayer => 1,
            Layout::TwoPlayer => 2,
        }
    }
}

/// Button states of one controller for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PadState {
    pub a: bool,
    pub b: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl PadState {
    pub fn pressed(&self, button: Button) -> bool {
        match button {
            Button::A => self.a,
            Button::B => self.b,
            Button::Up => self.up,
            Button::Down => self.down,
            Button::Left => self.left,
            Button::Right => self.right,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub players: [PadState; 2],
}

impl Snapshot {
    pub fn pressed(&self, control: Control) -> bool {
        self.players[control.player.index()].pressed(control.button)
    }
}

/// Anything that can report controller state once per frame.
pub trait ControllerSource {
    fn snapshot(&self, players: usize) -> Snapshot;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// `window.player1` / `window.player2` objects maintained by page script.
    GlobalPlayers,
    /// `navigator.getGamepads()` with the standard button mapping.
    GamepadApi,
    Disabled,
}

const PLAYER_GLOBALS: [&str; 2] = ["player1", "player2"];

fn flag(target: &JsValue, name: &str) -> bool {
    if target.is_undefined() || target.is_null() {
        return false;
    }
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}

/// Reads `{ A, B, dpad: { up, down, left, right } }` objects off `window`.
pub struct GlobalPlayers;

impl GlobalPlayers {
    fn read(name: &str) -> PadState {
        let Ok(player) = Reflect::get(&window(), &JsValue::from_str(name)) else {
            return PadState::default();
        };
        if player.is_undefined() || player.is_null() {
            return PadState::default();
        }
        let dpad = Reflect::get(&player, &JsValue::from_str("dpad")).unwrap_or(JsValue::UNDEFINED);
        PadState {
            a: flag(&player, "A"),
            b: flag(&player, "B"),
            up: flag(&dpad, "up"),
            down: flag(&dpad, "down"),
            left: flag(&dpad, "left"),
            right: flag(&dpad, "right"),
        }
    }
}

impl ControllerSource for GlobalPlayers {
    fn snapshot(&self, players: usize) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for (state, name) in snapshot.players.iter_mut().zip(PLAYER_GLOBALS).take(players) {
            *state = Self::read(name);
        }
        snapshot
    }
}

/// Standard-mapping gamepads in slots 0 and 1.
pub struct GamepadApi;

const STANDARD_A: u32 = 0;
const STANDARD_B: u32 = 1;
const STANDARD_UP: u32 = 12;
const STANDARD_DOWN: u32 = 13;
const STANDARD_LEFT: u32 = 14;
const STANDARD_RIGHT: u32 = 15;

impl GamepadApi {
    fn read(pad: &Gamepad) -> PadState {
        let buttons = pad.buttons();
        let pressed = |index: u32| {
            buttons
                .get(index)
                .dyn_into::<GamepadButton>()
                .map(|button| button.pressed())
                .unwrap_or(false)
        };
        PadState {
            a: pressed(STANDARD_A),
            b: pressed(STANDARD_B),
            up: pressed(STANDARD_UP),
            down: pressed(STANDARD_DOWN),
            left: pressed(STANDARD_LEFT),
            right: pressed(STANDARD_RIGHT),
        }
    }
}

impl ControllerSource for GamepadApi {
    fn snapshot(&self, players: usize) -> Snapshot {
        let mut snapshot = Snapshot::default();
        let pads = match window().navigator().get_gamepads() {
            Ok(pads) => pads,
            Err(err) => {
                log::debug!("getGamepads failed: {}", js_value_to_string(&err));
                return snapshot;
            }
        };
        for (slot, state) in snapshot.players.iter_mut().enumerate().take(players) {
            if let Ok(pad) = pads.get(slot as u32).dyn_into::<Gamepad>() {
                if pad.connected() {
                    *state = Self::read(&pad);
                }
            }
        }
        snapshot
    }
}

pub struct NoController;

impl ControllerSource for NoController {
    fn snapshot(&self, _players: usize) -> Snapshot {
        Snapshot::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyPhase {
    Down,
    Up,
}

impl KeyPhase {
    pub fn event_type(self) -> &'static str {
        match self {
            KeyPhase::Down => "keydown",
            KeyPhase::Up => "keyup",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyTransition {
    pub control: Control,
    pub phase: KeyPhase,
    pub key: Key,
}

/// Edge detector over one layout. Owns the pressed-state record.
pub struct InputTranslator {
    layout: Layout,
    pressed: [bool; Control::COUNT],
}

impl InputTranslator {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            pressed: [false; Control::COUNT],
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn is_pressed(&self, control: Control) -> bool {
        self.pressed[control.slot()]
    }

    /// Compares `snapshot` against the record, updates it, and returns the
    /// edges in binding-table order.
    pub fn step(&mut self, snapshot: &Snapshot) -> Vec<KeyTransition> {
        let mut transitions = Vec::new();
        for binding in self.layout.bindings() {
            let now = snapshot.pressed(binding.control);
            let was = &mut self.pressed[binding.control.slot()];
            let phase = match (*was, now) {
                (false, true) => KeyPhase::Down,
                (true, false) => KeyPhase::Up,
                _ => continue,
            };
            *was = now;
            transitions.push(KeyTransition {
                control: binding.control,
                phase,
                key: binding.key,
            });
        }
        transitions
    }
}

pub fn keyboard_event(transition: &KeyTransition) -> Result<KeyboardEvent, JsValue> {
    let init = KeyboardEventInit::new();
    init.set_key(transition.key.key);
    init.set_code(transition.key.code);
    init.set_bubbles(true);
    init.set_cancelable(true);
    let event =
        KeyboardEvent::new_with_keyboard_event_init_dict(transition.phase.event_type(), &init)?;
    // keyCode/which are read-only on the prototype and absent from the init
    // dictionary; shadow them on the instance so legacy listeners see them.
    let code = JsValue::from_f64(transition.key.key_code as f64);
    for name in ["keyCode", "which"] {
        let descriptor = js_sys::Object::new();
        Reflect::set(&descriptor, &JsValue::from_str("value"), &code)?;
        js_sys::Object::define_property(&event, &JsValue::from_str(name), &descriptor);
    }
    Ok(event)
}

pub fn dispatch_transitions(document: &Document, transitions: &[KeyTransition]) {
    for transition in transitions {
        log::trace!(
            "{} {} ({:?} {:?})",
            transition.phase.event_type(),
            transition.key.code,
            transition.control.player,
            transition.control.button
        );
        let result = keyboard_event(transition).and_then(|event| document.dispatch_event(&event));
        if let Err(err) = result {
            log::warn!("dispatch {} failed: {}", transition.key.code, js_value_to_string(&err));
        }
    }
}

pub fn controller_source(kind: SourceKind) -> Box<dyn ControllerSource> {
    match kind {
        SourceKind::GlobalPlayers => Box::new(GlobalPlayers),
        SourceKind::GamepadApi => Box::new(GamepadApi),
        SourceKind::Disabled => Box::new(NoController),
    }
}

/// Polls `source` every animation frame for the rest of the page session.
pub fn start_input_loop(
    document: Document,
    layout: Layout,
    source: Box<dyn ControllerSource>,
) -> Result<(), JsValue> {
    let mut translator = InputTranslator::new(layout);
    let raf_holder: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let raf_holder_cb = Rc::clone(&raf_holder);

    *raf_holder.borrow_mut() = Some(Closure::wrap(Box::new(move |_ts: f64| {
        let snapshot = source.snapshot(translator.layout().players());
        let transitions = translator.step(&snapshot);
        dispatch_transitions(&document, &transitions);

        if let Some(cb) = raf_holder_cb.borrow().as_ref() {
            if let Err(err) = window().request_animation_frame(cb.as_ref().unchecked_ref()) {
                log::error!("input loop stopped: {}", js_value_to_string(&err));
            }
        }
    }) as Box<dyn FnMut(f64)>));

    if let Some(cb) = raf_holder.borrow().as_ref() {
        window().request_animation_frame(cb.as_ref().unchecked_ref())?;
    }
    log::info!("input loop started ({:?})", layout);
    Ok(())
}
