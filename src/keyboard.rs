use std::fmt;

use log::{debug, trace};

use crate::config::DEEPEST_BPP;
use crate::io_traits::KeyRegister;

/// 256 key codes, one bit each.
pub const KEYBOARD_BYTES: usize = 32;

/// HID usage code for Escape.
pub const KEY_ESC: u8 = 0x29;

/// HID codes 0..=3 are no-event, rollover, POST fail and undefined. They are never reported.
const LAST_RESERVED_CODE: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyState {
    Pressed,
    Released,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: u8,
    pub state: KeyState,
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            KeyState::Pressed => "pressed",
            KeyState::Released => "released",
        };
        write!(f, "key {} {}", self.code, state)
    }
}

/// A full snapshot of the key-state register.
///
/// A set bit at position `code & 7` of byte `code >> 3` means the key is down, with one
/// exception: bit 0 of byte 0 is *clear* while any key is down and set when the keyboard is
/// idle. Code 0 is not a real key, so [`KeyboardState::is_down`] keeps the plain bit sense
/// for it and [`KeyboardState::is_any_key_down`] reads it inverted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyboardState([u8; KEYBOARD_BYTES]);

impl KeyboardState {
    pub fn idle() -> Self {
        let mut bytes = [0; KEYBOARD_BYTES];
        bytes[0] = 1;
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; KEYBOARD_BYTES]) -> Self {
        Self(bytes)
    }

    /// Code 0 is ignored, it only ever acts as the idle sentinel.
    pub fn from_down_keys(codes: impl IntoIterator<Item = u8>) -> Self {
        let mut state = Self::idle();
        for code in codes.into_iter().filter(|&code| code != 0) {
            state.0[0] &= !1;
            state.0[(code >> 3) as usize] |= 1 << (code & 7);
        }
        state
    }

    pub fn as_bytes(&self) -> &[u8; KEYBOARD_BYTES] {
        &self.0
    }

    pub fn is_down(&self, code: u8) -> bool {
        self.0[(code >> 3) as usize] & (1 << (code & 7)) != 0
    }

    pub fn is_any_key_down(&self) -> bool {
        self.0[0] & 1 == 0
    }

    /// Every code whose bit changed, in ascending order.
    pub fn diff<'a>(previous: &'a Self, current: &'a Self) -> impl Iterator<Item = KeyEvent> + 'a {
        (0..=u8::MAX).filter_map(move |code| {
            match (previous.is_down(code), current.is_down(code)) {
                (false, true) => Some(KeyEvent {
                    code,
                    state: KeyState::Pressed,
                }),
                (true, false) => Some(KeyEvent {
                    code,
                    state: KeyState::Released,
                }),
                _ => None,
            }
        })
    }
}

/// Which key presses end a wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitCondition {
    /// Always exits, whatever `any_key` says.
    pub key: u8,
    pub any_key: bool,
}

impl ExitCondition {
    /// The deepest mode only leaves on `key`. Every other mode leaves on any key.
    pub fn for_depth(bpp: u8, key: u8) -> Self {
        Self {
            key,
            any_key: bpp != DEEPEST_BPP,
        }
    }
}

/// Outcome of one wait iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    /// No keys down. The episode is over and the gate is re-armed.
    Idle,
    /// Keys still down from an episode that was already handled.
    Suppressed,
    /// First iteration of an episode, condition not met.
    Stay,
    /// First iteration of an episode, condition met.
    Exit,
}

pub struct InputTracker {
    register: Box<dyn KeyRegister>,
    previous: KeyboardState,
    current: KeyboardState,
    handled: bool,
}

impl InputTracker {
    pub fn new(register: Box<dyn KeyRegister>) -> Self {
        Self {
            register,
            previous: KeyboardState::idle(),
            current: KeyboardState::idle(),
            handled: false,
        }
    }

    /// Overwrites the current snapshot with a full read of the register.
    pub fn poll(&mut self) {
        let mut bytes = [0; KEYBOARD_BYTES];
        self.register.read_block(0, &mut bytes);
        self.previous = self.current;
        self.current = KeyboardState::from_bytes(bytes);
    }

    pub fn is_down(&self, code: u8) -> bool {
        self.current.is_down(code)
    }

    pub fn state(&self) -> &KeyboardState {
        &self.current
    }

    /// Polls once, reports key changes and runs the once-per-episode gate.
    ///
    /// The handled flag survives between waits, so a key still held when a wait ends cannot
    /// end the next one.
    pub fn poll_for_exit(&mut self, condition: ExitCondition, mut report: impl FnMut(KeyEvent)) -> Gate {
        self.poll();

        for event in KeyboardState::diff(&self.previous, &self.current)
            .filter(|event| event.code > LAST_RESERVED_CODE)
        {
            trace!("{event}");
            report(event);
        }

        if !self.current.is_any_key_down() {
            self.handled = false;
            return Gate::Idle;
        }

        if self.handled {
            return Gate::Suppressed;
        }
        self.handled = true;

        if self.current.is_down(condition.key) || condition.any_key {
            debug!("exit condition met: {condition:?}");
            Gate::Exit
        } else {
            debug!("key episode ignored: {condition:?}");
            Gate::Stay
        }
    }

    /// Busy-polls until the exit condition is met.
    pub fn wait_for_exit(&mut self, condition: ExitCondition, mut report: impl FnMut(KeyEvent)) {
        while self.poll_for_exit(condition, &mut report) != Gate::Exit {}
    }
}
