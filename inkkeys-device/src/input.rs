//! Device-level input events bound to keys by ASSIGN
//!
//! Each event is encoded as one token: device letter, action letter, then
//! the usage code in hex. `kp2c` presses Space on the keyboard interface,
//! `ct e9` would tap Volume Up on the consumer interface (without the space).
//!
//! # Parsing syntax
//!
//! ```text
//! Space        → keyboard tap 0x2C
//! +LCtrl       → keyboard press 0xE0
//! -LCtrl       → keyboard release 0xE0
//! 0x68         → keyboard tap F13
//! c:VolumeUp   → consumer tap 0xE9
//! -c:0xCD      → consumer release Play/Pause
//! m:1          → mouse button 1 tap
//! ```

use std::fmt;
use std::str::FromStr;

/// USB HID keyboard usage codes (page 0x07)
pub mod hid {
    pub const A: u16 = 0x04;
    pub const B: u16 = 0x05;
    pub const I: u16 = 0x0C;
    pub const J: u16 = 0x0D;
    pub const L: u16 = 0x0F;
    pub const N: u16 = 0x11;
    pub const S: u16 = 0x16;
    pub const V: u16 = 0x19;
    pub const Z: u16 = 0x1D;
    pub const N1: u16 = 0x1E;
    pub const SPACE: u16 = 0x2C;
    pub const LEFT_BRACKET: u16 = 0x2F;
    pub const RIGHT_BRACKET: u16 = 0x30;
    pub const COMMA: u16 = 0x36;
    pub const PERIOD: u16 = 0x37;
    pub const F1: u16 = 0x3A;
    pub const F12: u16 = 0x45;
    pub const RIGHT: u16 = 0x4F;
    pub const LEFT: u16 = 0x50;
    pub const DOWN: u16 = 0x51;
    pub const UP: u16 = 0x52;
    pub const KP_DIVIDE: u16 = 0x54;
    pub const KP_MINUS: u16 = 0x56;
    pub const KP_PLUS: u16 = 0x57;
    pub const KP_0: u16 = 0x62;
    pub const KP_DOT: u16 = 0x63;
    pub const F13: u16 = 0x68;
    pub const F15: u16 = 0x6A;
    pub const LCTRL: u16 = 0xE0;
    pub const LSHIFT: u16 = 0xE1;
    pub const LALT: u16 = 0xE2;
    pub const LGUI: u16 = 0xE3;

    /// Digit row key for `n` in 0..=9
    pub fn digit(n: u8) -> u16 {
        match n {
            0 => 0x27,
            n => N1 + u16::from(n.min(9)) - 1,
        }
    }

    /// Function key `F<n>` for `n` in 1..=24
    pub fn function(n: u8) -> Option<u16> {
        match n {
            1..=12 => Some(F1 + u16::from(n) - 1),
            13..=24 => Some(F13 + u16::from(n) - 13),
            _ => None,
        }
    }

    /// Get the name of a HID keyboard usage code
    pub fn key_name(code: u16) -> &'static str {
        NAMES
            .iter()
            .find(|(_, c)| *c == code)
            .map_or("?", |(name, _)| name)
    }

    /// Look up a key by name, case-insensitively
    pub fn key_code_from_name(name: &str) -> Option<u16> {
        if let Some(n) = name
            .strip_prefix('F')
            .or_else(|| name.strip_prefix('f'))
            .and_then(|rest| rest.parse::<u8>().ok())
        {
            return function(n);
        }
        NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, c)| *c)
            .or_else(|| {
                ALIASES
                    .iter()
                    .find(|(n, _)| n.eq_ignore_ascii_case(name))
                    .map(|(_, c)| *c)
            })
    }

    #[rustfmt::skip]
    const NAMES: &[(&str, u16)] = &[
        ("A", 0x04), ("B", 0x05), ("C", 0x06), ("D", 0x07),
        ("E", 0x08), ("F", 0x09), ("G", 0x0A), ("H", 0x0B),
        ("I", 0x0C), ("J", 0x0D), ("K", 0x0E), ("L", 0x0F),
        ("M", 0x10), ("N", 0x11), ("O", 0x12), ("P", 0x13),
        ("Q", 0x14), ("R", 0x15), ("S", 0x16), ("T", 0x17),
        ("U", 0x18), ("V", 0x19), ("W", 0x1A), ("X", 0x1B),
        ("Y", 0x1C), ("Z", 0x1D),
        ("1", 0x1E), ("2", 0x1F), ("3", 0x20), ("4", 0x21),
        ("5", 0x22), ("6", 0x23), ("7", 0x24), ("8", 0x25),
        ("9", 0x26), ("0", 0x27),
        ("Enter", 0x28), ("Escape", 0x29), ("Backspace", 0x2A),
        ("Tab", 0x2B), ("Space", 0x2C), ("-", 0x2D), ("=", 0x2E),
        ("[", 0x2F), ("]", 0x30), ("\\", 0x31),
        (";", 0x33), ("'", 0x34), ("`", 0x35), (",", 0x36),
        (".", 0x37), ("/", 0x38), ("CapsLock", 0x39),
        ("PrintScr", 0x46), ("ScrollLock", 0x47), ("Pause", 0x48),
        ("Insert", 0x49), ("Home", 0x4A), ("PageUp", 0x4B),
        ("Delete", 0x4C), ("End", 0x4D), ("PageDown", 0x4E),
        ("Right", 0x4F), ("Left", 0x50), ("Down", 0x51), ("Up", 0x52),
        ("NumLock", 0x53), ("KP/", 0x54), ("KP*", 0x55), ("KP-", 0x56),
        ("KP+", 0x57), ("KPEnter", 0x58),
        ("KP1", 0x59), ("KP2", 0x5A), ("KP3", 0x5B), ("KP4", 0x5C),
        ("KP5", 0x5D), ("KP6", 0x5E), ("KP7", 0x5F), ("KP8", 0x60),
        ("KP9", 0x61), ("KP0", 0x62), ("KP.", 0x63),
        ("App", 0x65),
        ("LCtrl", 0xE0), ("LShift", 0xE1), ("LAlt", 0xE2), ("LGUI", 0xE3),
        ("RCtrl", 0xE4), ("RShift", 0xE5), ("RAlt", 0xE6), ("RGUI", 0xE7),
    ];

    #[rustfmt::skip]
    const ALIASES: &[(&str, u16)] = &[
        ("Esc", 0x29), ("Return", 0x28), ("Del", 0x4C),
        ("Ctrl", 0xE0), ("Shift", 0xE1), ("Alt", 0xE2),
        ("Win", 0xE3), ("Super", 0xE3), ("Cmd", 0xE3), ("LWin", 0xE3),
    ];
}

/// USB HID consumer control usage codes (page 0x0C)
pub mod consumer {
    pub const NEXT_TRACK: u16 = 0xB5;
    pub const PREV_TRACK: u16 = 0xB6;
    pub const STOP: u16 = 0xB7;
    pub const PLAY_PAUSE: u16 = 0xCD;
    pub const MUTE: u16 = 0xE2;
    pub const VOLUME_UP: u16 = 0xE9;
    pub const VOLUME_DOWN: u16 = 0xEA;

    /// Look up a consumer control by name, case-insensitively
    pub fn code_from_name(name: &str) -> Option<u16> {
        let code = match name.to_ascii_lowercase().as_str() {
            "next" | "nexttrack" => NEXT_TRACK,
            "prev" | "prevtrack" | "previous" => PREV_TRACK,
            "stop" => STOP,
            "play" | "pause" | "playpause" => PLAY_PAUSE,
            "mute" => MUTE,
            "volumeup" | "volup" => VOLUME_UP,
            "volumedown" | "voldown" => VOLUME_DOWN,
            _ => return None,
        };
        Some(code)
    }
}

/// Which HID interface of the keyboard emits the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCode {
    Keyboard,
    Consumer,
    Mouse,
}

impl DeviceCode {
    fn letter(self) -> char {
        match self {
            Self::Keyboard => 'k',
            Self::Consumer => 'c',
            Self::Mouse => 'm',
        }
    }
}

/// What happens to the code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ActionCode {
    Press,
    Release,
    /// Press immediately followed by release
    #[default]
    Tap,
}

impl ActionCode {
    fn letter(self) -> char {
        match self {
            Self::Press => 'p',
            Self::Release => 'r',
            Self::Tap => 't',
        }
    }
}

/// One device-level input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputEvent {
    pub device: DeviceCode,
    pub code: u16,
    pub action: ActionCode,
}

impl InputEvent {
    pub const fn new(device: DeviceCode, code: u16, action: ActionCode) -> Self {
        Self {
            device,
            code,
            action,
        }
    }

    /// Wire token, e.g. `kp2c`
    pub fn encode(&self) -> String {
        format!(
            "{}{}{:x}",
            self.device.letter(),
            self.action.letter(),
            self.code
        )
    }
}

/// Keyboard key press
pub const fn press(code: u16) -> InputEvent {
    InputEvent::new(DeviceCode::Keyboard, code, ActionCode::Press)
}

/// Keyboard key release
pub const fn release(code: u16) -> InputEvent {
    InputEvent::new(DeviceCode::Keyboard, code, ActionCode::Release)
}

/// Keyboard key tap
pub const fn tap(code: u16) -> InputEvent {
    InputEvent::new(DeviceCode::Keyboard, code, ActionCode::Tap)
}

/// Press `keys` in order on switch press, release them on switch release
///
/// Returns `(press_events, release_events)`.
pub fn hold(keys: &[u16]) -> (Vec<InputEvent>, Vec<InputEvent>) {
    (
        keys.iter().map(|&k| press(k)).collect(),
        keys.iter().map(|&k| release(k)).collect(),
    )
}

/// Tap `key` while `modifiers` are held, as a single event sequence
pub fn chord(modifiers: &[u16], key: u16) -> Vec<InputEvent> {
    modifiers
        .iter()
        .map(|&m| press(m))
        .chain(std::iter::once(tap(key)))
        .chain(modifiers.iter().map(|&m| release(m)))
        .collect()
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.action {
            ActionCode::Press => "+",
            ActionCode::Release => "-",
            ActionCode::Tap => "",
        };
        match self.device {
            DeviceCode::Keyboard => match hid::key_name(self.code) {
                "?" => write!(f, "{sign}0x{:02X}", self.code),
                name => write!(f, "{sign}{name}"),
            },
            DeviceCode::Consumer => write!(f, "{sign}c:0x{:02X}", self.code),
            DeviceCode::Mouse => write!(f, "{sign}m:{}", self.code),
        }
    }
}

/// Error type for parsing an [`InputEvent`] from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseInputEventError {
    Empty,
    UnknownKey(String),
    UnknownConsumer(String),
    InvalidHexCode,
    InvalidMouseButton,
}

impl fmt::Display for ParseInputEventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty event"),
            Self::UnknownKey(name) => write!(f, "unknown key: \"{name}\""),
            Self::UnknownConsumer(name) => write!(f, "unknown consumer control: \"{name}\""),
            Self::InvalidHexCode => write!(f, "invalid hex code"),
            Self::InvalidMouseButton => write!(f, "invalid mouse button number"),
        }
    }
}

impl std::error::Error for ParseInputEventError {}

fn parse_hex(s: &str) -> Option<Result<u16, ParseInputEventError>> {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .map(|hex| u16::from_str_radix(hex, 16).map_err(|_| ParseInputEventError::InvalidHexCode))
}

impl FromStr for InputEvent {
    type Err = ParseInputEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (action, rest) = if let Some(rest) = s.strip_prefix('+') {
            (ActionCode::Press, rest)
        } else if let Some(rest) = s.strip_prefix('-').filter(|r| !r.is_empty()) {
            (ActionCode::Release, rest)
        } else {
            (ActionCode::Tap, s)
        };
        if rest.is_empty() {
            return Err(ParseInputEventError::Empty);
        }

        if let Some(name) = rest.strip_prefix("c:").or_else(|| rest.strip_prefix("C:")) {
            let code = match parse_hex(name) {
                Some(code) => code?,
                None => consumer::code_from_name(name)
                    .ok_or_else(|| ParseInputEventError::UnknownConsumer(name.to_string()))?,
            };
            return Ok(Self::new(DeviceCode::Consumer, code, action));
        }

        if let Some(btn) = rest.strip_prefix("m:").or_else(|| rest.strip_prefix("M:")) {
            let code: u16 = btn
                .parse()
                .map_err(|_| ParseInputEventError::InvalidMouseButton)?;
            return Ok(Self::new(DeviceCode::Mouse, code, action));
        }

        let code = match parse_hex(rest) {
            Some(code) => code?,
            None => hid::key_code_from_name(rest)
                .ok_or_else(|| ParseInputEventError::UnknownKey(rest.to_string()))?,
        };
        Ok(Self::new(DeviceCode::Keyboard, code, action))
    }
}

/// Parse a whitespace separated event list
pub fn parse_sequence(s: &str) -> Result<Vec<InputEvent>, ParseInputEventError> {
    s.split_whitespace().map(str::parse).collect()
}
