//! Key identifiers shared by ASSIGN commands and inbound key events
//!
//! Every physical input has a one-character identifier. The firmware
//! reports a press or release by sending that character on its own line;
//! jog rotation is reported as the jog identifier followed by a signed
//! decimal step count, e.g. `J-3`.

use std::fmt;
use std::str::FromStr;

/// Number of programmable switches (switch 1 is the jog dial push button)
pub const SWITCH_COUNT: u8 = 9;

/// An input slot on the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyCode {
    /// Switch pressed, 1..=9
    Press(u8),
    /// Switch released, 1..=9
    Release(u8),
    /// Jog dial rotation event (inbound only, carries a delta)
    Jog,
    /// Events fired per clockwise jog step
    JogCw,
    /// Events fired per counter-clockwise jog step
    JogCcw,
}

impl KeyCode {
    /// Switch press slot; `None` outside 1..=9
    pub fn press(switch: u8) -> Option<Self> {
        (1..=SWITCH_COUNT).contains(&switch).then_some(Self::Press(switch))
    }

    /// Switch release slot; `None` outside 1..=9
    pub fn release(switch: u8) -> Option<Self> {
        (1..=SWITCH_COUNT).contains(&switch).then_some(Self::Release(switch))
    }

    /// Wire identifier
    ///
    /// Press `1`..`9`, release `A`..`I`, jog `J`, jog CW `R`, jog CCW `L`.
    /// Out-of-range switch numbers map to `?`, which the firmware ignores.
    pub fn id(self) -> char {
        match self {
            Self::Press(n @ 1..=9) => char::from(b'0' + n),
            Self::Release(n @ 1..=9) => char::from(b'A' + n - 1),
            Self::Press(_) | Self::Release(_) => '?',
            Self::Jog => 'J',
            Self::JogCw => 'R',
            Self::JogCcw => 'L',
        }
    }

    /// Reverse of [`id`](Self::id)
    pub fn from_id(c: char) -> Option<Self> {
        match c {
            '1'..='9' => Some(Self::Press(c as u8 - b'0')),
            'A'..='I' => Some(Self::Release(c as u8 - b'A' + 1)),
            'J' => Some(Self::Jog),
            'R' => Some(Self::JogCw),
            'L' => Some(Self::JogCcw),
            _ => None,
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Press(n) => write!(f, "SW{n}_PRESS"),
            Self::Release(n) => write!(f, "SW{n}_RELEASE"),
            Self::Jog => write!(f, "JOG"),
            Self::JogCw => write!(f, "JOG_CW"),
            Self::JogCcw => write!(f, "JOG_CCW"),
        }
    }
}

/// Error type for parsing a [`KeyCode`] from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKeyCodeError(String);

impl fmt::Display for ParseKeyCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown key slot: \"{}\"", self.0)
    }
}

impl std::error::Error for ParseKeyCodeError {}

/// Accepts `SW3_PRESS`, `sw3` (press), `sw3-release`, `jog_cw`, or a raw wire identifier
impl FromStr for KeyCode {
    type Err = ParseKeyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseKeyCodeError(s.to_string());
        let norm = s.trim().to_ascii_uppercase().replace('-', "_");

        match norm.as_str() {
            "JOG" => return Ok(Self::Jog),
            "JOG_CW" => return Ok(Self::JogCw),
            "JOG_CCW" => return Ok(Self::JogCcw),
            _ => {}
        }

        if let Some(rest) = norm.strip_prefix("SW") {
            let (num, action) = rest.split_once('_').unwrap_or((rest, "PRESS"));
            let n: u8 = num.parse().map_err(|_| err())?;
            return match action {
                "PRESS" => Self::press(n),
                "RELEASE" => Self::release(n),
                _ => None,
            }
            .ok_or_else(err);
        }

        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_id(c).ok_or_else(err),
            _ => Err(err()),
        }
    }
}

/// A parsed inbound event line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// A switch line, exactly one identifier character
    Key(KeyCode),
    /// Jog rotation by a signed number of steps
    Jog(i32),
}

impl KeyEvent {
    /// Parse an inbound line
    ///
    /// A jog event is the jog identifier followed by an optional `-` and at
    /// least one decimal digit. Anything else after the jog identifier,
    /// including nothing at all, is not a jog event.
    pub fn parse(line: &str) -> Option<Self> {
        if let Some(payload) = line.strip_prefix(KeyCode::Jog.id()) {
            if !payload.is_empty() {
                let digits = payload.strip_prefix('-').unwrap_or(payload);
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                return payload.parse().ok().map(Self::Jog);
            }
        }

        let mut chars = line.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => KeyCode::from_id(c).map(Self::Key),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip() {
        for n in 1..=SWITCH_COUNT {
            for key in [KeyCode::Press(n), KeyCode::Release(n)] {
                assert_eq!(KeyCode::from_id(key.id()), Some(key));
            }
        }
        assert_eq!(KeyCode::Press(1).id(), '1');
        assert_eq!(KeyCode::Release(9).id(), 'I');
    }

    #[test]
    fn test_switch_range() {
        assert_eq!(KeyCode::press(0), None);
        assert_eq!(KeyCode::release(10), None);
        assert_eq!(KeyCode::press(9), Some(KeyCode::Press(9)));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("SW3_PRESS".parse::<KeyCode>().unwrap(), KeyCode::Press(3));
        assert_eq!("sw7-release".parse::<KeyCode>().unwrap(), KeyCode::Release(7));
        assert_eq!("sw2".parse::<KeyCode>().unwrap(), KeyCode::Press(2));
        assert_eq!("jog_ccw".parse::<KeyCode>().unwrap(), KeyCode::JogCcw);
        assert_eq!("R".parse::<KeyCode>().unwrap(), KeyCode::JogCw);
        assert!("SW0_PRESS".parse::<KeyCode>().is_err());
        assert!("SW2_HOLD".parse::<KeyCode>().is_err());
    }

    #[test]
    fn test_jog_events() {
        assert_eq!(KeyEvent::parse("J5"), Some(KeyEvent::Jog(5)));
        assert_eq!(KeyEvent::parse("J-12"), Some(KeyEvent::Jog(-12)));
        assert_eq!(KeyEvent::parse("J007"), Some(KeyEvent::Jog(7)));
    }

    #[test]
    fn test_malformed_jog_dropped() {
        assert_eq!(KeyEvent::parse("J-"), None);
        assert_eq!(KeyEvent::parse("J+3"), None);
        assert_eq!(KeyEvent::parse("J1a"), None);
        assert_eq!(KeyEvent::parse("J99999999999"), None);
    }

    #[test]
    fn test_key_lines() {
        assert_eq!(KeyEvent::parse("4"), Some(KeyEvent::Key(KeyCode::Press(4))));
        assert_eq!(KeyEvent::parse("D"), Some(KeyEvent::Key(KeyCode::Release(4))));
        assert_eq!(KeyEvent::parse("J"), Some(KeyEvent::Key(KeyCode::Jog)));
        assert_eq!(KeyEvent::parse("ok"), None);
        assert_eq!(KeyEvent::parse(""), None);
    }
}
