//! LED colors, the timed fade-out, and device-side LED animations

use std::fmt;
use std::time::{Duration, Instant};

/// How long colors stay at full brightness after being set
pub const FADE_HOLD: Duration = Duration::from_millis(3000);

/// Length of the linear fade to black that follows the hold
pub const FADE_DURATION: Duration = Duration::from_millis(500);

/// RGB color value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    /// Create a new RGB color
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel by `factor` (0.0..=1.0), truncating
    pub fn scaled(self, factor: f64) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self {
            r: (self.r as f64 * f) as u8,
            g: (self.g as f64 * f) as u8,
            b: (self.b as f64 * f) as u8,
        }
    }

    /// Black (LED off)
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };
    /// Red
    pub const RED: Self = Self { r: 255, g: 0, b: 0 };
    /// Green
    pub const GREEN: Self = Self { r: 0, g: 255, b: 0 };
    /// Blue
    pub const BLUE: Self = Self { r: 0, g: 0, b: 255 };
}

/// Six lowercase hex digits, `rrggbb`
impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Last colors written to the LEDs and when
#[derive(Debug, Clone)]
pub struct LedState {
    colors: Vec<RgbColor>,
    set_at: Instant,
}

/// What the fade wants sent at a given moment
#[derive(Debug, Clone, PartialEq)]
pub enum FadeStep {
    /// Still in the hold window; nothing to send
    Hold,
    /// Send these dimmed colors
    Dim(Vec<RgbColor>),
    /// Fully faded; send all-zero once and forget the state
    Off,
}

impl LedState {
    pub fn new(colors: Vec<RgbColor>, set_at: Instant) -> Self {
        Self { colors, set_at }
    }

    pub fn colors(&self) -> &[RgbColor] {
        &self.colors
    }

    /// Brightness factor at `now`: `(3.5 - t) / 0.5` where `t` is seconds since set
    pub fn factor_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.set_at).as_secs_f64();
        let end = (FADE_HOLD + FADE_DURATION).as_secs_f64();
        (end - elapsed) / FADE_DURATION.as_secs_f64()
    }

    pub fn step_at(&self, now: Instant) -> FadeStep {
        let p = self.factor_at(now);
        if p >= 1.0 {
            FadeStep::Hold
        } else if p <= 0.0 {
            FadeStep::Off
        } else {
            FadeStep::Dim(self.colors.iter().map(|c| c.scaled(p)).collect())
        }
    }
}

/// Parameters of a device-side LED animation
///
/// The firmware runs the animation on its own; the host only triggers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedAnimation {
    pub mode: u8,
    pub speed: u8,
    pub length: u8,
    pub color: RgbColor,
    pub iterations: u8,
}

impl LedAnimation {
    /// The flash pattern used for status feedback and mode switches
    pub const fn flash(color: RgbColor, iterations: u8) -> Self {
        Self {
            mode: 2,
            speed: 50,
            length: 20,
            color,
            iterations,
        }
    }

    /// Command arguments: `mode speed length rrggbb iterations`
    pub fn args(&self) -> [String; 5] {
        [
            self.mode.to_string(),
            self.speed.to_string(),
            self.length.to_string(),
            self.color.to_string(),
            self.iterations.to_string(),
        ]
    }
}
