//! Fallback modes: application launcher buttons and status feedback on the LEDs
//!
//! Buttons 2-9 hold Ctrl+Win plus a key that the desktop maps to
//! "focus or launch application N". The status pushed over HTTP is shown
//! as an LED animation on the next poll.

use std::time::Duration;

use inkkeys_device::input::{chord, hid, hold};
use inkkeys_device::{DeviceError, DeviceSession, LedAnimation, RgbColor};
use tracing::{debug, info};

use super::panel::{Button, Label, Panel};
use super::Mode;
use crate::render::Renderer;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Which host the launcher layout is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackVariant {
    Default,
    MacMini,
}

/// LED animation signalling an external status, if the status is known
pub fn status_animation(status: &str) -> Option<LedAnimation> {
    let (color, iterations) = match status {
        "Error" => (RgbColor::RED, 10),
        "Warning" => (RgbColor::new(247, 160, 0), 10),
        "Done" => (RgbColor::GREEN, 2),
        "Working" => (RgbColor::new(0, 156, 247), 10),
        _ => return None,
    };
    Some(LedAnimation::flash(color, iterations))
}

fn launcher(icon: &'static str, key: u16) -> Button {
    Button::held(Label::Icon(icon), hold(&[hid::LCTRL, hid::LGUI, key]))
}

fn panel(variant: FallbackVariant) -> Panel {
    let f = |n| hid::function(n).unwrap_or(hid::F1);
    let [b2, b3, b4, b5, b6, b7, b8, b9] = match variant {
        FallbackVariant::Default => [
            launcher("app-docker", hid::digit(1)),
            launcher("app-dash", hid::digit(2)),
            launcher("app-postman", hid::digit(3)),
            launcher("app-bitwarden", hid::digit(4)),
            launcher("app-slack", hid::digit(5)),
            launcher("app-chrome", hid::digit(6)),
            launcher("app-outlook", hid::digit(7)),
            launcher("app-vscode", hid::digit(8)),
        ],
        FallbackVariant::MacMini => [
            launcher("app-brave", f(1)),
            launcher("app-email", f(2)),
            launcher("app-messenger", f(3)),
            launcher("app-bitwarden", hid::digit(4)),
            launcher("app-pages", f(5)),
            launcher("app-keynote", f(6)),
            launcher("app-dash", f(7)),
            launcher("app-vscode", hid::digit(8)),
        ],
    };

    Panel {
        title: match variant {
            FallbackVariant::Default => "Default",
            FallbackVariant::MacMini => "Mac-Mini",
        },
        title_inverted: false,
        buttons: [
            Button::held(
                Label::Text("<   Select word   >"),
                hold(&[hid::LCTRL, hid::LGUI, hid::F15]),
            ),
            b2,
            b3,
            b4,
            b5,
            b6,
            b7,
            b8,
            b9,
        ],
        jog_cw: Some(chord(&[hid::LCTRL, hid::LSHIFT], hid::RIGHT)),
        jog_ccw: Some(chord(&[hid::LCTRL, hid::LSHIFT], hid::LEFT)),
    }
}

pub struct FallbackMode {
    variant: FallbackVariant,
    panel: Panel,
    renderer: Renderer,
}

impl FallbackMode {
    pub fn new(variant: FallbackVariant, renderer: Renderer) -> Self {
        Self {
            variant,
            panel: panel(variant),
            renderer,
        }
    }

    pub fn variant(&self) -> FallbackVariant {
        self.variant
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }
}

impl Mode for FallbackMode {
    fn name(&self) -> &str {
        self.panel.title
    }

    fn activate(&mut self, session: &mut DeviceSession) -> Result<(), DeviceError> {
        self.panel.apply(session, &self.renderer)
    }

    fn deactivate(&mut self, session: &mut DeviceSession) -> Result<(), DeviceError> {
        session.clear_callbacks();
        Ok(())
    }

    fn poll(&mut self, session: &mut DeviceSession) -> Result<Option<Duration>, DeviceError> {
        if let Some(status) = session.status().take() {
            match status_animation(&status) {
                Some(animation) => {
                    info!("Status: {}", status);
                    session.send_led_animation(&animation)?;
                }
                None => debug!("Ignoring unknown status {:?}", status),
            }
        }
        Ok(Some(POLL_INTERVAL))
    }

    /// Colors stay lit; no fade
    fn animate(&mut self, _session: &mut DeviceSession) -> Result<(), DeviceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkkeys_device::input::{press, release};

    #[test]
    fn test_status_animations() {
        let error = status_animation("Error").unwrap();
        assert_eq!((error.color, error.iterations), (RgbColor::RED, 10));
        let done = status_animation("Done").unwrap();
        assert_eq!((done.color, done.iterations), (RgbColor::GREEN, 2));
        assert_eq!(
            status_animation("Warning").unwrap().color,
            RgbColor::new(247, 160, 0)
        );
        assert_eq!(
            status_animation("Working").unwrap().color,
            RgbColor::new(0, 156, 247)
        );
        assert!(status_animation("working").is_none());
        assert!(status_animation("").is_none());
    }

    #[test]
    fn test_default_launchers_use_digits() {
        let panel = panel(FallbackVariant::Default);
        let b2 = panel.button(2).unwrap();
        assert_eq!(b2.press, vec![press(hid::LCTRL), press(hid::LGUI), press(hid::digit(1))]);
        assert_eq!(b2.release.last(), Some(&release(hid::digit(1))));
        assert_eq!(panel.button(9).unwrap().label, Label::Icon("app-vscode"));
    }

    #[test]
    fn test_mac_mini_launchers() {
        let panel = panel(FallbackVariant::MacMini);
        let keys: Vec<u16> = (2..=9)
            .map(|n| panel.button(n).unwrap().press[2].code)
            .collect();
        assert_eq!(
            keys,
            [
                hid::F1,
                hid::F1 + 1,
                hid::F1 + 2,
                hid::digit(4),
                hid::F1 + 4,
                hid::F1 + 5,
                hid::F1 + 6,
                hid::digit(8)
            ]
        );
        assert_eq!(panel.title, "Mac-Mini");
    }
}
