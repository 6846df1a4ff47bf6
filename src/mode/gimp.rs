//! GIMP: canvas shortcuts, with a jog dial whose function cycles on press

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use inkkeys_device::input::{chord, hid, hold, tap};
use inkkeys_device::{Callback, DeviceError, DeviceSession, InputEvent, KeyCode, RgbColor};
use tracing::info;

use super::panel::{Button, Label, Panel};
use super::Mode;
use crate::render::Renderer;

/// What the jog dial adjusts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JogFunction {
    #[default]
    BrushSize,
    Zoom,
    Opacity,
}

impl JogFunction {
    pub fn next(self) -> Self {
        match self {
            Self::BrushSize => Self::Zoom,
            Self::Zoom => Self::Opacity,
            Self::Opacity => Self::BrushSize,
        }
    }

    /// Events for one clockwise and one counter-clockwise step
    pub fn events(self) -> (Vec<InputEvent>, Vec<InputEvent>) {
        match self {
            Self::BrushSize => (vec![tap(hid::RIGHT_BRACKET)], vec![tap(hid::LEFT_BRACKET)]),
            Self::Zoom => (vec![tap(hid::KP_PLUS)], vec![tap(hid::KP_MINUS)]),
            Self::Opacity => (
                chord(&[hid::LSHIFT], hid::PERIOD),
                chord(&[hid::LSHIFT], hid::COMMA),
            ),
        }
    }

    /// LED feedback color
    pub fn color(self) -> RgbColor {
        match self {
            Self::BrushSize => RgbColor::new(255, 64, 0),
            Self::Zoom => RgbColor::new(0, 255, 64),
            Self::Opacity => RgbColor::new(64, 0, 255),
        }
    }
}

impl fmt::Display for JogFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BrushSize => "brush size",
            Self::Zoom => "zoom",
            Self::Opacity => "opacity",
        })
    }
}

fn assign_jog(session: &DeviceSession, function: JogFunction) -> Result<(), DeviceError> {
    let (cw, ccw) = function.events();
    session.assign_key(KeyCode::JogCw, &cw)?;
    session.assign_key(KeyCode::JogCcw, &ccw)
}

/// `Alt+B` opens the image menu, the second key picks the entry
fn image_menu(key: u16) -> Vec<InputEvent> {
    let mut events = chord(&[hid::LALT], hid::B);
    events.push(tap(key));
    events
}

fn panel() -> Panel {
    let ctrl_shift = |key| chord(&[hid::LCTRL, hid::LSHIFT], key);
    Panel {
        title: "Gimp",
        title_inverted: false,
        buttons: [
            // The release both ends this hold and cycles the jog function
            // through the callback registered in `activate`
            Button::held(
                Label::Text("<   Brush / Zoom / Opacity   >"),
                hold(&[hid::LCTRL, hid::LGUI, hid::F15]),
            ),
            // Crop to selection
            Button::on_press(Label::Icon("fullscreen"), image_menu(hid::Z)),
            // Crop to content
            Button::on_press(Label::Icon("upc-scan"), image_menu(hid::I)),
            // Canvas size
            Button::on_press(Label::Icon("crop"), image_menu(hid::L)),
            // Scale image
            Button::on_press(Label::Icon("arrows-angle-expand"), image_menu(hid::S)),
            // Paste as new image
            Button::on_press(Label::Icon("clipboard-plus"), ctrl_shift(hid::V)),
            // New layer
            Button::on_press(Label::Icon("layers-half"), ctrl_shift(hid::N)),
            // Fit image in window
            Button::on_press(Label::Icon("arrows-fullscreen"), ctrl_shift(hid::J)),
            Button::unused(),
        ],
        jog_cw: None,
        jog_ccw: None,
    }
}

pub struct GimpMode {
    panel: Panel,
    renderer: Renderer,
    jog: Rc<Cell<JogFunction>>,
}

impl GimpMode {
    pub fn new(renderer: Renderer) -> Self {
        Self {
            panel: panel(),
            renderer,
            jog: Rc::new(Cell::new(JogFunction::default())),
        }
    }

    pub fn jog_function(&self) -> JogFunction {
        self.jog.get()
    }
}

impl Mode for GimpMode {
    fn name(&self) -> &str {
        self.panel.title
    }

    fn activate(&mut self, session: &mut DeviceSession) -> Result<(), DeviceError> {
        self.panel.apply(session, &self.renderer)?;
        assign_jog(session, self.jog.get())?;

        let jog = Rc::clone(&self.jog);
        session.register_callback(
            KeyCode::Release(1),
            Callback::key(move |session| {
                let function = jog.get().next();
                jog.set(function);
                info!("Jog dial now controls {}", function);
                assign_jog(session, function)?;
                let leds = vec![function.color(); session.capabilities().n_leds];
                session.set_leds(&leds)
            }),
        );
        Ok(())
    }

    fn deactivate(&mut self, session: &mut DeviceSession) -> Result<(), DeviceError> {
        session.clear_callbacks();
        Ok(())
    }

    fn poll(&mut self, _session: &mut DeviceSession) -> Result<Option<Duration>, DeviceError> {
        Ok(None)
    }

    fn animate(&mut self, session: &mut DeviceSession) -> Result<(), DeviceError> {
        session.fade_leds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jog_function_cycles() {
        let mut f = JogFunction::default();
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(f);
            f = f.next();
        }
        assert_eq!(
            seen,
            [JogFunction::BrushSize, JogFunction::Zoom, JogFunction::Opacity]
        );
        assert_eq!(f, JogFunction::BrushSize);
    }

    #[test]
    fn test_image_menu_sequence() {
        let encoded: Vec<String> = image_menu(hid::Z).iter().map(InputEvent::encode).collect();
        assert_eq!(encoded, ["kpe2", "kt5", "kre2", "kt1d"]);
    }
}
