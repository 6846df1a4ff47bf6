//! Blender: playback on the jog dial, view shortcuts on the buttons

use std::time::Duration;

use inkkeys_device::input::{hid, press, release, tap};
use inkkeys_device::{DeviceError, DeviceSession};

use super::panel::{Button, Label, Panel};
use super::Mode;
use crate::render::Renderer;

pub struct BlenderMode {
    panel: Panel,
    renderer: Renderer,
}

fn panel() -> Panel {
    Panel {
        title: "Blender",
        title_inverted: true,
        buttons: [
            // Jog dial press: play/pause
            Button::new(
                Label::Text("<   Play/Pause   >"),
                vec![press(hid::SPACE)],
                vec![release(hid::SPACE)],
            ),
            // View through camera
            Button::new(
                Label::Icon("camera-reels"),
                vec![press(hid::KP_0)],
                vec![release(hid::KP_0)],
            ),
            // Local view
            Button::new(
                Label::Icon("person-bounding-box"),
                vec![press(hid::KP_DIVIDE)],
                vec![release(hid::KP_DIVIDE)],
            ),
            Button::unused(),
            Button::unused(),
            // Frame selected
            Button::new(
                Label::Icon("aspect-ratio"),
                vec![press(hid::KP_DOT)],
                vec![release(hid::KP_DOT)],
            ),
            // Render animation
            Button::on_press(
                Label::Icon("collection"),
                vec![press(hid::LCTRL), tap(hid::F12), release(hid::LCTRL)],
            ),
            Button::unused(),
            Button::unused(),
        ],
        jog_cw: Some(vec![tap(hid::RIGHT)]),
        jog_ccw: Some(vec![tap(hid::LEFT)]),
    }
}

impl BlenderMode {
    pub fn new(renderer: Renderer) -> Self {
        Self {
            panel: panel(),
            renderer,
        }
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }
}

impl Mode for BlenderMode {
    fn name(&self) -> &str {
        self.panel.title
    }

    fn activate(&mut self, session: &mut DeviceSession) -> Result<(), DeviceError> {
        self.panel.apply(session, &self.renderer)
    }

    fn deactivate(&mut self, _session: &mut DeviceSession) -> Result<(), DeviceError> {
        Ok(())
    }

    fn poll(&mut self, _session: &mut DeviceSession) -> Result<Option<Duration>, DeviceError> {
        Ok(None)
    }

    /// Fade out colors left over from the previous mode
    fn animate(&mut self, session: &mut DeviceSession) -> Result<(), DeviceError> {
        session.fade_leds()
    }
}
