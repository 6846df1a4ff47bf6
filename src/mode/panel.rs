//! Static panel tables: what each button shows and sends

use inkkeys_device::{DeviceError, DeviceSession, InputEvent, KeyCode, Region, SWITCH_COUNT};
use tracing::debug;

use crate::render::{PanelWriter, Renderer};

/// What a button region shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    /// Icon file name under the icons directory
    Icon(&'static str),
    Text(&'static str),
}

/// One switch: its label and the events bound to press and release
#[derive(Debug, Clone)]
pub struct Button {
    pub label: Label,
    pub press: Vec<InputEvent>,
    pub release: Vec<InputEvent>,
}

impl Button {
    pub fn new(label: Label, press: Vec<InputEvent>, release: Vec<InputEvent>) -> Self {
        Self {
            label,
            press,
            release,
        }
    }

    /// Events on press only
    pub fn on_press(label: Label, press: Vec<InputEvent>) -> Self {
        Self::new(label, press, Vec::new())
    }

    /// Press and release events from a `(press, release)` pair
    pub fn held(label: Label, (press, release): (Vec<InputEvent>, Vec<InputEvent>)) -> Self {
        Self::new(label, press, release)
    }

    /// Placeholder dot, nothing assigned
    pub fn unused() -> Self {
        Self::new(Label::Icon("dot"), Vec::new(), Vec::new())
    }
}

/// Full description of a static mode layout
#[derive(Debug, Clone)]
pub struct Panel {
    pub title: &'static str,
    pub title_inverted: bool,
    /// Switches 1 through 9
    pub buttons: [Button; SWITCH_COUNT as usize],
    pub jog_cw: Option<Vec<InputEvent>>,
    pub jog_ccw: Option<Vec<InputEvent>>,
}

impl Panel {
    pub fn button(&self, switch: u8) -> Option<&Button> {
        self.buttons.get(usize::from(switch).checked_sub(1)?)
    }

    /// Draw every region, assign every key, then refresh the display
    pub fn apply(&self, session: &mut DeviceSession, renderer: &Renderer) -> Result<(), DeviceError> {
        debug!("Applying panel \"{}\"", self.title);
        {
            let mut writer = PanelWriter::new(session, renderer);
            writer.send_text_for(Region::Title, self.title, self.title_inverted)?;
            for (switch, button) in (1..=SWITCH_COUNT).zip(&self.buttons) {
                match button.label {
                    Label::Icon(icon) => writer.send_icon_for(switch, icon, false)?,
                    Label::Text(text) => writer.send_text_for(Region::Button(switch), text, false)?,
                }
            }
        }

        if let Some(events) = &self.jog_cw {
            session.assign_key(KeyCode::JogCw, events)?;
        }
        if let Some(events) = &self.jog_ccw {
            session.assign_key(KeyCode::JogCcw, events)?;
        }
        for (switch, button) in (1..=SWITCH_COUNT).zip(&self.buttons) {
            session.assign_key(KeyCode::Press(switch), &button.press)?;
            session.assign_key(KeyCode::Release(switch), &button.release)?;
        }

        session.refresh()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use inkkeys_device::StatusCell;
    use inkkeys_transport::mock::ScriptedStream;
    use inkkeys_transport::SerialTransport;

    use super::*;
    use crate::mode::BlenderMode;

    const INFO: &[&str] = &[
        "Inkkeys",
        "TEST 0",
        "N_LED 6",
        "DISP_W 128",
        "DISP_H 296",
        "ROT_CIRCLE_STEPS 30",
        "Done",
    ];

    #[test]
    fn test_button_lookup() {
        let mode = BlenderMode::new(Renderer::new("/nonexistent"));
        let panel = mode.panel();
        assert_eq!(panel.button(1).map(|b| &b.label), Some(&Label::Text("<   Play/Pause   >")));
        assert_eq!(panel.button(9).map(|b| &b.label), Some(&Label::Icon("dot")));
        assert!(panel.button(0).is_none());
        assert!(panel.button(10).is_none());
    }

    #[test]
    fn test_apply_defines_every_region_and_key() {
        let (stream, handle) = ScriptedStream::new();
        handle.reply_once("I", INFO);
        handle.reply_to("R p", &["ok"]);
        handle.reply_to("R o", &["ok"]);
        let transport = SerialTransport::from_stream("mock", Box::new(stream));
        let mut session =
            DeviceSession::connect(transport, StatusCell::new(), Duration::from_secs(1)).unwrap();
        handle.clear_written();

        let mode = BlenderMode::new(Renderer::new("/nonexistent"));
        mode.panel().apply(&mut session, &Renderer::new("/nonexistent")).unwrap();

        let lines = handle.written_lines();
        let draws = lines.iter().filter(|l| l.starts_with("D ")).count();
        assert_eq!(draws, 2 * (1 + usize::from(SWITCH_COUNT)));
        for expected in ["A R kt4f", "A L kt50", "A 1 kp2c", "A A kr2c", "A 4", "A D"] {
            assert!(lines.iter().any(|l| l == expected), "missing {expected}");
        }
        assert_eq!(lines.last().map(String::as_str), Some("R o"));
        assert!(session.image_buffer().is_empty());
    }
}
