//! Device session: handshake, command vocabulary, and inbound event dispatch

use std::time::{Duration, Instant};

use inkkeys_transport::protocol::{cmd, command_line, info as info_key, refresh, sentinel, timing};
use inkkeys_transport::{ResponseSection, SerialTransport, TransportError};
use tracing::{debug, info, warn};

use crate::callbacks::{Callback, CallbackTable};
use crate::display::{Bitmap, DisplayLayout, ImageRegion, Region};
use crate::error::DeviceError;
use crate::input::InputEvent;
use crate::keys::{KeyCode, KeyEvent};
use crate::led::{FadeStep, LedAnimation, LedState, RgbColor};
use crate::status::StatusCell;

/// Capabilities reported by the firmware during the INFO handshake
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Running the hardware test firmware
    pub test_mode: bool,
    pub n_leds: usize,
    pub display_width: u32,
    pub display_height: u32,
    /// Jog dial steps per full revolution
    pub rot_circle_steps: u32,
}

impl DeviceCapabilities {
    /// Apply one `KEY value` info line; `false` if the line is not understood
    fn apply(&mut self, line: &str) -> bool {
        let Some((key, value)) = line.split_once(' ') else {
            return false;
        };
        let value = value.trim();
        match key {
            info_key::TEST => {
                self.test_mode = !value.starts_with('0');
                true
            }
            info_key::N_LED => value.parse().map(|v| self.n_leds = v).is_ok(),
            info_key::DISP_W => value.parse().map(|v| self.display_width = v).is_ok(),
            info_key::DISP_H => value.parse().map(|v| self.display_height = v).is_ok(),
            info_key::ROT_CIRCLE_STEPS => value.parse().map(|v| self.rot_circle_steps = v).is_ok(),
            _ => false,
        }
    }

    pub fn layout(&self) -> DisplayLayout {
        DisplayLayout::new(self.display_width, self.display_height)
    }
}

/// Per-connection session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    InfoRequested,
    Ready,
}

/// A connected keyboard
///
/// Owns the transport for the lifetime of the connection. Any error returned
/// from an operation means the connection should be dropped; the session
/// never retries on its own.
pub struct DeviceSession {
    transport: SerialTransport,
    state: SessionState,
    caps: DeviceCapabilities,
    callbacks: CallbackTable,
    images: Vec<ImageRegion>,
    leds: Option<LedState>,
    status: StatusCell,
}

impl DeviceSession {
    /// Wrap a freshly opened transport; the handshake has not run yet
    pub fn new(transport: SerialTransport, status: StatusCell) -> Self {
        Self {
            transport,
            state: SessionState::Disconnected,
            caps: DeviceCapabilities::default(),
            callbacks: CallbackTable::new(),
            images: Vec::new(),
            leds: None,
            status,
        }
    }

    /// Wrap `transport` and run the INFO handshake
    ///
    /// On failure the transport is closed before the error is returned.
    pub fn connect(
        transport: SerialTransport,
        status: StatusCell,
        timeout: Duration,
    ) -> Result<Self, DeviceError> {
        info!("Connecting to {}", transport.address());
        let mut session = Self::new(transport, status);
        if let Err(e) = session.request_info(timeout) {
            session.close();
            return Err(e);
        }
        info!("Connected to {}", session.transport.address());
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.caps
    }

    pub fn layout(&self) -> DisplayLayout {
        self.caps.layout()
    }

    /// Status pushed from outside, consumed by modes
    pub fn status(&self) -> &StatusCell {
        &self.status
    }

    pub fn transport(&self) -> &SerialTransport {
        &self.transport
    }

    /// Close the connection; every later command fails
    pub fn close(&mut self) {
        self.transport.close();
        self.state = SessionState::Disconnected;
    }

    // ------------------------------------------------------------------
    // Handshake
    // ------------------------------------------------------------------

    /// Send INFO and collect the capability lines until `Done`
    ///
    /// The whole exchange, including both waits, must finish within `timeout`.
    pub fn request_info(&mut self, timeout: Duration) -> Result<DeviceCapabilities, DeviceError> {
        info!("Requesting device info...");
        let deadline = Instant::now() + timeout;
        let mut caps = DeviceCapabilities::default();

        let complete = {
            let mut section = self.transport.begin_response();
            section.send_line(cmd::INFO)?;
            self.state = SessionState::InfoRequested;
            read_info(&mut section, &mut caps, deadline)
        };

        match complete {
            Ok(true) => {}
            Ok(false) => {
                self.state = SessionState::Disconnected;
                warn!("Device info incomplete after {:?}", timeout);
                return Err(DeviceError::HandshakeTimeout(timeout));
            }
            Err(e) => {
                self.state = SessionState::Disconnected;
                return Err(e.into());
            }
        }

        info!("End of info received");
        info!("Test mode: {}", caps.test_mode);
        info!("Number of LEDs: {}", caps.n_leds);
        info!("Display width: {}", caps.display_width);
        info!("Display height: {}", caps.display_height);
        info!("Rotation circle steps: {}", caps.rot_circle_steps);

        self.caps = caps;
        if caps.test_mode {
            self.state = SessionState::Disconnected;
            return Err(DeviceError::RestrictedFirmware);
        }
        self.state = SessionState::Ready;
        Ok(caps)
    }

    // ------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------

    /// Bind `key` to a sequence of input events; an empty sequence unbinds it
    pub fn assign_key(&self, key: KeyCode, events: &[InputEvent]) -> Result<(), DeviceError> {
        let mut args = vec![key.id().to_string()];
        args.extend(events.iter().map(InputEvent::encode));
        self.transport.send_line(&command_line(cmd::ASSIGN, args))?;
        Ok(())
    }

    pub fn register_callback(&mut self, key: KeyCode, callback: Callback) {
        self.callbacks.register(key, callback);
    }

    pub fn clear_callback(&mut self, key: KeyCode) {
        self.callbacks.clear(key);
    }

    pub fn clear_callbacks(&mut self) {
        self.callbacks.clear_all();
    }

    pub fn callbacks(&self) -> &CallbackTable {
        &self.callbacks
    }

    /// Read at most one inbound line and dispatch it; never blocks
    ///
    /// Does nothing while a response section is active elsewhere, so lines
    /// stay queued for the next tick.
    pub fn poll(&mut self) -> Result<(), DeviceError> {
        let line = {
            let Some(section) = self.transport.try_begin_response() else {
                return Ok(());
            };
            section.read_line()?
        };
        match line {
            Some(line) => self.dispatch(&line),
            None => Ok(()),
        }
    }

    /// Route one inbound line to its registered handler
    pub fn dispatch(&mut self, line: &str) -> Result<(), DeviceError> {
        let (key, delta) = match KeyEvent::parse(line) {
            Some(KeyEvent::Jog(delta)) => (KeyCode::Jog, Some(delta)),
            Some(KeyEvent::Key(key)) => (key, None),
            None => {
                debug!("Dropping line: {:?}", line);
                return Ok(());
            }
        };

        let Some(mut callback) = self.callbacks.take(key) else {
            return Ok(());
        };
        let result = match (&mut callback, delta) {
            (Callback::Jog(handler), Some(delta)) => handler(self, delta),
            (Callback::Key(handler), None) => handler(self),
            _ => {
                debug!("Handler for {} does not accept {:?}", key, line);
                Ok(())
            }
        };
        self.callbacks.restore(key, callback);
        result
    }

    // ------------------------------------------------------------------
    // LEDs
    // ------------------------------------------------------------------

    fn send_leds(&self, colors: &[RgbColor]) -> Result<(), DeviceError> {
        let line = command_line(cmd::LED, colors.iter().map(RgbColor::to_string));
        self.transport.send_line(&line)?;
        Ok(())
    }

    /// Set every LED; `colors` must have exactly one entry per LED
    pub fn set_leds(&mut self, colors: &[RgbColor]) -> Result<(), DeviceError> {
        if colors.len() != self.caps.n_leds {
            return Err(DeviceError::InvalidParameter(format!(
                "expected {} LED colors, got {}",
                self.caps.n_leds,
                colors.len()
            )));
        }
        self.leds = Some(LedState::new(colors.to_vec(), Instant::now()));
        self.send_leds(colors)
    }

    /// Advance the fade of the last set colors; cheap when nothing is fading
    pub fn fade_leds(&mut self) -> Result<(), DeviceError> {
        self.fade_leds_at(Instant::now())
    }

    pub fn fade_leds_at(&mut self, now: Instant) -> Result<(), DeviceError> {
        let Some(state) = &self.leds else {
            return Ok(());
        };
        match state.step_at(now) {
            FadeStep::Hold => Ok(()),
            FadeStep::Dim(colors) => self.send_leds(&colors),
            FadeStep::Off => {
                self.leds = None;
                self.send_leds(&vec![RgbColor::BLACK; self.caps.n_leds])
            }
        }
    }

    pub fn led_state(&self) -> Option<&LedState> {
        self.leds.as_ref()
    }

    /// Start an animation that the firmware runs by itself
    pub fn send_led_animation(&self, animation: &LedAnimation) -> Result<(), DeviceError> {
        self.transport
            .send_line(&command_line(cmd::LED_ANIMATION, animation.args()))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Display
    // ------------------------------------------------------------------

    /// Draw `bitmap` at `(x, y)` and remember it for the next refresh replay
    pub fn send_image(&mut self, x: u32, y: u32, bitmap: Bitmap) -> Result<(), DeviceError> {
        let region = ImageRegion { x, y, bitmap };
        send_region(&self.transport, &region)?;
        self.images.push(region);
        Ok(())
    }

    /// Draw `bitmap` into a layout region, rescaling it to fit if needed
    pub fn send_image_for(&mut self, region: Region, bitmap: Bitmap) -> Result<(), DeviceError> {
        let area = self.layout().area_for(region)?;
        let bitmap = if (bitmap.width(), bitmap.height()) != (area.w, area.h) {
            debug!(
                "Rescaling image from {}x{} to {}x{}",
                bitmap.width(),
                bitmap.height(),
                area.w,
                area.h
            );
            bitmap.resized(area.w, area.h)
        } else {
            bitmap
        };
        self.send_image(area.x, area.y, bitmap)
    }

    /// Regions drawn since the last replay, in drawing order
    pub fn image_buffer(&self) -> &[ImageRegion] {
        &self.images
    }

    /// Blank the whole panel
    pub fn reset_display(&self) -> Result<(), DeviceError> {
        self.transport
            .send_line(&command_line(cmd::REFRESH, [refresh::RESET]))?;
        Ok(())
    }

    /// Refresh the panel with the default timeout
    pub fn refresh(&mut self) -> Result<bool, DeviceError> {
        self.update_display(false, timing::REFRESH_TIMEOUT)
    }

    /// Run a refresh cycle and replay the image buffer
    ///
    /// Returns `Ok(false)` if an acknowledgement does not arrive within
    /// `timeout`; the session stays usable in that case.
    pub fn update_display(&mut self, full_refresh: bool, timeout: Duration) -> Result<bool, DeviceError> {
        let mut section = self.transport.begin_response();
        let kind = if full_refresh {
            refresh::FULL
        } else {
            refresh::PARTIAL
        };

        section.send_line(&command_line(cmd::REFRESH, [kind]))?;
        if !await_ok(&mut section, timeout)? {
            warn!("Display refresh not acknowledged within {:?}", timeout);
            return Ok(false);
        }

        let regions = std::mem::take(&mut self.images);
        debug!("Replaying {} image region(s)", regions.len());
        for region in &regions {
            send_region(&section, region)?;
        }

        section.send_line(&command_line(cmd::REFRESH, [refresh::OFF]))?;
        if !await_ok(&mut section, timeout)? {
            warn!("Refresh off not acknowledged within {:?}", timeout);
            return Ok(false);
        }
        Ok(true)
    }
}

/// Anything that can write command lines and binary payloads
trait Sender {
    fn line(&self, text: &str) -> Result<(), TransportError>;
    fn binary(&self, data: &[u8]) -> Result<(), TransportError>;
}

impl Sender for SerialTransport {
    fn line(&self, text: &str) -> Result<(), TransportError> {
        self.send_line(text)
    }

    fn binary(&self, data: &[u8]) -> Result<(), TransportError> {
        self.send_binary(data)
    }
}

impl Sender for ResponseSection<'_> {
    fn line(&self, text: &str) -> Result<(), TransportError> {
        self.send_line(text)
    }

    fn binary(&self, data: &[u8]) -> Result<(), TransportError> {
        self.send_binary(data)
    }
}

fn send_region(sender: &impl Sender, region: &ImageRegion) -> Result<(), TransportError> {
    let ImageRegion { x, y, bitmap } = region;
    let args = [x, y, &bitmap.width(), &bitmap.height()].map(u32::to_string);
    sender.line(&command_line(cmd::DISPLAY, args))?;
    sender.binary(&bitmap.to_wire_bytes())
}

fn await_ok(section: &mut ResponseSection<'_>, timeout: Duration) -> Result<bool, TransportError> {
    let deadline = Instant::now() + timeout;
    Ok(section
        .wait_for_line(|l| l == sentinel::OK, deadline)?
        .is_some())
}

const INFO_KEYS: [&str; 5] = [
    info_key::TEST,
    info_key::N_LED,
    info_key::DISP_W,
    info_key::DISP_H,
    info_key::ROT_CIRCLE_STEPS,
];

/// Capability lines start with a known key; anything else inside the info
/// block is an unrelated event and stays queued
fn is_info_line(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .is_some_and(|key| INFO_KEYS.contains(&key))
}

fn read_info(
    section: &mut ResponseSection<'_>,
    caps: &mut DeviceCapabilities,
    deadline: Instant,
) -> Result<bool, TransportError> {
    if section
        .wait_for_line(|l| l == sentinel::INFO_HEADER, deadline)?
        .is_none()
    {
        return Ok(false);
    }
    debug!("Header found, waiting for info lines");

    let accept = |l: &str| l == sentinel::INFO_DONE || is_info_line(l);
    loop {
        match section.wait_for_line(accept, deadline)? {
            None => return Ok(false),
            Some(line) if line == sentinel::INFO_DONE => return Ok(true),
            Some(line) => {
                if !caps.apply(&line) {
                    debug!("Skipping: {:?}", line);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_info_lines() {
        let mut caps = DeviceCapabilities::default();
        assert!(caps.apply("N_LED 6"));
        assert!(caps.apply("DISP_W 128"));
        assert!(caps.apply("DISP_H 296"));
        assert!(caps.apply("ROT_CIRCLE_STEPS 30"));
        assert!(caps.apply("TEST 0"));
        assert!(!caps.test_mode);
        assert!(caps.apply("TEST 1"));
        assert!(caps.test_mode);
        assert_eq!(caps.n_leds, 6);
        assert_eq!((caps.display_width, caps.display_height), (128, 296));
        assert_eq!(caps.rot_circle_steps, 30);
    }

    #[test]
    fn test_info_line_recognition() {
        assert!(is_info_line("N_LED 6"));
        assert!(is_info_line("ROT_CIRCLE_STEPS 30"));
        assert!(!is_info_line("3"));
        assert!(!is_info_line("J-2"));
        assert!(!is_info_line(""));
    }

    #[test]
    fn test_unknown_info_lines_skipped() {
        let mut caps = DeviceCapabilities::default();
        assert!(!caps.apply("VERSION 2"));
        assert!(!caps.apply("N_LED six"));
        assert!(!caps.apply("Inkkeys"));
        assert_eq!(caps, DeviceCapabilities::default());
    }
}
