//! Tests against a real keyboard.
//!
//! Run with: cargo test -p inkkeys-device --test hardware -- --ignored --nocapture

use std::time::Duration;

use inkkeys_device::{DeviceSession, SerialDiscovery, StatusCell};

fn open_keyboard() -> DeviceSession {
    let discovery = SerialDiscovery::new();
    let port = discovery
        .candidates()
        .expect("serial enumeration")
        .into_iter()
        .next()
        .expect("No keyboard found - plug in the device");
    let transport = discovery.open(&port).expect("open port");
    DeviceSession::connect(transport, StatusCell::new(), Duration::from_secs(3))
        .expect("handshake")
}

#[test]
#[ignore] // requires hardware
fn handshake_reports_display() {
    let session = open_keyboard();
    let caps = session.capabilities();
    assert!(caps.n_leds > 0);
    assert!(caps.display_width > 0 && caps.display_height > 0);
}

#[test]
#[ignore] // requires hardware
fn blank_and_refresh() {
    let mut session = open_keyboard();
    session.reset_display().unwrap();
    assert!(session.refresh().unwrap());
}
