//! Reconnect loop against a connector that fails on demand.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use inkkeys_device::{DeviceError, DeviceSession, StatusCell, TransportError};
use inkkeys_driver::supervisor::{Connector, Supervisor};
use inkkeys_transport::mock::{MockHandle, ScriptedStream};
use inkkeys_transport::SerialTransport;

const INFO: &[&str] = &[
    "Inkkeys",
    "TEST 0",
    "N_LED 6",
    "DISP_W 128",
    "DISP_H 296",
    "ROT_CIRCLE_STEPS 30",
    "Done",
];

const DELAY: Duration = Duration::from_millis(50);

/// Fails the first `failures` connects, then hands out scripted sessions
struct FlakyConnector {
    failures: u32,
    connects: u32,
    handles: Vec<MockHandle>,
}

impl FlakyConnector {
    fn new(failures: u32) -> Self {
        Self {
            failures,
            connects: 0,
            handles: Vec::new(),
        }
    }
}

impl Connector for FlakyConnector {
    fn candidates(&mut self) -> Result<Vec<String>, TransportError> {
        Ok(vec!["mock".to_string()])
    }

    fn connect(&mut self, address: &str) -> Result<DeviceSession, DeviceError> {
        self.connects += 1;
        if self.failures > 0 {
            self.failures -= 1;
            return Err(TransportError::DeviceNotFound(address.to_string()).into());
        }
        let (stream, handle) = ScriptedStream::new();
        handle.reply_once("I", INFO);
        self.handles.push(handle);
        let transport = SerialTransport::from_stream(address, Box::new(stream));
        DeviceSession::connect(transport, StatusCell::new(), Duration::from_secs(1))
    }
}

fn supervisor(failures: u32) -> (Supervisor<FlakyConnector>, Arc<AtomicBool>) {
    let running = Arc::new(AtomicBool::new(true));
    let supervisor =
        Supervisor::new(FlakyConnector::new(failures), Arc::clone(&running)).with_retry_delay(DELAY);
    (supervisor, running)
}

#[test]
fn retries_until_the_device_answers() {
    let (mut supervisor, running) = supervisor(2);
    let mut sessions = 0;
    let start = Instant::now();

    supervisor.run(|_session| {
        sessions += 1;
        running.store(false, Ordering::SeqCst);
        Ok(())
    });

    assert_eq!(sessions, 1);
    assert_eq!(supervisor.attempts(), 3);
    assert_eq!(supervisor.connector().connects, 3);
    assert!(start.elapsed() >= DELAY * 2);
}

#[test]
fn display_is_reset_before_work_starts() {
    let (mut supervisor, running) = supervisor(0);
    let mut seen = Vec::new();

    supervisor.run(|_session| {
        running.store(false, Ordering::SeqCst);
        Ok(())
    });
    for handle in &supervisor.connector().handles {
        seen.extend(handle.written_lines());
    }
    assert_eq!(seen, ["I", "R r"]);
}

#[test]
fn session_error_leads_to_reconnect() {
    let (mut supervisor, running) = supervisor(0);
    let mut sessions = 0;

    supervisor.run(|session| {
        sessions += 1;
        if sessions == 1 {
            return session.set_leds(&[]);
        }
        running.store(false, Ordering::SeqCst);
        Ok(())
    });

    assert_eq!(sessions, 2);
    assert_eq!(supervisor.attempts(), 2);
}

#[test]
fn panic_in_work_is_survived() {
    let (mut supervisor, running) = supervisor(0);
    let mut sessions = 0;

    supervisor.run(|_session| {
        sessions += 1;
        if sessions == 1 {
            panic!("mode exploded");
        }
        running.store(false, Ordering::SeqCst);
        Ok(())
    });

    assert_eq!(sessions, 2);
}

#[test]
fn cleared_flag_stops_before_connecting() {
    let (mut supervisor, running) = supervisor(0);
    running.store(false, Ordering::SeqCst);

    supervisor.run(|_session| panic!("no session expected"));
    assert_eq!(supervisor.attempts(), 0);
}

#[test]
fn retry_sleep_is_interruptible() {
    let running = Arc::new(AtomicBool::new(true));
    let mut supervisor = Supervisor::new(FlakyConnector::new(u32::MAX), Arc::clone(&running))
        .with_retry_delay(Duration::from_secs(30));

    let flag = Arc::clone(&running);
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        flag.store(false, Ordering::SeqCst);
    });

    let start = Instant::now();
    supervisor.run(|_session| Ok(()));
    stopper.join().unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(supervisor.attempts(), 1);
}
