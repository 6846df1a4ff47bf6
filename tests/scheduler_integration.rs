//! Scheduler behavior with scripted modes and a scripted keyboard.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use inkkeys_device::{Callback, DeviceError, DeviceSession, KeyCode, StatusCell};
use inkkeys_driver::rules::{Matcher, ModeRule};
use inkkeys_driver::scheduler::{Scheduler, MODE_CHECK_INTERVAL, PROCESS_INTERVAL};
use inkkeys_driver::{Mode, SystemInspector};
use inkkeys_transport::mock::{MockHandle, ScriptedStream};
use inkkeys_transport::SerialTransport;
use regex::Regex;

const INFO: &[&str] = &[
    "Inkkeys",
    "TEST 0",
    "N_LED 6",
    "DISP_W 128",
    "DISP_H 296",
    "ROT_CIRCLE_STEPS 30",
    "Done",
];

const SWITCH_FLASH: &str = "E 2 50 20 0000ff 2";

fn ready_session() -> (DeviceSession, MockHandle) {
    let (stream, handle) = ScriptedStream::new();
    handle.reply_once("I", INFO);
    let transport = SerialTransport::from_stream("mock", Box::new(stream));
    let session = DeviceSession::connect(transport, StatusCell::new(), Duration::from_secs(1))
        .expect("scripted handshake");
    handle.clear_written();
    (session, handle)
}

type Log = Rc<RefCell<Vec<String>>>;

#[derive(Default)]
struct Desktop {
    processes: HashSet<String>,
    window: Option<String>,
}

#[derive(Clone, Default)]
struct FakeInspector(Rc<RefCell<Desktop>>);

impl FakeInspector {
    fn set_window(&self, window: Option<&str>) {
        self.0.borrow_mut().window = window.map(String::from);
    }

    fn start(&self, process: &str) {
        self.0.borrow_mut().processes.insert(process.to_string());
    }
}

impl SystemInspector for FakeInspector {
    fn processes(&mut self) -> HashSet<String> {
        self.0.borrow().processes.clone()
    }

    fn active_window(&mut self) -> Option<String> {
        self.0.borrow().window.clone()
    }
}

/// Records every hook call and binds switch 1 to a log entry
struct RecordingMode {
    name: &'static str,
    log: Log,
    poll_every: Option<Duration>,
}

impl RecordingMode {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: Rc::clone(log),
            poll_every: None,
        }
    }

    fn polling(mut self, interval: Duration) -> Self {
        self.poll_every = Some(interval);
        self
    }

    fn record(&self, event: &str) {
        self.log.borrow_mut().push(format!("{}:{}", self.name, event));
    }
}

impl Mode for RecordingMode {
    fn name(&self) -> &str {
        self.name
    }

    fn activate(&mut self, session: &mut DeviceSession) -> Result<(), DeviceError> {
        self.record("activate");
        let log = Rc::clone(&self.log);
        let name = self.name;
        session.register_callback(
            KeyCode::Press(1),
            Callback::key(move |_| {
                log.borrow_mut().push(format!("{name}:press"));
                Ok(())
            }),
        );
        Ok(())
    }

    fn deactivate(&mut self, _session: &mut DeviceSession) -> Result<(), DeviceError> {
        self.record("deactivate");
        Ok(())
    }

    fn poll(&mut self, _session: &mut DeviceSession) -> Result<Option<Duration>, DeviceError> {
        self.record("poll");
        Ok(self.poll_every)
    }

    fn animate(&mut self, _session: &mut DeviceSession) -> Result<(), DeviceError> {
        self.record("animate");
        Ok(())
    }
}

fn count(log: &Log, entry: &str) -> usize {
    log.borrow().iter().filter(|e| *e == entry).count()
}

fn regex(pattern: &str) -> Matcher {
    Matcher::regex(Regex::new(pattern).unwrap())
}

fn scheduler(
    rules: Vec<ModeRule<RecordingMode>>,
    inspector: &FakeInspector,
) -> Scheduler<RecordingMode, FakeInspector> {
    Scheduler::new(
        rules,
        inspector.clone(),
        "workstation",
        Arc::new(AtomicBool::new(true)),
    )
}

fn three_rules(log: &Log) -> Vec<ModeRule<RecordingMode>> {
    vec![
        ModeRule::always(RecordingMode::new("A", log)).with_process(Matcher::exact("foo.exe")),
        ModeRule::always(RecordingMode::new("B", log)).with_window(regex("^Bar")),
        ModeRule::always(RecordingMode::new("C", log)),
    ]
}

#[test]
fn selects_by_window_and_process_with_fallback() {
    let log = Log::default();
    let desktop = FakeInspector::default();
    desktop.set_window(Some("Editor"));
    let mut scheduler = scheduler(three_rules(&log), &desktop);
    let (mut session, _handle) = ready_session();
    let t0 = Instant::now();

    scheduler.tick(&mut session, t0).unwrap();
    assert_eq!(scheduler.active_mode().map(Mode::name), Some("C"));

    desktop.set_window(Some("Bar baz"));
    scheduler.tick(&mut session, t0 + MODE_CHECK_INTERVAL).unwrap();
    assert_eq!(scheduler.active_mode().map(Mode::name), Some("B"));

    // the process list is only refreshed on its own cadence
    desktop.start("foo.exe");
    scheduler.tick(&mut session, t0 + MODE_CHECK_INTERVAL * 2).unwrap();
    assert_eq!(scheduler.active_mode().map(Mode::name), Some("B"));

    scheduler.tick(&mut session, t0 + PROCESS_INTERVAL).unwrap();
    assert_eq!(scheduler.active_mode().map(Mode::name), Some("A"));
}

#[test]
fn window_match_is_anchored_at_start() {
    let log = Log::default();
    let desktop = FakeInspector::default();
    desktop.set_window(Some("FooBar"));
    let mut scheduler = scheduler(three_rules(&log), &desktop);
    let (mut session, _handle) = ready_session();

    scheduler.tick(&mut session, Instant::now()).unwrap();
    assert_eq!(scheduler.active_mode().map(Mode::name), Some("C"));
}

#[test]
fn first_activation_does_not_flash() {
    let log = Log::default();
    let desktop = FakeInspector::default();
    let mut scheduler = scheduler(three_rules(&log), &desktop);
    let (mut session, handle) = ready_session();

    scheduler.tick(&mut session, Instant::now()).unwrap();
    assert_eq!(count(&log, "C:activate"), 1);
    assert!(!handle.written_lines().iter().any(|l| l == SWITCH_FLASH));
}

#[test]
fn switch_cleans_up_the_old_mode() {
    let log = Log::default();
    let desktop = FakeInspector::default();
    desktop.set_window(Some("Editor"));
    let mut scheduler = scheduler(three_rules(&log), &desktop);
    let (mut session, handle) = ready_session();
    let t0 = Instant::now();

    scheduler.tick(&mut session, t0).unwrap();
    handle.clear_written();
    log.borrow_mut().clear();

    desktop.set_window(Some("Bar"));
    scheduler.tick(&mut session, t0 + MODE_CHECK_INTERVAL).unwrap();

    let entries = log.borrow().clone();
    let deactivate = entries.iter().position(|e| e == "C:deactivate").unwrap();
    let activate = entries.iter().position(|e| e == "B:activate").unwrap();
    assert!(deactivate < activate);

    let lines = handle.written_lines();
    let flash = lines.iter().position(|l| l == SWITCH_FLASH).unwrap();
    let reset = lines.iter().position(|l| l == "R r").unwrap();
    assert!(flash < reset);
    assert_eq!(lines.iter().filter(|l| *l == SWITCH_FLASH).count(), 1);

    // only the new mode's handler sees the key
    log.borrow_mut().clear();
    handle.push_lines(&["1"]);
    scheduler.tick(&mut session, t0 + MODE_CHECK_INTERVAL + Duration::from_millis(10)).unwrap();
    assert_eq!(count(&log, "B:press"), 1);
    assert_eq!(count(&log, "C:press"), 0);
}

#[test]
fn unknown_window_keeps_the_last_one() {
    let log = Log::default();
    let desktop = FakeInspector::default();
    desktop.set_window(Some("Bar"));
    let mut scheduler = scheduler(three_rules(&log), &desktop);
    let (mut session, _handle) = ready_session();
    let t0 = Instant::now();

    scheduler.tick(&mut session, t0).unwrap();
    assert_eq!(scheduler.active_mode().map(Mode::name), Some("B"));

    desktop.set_window(None);
    scheduler.tick(&mut session, t0 + MODE_CHECK_INTERVAL).unwrap();
    assert_eq!(scheduler.active_mode().map(Mode::name), Some("B"));
    assert_eq!(scheduler.signals().window.as_deref(), Some("Bar"));
}

#[test]
fn no_matching_rule_keeps_the_current_mode() {
    let log = Log::default();
    let desktop = FakeInspector::default();
    desktop.set_window(Some("Bar"));
    let rules = vec![ModeRule::always(RecordingMode::new("B", &log)).with_window(regex("^Bar"))];
    let mut scheduler = scheduler(rules, &desktop);
    let (mut session, _handle) = ready_session();
    let t0 = Instant::now();

    scheduler.tick(&mut session, t0).unwrap();
    desktop.set_window(Some("Editor"));
    scheduler.tick(&mut session, t0 + MODE_CHECK_INTERVAL).unwrap();
    assert_eq!(scheduler.active(), Some(0));
    assert_eq!(count(&log, "B:deactivate"), 0);
}

#[test]
fn nothing_active_until_a_rule_matches() {
    let log = Log::default();
    let desktop = FakeInspector::default();
    let rules = vec![ModeRule::always(RecordingMode::new("B", &log)).with_window(regex("^Bar"))];
    let mut scheduler = scheduler(rules, &desktop);
    let (mut session, _handle) = ready_session();

    scheduler.tick(&mut session, Instant::now()).unwrap();
    assert_eq!(scheduler.active(), None);
    assert!(log.borrow().is_empty());
}

#[test]
fn poll_follows_the_returned_interval() {
    let log = Log::default();
    let desktop = FakeInspector::default();
    let rules = vec![ModeRule::always(
        RecordingMode::new("P", &log).polling(Duration::from_secs(1)),
    )];
    let mut scheduler = scheduler(rules, &desktop);
    let (mut session, _handle) = ready_session();
    let t0 = Instant::now();

    for ms in [0, 400, 800, 1000, 1500] {
        scheduler.tick(&mut session, t0 + Duration::from_millis(ms)).unwrap();
    }
    assert_eq!(count(&log, "P:poll"), 2);
    assert_eq!(count(&log, "P:animate"), 5);
}

#[test]
fn poll_returning_none_stops_polling() {
    let log = Log::default();
    let desktop = FakeInspector::default();
    let rules = vec![ModeRule::always(RecordingMode::new("P", &log))];
    let mut scheduler = scheduler(rules, &desktop);
    let (mut session, _handle) = ready_session();
    let t0 = Instant::now();

    for s in 0..4 {
        scheduler.tick(&mut session, t0 + Duration::from_secs(s)).unwrap();
    }
    assert_eq!(count(&log, "P:poll"), 1);
}

#[test]
fn reset_reactivates_without_deactivating() {
    let log = Log::default();
    let desktop = FakeInspector::default();
    let rules = vec![ModeRule::always(RecordingMode::new("P", &log))];
    let mut scheduler = scheduler(rules, &desktop);

    let (mut session, _handle) = ready_session();
    scheduler.tick(&mut session, Instant::now()).unwrap();

    scheduler.reset();
    assert_eq!(scheduler.active(), None);

    let (mut session, handle) = ready_session();
    scheduler.tick(&mut session, Instant::now()).unwrap();
    assert_eq!(count(&log, "P:activate"), 2);
    assert_eq!(count(&log, "P:deactivate"), 0);
    assert!(!handle.written_lines().iter().any(|l| l == SWITCH_FLASH));
}

#[test]
fn disconnect_surfaces_from_tick() {
    let log = Log::default();
    let desktop = FakeInspector::default();
    let rules = vec![ModeRule::always(RecordingMode::new("P", &log))];
    let mut scheduler = scheduler(rules, &desktop);
    let (mut session, handle) = ready_session();
    let t0 = Instant::now();

    scheduler.tick(&mut session, t0).unwrap();
    handle.disconnect();
    assert!(matches!(
        scheduler.tick(&mut session, t0 + Duration::from_millis(10)),
        Err(DeviceError::Transport(_))
    ));
}
