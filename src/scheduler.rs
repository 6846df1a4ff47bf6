//! Main loop: mode selection, mode polling, animation, and event pumping
//!
//! Four cadences run against one monotonic clock:
//!
//! | Cadence          | Interval                      |
//! |------------------|-------------------------------|
//! | process list     | 5 s                           |
//! | mode selection   | 0.5 s                         |
//! | mode poll        | whatever `Mode::poll` returned |
//! | animate + events | every tick, at most 30 per s  |

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use inkkeys_device::{DeviceError, DeviceSession, LedAnimation, RgbColor};
use tracing::{debug, info};

use crate::inspector::SystemInspector;
use crate::mode::Mode;
use crate::rules::{self, ModeRule, Signals};

pub const PROCESS_INTERVAL: Duration = Duration::from_secs(5);
pub const MODE_CHECK_INTERVAL: Duration = Duration::from_millis(500);
pub const FRAME_BUDGET: Duration = Duration::from_nanos(1_000_000_000 / 30);

/// Flash shown while the display switches to a new mode
pub const SWITCH_FLASH: LedAnimation = LedAnimation::flash(RgbColor::BLUE, 2);

fn due(last: Option<Instant>, interval: Duration, now: Instant) -> bool {
    last.map_or(true, |last| now.saturating_duration_since(last) >= interval)
}

/// Drives the active mode on one session at a time
pub struct Scheduler<M, I> {
    rules: Vec<ModeRule<M>>,
    inspector: I,
    signals: Signals,
    running: Arc<AtomicBool>,
    active: Option<usize>,
    last_processes: Option<Instant>,
    last_mode_check: Option<Instant>,
    last_poll: Option<Instant>,
    poll_interval: Option<Duration>,
}

impl<M: Mode, I: SystemInspector> Scheduler<M, I> {
    pub fn new(
        rules: Vec<ModeRule<M>>,
        inspector: I,
        hostname: impl Into<String>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            rules,
            inspector,
            signals: Signals {
                processes: HashSet::new(),
                window: None,
                hostname: hostname.into(),
            },
            running,
            active: None,
            last_processes: None,
            last_mode_check: None,
            last_poll: None,
            poll_interval: None,
        }
    }

    pub fn rules(&self) -> &[ModeRule<M>] {
        &self.rules
    }

    /// Index into [`rules`](Self::rules) of the active mode
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn active_mode(&self) -> Option<&M> {
        self.active.map(|i| &self.rules[i].mode)
    }

    pub fn signals(&self) -> &Signals {
        &self.signals
    }

    /// Forget the active mode and all timers, for a fresh connection
    ///
    /// The old mode is not deactivated; its session is gone.
    pub fn reset(&mut self) {
        self.active = None;
        self.last_processes = None;
        self.last_mode_check = None;
        self.last_poll = None;
        self.poll_interval = None;
    }

    /// Run ticks until the running flag is cleared or the session fails
    pub fn run(&mut self, session: &mut DeviceSession) -> Result<(), DeviceError> {
        info!("Scheduler started");
        while self.running.load(Ordering::SeqCst) {
            let start = Instant::now();
            self.tick(session, start)?;
            if let Some(rest) = FRAME_BUDGET.checked_sub(start.elapsed()) {
                thread::sleep(rest);
            }
        }
        info!("Scheduler stopped");
        Ok(())
    }

    /// One loop iteration at time `now`
    pub fn tick(&mut self, session: &mut DeviceSession, now: Instant) -> Result<(), DeviceError> {
        if due(self.last_processes, PROCESS_INTERVAL, now) {
            self.signals.processes = self.inspector.processes();
            self.last_processes = Some(now);
            debug!("{} processes running", self.signals.processes.len());
        }

        if due(self.last_mode_check, MODE_CHECK_INTERVAL, now) {
            if let Some(window) = self.inspector.active_window() {
                if self.signals.window.as_deref() != Some(window.as_str()) {
                    debug!("Active window: {}", window);
                }
                self.signals.window = Some(window);
            }
            self.last_mode_check = Some(now);
            if let Some(selected) = rules::select(&self.rules, &self.signals) {
                if self.active != Some(selected) {
                    self.switch_to(session, selected)?;
                }
            }
        }

        let Some(active) = self.active else {
            return session.poll();
        };
        let mode = &mut self.rules[active].mode;

        if let Some(interval) = self.poll_interval {
            if due(self.last_poll, interval, now) {
                self.poll_interval = mode.poll(session)?;
                self.last_poll = Some(now);
            }
        }

        mode.animate(session)?;
        session.poll()
    }

    fn switch_to(&mut self, session: &mut DeviceSession, index: usize) -> Result<(), DeviceError> {
        if let Some(old) = self.active.take() {
            let mode = &mut self.rules[old].mode;
            info!("Leaving mode {}", mode.name());
            mode.deactivate(session)?;
            session.clear_callbacks();
            session.send_led_animation(&SWITCH_FLASH)?;
            session.reset_display()?;
        }

        let mode = &mut self.rules[index].mode;
        info!("Activating mode {}", mode.name());
        mode.activate(session)?;
        self.active = Some(index);
        self.poll_interval = Some(Duration::ZERO);
        self.last_poll = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due() {
        let t0 = Instant::now();
        assert!(due(None, PROCESS_INTERVAL, t0));
        assert!(!due(Some(t0), PROCESS_INTERVAL, t0 + Duration::from_secs(4)));
        assert!(due(Some(t0), PROCESS_INTERVAL, t0 + PROCESS_INTERVAL));
        assert!(due(Some(t0), Duration::ZERO, t0));
    }

    #[test]
    fn test_frame_budget() {
        assert_eq!(FRAME_BUDGET.as_millis(), 33);
    }
}
