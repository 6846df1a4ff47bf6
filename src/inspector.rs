//! Host signals: running processes, focused window title, hostname

use std::collections::HashSet;
use std::fs;
use std::process::Command;

use tracing::debug;

/// Source of the signals mode rules are matched against
pub trait SystemInspector {
    /// Names of all running processes
    fn processes(&mut self) -> HashSet<String>;

    /// Title of the focused window; `None` if it cannot be determined
    fn active_window(&mut self) -> Option<String>;
}

/// Reads `/proc` and asks `xdotool` for the focused window
#[derive(Debug, Default)]
pub struct LinuxInspector;

impl LinuxInspector {
    pub fn new() -> Self {
        Self
    }
}

impl SystemInspector for LinuxInspector {
    fn processes(&mut self) -> HashSet<String> {
        let Ok(entries) = fs::read_dir("/proc") else {
            return HashSet::new();
        };
        entries
            .flatten()
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .is_some_and(|n| n.bytes().all(|b| b.is_ascii_digit()))
            })
            .filter_map(|e| fs::read_to_string(e.path().join("comm")).ok())
            .map(|comm| comm.trim_end().to_string())
            .filter(|comm| !comm.is_empty())
            .collect()
    }

    fn active_window(&mut self) -> Option<String> {
        let output = Command::new("xdotool")
            .args(["getactivewindow", "getwindowname"])
            .output()
            .map_err(|e| debug!("xdotool failed: {e}"))
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let title = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        (!title.is_empty()).then_some(title)
    }
}

/// Machine hostname, empty if it cannot be determined
pub fn hostname() -> String {
    ["/proc/sys/kernel/hostname", "/etc/hostname"]
        .iter()
        .filter_map(|path| fs::read_to_string(path).ok())
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_default()
}
