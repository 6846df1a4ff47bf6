//! The long-running driver

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use inkkeys_device::StatusCell;
use tracing::{info, warn};

use super::{connector, CommandResult};
use inkkeys_driver::config::Config;
use inkkeys_driver::inspector::{self, LinuxInspector};
use inkkeys_driver::scheduler::Scheduler;
use inkkeys_driver::status_listener;
use inkkeys_driver::supervisor::Supervisor;

/// Stay connected and switch modes with the focused application until Ctrl-C
pub fn run(config: &Config) -> CommandResult {
    let rules = config.build_rules().context("Invalid mode rules")?;
    info!("{} mode rule(s) loaded", rules.len());

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl-C handler")?;

    let status = StatusCell::new();
    if config.http_enabled {
        if let Err(e) = status_listener::spawn(config.http_port, status.clone()) {
            warn!("Status listener not started: {e}");
        }
    }

    let hostname = inspector::hostname();
    info!("Running on {}", hostname);
    let mut scheduler = Scheduler::new(rules, LinuxInspector::new(), hostname, Arc::clone(&running));
    let mut supervisor = Supervisor::new(connector(config, status), running)
        .with_retry_delay(config.retry_delay());

    println!("I will try to stay connected. Press Ctrl+C to quit.");
    supervisor.run(|session| {
        scheduler.reset();
        scheduler.run(session)
    });
    println!("Ok, bye.");
    Ok(())
}
