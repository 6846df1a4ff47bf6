//! Read-only commands

use super::{discovery, with_session, CommandResult};
use inkkeys_driver::config::Config;

/// Print every serial port, marking those that match the configured IDs
pub fn list(config: &Config) -> CommandResult {
    let ports = discovery(config).list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }
    for port in ports {
        let marker = if port.matches(config.vid, config.pid) {
            "*"
        } else {
            " "
        };
        println!("{marker} {port}");
    }
    Ok(())
}

/// Handshake once and print the capabilities
pub fn info(config: &Config) -> CommandResult {
    with_session(config, |session| {
        let caps = session.capabilities();
        println!("Port:             {}", session.transport().address());
        println!("LEDs:             {}", caps.n_leds);
        println!("Display:          {}x{}", caps.display_width, caps.display_height);
        println!("Jog dial steps:   {}", caps.rot_circle_steps);
        println!("Test firmware:    {}", caps.test_mode);
        Ok(())
    })
}
