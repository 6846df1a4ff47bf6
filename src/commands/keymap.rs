//! Key assignment command

use inkkeys_device::{InputEvent, KeyCode};

use super::{with_session, CommandResult};
use inkkeys_driver::config::Config;

pub fn assign(config: &Config, key: KeyCode, events: &[InputEvent]) -> CommandResult {
    with_session(config, |session| {
        session.assign_key(key, events)?;
        if events.is_empty() {
            println!("{key} unassigned");
        } else {
            let names: Vec<String> = events.iter().map(InputEvent::to_string).collect();
            println!("{key} → {}", names.join(" "));
        }
        Ok(())
    })
}
