//! Wire protocol constants for the keyboard's line-oriented serial protocol
//!
//! Commands are ASCII lines terminated by `\n`. A DISPLAY command is followed
//! immediately by the raw packed bitmap, written in [`timing::CHUNK_SIZE`]
//! byte chunks.

/// Command prefixes (first token of every outbound line)
pub mod cmd {
    pub const INFO: &str = "I";
    pub const ASSIGN: &str = "A";
    pub const LED: &str = "L";
    pub const LED_ANIMATION: &str = "E";
    pub const DISPLAY: &str = "D";
    pub const REFRESH: &str = "R";
}

/// Arguments to the REFRESH command
pub mod refresh {
    pub const FULL: &str = "f";
    pub const PARTIAL: &str = "p";
    pub const OFF: &str = "o";
    /// Blank the whole panel
    pub const RESET: &str = "r";
}

/// Fixed inbound lines
pub mod sentinel {
    /// First line of the INFO response
    pub const INFO_HEADER: &str = "Inkkeys";
    /// Last line of the INFO response
    pub const INFO_DONE: &str = "Done";
    /// Refresh acknowledgement
    pub const OK: &str = "ok";
}

/// Keys of the `KEY value` lines in the INFO response
pub mod info {
    pub const TEST: &str = "TEST";
    pub const N_LED: &str = "N_LED";
    pub const DISP_W: &str = "DISP_W";
    pub const DISP_H: &str = "DISP_H";
    pub const ROT_CIRCLE_STEPS: &str = "ROT_CIRCLE_STEPS";
}

/// Serial link timing
pub mod timing {
    use std::time::Duration;

    pub const BAUD_RATE: u32 = 115_200;
    /// Per-read timeout of the port
    pub const READ_TIMEOUT: Duration = Duration::from_secs(1);
    /// Upper bound for a single write to drain
    pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);
    /// Default timeout of the INFO handshake
    pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(3);
    /// Default timeout for a display refresh acknowledgement
    pub const REFRESH_TIMEOUT: Duration = Duration::from_secs(5);
    /// Sleep between polls while waiting for a response line
    pub const RESPONSE_POLL_INTERVAL: Duration = Duration::from_millis(100);
    /// Maximum binary payload per write; larger writes overrun the firmware's receive buffer
    pub const CHUNK_SIZE: usize = 100;
}

/// Build a command line from a prefix and its arguments
pub fn command_line<I, S>(cmd: &str, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = String::from(cmd);
    for arg in args {
        line.push(' ');
        line.push_str(arg.as_ref());
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_without_args() {
        assert_eq!(command_line::<_, &str>(cmd::INFO, []), "I");
    }

    #[test]
    fn test_command_line_with_args() {
        assert_eq!(
            command_line(cmd::DISPLAY, ["0", "12", "40", "128"]),
            "D 0 12 40 128"
        );
        assert_eq!(command_line(cmd::REFRESH, [refresh::RESET]), "R r");
    }
}
