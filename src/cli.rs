// CLI definitions using clap

use clap::{Parser, Subcommand};
use inkkeys_device::{InputEvent, KeyCode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inkkeys")]
#[command(author, version, about = "Host driver for the Inkkeys e-ink macro keyboard")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: ~/.config/inkkeys/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Serial port to use instead of VID/PID discovery
    #[arg(long, global = true, value_name = "DEV")]
    pub port: Option<String>,

    /// Port for the HTTP status listener
    #[arg(long, global = true, value_name = "PORT")]
    pub http_port: Option<u16>,

    /// Do not start the HTTP status listener
    #[arg(long, global = true)]
    pub no_http: bool,

    /// Debug logging (every command sent to the keyboard)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stay connected and follow the focused application (default)
    Run,

    /// List serial ports, marking those that match the keyboard's USB IDs
    #[command(visible_alias = "ls")]
    List,

    /// Connect once and print the reported capabilities
    Info,

    /// Bind a key to input events until the next mode switch
    ///
    /// Examples:
    ///   inkkeys assign sw2 +LCtrl C -LCtrl
    ///   inkkeys assign jog_cw c:VolumeUp
    ///   inkkeys assign sw9-release
    #[command(verbatim_doc_comment)]
    Assign {
        /// Key slot: sw1..sw9 (press), sw1-release..sw9-release, jog_cw, jog_ccw
        key: KeyCode,

        /// Events: Space, +LCtrl (press), -LCtrl (release), 0x68, c:VolumeUp, m:1
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        events: Vec<InputEvent>,
    },
}
