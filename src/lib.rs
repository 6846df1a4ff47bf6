// Inkkeys host driver - shared library
// Mode rules, scheduling, reconnect supervision, and the status listener

pub mod config;
pub mod error;
pub mod inspector;
pub mod mode;
pub mod render;
pub mod rules;
pub mod scheduler;
pub mod status_listener;
pub mod supervisor;

pub use config::{Config, RuleConfig};
pub use error::{ConfigError, RenderError, StatusError};
pub use inspector::{LinuxInspector, SystemInspector};
pub use mode::{Mode, ModeKind, ModeName};
pub use render::Renderer;
pub use rules::{Matcher, ModeRule, Signals};
pub use scheduler::Scheduler;
pub use supervisor::{Connector, SerialConnector, Supervisor};
