//! Configuration file: `~/.config/inkkeys/config.toml`
//!
//! ```toml
//! port = "/dev/ttyACM0"   # optional, skips discovery
//! http_port = 8080
//! icons_dir = "/usr/share/inkkeys/icons"
//!
//! [[rules]]
//! mode = "gimp"
//! window = "^GIMP.*"
//!
//! [[rules]]
//! mode = "fallback"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use inkkeys_transport::{PRODUCT_ID, VENDOR_ID};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mode::{ModeKind, ModeName};
use crate::render::Renderer;
use crate::rules::{Matcher, ModeRule};

/// One `[[rules]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub mode: String,
    /// Exact process name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    /// Regex matched at the start of the focused window title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<String>,
    /// Regex matched at the start of the hostname
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl RuleConfig {
    fn new(mode: &str) -> Self {
        Self {
            mode: mode.to_string(),
            process: None,
            window: None,
            hostname: None,
        }
    }

    fn pattern(&self, field: &'static str, pattern: &str) -> Result<Matcher, ConfigError> {
        Regex::new(pattern)
            .map(Matcher::regex)
            .map_err(|source| ConfigError::Pattern {
                mode: self.mode.clone(),
                field,
                source,
            })
    }

    /// Build the runtime rule, instantiating its mode
    pub fn build(&self, renderer: &Renderer) -> Result<ModeRule<ModeKind>, ConfigError> {
        let name: ModeName = self.mode.parse()?;
        let mut rule = ModeRule::always(ModeKind::new(name, renderer.clone()));
        if let Some(process) = &self.process {
            rule = rule.with_process(Matcher::exact(process));
        }
        if let Some(window) = &self.window {
            rule = rule.with_window(self.pattern("window", window)?);
        }
        if let Some(hostname) = &self.hostname {
            rule = rule.with_hostname(self.pattern("hostname", hostname)?);
        }
        Ok(rule)
    }
}

fn default_rules() -> Vec<RuleConfig> {
    vec![
        RuleConfig {
            window: Some("^Blender".into()),
            ..RuleConfig::new("blender")
        },
        RuleConfig {
            window: Some("^GIMP.*".into()),
            ..RuleConfig::new("gimp")
        },
        RuleConfig {
            hostname: Some("^Mac-Min.*".into()),
            ..RuleConfig::new("mini-fallback")
        },
        RuleConfig::new("fallback"),
    ]
}

fn default_icons_dir() -> PathBuf {
    PathBuf::from("icons")
}

/// Driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Explicit serial port; discovery by VID/PID when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    pub vid: u16,
    pub pid: u16,
    pub http_port: u16,
    pub http_enabled: bool,
    pub icons_dir: PathBuf,
    pub retry_delay_ms: u64,
    pub rules: Vec<RuleConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: None,
            vid: VENDOR_ID,
            pid: PRODUCT_ID,
            http_port: 8080,
            http_enabled: true,
            icons_dir: default_icons_dir(),
            retry_delay_ms: 3000,
            rules: default_rules(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("inkkeys")
            .join("config.toml")
    }

    /// Load config from a file, or return the defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Instantiate every rule in order
    pub fn build_rules(&self) -> Result<Vec<ModeRule<ModeKind>>, ConfigError> {
        let renderer = Renderer::new(&self.icons_dir);
        self.rules.iter().map(|r| r.build(&renderer)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;
    use crate::rules::{select, Signals};

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_default_config_serializes() {
        let toml_str = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(toml_str.contains("http_port = 8080"));
        assert!(toml_str.contains("mode = \"mini-fallback\""));
        assert_eq!(Config::parse(&toml_str).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_override() {
        let config = Config::parse(
            r#"
            port = "/dev/ttyACM1"
            http_enabled = false

            [[rules]]
            mode = "gimp"
            process = "gimp-2.10"

            [[rules]]
            mode = "fallback"
            "#,
        )
        .unwrap();
        assert_eq!(config.port.as_deref(), Some("/dev/ttyACM1"));
        assert!(!config.http_enabled);
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].process.as_deref(), Some("gimp-2.10"));
    }

    #[test]
    fn test_default_rules_select_by_window_and_host() {
        let rules = Config::default().build_rules().unwrap();
        let name = |s: &Signals| rules[select(&rules, s).unwrap()].mode.name().to_string();

        let mut signals = Signals {
            window: Some("GIMP Image Editor".into()),
            hostname: "workstation".into(),
            ..Signals::default()
        };
        assert_eq!(name(&signals), "Gimp");

        signals.window = Some("Terminal".into());
        assert_eq!(name(&signals), "Default");

        signals.hostname = "Mac-Mini.local".into();
        assert_eq!(name(&signals), "Mac-Mini");

        signals.window = Some("Blender".into());
        assert_eq!(name(&signals), "Blender");
    }

    #[test]
    fn test_bad_rules_are_reported() {
        let mut config = Config::default();
        config.rules = vec![RuleConfig::new("krita")];
        assert!(matches!(config.build_rules(), Err(ConfigError::UnknownMode(_))));

        config.rules = vec![RuleConfig {
            window: Some("(".into()),
            ..RuleConfig::new("gimp")
        }];
        assert!(matches!(
            config.build_rules(),
            Err(ConfigError::Pattern { field: "window", .. })
        ));
    }
}
