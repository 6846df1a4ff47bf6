//! Mode selection rules
//!
//! Rules are evaluated in order and the first match wins. A rule matches
//! when any one of its matchers does; a rule without matchers always
//! matches and belongs at the end of the list.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;

/// Predicate over one signal string
pub struct Matcher {
    description: String,
    predicate: Box<dyn Fn(&str) -> bool>,
}

impl Matcher {
    /// Regex that must match at the start of the subject
    pub fn regex(re: Regex) -> Self {
        Self {
            description: format!("/{}/", re.as_str()),
            predicate: Box::new(move |s| re.find(s).is_some_and(|m| m.start() == 0)),
        }
    }

    /// Exact string comparison
    pub fn exact(expected: impl Into<String>) -> Self {
        let expected = expected.into();
        Self {
            description: format!("{expected:?}"),
            predicate: Box::new(move |s| s == expected),
        }
    }

    pub fn from_fn(description: impl Into<String>, f: impl Fn(&str) -> bool + 'static) -> Self {
        Self {
            description: description.into(),
            predicate: Box::new(f),
        }
    }

    pub fn matches(&self, subject: &str) -> bool {
        (self.predicate)(subject)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Snapshot of the host state rules are matched against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signals {
    pub processes: HashSet<String>,
    /// Title of the focused window, if one has been seen
    pub window: Option<String>,
    pub hostname: String,
}

/// One entry of the ordered rule list
#[derive(Debug)]
pub struct ModeRule<M> {
    pub mode: M,
    pub process: Option<Matcher>,
    pub window: Option<Matcher>,
    pub hostname: Option<Matcher>,
}

impl<M> ModeRule<M> {
    /// Unconditional rule
    pub fn always(mode: M) -> Self {
        Self {
            mode,
            process: None,
            window: None,
            hostname: None,
        }
    }

    pub fn with_process(mut self, matcher: Matcher) -> Self {
        self.process = Some(matcher);
        self
    }

    pub fn with_window(mut self, matcher: Matcher) -> Self {
        self.window = Some(matcher);
        self
    }

    pub fn with_hostname(mut self, matcher: Matcher) -> Self {
        self.hostname = Some(matcher);
        self
    }

    pub fn is_fallback(&self) -> bool {
        self.process.is_none() && self.window.is_none() && self.hostname.is_none()
    }

    pub fn matches(&self, signals: &Signals) -> bool {
        if self.is_fallback() {
            return true;
        }
        let process = self
            .process
            .as_ref()
            .is_some_and(|m| signals.processes.iter().any(|p| m.matches(p)));
        let hostname = self
            .hostname
            .as_ref()
            .is_some_and(|m| m.matches(&signals.hostname));
        let window = self
            .window
            .as_ref()
            .zip(signals.window.as_deref())
            .is_some_and(|(m, w)| m.matches(w));
        process || hostname || window
    }
}

/// Index of the first rule matching `signals`
pub fn select<M>(rules: &[ModeRule<M>], signals: &Signals) -> Option<usize> {
    rules.iter().position(|r| r.matches(signals))
}
