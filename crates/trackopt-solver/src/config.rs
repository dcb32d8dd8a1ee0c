//! Solver configuration types.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::events::{EventCallback, SolverEvent};

/// Which backend a solve may run on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendPreference {
    /// Any available backend.
    #[default]
    Any,
    /// Only the backend with this name.
    Named(String),
}

impl BackendPreference {
    pub fn named(name: impl Into<String>) -> Self {
        BackendPreference::Named(name.into())
    }

    /// Whether a backend called `name` satisfies this preference.
    pub fn accepts(&self, name: &str) -> bool {
        match self {
            BackendPreference::Any => true,
            BackendPreference::Named(wanted) => wanted.eq_ignore_ascii_case(name),
        }
    }
}

impl fmt::Display for BackendPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendPreference::Any => f.write_str("any"),
            BackendPreference::Named(name) => f.write_str(name),
        }
    }
}

/// Options for one solve, shared by every backend.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Time limit in seconds. `None` means no limit.
    pub time_limit: Option<f64>,
    /// Number of threads to use. `None` uses solver default.
    pub threads: Option<u32>,
    /// Relative MIP gap tolerance. `None` uses solver default.
    pub mip_gap: Option<f64>,
    /// Verbosity level. `None` uses solver default.
    pub verbosity: Option<u32>,
    /// Enable/disable presolve. `None` uses solver default.
    pub presolve: Option<bool>,
    /// Log solver output to console. `None` uses solver default.
    pub log_to_console: Option<bool>,
    #[serde(default)]
    pub backend: BackendPreference,
    #[serde(skip)]
    pub on_event: Option<EventCallback>,
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time limit. Non-positive or non-finite values mean no limit.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = (seconds.is_finite() && seconds > 0.0).then_some(seconds);
        self
    }

    pub fn with_threads(mut self, count: u32) -> Self {
        self.threads = Some(count);
        self
    }

    pub fn with_mip_gap(mut self, gap: f64) -> Self {
        self.mip_gap = Some(gap);
        self
    }

    pub fn with_verbosity(mut self, level: u32) -> Self {
        self.verbosity = Some(level);
        self
    }

    pub fn with_presolve(mut self, enabled: bool) -> Self {
        self.presolve = Some(enabled);
        self
    }

    pub fn with_log_to_console(mut self, enabled: bool) -> Self {
        self.log_to_console = Some(enabled);
        self
    }

    pub fn with_backend(mut self, preference: BackendPreference) -> Self {
        self.backend = preference;
        self
    }

    /// Register a callback for backend progress events.
    pub fn with_event_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SolverEvent) + Send + Sync + 'static,
    {
        self.on_event = Some(Arc::new(callback));
        self
    }

    /// Deliver `event` to the registered callback, if any.
    pub fn emit(&self, event: &SolverEvent) {
        if let Some(callback) = &self.on_event {
            callback(event);
        }
    }

    /// Check if this configuration is completely empty (all defaults).
    pub fn is_empty(&self) -> bool {
        self.time_limit.is_none()
            && self.threads.is_none()
            && self.mip_gap.is_none()
            && self.verbosity.is_none()
            && self.presolve.is_none()
            && self.log_to_console.is_none()
            && self.backend == BackendPreference::Any
            && self.on_event.is_none()
    }
}

impl fmt::Debug for SolverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverConfig")
            .field("time_limit", &self.time_limit)
            .field("threads", &self.threads)
            .field("mip_gap", &self.mip_gap)
            .field("verbosity", &self.verbosity)
            .field("presolve", &self.presolve)
            .field("log_to_console", &self.log_to_console)
            .field("backend", &self.backend)
            .field("on_event", &self.on_event.is_some())
            .finish()
    }
}
