use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::error::UnknownIterationPolicy;

/// How the dispatch loop walks the registry when handlers register or
/// unregister in the middle of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IterationPolicy {
    /// Iterate the tokens registered when the pass started. Late
    /// registrations are not visited; removed tokens are skipped.
    #[default]
    Snapshot,
    /// Re-read the registry after every handler and continue with the next
    /// token in registration order, so late registrations are visited.
    Live,
}

impl FromStr for IterationPolicy {
    type Err = UnknownIterationPolicy;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snapshot" => Ok(Self::Snapshot),
            "live" => Ok(Self::Live),
            _ => Err(UnknownIterationPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for IterationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot => f.write_str("snapshot"),
            Self::Live => f.write_str("live"),
        }
    }
}

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Name attached to every log line of this dispatcher.
    pub name: String,
    pub iteration: IterationPolicy,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            name: "dispatcher".to_string(),
            iteration: IterationPolicy::default(),
        }
    }
}

impl DispatcherConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset.
    ///
    /// - `DISPATCHER_NAME`
    /// - `DISPATCHER_ITERATION` (`snapshot` or `live`)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let name = env::var("DISPATCHER_NAME").unwrap_or(defaults.name);
        let iteration = match env::var("DISPATCHER_ITERATION") {
            Ok(raw) => raw
                .parse()
                .context("DISPATCHER_ITERATION must be `snapshot` or `live`")?,
            Err(_) => defaults.iteration,
        };
        Ok(Self { name, iteration })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_iteration(mut self, iteration: IterationPolicy) -> Self {
        self.iteration = iteration;
        self
    }
}
