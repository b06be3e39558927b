use std::time::Duration;

use lectura_transcript::CollapseConfig;
use lectura_transcript::collapse::{DEFAULT_MAX_CONSECUTIVE, DEFAULT_RUNAWAY_THRESHOLD};

use crate::controller::Backoff;

pub const ENV_PREFIX: &str = "READING_";

fn default_language() -> String {
    "es-ES".to_string()
}

fn default_restart_base_delay_ms() -> u64 {
    150
}

fn default_restart_max_delay_ms() -> u64 {
    1600
}

fn default_runaway_threshold() -> usize {
    DEFAULT_RUNAWAY_THRESHOLD
}

fn default_max_consecutive() -> usize {
    DEFAULT_MAX_CONSECUTIVE
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct ListenerConfig {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_restart_base_delay_ms")]
    pub restart_base_delay_ms: u64,
    #[serde(default = "default_restart_max_delay_ms")]
    pub restart_max_delay_ms: u64,
    #[serde(default = "default_runaway_threshold")]
    pub runaway_threshold: usize,
    #[serde(default = "default_max_consecutive")]
    pub max_consecutive: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            debug: false,
            restart_base_delay_ms: default_restart_base_delay_ms(),
            restart_max_delay_ms: default_restart_max_delay_ms(),
            runaway_threshold: default_runaway_threshold(),
            max_consecutive: default_max_consecutive(),
        }
    }
}

impl ListenerConfig {
    /// Read `READING_*` variables from the process environment.
    pub fn from_env() -> Result<Self, crate::Error> {
        Ok(envy::prefixed(ENV_PREFIX).from_env()?)
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, crate::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter(vars)?)
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            base: Duration::from_millis(self.restart_base_delay_ms),
            max: Duration::from_millis(self.restart_max_delay_ms),
        }
    }

    pub fn collapse(&self) -> CollapseConfig {
        CollapseConfig {
            runaway_threshold: self.runaway_threshold,
            max_consecutive: self.max_consecutive,
        }
    }
}
