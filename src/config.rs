//! # Platform Configuration
//!
//! Tunables for the actors and the chat path, read from TOML. Every key is
//! optional; missing keys take the defaults below.
//!
//! ```toml
//! actor_buffer = 32
//! default_duration_minutes = 30
//! persistence_timeout_ms = 2000
//! session_buffer = 64
//! backplane_capacity = 256
//! history_page_size = 50
//! status_policy = "strict"
//! ```

use crate::model::{OrderStatus, Role};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Environment variable naming the TOML file [`PlatformConfig::from_env`] reads.
pub const CONFIG_ENV: &str = "DINER_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Who may move an order between which statuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Everybody follows the kitchen workflow, see [`OrderStatus::can_transition_to`].
    #[default]
    Strict,
    /// Managers may set any status; staff still follow the workflow.
    ManagerOverride,
}

impl TransitionPolicy {
    pub fn allows(self, role: Role, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            TransitionPolicy::Strict => from.can_transition_to(to),
            TransitionPolicy::ManagerOverride => {
                role == Role::Manager || from.can_transition_to(to)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Request queue length of each resource actor.
    pub actor_buffer: usize,
    /// Slot length for orders that do not give one.
    pub default_duration_minutes: u32,
    /// Upper bound on a chat message write.
    pub persistence_timeout_ms: u64,
    /// Outbound events buffered per chat session before events are dropped.
    pub session_buffer: usize,
    /// Events the backplane holds for a lagging subscriber.
    pub backplane_capacity: usize,
    /// Page length used when a history page request gives no limit.
    pub history_page_size: usize,
    pub status_policy: TransitionPolicy,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            actor_buffer: 32,
            default_duration_minutes: 30,
            persistence_timeout_ms: 2000,
            session_buffer: 64,
            backplane_capacity: 256,
            history_page_size: 50,
            status_policy: TransitionPolicy::Strict,
        }
    }
}

impl PlatformConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: PlatformConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        info!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Loads the file named by `DINER_CONFIG`, or the defaults when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    pub fn persistence_timeout(&self) -> Duration {
        Duration::from_millis(self.persistence_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let zero = [
            ("actor_buffer", self.actor_buffer == 0),
            ("default_duration_minutes", self.default_duration_minutes == 0),
            ("persistence_timeout_ms", self.persistence_timeout_ms == 0),
            ("session_buffer", self.session_buffer == 0),
            ("backplane_capacity", self.backplane_capacity == 0),
            ("history_page_size", self.history_page_size == 0),
        ];
        match zero.iter().find(|(_, is_zero)| *is_zero) {
            Some((key, _)) => Err(ConfigError::Invalid(format!("{key} must be positive"))),
            None => Ok(()),
        }
    }
}
