//! Listener configuration.
//!
//! Loaded from YAML, then optionally overridden from the environment:
//!
//! ```yaml
//! bind: 0.0.0.0:12000
//! server: 127.0.0.1:11000
//! subscribe_realtime: true
//! realtime_interval_ms: 250
//! resubscribe_secs: 30
//! ```
//!
//! | Variable                | Field              |
//! |-------------------------|--------------------|
//! | `ACSP_BIND`             | `bind`             |
//! | `ACSP_SERVER`           | `server`           |
//! | `ACSP_RESUBSCRIBE_SECS` | `resubscribe_secs` |

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::protocol::Command;
use crate::{AcspError, Result};

pub const DEFAULT_BIND: &str = "0.0.0.0:12000";
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

pub const ENV_BIND: &str = "ACSP_BIND";
pub const ENV_SERVER: &str = "ACSP_SERVER";
pub const ENV_RESUBSCRIBE_SECS: &str = "ACSP_RESUBSCRIBE_SECS";

/// Where to listen, where the server plugin port is, and what to ask it for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenerConfig {
    /// Local address the UDP socket binds to.
    pub bind: SocketAddr,
    /// Server plugin address for outbound commands.
    pub server: Option<SocketAddr>,
    pub subscribe_realtime: bool,
    pub subscribe_spot: bool,
    pub request_session_info: bool,
    /// Expected realtime update interval in milliseconds; telemetry rates are
    /// normalized against it.
    pub realtime_interval_ms: Option<u32>,
    /// Re-send the start-up requests this often. Unset disables it.
    pub resubscribe_secs: Option<u64>,
    /// Per-subscriber buffer for the outcome broadcast.
    pub event_capacity: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 12000)),
            server: None,
            subscribe_realtime: true,
            subscribe_spot: false,
            request_session_info: true,
            realtime_interval_ms: None,
            resubscribe_secs: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ListenerConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::parse(yaml, Path::new("<inline>"))
    }

    /// Read and parse a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| AcspError::config_error(path, format!("cannot read file: {e}")))?;
        Self::parse(&yaml, path)
    }

    fn parse(yaml: &str, path: &Path) -> Result<Self> {
        // An empty document means "all defaults".
        let config = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(yaml)
                .map_err(|e| AcspError::config_error(path, e.to_string()))?
        };
        config.validate_at(path)?;
        Ok(config)
    }

    /// Apply `ACSP_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(ENV_BIND) {
            self.bind = parse_env(ENV_BIND, &bind)?;
        }
        if let Some(server) = lookup(ENV_SERVER) {
            self.server = Some(parse_env(ENV_SERVER, &server)?);
        }
        if let Some(secs) = lookup(ENV_RESUBSCRIBE_SECS) {
            self.resubscribe_secs = Some(parse_env(ENV_RESUBSCRIBE_SECS, &secs)?);
        }
        debug!(bind = %self.bind, server = ?self.server, "Listener configuration resolved");
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_at(Path::new("<config>"))
    }

    fn validate_at(&self, path: &Path) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(AcspError::config_error(path, "event_capacity must be at least 1"));
        }
        if self.resubscribe_secs == Some(0) {
            return Err(AcspError::config_error(path, "resubscribe_secs must be positive"));
        }
        Ok(())
    }

    pub fn resubscribe_interval(&self) -> Option<Duration> {
        self.resubscribe_secs.map(Duration::from_secs)
    }

    /// Requests sent once at start-up and again on every resubscribe tick.
    pub fn startup_commands(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        if self.subscribe_realtime {
            commands.push(Command::SubscribeUpdate);
        }
        if self.subscribe_spot {
            commands.push(Command::SubscribeSpot);
        }
        if self.request_session_info {
            commands.push(Command::GetSessionInfo);
        }
        commands
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AcspError::config_error(PathBuf::from(format!("${key}")), format!("{value:?}: {e}")))
}
