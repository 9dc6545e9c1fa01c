//! Error types for datagram decoding and the host-facing layers.
//!
//! Two error families live here:
//!
//! - [`DecodeError`] describes why a single datagram could not be decoded. It is
//!   never fatal: the dispatcher turns it into a
//!   [`DecodeOutcome::MalformedPacket`](crate::DecodeOutcome::MalformedPacket)
//!   and keeps going.
//! - [`AcspError`] covers everything around the decoder: binding sockets,
//!   loading configuration, talking to the driver task.
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use acsp::AcspError;
//!
//! let error = AcspError::transport_failed("socket closed by peer");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for crate operations.
pub type Result<T, E = AcspError> = std::result::Result<T, E>;

/// Reason a datagram (or one entry inside it) failed to decode.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodeError {
    #[error("truncated field at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    TruncatedField { offset: usize, needed: usize, remaining: usize },

    #[error("undecodable string at offset {offset} (length byte {length})")]
    UndecodableString { offset: usize, length: u8 },

    #[error("value {value} out of range for {field}")]
    OutOfRangeValue { field: &'static str, value: u64 },
}

impl DecodeError {
    /// Stable short name, used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::TruncatedField { .. } => "truncated_field",
            DecodeError::UndecodableString { .. } => "undecodable_string",
            DecodeError::OutOfRangeValue { .. } => "out_of_range_value",
        }
    }
}

/// Main error type for transport, configuration and connection operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AcspError {
    #[error("Failed to bind UDP socket on {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport failure: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Configuration error in {}: {details}", path.display())]
    Config { path: PathBuf, details: String },

    #[error("Driver task is no longer running")]
    ChannelClosed,

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("No server address configured for outbound commands")]
    NoServerAddress,

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl AcspError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            AcspError::Bind { .. } => true,
            AcspError::Transport { .. } => true,
            AcspError::Timeout { .. } => true,
            AcspError::Config { .. } => false,
            AcspError::ChannelClosed => false,
            AcspError::NoServerAddress => false,
            AcspError::Decode(_) => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            AcspError::Bind { .. } => vec![
                "Check that no other listener already owns the UDP port",
                "Use 0.0.0.0 to accept datagrams from a remote server",
                "Verify firewall rules allow inbound UDP",
            ],
            AcspError::Transport { .. } => vec![
                "Check that the server plugin address is reachable",
                "Verify UDP_PLUGIN_ADDRESS in server_cfg.ini points at this host",
                "Retry after the server restarts",
            ],
            AcspError::Config { .. } => vec![
                "Check the YAML syntax of the configuration file",
                "Verify socket addresses use host:port form",
                "Remove unknown keys from the configuration",
            ],
            AcspError::ChannelClosed => vec![
                "Recreate the connection",
                "Check logs for the reason the driver task stopped",
            ],
            AcspError::Timeout { .. } => vec![
                "Increase the timeout duration",
                "Verify the server is running and sending events",
            ],
            AcspError::NoServerAddress => vec![
                "Set `server` in the listener configuration",
                "Export ACSP_SERVER=host:port",
            ],
            AcspError::Decode(_) => vec![
                "Capture the datagram for inspection",
                "Check the server build emits a supported protocol variant",
            ],
        }
    }

    /// Helper constructor for transport errors without an io source.
    pub fn transport_failed(reason: impl Into<String>) -> Self {
        AcspError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for transport errors wrapping an io error.
    pub fn transport_io(reason: impl Into<String>, source: std::io::Error) -> Self {
        AcspError::Transport { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        AcspError::Config { path: path.into(), details: details.into() }
    }
}

impl From<std::io::Error> for AcspError {
    fn from(err: std::io::Error) -> Self {
        AcspError::Transport { reason: err.kind().to_string(), source: Some(err) }
    }
}
