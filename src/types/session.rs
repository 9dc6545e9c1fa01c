//! Session snapshot types

use serde::{Deserialize, Serialize};

/// Placeholder used for every name field before the first NEW_SESSION arrives.
pub const UNKNOWN: &str = "Unknown";

/// Session category carried by the optional NEW_SESSION trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum SessionKind {
    Booking,
    Practice,
    Qualifying,
    Race,
    Unknown(u8),
}

impl From<u8> for SessionKind {
    fn from(raw: u8) -> Self {
        match raw {
            1 => SessionKind::Booking,
            2 => SessionKind::Practice,
            3 => SessionKind::Qualifying,
            4 => SessionKind::Race,
            other => SessionKind::Unknown(other),
        }
    }
}

/// The single current-session snapshot.
///
/// Replaced wholesale by every NEW_SESSION packet; fields are never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct SessionInfo {
    pub protocol_version: u8,
    pub session_index: u8,
    pub current_session_index: u8,
    pub session_count: u8,
    pub server_name: String,
    pub track_name: String,
    pub track_config: String,
    pub session_name: String,
    /// Present only on builds that append the session trailer.
    pub kind: Option<SessionKind>,
    pub time_minutes: Option<u16>,
    pub laps: Option<u16>,
    pub wait_time_secs: Option<u16>,
}

impl SessionInfo {
    /// The sentinel value held before any session has been announced.
    pub fn unknown() -> Self {
        Self {
            protocol_version: 0,
            session_index: 0,
            current_session_index: 0,
            session_count: 0,
            server_name: UNKNOWN.to_string(),
            track_name: UNKNOWN.to_string(),
            track_config: String::new(),
            session_name: UNKNOWN.to_string(),
            kind: None,
            time_minutes: None,
            laps: None,
            wait_time_secs: None,
        }
    }

    /// Track name with its layout, e.g. `vallelunga (drift)`.
    pub fn track_label(&self) -> String {
        if self.track_config.is_empty() {
            self.track_name.clone()
        } else {
            format!("{} ({})", self.track_name, self.track_config)
        }
    }
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self::unknown()
    }
}
