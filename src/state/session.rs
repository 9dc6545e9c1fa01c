//! Current-session snapshot

use crate::types::SessionInfo;

/// Holds exactly one [`SessionInfo`].
///
/// Starts as [`SessionInfo::unknown`]. There is no partial update path:
/// every NEW_SESSION replaces the whole snapshot.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    current: SessionInfo,
    applied: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot, returning the one it displaced.
    pub fn replace(&mut self, session: SessionInfo) -> SessionInfo {
        self.applied = true;
        std::mem::replace(&mut self.current, session)
    }

    pub fn current(&self) -> &SessionInfo {
        &self.current
    }

    /// True once a NEW_SESSION has been applied, whatever it contained.
    pub fn is_known(&self) -> bool {
        self.applied
    }
}
