//! Session listing and read accessors

use crate::error::{Result, SessionError};
use crate::types::{SessionId, SessionInfo};

use super::core::SessionRegistry;

impl SessionRegistry {
    /// Snapshot of every live session in creation order
    ///
    /// Never blocks on I/O.
    #[must_use]
    pub fn list(&self) -> Vec<SessionInfo> {
        let threshold = self.inner.options.busy_threshold;
        let table = self.inner.table.read();
        table
            .ordered()
            .into_iter()
            .map(|entry| entry.snapshot(threshold))
            .collect()
    }

    /// Snapshot of one session
    ///
    /// # Errors
    /// Returns `NotFound` if the id is unknown.
    pub fn get(&self, id: &SessionId) -> Result<SessionInfo> {
        let threshold = self.inner.options.busy_threshold;
        self.inner
            .table
            .read()
            .sessions
            .get(id)
            .map(|entry| entry.snapshot(threshold))
            .ok_or_else(|| SessionError::not_found(id.as_str()))
    }

    /// Agent binary recorded for the session
    ///
    /// # Errors
    /// Returns `NotFound` if the id is unknown.
    pub fn get_agent_path(&self, id: &SessionId) -> Result<String> {
        Ok(self.record(id)?.agent_path.clone())
    }

    /// Extra flags recorded for the session
    ///
    /// # Errors
    /// Returns `NotFound` if the id is unknown.
    pub fn get_launch_flags(&self, id: &SessionId) -> Result<String> {
        Ok(self.record(id)?.launch_flags.clone())
    }

    /// Focused session, if any
    #[must_use]
    pub fn active_session(&self) -> Option<SessionId> {
        self.inner.table.read().active.clone()
    }

    /// Number of live sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.table.read().sessions.len()
    }

    /// Whether no session is live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
