//! Registry table entries

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::transport::Supervisor;
use crate::types::{SessionId, SessionInfo};

/// Per-session metadata, replaced wholesale on every update
#[derive(Debug, Clone)]
pub(crate) struct SessionRecord {
    pub name: String,
    pub working_dir: Option<String>,
    pub agent_path: String,
    pub launch_flags: String,
    pub resume_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Copy of this record with a different resume token
    pub fn with_resume_token(&self, resume_token: Option<String>) -> Self {
        Self {
            resume_token,
            ..self.clone()
        }
    }
}

/// One live session: its metadata plus the supervisor that owns the shell
pub(crate) struct SessionEntry {
    pub seq: u64,
    pub record: Arc<SessionRecord>,
    pub supervisor: Arc<Supervisor>,
}

impl SessionEntry {
    /// Assemble a snapshot; takes the supervisor state lock briefly
    pub fn snapshot(&self, busy_threshold: Duration) -> SessionInfo {
        let state = self.supervisor.state();
        let record = &self.record;
        SessionInfo {
            id: self.supervisor.session_id().clone(),
            name: record.name.clone(),
            working_dir: record.working_dir.clone(),
            agent_path: record.agent_path.clone(),
            launch_flags: record.launch_flags.clone(),
            ended: state.is_ended(),
            resume_token: record.resume_token.clone(),
            busy: self.supervisor.is_busy(busy_threshold),
            state,
            created_at: record.created_at,
        }
    }
}

/// Everything guarded by the registry lock
#[derive(Default)]
pub(crate) struct SessionTable {
    pub sessions: HashMap<SessionId, SessionEntry>,
    /// Sessions whose close was requested but whose `session-closed` has not
    /// been delivered yet
    pub closing: HashSet<SessionId>,
    pub active: Option<SessionId>,
    pub next_seq: u64,
}

impl SessionTable {
    /// Entries in creation order
    pub fn ordered(&self) -> Vec<&SessionEntry> {
        let mut entries: Vec<&SessionEntry> = self.sessions.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }

    /// Remove an entry, moving focus to its successor if it was active
    ///
    /// The caller must drop the returned entry after releasing the lock.
    pub fn remove(&mut self, id: &SessionId) -> Option<SessionEntry> {
        let entry = self.sessions.remove(id)?;
        if self.active.as_ref() == Some(id) {
            self.active = self.successor_of(entry.seq);
        }
        Some(entry)
    }

    /// Next session after `seq` in creation order, else the last one before it
    fn successor_of(&self, seq: u64) -> Option<SessionId> {
        let ordered = self.ordered();
        ordered
            .iter()
            .find(|entry| entry.seq > seq)
            .or_else(|| ordered.last())
            .map(|entry| entry.supervisor.session_id().clone())
    }
}
