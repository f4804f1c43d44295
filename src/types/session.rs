//! Session snapshot and state types
//!
//! `SessionInfo` is what callers see: a point-in-time copy assembled from the
//! registry's immutable record and the supervisor's live state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::SessionId;

// ============================================================================
// Supervisor State
// ============================================================================

/// Lifecycle state of one supervised shell
///
/// ```text
/// Launching ──launch written──▶ Running ──marker──▶ AgentExited
///     ▲                                                  │
///     └──────────────────── relaunch ────────────────────┘
///
/// any state ──shell exit / EOF / IO error──▶ Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Shell spawned, agent command not yet typed
    Launching,
    /// Agent command typed; agent presumed running
    Running,
    /// Exit marker seen; shell alive and waiting for input
    AgentExited,
    /// Shell gone; terminal state
    Closed,
}

impl SessionState {
    /// Whether the agent has exited while the shell lives on
    #[must_use]
    pub fn is_ended(self) -> bool {
        matches!(self, Self::AgentExited)
    }

    /// Whether the shell has gone away
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

// ============================================================================
// Session Snapshot
// ============================================================================

/// Point-in-time snapshot of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Unique session identifier
    pub id: SessionId,

    /// Display label (not unique)
    pub name: String,

    /// Initial directory of the shell, if one was requested
    pub working_dir: Option<String>,

    /// Agent binary used for every launch in this session
    pub agent_path: String,

    /// Extra CLI flags supplied at creation
    pub launch_flags: String,

    /// TRUE once the agent exited but the shell has not
    pub ended: bool,

    /// Resume identifier located by the UI in rendered output
    pub resume_token: Option<String>,

    /// TRUE while output is actively streaming (UI hint only)
    pub busy: bool,

    /// Explicit supervisor state
    pub state: SessionState,

    /// When the session was created
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Display label; auto-generated when absent
    #[serde(default)]
    pub name: Option<String>,
    /// Initial directory for the shell
    #[serde(default)]
    pub working_dir: Option<String>,
    /// Extra agent flags, e.g. `--worktree --model opus`
    #[serde(default)]
    pub extra_flags: Option<String>,
}
