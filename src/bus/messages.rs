//! Inbound UI commands and their replies
//!
//! Wire format is one JSON object per message, tagged by `command` on the
//! way in and by `reply` on the way out.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::transport::LaunchMode;
use crate::types::{SessionId, SessionInfo};

// ============================================================================
// Commands
// ============================================================================

/// Commands the UI layer may issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum UiCommand {
    /// Spawn a new session
    CreateSession {
        /// Display label; `Session N` when absent
        #[serde(default)]
        name: Option<String>,
        /// Initial directory for the shell
        #[serde(default)]
        working_dir: Option<String>,
        /// Extra agent flags
        #[serde(default)]
        extra_flags: Option<String>,
    },
    /// Terminate a session's shell
    CloseSession {
        /// Target session
        session_id: SessionId,
    },
    /// Raw keyboard input
    Write {
        /// Target session
        session_id: SessionId,
        /// Text exactly as typed
        data: String,
    },
    /// Control bytes written atomically
    WriteControl {
        /// Target session
        session_id: SessionId,
        /// Byte sequence
        bytes: Vec<u8>,
    },
    /// Type a message and submit it
    SendMessage {
        /// Target session
        session_id: SessionId,
        /// Message body without a line terminator
        text: String,
    },
    /// Ctrl+C
    Interrupt {
        /// Target session
        session_id: SessionId,
    },
    /// Escape key
    Escape {
        /// Target session
        session_id: SessionId,
    },
    /// Shift+Tab
    CycleMode {
        /// Target session
        session_id: SessionId,
    },
    /// Start the agent again after it exited
    Relaunch {
        /// Target session
        session_id: SessionId,
        /// Restart, resume or continue
        launch: LaunchMode,
    },
    /// Record the resume identifier found in rendered output
    SetResumeToken {
        /// Target session
        session_id: SessionId,
        /// New token; `null` clears it
        #[serde(default)]
        token: Option<String>,
    },
    /// Resize the PTY
    Resize {
        /// Target session
        session_id: SessionId,
        /// Rows
        rows: u16,
        /// Columns
        cols: u16,
    },
    /// Focus a session
    SetActive {
        /// Target session
        session_id: SessionId,
    },
    /// Snapshot of one session
    GetSession {
        /// Target session
        session_id: SessionId,
    },
    /// Agent binary of a session
    GetAgentPath {
        /// Target session
        session_id: SessionId,
    },
    /// Extra flags of a session
    GetLaunchFlags {
        /// Target session
        session_id: SessionId,
    },
    /// Snapshot of every session
    ListSessions,
}

// ============================================================================
// Replies
// ============================================================================

/// Reply to a single [`UiCommand`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum UiReply {
    /// One session snapshot
    Session {
        /// Snapshot
        session: SessionInfo,
    },
    /// All session snapshots
    Sessions {
        /// Snapshots in creation order
        sessions: Vec<SessionInfo>,
    },
    /// A single string value
    Text {
        /// Value
        text: String,
    },
    /// Command applied
    Ok,
    /// Command failed
    Error {
        /// Stable error kind, e.g. `not_found`
        kind: String,
        /// Human-readable description
        message: String,
    },
}

impl UiReply {
    /// Whether this reply reports a failure
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

impl From<&SessionError> for UiReply {
    fn from(error: &SessionError) -> Self {
        Self::Error {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}
