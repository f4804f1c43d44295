//! Error types for the session supervisor

use thiserror::Error;

/// Main error type for session operations
#[derive(Error, Debug)]
pub enum SessionError {
    /// The shell could not be started (binary missing, permission denied,
    /// PTY allocation failure). The session never enters the registry.
    #[error("Failed to spawn shell: {0}")]
    Spawn(String),

    /// The referenced session id is unknown or already torn down
    #[error("Session not found: {0}")]
    NotFound(String),

    /// A write was attempted after the session emitted `session-closed`
    #[error("Session {0} is closed")]
    SessionClosed(String),

    /// Unexpected read/write failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input rejected before it reached the PTY
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Relaunch requested while the agent is still running in the shell
    #[error("Agent is still running in session {0}")]
    AgentRunning(String),

    /// Invalid host configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Wire protocol encode/decode failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

impl SessionError {
    /// Create a spawn error
    pub fn spawn(msg: impl Into<String>) -> Self {
        Self::Spawn(msg.into())
    }

    /// Create a session not found error
    pub fn not_found(session_id: impl Into<String>) -> Self {
        Self::NotFound(session_id.into())
    }

    /// Create a session closed error
    pub fn session_closed(session_id: impl Into<String>) -> Self {
        Self::SessionClosed(session_id.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an agent running error
    pub fn agent_running(session_id: impl Into<String>) -> Self {
        Self::AgentRunning(session_id.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Stable identifier used in protocol replies
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Spawn(_) => "spawn_error",
            Self::NotFound(_) => "not_found",
            Self::SessionClosed(_) => "session_closed",
            Self::Io(_) => "io_error",
            Self::InvalidInput(_) => "invalid_input",
            Self::AgentRunning(_) => "agent_running",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Json(_) => "json_error",
        }
    }
}
