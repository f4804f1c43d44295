//! Session interaction methods
//!
//! Handles writing to sessions, relaunching the agent and closing sessions.

use std::sync::Arc;

use crate::error::{Result, SessionError};
use crate::transport::pty::config::{ESCAPE, INTERRUPT, MODE_CYCLE};
use crate::transport::{LaunchMode, compose};
use crate::types::{SessionId, TerminalSize};

use super::core::SessionRegistry;

impl SessionRegistry {
    /// Terminate the session's shell
    ///
    /// Idempotent while the close is in flight. Once `session-closed` has
    /// been delivered the id is gone and a further close is `NotFound`.
    ///
    /// # Errors
    /// Returns `NotFound` if the id is unknown.
    pub fn close(&self, id: &SessionId) -> Result<()> {
        let removed = {
            let mut table = self.inner.table.write();
            if table.closing.contains(id) {
                return Ok(());
            }
            let entry = table
                .remove(id)
                .ok_or_else(|| SessionError::not_found(id.as_str()))?;
            if !entry.supervisor.state().is_closed() {
                table.closing.insert(id.clone());
            }
            entry
        };

        log::info!("Closing session {} ({})", id, removed.record.name);
        removed.supervisor.terminate();
        Ok(())
    }

    /// Write raw bytes to the session's PTY
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown id and `SessionClosed` once the
    /// shell is gone.
    pub async fn write(&self, id: &SessionId, data: Vec<u8>) -> Result<()> {
        self.supervisor(id)?.write(data).await
    }

    /// Write a control sequence in one atomic write
    ///
    /// # Errors
    /// As [`SessionRegistry::write`], plus `InvalidInput` for an empty sequence.
    pub async fn write_control(&self, id: &SessionId, bytes: Vec<u8>) -> Result<()> {
        self.supervisor(id)?.write_control(bytes).await
    }

    /// Type a message and submit it
    ///
    /// # Errors
    /// As [`SessionRegistry::write`], plus `InvalidInput` if the text ends
    /// with its own line terminator.
    pub async fn send_message(&self, id: &SessionId, text: impl Into<String>) -> Result<()> {
        self.supervisor(id)?.submit(text.into()).await
    }

    /// Send Ctrl+C
    pub async fn interrupt(&self, id: &SessionId) -> Result<()> {
        self.write_control(id, INTERRUPT.to_vec()).await
    }

    /// Send Escape
    pub async fn escape(&self, id: &SessionId) -> Result<()> {
        self.write_control(id, ESCAPE.to_vec()).await
    }

    /// Send Shift+Tab to cycle the agent's input mode
    pub async fn cycle_mode(&self, id: &SessionId) -> Result<()> {
        self.write_control(id, MODE_CYCLE.to_vec()).await
    }

    /// Start the agent again in a shell whose agent has exited
    ///
    /// Reuses the stored agent path and flags, clears the resume token.
    ///
    /// # Errors
    /// Returns `AgentRunning` unless the exit marker was seen since the
    /// last launch, `InvalidInput` for a malformed resume id. A rejected
    /// relaunch leaves the session state untouched.
    pub async fn relaunch(&self, id: &SessionId, mode: LaunchMode) -> Result<()> {
        let supervisor = self.supervisor(id)?;
        let record = self.record(id)?;
        let line = compose(&record.agent_path, &record.launch_flags, &mode)?;

        log::debug!("Relaunching session {} ({:?})", id, mode);
        supervisor.relaunch(line).await?;
        self.replace_resume_token(id, None);
        Ok(())
    }

    /// Record (or clear) the resume identifier the UI found for this session
    ///
    /// # Errors
    /// Returns `NotFound` if the id is unknown.
    pub fn set_resume_token(&self, id: &SessionId, token: Option<String>) -> Result<()> {
        if self.replace_resume_token(id, token) {
            Ok(())
        } else {
            Err(SessionError::not_found(id.as_str()))
        }
    }

    /// Resize the session's PTY
    ///
    /// # Errors
    /// Returns `InvalidInput` for a zero dimension, `Io` if the resize fails.
    pub fn resize(&self, id: &SessionId, rows: u16, cols: u16) -> Result<()> {
        self.supervisor(id)?.resize(TerminalSize { rows, cols })
    }

    /// Focus a session
    ///
    /// # Errors
    /// Returns `NotFound` if the id is unknown.
    pub fn set_active(&self, id: &SessionId) -> Result<()> {
        let mut table = self.inner.table.write();
        if !table.sessions.contains_key(id) {
            return Err(SessionError::not_found(id.as_str()));
        }
        table.active = Some(id.clone());
        Ok(())
    }

    fn replace_resume_token(&self, id: &SessionId, token: Option<String>) -> bool {
        let mut table = self.inner.table.write();
        match table.sessions.get_mut(id) {
            Some(entry) => {
                entry.record = Arc::new(entry.record.with_resume_token(token));
                true
            }
            None => false,
        }
    }
}
