//! Agent command-line composition
//!
//! Produces the exact text typed into the hosting shell. Pure: same inputs,
//! same string, no I/O. Input that would end the typed line early, or smuggle
//! a second command into it, is rejected instead of composed.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::sentinel::SENTINEL_EMIT;

use super::config::{BYPASS_FLAG, LAUNCH_ONLY_FLAGS};

/// Why the agent is being started
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LaunchMode {
    /// First start when the session is created
    Launch,
    /// Fresh start after the agent exited
    Restart,
    /// Resume a specific conversation
    Resume {
        /// Conversation identifier printed by the agent
        resume_id: String,
    },
    /// Continue the most recent conversation
    Continue,
}

impl LaunchMode {
    /// Whether launch-only flags must be stripped for this mode
    #[must_use]
    pub fn reuses_conversation(&self) -> bool {
        matches!(self, Self::Resume { .. } | Self::Continue)
    }

    /// Check mode parameters before anything is typed
    ///
    /// # Errors
    /// Returns `InvalidInput` unless a resume id is a single token of ASCII
    /// letters, digits, `.`, `_` or `-`.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Resume { resume_id } => validate_resume_id(resume_id),
            Self::Launch | Self::Restart | Self::Continue => Ok(()),
        }
    }
}

/// Command builder for the agent CLI
pub struct CommandBuilder<'a> {
    agent_path: &'a str,
    flags: &'a str,
    mode: &'a LaunchMode,
}

impl<'a> CommandBuilder<'a> {
    /// Create a new command builder
    pub fn new(agent_path: &'a str, flags: &'a str, mode: &'a LaunchMode) -> Self {
        Self {
            agent_path,
            flags,
            mode,
        }
    }

    /// Build the complete command line, without the terminating carriage return
    ///
    /// # Errors
    /// Returns `InvalidInput` for a malformed resume id or flags carrying
    /// control characters.
    pub fn build(&self) -> Result<String> {
        self.mode.validate()?;
        validate_flags(self.flags)?;

        let mut line = format!("{} {}", self.agent_path, BYPASS_FLAG);

        match self.mode {
            LaunchMode::Resume { resume_id } => {
                line.push_str(" --resume ");
                line.push_str(resume_id);
            }
            LaunchMode::Continue => line.push_str(" --continue"),
            LaunchMode::Launch | LaunchMode::Restart => {}
        }

        let flags = self.extra_flags();
        if !flags.is_empty() {
            line.push(' ');
            line.push_str(&flags);
        }

        line.push_str("; ");
        line.push_str(SENTINEL_EMIT);
        Ok(line)
    }

    /// Stored flags, filtered for the current mode
    fn extra_flags(&self) -> String {
        if self.mode.reuses_conversation() {
            strip_launch_only(self.flags)
        } else {
            self.flags.trim().to_string()
        }
    }
}

/// Compose the command line for `mode`
///
/// # Errors
/// As [`CommandBuilder::build`].
pub fn compose(agent_path: &str, flags: &str, mode: &LaunchMode) -> Result<String> {
    CommandBuilder::new(agent_path, flags, mode).build()
}

/// Reject flags that would break the typed line
///
/// A carriage return or newline submits the line early, before the exit
/// marker; any other control byte is interpreted by the line editor.
///
/// # Errors
/// Returns `InvalidInput` if `flags` contains a control character.
pub fn validate_flags(flags: &str) -> Result<()> {
    if flags.chars().any(char::is_control) {
        return Err(SessionError::invalid_input(
            "launch flags must not contain control characters",
        ));
    }
    Ok(())
}

fn validate_resume_id(resume_id: &str) -> Result<()> {
    let valid = !resume_id.is_empty()
        && resume_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(SessionError::invalid_input(format!(
            "resume id must be a single token of letters, digits, '.', '_' or '-': {resume_id:?}"
        )))
    }
}

/// Drop launch-only flags and collapse whitespace runs to single spaces
fn strip_launch_only(flags: &str) -> String {
    flags
        .split_whitespace()
        .filter(|token| !is_launch_only(token))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_launch_only(token: &str) -> bool {
    LAUNCH_ONLY_FLAGS.iter().any(|flag| {
        token == *flag
            || token
                .strip_prefix(flag)
                .is_some_and(|rest| rest.starts_with('='))
    })
}
