//! Host options and configuration
//!
//! Loading these from disk is the embedding application's job; this module
//! only carries the resolved values and their defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::transport::pty::config::{
    AGENT_BINARY, BUSY_THRESHOLD_MS, CLOSE_GRACE_MS, DEFAULT_COLS, DEFAULT_ROWS,
    FALLBACK_SHELL, LAUNCH_DELAY_MS, SUBMIT_DELAY_MS,
};

// ============================================================================
// Terminal Size
// ============================================================================

/// PTY dimensions in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TerminalSize {
    /// Number of rows
    pub rows: u16,
    /// Number of columns
    pub cols: u16,
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
        }
    }
}

// ============================================================================
// Host Options
// ============================================================================

/// Options shared by every session a registry creates
#[derive(Debug, Clone)]
pub struct HostOptions {
    /// Agent binary typed into each shell
    pub agent_path: String,
    /// Shell to host the agent; `None` means `$SHELL`, then `/bin/bash`
    pub shell: Option<String>,
    /// Initial PTY size
    pub pty_size: TerminalSize,
    /// Pause before typing the launch command so the shell can initialise
    pub launch_delay: Duration,
    /// Pause between a message body and its carriage return
    pub submit_delay: Duration,
    /// Output within this window marks a session busy
    pub busy_threshold: Duration,
    /// How long the wait thread lets the read loop drain after the shell exits
    pub close_grace: Duration,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            agent_path: Self::find_agent()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|| AGENT_BINARY.to_string()),
            shell: None,
            pty_size: TerminalSize::default(),
            launch_delay: Duration::from_millis(LAUNCH_DELAY_MS),
            submit_delay: Duration::from_millis(SUBMIT_DELAY_MS),
            busy_threshold: Duration::from_millis(BUSY_THRESHOLD_MS),
            close_grace: Duration::from_millis(CLOSE_GRACE_MS),
        }
    }
}

impl HostOptions {
    /// Create a new builder
    #[must_use]
    pub fn builder() -> HostOptionsBuilder {
        HostOptionsBuilder::default()
    }

    /// Locate the agent binary on `PATH`
    #[must_use]
    pub fn find_agent() -> Option<PathBuf> {
        which::which(AGENT_BINARY).ok()
    }

    /// Shell that will actually be spawned
    #[must_use]
    pub fn resolved_shell(&self) -> String {
        match self.shell.as_deref() {
            Some(shell) if !shell.trim().is_empty() => shell.to_string(),
            _ => std::env::var("SHELL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_SHELL.to_string()),
        }
    }
}

/// Builder for `HostOptions`
#[derive(Debug, Default)]
pub struct HostOptionsBuilder {
    options: HostOptions,
}

impl HostOptionsBuilder {
    /// Set the agent binary
    #[must_use]
    pub fn agent_path(mut self, path: impl Into<String>) -> Self {
        self.options.agent_path = path.into();
        self
    }

    /// Set the hosting shell
    #[must_use]
    pub fn shell(mut self, shell: impl Into<String>) -> Self {
        self.options.shell = Some(shell.into());
        self
    }

    /// Set the initial PTY size
    #[must_use]
    pub fn pty_size(mut self, rows: u16, cols: u16) -> Self {
        self.options.pty_size = TerminalSize { rows, cols };
        self
    }

    /// Set the delay before the launch command is typed
    #[must_use]
    pub fn launch_delay(mut self, delay: Duration) -> Self {
        self.options.launch_delay = delay;
        self
    }

    /// Set the delay between a message body and its carriage return
    #[must_use]
    pub fn submit_delay(mut self, delay: Duration) -> Self {
        self.options.submit_delay = delay;
        self
    }

    /// Set the busy window
    #[must_use]
    pub fn busy_threshold(mut self, threshold: Duration) -> Self {
        self.options.busy_threshold = threshold;
        self
    }

    /// Set the read-loop drain grace after shell exit
    #[must_use]
    pub fn close_grace(mut self, grace: Duration) -> Self {
        self.options.close_grace = grace;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> HostOptions {
        self.options
    }
}
