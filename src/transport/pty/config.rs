//! Configuration constants for the PTY transport

/// Agent binary looked up on `PATH` when no explicit path is configured
pub const AGENT_BINARY: &str = "claude";

/// Flag passed on every agent invocation
pub const BYPASS_FLAG: &str = "--dangerously-skip-permissions";

/// Shell used when neither the options nor `$SHELL` name one
pub const FALLBACK_SHELL: &str = "/bin/bash";

/// Environment variable that makes the agent believe it is nested inside
/// another agent session. Removed from every spawned shell.
pub const NESTED_SESSION_ENV: &str = "CLAUDECODE";

/// Flags that only make sense on a first launch
///
/// Creating a fresh isolated worktree on every resume would be wrong.
pub const LAUNCH_ONLY_FLAGS: &[&str] = &["--worktree", "-w"];

/// Default PTY rows
pub const DEFAULT_ROWS: u16 = 50;

/// Default PTY columns
pub const DEFAULT_COLS: u16 = 120;

/// Read buffer size for the output loop
pub const READ_CHUNK_SIZE: usize = 4096;

/// Delay before the launch command is typed (shell initialisation)
pub const LAUNCH_DELAY_MS: u64 = 200;

/// Delay between a message body and its lone carriage return
pub const SUBMIT_DELAY_MS: u64 = 30;

/// Output within this window marks a session busy (2 seconds)
pub const BUSY_THRESHOLD_MS: u64 = 2000;

/// Grace period for the read loop to drain after the shell exits
pub const CLOSE_GRACE_MS: u64 = 500;

/// Ctrl+C
pub const INTERRUPT: &[u8] = &[0x03];

/// Escape key
pub const ESCAPE: &[u8] = &[0x1b];

/// Shift+Tab, which cycles the agent's input mode
pub const MODE_CYCLE: &[u8] = b"\x1b[Z";
