//! Lifecycle management for the PTY transport (spawn, terminate)

use std::io::{Read, Write};
use std::path::Path;

use portable_pty::{
    Child, CommandBuilder as PtyCommand, MasterPty, PtySize, native_pty_system,
};

use crate::error::{Result, SessionError};
use crate::types::TerminalSize;

use super::config::NESTED_SESSION_ENV;

/// What to spawn and where
#[derive(Debug, Clone)]
pub struct ShellSpec {
    /// Shell binary (or any stand-in program)
    pub shell: String,
    /// Initial working directory
    pub working_dir: Option<String>,
    /// Initial PTY size
    pub size: TerminalSize,
}

/// Handles produced by a successful spawn
pub(super) struct SpawnedShell {
    pub master: Box<dyn MasterPty + Send>,
    pub reader: Box<dyn Read + Send>,
    pub writer: Box<dyn Write + Send>,
    pub child: Box<dyn Child + Send + Sync>,
}

pub(super) fn to_pty_size(size: TerminalSize) -> PtySize {
    PtySize {
        rows: size.rows,
        cols: size.cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

/// Allocate a PTY and start the shell on its slave side
///
/// # Errors
/// Returns `SessionError::Spawn` if the PTY cannot be allocated, the working
/// directory is missing, or the shell cannot be executed.
pub(super) fn spawn_shell(spec: &ShellSpec) -> Result<SpawnedShell> {
    if let Some(dir) = spec.working_dir.as_deref() {
        if !Path::new(dir).is_dir() {
            return Err(SessionError::spawn(format!(
                "Working directory does not exist: {dir}"
            )));
        }
    }

    which::which(&spec.shell)
        .map_err(|e| SessionError::spawn(format!("Shell not found: {} ({e})", spec.shell)))?;

    let pair = native_pty_system()
        .openpty(to_pty_size(spec.size))
        .map_err(|e| SessionError::spawn(format!("PTY allocation failed: {e}")))?;

    let mut cmd = PtyCommand::new(&spec.shell);
    if let Some(dir) = spec.working_dir.as_deref() {
        cmd.cwd(dir);
    }
    cmd.env_remove(NESTED_SESSION_ENV);

    let child = pair
        .slave
        .spawn_command(cmd)
        .map_err(|e| SessionError::spawn(format!("Failed to start {}: {e}", spec.shell)))?;
    // Keeping the slave open here would hide the shell's EOF from the reader
    drop(pair.slave);

    let reader = match pair.master.try_clone_reader() {
        Ok(reader) => reader,
        Err(e) => {
            terminate_child(child);
            return Err(SessionError::spawn(format!("PTY reader unavailable: {e}")));
        }
    };

    let writer = match pair.master.take_writer() {
        Ok(writer) => writer,
        Err(e) => {
            terminate_child(child);
            return Err(SessionError::spawn(format!("PTY writer unavailable: {e}")));
        }
    };

    Ok(SpawnedShell {
        master: pair.master,
        reader,
        writer,
        child,
    })
}

/// Kill and reap a child that never made it into a supervisor
pub(super) fn terminate_child(mut child: Box<dyn Child + Send + Sync>) {
    let _ = child.kill();
    let _ = child.wait();
}
