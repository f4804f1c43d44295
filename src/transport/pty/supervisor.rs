//! Process supervisor: one PTY, one shell, one session

use std::io::Read;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use portable_pty::{Child, ChildKiller, MasterPty};
use tokio::sync::{mpsc, oneshot};

use crate::bus::{EventSink, SessionEvent};
use crate::error::{Result, SessionError};
use crate::types::{SessionId, SessionState, TerminalSize};

use super::lifecycle::{ShellSpec, spawn_shell, terminate_child, to_pty_size};
use super::reader::{run_reader, run_waiter};
use super::writer::{WriteOp, run_writer};

// ============================================================================
// SHARED STATE
// ============================================================================

/// State shared between the supervisor handle and its I/O threads
///
/// `emit_lock` serializes every publication so that `session-closed` is
/// strictly the last event for the session: a reader that lost the race to
/// the waiter sees `Closed` and drops its chunk instead of emitting it late.
pub(crate) struct SupervisorShared {
    pub(crate) session_id: SessionId,
    sink: Arc<dyn EventSink>,
    state: Mutex<SessionState>,
    emit_lock: Mutex<()>,
    killer: Mutex<Option<Box<dyn ChildKiller + Send + Sync>>>,
    last_output: Mutex<Option<Instant>>,
}

impl SupervisorShared {
    pub(crate) fn new(
        session_id: SessionId,
        sink: Arc<dyn EventSink>,
        killer: Option<Box<dyn ChildKiller + Send + Sync>>,
    ) -> Self {
        Self {
            session_id,
            sink,
            state: Mutex::new(SessionState::Launching),
            emit_lock: Mutex::new(()),
            killer: Mutex::new(killer),
            last_output: Mutex::new(None),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        *self.state.lock()
    }

    fn last_output(&self) -> Option<Instant> {
        *self.last_output.lock()
    }

    /// Forward a chunk of output; `false` once the session is closed
    pub(crate) fn publish_output(&self, data: &[u8]) -> bool {
        let _guard = self.emit_lock.lock();
        if self.state().is_closed() {
            return false;
        }
        *self.last_output.lock() = Some(Instant::now());
        self.sink.emit(SessionEvent::Output {
            session_id: self.session_id.clone(),
            data: data.to_vec(),
        });
        true
    }

    /// Record the exit marker and emit `agent-exited`
    pub(crate) fn publish_agent_exited(&self) -> bool {
        let _guard = self.emit_lock.lock();
        {
            let mut state = self.state.lock();
            if state.is_closed() {
                return false;
            }
            *state = SessionState::AgentExited;
        }
        log::debug!("[{}] agent exited", self.session_id);
        self.sink.emit(SessionEvent::AgentExited {
            session_id: self.session_id.clone(),
        });
        true
    }

    /// `Launching -> Running` once the launch command reached the PTY
    pub(crate) fn mark_running(&self) {
        let mut state = self.state.lock();
        if *state == SessionState::Launching {
            *state = SessionState::Running;
            log::debug!("[{}] agent launched", self.session_id);
        }
    }

    /// `AgentExited -> Launching` ahead of a relaunch
    pub(crate) fn begin_relaunch(&self) -> Result<()> {
        let mut state = self.state.lock();
        match *state {
            SessionState::AgentExited => {
                *state = SessionState::Launching;
                Ok(())
            }
            SessionState::Closed => Err(SessionError::session_closed(self.session_id.as_str())),
            SessionState::Launching | SessionState::Running => {
                Err(SessionError::agent_running(self.session_id.as_str()))
            }
        }
    }

    /// Transition to `Closed` and emit `session-closed`, exactly once
    pub(crate) fn close(&self, reason: &str) -> bool {
        let _guard = self.emit_lock.lock();
        {
            let mut state = self.state.lock();
            if state.is_closed() {
                return false;
            }
            *state = SessionState::Closed;
        }
        log::info!("[{}] session closed: {}", self.session_id, reason);
        self.sink.emit(SessionEvent::SessionClosed {
            session_id: self.session_id.clone(),
        });
        true
    }

    /// Terminate the shell; the I/O threads unwind on their own
    pub(crate) fn kill(&self) {
        if let Some(killer) = self.killer.lock().as_mut() {
            if let Err(e) = killer.kill() {
                log::debug!("[{}] kill: {}", self.session_id, e);
            }
        }
    }
}

// ============================================================================
// SUPERVISOR
// ============================================================================

/// Reader and child handed over to their threads by [`Supervisor::start`]
struct PendingIo {
    reader: Box<dyn Read + Send>,
    child: Box<dyn Child + Send + Sync>,
}

/// Owner of one PTY and the shell running on it
///
/// Writes go through a single writer thread, so concurrent callers never
/// interleave at the PTY. Output is read by a dedicated thread that also
/// watches for the exit marker; a third thread waits on the shell process.
pub struct Supervisor {
    shared: Arc<SupervisorShared>,
    ops_tx: mpsc::UnboundedSender<WriteOp>,
    master: Mutex<Box<dyn MasterPty + Send>>,
    pending: Mutex<Option<PendingIo>>,
    close_grace: Duration,
}

impl Supervisor {
    /// Spawn the shell on a fresh PTY
    ///
    /// Blocking. No events are emitted until [`Supervisor::start`] is called,
    /// which lets the caller register the session first.
    ///
    /// # Errors
    /// Returns `SessionError::Spawn` if the shell cannot be started.
    pub fn spawn(
        session_id: SessionId,
        spec: &ShellSpec,
        sink: Arc<dyn EventSink>,
        submit_delay: Duration,
        close_grace: Duration,
    ) -> Result<Self> {
        let spawned = spawn_shell(spec)?;
        let killer = spawned.child.clone_killer();
        let shared = Arc::new(SupervisorShared::new(session_id, sink, Some(killer)));

        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        let writer_shared = Arc::clone(&shared);
        let writer = spawned.writer;
        let spawn_result = thread::Builder::new()
            .name(thread_name("pty-writer", &shared.session_id))
            .spawn(move || run_writer(writer, ops_rx, writer_shared, submit_delay));
        if let Err(e) = spawn_result {
            terminate_child(spawned.child);
            return Err(SessionError::spawn(format!("Failed to start writer thread: {e}")));
        }

        log::debug!("[{}] spawned {}", shared.session_id, spec.shell);

        Ok(Self {
            shared,
            ops_tx,
            master: Mutex::new(spawned.master),
            pending: Mutex::new(Some(PendingIo {
                reader: spawned.reader,
                child: spawned.child,
            })),
            close_grace,
        })
    }

    /// Start the I/O threads and type the launch command after `delay`
    ///
    /// Calling this twice is a no-op.
    pub fn start(&self, launch_line: String, delay: Duration) {
        let Some(PendingIo { reader, child }) = self.pending.lock().take() else {
            return;
        };

        let reader_shared = Arc::clone(&self.shared);
        if let Err(e) = thread::Builder::new()
            .name(thread_name("pty-reader", &self.shared.session_id))
            .spawn(move || run_reader(reader, reader_shared))
        {
            log::warn!("[{}] reader thread failed: {}", self.shared.session_id, e);
            self.shared.kill();
            self.shared.close("reader thread failed to start");
            return;
        }

        let waiter_shared = Arc::clone(&self.shared);
        let grace = self.close_grace;
        if let Err(e) = thread::Builder::new()
            .name(thread_name("pty-waiter", &self.shared.session_id))
            .spawn(move || run_waiter(child, waiter_shared, grace))
        {
            // The reader still reports end-of-stream on its own
            log::warn!("[{}] waiter thread failed: {}", self.shared.session_id, e);
        }

        let _ = self.ops_tx.send(WriteOp::Launch {
            line: launch_line,
            delay,
            response_tx: None,
        });
    }

    /// Session this supervisor belongs to
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.shared.session_id
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Whether output arrived within `threshold` and the agent is live
    #[must_use]
    pub fn is_busy(&self, threshold: Duration) -> bool {
        match self.state() {
            SessionState::Launching | SessionState::Running => self
                .shared
                .last_output()
                .is_some_and(|at| at.elapsed() < threshold),
            SessionState::AgentExited | SessionState::Closed => false,
        }
    }

    /// Write raw bytes in a single write
    ///
    /// # Errors
    /// Returns `SessionClosed` after the session closed, or `Io` if the PTY
    /// write failed.
    pub async fn write(&self, data: Vec<u8>) -> Result<()> {
        self.dispatch(|response_tx| WriteOp::Write {
            data,
            response_tx: Some(response_tx),
        })
        .await
    }

    /// Write control bytes (interrupt, escape, mode cycle) atomically
    ///
    /// # Errors
    /// Returns `InvalidInput` for an empty sequence, otherwise as [`Supervisor::write`].
    pub async fn write_control(&self, bytes: Vec<u8>) -> Result<()> {
        if bytes.is_empty() {
            return Err(SessionError::invalid_input("empty control sequence"));
        }
        self.write(bytes).await
    }

    /// Submit a message: body first, then a lone carriage return
    ///
    /// # Errors
    /// Returns `InvalidInput` if the body carries its own line terminator.
    pub async fn submit(&self, body: String) -> Result<()> {
        if body.ends_with('\r') || body.ends_with('\n') {
            return Err(SessionError::invalid_input(
                "message body must not end with a line terminator",
            ));
        }
        self.dispatch(|response_tx| WriteOp::Submit {
            body: body.into_bytes(),
            response_tx: Some(response_tx),
        })
        .await
    }

    /// Type a new agent command after the previous agent exited
    ///
    /// # Errors
    /// Returns `AgentRunning` unless the exit marker was seen since the last
    /// launch, `SessionClosed` if the shell is gone.
    pub async fn relaunch(&self, line: String) -> Result<()> {
        self.shared.begin_relaunch()?;
        self.dispatch(|response_tx| WriteOp::Launch {
            line,
            delay: Duration::ZERO,
            response_tx: Some(response_tx),
        })
        .await
    }

    /// Resize the PTY
    ///
    /// # Errors
    /// Returns `Io` if the resize ioctl fails.
    pub fn resize(&self, size: TerminalSize) -> Result<()> {
        if size.rows == 0 || size.cols == 0 {
            return Err(SessionError::invalid_input(
                "PTY size must have non-zero rows and columns",
            ));
        }
        self.master
            .lock()
            .resize(to_pty_size(size))
            .map_err(|e| SessionError::Io(std::io::Error::other(e.to_string())))
    }

    /// Terminate the shell
    ///
    /// `session-closed` follows once the read loop observes end-of-stream or
    /// the wait thread observes the exit.
    pub fn terminate(&self) {
        log::debug!("[{}] terminating shell", self.shared.session_id);
        self.shared.kill();
    }

    async fn dispatch(
        &self,
        make_op: impl FnOnce(oneshot::Sender<Result<()>>) -> WriteOp,
    ) -> Result<()> {
        let closed = || SessionError::session_closed(self.shared.session_id.as_str());
        if self.state().is_closed() {
            return Err(closed());
        }

        let (response_tx, response_rx) = oneshot::channel();
        self.ops_tx.send(make_op(response_tx)).map_err(|_| closed())?;
        response_rx.await.map_err(|_| closed())?
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if !self.state().is_closed() {
            self.shared.kill();
        }
        // Never started: reap the child here since no waiter owns it
        if let Some(pending) = self.pending.lock().take() {
            terminate_child(pending.child);
            self.shared.close("dropped before start");
        }
    }
}

fn thread_name(role: &str, session_id: &SessionId) -> String {
    let short: String = session_id.as_str().chars().take(8).collect();
    format!("{role}-{short}")
}
