//! Core registry structure and lifecycle management
//!
//! Provides the `SessionRegistry` struct with construction, lookup and shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::bus::EventSink;
use crate::error::{Result, SessionError};
use crate::transport::Supervisor;
use crate::types::{HostOptions, SessionId};

use super::entry::{SessionRecord, SessionTable};

// ============================================================================
// REGISTRY CORE
// ============================================================================

pub(crate) struct RegistryInner {
    pub options: HostOptions,
    pub table: RwLock<SessionTable>,
    /// Downstream destination for every session event
    pub sink: Arc<dyn EventSink>,
    /// `session-closed` events retired from the table but not yet forwarded
    pub retiring: AtomicUsize,
}

/// Authoritative table of live sessions
///
/// The single entry point for create, close and list. The table lock is held
/// only while the table itself changes; spawning shells, PTY writes and child
/// waits all happen outside it, so a slow spawn never stalls `list()`.
#[derive(Clone)]
pub struct SessionRegistry {
    pub(crate) inner: Arc<RegistryInner>,
}

impl SessionRegistry {
    /// Create a registry publishing every session event into `sink`
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the agent path is empty or the PTY size has
    /// a zero dimension.
    pub fn new(options: HostOptions, sink: Arc<dyn EventSink>) -> Result<Self> {
        if options.agent_path.trim().is_empty() {
            return Err(SessionError::invalid_config("agent path must not be empty"));
        }
        if options.pty_size.rows == 0 || options.pty_size.cols == 0 {
            return Err(SessionError::invalid_config(
                "PTY size must have non-zero rows and columns",
            ));
        }

        log::debug!(
            "Session registry ready (agent: {}, shell: {})",
            options.agent_path,
            options.resolved_shell()
        );

        Ok(Self {
            inner: Arc::new(RegistryInner {
                options,
                table: RwLock::new(SessionTable::default()),
                sink,
                retiring: AtomicUsize::new(0),
            }),
        })
    }

    /// Options every session is created with
    #[must_use]
    pub fn options(&self) -> &HostOptions {
        &self.inner.options
    }

    /// Supervisor for `id`
    ///
    /// A session that is shutting down reports `SessionClosed` rather than
    /// `NotFound` until its `session-closed` event has been delivered.
    pub(crate) fn supervisor(&self, id: &SessionId) -> Result<Arc<Supervisor>> {
        let table = self.inner.table.read();
        if let Some(entry) = table.sessions.get(id) {
            return Ok(Arc::clone(&entry.supervisor));
        }
        if table.closing.contains(id) {
            return Err(SessionError::session_closed(id.as_str()));
        }
        Err(SessionError::not_found(id.as_str()))
    }

    /// Current metadata record for `id`
    pub(crate) fn record(&self, id: &SessionId) -> Result<Arc<SessionRecord>> {
        self.inner
            .table
            .read()
            .sessions
            .get(id)
            .map(|entry| Arc::clone(&entry.record))
            .ok_or_else(|| SessionError::not_found(id.as_str()))
    }

    /// No live session, no close in flight and every `session-closed`
    /// already handed to the downstream sink
    #[must_use]
    pub fn is_settled(&self) -> bool {
        let table_empty = {
            let table = self.inner.table.read();
            table.sessions.is_empty() && table.closing.is_empty()
        };
        table_empty && self.inner.retiring.load(Ordering::SeqCst) == 0
    }

    /// Terminate every session
    ///
    /// Called on host exit. `session-closed` events follow asynchronously.
    pub fn shutdown(&self) {
        log::info!("Shutting down session registry...");

        let ids: Vec<SessionId> = {
            let table = self.inner.table.read();
            table
                .ordered()
                .into_iter()
                .map(|entry| entry.supervisor.session_id().clone())
                .collect()
        };

        for id in ids {
            log::debug!("Terminating session: {}", id);
            if let Err(e) = self.close(&id) {
                log::warn!("Failed to terminate session {}: {}", id, e);
            }
        }

        log::info!("Session registry shutdown complete");
    }
}
