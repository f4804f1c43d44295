//! Outbound lifecycle events

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::types::SessionId;

/// Capacity of the observer broadcast channel behind [`EventBus`]
const OBSERVER_CAPACITY: usize = 1024;

/// Events held for a primary listener that has not attached yet
pub const LISTENER_BACKLOG: usize = 1024;

/// Events published by a session supervisor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SessionEvent {
    /// Verbatim PTY output
    Output {
        /// Originating session
        session_id: SessionId,
        /// Raw bytes exactly as read
        data: Vec<u8>,
    },
    /// Exit marker detected; the shell is still alive
    AgentExited {
        /// Originating session
        session_id: SessionId,
    },
    /// The shell itself ended; no further events follow for this id
    SessionClosed {
        /// Originating session
        session_id: SessionId,
    },
}

impl SessionEvent {
    /// Session this event belongs to
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::Output { session_id, .. }
            | Self::AgentExited { session_id }
            | Self::SessionClosed { session_id } => session_id,
        }
    }

    /// Wire name of the event
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Output { .. } => "output",
            Self::AgentExited { .. } => "agent-exited",
            Self::SessionClosed { .. } => "session-closed",
        }
    }
}

/// Destination for session events
///
/// Called from supervisor threads; implementations must not block.
pub trait EventSink: Send + Sync + 'static {
    /// Publish one event
    fn emit(&self, event: SessionEvent);
}

impl EventSink for mpsc::UnboundedSender<SessionEvent> {
    fn emit(&self, event: SessionEvent) {
        // Receiver gone means nobody is listening anymore
        let _ = self.send(event);
    }
}

/// Primary listener slot: a bounded backlog until the listener attaches
enum Primary {
    Pending(VecDeque<SessionEvent>),
    Attached(mpsc::UnboundedSender<SessionEvent>),
}

/// Fan-out bus with a once-only listener registration
///
/// Events published before the primary UI listener attaches are held in a
/// backlog of at most [`LISTENER_BACKLOG`] events and handed over on attach.
/// When the backlog is full the oldest `output` event is dropped first, so
/// lifecycle events survive. UI frameworks tend to re-run their wiring code;
/// the `attached` flag turns a second registration into a no-op instead of a
/// duplicate subscription. Secondary observers use a lossy broadcast channel.
pub struct EventBus {
    primary: Mutex<Primary>,
    observers: broadcast::Sender<SessionEvent>,
    attached: AtomicBool,
}

impl EventBus {
    /// Create a new bus
    #[must_use]
    pub fn new() -> Self {
        let (observers, _) = broadcast::channel(OBSERVER_CAPACITY);
        Self {
            primary: Mutex::new(Primary::Pending(VecDeque::new())),
            observers,
            attached: AtomicBool::new(false),
        }
    }

    /// Register the primary UI listener
    ///
    /// The receiver starts with the backlog accumulated so far. Returns
    /// `None` if a listener was already attached.
    pub fn attach_listener(&self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        if self
            .attached
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("Event listener already attached; skipping");
            return None;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut primary = self.primary.lock();
        if let Primary::Pending(backlog) = &mut *primary {
            for event in backlog.drain(..) {
                let _ = tx.send(event);
            }
        }
        *primary = Primary::Attached(tx);
        Some(rx)
    }

    /// Whether the primary listener has been attached
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Events waiting for the primary listener to attach
    #[must_use]
    pub fn backlog_len(&self) -> usize {
        match &*self.primary.lock() {
            Primary::Pending(backlog) => backlog.len(),
            Primary::Attached(_) => 0,
        }
    }

    /// Additional observer (logging, diagnostics); may lag and drop events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.observers.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: SessionEvent) {
        let _ = self.observers.send(event.clone());

        match &mut *self.primary.lock() {
            Primary::Attached(tx) => {
                let _ = tx.send(event);
            }
            Primary::Pending(backlog) => {
                if backlog.len() >= LISTENER_BACKLOG {
                    let victim = backlog
                        .iter()
                        .position(|e| matches!(e, SessionEvent::Output { .. }))
                        .unwrap_or(0);
                    backlog.remove(victim);
                }
                backlog.push_back(event);
            }
        }
    }
}
