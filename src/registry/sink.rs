//! Event sink that keeps the registry table in step with its supervisors

use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};

use crate::bus::{EventSink, SessionEvent};

use super::core::RegistryInner;

/// Handed to every supervisor instead of the downstream sink
///
/// On `session-closed` the entry is discarded before the event is forwarded,
/// so a listener reacting to the event already sees the session gone.
pub(crate) struct RegistrySink {
    registry: Weak<RegistryInner>,
    downstream: Arc<dyn EventSink>,
}

impl RegistrySink {
    pub fn new(registry: &Arc<RegistryInner>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            downstream: Arc::clone(&registry.sink),
        }
    }
}

impl EventSink for RegistrySink {
    fn emit(&self, event: SessionEvent) {
        let SessionEvent::SessionClosed { session_id } = &event else {
            self.downstream.emit(event);
            return;
        };
        let Some(registry) = self.registry.upgrade() else {
            self.downstream.emit(event);
            return;
        };

        // Counted before the table changes so the registry never looks
        // settled while this event is still on its way
        registry.retiring.fetch_add(1, Ordering::SeqCst);
        let removed = {
            let mut table = registry.table.write();
            table.closing.remove(session_id);
            table.remove(session_id)
        };
        if removed.is_some() {
            log::info!("Session {} ended on its own", session_id);
        }
        // Dropped here, outside the table lock
        drop(removed);

        self.downstream.emit(event);
        registry.retiring.fetch_sub(1, Ordering::SeqCst);
    }
}
