//! Event bus boundary between the supervisor core and the UI layer
//!
//! Outbound: every supervisor publishes [`SessionEvent`]s into an
//! [`EventSink`]. Inbound: the UI issues [`UiCommand`]s which the
//! [`CommandHandler`] routes to the registry.

mod events;
mod handler;
mod messages;

pub use events::{EventBus, EventSink, LISTENER_BACKLOG, SessionEvent};
pub use handler::CommandHandler;
pub use messages::{UiCommand, UiReply};
