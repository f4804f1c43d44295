//! # Deckmind session supervisor
//!
//! Hosts interactive AI coding agents inside real shells. Each session is a
//! pseudo-terminal running the user's shell; the agent command is typed into
//! that shell, so when the agent exits the shell survives and the session can
//! relaunch, resume or continue the conversation without losing scrollback.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use deckmind_session::{CreateSessionRequest, EventBus, HostOptions, SessionRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = Arc::new(EventBus::new());
//!     let mut events = bus.attach_listener().ok_or("listener already attached")?;
//!     let registry = SessionRegistry::new(HostOptions::default(), bus.clone())?;
//!
//!     let session = registry.create(CreateSessionRequest::default()).await?;
//!     registry.send_message(&session.id, "Explain this repository").await?;
//!
//!     while let Some(event) = events.recv().await {
//!         log::info!("{} for {}", event.name(), event.session_id());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`registry`]: authoritative table of live sessions
//! - [`transport`]: per-session PTY supervisor and command composition
//! - [`sentinel`]: invisible agent-exit marker and its stream scanner
//! - [`bus`]: outbound events and inbound UI commands
//! - [`resume`]: best-effort resume-id extraction for the UI
//! - [`types`]: snapshots, identifiers and host options
//! - [`error`]: error types and handling
//!
//! ## Events
//!
//! | Event | Meaning |
//! |---|---|
//! | `output` | verbatim PTY bytes |
//! | `agent-exited` | exit marker seen; the shell is still alive |
//! | `session-closed` | the shell ended; nothing follows for that id |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bus;
pub mod error;
pub mod registry;
pub mod resume;
pub mod sentinel;
pub mod transport;
pub mod types;

// Re-export commonly used types for external API
pub use bus::{CommandHandler, EventBus, EventSink, SessionEvent, UiCommand, UiReply};
pub use error::{Result, SessionError};
pub use registry::SessionRegistry;
pub use resume::find_resume_id;
pub use sentinel::{SENTINEL, SentinelScanner};
pub use transport::{LaunchMode, Supervisor, compose};
pub use types::{
    CreateSessionRequest, HostOptions, HostOptionsBuilder, SessionId, SessionInfo, SessionState,
    TerminalSize,
};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
