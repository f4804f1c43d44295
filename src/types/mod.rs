//! Type definitions shared across the crate
//!
//! - [`identifiers`] - Type-safe ID wrappers (`SessionId`)
//! - [`session`] - Session snapshots and supervisor state
//! - [`options`] - Host configuration with a builder

pub mod identifiers;
pub mod options;
pub mod session;

pub use identifiers::SessionId;
pub use options::{HostOptions, HostOptionsBuilder, TerminalSize};
pub use session::{CreateSessionRequest, SessionInfo, SessionState};
