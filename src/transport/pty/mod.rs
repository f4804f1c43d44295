//! PTY transport: one shell per session, agent typed into it
//!
//! The shell outlives the agent. When the agent exits, the shell prints an
//! invisible marker (see [`crate::sentinel`]) and the session stays usable
//! for a relaunch until the shell itself ends.

mod command;
pub mod config;
mod lifecycle;
mod reader;
mod supervisor;
mod writer;

pub use command::{CommandBuilder, LaunchMode, compose};
pub use lifecycle::ShellSpec;
pub use supervisor::Supervisor;
