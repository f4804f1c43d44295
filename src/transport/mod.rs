//! Transport layer between the session registry and the hosted shells
//!
//! Each session owns a [`Supervisor`], which wraps a pseudo-terminal, the
//! shell running on it, and the threads that move bytes in and out.

pub mod pty;

pub use pty::{CommandBuilder, LaunchMode, ShellSpec, Supervisor, compose};
