//! Session registry implementation
//!
//! This module is organized into logical submodules:
//! - `core`: Core struct, constructor, lookups and shutdown
//! - `create`: Two-phase session creation
//! - `list`: Snapshots and read accessors
//! - `interaction`: Writes, relaunch and close
//! - `entry`: Table entries and immutable metadata records
//! - `sink`: Event sink that retires closed sessions

mod core;
mod create;
mod entry;
mod interaction;
mod list;
mod sink;

pub use core::SessionRegistry;
