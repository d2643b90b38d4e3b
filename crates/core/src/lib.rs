//! Beacon Core — run configuration, instance identity, and the per-host
//! report state store.

pub mod config;
pub mod error;
pub mod identity;
pub mod state;
