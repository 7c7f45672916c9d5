//! # natlog
//!
//! The natlog binary as a library: CLI commands, configuration, the
//! loaded engine, text rendering and the HTTP query server. Exposed so
//! that integration tests can drive the API without a real socket.

pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod render;
