//! Terminal reader for documents saved in Readwise Reader.
//!
//! The binary wires these modules together; they are exposed as a library
//! so integration tests can drive the state machine and the API client
//! without a terminal.

pub mod api;
pub mod app;
pub mod config;
pub mod content;
pub mod documents;
pub mod keybindings;
pub mod ui;
pub mod util;
