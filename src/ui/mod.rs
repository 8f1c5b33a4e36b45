//! Terminal User Interface module.
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task completion handling
//! - `helpers` - Task spawning and panic capture
//! - `render` - View rendering dispatch
//! - `documents` - Category bar and document list
//! - `reader` - Markdown rendering and the reader view
//! - `status` - Key hint bar

mod documents;
mod events;
mod helpers;
mod input;
mod loop_runner;
pub mod reader;
mod render;
mod status;

pub use loop_runner::{run, Action};
