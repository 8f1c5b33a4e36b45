//! Terminal text helpers and paging arithmetic.
//!
//! ```
//! use reader_tui::util::{display_width, truncate_to_width};
//!
//! assert_eq!(display_width("Reader 世界"), 11);
//! assert_eq!(truncate_to_width("A very long document title", 10), "A very ...");
//! ```

mod text;
pub mod viewport;

pub use text::{display_width, strip_control_chars, truncate_to_width};
