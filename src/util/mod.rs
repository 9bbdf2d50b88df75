//! Text helpers for rendering untrusted feed text in fixed-width output.

mod text;

pub use text::{display_width, strip_control_chars, truncate_to_width, wrap_lines};
