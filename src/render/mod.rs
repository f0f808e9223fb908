//! Rendering of outline results and extracted layout.

mod json;

pub use json::{layout_lines, layout_to_json, to_json, JsonFormat, LayoutLine};
