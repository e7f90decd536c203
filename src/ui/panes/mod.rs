//! TUI pane rendering modules
//!
//! - [`source`]: input surface with gutter, margin mark, highlighting and cursor
//! - [`output`]: read-only output surface
//! - [`status`]: control strip with status label and evaluate/abort buttons
//!
//! Each module exports a single `render_*` function; panes hold no state of
//! their own beyond the scroll offsets passed in by the app.

pub mod output;
pub mod source;
pub mod status;

pub use output::render_output_pane;
pub use source::{render_input_pane, InputView};
pub use status::render_control_strip;
