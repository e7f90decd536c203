//! Terminal binding built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into four parts:
//!
//! - **[`app`]**: application state, keyboard event loop, draining evaluation
//!   callbacks on the UI thread
//! - **[`cursor`]**: cursor movement and edits for the input surface
//! - **[`panes`]**: stateless render functions for the input, output and
//!   control strip
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with an
//! [`EditorShell`] and the receiving end of the evaluator's event channel,
//! then call [`App::run`].
//!
//! [`EditorShell`]: crate::shell::EditorShell
//! [`App::run`]: app::App::run

pub mod app;
pub mod cursor;
pub mod panes;
pub mod theme;

pub use app::App;
