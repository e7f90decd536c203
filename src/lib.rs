//! # Introduction
//!
//! evalpad is an editor shell for interactive evaluation: an input surface
//! holding the source, an output surface showing results or errors, and a
//! control strip with a status label and evaluate/abort buttons. Evaluation is
//! done out-of-band by a pluggable collaborator; the shell only mediates the
//! lifecycle.
//!
//! ## Flow
//!
//! ```text
//! keys → App → EditorShell ──snapshot──▶ Evaluator (worker thread)
//!               ▲                              │
//!               └──── EvaluationEvent ◀────────┘  (drained on the UI thread)
//! ```
//!
//! 1. [`document`]: source text with a revision counter, name, path, dirty flag.
//! 2. [`shell`]: the `Idle → Evaluating → (Aborting →) Idle` state machine.
//! 3. [`eval`]: the collaborator contract, a background evaluator and a small
//!    calculator engine.
//! 4. [`layout`]: pure description of panes and controls, resolved to
//!    rectangles by the UI.
//! 5. [`ui`]: ratatui-based terminal binding; not part of the stable library API.
//! 6. [`config`], [`logging`], [`error`]: ambient plumbing.

pub mod config;
pub mod document;
pub mod error;
pub mod eval;
pub mod layout;
pub mod logging;
pub mod shell;
pub mod ui;
