//! The editor shell: document, output surface, status label and the
//! evaluate/abort state machine.
//!
//! ```text
//! Idle --submit--> Evaluating --complete--> Idle
//!                  Evaluating --abort--> Aborting --ack------> Idle
//!                                        Aborting --complete-> Idle
//! ```
//!
//! The shell is toolkit-independent and single-threaded. Results reach it as
//! [`EvaluationEvent`]s which the UI loop passes to [`EditorShell::handle_event`];
//! every callback is matched against the handle of the outstanding submission,
//! so late or duplicate callbacks are ignored rather than corrupting state.

pub mod state;

pub use state::{Controls, ShellState};

use crate::document::Document;
use crate::error::{DocumentError, ShellError};
use crate::eval::{
    EvaluationEvent, EvaluationEventKind, EvaluationHandle, EvaluationResult, Evaluator,
    SourceSpan,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const EVALUATING_STATUS: &str = "Evaluating…";
pub const ABORTING_STATUS: &str = "Aborting…";

/// Shell behavior switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellOptions {
    /// Whether the control strip has an abort button
    pub has_abort: bool,
    /// Re-evaluate whenever the document changes
    pub auto_evaluate: bool,
}

impl Default for ShellOptions {
    fn default() -> Self {
        ShellOptions {
            has_abort: true,
            auto_evaluate: false,
        }
    }
}

/// Contents of the read-only output surface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSurface {
    pub text: String,
    pub is_error: bool,
}

/// Error annotation shown in the input surface's margin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarginMark {
    pub span: SourceSpan,
    /// 1-based line of `span.start` in the evaluated snapshot
    pub line: usize,
    /// 0-based column of `span.start`
    pub column: usize,
    pub message: String,
}

/// Whether a callback changed the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Applied,
    /// Stale handle, or the submission already finished
    Ignored,
}

#[derive(Debug)]
struct InFlight {
    handle: EvaluationHandle,
    snapshot: String,
    revision: u64,
}

pub struct EditorShell<V: Evaluator> {
    document: Document,
    evaluator: V,
    options: ShellOptions,
    state: ShellState,
    in_flight: Option<InFlight>,
    output: OutputSurface,
    status: String,
    margin: Option<MarginMark>,
    rerun_pending: bool,
}

impl<V: Evaluator> EditorShell<V> {
    pub fn new(document: Document, evaluator: V, options: ShellOptions) -> Self {
        EditorShell {
            document,
            evaluator,
            options,
            state: ShellState::Idle,
            in_flight: None,
            output: OutputSurface::default(),
            status: String::new(),
            margin: None,
            rerun_pending: false,
        }
    }

    pub fn state(&self) -> ShellState {
        self.state
    }

    pub fn controls(&self) -> Controls {
        Controls::for_state(self.state, self.options.has_abort)
    }

    pub fn options(&self) -> ShellOptions {
        self.options
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn output(&self) -> &OutputSurface {
        &self.output
    }

    /// Text of the status label
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Show a transient message in the status label
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    pub fn margin_mark(&self) -> Option<&MarginMark> {
        self.margin.as_ref()
    }

    /// Text captured by the outstanding submission
    pub fn in_flight_snapshot(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|f| f.snapshot.as_str())
    }

    pub fn in_flight_handle(&self) -> Option<EvaluationHandle> {
        self.in_flight.as_ref().map(|f| f.handle)
    }

    pub fn evaluator(&self) -> &V {
        &self.evaluator
    }

    /// Snapshot the document and hand it to the evaluator.
    ///
    /// Rejected unless the shell is idle and the document has content.
    pub fn submit_for_evaluation(&mut self) -> Result<EvaluationHandle, ShellError> {
        if self.state != ShellState::Idle {
            return Err(ShellError::NotIdle { state: self.state });
        }
        if self.document.is_blank() {
            return Err(ShellError::EmptyDocument);
        }

        let snapshot = self.document.text().to_owned();
        let revision = self.document.revision();
        let handle = self.evaluator.evaluate(snapshot.clone());

        tracing::info!(%handle, revision, "submitted for evaluation");

        self.state = ShellState::Evaluating;
        self.in_flight = Some(InFlight {
            handle,
            snapshot,
            revision,
        });
        self.margin = None;
        self.rerun_pending = false;
        self.status = EVALUATING_STATUS.to_string();

        Ok(handle)
    }

    /// Apply the result of `handle`.
    ///
    /// Also valid while aborting: a result that beats the cancellation
    /// acknowledgment is still shown, and the acknowledgment becomes a no-op.
    pub fn on_evaluation_complete(
        &mut self,
        handle: EvaluationHandle,
        result: EvaluationResult,
        elapsed: Duration,
    ) -> Delivery {
        let Some(flight) = self.take_in_flight(handle) else {
            tracing::debug!(%handle, state = %self.state, "ignoring stale evaluation result");
            return Delivery::Ignored;
        };

        if self.state == ShellState::Aborting {
            tracing::debug!(%handle, "result arrived before cancellation acknowledgment");
        }
        self.state = ShellState::Idle;

        let seconds = elapsed.as_secs_f64();
        match result {
            EvaluationResult::Success { rendered_output } => {
                tracing::info!(%handle, revision = flight.revision, seconds, "evaluation succeeded");
                self.output = OutputSurface {
                    text: rendered_output,
                    is_error: false,
                };
                self.status = format!("Evaluated in {:.4}s", seconds);
            }
            EvaluationResult::Failure {
                error_message,
                source_range,
            } => {
                tracing::info!(%handle, revision = flight.revision, seconds, error = %error_message, "evaluation failed");
                self.margin = source_range.map(|span| {
                    let (line, column) = span.position_in(&flight.snapshot);
                    MarginMark {
                        span,
                        line,
                        column,
                        message: error_message.clone(),
                    }
                });
                self.output = OutputSurface {
                    text: error_message,
                    is_error: true,
                };
                self.status = format!("Evaluation failed after {:.4}s", seconds);
            }
        }

        if self.rerun_pending {
            self.rerun_pending = false;
            self.auto_submit();
        }

        Delivery::Applied
    }

    /// Ask the evaluator to stop the outstanding evaluation
    pub fn request_abort(&mut self) -> Result<(), ShellError> {
        if self.state != ShellState::Evaluating {
            return Err(ShellError::NotEvaluating { state: self.state });
        }
        let Some(handle) = self.in_flight_handle() else {
            return Err(ShellError::NotEvaluating { state: self.state });
        };

        tracing::info!(%handle, "abort requested");
        self.state = ShellState::Aborting;
        self.evaluator.cancel(handle);
        self.status = ABORTING_STATUS.to_string();
        Ok(())
    }

    /// The evaluator confirmed that `handle` was cancelled
    pub fn on_cancellation_acknowledged(&mut self, handle: EvaluationHandle) -> Delivery {
        if self.take_in_flight(handle).is_none() {
            tracing::debug!(%handle, state = %self.state, "ignoring redundant cancellation acknowledgment");
            return Delivery::Ignored;
        }

        if self.state == ShellState::Evaluating {
            tracing::warn!(%handle, "cancellation acknowledged without an abort request");
        }
        tracing::info!(%handle, "evaluation aborted");

        self.state = ShellState::Idle;
        self.rerun_pending = false;
        self.status.clear();
        Delivery::Applied
    }

    /// Dispatch a collaborator callback
    pub fn handle_event(&mut self, event: EvaluationEvent) -> Delivery {
        match event.kind {
            EvaluationEventKind::Completed { result, elapsed } => {
                self.on_evaluation_complete(event.handle, result, elapsed)
            }
            EvaluationEventKind::CancellationAcknowledged => {
                self.on_cancellation_acknowledged(event.handle)
            }
        }
    }

    /// Replace the document text. Allowed in every state; the outstanding
    /// snapshot is unaffected.
    pub fn on_document_changed(&mut self, new_text: impl Into<String>) {
        self.document.set_text(new_text);
        self.request_auto_evaluation();
    }

    /// Swap in another document (e.g. one loaded from disk).
    ///
    /// The revision keeps increasing across the swap, and auto-evaluate
    /// treats it like any other change.
    pub fn replace_document(&mut self, mut document: Document) {
        document.continue_from(self.document.revision());
        tracing::debug!(
            name = document.name(),
            revision = document.revision(),
            "replacing document"
        );
        self.document = document;
        self.margin = None;
        self.request_auto_evaluation();
    }

    /// With auto-evaluate on, submit now or once the outstanding evaluation
    /// completes. Does nothing otherwise.
    pub fn request_auto_evaluation(&mut self) {
        if !self.options.auto_evaluate {
            return;
        }
        if self.state.is_idle() {
            self.auto_submit();
        } else {
            self.rerun_pending = true;
        }
    }

    pub fn save_document(&mut self, path: Option<&Path>) -> Result<PathBuf, DocumentError> {
        self.document.save(path)
    }

    /// Cancel anything outstanding and start over with an empty document
    pub fn close(&mut self) {
        if let Some(flight) = self.in_flight.take() {
            tracing::info!(handle = %flight.handle, "cancelling evaluation on close");
            self.evaluator.cancel(flight.handle);
        }
        self.state = ShellState::Idle;
        self.rerun_pending = false;
        self.document.close();
        self.output = OutputSurface::default();
        self.margin = None;
        self.status.clear();
    }

    fn take_in_flight(&mut self, handle: EvaluationHandle) -> Option<InFlight> {
        match &self.in_flight {
            Some(flight) if flight.handle == handle => self.in_flight.take(),
            _ => None,
        }
    }

    fn auto_submit(&mut self) {
        match self.submit_for_evaluation() {
            Ok(_) | Err(ShellError::EmptyDocument) => {}
            Err(err) => tracing::debug!(error = %err, "auto-evaluation skipped"),
        }
    }
}
