//! Evaluation collaborator contract.
//!
//! The shell never evaluates anything itself. It hands a snapshot of the
//! document to an [`Evaluator`] and later receives exactly the callbacks
//! described by [`EvaluationEvent`]:
//!
//! ```text
//! evaluate(source) -> handle
//!   ... Completed { result }        (at most once per handle)
//! cancel(handle)
//!   ... CancellationAcknowledged    (at most once per handle)
//! ```
//!
//! A handle whose evaluation was interrupted before producing anything only
//! gets the acknowledgment. A handle whose evaluation finished despite a
//! cancel request gets both, result first.
//!
//! - [`worker`]: an [`Evaluator`] that runs an [`Engine`] on worker threads
//! - [`calc`]: a small integer calculator [`Engine`] used by the binary

pub mod calc;
pub mod worker;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub use calc::Calculator;
pub use worker::BackgroundEvaluator;

/// Range of characters in an evaluated snapshot.
///
/// Offsets count `char`s, not bytes. `start` is inclusive and `end` exclusive;
/// `start == end` marks a single position (e.g. the end of input).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Empty span at `offset`
    pub fn point(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Span covering both `self` and `other`
    pub fn to(self, other: SourceSpan) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Line (1-based) and column (0-based) of `start` within `text`.
    ///
    /// Offsets past the end clamp to the end of the text.
    pub fn position_in(&self, text: &str) -> (usize, usize) {
        let mut line = 1;
        let mut column = 0;
        for ch in text.chars().take(self.start) {
            if ch == '\n' {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }
        }
        (line, column)
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Outcome of one evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationResult {
    Success {
        rendered_output: String,
    },
    Failure {
        error_message: String,
        source_range: Option<SourceSpan>,
    },
}

impl EvaluationResult {
    pub fn success(rendered_output: impl Into<String>) -> Self {
        EvaluationResult::Success {
            rendered_output: rendered_output.into(),
        }
    }

    pub fn failure(error_message: impl Into<String>, source_range: Option<SourceSpan>) -> Self {
        EvaluationResult::Failure {
            error_message: error_message.into(),
            source_range,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EvaluationResult::Success { .. })
    }
}

/// Identifies one `evaluate` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EvaluationHandle(pub u64);

impl fmt::Display for EvaluationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A callback from the collaborator, to be applied on the UI thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationEvent {
    pub handle: EvaluationHandle,
    pub kind: EvaluationEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationEventKind {
    Completed {
        result: EvaluationResult,
        elapsed: Duration,
    },
    CancellationAcknowledged,
}

/// The evaluation collaborator as seen by the shell.
///
/// Both calls must return immediately; work happens out-of-band and comes back
/// as [`EvaluationEvent`]s.
pub trait Evaluator {
    fn evaluate(&mut self, source: String) -> EvaluationHandle;

    /// Advisory: the evaluation may still complete normally.
    fn cancel(&mut self, handle: EvaluationHandle);
}

/// Cooperative cancellation flag shared between the UI and a worker
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// `Err(Interrupted)` once cancellation was requested, for use with `?`
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.is_cancelled() {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }
}

/// An engine stopped because its [`CancelToken`] fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evaluation interrupted")
    }
}

impl std::error::Error for Interrupted {}

/// Something that can turn source text into an [`EvaluationResult`].
///
/// Engines run on worker threads and should poll `cancel` at reasonable
/// intervals.
pub trait Engine: Send + Sync + 'static {
    fn run(&self, source: &str, cancel: &CancelToken) -> Result<EvaluationResult, Interrupted>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_in() {
        let text = "a = 1\nb = a +\n";
        assert_eq!(SourceSpan::point(0).position_in(text), (1, 0));
        assert_eq!(SourceSpan::point(4).position_in(text), (1, 4));
        assert_eq!(SourceSpan::point(6).position_in(text), (2, 0));
        assert_eq!(SourceSpan::point(13).position_in(text), (2, 7));
        // past the end clamps
        assert_eq!(SourceSpan::point(99).position_in(text), (3, 0));
    }

    #[test]
    fn test_span_normalizes_reversed_bounds() {
        let span = SourceSpan::new(5, 2);
        assert_eq!(span, SourceSpan::point(5));
        assert!(span.is_empty());
        assert_eq!(SourceSpan::new(1, 3).to(SourceSpan::new(6, 8)), SourceSpan::new(1, 8));
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(Interrupted));
    }
}
