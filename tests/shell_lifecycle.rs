// Lifecycle tests for the editor shell, driven by a scripted evaluator

use evalpad::document::Document;
use evalpad::error::ShellError;
use evalpad::eval::{
    EvaluationEvent, EvaluationEventKind, EvaluationHandle, EvaluationResult, Evaluator,
    SourceSpan,
};
use evalpad::shell::{Delivery, EditorShell, ShellOptions, ShellState};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

/// Records every call; results are fed back by the test
#[derive(Default)]
struct ScriptedEvaluator {
    submitted: Vec<(EvaluationHandle, String)>,
    cancelled: Vec<EvaluationHandle>,
}

impl Evaluator for ScriptedEvaluator {
    fn evaluate(&mut self, source: String) -> EvaluationHandle {
        let handle = EvaluationHandle(self.submitted.len() as u64 + 1);
        self.submitted.push((handle, source));
        handle
    }

    fn cancel(&mut self, handle: EvaluationHandle) {
        self.cancelled.push(handle);
    }
}

fn shell_with(text: &str) -> EditorShell<ScriptedEvaluator> {
    EditorShell::new(
        Document::with_text(text),
        ScriptedEvaluator::default(),
        ShellOptions::default(),
    )
}

fn auto_shell(text: &str) -> EditorShell<ScriptedEvaluator> {
    EditorShell::new(
        Document::with_text(text),
        ScriptedEvaluator::default(),
        ShellOptions {
            has_abort: true,
            auto_evaluate: true,
        },
    )
}

fn done() -> Duration {
    Duration::from_millis(3)
}

#[test]
fn test_success_updates_output_and_returns_to_idle() {
    let mut shell = shell_with("1+1");

    let handle = shell.submit_for_evaluation().expect("submit");
    assert_eq!(shell.state(), ShellState::Evaluating);
    assert!(!shell.controls().evaluate_enabled);
    assert_eq!(shell.controls().abort_enabled, Some(true));
    assert_eq!(shell.evaluator().submitted, vec![(handle, "1+1".to_string())]);

    let delivery = shell.on_evaluation_complete(handle, EvaluationResult::success("2"), done());

    assert_eq!(delivery, Delivery::Applied);
    assert_eq!(shell.output().text, "2");
    assert!(!shell.output().is_error);
    assert_eq!(shell.state(), ShellState::Idle);
    assert!(shell.controls().evaluate_enabled);
    assert_eq!(shell.controls().abort_enabled, Some(false));
    assert!(shell.status().starts_with("Evaluated in "));
}

#[test]
fn test_failure_marks_margin() {
    let mut shell = shell_with("1+");

    let handle = shell.submit_for_evaluation().expect("submit");
    shell.on_evaluation_complete(
        handle,
        EvaluationResult::failure("unexpected end of input", Some(SourceSpan::new(2, 2))),
        done(),
    );

    assert_eq!(shell.output().text, "unexpected end of input");
    assert!(shell.output().is_error);
    assert_eq!(shell.state(), ShellState::Idle);

    let mark = shell.margin_mark().expect("margin mark");
    assert_eq!(mark.span, SourceSpan::point(2));
    assert_eq!((mark.line, mark.column), (1, 2));
    assert_eq!(mark.message, "unexpected end of input");
}

#[test]
fn test_failure_without_range_leaves_margin_clear() {
    let mut shell = shell_with("boom");
    let handle = shell.submit_for_evaluation().expect("submit");
    shell.on_evaluation_complete(handle, EvaluationResult::failure("engine crashed", None), done());

    assert_eq!(shell.output().text, "engine crashed");
    assert!(shell.margin_mark().is_none());
    assert_eq!(shell.state(), ShellState::Idle);
}

#[test]
fn test_edits_during_evaluation_do_not_touch_snapshot() {
    let mut shell = shell_with("x = 1");
    let handle = shell.submit_for_evaluation().expect("submit");

    for text in ["x = 12", "x = 123", "y = 2"] {
        shell.on_document_changed(text);
        assert_eq!(shell.in_flight_snapshot(), Some("x = 1"));
    }

    assert_eq!(shell.document().text(), "y = 2");
    assert_eq!(shell.document().revision(), 3);
    assert_eq!(shell.state(), ShellState::Evaluating);
    assert_eq!(shell.evaluator().submitted, vec![(handle, "x = 1".to_string())]);
}

#[test]
fn test_double_submit_dispatches_once() {
    let mut shell = shell_with("1");
    shell.submit_for_evaluation().expect("first submit");

    let second = shell.submit_for_evaluation();

    assert_eq!(
        second,
        Err(ShellError::NotIdle {
            state: ShellState::Evaluating
        })
    );
    assert_eq!(shell.evaluator().submitted.len(), 1);
}

#[test]
fn test_empty_document_is_rejected() {
    let mut shell = shell_with("   \n");
    assert_eq!(shell.submit_for_evaluation(), Err(ShellError::EmptyDocument));
    assert_eq!(shell.state(), ShellState::Idle);
    assert!(shell.evaluator().submitted.is_empty());
}

#[test]
fn test_abort_outside_evaluating_is_rejected() {
    let mut shell = shell_with("1");
    assert_eq!(
        shell.request_abort(),
        Err(ShellError::NotEvaluating {
            state: ShellState::Idle
        })
    );

    shell.submit_for_evaluation().expect("submit");
    shell.request_abort().expect("abort");
    assert_eq!(
        shell.request_abort(),
        Err(ShellError::NotEvaluating {
            state: ShellState::Aborting
        })
    );
    assert_eq!(shell.evaluator().cancelled.len(), 1);
}

#[test]
fn test_abort_then_acknowledgment() {
    let mut shell = shell_with("sleep(1000)");
    let handle = shell.submit_for_evaluation().expect("submit");

    shell.request_abort().expect("abort");
    assert_eq!(shell.state(), ShellState::Aborting);
    assert_eq!(shell.evaluator().cancelled, vec![handle]);
    assert!(!shell.controls().evaluate_enabled);
    assert_eq!(shell.controls().abort_enabled, Some(false));

    let delivery = shell.on_cancellation_acknowledged(handle);

    assert_eq!(delivery, Delivery::Applied);
    assert_eq!(shell.state(), ShellState::Idle);
    assert_eq!(shell.output().text, "");
    assert_eq!(shell.status(), "");
    assert!(shell.controls().evaluate_enabled);
}

#[test]
fn test_result_beats_acknowledgment() {
    let mut shell = shell_with("1+1");
    let handle = shell.submit_for_evaluation().expect("submit");
    shell.request_abort().expect("abort");

    let result = shell.handle_event(EvaluationEvent {
        handle,
        kind: EvaluationEventKind::Completed {
            result: EvaluationResult::success("2"),
            elapsed: done(),
        },
    });
    let ack = shell.handle_event(EvaluationEvent {
        handle,
        kind: EvaluationEventKind::CancellationAcknowledged,
    });

    assert_eq!(result, Delivery::Applied);
    assert_eq!(ack, Delivery::Ignored);
    assert_eq!(shell.output().text, "2");
    assert_eq!(shell.state(), ShellState::Idle);
}

#[test]
fn test_late_result_after_acknowledgment_is_ignored() {
    let mut shell = shell_with("1+1");
    let first = shell.submit_for_evaluation().expect("submit");
    shell.request_abort().expect("abort");
    shell.on_cancellation_acknowledged(first);

    let second = shell.submit_for_evaluation().expect("resubmit");
    let stale = shell.on_evaluation_complete(first, EvaluationResult::success("stale"), done());

    assert_eq!(stale, Delivery::Ignored);
    assert_eq!(shell.output().text, "");
    assert_eq!(shell.state(), ShellState::Evaluating);
    assert_eq!(shell.in_flight_handle(), Some(second));
}

#[test]
fn test_document_change_while_aborting_is_inconsequential() {
    let mut shell = shell_with("1");
    let handle = shell.submit_for_evaluation().expect("submit");
    shell.request_abort().expect("abort");

    shell.on_document_changed("2");

    assert_eq!(shell.state(), ShellState::Aborting);
    assert_eq!(shell.in_flight_snapshot(), Some("1"));
    shell.on_cancellation_acknowledged(handle);
    assert_eq!(shell.state(), ShellState::Idle);
    assert_eq!(shell.document().text(), "2");
}

#[test]
fn test_margin_is_computed_against_snapshot() {
    let mut shell = shell_with("a = 1\nb = a +");
    let handle = shell.submit_for_evaluation().expect("submit");

    // Inserting lines above must not shift the mark of the in-flight result
    shell.on_document_changed("# note\n# note\na = 1\nb = a +");
    shell.on_evaluation_complete(
        handle,
        EvaluationResult::failure("unexpected end of input", Some(SourceSpan::point(13))),
        done(),
    );

    let mark = shell.margin_mark().expect("margin mark");
    assert_eq!((mark.line, mark.column), (2, 7));
}

#[test]
fn test_new_submission_clears_margin() {
    let mut shell = shell_with("1+");
    let handle = shell.submit_for_evaluation().expect("submit");
    shell.on_evaluation_complete(
        handle,
        EvaluationResult::failure("unexpected end of input", Some(SourceSpan::point(2))),
        done(),
    );
    assert!(shell.margin_mark().is_some());

    shell.on_document_changed("1+1");
    shell.submit_for_evaluation().expect("resubmit");
    assert!(shell.margin_mark().is_none());
}

#[test]
fn test_auto_evaluate_reruns_latest_text_after_completion() {
    let mut shell = auto_shell("");

    shell.on_document_changed("1");
    assert_eq!(shell.state(), ShellState::Evaluating);
    let first = shell.in_flight_handle().expect("in flight");

    shell.on_document_changed("1+");
    shell.on_document_changed("1+1");
    assert_eq!(shell.evaluator().submitted.len(), 1);

    shell.on_evaluation_complete(first, EvaluationResult::success("1"), done());

    assert_eq!(shell.state(), ShellState::Evaluating);
    let submitted = &shell.evaluator().submitted;
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[1].1, "1+1");
}

#[test]
fn test_auto_evaluate_pending_rerun_dropped_on_abort() {
    let mut shell = auto_shell("");
    shell.on_document_changed("sleep(100)");
    let handle = shell.in_flight_handle().expect("in flight");

    shell.on_document_changed("sleep(200)");
    shell.request_abort().expect("abort");
    shell.on_cancellation_acknowledged(handle);

    assert_eq!(shell.state(), ShellState::Idle);
    assert_eq!(shell.evaluator().submitted.len(), 1);
}

#[test]
fn test_auto_evaluate_skips_blank_document() {
    let mut shell = auto_shell("1");
    shell.on_document_changed("  ");
    assert_eq!(shell.state(), ShellState::Idle);
    assert!(shell.evaluator().submitted.is_empty());
}

#[test]
fn test_close_cancels_in_flight() {
    let mut shell = shell_with("sleep(5000)");
    let handle = shell.submit_for_evaluation().expect("submit");

    shell.close();

    assert_eq!(shell.state(), ShellState::Idle);
    assert_eq!(shell.evaluator().cancelled, vec![handle]);
    assert_eq!(shell.document().text(), "");
    assert_eq!(
        shell.on_evaluation_complete(handle, EvaluationResult::success("5000"), done()),
        Delivery::Ignored
    );
    assert_eq!(shell.on_cancellation_acknowledged(handle), Delivery::Ignored);
}

#[test]
fn test_controls_hidden_abort() {
    let mut shell = EditorShell::new(
        Document::with_text("1"),
        ScriptedEvaluator::default(),
        ShellOptions {
            has_abort: false,
            auto_evaluate: false,
        },
    );
    shell.submit_for_evaluation().expect("submit");
    assert_eq!(shell.controls().abort_enabled, None);
    assert!(!shell.controls().evaluate_enabled);
}

#[test]
fn test_loading_a_file_keeps_revision_increasing() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("loaded.pad");
    fs::write(&path, "2 * 21").expect("write");

    let mut shell = shell_with("1");
    shell.on_document_changed("1+");
    shell.on_document_changed("1+1");
    let before = shell.document().revision();

    shell.replace_document(Document::open(&path).expect("open"));

    assert!(shell.document().revision() > before);
    assert_eq!(shell.document().text(), "2 * 21");
    assert_eq!(shell.document().name(), "loaded.pad");
    assert!(!shell.document().is_dirty());
    assert!(shell.evaluator().submitted.is_empty());
}

#[test]
fn test_loading_a_file_auto_evaluates() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("loaded.pad");
    fs::write(&path, "2 * 21").expect("write");

    let mut shell = auto_shell("");
    shell.on_document_changed("sleep(100)");
    let first = shell.in_flight_handle().expect("in flight");

    shell.replace_document(Document::open(&path).expect("open"));
    assert_eq!(shell.evaluator().submitted.len(), 1);

    shell.on_evaluation_complete(first, EvaluationResult::success("100"), done());
    let submitted = &shell.evaluator().submitted;
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[1].1, "2 * 21");
}

#[test]
fn test_initial_auto_evaluation() {
    let mut shell = auto_shell("6 * 7");
    shell.request_auto_evaluation();
    assert_eq!(shell.state(), ShellState::Evaluating);
    assert_eq!(shell.evaluator().submitted[0].1, "6 * 7");

    let mut manual = shell_with("6 * 7");
    manual.request_auto_evaluation();
    assert_eq!(manual.state(), ShellState::Idle);
    assert!(manual.evaluator().submitted.is_empty());

    let mut blank = auto_shell("");
    blank.request_auto_evaluation();
    assert_eq!(blank.state(), ShellState::Idle);
}
