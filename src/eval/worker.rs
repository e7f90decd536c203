//! Background evaluation on worker threads.
//!
//! Every `evaluate` call gets its own named thread, a [`CancelToken`] and a
//! fresh [`EvaluationHandle`]. Outcomes are posted to a crossbeam channel; the
//! UI thread drains it and feeds the events to the shell, so the shell is only
//! ever touched from one thread.

use super::{
    CancelToken, Engine, EvaluationEvent, EvaluationEventKind, EvaluationHandle,
    EvaluationResult, Evaluator, Interrupted,
};
use crossbeam::channel::{self, Receiver, Sender};
use rustc_hash::FxHashMap;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Engines recurse over the source's syntax tree; leave them room for it.
const WORKER_STACK_SIZE: usize = 32 * 1024 * 1024;

struct Job {
    cancel: CancelToken,
    thread: JoinHandle<()>,
}

/// [`Evaluator`] running an [`Engine`] out-of-band
pub struct BackgroundEvaluator<E: Engine> {
    engine: Arc<E>,
    events: Sender<EvaluationEvent>,
    next_handle: u64,
    jobs: FxHashMap<EvaluationHandle, Job>,
}

impl<E: Engine> BackgroundEvaluator<E> {
    /// Create an evaluator and the receiving end of its event channel
    pub fn new(engine: E) -> (Self, Receiver<EvaluationEvent>) {
        let (tx, rx) = channel::unbounded();
        (Self::with_sender(engine, tx), rx)
    }

    /// Create an evaluator posting to an existing channel
    pub fn with_sender(engine: E, events: Sender<EvaluationEvent>) -> Self {
        BackgroundEvaluator {
            engine: Arc::new(engine),
            events,
            next_handle: 0,
            jobs: FxHashMap::default(),
        }
    }

    /// Number of evaluations whose worker has not exited yet
    pub fn in_flight(&mut self) -> usize {
        self.reap();
        self.jobs.len()
    }

    /// Drop bookkeeping for workers that already exited
    fn reap(&mut self) {
        self.jobs.retain(|_, job| !job.thread.is_finished());
    }
}

impl<E: Engine> Evaluator for BackgroundEvaluator<E> {
    fn evaluate(&mut self, source: String) -> EvaluationHandle {
        self.reap();

        self.next_handle += 1;
        let handle = EvaluationHandle(self.next_handle);
        let cancel = CancelToken::new();

        let engine = Arc::clone(&self.engine);
        let events = self.events.clone();
        let token = cancel.clone();

        tracing::debug!(%handle, chars = source.chars().count(), "dispatching evaluation");

        let spawned = thread::Builder::new()
            .name(format!("evalpad-eval-{}", handle.0))
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || run_job(engine.as_ref(), handle, &source, &token, &events));

        match spawned {
            Ok(thread) => {
                self.jobs.insert(handle, Job { cancel, thread });
            }
            Err(err) => {
                tracing::error!(%handle, error = %err, "failed to spawn evaluation worker");
                let result = EvaluationResult::failure(
                    format!("failed to start evaluation worker: {}", err),
                    None,
                );
                post(
                    &self.events,
                    handle,
                    EvaluationEventKind::Completed {
                        result,
                        elapsed: Default::default(),
                    },
                );
            }
        }

        handle
    }

    fn cancel(&mut self, handle: EvaluationHandle) {
        match self.jobs.get(&handle) {
            Some(job) => {
                tracing::debug!(%handle, "cancelling evaluation");
                job.cancel.cancel();
            }
            // Worker already gone; its outcome is in the channel.
            None => tracing::debug!(%handle, "cancel for unknown or finished evaluation"),
        }
    }
}

impl<E: Engine> Drop for BackgroundEvaluator<E> {
    fn drop(&mut self) {
        for job in self.jobs.values() {
            job.cancel.cancel();
        }
    }
}

fn run_job<E: Engine>(
    engine: &E,
    handle: EvaluationHandle,
    source: &str,
    cancel: &CancelToken,
    events: &Sender<EvaluationEvent>,
) {
    if cancel.is_cancelled() {
        post(events, handle, EvaluationEventKind::CancellationAcknowledged);
        return;
    }

    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| engine.run(source, cancel)));
    let elapsed = started.elapsed();

    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(Interrupted)) => {
            tracing::debug!(%handle, ?elapsed, "evaluation interrupted");
            post(events, handle, EvaluationEventKind::CancellationAcknowledged);
            return;
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(%handle, %message, "evaluation engine panicked");
            EvaluationResult::failure(format!("evaluation panicked: {}", message), None)
        }
    };

    tracing::debug!(%handle, ?elapsed, success = result.is_success(), "evaluation finished");
    post(events, handle, EvaluationEventKind::Completed { result, elapsed });

    // Cancel arrived too late to stop the engine; acknowledge it anyway.
    if cancel.is_cancelled() {
        post(events, handle, EvaluationEventKind::CancellationAcknowledged);
    }
}

fn post(events: &Sender<EvaluationEvent>, handle: EvaluationHandle, kind: EvaluationEventKind) {
    if events.send(EvaluationEvent { handle, kind }).is_err() {
        tracing::debug!(%handle, "event receiver dropped");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
