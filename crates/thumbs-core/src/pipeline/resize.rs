//! Resize pool: one thread per core pulls staged files off the completion
//! queue until it receives a `Stop`.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::control::{CancelToken, Deadline};
use crate::counter::TallyCounter;
use crate::error::PipelineError;
use crate::queue::JoinQueue;
use crate::resizer::Resizer;

use super::ensure_dir;
use super::item::CompletionItem;

/// How often a waiting resize worker re-checks the cancel token.
const CANCEL_POLL: Duration = Duration::from_millis(50);

pub struct ResizeCoordinator {
    resizer: Resizer,
    workers: usize,
    completion: Arc<JoinQueue<CompletionItem>>,
    counter: Arc<TallyCounter>,
    cancel: CancelToken,
}

impl ResizeCoordinator {
    pub fn new(
        resizer: Resizer,
        workers: usize,
        completion: Arc<JoinQueue<CompletionItem>>,
        counter: Arc<TallyCounter>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            resizer,
            workers: workers.max(1),
            completion,
            counter,
            cancel,
        }
    }

    /// Creates the output directory and starts the worker pool. Workers block
    /// on the completion queue, so this returns immediately.
    pub fn resize_all(&self) -> Result<ResizePool, PipelineError> {
        ensure_dir(self.resizer.output_dir())?;
        tracing::info!(
            workers = self.workers,
            widths = ?self.resizer.widths(),
            "beginning image resizing"
        );

        let (exit_tx, exit_rx) = mpsc::channel();
        let mut handles = Vec::with_capacity(self.workers);
        for i in 0..self.workers {
            let resizer = self.resizer.clone();
            let completion = Arc::clone(&self.completion);
            let counter = Arc::clone(&self.counter);
            let cancel = self.cancel.clone();
            let spawned = thread::Builder::new()
                .name(format!("resize-{}", i))
                .spawn(signalling_exit(exit_tx.clone(), move || {
                    resize_worker(&resizer, &completion, &counter, &cancel);
                }));
            match spawned {
                Ok(h) => handles.push(h),
                Err(e) => {
                    if handles.is_empty() {
                        return Err(PipelineError::Spawn(e));
                    }
                    tracing::warn!("started only {} resize workers: {}", handles.len(), e);
                    break;
                }
            }
        }

        Ok(ResizePool {
            handles,
            exits: exit_rx,
            exited: 0,
        })
    }
}

/// Handle to a running resize pool.
pub struct ResizePool {
    handles: Vec<JoinHandle<()>>,
    exits: mpsc::Receiver<()>,
    exited: usize,
}

impl ResizePool {
    /// Workers started; the orchestrator sends exactly this many `Stop` items.
    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    /// Waits for every started worker to exit. With a deadline, gives up with
    /// `DeadlineExceeded` when it passes; a later call resumes waiting.
    pub fn wait(&mut self, deadline: Option<&Deadline>) -> Result<(), PipelineError> {
        while self.exited < self.handles.len() {
            let received = match deadline {
                Some(d) => match self.exits.recv_timeout(d.remaining()) {
                    Ok(()) => true,
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        return Err(PipelineError::DeadlineExceeded(d.budget()));
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => false,
                },
                None => self.exits.recv().is_ok(),
            };
            if !received {
                break;
            }
            self.exited += 1;
        }

        for h in self.handles.drain(..) {
            if h.join().is_err() {
                tracing::error!("resize worker panicked");
            }
        }
        self.exited = 0;
        Ok(())
    }
}

/// Sends on drop, so the pool learns about an exit even if the worker panics.
struct ExitSignal(mpsc::Sender<()>);

impl Drop for ExitSignal {
    fn drop(&mut self) {
        let _ = self.0.send(());
    }
}

/// Wraps a worker body so exactly one exit is reported once it has run.
/// A body that never starts (failed spawn) reports nothing.
fn signalling_exit<W>(exit_tx: mpsc::Sender<()>, work: W) -> impl FnOnce() + Send + 'static
where
    W: FnOnce() + Send + 'static,
{
    move || {
        let _exit = ExitSignal(exit_tx);
        work();
    }
}

fn resize_worker(
    resizer: &Resizer,
    completion: &JoinQueue<CompletionItem>,
    counter: &TallyCounter,
    cancel: &CancelToken,
) {
    loop {
        if cancel.is_cancelled() {
            tracing::debug!("resize worker cancelled");
            return;
        }
        let Some(item) = completion.claim_timeout(CANCEL_POLL) else {
            continue;
        };
        let staged = match &*item {
            CompletionItem::Stop => {
                tracing::debug!("stop received, resize worker exiting");
                return;
            }
            CompletionItem::Work(staged) => staged,
        };

        tracing::info!(file = %staged.filename, "resizing image");
        let result = resizer.process(&staged.filename, |variant| {
            counter.record_file(variant.bytes);
            tracing::debug!(
                file = %variant.path.display(),
                width = variant.width,
                height = variant.height,
                bytes = variant.bytes,
                "variant written"
            );
        });
        match result {
            Ok(n) => tracing::info!(file = %staged.filename, variants = n, "done resizing image"),
            Err(e) => {
                counter.record_failure();
                tracing::warn!(file = %staged.filename, "resize failed, skipping remaining widths: {}", e);
            }
        }
    }
}
