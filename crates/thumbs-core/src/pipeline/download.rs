//! Fetch pool: N threads claim locators from an intake queue until it is empty.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crate::control::{CancelToken, Deadline};
use crate::counter::{StageTally, TallyCounter};
use crate::error::PipelineError;
use crate::fetcher::{stage_one, Fetch, StagingNames};
use crate::queue::JoinQueue;

use super::item::CompletionItem;
use super::{ensure_dir, validate_locators};

pub struct DownloadCoordinator<F: ?Sized> {
    fetcher: Arc<F>,
    staging_dir: PathBuf,
    workers: usize,
    completion: Arc<JoinQueue<CompletionItem>>,
    counter: Arc<TallyCounter>,
    cancel: CancelToken,
}

impl<F: Fetch + ?Sized + 'static> DownloadCoordinator<F> {
    pub fn new(
        fetcher: Arc<F>,
        staging_dir: PathBuf,
        workers: usize,
        completion: Arc<JoinQueue<CompletionItem>>,
        counter: Arc<TallyCounter>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            fetcher,
            staging_dir,
            workers: workers.max(1),
            completion,
            counter,
            cancel,
        }
    }

    /// Threads actually started for `locator_count` locators.
    pub fn pool_size(&self, locator_count: usize) -> usize {
        self.workers.min(locator_count).max(1)
    }

    /// Fetches every locator, pushing a `Work` item onto the completion queue
    /// for each staged file, and returns once every locator has been claimed
    /// and acknowledged.
    ///
    /// Individual retrieval failures are logged and counted, never fatal.
    pub fn download_all(
        &self,
        locators: &[String],
        deadline: Option<&Deadline>,
    ) -> Result<StageTally, PipelineError> {
        validate_locators(locators)?;
        ensure_dir(&self.staging_dir)?;

        let intake: Arc<JoinQueue<String>> = Arc::new(JoinQueue::new());
        for locator in locators {
            intake.put(locator.clone());
        }

        let names = Arc::new(StagingNames::new());

        let num_workers = self.pool_size(locators.len());
        tracing::info!(
            locators = locators.len(),
            workers = num_workers,
            "beginning image downloads"
        );

        let mut handles = Vec::with_capacity(num_workers);
        for i in 0..num_workers {
            let intake = Arc::clone(&intake);
            let names = Arc::clone(&names);
            let fetcher = Arc::clone(&self.fetcher);
            let completion = Arc::clone(&self.completion);
            let counter = Arc::clone(&self.counter);
            let cancel = self.cancel.clone();
            let staging_dir = self.staging_dir.clone();
            let spawned = thread::Builder::new()
                .name(format!("fetch-{}", i))
                .spawn(move || {
                    let stage = StageTarget {
                        dir: &staging_dir,
                        names: &names,
                    };
                    fetch_worker(&*fetcher, &intake, &stage, &completion, &counter, &cancel)
                });
            match spawned {
                Ok(h) => handles.push(h),
                Err(e) => {
                    // Items stay queued; the workers already running will drain them.
                    if handles.is_empty() {
                        self.cancel.cancel();
                        return Err(PipelineError::Spawn(e));
                    }
                    tracing::warn!("started only {} fetch workers: {}", handles.len(), e);
                    break;
                }
            }
        }

        match deadline {
            Some(d) => {
                if !intake.join_timeout(d.remaining()) {
                    self.cancel.cancel();
                    return Err(PipelineError::DeadlineExceeded(d.budget()));
                }
            }
            None => intake.join(),
        }

        for h in handles {
            if h.join().is_err() {
                tracing::error!("fetch worker panicked");
            }
        }

        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let tally = self.counter.snapshot();
        tracing::info!(
            files = tally.files,
            bytes = tally.bytes,
            failures = tally.failures,
            "downloads finished"
        );
        Ok(tally)
    }
}

/// Where a fetch worker stages files, and the names already claimed this run.
struct StageTarget<'a> {
    dir: &'a std::path::Path,
    names: &'a StagingNames,
}

/// Claims locators until the intake queue is empty. Each claim is acknowledged
/// when its guard drops, after the staged file is on the completion queue.
fn fetch_worker<F: Fetch + ?Sized>(
    fetcher: &F,
    intake: &JoinQueue<String>,
    stage: &StageTarget<'_>,
    completion: &JoinQueue<CompletionItem>,
    counter: &TallyCounter,
    cancel: &CancelToken,
) {
    while let Some(locator) = intake.try_claim() {
        if cancel.is_cancelled() {
            // Acknowledge without fetching so join() still returns.
            continue;
        }
        let url: &str = &locator;
        tracing::debug!("downloading {}", url);
        match stage_one(fetcher, url, stage.dir, stage.names, cancel) {
            Ok(staged) => {
                counter.record_file(staged.bytes);
                tracing::info!(file = %staged.filename, bytes = staged.bytes, "downloaded");
                completion.put(CompletionItem::Work(staged));
            }
            Err(e) => {
                counter.record_failure();
                tracing::warn!(locator = %url, "download failed: {}", e);
            }
        }
        locator.done();
    }
    tracing::debug!("intake queue empty, fetch worker exiting");
}
