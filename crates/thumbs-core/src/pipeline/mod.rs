//! Pipeline orchestrator: wires the fetch pool to the resize pool.
//!
//! The resize pool starts first and blocks on the completion queue, so
//! resizing of early downloads overlaps with the remaining fetches. Once every
//! locator has been acknowledged by the fetch pool, one `Stop` per resize
//! worker is enqueued behind the real work and the pool is awaited.

mod download;
mod item;
mod resize;

pub use download::DownloadCoordinator;
pub use item::CompletionItem;
pub use resize::{ResizeCoordinator, ResizePool};

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ThumbsConfig;
use crate::control::{CancelToken, Deadline};
use crate::counter::{StageTally, TallyCounter};
use crate::error::PipelineError;
use crate::fetcher::{CurlFetcher, Fetch};
use crate::queue::JoinQueue;
use crate::resizer::Resizer;

/// Staging directory name under the home directory.
pub const INCOMING_DIR: &str = "incoming";
/// Output directory name under the home directory.
pub const OUTGOING_DIR: &str = "outgoing";

/// Orchestrator phases, in order. Logged at each transition; never re-entered
/// within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    /// Fetch and resize pools both active.
    Downloading,
    /// Every locator acknowledged; resize workers finishing queued work.
    Draining,
    /// `Stop` items enqueued; waiting for resize workers to exit.
    Terminating,
    Done,
}

/// Aggregate statistics for one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub elapsed_secs: f64,
    pub locators: usize,
    pub download_workers: usize,
    pub resize_workers: usize,
    pub downloaded: StageTally,
    pub resized: StageTally,
}

/// Downloads a list of images and writes every configured width of each.
///
/// Holds only configuration; every `run` builds fresh queues, counters and
/// pools.
pub struct Pipeline<F: ?Sized = CurlFetcher> {
    home_dir: PathBuf,
    cfg: ThumbsConfig,
    fetcher: Arc<F>,
}

impl Pipeline<CurlFetcher> {
    /// Pipeline using curl for retrieval, with transfer limits from `cfg.fetch`.
    pub fn new(home_dir: impl Into<PathBuf>, cfg: ThumbsConfig) -> Self {
        let fetcher = CurlFetcher::new(cfg.fetch.clone());
        Self::with_fetcher(home_dir, cfg, fetcher)
    }
}

impl<F: Fetch + 'static> Pipeline<F> {
    pub fn with_fetcher(home_dir: impl Into<PathBuf>, cfg: ThumbsConfig, fetcher: F) -> Self {
        Self {
            home_dir: home_dir.into(),
            cfg,
            fetcher: Arc::new(fetcher),
        }
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.home_dir.join(INCOMING_DIR)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.home_dir.join(OUTGOING_DIR)
    }

    pub fn run(&self, locators: &[String]) -> Result<RunReport, PipelineError> {
        self.run_with_cancel(locators, &CancelToken::new())
    }

    /// Like [`run`](Self::run), but `cancel` can stop the run from another thread.
    pub fn run_with_cancel(
        &self,
        locators: &[String],
        cancel: &CancelToken,
    ) -> Result<RunReport, PipelineError> {
        let start = Instant::now();
        validate_locators(locators)?;
        self.cfg
            .validate()
            .map_err(|e| PipelineError::InvalidInput(e.to_string()))?;

        let staging_dir = self.staging_dir();
        let output_dir = self.output_dir();
        ensure_dir(&staging_dir)?;
        ensure_dir(&output_dir)?;

        let deadline = self
            .cfg
            .run_timeout_secs
            .map(|s| Deadline::after(Duration::from_secs(s)));
        let mut phase = RunPhase::Idle;
        tracing::info!(locators = locators.len(), ?phase, "START make thumbnails");

        let completion: Arc<JoinQueue<CompletionItem>> = Arc::new(JoinQueue::new());
        let downloaded = Arc::new(TallyCounter::new());
        let resized = Arc::new(TallyCounter::new());

        let resize = ResizeCoordinator::new(
            Resizer::new(&staging_dir, &output_dir, &self.cfg.target_widths),
            self.cfg.effective_resize_workers(),
            Arc::clone(&completion),
            Arc::clone(&resized),
            cancel.clone(),
        );
        let mut pool = resize.resize_all()?;
        let resize_workers = pool.workers();

        let download = DownloadCoordinator::new(
            Arc::clone(&self.fetcher),
            staging_dir,
            self.cfg.download_workers,
            Arc::clone(&completion),
            Arc::clone(&downloaded),
            cancel.clone(),
        );
        let download_workers = download.pool_size(locators.len());
        phase = advance(phase, RunPhase::Downloading);

        if let Err(e) = download.download_all(locators, deadline.as_ref()) {
            cancel.cancel();
            return Err(e);
        }
        phase = advance(phase, RunPhase::Draining);

        // Enqueued behind every Work item, so each worker finishes real work first.
        for _ in 0..resize_workers {
            completion.put(CompletionItem::Stop);
        }
        phase = advance(phase, RunPhase::Terminating);

        if let Err(e) = pool.wait(deadline.as_ref()) {
            cancel.cancel();
            return Err(e);
        }
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        advance(phase, RunPhase::Done);

        let report = RunReport {
            elapsed_secs: start.elapsed().as_secs_f64(),
            locators: locators.len(),
            download_workers,
            resize_workers,
            downloaded: downloaded.snapshot(),
            resized: resized.snapshot(),
        };
        tracing::info!(
            elapsed_secs = report.elapsed_secs,
            downloaded_files = report.downloaded.files,
            downloaded_bytes = report.downloaded.bytes,
            resized_files = report.resized.files,
            resized_bytes = report.resized.bytes,
            "FINISHED make thumbnails"
        );
        Ok(report)
    }
}

fn advance(from: RunPhase, to: RunPhase) -> RunPhase {
    tracing::debug!(?from, ?to, "pipeline phase");
    to
}

/// Rejects an empty list or an empty locator before any side effect.
pub(crate) fn validate_locators(locators: &[String]) -> Result<(), PipelineError> {
    if locators.is_empty() {
        return Err(PipelineError::InvalidInput("locator list is empty".into()));
    }
    if let Some(i) = locators.iter().position(|l| l.trim().is_empty()) {
        return Err(PipelineError::InvalidInput(format!("locator #{} is empty", i + 1)));
    }
    Ok(())
}

pub(crate) fn ensure_dir(path: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(path).map_err(|source| PipelineError::ResourceSetup {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_list_and_blank_locators() {
        assert!(matches!(
            validate_locators(&[]),
            Err(PipelineError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_locators(&["http://x/a.jpg".into(), "  ".into()]),
            Err(PipelineError::InvalidInput(msg)) if msg.contains("#2")
        ));
        assert!(validate_locators(&["http://x/a.jpg".into()]).is_ok());
    }

    #[test]
    fn report_serializes_with_stage_totals() {
        let report = RunReport {
            elapsed_secs: 1.5,
            locators: 3,
            download_workers: 3,
            resize_workers: 2,
            downloaded: StageTally {
                files: 2,
                bytes: 2048,
                failures: 1,
            },
            resized: StageTally {
                files: 4,
                bytes: 900,
                failures: 0,
            },
        };
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["locators"], 3);
        assert_eq!(v["resize_workers"], 2);
        assert_eq!(v["downloaded"]["bytes"], 2048);
        assert_eq!(v["downloaded"]["failures"], 1);
        assert_eq!(v["resized"]["files"], 4);
        assert_eq!(v["elapsed_secs"], 1.5);
    }

    #[test]
    fn invalid_config_is_rejected_before_setup() {
        let root = tempfile::tempdir().unwrap();
        let mut cfg = ThumbsConfig::default();
        cfg.target_widths.clear();
        let err = Pipeline::new(root.path(), cfg)
            .run(&["http://x/a.jpg".into()])
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert!(!root.path().join(INCOMING_DIR).exists());
    }

    #[test]
    fn ensure_dir_reports_path_on_failure() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let err = ensure_dir(&blocker.join("incoming")).unwrap_err();
        assert!(matches!(err, PipelineError::ResourceSetup { ref path, .. } if path.ends_with("incoming")));
    }
}
