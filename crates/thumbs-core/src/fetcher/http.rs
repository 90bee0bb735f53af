//! Single-stream HTTP GET into a staged file (curl easy handle).

use super::Fetch;
use crate::config::FetchConfig;
use crate::control::CancelToken;
use crate::error::FetchError;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

/// Production fetcher: one blocking curl transfer per call, run on the
/// calling fetch-worker thread.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    cfg: FetchConfig,
}

impl CurlFetcher {
    pub fn new(cfg: FetchConfig) -> Self {
        Self { cfg }
    }
}

impl Fetch for CurlFetcher {
    fn fetch(&self, locator: &str, dest: &Path, cancel: &CancelToken) -> Result<u64, FetchError> {
        let mut file = File::create(dest)?;
        let mut written = 0u64;
        let mut storage_error: Option<io::Error> = None;

        let mut easy = curl::easy::Easy::new();
        easy.url(locator)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(Duration::from_secs(self.cfg.connect_timeout_secs))?;
        // Abort if throughput stays under 1 KiB/s for low_speed_time.
        easy.low_speed_limit(1024)?;
        easy.low_speed_time(Duration::from_secs(self.cfg.low_speed_time_secs))?;
        easy.timeout(Duration::from_secs(self.cfg.timeout_secs))?;
        // Needed for the progress callback (cancellation) to fire.
        easy.progress(true)?;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match file.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    storage_error = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            transfer.progress_function(|_, _, _, _| !cancel.is_cancelled())?;
            transfer.perform()
        };

        if let Err(e) = performed {
            if e.is_aborted_by_callback() && cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }
            if e.is_write_error() {
                if let Some(io_err) = storage_error.take() {
                    return Err(FetchError::Storage(io_err));
                }
            }
            return Err(FetchError::Curl(e));
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }

        file.sync_all()?;
        Ok(written)
    }
}
