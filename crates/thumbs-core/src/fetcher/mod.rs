//! Fetch stage leaf: retrieve one locator into the staging area.
//!
//! Bodies land in `<name>.part` first and are renamed into place only after a
//! complete, successful transfer, so a staged name never refers to a partial
//! file.

mod http;
mod staging;

pub use http::CurlFetcher;
pub use staging::{temp_path, StagingNames, TEMP_SUFFIX};

use crate::control::CancelToken;
use crate::error::FetchError;
use crate::url_model::derive_filename;
use std::path::Path;

/// Retrieves a remote resource into a local file.
///
/// Implementations write the body to `dest` and return the number of bytes
/// written. `dest` may be left partially written on error; the caller removes it.
pub trait Fetch: Send + Sync {
    fn fetch(&self, locator: &str, dest: &Path, cancel: &CancelToken) -> Result<u64, FetchError>;
}

/// A fully retrieved file in the staging area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedImage {
    /// Name inside the staging directory (last path segment of the locator).
    pub filename: String,
    /// Size on disk in bytes.
    pub bytes: u64,
}

/// Fetches `locator` into `staging_dir` under its derived filename.
///
/// The filename must not already be reserved in `names`; a locator whose name
/// was claimed earlier in the run fails with [`FetchError::DuplicateName`]
/// before anything is written.
pub fn stage_one<F: Fetch + ?Sized>(
    fetcher: &F,
    locator: &str,
    staging_dir: &Path,
    names: &StagingNames,
    cancel: &CancelToken,
) -> Result<StagedImage, FetchError> {
    let filename =
        derive_filename(locator).ok_or_else(|| FetchError::InvalidLocator(locator.to_string()))?;
    if !names.reserve(&filename) {
        return Err(FetchError::DuplicateName(filename));
    }
    let final_path = staging_dir.join(&filename);
    let part = temp_path(&final_path);

    if let Err(e) = fetcher.fetch(locator, &part, cancel) {
        staging::discard(&part);
        return Err(e);
    }
    let bytes = staging::promote(&part, &final_path)?;
    Ok(StagedImage { filename, bytes })
}
