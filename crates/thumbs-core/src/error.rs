//! Error types for the pipeline and its two stages.
//!
//! Only [`PipelineError`] escapes `Pipeline::run`. [`FetchError`] and
//! [`TransformError`] are recovered per item: logged, counted, and the worker
//! moves on.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors for one pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The locator list was empty or contained an empty locator.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Staging or output directory could not be created.
    #[error("failed to set up {}: {source}", .path.display())]
    ResourceSetup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread could not be started.
    #[error("failed to start worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The run did not finish before its deadline; workers were cancelled.
    #[error("pipeline did not finish within {0:?}")]
    DeadlineExceeded(std::time::Duration),

    /// The caller cancelled the run.
    #[error("pipeline cancelled")]
    Cancelled,
}

/// Retrieval failure for a single locator.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No filename could be derived from the locator.
    #[error("locator has no usable filename: {0}")]
    InvalidLocator(String),

    /// Another locator in this run already claimed the same staged filename.
    #[error("staged filename {0} is already taken in this run")]
    DuplicateName(String),

    /// Curl reported an error (DNS, connect, timeout, ...).
    #[error("transfer failed: {0}")]
    Curl(#[from] curl::Error),

    /// The server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),

    /// Writing the staged file failed.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),

    /// The transfer was aborted through the cancel token.
    #[error("cancelled")]
    Cancelled,
}

/// Failure while producing variants for one staged image.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("cannot decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("i/o on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
