pub mod config;
pub mod logging;

pub mod checksum;
pub mod control;
pub mod counter;
pub mod error;
pub mod fetcher;
pub mod pipeline;
pub mod queue;
pub mod resizer;
pub mod url_model;

pub use config::ThumbsConfig;
pub use control::CancelToken;
pub use error::{FetchError, PipelineError, TransformError};
pub use pipeline::{Pipeline, RunReport};
