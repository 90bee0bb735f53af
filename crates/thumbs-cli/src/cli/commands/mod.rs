//! CLI command handlers, one per file.

mod checksum;
mod config;
mod run;

pub use checksum::run_checksum;
pub use config::run_config;
pub use run::run_pipeline;

#[cfg(test)]
pub(crate) use run::{apply_overrides, collect_locators};
