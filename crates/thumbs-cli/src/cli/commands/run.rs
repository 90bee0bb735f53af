//! `thumbs run` – download images and write their resized variants.

use anyhow::{Context, Result};
use std::fs;
use thumbs_core::config::ThumbsConfig;
use thumbs_core::url_model::parse_locator_list;
use thumbs_core::{Pipeline, RunReport};

use crate::cli::RunArgs;

pub fn run_pipeline(mut cfg: ThumbsConfig, args: &RunArgs) -> Result<()> {
    apply_overrides(&mut cfg, args);
    cfg.validate().context("invalid settings")?;
    let locators = collect_locators(args)?;

    let home = match args.home.clone().or_else(|| cfg.home_dir.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir().context("current directory")?,
    };
    tracing::info!(home = %home.display(), locators = locators.len(), "starting run");

    let report = Pipeline::new(&home, cfg)
        .run(&locators)
        .context("pipeline run failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Command-line flags win over config.toml.
pub(crate) fn apply_overrides(cfg: &mut ThumbsConfig, args: &RunArgs) {
    if !args.widths.is_empty() {
        cfg.target_widths = args.widths.clone();
    }
    if let Some(n) = args.download_workers {
        cfg.download_workers = n;
    }
    if let Some(n) = args.resize_workers {
        cfg.resize_workers = Some(n);
    }
    if let Some(secs) = args.timeout {
        cfg.run_timeout_secs = Some(secs);
    }
}

/// Positional URLs first, then those from `--file`, in order.
pub(crate) fn collect_locators(args: &RunArgs) -> Result<Vec<String>> {
    let mut locators = args.urls.clone();
    if let Some(path) = &args.file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read URL list {}", path.display()))?;
        locators.extend(parse_locator_list(&text));
    }
    Ok(locators)
}

fn print_report(report: &RunReport) {
    println!(
        "Downloaded {} image(s), {} bytes ({} failed)",
        report.downloaded.files, report.downloaded.bytes, report.downloaded.failures
    );
    println!(
        "Resized {} variant(s), {} bytes ({} failed)",
        report.resized.files, report.resized.bytes, report.resized.failures
    );
    println!(
        "Finished in {:.2}s with {} download / {} resize workers",
        report.elapsed_secs, report.download_workers, report.resize_workers
    );
}
