//! `thumbs config` – show where the config lives and what it resolves to.

use anyhow::Result;
use thumbs_core::config;

pub fn run_config() -> Result<()> {
    let path = config::config_path()?;
    let cfg = config::load_or_init()?;
    println!("# {}", path.display());
    println!("# resize workers in effect: {}", cfg.effective_resize_workers());
    print!("{}", cfg.to_toml()?);
    Ok(())
}
