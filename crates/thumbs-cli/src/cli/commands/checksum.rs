//! `thumbs checksum <dir>` – digest produced variants.

use anyhow::Result;
use std::path::Path;
use thumbs_core::checksum;

/// Print SHA-256 of every file in `dir`, sorted by name.
pub fn run_checksum(dir: &Path) -> Result<()> {
    for (name, digest) in checksum::digest_dir(dir)? {
        println!("{}  {}", digest, name);
    }
    Ok(())
}
