//! Staged file lifecycle: write to `.part`, then rename into place.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Temporary file suffix used before the atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `a.jpg` → `a.jpg.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Staged filenames claimed during one download run.
///
/// A name is reserved before its fetch starts and stays reserved for the rest
/// of the run, so two locators never share a `.part` file or a staged file.
#[derive(Debug, Default)]
pub struct StagingNames {
    taken: Mutex<HashSet<String>>,
}

impl StagingNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if `name` is already reserved.
    pub fn reserve(&self, name: &str) -> bool {
        let mut taken = match self.taken.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        taken.insert(name.to_string())
    }
}

/// Rename a finished temp file to its final name and return its size.
pub(super) fn promote(part: &Path, final_path: &Path) -> io::Result<u64> {
    fs::rename(part, final_path)?;
    Ok(fs::metadata(final_path)?.len())
}

/// Best-effort removal of an abandoned temp file.
pub(super) fn discard(part: &Path) {
    if let Err(e) = fs::remove_file(part) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!("could not remove {}: {}", part.display(), e);
        }
    }
}
