//! Locator modeling: staged filename derivation and locator list parsing.

mod path;
mod sanitize;

pub use path::filename_from_url_path;
pub use sanitize::sanitize_filename_for_linux;

/// Derives the staging filename for a locator from its last URL path segment.
///
/// Returns `None` when the URL has no usable segment; the caller treats that
/// as a retrieval failure for this locator only.
///
/// # Examples
///
/// - `derive_filename("http://x/a.jpg")` → `Some("a.jpg")`
/// - `derive_filename("https://example.com/")` → `None`
pub fn derive_filename(url: &str) -> Option<String> {
    let raw = filename_from_url_path(url)?;
    let sanitized = sanitize_filename_for_linux(&raw);
    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// Parses a locator list: one locator per line, surrounding whitespace trimmed,
/// blank lines and `#` comment lines skipped. Order is preserved.
pub fn parse_locator_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}
