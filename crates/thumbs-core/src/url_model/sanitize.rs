//! Linux-safe filename sanitization.

/// Linux NAME_MAX.
const NAME_MAX: usize = 255;

/// Longest staged name that still fits NAME_MAX after the `.part` suffix
/// or the longest `_<width>` variant suffix (`_4294967295`) is added.
pub const MAX_STAGED_NAME_LEN: usize = NAME_MAX - ".part".len() - "_4294967295".len();

/// Sanitizes a URL path segment for use as a staged filename on Linux.
///
/// - Replaces NUL, `/`, `\`, whitespace and control characters with `_`
/// - Trims leading/trailing spaces and dots (no hidden or relative names)
/// - Limits length to [`MAX_STAGED_NAME_LEN`] bytes, shortening the stem and
///   keeping the extension (everything after the first `.`)
pub fn sanitize_filename_for_linux(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c == '\0' || c == '/' || c == '\\' || c.is_control() || c.is_whitespace() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim_matches(|c| c == '.' || c == ' ');
    if trimmed.len() <= MAX_STAGED_NAME_LEN {
        return trimmed.to_string();
    }

    match trimmed.split_once('.') {
        // Keep the extension when it leaves room for a meaningful stem.
        Some((stem, ext)) if ext.len() + 1 < MAX_STAGED_NAME_LEN / 2 => {
            let stem = truncate_at_char_boundary(stem, MAX_STAGED_NAME_LEN - ext.len() - 1);
            format!("{}.{}", stem, ext)
        }
        _ => truncate_at_char_boundary(trimmed, MAX_STAGED_NAME_LEN).to_string(),
    }
}

fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut take = max;
    while take > 0 && !s.is_char_boundary(take) {
        take -= 1;
    }
    &s[..take]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_separators() {
        assert_eq!(sanitize_filename_for_linux("a/b\\c.png"), "a_b_c.png");
    }

    #[test]
    fn trims_leading_dots() {
        assert_eq!(sanitize_filename_for_linux("..hidden.jpg"), "hidden.jpg");
        assert_eq!(sanitize_filename_for_linux(".."), "");
    }

    #[test]
    fn keeps_underscores_in_stem() {
        assert_eq!(sanitize_filename_for_linux("my__photo.jpg"), "my__photo.jpg");
    }

    #[test]
    fn control_and_space() {
        assert_eq!(sanitize_filename_for_linux("cat\x00 pic.png"), "cat__pic.png");
    }

    #[test]
    fn long_name_keeps_extension_and_leaves_room_for_suffixes() {
        let long = "x".repeat(300) + ".png";
        let name = sanitize_filename_for_linux(&long);
        assert_eq!(name.len(), MAX_STAGED_NAME_LEN);
        assert!(name.ends_with(".png"));
        assert!(name.len() + ".part".len() <= 255);
        assert!(name.len() + "_4294967295".len() <= 255);
    }

    #[test]
    fn short_names_are_untouched() {
        let name = "p".repeat(200) + ".png";
        assert_eq!(sanitize_filename_for_linux(&name), name);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(200) + ".jpg";
        let name = sanitize_filename_for_linux(&long);
        assert!(name.len() <= MAX_STAGED_NAME_LEN);
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn oversized_extension_falls_back_to_plain_truncation() {
        let long = format!("a.{}", "e".repeat(300));
        assert_eq!(sanitize_filename_for_linux(&long).len(), MAX_STAGED_NAME_LEN);
    }
}
