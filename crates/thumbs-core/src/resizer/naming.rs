//! Variant naming and proportional sizing.

/// Splits a staged filename at its first `.` into stem and extension.
pub fn split_name(filename: &str) -> (&str, Option<&str>) {
    match filename.split_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (filename, None),
    }
}

/// Output name for one variant: `<stem>_<width>.<ext>`, or `<stem>_<width>` without an extension.
pub fn variant_name(filename: &str, width: u32) -> String {
    match split_name(filename) {
        (stem, Some(ext)) => format!("{}_{}.{}", stem, width, ext),
        (stem, None) => format!("{}_{}", stem, width),
    }
}

/// Height that keeps the aspect ratio at `target_width`, rounded, never below 1.
pub fn scaled_height(orig_width: u32, orig_height: u32, target_width: u32) -> u32 {
    if orig_width == 0 {
        return 1;
    }
    let h = (orig_height as f64 * target_width as f64 / orig_width as f64).round();
    (h as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_names() {
        assert_eq!(variant_name("a.jpg", 32), "a_32.jpg");
        assert_eq!(variant_name("b.png", 2000), "b_2000.png");
        assert_eq!(variant_name("archive.tar.png", 64), "archive_64.tar.png");
        assert_eq!(variant_name("noext", 64), "noext_64");
    }

    #[test]
    fn variant_of_longest_staged_name_fits_name_max() {
        let staged = crate::url_model::derive_filename(&format!("http://x/{}.png", "p".repeat(300)))
            .unwrap();
        assert!(variant_name(&staged, u32::MAX).len() <= 255);
    }

    #[test]
    fn split_at_first_dot() {
        assert_eq!(split_name("x.y.z"), ("x", Some("y.z")));
        assert_eq!(split_name("plain"), ("plain", None));
    }

    #[test]
    fn heights_keep_aspect_ratio() {
        assert_eq!(scaled_height(640, 480, 32), 24);
        assert_eq!(scaled_height(640, 480, 64), 48);
        assert_eq!(scaled_height(100, 50, 200), 100);
        // 33 * 64 / 100 = 21.12
        assert_eq!(scaled_height(100, 33, 64), 21);
        // 35 * 64 / 100 = 22.4 ; 37 * 64 / 100 = 23.68
        assert_eq!(scaled_height(100, 35, 64), 22);
        assert_eq!(scaled_height(100, 37, 64), 24);
    }

    #[test]
    fn height_never_zero() {
        assert_eq!(scaled_height(4000, 10, 32), 1);
        assert_eq!(scaled_height(0, 10, 32), 1);
    }
}
