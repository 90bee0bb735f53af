//! Resize stage leaf: turn one staged image into every target-width variant.

mod naming;

pub use naming::{scaled_height, split_name, variant_name};

use crate::error::TransformError;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One written variant. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizedVariant {
    /// Stem of the original filename (before the first `.`).
    pub stem: String,
    pub width: u32,
    pub height: u32,
    /// Size of the written file in bytes.
    pub bytes: u64,
    pub path: PathBuf,
}

/// Produces the configured variants for staged images. Cheap to clone; the
/// width list is shared by every worker.
#[derive(Debug, Clone)]
pub struct Resizer {
    input_dir: PathBuf,
    output_dir: PathBuf,
    widths: Arc<[u32]>,
}

impl Resizer {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, widths: &[u32]) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            widths: Arc::from(widths),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn widths(&self) -> &[u32] {
        &self.widths
    }

    /// Writes every variant of `filename`, calling `on_variant` after each one
    /// is on disk, then deletes the staged source.
    ///
    /// On the first failure the remaining widths are skipped; the source is
    /// still deleted and the error returned. Variants already written stay.
    pub fn process<V>(&self, filename: &str, mut on_variant: V) -> Result<usize, TransformError>
    where
        V: FnMut(&ResizedVariant),
    {
        let source = self.input_dir.join(filename);
        let result = self.write_variants(&source, filename, &mut on_variant);
        if let Err(e) = fs::remove_file(&source) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!("could not remove staged {}: {}", source.display(), e);
            }
        }
        result
    }

    fn write_variants(
        &self,
        source: &Path,
        filename: &str,
        on_variant: &mut dyn FnMut(&ResizedVariant),
    ) -> Result<usize, TransformError> {
        let reader = ImageReader::open(source)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| TransformError::Io {
                path: source.to_path_buf(),
                source: e,
            })?;
        let format = reader.format();
        let original = reader.decode().map_err(|e| TransformError::Decode {
            path: source.to_path_buf(),
            source: e,
        })?;
        // decode() only succeeds with a known format.
        let format = format.unwrap_or(ImageFormat::Png);
        let (orig_w, orig_h) = (original.width(), original.height());
        let (stem, _) = split_name(filename);

        let mut written = 0;
        for &width in self.widths.iter() {
            let height = scaled_height(orig_w, orig_h, width);
            let resized = original.resize_exact(width, height, FilterType::Lanczos3);
            let dest = self.output_dir.join(variant_name(filename, width));
            save(resized, &dest, format)?;
            let bytes = fs::metadata(&dest)
                .map_err(|e| TransformError::Io {
                    path: dest.clone(),
                    source: e,
                })?
                .len();
            on_variant(&ResizedVariant {
                stem: stem.to_string(),
                width,
                height,
                bytes,
                path: dest,
            });
            written += 1;
        }
        Ok(written)
    }
}

fn save(img: DynamicImage, dest: &Path, format: ImageFormat) -> Result<(), TransformError> {
    // The JPEG encoder has no alpha channel.
    let img = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => img,
    };
    img.save_with_format(dest, format)
        .map_err(|e| TransformError::Encode {
            path: dest.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(path: &Path, w: u32, h: u32) {
        let img = RgbImage::from_fn(w, h, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
        img.save_with_format(path, ImageFormat::Png).unwrap();
    }

    fn dirs() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("incoming");
        let output = root.path().join("outgoing");
        fs::create_dir_all(&input).unwrap();
        fs::create_dir_all(&output).unwrap();
        (root, input, output)
    }

    #[test]
    fn writes_every_width_and_removes_source() {
        let (_root, input, output) = dirs();
        write_png(&input.join("cat.png"), 120, 90);
        let resizer = Resizer::new(&input, &output, &[32, 64]);

        let mut seen = Vec::new();
        let n = resizer.process("cat.png", |v| seen.push(v.clone())).unwrap();

        assert_eq!(n, 2);
        assert!(!input.join("cat.png").exists());
        assert_eq!(seen[0].width, 32);
        assert_eq!(seen[0].height, 24);
        assert_eq!(seen[1].height, 48);
        assert_eq!(seen[0].stem, "cat");
        for v in &seen {
            let img = image::open(&v.path).unwrap();
            assert_eq!((img.width(), img.height()), (v.width, v.height));
            assert_eq!(fs::metadata(&v.path).unwrap().len(), v.bytes);
        }
        assert!(output.join("cat_32.png").exists());
        assert!(output.join("cat_64.png").exists());
    }

    #[test]
    fn keeps_source_format_for_jpeg() {
        let (_root, input, output) = dirs();
        let img = RgbImage::from_pixel(50, 100, Rgb([200, 10, 10]));
        img.save_with_format(input.join("red.jpg"), ImageFormat::Jpeg).unwrap();
        let resizer = Resizer::new(&input, &output, &[25]);
        resizer.process("red.jpg", |_| {}).unwrap();
        let bytes = fs::read(output.join("red_25.jpg")).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let out = image::load_from_memory(&bytes).unwrap();
        assert_eq!((out.width(), out.height()), (25, 50));
    }

    #[test]
    fn corrupt_source_is_reported_and_removed() {
        let (_root, input, output) = dirs();
        fs::write(input.join("broken.png"), b"definitely not a png").unwrap();
        let resizer = Resizer::new(&input, &output, &[32, 64]);
        let mut calls = 0;
        let err = resizer.process("broken.png", |_| calls += 1).unwrap_err();
        assert!(matches!(
            err,
            TransformError::Decode { .. } | TransformError::Io { .. }
        ));
        assert_eq!(calls, 0);
        assert!(!input.join("broken.png").exists());
        assert_eq!(fs::read_dir(&output).unwrap().count(), 0);
    }

    #[test]
    fn missing_source_is_an_io_error() {
        let (_root, input, output) = dirs();
        let resizer = Resizer::new(&input, &output, &[32]);
        let err = resizer.process("ghost.png", |_| {}).unwrap_err();
        assert!(matches!(err, TransformError::Io { .. }));
    }
}
