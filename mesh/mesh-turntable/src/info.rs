//! Metadata about exported artifacts.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use tracing::debug;

use crate::error::RenderResult;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Size, and for images dimensions and frame count, of an exported file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportInfo {
    /// Path as given.
    pub path: PathBuf,
    /// Final path component.
    pub file_name: String,
    /// Lower-case extension, empty if there is none.
    pub extension: String,
    /// Size on disk.
    pub size_bytes: u64,
    /// Size in mebibytes.
    pub size_mb: f64,
    /// Pixel dimensions, when the file is a readable image.
    pub dimensions: Option<(u32, u32)>,
    /// Frame count, for GIFs.
    pub frame_count: Option<usize>,
}

impl fmt::Display for ExportInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2} MB", self.file_name, self.size_mb)?;
        if let Some((w, h)) = self.dimensions {
            write!(f, ", {w}x{h}")?;
        }
        if let Some(n) = self.frame_count {
            write!(f, ", {n} frames")?;
        }
        write!(f, ")")
    }
}

/// Describes the file at `path`.
///
/// Only the size is required; dimensions and frame count are filled in when
/// the file decodes as an image.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be stat'ed.
#[allow(clippy::cast_precision_loss)]
pub fn export_info(path: &Path) -> RenderResult<ExportInfo> {
    let size_bytes = std::fs::metadata(path)?.len();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let dimensions = image::image_dimensions(path).ok();
    let frame_count = if extension == "gif" { gif_frame_count(path) } else { None };
    debug!(path = %path.display(), size_bytes, ?dimensions, ?frame_count, "inspected export");

    Ok(ExportInfo {
        path: path.to_path_buf(),
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        extension,
        size_bytes,
        size_mb: size_bytes as f64 / BYTES_PER_MB,
        dimensions,
        frame_count,
    })
}

fn gif_frame_count(path: &Path) -> Option<usize> {
    let decoder = GifDecoder::new(BufReader::new(File::open(path).ok()?)).ok()?;
    decoder.into_frames().try_fold(0, |n, frame| frame.ok().map(|_| n + 1))
}
