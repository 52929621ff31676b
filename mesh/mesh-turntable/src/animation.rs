//! Animated export of rendered frames.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use image::buffer::ConvertBuffer;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbImage, RgbaImage};
use tracing::info;

use crate::error::{RenderError, RenderResult};

/// Animation container formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AnimationFormat {
    /// Looping GIF.
    #[default]
    Gif,
    /// MP4 video. Recognised, but there is no encoder for it.
    Mp4,
}

impl AnimationFormat {
    /// File extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Mp4 => "mp4",
        }
    }

    /// Fails for formats that cannot be written.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnsupportedFormat`] for [`AnimationFormat::Mp4`].
    pub fn ensure_supported(self) -> RenderResult<()> {
        match self {
            Self::Gif => Ok(()),
            Self::Mp4 => Err(RenderError::UnsupportedFormat {
                format: self.extension().to_string(),
            }),
        }
    }
}

impl fmt::Display for AnimationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AnimationFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gif" => Ok(Self::Gif),
            "mp4" => Ok(Self::Mp4),
            _ => Err(RenderError::UnknownFormat { token: s.to_string() }),
        }
    }
}

/// Per-frame delay for a duration in seconds, rounded to milliseconds.
///
/// # Errors
///
/// Returns [`RenderError::InvalidParameter`] unless the duration is a
/// positive finite number.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn frame_delay(seconds: f64) -> RenderResult<Delay> {
    if !(seconds.is_finite() && seconds > 0.0) {
        return Err(RenderError::InvalidParameter(format!(
            "frame duration must be positive, got {seconds}"
        )));
    }
    let millis = (seconds * 1000.0).round().clamp(1.0, f64::from(u32::MAX)) as u32;
    Ok(Delay::from_numer_denom_ms(millis, 1))
}

/// Writes `frames`, in order, as an endlessly looping GIF.
///
/// # Errors
///
/// Returns [`RenderError::NoFrames`] for an empty sequence,
/// [`RenderError::InvalidParameter`] for a bad duration, or an encoding or
/// I/O error. Nothing is left at `path` on failure.
pub fn write_gif(frames: &[RgbImage], frame_duration: f64, path: &Path) -> RenderResult<()> {
    if frames.is_empty() {
        return Err(RenderError::NoFrames);
    }
    let delay = frame_delay(frame_duration)?;

    mesh_io::write_atomic(path, |w| -> RenderResult<()> {
        let mut encoder = GifEncoder::new(w);
        encoder.set_repeat(Repeat::Infinite)?;
        for frame in frames {
            let rgba: RgbaImage = frame.convert();
            encoder.encode_frame(Frame::from_parts(rgba, 0, 0, delay))?;
        }
        Ok(())
    })?;

    info!(path = %path.display(), frames = frames.len(), "animation saved");
    Ok(())
}
