//! External collaborators: image transform and document assembly services.
//!
//! Both traits are **blocking**: implementations shell out to a tool or do
//! CPU work in-process, and the pipeline always calls them from
//! `tokio::task::spawn_blocking`. They must be `Send + Sync` because one
//! instance is shared by every page task.
//!
//! | Implementation | Trait | Backing |
//! |----------------|-------|---------|
//! | [`MagickTransformer`] | [`ImageTransformer`] | ImageMagick 7 `magick` |
//! | [`NativeTransformer`] | [`ImageTransformer`] | the `image` crate, in-process |
//! | [`Img2PdfAssembler`]  | [`DocumentAssembler`] | `img2pdf` |

mod img2pdf;
mod magick;
mod native;

pub use img2pdf::Img2PdfAssembler;
pub use magick::MagickTransformer;
pub use native::NativeTransformer;

use crate::error::BackendError;
use std::path::{Path, PathBuf};
use std::process::Output;

/// Resample one source image into a page artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// The result fits inside `width × height`, aspect ratio preserved.
    pub width: u32,
    pub height: u32,
    /// Resolution in DPI.
    pub density: u32,
    pub auto_orient: bool,
    pub strip_metadata: bool,
}

/// Composite a watermark onto an artifact, in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkRequest {
    pub page: PathBuf,
    pub watermark: PathBuf,
    /// Exact size the watermark is scaled to.
    pub width: u32,
    pub height: u32,
    /// Offset from the page's top-left corner.
    pub offset_x: u32,
    pub offset_y: u32,
    /// Resolution to keep if the page has to be re-encoded.
    pub density: u32,
}

/// Image transform service, invoked once per page per sub-step.
pub trait ImageTransformer: Send + Sync {
    fn normalize(&self, req: &NormalizeRequest) -> Result<(), BackendError>;

    fn watermark(&self, req: &WatermarkRequest) -> Result<(), BackendError>;

    /// Pixel size of an image on disk.
    ///
    /// Reads only the header via the `image` crate.
    fn dimensions(&self, path: &Path) -> Result<(u32, u32), BackendError> {
        Ok(image::image_dimensions(path)?)
    }
}

/// Document assembly service, invoked once per run.
pub trait DocumentAssembler: Send + Sync {
    /// Write one multi-page document at `destination`, one page per entry of
    /// `pages`, in the given order.
    fn assemble(&self, pages: &[PathBuf], destination: &Path) -> Result<(), BackendError>;
}

/// Watermark box for a normalized page: each side divided by `scale`,
/// rounded down, never below one pixel.
pub fn watermark_dimensions(page_width: u32, page_height: u32, scale: u32) -> (u32, u32) {
    let scale = scale.max(1);
    ((page_width / scale).max(1), (page_height / scale).max(1))
}

/// Map a finished child process to `Ok` or a [`BackendError::ToolFailed`]
/// carrying its combined output.
pub(crate) fn check_output(program: &str, output: Output) -> Result<(), BackendError> {
    if output.status.success() {
        return Ok(());
    }
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Err(BackendError::ToolFailed {
        program: program.to_string(),
        status: output.status.to_string(),
        output: text.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watermark_box_is_floor_of_quarter() {
        assert_eq!(watermark_dimensions(1500, 1000, 4), (375, 250));
        assert_eq!(watermark_dimensions(1061, 1499, 4), (265, 374));
    }

    #[test]
    fn watermark_box_scale_one_is_full_page() {
        assert_eq!(watermark_dimensions(800, 600, 1), (800, 600));
    }

    #[test]
    fn watermark_box_never_zero() {
        assert_eq!(watermark_dimensions(3, 2, 10), (1, 1));
        assert_eq!(watermark_dimensions(100, 100, 0), (100, 100));
    }
}
