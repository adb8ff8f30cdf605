//! In-process transforms on top of the `image` crate.
//!
//! Produces the same artifacts as the ImageMagick engine without any external
//! binary: EXIF orientation is applied on decode, re-encoding never copies
//! metadata, and JPEG output carries the requested DPI in its JFIF header.

use super::{ImageTransformer, NormalizeRequest, WatermarkRequest};
use crate::error::BackendError;
use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Pure-Rust image transform engine.
#[derive(Debug, Clone)]
pub struct NativeTransformer {
    filter: FilterType,
    jpeg_quality: u8,
}

impl Default for NativeTransformer {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
            jpeg_quality: 90,
        }
    }
}

impl NativeTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resampling filter for both page and watermark scaling.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// JPEG quality, clamped to 1–100. Default: 90.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    fn save(&self, img: &DynamicImage, dest: &Path, density: u32) -> Result<(), BackendError> {
        let format = ImageFormat::from_path(dest)?;
        match format {
            ImageFormat::Jpeg => {
                let file = BufWriter::new(File::create(dest)?);
                let mut encoder = JpegEncoder::new_with_quality(file, self.jpeg_quality);
                let dpi = u16::try_from(density).unwrap_or(u16::MAX);
                encoder.set_pixel_density(PixelDensity::dpi(dpi));
                encoder.encode_image(&img.to_rgb8())?;
            }
            other => img.save_with_format(dest, other)?,
        }
        Ok(())
    }
}

fn load(path: &Path, auto_orient: bool) -> Result<DynamicImage, BackendError> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = if auto_orient {
        Some(decoder.orientation()?)
    } else {
        None
    };
    let mut img = DynamicImage::from_decoder(decoder)?;
    if let Some(orientation) = orientation {
        img.apply_orientation(orientation);
    }
    Ok(img)
}

impl ImageTransformer for NativeTransformer {
    fn normalize(&self, req: &NormalizeRequest) -> Result<(), BackendError> {
        let img = load(&req.source, req.auto_orient)?;
        let resized = img.resize(req.width, req.height, self.filter);
        debug!(
            "{}: {}x{} → {}x{}",
            req.source.display(),
            img.width(),
            img.height(),
            resized.width(),
            resized.height()
        );
        self.save(&resized, &req.destination, req.density)
    }

    fn watermark(&self, req: &WatermarkRequest) -> Result<(), BackendError> {
        let page = load(&req.page, false)?;
        let mark = load(&req.watermark, true)?.resize_exact(req.width, req.height, self.filter);

        let mut canvas = page.to_rgba8();
        imageops::overlay(
            &mut canvas,
            &mark.to_rgba8(),
            i64::from(req.offset_x),
            i64::from(req.offset_y),
        );
        self.save(&DynamicImage::ImageRgba8(canvas), &req.page, req.density)
    }
}
