//! ImageMagick-backed transforms.

use super::{check_output, ImageTransformer, NormalizeRequest, WatermarkRequest};
use crate::error::BackendError;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Runs ImageMagick 7 (`magick`) as a child process for every sub-step.
#[derive(Debug, Clone)]
pub struct MagickTransformer {
    program: String,
}

impl Default for MagickTransformer {
    fn default() -> Self {
        Self::new("magick")
    }
}

impl MagickTransformer {
    /// Use a specific binary, e.g. an absolute path or `convert` on
    /// ImageMagick 6 installs.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, args: Vec<OsString>) -> Result<Vec<u8>, BackendError> {
        debug!("{} {:?}", self.program, args);
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| BackendError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;
        let stdout = output.stdout.clone();
        check_output(&self.program, output)?;
        Ok(stdout)
    }
}

/// Arguments for `magick <src> -auto-orient -resize WxH -density D -strip <dst>`.
pub(crate) fn normalize_args(req: &NormalizeRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![req.source.clone().into()];
    if req.auto_orient {
        args.push("-auto-orient".into());
    }
    args.push("-resize".into());
    args.push(format!("{}x{}", req.width, req.height).into());
    args.push("-density".into());
    args.push(req.density.to_string().into());
    if req.strip_metadata {
        args.push("-strip".into());
    }
    args.push(req.destination.clone().into());
    args
}

/// Arguments compositing the watermark, resized to exactly the requested
/// box, at the requested offset. Output overwrites the page.
pub(crate) fn watermark_args(req: &WatermarkRequest) -> Vec<OsString> {
    vec![
        req.page.clone().into(),
        "-colorspace".into(),
        "sRGB".into(),
        "(".into(),
        req.watermark.clone().into(),
        "-resize".into(),
        format!("{}x{}!", req.width, req.height).into(),
        ")".into(),
        "-geometry".into(),
        format!("+{}+{}", req.offset_x, req.offset_y).into(),
        "-composite".into(),
        req.page.clone().into(),
    ]
}

/// Arguments for `magick identify -format "%wx%h\n" <page>`.
///
/// Needs the ImageMagick 7 `magick` front end; `convert` has no `identify`
/// subcommand.
pub(crate) fn identify_args(page: &Path) -> Vec<OsString> {
    vec![
        "identify".into(),
        "-format".into(),
        "%wx%h\n".into(),
        page.as_os_str().to_os_string(),
    ]
}

/// Parse `identify` output. Multi-frame files print one line per frame; the
/// first frame is the page.
pub(crate) fn parse_geometry(output: &str) -> Option<(u32, u32)> {
    let (w, h) = output.lines().next()?.trim().split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

impl ImageTransformer for MagickTransformer {
    fn normalize(&self, req: &NormalizeRequest) -> Result<(), BackendError> {
        self.run(normalize_args(req)).map(drop)
    }

    fn watermark(&self, req: &WatermarkRequest) -> Result<(), BackendError> {
        self.run(watermark_args(req)).map(drop)
    }

    /// Measured by ImageMagick itself, so every format it can read works.
    fn dimensions(&self, path: &Path) -> Result<(u32, u32), BackendError> {
        let stdout = self.run(identify_args(path))?;
        let text = String::from_utf8_lossy(&stdout);
        parse_geometry(&text).ok_or_else(|| BackendError::UnexpectedOutput {
            program: self.program.clone(),
            output: text.trim().to_string(),
        })
    }
}
