//! Configuration types for a binding run.
//!
//! Every knob lives in [`BinderConfig`], built via [`BinderConfigBuilder`].
//! The value is read-only for the whole run and passed explicitly into each
//! pipeline stage; no stage keeps global state.

use crate::backend::{DocumentAssembler, ImageTransformer};
use crate::error::BinderError;
use crate::pipeline::index::{LastDigitRun, PageNumberRule};
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Extensions accepted when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".jpg", ".jpeg"];

/// Default working directory for temporary page artifacts.
pub const DEFAULT_WORK_DIR: &str = ".scanbinder-workdir";

/// Fixed placement of the watermark, in pixels from the top-left corner.
pub const WATERMARK_OFFSET: (u32, u32) = (25, 25);

/// Configuration for one binding run.
///
/// # Example
/// ```rust
/// use scanbinder::BinderConfig;
///
/// let config = BinderConfig::builder()
///     .search_root("scans")
///     .output_path("book.pdf")
///     .watermark("logo.png")
///     .watermark_scale(4)
///     .build()
///     .unwrap();
/// assert!(config.watermark_enabled());
/// ```
#[derive(Clone)]
pub struct BinderConfig {
    /// Directory searched recursively for page images.
    pub search_root: PathBuf,

    /// Accepted extensions, dot included, matched case-sensitively.
    /// Default: `.jpg`, `.jpeg`.
    pub extensions: Vec<String>,

    /// Destination of the assembled document.
    pub output_path: PathBuf,

    /// Watermark image. Its presence toggles watermarking.
    pub watermark: Option<PathBuf>,

    /// Watermark box is the page size divided by this factor. Default: 4.
    ///
    /// A larger factor gives a smaller watermark.
    pub watermark_scale: u32,

    /// Target page width in pixels. Default: 1500.
    pub page_width: u32,

    /// Target page height in pixels. Default: 1500.
    pub page_height: u32,

    /// Resolution written into each normalized page, in DPI. Default: 150.
    pub density: u32,

    /// Scratch directory for per-page artifacts. Default: `.scanbinder-workdir`.
    pub work_dir: PathBuf,

    /// Maximum number of page transforms in flight. Default: 8.
    pub concurrency: usize,

    /// Rule deriving a page number from a filename.
    pub page_rule: Arc<dyn PageNumberRule>,

    /// Image transform service. `None` uses ImageMagick.
    pub transformer: Option<Arc<dyn ImageTransformer>>,

    /// Document assembly service. `None` uses img2pdf.
    pub assembler: Option<Arc<dyn DocumentAssembler>>,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            search_root: PathBuf::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            output_path: PathBuf::new(),
            watermark: None,
            watermark_scale: 4,
            page_width: 1500,
            page_height: 1500,
            density: 150,
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            concurrency: 8,
            page_rule: Arc::new(LastDigitRun),
            transformer: None,
            assembler: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BinderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinderConfig")
            .field("search_root", &self.search_root)
            .field("extensions", &self.extensions)
            .field("output_path", &self.output_path)
            .field("watermark", &self.watermark)
            .field("watermark_scale", &self.watermark_scale)
            .field("page_width", &self.page_width)
            .field("page_height", &self.page_height)
            .field("density", &self.density)
            .field("work_dir", &self.work_dir)
            .field("concurrency", &self.concurrency)
            .field(
                "transformer",
                &self.transformer.as_ref().map(|_| "<dyn ImageTransformer>"),
            )
            .field(
                "assembler",
                &self.assembler.as_ref().map(|_| "<dyn DocumentAssembler>"),
            )
            .finish()
    }
}

impl BinderConfig {
    /// Create a new builder for `BinderConfig`.
    pub fn builder() -> BinderConfigBuilder {
        BinderConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether pages get a watermark composited.
    pub fn watermark_enabled(&self) -> bool {
        self.watermark.is_some()
    }
}

/// Builder for [`BinderConfig`].
pub struct BinderConfigBuilder {
    config: BinderConfig,
}

impl BinderConfigBuilder {
    pub fn search_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.search_root = root.into();
        self
    }

    /// Replace the extension allow-list. A missing leading dot is added.
    pub fn extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.extensions = exts
            .into_iter()
            .map(|e| e.as_ref().trim().to_string())
            .filter(|e| !e.is_empty())
            .map(|e| if e.starts_with('.') { e } else { format!(".{e}") })
            .collect();
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    pub fn watermark(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.watermark = Some(path.into());
        self
    }

    pub fn watermark_scale(mut self, scale: u32) -> Self {
        self.config.watermark_scale = scale;
        self
    }

    pub fn page_size(mut self, width: u32, height: u32) -> Self {
        self.config.page_width = width;
        self.config.page_height = height;
        self
    }

    pub fn density(mut self, dpi: u32) -> Self {
        self.config.density = dpi;
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = dir.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn page_rule(mut self, rule: Arc<dyn PageNumberRule>) -> Self {
        self.config.page_rule = rule;
        self
    }

    pub fn transformer(mut self, transformer: Arc<dyn ImageTransformer>) -> Self {
        self.config.transformer = Some(transformer);
        self
    }

    pub fn assembler(mut self, assembler: Arc<dyn DocumentAssembler>) -> Self {
        self.config.assembler = Some(assembler);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BinderConfig, BinderError> {
        let c = &self.config;
        if c.search_root.as_os_str().is_empty() {
            return Err(BinderError::InvalidConfig(
                "search root must be set".into(),
            ));
        }
        if c.output_path.as_os_str().is_empty() {
            return Err(BinderError::InvalidConfig(
                "output path must be set".into(),
            ));
        }
        if c.extensions.is_empty() {
            return Err(BinderError::InvalidConfig(
                "at least one file extension is required".into(),
            ));
        }
        if c.watermark_scale == 0 {
            return Err(BinderError::InvalidConfig(
                "watermark scale must be ≥ 1".into(),
            ));
        }
        if c.page_width == 0 || c.page_height == 0 {
            return Err(BinderError::InvalidConfig(format!(
                "page size must be non-zero, got {}x{}",
                c.page_width, c.page_height
            )));
        }
        if c.density == 0 {
            return Err(BinderError::InvalidConfig("density must be ≥ 1".into()));
        }
        if c.work_dir.as_os_str().is_empty() {
            return Err(BinderError::InvalidConfig(
                "working directory must be set".into(),
            ));
        }
        Ok(self.config)
    }
}
