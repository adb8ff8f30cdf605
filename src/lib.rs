//! # scanbinder
//!
//! Bind a directory of scanned page images into one ordered, optionally
//! watermarked PDF.
//!
//! Scans arrive as loose files (`scan-001.jpg`, `scan-002.jpg`, …) spread
//! over folders, at arbitrary resolutions and orientations. This crate finds
//! them, orders them by the page number embedded in each filename,
//! normalizes every page concurrently (and stamps an optional watermark), then
//! hands the pages, in order, to a document assembler.
//!
//! ## Pipeline Overview
//!
//! ```text
//! search root
//!  │
//!  ├─ 1. Discover  recursive walk, extension allow-list
//!  ├─ 2. Index     page number = last digit run of the file stem
//!  ├─ 3. Order     stable sort by page number
//!  ├─ 4. Dispatch  bounded concurrent normalize (+ watermark), full barrier
//!  ├─ 5. Bundle    completeness check, one assembly call in page order
//!  └─ 6. Cleanup   remove every temporary artifact, success or not
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scanbinder::{bind, BinderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BinderConfig::builder()
//!         .search_root("scans/")
//!         .output_path("book.pdf")
//!         .watermark("stamp.png")
//!         .build()?;
//!     let output = bind(&config).await?;
//!     eprintln!("{} pages in {}ms", output.stats.total_pages, output.stats.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## External tools
//!
//! By default pages are transformed with ImageMagick 7 (`magick`) and
//! assembled with `img2pdf`. [`NativeTransformer`] replaces ImageMagick with
//! an in-process engine; any other service plugs in through the
//! [`ImageTransformer`] and [`DocumentAssembler`] traits.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `scanbinder` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod bind;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{
    watermark_dimensions, DocumentAssembler, ImageTransformer, Img2PdfAssembler,
    MagickTransformer, NativeTransformer, NormalizeRequest, WatermarkRequest,
};
pub use bind::{bind, bind_sync, inspect};
pub use config::{BinderConfig, BinderConfigBuilder};
pub use error::{BackendError, BinderError, PageError};
pub use output::{BindOutput, BindStats, Page, PageSummary};
pub use pipeline::index::{extract_page_number, LastDigitRun, PageNumberRule};
pub use progress::{BindProgressCallback, NoopProgressCallback, ProgressCallback};
