//! Error types for the scanbinder library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`BinderError`] — **Fatal**: the run cannot produce a document at all
//!   (unreadable input tree, a filename without a page number, missing
//!   artifacts, assembly failure). Returned as `Err(BinderError)` from the
//!   top-level `bind*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed its transform while
//!   every other page kept going. Collected by the dispatcher and reported
//!   through the progress callback; the bundler then refuses to assemble an
//!   incomplete page set.
//!
//! * [`BackendError`] — what an external collaborator (ImageMagick, img2pdf,
//!   the in-process engine) reports back. Wrapped into one of the two above
//!   with the page or run context attached.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the scanbinder library.
#[derive(Debug, Error)]
pub enum BinderError {
    // ── Discovery errors ──────────────────────────────────────────────────
    /// The search root does not exist or is not a directory.
    #[error("Search directory not found: '{path}'\nCheck the path exists and is a directory.")]
    RootNotFound { path: PathBuf },

    /// Walking the input tree failed (permission error, vanished entry, …).
    #[error("Failed to walk input directory{}: {source}", .path.as_ref().map(|p| format!(" at '{}'", p.display())).unwrap_or_default())]
    Discovery {
        path: Option<PathBuf>,
        #[source]
        source: walkdir::Error,
    },

    // ── Indexing errors ───────────────────────────────────────────────────
    /// A candidate filename carries no usable page number.
    #[error("No page number found in filename: '{file_name}'\nRename the file or narrow --ext.")]
    NoPageNumber { file_name: String },

    /// Discovery finished without a single candidate page.
    #[error("No pages found under '{root}' with extensions {extensions:?}")]
    NoPages {
        root: PathBuf,
        extensions: Vec<String>,
    },

    // ── Working storage ───────────────────────────────────────────────────
    /// The working directory could not be created.
    #[error("Working directory '{path}' is unavailable: {source}")]
    WorkDirUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Bundling errors ───────────────────────────────────────────────────
    /// At least one page has no transformed artifact; bundling would
    /// produce a document with pages missing or out of order.
    #[error(
        "{}/{total} pages have no transformed artifact; refusing to bundle.\nFirst missing page: '{}'",
        .missing.len(),
        .missing.first().map(|p| p.display().to_string()).unwrap_or_default()
    )]
    MissingArtifacts { missing: Vec<PathBuf>, total: usize },

    /// The document assembly step failed.
    #[error("Document assembly failed for '{path}': {detail}")]
    AssemblyFailed { path: PathBuf, detail: String },

    /// Could not move the assembled document into place.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// The dispatcher keeps going when one of these occurs; the affected page is
/// simply left without an artifact.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// No temporary artifact could be allocated for the page.
    #[error("{source_path}: could not allocate working file: {detail}")]
    ArtifactUnavailable { source_path: PathBuf, detail: String },

    /// Resampling the source image failed.
    #[error("{source_path}: normalize failed: {detail}")]
    NormalizeFailed { source_path: PathBuf, detail: String },

    /// Compositing the watermark failed.
    #[error("{source_path}: watermark failed: {detail}")]
    WatermarkFailed { source_path: PathBuf, detail: String },

    /// The page task panicked or was aborted.
    #[error("{source_path}: transform task failed: {detail}")]
    TaskFailed { source_path: PathBuf, detail: String },
}

impl PageError {
    /// The original file the failure belongs to.
    pub fn source_path(&self) -> &std::path::Path {
        match self {
            PageError::ArtifactUnavailable { source_path, .. }
            | PageError::NormalizeFailed { source_path, .. }
            | PageError::WatermarkFailed { source_path, .. }
            | PageError::TaskFailed { source_path, .. } => source_path,
        }
    }
}

/// Failure reported by an external collaborator.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The tool binary could not be started at all.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and exited unsuccessfully.
    #[error("'{program}' exited with {status}:\n{output}")]
    ToolFailed {
        program: String,
        status: String,
        output: String,
    },

    /// The tool succeeded but printed something that could not be parsed.
    #[error("unexpected output from '{program}': {output:?}")]
    UnexpectedOutput { program: String, output: String },

    /// In-process image decoding or encoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifacts_display() {
        let e = BinderError::MissingArtifacts {
            missing: vec![PathBuf::from("scans/p2.jpg")],
            total: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("1/10"), "got: {msg}");
        assert!(msg.contains("scans/p2.jpg"), "got: {msg}");
    }

    #[test]
    fn no_page_number_names_file() {
        let e = BinderError::NoPageNumber {
            file_name: "cover.jpg".into(),
        };
        assert!(e.to_string().contains("cover.jpg"));
    }

    #[test]
    fn tool_failed_carries_output() {
        let e = BackendError::ToolFailed {
            program: "magick".into(),
            status: "exit status: 1".into(),
            output: "no decode delegate".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("magick"));
        assert!(msg.contains("no decode delegate"));
    }

    #[test]
    fn page_error_source_path() {
        let e = PageError::WatermarkFailed {
            source_path: PathBuf::from("a/7.jpg"),
            detail: "boom".into(),
        };
        assert_eq!(e.source_path(), std::path::Path::new("a/7.jpg"));
        assert!(e.to_string().contains("a/7.jpg"));
    }
}
