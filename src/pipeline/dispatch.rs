//! Transform dispatch: run every page through normalize (+ watermark)
//! concurrently, then reassemble results in document order.
//!
//! ## Concurrency
//!
//! Each page becomes one future that hands the blocking transform to
//! `tokio::task::spawn_blocking`; at most `config.concurrency` of them run at
//! once (`buffer_unordered`). Tasks share nothing mutable: each allocates its
//! own uniquely named temp file through `tempfile`, which is the only thing
//! keeping siblings apart in the shared working directory.
//!
//! Completion order is arbitrary. Every result carries the page's position
//! in the ordered sequence and is written back to that slot, so document
//! order never depends on scheduling. The function returns only after every
//! task has finished, successfully or not.

use crate::backend::{watermark_dimensions, ImageTransformer, NormalizeRequest, WatermarkRequest};
use crate::config::{BinderConfig, WATERMARK_OFFSET};
use crate::error::PageError;
use crate::output::{Artifact, Page};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-run transform settings every page task receives a copy of.
#[derive(Debug, Clone)]
pub struct TransformParams {
    pub work_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub density: u32,
    pub watermark: Option<PathBuf>,
    pub watermark_scale: u32,
}

impl TransformParams {
    pub fn from_config(config: &BinderConfig) -> Self {
        Self {
            work_dir: config.work_dir.clone(),
            width: config.page_width,
            height: config.page_height,
            density: config.density,
            watermark: config.watermark.clone(),
            watermark_scale: config.watermark_scale,
        }
    }
}

/// Transform every page, setting its artifact on success.
///
/// Per-page failures are logged, reported through the progress callback and
/// returned in document order; they never stop sibling pages.
pub async fn dispatch(
    pages: &mut [Page],
    transformer: Arc<dyn ImageTransformer>,
    config: &BinderConfig,
) -> Vec<PageError> {
    let total = pages.len();
    let params = TransformParams::from_config(config);
    let callback = config.progress_callback.clone();

    let mut results: Vec<(usize, Result<Artifact, PageError>)> =
        stream::iter(pages.iter().enumerate().map(|(idx, page)| {
            let source = page.source_path().to_path_buf();
            let transformer = Arc::clone(&transformer);
            let params = params.clone();
            let callback = callback.clone();
            async move {
                let position = idx + 1;
                if let Some(ref cb) = callback {
                    cb.on_page_start(position, total, &source);
                }

                let task_source = source.clone();
                let result = tokio::task::spawn_blocking(move || {
                    transform_page(&task_source, transformer.as_ref(), &params)
                })
                .await
                .unwrap_or_else(|e| {
                    Err(PageError::TaskFailed {
                        source_path: source.clone(),
                        detail: e.to_string(),
                    })
                });

                match &result {
                    Ok(_) => {
                        info!("processed page: {}", source.display());
                        if let Some(ref cb) = callback {
                            cb.on_page_complete(position, total, &source);
                        }
                    }
                    Err(e) => {
                        warn!("error processing page: {}", e);
                        if let Some(ref cb) = callback {
                            cb.on_page_error(position, total, &e.to_string());
                        }
                    }
                }
                (idx, result)
            }
        }))
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(idx, _)| *idx);

    let mut errors = Vec::new();
    for (idx, result) in results {
        match result {
            Ok(artifact) => pages[idx].set_artifact(artifact),
            Err(e) => errors.push(e),
        }
    }

    let succeeded = total - errors.len();
    debug!("Dispatch finished: {}/{} pages transformed", succeeded, total);
    if let Some(ref cb) = callback {
        cb.on_transforms_complete(total, succeeded);
    }

    errors
}

/// Blocking transform of one page into a fresh artifact.
///
/// On any failure the half-written artifact is dropped, which deletes it.
pub fn transform_page(
    source: &Path,
    transformer: &dyn ImageTransformer,
    params: &TransformParams,
) -> Result<Artifact, PageError> {
    let suffix = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let file = tempfile::Builder::new()
        .prefix("scanbinder-")
        .suffix(&suffix)
        .tempfile_in(&params.work_dir)
        .map_err(|e| PageError::ArtifactUnavailable {
            source_path: source.to_path_buf(),
            detail: e.to_string(),
        })?;
    // The handle is closed here; only the path is kept.
    let artifact = Artifact::new(file.into_temp_path());

    transformer
        .normalize(&NormalizeRequest {
            source: source.to_path_buf(),
            destination: artifact.path().to_path_buf(),
            width: params.width,
            height: params.height,
            density: params.density,
            auto_orient: true,
            strip_metadata: true,
        })
        .map_err(|e| PageError::NormalizeFailed {
            source_path: source.to_path_buf(),
            detail: e.to_string(),
        })?;

    if let Some(ref watermark) = params.watermark {
        let watermark_failed = |detail: String| PageError::WatermarkFailed {
            source_path: source.to_path_buf(),
            detail,
        };

        let (page_w, page_h) = transformer
            .dimensions(artifact.path())
            .map_err(|e| watermark_failed(e.to_string()))?;
        let (width, height) = watermark_dimensions(page_w, page_h, params.watermark_scale);

        transformer
            .watermark(&WatermarkRequest {
                page: artifact.path().to_path_buf(),
                watermark: watermark.clone(),
                width,
                height,
                offset_x: WATERMARK_OFFSET.0,
                offset_y: WATERMARK_OFFSET.1,
                density: params.density,
            })
            .map_err(|e| watermark_failed(e.to_string()))?;
    }

    Ok(artifact)
}
