//! Binding entry points: run the whole pipeline for one configuration.
//!
//! [`bind`] is the async entry point, [`bind_sync`] wraps it in a private
//! runtime, and [`inspect`] stops after ordering so callers can preview the
//! page order without touching any image.

use crate::backend::{DocumentAssembler, ImageTransformer, Img2PdfAssembler, MagickTransformer};
use crate::config::BinderConfig;
use crate::error::BinderError;
use crate::output::{BindOutput, BindStats, Page, PageSummary};
use crate::pipeline::index::PageNumberRule;
use crate::pipeline::{bundle, cleanup, discover, dispatch, index, order};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Bind the pages under `config.search_root` into `config.output_path`.
///
/// # Errors
/// Returns `Err(BinderError)` for every failure that prevents a complete
/// document:
/// - search root missing, walk failure, or a filename without page number
///   (nothing is transformed)
/// - any page whose transform failed ([`BinderError::MissingArtifacts`])
/// - the assembly step failing
///
/// Artifacts are removed in every case once dispatch has started.
pub async fn bind(config: &BinderConfig) -> Result<BindOutput, BinderError> {
    let total_start = Instant::now();
    info!("Starting run: {}", config.search_root.display());

    // ── Step 1–3: Discover, index, order ─────────────────────────────────
    let discovery_start = Instant::now();
    // The walk is blocking filesystem work and can be long on large trees.
    let root = config.search_root.clone();
    let extensions = config.extensions.clone();
    let rule = Arc::clone(&config.page_rule);
    let mut pages = tokio::task::spawn_blocking(move || {
        collect_ordered_pages(&root, &extensions, rule.as_ref())
    })
    .await
    .map_err(|e| BinderError::Internal(format!("Discovery task panicked: {}", e)))??;
    let discovery_ms = discovery_start.elapsed().as_millis() as u64;
    let total_pages = pages.len();
    info!("Found {} pages in {}ms", total_pages, discovery_ms);

    // ── Step 4: Prepare working storage ──────────────────────────────────
    tokio::fs::create_dir_all(&config.work_dir)
        .await
        .map_err(|e| BinderError::WorkDirUnavailable {
            path: config.work_dir.clone(),
            source: e,
        })?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total_pages);
    }

    // ── Step 5: Transform pages ──────────────────────────────────────────
    let transform_start = Instant::now();
    let page_errors = dispatch::dispatch(&mut pages, resolve_transformer(config), config).await;
    let transform_ms = transform_start.elapsed().as_millis() as u64;
    if !page_errors.is_empty() {
        warn!(
            "{}/{} pages failed to transform",
            page_errors.len(),
            total_pages
        );
    }

    // ── Step 6: Bundle ───────────────────────────────────────────────────
    let bundle_start = Instant::now();
    let bundled = bundle::bundle(&pages, resolve_assembler(config), &config.output_path).await;
    let bundle_ms = bundle_start.elapsed().as_millis() as u64;

    // ── Step 7: Cleanup, whatever the bundle outcome ─────────────────────
    let report = cleanup::cleanup(&mut pages);
    bundled?;

    let stats = BindStats {
        total_pages,
        processed_pages: total_pages - page_errors.len(),
        failed_pages: page_errors.len(),
        artifacts_removed: report.removed,
        discovery_ms,
        transform_ms,
        bundle_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Run complete: {} pages → {} in {}ms",
        total_pages,
        config.output_path.display(),
        stats.total_duration_ms
    );

    Ok(BindOutput {
        output_path: config.output_path.clone(),
        pages: pages.iter().map(Page::summary).collect(),
        stats,
    })
}

/// Synchronous wrapper around [`bind`].
///
/// Creates a tokio runtime internally.
pub fn bind_sync(config: &BinderConfig) -> Result<BindOutput, BinderError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BinderError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(bind(config))
}

/// Discover, index and order pages without transforming anything.
///
/// Does not need ImageMagick or img2pdf.
pub fn inspect(config: &BinderConfig) -> Result<Vec<PageSummary>, BinderError> {
    Ok(collect_ordered_pages(
        &config.search_root,
        &config.extensions,
        config.page_rule.as_ref(),
    )?
        .iter()
        .map(Page::summary)
        .collect())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Steps shared by [`bind`] and [`inspect`]: fail fast on an unusable root,
/// any walk error, or any filename without a page number.
fn collect_ordered_pages(
    root: &Path,
    extensions: &[String],
    rule: &dyn PageNumberRule,
) -> Result<Vec<Page>, BinderError> {
    if !root.is_dir() {
        return Err(BinderError::RootNotFound {
            path: root.to_path_buf(),
        });
    }

    let candidates = discover::discover(root, extensions);
    let mut pages = index::index_pages(candidates, rule)?;
    if pages.is_empty() {
        return Err(BinderError::NoPages {
            root: root.to_path_buf(),
            extensions: extensions.to_vec(),
        });
    }

    order::resolve_order(&mut pages);
    debug!(
        "Page order: {:?}",
        pages.iter().map(Page::page_number).collect::<Vec<_>>()
    );
    Ok(pages)
}

/// Caller-supplied transformer, else ImageMagick.
fn resolve_transformer(config: &BinderConfig) -> Arc<dyn ImageTransformer> {
    match config.transformer {
        Some(ref t) => Arc::clone(t),
        None => Arc::new(MagickTransformer::default()),
    }
}

/// Caller-supplied assembler, else img2pdf.
fn resolve_assembler(config: &BinderConfig) -> Arc<dyn DocumentAssembler> {
    match config.assembler {
        Some(ref a) => Arc::clone(a),
        None => Arc::new(Img2PdfAssembler::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn config_for(root: &std::path::Path) -> BinderConfig {
        BinderConfig::builder()
            .search_root(root)
            .output_path(root.join("out.pdf"))
            .build()
            .unwrap()
    }

    #[test]
    fn inspect_orders_pages() {
        let dir = TempDir::new().unwrap();
        for name in ["a3.jpg", "a1.jpg", "a2.jpg", "notes.txt"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let pages = inspect(&config_for(dir.path())).unwrap();
        let numbers: Vec<u64> = pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(pages[0].source_path, dir.path().join("a1.jpg"));
    }

    #[test]
    fn inspect_missing_root() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir.path().join("missing"));
        assert!(matches!(
            inspect(&config),
            Err(BinderError::RootNotFound { .. })
        ));
    }

    /// Records the thread each filename is indexed on.
    #[derive(Default)]
    struct ThreadRecordingRule {
        threads: std::sync::Mutex<Vec<std::thread::ThreadId>>,
    }

    impl PageNumberRule for ThreadRecordingRule {
        fn page_number(&self, file_name: &str) -> Option<u64> {
            self.threads
                .lock()
                .unwrap()
                .push(std::thread::current().id());
            index::extract_page_number(file_name)
        }
    }

    #[tokio::test]
    async fn bind_walks_off_the_runtime_thread() {
        let dir = TempDir::new().unwrap();
        let scans = dir.path().join("scans");
        std::fs::create_dir(&scans).unwrap();
        File::create(scans.join("p1.jpg")).unwrap();
        let rule = Arc::new(ThreadRecordingRule::default());
        let config = BinderConfig::builder()
            .search_root(&scans)
            .output_path(dir.path().join("out.pdf"))
            .work_dir(dir.path().join("work"))
            .page_rule(rule.clone())
            .transformer(Arc::new(crate::backend::NativeTransformer::new()))
            .build()
            .unwrap();

        // The empty p1.jpg cannot be decoded; only the walk matters here.
        let _ = bind(&config).await;

        let threads = rule.threads.lock().unwrap();
        assert_eq!(threads.len(), 1);
        assert_ne!(threads[0], std::thread::current().id());
    }

    #[test]
    fn inspect_empty_root() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            inspect(&config_for(dir.path())),
            Err(BinderError::NoPages { .. })
        ));
    }
}
