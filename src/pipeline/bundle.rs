//! Bundling: hand the ordered artifacts to the assembly service.
//!
//! Bundling is all-or-nothing over the ordered page set. If any page lacks an
//! artifact the assembler is never called, since skipping a page would shift
//! every later page out of place in the document.
//!
//! The assembler writes into a staging file next to the destination, which is
//! renamed over the destination only after assembly succeeded. A failed or
//! interrupted assembly therefore never leaves a partial document behind.

use crate::backend::DocumentAssembler;
use crate::error::BinderError;
use crate::output::Page;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Source paths of pages that have no artifact, in document order.
pub fn missing_artifacts(pages: &[Page]) -> Vec<PathBuf> {
    pages
        .iter()
        .filter(|p| p.working_path().is_none())
        .map(|p| p.source_path().to_path_buf())
        .collect()
}

/// Mode for the staged document: the mode of the file being replaced, else
/// `0o644` (still subject to the process umask). `tempfile` alone would
/// leave the document owner-only.
#[cfg(unix)]
fn output_permissions(output: &Path) -> std::fs::Permissions {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(output)
        .map(|m| m.permissions())
        .unwrap_or_else(|_| std::fs::Permissions::from_mode(0o644))
}

/// Assemble `pages` (already in document order) into `output`.
pub async fn bundle(
    pages: &[Page],
    assembler: Arc<dyn DocumentAssembler>,
    output: &Path,
) -> Result<(), BinderError> {
    let missing = missing_artifacts(pages);
    if !missing.is_empty() {
        return Err(BinderError::MissingArtifacts {
            missing,
            total: pages.len(),
        });
    }

    let files: Vec<PathBuf> = pages
        .iter()
        .filter_map(|p| p.working_path().map(Path::to_path_buf))
        .collect();

    let write_failed = |source: std::io::Error| BinderError::OutputWriteFailed {
        path: output.to_path_buf(),
        source,
    };

    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&parent)
        .await
        .map_err(write_failed)?;

    let suffix = output
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let mut builder = tempfile::Builder::new();
    builder.prefix(".scanbinder-").suffix(&suffix);
    #[cfg(unix)]
    builder.permissions(output_permissions(output));
    let staging = builder
        .tempfile_in(&parent)
        .map_err(write_failed)?
        .into_temp_path();

    info!("bundling {} pages into {}", files.len(), output.display());
    let staging_path = staging.to_path_buf();
    tokio::task::spawn_blocking(move || assembler.assemble(&files, &staging_path))
        .await
        .map_err(|e| BinderError::Internal(format!("Assembly task panicked: {}", e)))?
        .map_err(|e| BinderError::AssemblyFailed {
            path: output.to_path_buf(),
            detail: e.to_string(),
        })?;

    staging
        .persist(output)
        .map_err(|e| write_failed(e.error))?;
    debug!("Wrote {}", output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::output::Artifact;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Writes the page list, one path per line, as the "document".
    #[derive(Default)]
    struct ListingAssembler {
        calls: AtomicUsize,
    }

    impl DocumentAssembler for ListingAssembler {
        fn assemble(&self, pages: &[PathBuf], destination: &Path) -> Result<(), BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let listing: Vec<String> = pages.iter().map(|p| p.display().to_string()).collect();
            std::fs::write(destination, listing.join("\n"))?;
            Ok(())
        }
    }

    struct FailingAssembler;

    impl DocumentAssembler for FailingAssembler {
        fn assemble(&self, _pages: &[PathBuf], destination: &Path) -> Result<(), BackendError> {
            std::fs::write(destination, b"%PDF-1.4 truncated")?;
            Err(BackendError::ToolFailed {
                program: "img2pdf".into(),
                status: "exit status: 2".into(),
                output: "cannot read input".into(),
            })
        }
    }

    fn page_with_artifact(dir: &Path, source: &str, number: u64) -> Page {
        let mut page = Page::new(source, number);
        let tmp = tempfile::NamedTempFile::new_in(dir).unwrap();
        page.set_artifact(Artifact::new(tmp.into_temp_path()));
        page
    }

    #[tokio::test]
    async fn passes_artifacts_in_page_order() {
        let dir = TempDir::new().unwrap();
        let pages = vec![
            page_with_artifact(dir.path(), "a1.jpg", 1),
            page_with_artifact(dir.path(), "a2.jpg", 2),
            page_with_artifact(dir.path(), "a3.jpg", 3),
        ];
        let output = dir.path().join("nested/out.pdf");

        bundle(&pages, Arc::new(ListingAssembler::default()), &output)
            .await
            .unwrap();

        let listing = std::fs::read_to_string(&output).unwrap();
        let expected: Vec<String> = pages
            .iter()
            .map(|p| p.working_path().unwrap().display().to_string())
            .collect();
        assert_eq!(listing, expected.join("\n"));
    }

    #[tokio::test]
    async fn refuses_incomplete_page_set() {
        let dir = TempDir::new().unwrap();
        let pages = vec![
            page_with_artifact(dir.path(), "a1.jpg", 1),
            Page::new("a2.jpg", 2),
            page_with_artifact(dir.path(), "a3.jpg", 3),
        ];
        let assembler = Arc::new(ListingAssembler::default());
        let output = dir.path().join("out.pdf");

        let err = bundle(&pages, assembler.clone(), &output).await.unwrap_err();

        match err {
            BinderError::MissingArtifacts { missing, total } => {
                assert_eq!(missing, vec![PathBuf::from("a2.jpg")]);
                assert_eq!(total, 3);
            }
            other => panic!("expected MissingArtifacts, got {other:?}"),
        }
        assert_eq!(assembler.calls.load(Ordering::SeqCst), 0);
        assert!(!output.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn output_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let pages = vec![page_with_artifact(dir.path(), "a1.jpg", 1)];
        let output = dir.path().join("out.pdf");

        bundle(&pages, Arc::new(ListingAssembler::default()), &output)
            .await
            .unwrap();

        let mode = std::fs::metadata(&output).unwrap().permissions().mode();
        assert_eq!(mode & 0o044, 0o044, "mode was {:o}", mode & 0o777);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn replaced_output_keeps_its_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let pages = vec![page_with_artifact(dir.path(), "a1.jpg", 1)];
        let output = dir.path().join("out.pdf");
        std::fs::write(&output, b"old").unwrap();
        std::fs::set_permissions(&output, std::fs::Permissions::from_mode(0o600)).unwrap();

        bundle(&pages, Arc::new(ListingAssembler::default()), &output)
            .await
            .unwrap();

        let mode = std::fs::metadata(&output).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_ne!(std::fs::read(&output).unwrap(), b"old");
    }

    #[tokio::test]
    async fn failed_assembly_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let pages = vec![page_with_artifact(dir.path(), "a1.jpg", 1)];
        let output = dir.path().join("out.pdf");

        let err = bundle(&pages, Arc::new(FailingAssembler), &output)
            .await
            .unwrap_err();

        assert!(matches!(err, BinderError::AssemblyFailed { .. }));
        assert!(err.to_string().contains("cannot read input"));
        assert!(!output.exists());
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(".scanbinder-"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
