//! Cleanup: remove every page artifact once bundling has resolved.

use crate::output::Page;
use tracing::{debug, warn};

/// What cleanup managed to delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub failed: usize,
}

/// Delete every artifact still attached to `pages`.
///
/// Best-effort: failures are logged and counted, never returned, so they
/// cannot mask the outcome of the run. Artifacts already gone count as
/// removed.
pub fn cleanup(pages: &mut [Page]) -> CleanupReport {
    let mut report = CleanupReport::default();

    for page in pages.iter_mut() {
        let Some(artifact) = page.take_artifact() else {
            continue;
        };
        let path = artifact.path().to_path_buf();
        match artifact.remove() {
            Ok(()) => report.removed += 1,
            Err(e) => {
                warn!("could not remove {}: {}", path.display(), e);
                report.failed += 1;
            }
        }
    }

    debug!(
        "Cleanup: {} artifacts removed, {} failed",
        report.removed, report.failed
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Artifact;
    use tempfile::TempDir;

    fn page_with_artifact(dir: &TempDir, number: u64) -> Page {
        let mut page = Page::new(format!("p{number}.jpg"), number);
        let tmp = tempfile::NamedTempFile::new_in(dir.path()).unwrap();
        page.set_artifact(Artifact::new(tmp.into_temp_path()));
        page
    }

    #[test]
    fn removes_every_artifact() {
        let dir = TempDir::new().unwrap();
        let mut pages = vec![
            page_with_artifact(&dir, 1),
            Page::new("p2.jpg", 2),
            page_with_artifact(&dir, 3),
        ];

        let report = cleanup(&mut pages);

        assert_eq!(report, CleanupReport { removed: 2, failed: 0 });
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(pages.iter().all(|p| p.working_path().is_none()));
    }

    #[test]
    fn already_deleted_artifacts_are_not_errors() {
        let dir = TempDir::new().unwrap();
        let mut pages = vec![page_with_artifact(&dir, 1), page_with_artifact(&dir, 2)];
        std::fs::remove_file(pages[0].working_path().unwrap()).unwrap();

        let report = cleanup(&mut pages);

        assert_eq!(report, CleanupReport { removed: 2, failed: 0 });
    }

    #[test]
    fn second_cleanup_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let mut pages = vec![page_with_artifact(&dir, 1)];
        cleanup(&mut pages);
        assert_eq!(cleanup(&mut pages), CleanupReport::default());
    }
}
