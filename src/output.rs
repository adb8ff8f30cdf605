//! Page records and run results.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// One input image, mapped to one page of the output document.
#[derive(Debug)]
pub struct Page {
    source_path: PathBuf,
    page_number: u64,
    artifact: Option<Artifact>,
}

impl Page {
    pub fn new(source_path: impl Into<PathBuf>, page_number: u64) -> Self {
        Self {
            source_path: source_path.into(),
            page_number,
            artifact: None,
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn page_number(&self) -> u64 {
        self.page_number
    }

    /// Path of the transformed artifact, once the dispatcher produced one.
    pub fn working_path(&self) -> Option<&Path> {
        self.artifact.as_ref().map(Artifact::path)
    }

    pub(crate) fn set_artifact(&mut self, artifact: Artifact) {
        debug_assert!(self.artifact.is_none(), "artifact assigned twice");
        self.artifact = Some(artifact);
    }

    pub(crate) fn take_artifact(&mut self) -> Option<Artifact> {
        self.artifact.take()
    }

    pub fn summary(&self) -> PageSummary {
        PageSummary {
            page_number: self.page_number,
            source_path: self.source_path.clone(),
        }
    }
}

/// A page's private transformed image in the working directory.
///
/// The file is removed by [`Artifact::remove`]; if the artifact is dropped
/// without that (an unwinding run), the file is removed on drop.
#[derive(Debug)]
pub struct Artifact {
    path: TempPath,
}

impl Artifact {
    pub(crate) fn new(path: TempPath) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file. A file that is already gone counts as removed.
    pub fn remove(self) -> io::Result<()> {
        match self.path.close() {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Serializable view of an ordered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub page_number: u64,
    pub source_path: PathBuf,
}

/// Timing and count statistics for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BindStats {
    pub total_pages: usize,
    pub processed_pages: usize,
    pub failed_pages: usize,
    pub artifacts_removed: usize,
    pub discovery_ms: u64,
    pub transform_ms: u64,
    pub bundle_ms: u64,
    pub total_duration_ms: u64,
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindOutput {
    pub output_path: PathBuf,
    /// Pages in document order.
    pub pages: Vec<PageSummary>,
    pub stats: BindStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_page_has_no_working_path() {
        let p = Page::new("scans/p3.jpg", 3);
        assert_eq!(p.page_number(), 3);
        assert!(p.working_path().is_none());
        assert_eq!(
            p.summary(),
            PageSummary {
                page_number: 3,
                source_path: PathBuf::from("scans/p3.jpg")
            }
        );
    }

    #[test]
    fn artifact_remove_tolerates_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let tmp = tempfile::NamedTempFile::new_in(dir.path()).unwrap();
        let artifact = Artifact::new(tmp.into_temp_path());
        let path = artifact.path().to_path_buf();
        std::fs::remove_file(&path).unwrap();
        assert!(artifact.remove().is_ok());
    }

    #[test]
    fn artifact_remove_deletes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let tmp = tempfile::NamedTempFile::new_in(dir.path()).unwrap();
        let mut page = Page::new("x1.jpg", 1);
        page.set_artifact(Artifact::new(tmp.into_temp_path()));
        let path = page.working_path().unwrap().to_path_buf();
        assert!(path.exists());
        page.take_artifact().unwrap().remove().unwrap();
        assert!(!path.exists());
        assert!(page.working_path().is_none());
    }
}
