//! Path discovery: lazily walk the search root for candidate page images.

use crate::error::BinderError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Lazy, finite, non-restartable sequence of candidate files.
///
/// Yields paths in filesystem traversal order (depth-first). The first walk
/// error is yielded once and ends the sequence.
pub struct Discovery {
    walker: walkdir::IntoIter,
    extensions: Vec<String>,
    failed: bool,
}

/// Start a recursive walk of `root`, accepting files whose extension
/// (dot included, case-sensitive) is one of `extensions`.
pub fn discover(root: &Path, extensions: &[String]) -> Discovery {
    debug!("Walking {} for {:?}", root.display(), extensions);
    Discovery {
        walker: WalkDir::new(root).follow_links(false).into_iter(),
        extensions: extensions.to_vec(),
        failed: false,
    }
}

/// Whether `path` carries one of the accepted extensions.
pub fn has_accepted_extension(path: &Path, extensions: &[String]) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => extensions
            .iter()
            .any(|accepted| accepted.strip_prefix('.') == Some(ext)),
        None => false,
    }
}

impl Iterator for Discovery {
    type Item = Result<PathBuf, BinderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(BinderError::Discovery {
                        path: e.path().map(Path::to_path_buf),
                        source: e,
                    }));
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.into_path();
            if !has_accepted_extension(&path, &self.extensions) {
                info!("skipping: {}", path.display());
                continue;
            }
            return Some(Ok(path));
        }
    }
}

impl std::iter::FusedIterator for Discovery {}
