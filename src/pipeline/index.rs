//! Page indexing: derive a page number from each discovered filename.
//!
//! Scanners and phone apps name files `scan-007.jpg`, `IMG_0042.jpeg`,
//! `page12b.jpg`, … The default rule takes the **last** run of decimal digits
//! in the file stem, which is the counter in every one of those conventions.
//! The rule sits behind [`PageNumberRule`] so a different convention can be
//! plugged in through [`crate::config::BinderConfigBuilder::page_rule`]
//! without touching the pipeline.

use crate::error::BinderError;
use crate::output::Page;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::info;

/// Derives a total-order key from a filename.
pub trait PageNumberRule: Send + Sync {
    /// Page number for `file_name` (final path component, extension
    /// included), or `None` when the name carries no usable number.
    fn page_number(&self, file_name: &str) -> Option<u64>;
}

/// Default rule: the last digit run of the file stem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastDigitRun;

impl PageNumberRule for LastDigitRun {
    fn page_number(&self, file_name: &str) -> Option<u64> {
        extract_page_number(file_name)
    }
}

static RE_DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

/// Last run of ASCII digits in the stem of `file_name`.
///
/// Returns `None` when the stem has no digits or the run overflows `u64`.
pub fn extract_page_number(file_name: &str) -> Option<u64> {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    RE_DIGIT_RUN
        .find_iter(stem)
        .last()
        .and_then(|m| m.as_str().parse().ok())
}

/// Consume the discovery sequence into an unordered page collection.
///
/// Fails fast on the first discovery error or the first filename without a
/// page number; no partial collection is returned.
pub fn index_pages<I>(paths: I, rule: &dyn PageNumberRule) -> Result<Vec<Page>, BinderError>
where
    I: IntoIterator<Item = Result<PathBuf, BinderError>>,
{
    let mut pages = Vec::new();

    for path in paths {
        let path = path?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let number = rule
            .page_number(&file_name)
            .ok_or_else(|| BinderError::NoPageNumber {
                file_name: file_name.clone(),
            })?;

        info!("found page {}: {}", number, path.display());
        pages.push(Page::new(path, number));
    }

    Ok(pages)
}
