//! img2pdf-backed document assembly.

use super::{check_output, DocumentAssembler};
use crate::error::BackendError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Runs `img2pdf --output <dst> <pages…>` once over the whole page list.
///
/// img2pdf embeds JPEGs without re-encoding, so page quality is whatever the
/// transform step produced.
#[derive(Debug, Clone)]
pub struct Img2PdfAssembler {
    program: String,
}

impl Default for Img2PdfAssembler {
    fn default() -> Self {
        Self::new("img2pdf")
    }
}

impl Img2PdfAssembler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

// Every page is one argv entry; very long page lists can hit the platform's
// argument-length limit.
pub(crate) fn assemble_args(pages: &[PathBuf], destination: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(pages.len() + 2);
    args.push("--output".into());
    args.push(destination.as_os_str().to_os_string());
    args.extend(pages.iter().map(|p| p.as_os_str().to_os_string()));
    args
}

impl DocumentAssembler for Img2PdfAssembler {
    fn assemble(&self, pages: &[PathBuf], destination: &Path) -> Result<(), BackendError> {
        debug!(
            "{} --output {} ({} pages)",
            self.program,
            destination.display(),
            pages.len()
        );
        let output = Command::new(&self.program)
            .args(assemble_args(pages, destination))
            .output()
            .map_err(|e| BackendError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;
        check_output(&self.program, output)
    }
}
