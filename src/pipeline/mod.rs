//! Pipeline stages for binding scanned pages into one document.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the orchestrator in [`crate::bind`] only wires them together.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ index ──▶ order ──▶ dispatch ──▶ bundle ──▶ cleanup
//! (walkdir)   (digits)  (stable)  (N tasks)    (img2pdf)   (always)
//! ```
//!
//! 1. [`discover`] — lazy recursive walk, filtered by extension
//! 2. [`index`]    — page number from each filename; fails fast on a miss
//! 3. [`order`]    — stable sort by page number
//! 4. [`dispatch`] — bounded concurrent normalize + watermark per page,
//!    joined behind a full barrier
//! 5. [`bundle`]   — completeness check, then one assembly call in order
//! 6. [`cleanup`]  — best-effort removal of every artifact

pub mod bundle;
pub mod cleanup;
pub mod discover;
pub mod dispatch;
pub mod index;
pub mod order;
