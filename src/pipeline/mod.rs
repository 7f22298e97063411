//! Pipeline stages for PDF content extraction.
//!
//! Each submodule implements one step. The PDFium passes are synchronous and
//! are run by [`crate::extract`] inside `spawn_blocking`.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ document ──┬─▶ text ──────────────┬─▶ summarize
//! (path/URL)  (pdfium) ├─▶ images ──▶ encode   │   (HTTP / LLM)
//!                      └─▶ tables ──▶ encode   │
//!                           (grid)   (PNG/CSV) │
//!                                              └─ postprocess
//! ```
//!
//! 1. [`input`]    — resolve the path, URL or byte buffer and check the `%PDF` header
//! 2. [`document`] — bind pdfium, open the document, walk the selected pages
//! 3. [`text`], [`images`], [`tables`] — one extraction pass each
//! 4. [`grid`]     — alignment heuristic that finds tables in text runs
//! 5. [`summarize`] — the only stage with network I/O besides URL download
//! 6. [`encode`]   — PNG and CSV bytes for downloads and JSON output

pub mod document;
pub mod encode;
pub mod grid;
pub mod images;
pub mod input;
pub mod postprocess;
pub mod summarize;
pub mod tables;
pub mod text;
