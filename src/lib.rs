//! # pdf-content-extractor
//!
//! Pull the text, embedded images and tables out of a PDF, and optionally
//! summarise its text through Cohere or any chat model `edgequake-llm` can
//! reach.
//!
//! PDF parsing is left to PDFium (via `pdfium-render`) and summarisation to
//! the remote model. This crate sequences the library calls, finds tables
//! in the positioned text, and converts results into downloadable files
//! (PNG, CSV, plain text).
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    read the file, download the URL, or take bytes; check %PDF
//!  ├─ 2. Text     page text concatenated over the selected pages
//!  ├─ 3. Images   every image object decoded to a DynamicImage
//!  ├─ 4. Tables   aligned text runs → grid → header rule
//!  ├─ 5. Summary  only when a backend is configured and the text is non-blank
//!  └─ 6. Output   ExtractionOutput, artifacts on disk, JSON
//! ```
//!
//! A failing pass never aborts the others: its result is empty and the
//! error lands in [`ExtractionOutput::errors`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_content_extractor::{extract, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .cohere_api_key(std::env::var("COHERE_API_KEY").unwrap_or_default())
//!         .build()?;
//!     let output = extract("document.pdf", &config).await?;
//!     println!("{} chars, {} images, {} tables",
//!         output.text.len(), output.images.len(), output.tables.len());
//!     if let Some(summary) = output.summary.text() {
//!         println!("{summary}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfx` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! PDFium itself is loaded at runtime: set `PDFIUM_LIB_PATH`, place the
//! platform library in the working directory, or install it system-wide.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifacts;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use artifacts::{artifacts, write_artifacts, Artifact};
pub use config::{
    ExtractionConfig, ExtractionConfigBuilder, PageSelection, PassSelection, SummaryBackend,
    SummaryConfig, SummaryExtractiveness, SummaryFormat, SummaryLength, TableSettings,
    MAX_SUMMARY_RETRIES,
};
pub use error::{ExtractError, PassError};
pub use extract::{extract, extract_from_bytes, extract_loaded, extract_sync, extract_to_dir, inspect};
pub use output::{
    DocumentMetadata, ExtractedImage, ExtractedTable, ExtractionOutput, ExtractionStats,
    FileDetails, PassKind, SummaryStatus,
};
pub use pipeline::input::LoadedPdf;
pub use pipeline::summarize::provider_from_name;
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
