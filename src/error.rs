//! Error types for the pdf-content-extractor library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: nothing can be extracted at all (missing
//!   file, not a PDF, PDFium unavailable, invalid configuration). Returned as
//!   `Err(ExtractError)` from the top-level `extract*` functions.
//!
//! * [`PassError`] — **Non-fatal**: one extraction pass failed (text, images,
//!   tables or summary). The pass contributes an empty result, the error is
//!   recorded in [`crate::output::ExtractionOutput::errors`], and every other
//!   pass still runs.

use crate::output::PassKind;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-content-extractor library.
///
/// Pass-level failures use [`PassError`] and are stored in
/// [`crate::output::ExtractionOutput`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The input contained no bytes at all.
    #[error("'{name}' is empty")]
    EmptyInput { name: String },

    /// The bytes were read, but they are not a PDF.
    #[error("'{name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: [u8; 4] },

    /// The document could not be opened at all (used by `inspect`).
    #[error("PDF '{name}' could not be opened: {detail}")]
    CorruptPdf { name: String, detail: String },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium for your platform, or point PDFIUM_LIB_PATH at an\n\
existing copy (pre-built binaries: https://github.com/bblanchon/pdfium-binaries).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Summary backend errors ────────────────────────────────────────────
    /// A named LLM provider could not be created (unknown name, missing key).
    #[error("Summary provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an artifact file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An image or table could not be encoded for download.
    #[error("Failed to encode '{file_name}': {detail}")]
    ArtifactEncodeFailed { file_name: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single extraction pass.
///
/// The pass that produced it yields an empty result; the rest of the
/// extraction continues.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PassError {
    /// PDFium could not open the document for this pass.
    #[error("Error extracting {pass}: document could not be opened: {detail}")]
    LoadFailed { pass: PassKind, detail: String },

    /// The document is encrypted and no password was supplied.
    #[error("Error extracting {pass}: the PDF is encrypted and requires a password")]
    PasswordRequired { pass: PassKind },

    /// A password was supplied but PDFium rejected it.
    #[error("Error extracting {pass}: wrong password")]
    WrongPassword { pass: PassKind },

    /// A page-level library call failed.
    #[error("Error extracting {pass}: page {page}: {detail}")]
    PageFailed {
        pass: PassKind,
        page: usize,
        detail: String,
    },

    /// The summarization API rejected the credentials (401/403).
    #[error("Error with summary API: authentication failed: {detail}")]
    SummaryAuth { detail: String },

    /// The summarization API returned HTTP 429.
    #[error("Error with summary API: rate limit exceeded")]
    SummaryRateLimited { retry_after_secs: Option<u64> },

    /// The summarization call did not finish in time.
    #[error("Error with summary API: timed out after {secs}s")]
    SummaryTimeout { secs: u64 },

    /// The summarization API answered with a 5xx status.
    #[error("Error with summary API: server error {status}: {detail}")]
    SummaryServerError { status: u16, detail: String },

    /// Any other summarization failure (transport, API error, bad response).
    #[error("Error with summary API: {detail}")]
    SummaryFailed { detail: String },

    /// The blocking task running a pass panicked or was cancelled.
    #[error("Error extracting {pass}: {detail}")]
    Internal { pass: PassKind, detail: String },
}

impl PassError {
    /// The pass this error belongs to.
    pub fn pass(&self) -> PassKind {
        match self {
            PassError::LoadFailed { pass, .. }
            | PassError::PasswordRequired { pass }
            | PassError::WrongPassword { pass }
            | PassError::PageFailed { pass, .. }
            | PassError::Internal { pass, .. } => *pass,
            PassError::SummaryAuth { .. }
            | PassError::SummaryRateLimited { .. }
            | PassError::SummaryTimeout { .. }
            | PassError::SummaryServerError { .. }
            | PassError::SummaryFailed { .. } => PassKind::Summary,
        }
    }

    /// Whether retrying the same summarization call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PassError::SummaryRateLimited { .. }
                | PassError::SummaryTimeout { .. }
                | PassError::SummaryServerError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_failed_display_names_pass_and_page() {
        let e = PassError::PageFailed {
            pass: PassKind::Images,
            page: 3,
            detail: "bad stream".into(),
        };
        let msg = e.to_string();
        assert!(msg.starts_with("Error extracting images"), "got: {msg}");
        assert!(msg.contains("page 3"));
        assert!(msg.contains("bad stream"));
    }

    #[test]
    fn summary_errors_belong_to_summary_pass() {
        let e = PassError::SummaryAuth {
            detail: "invalid api token".into(),
        };
        assert_eq!(e.pass(), PassKind::Summary);
        assert!(e.to_string().contains("invalid api token"));
        assert!(!e.is_transient());
    }

    #[test]
    fn rate_limit_is_transient() {
        let e = PassError::SummaryRateLimited {
            retry_after_secs: Some(30),
        };
        assert!(e.is_transient());
        assert_eq!(e.pass(), PassKind::Summary);
    }

    #[test]
    fn not_a_pdf_display() {
        let e = ExtractError::NotAPdf {
            name: "notes.txt".into(),
            magic: *b"hell",
        };
        assert!(e.to_string().contains("notes.txt"));
    }

    #[test]
    fn pass_error_serialises() {
        let e = PassError::LoadFailed {
            pass: PassKind::Tables,
            detail: "xref".into(),
        };
        let json = serde_json::to_string(&e).expect("serialise");
        assert!(json.contains("LoadFailed"));
        assert!(json.contains("Tables"));
    }
}
