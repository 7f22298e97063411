//! PDFium access: bind the library, open documents from memory, read metadata.
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and blocks. Every function here is synchronous and is called from
//! inside `tokio::task::spawn_blocking` by the pass runners.

use crate::config::PageSelection;
use crate::error::{ExtractError, PassError};
use crate::output::{DocumentMetadata, PassKind};
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Environment variable naming an existing pdfium shared library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to a pdfium library.
///
/// Resolution order: `PDFIUM_LIB_PATH`, a platform library in the working
/// directory, then the system library search path.
pub fn bind_pdfium() -> Result<Pdfium, ExtractError> {
    if let Ok(path) = std::env::var(PDFIUM_LIB_PATH_ENV) {
        if !path.is_empty() {
            let path = PathBuf::from(path);
            return Pdfium::bind_to_library(&path)
                .map(Pdfium::new)
                .map_err(|e| {
                    ExtractError::PdfiumBindingFailed(format!("{}: {:?}", path.display(), e))
                });
        }
    }

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| ExtractError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

/// Open a document from memory for `pass`, classifying password failures.
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    bytes: &'a [u8],
    password: Option<&'a str>,
    pass: PassKind,
) -> Result<PdfDocument<'a>, PassError> {
    pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| classify_load_error(&format!("{:?}", e), password.is_some(), pass))
}

fn classify_load_error(detail: &str, password_given: bool, pass: PassKind) -> PassError {
    if detail.contains("Password") || detail.contains("password") {
        if password_given {
            PassError::WrongPassword { pass }
        } else {
            PassError::PasswordRequired { pass }
        }
    } else {
        PassError::LoadFailed {
            pass,
            detail: detail.to_string(),
        }
    }
}

/// Visit every selected page in order, passing its 1-indexed number.
///
/// Returns the number of pages visited.
pub fn for_each_selected_page<F>(
    document: &PdfDocument<'_>,
    selection: &PageSelection,
    pass: PassKind,
    mut visit: F,
) -> Result<usize, PassError>
where
    F: FnMut(usize, &PdfPage<'_>) -> Result<(), PassError>,
{
    let pages = document.pages();
    let total = pages.len() as usize;
    let indices = selection.to_indices(total);

    for &idx in &indices {
        let page = pages
            .get(idx as u16)
            .map_err(|e| PassError::PageFailed {
                pass,
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;
        visit(idx + 1, &page)?;
    }

    debug!("{}: visited {}/{} pages", pass, indices.len(), total);
    Ok(indices.len())
}

/// Read document metadata from an open document.
pub fn read_metadata(document: &PdfDocument<'_>) -> DocumentMetadata {
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    }
}

/// Bind pdfium, open `bytes` and read its metadata.
///
/// Binding failures are fatal. A document that cannot be opened yields
/// `Ok(None)`; each pass then reports its own load error.
pub fn load_metadata_blocking(
    bytes: &[u8],
    password: Option<&str>,
) -> Result<Option<DocumentMetadata>, ExtractError> {
    let pdfium = bind_pdfium()?;
    let metadata = match pdfium.load_pdf_from_byte_slice(bytes, password) {
        Ok(document) => Some(read_metadata(&document)),
        Err(e) => {
            warn!("Could not read document metadata: {:?}", e);
            None
        }
    };
    Ok(metadata)
}
