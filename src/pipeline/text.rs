//! Text pass: the concatenated text of every selected page.

use crate::config::PageSelection;
use crate::error::PassError;
use crate::output::PassKind;
use crate::pipeline::{document, postprocess};
use pdfium_render::prelude::*;
use tracing::debug;

/// Extract the text of the selected pages.
///
/// Pages are appended in order; a newline is inserted between two pages when
/// the earlier one does not already end with one, so the last line of a page
/// never runs into the first line of the next.
pub fn extract_text_blocking(
    pdfium: &Pdfium,
    bytes: &[u8],
    pages: &PageSelection,
    password: Option<&str>,
    normalize: bool,
) -> Result<String, PassError> {
    let document = document::open_document(pdfium, bytes, password, PassKind::Text)?;

    let mut text = String::new();
    document::for_each_selected_page(&document, pages, PassKind::Text, |page_num, page| {
        let page_text = page
            .text()
            .map_err(|e| PassError::PageFailed {
                pass: PassKind::Text,
                page: page_num,
                detail: format!("{:?}", e),
            })?
            .all();
        debug!("Page {}: {} chars of text", page_num, page_text.chars().count());
        append_page(&mut text, &page_text);
        Ok(())
    })?;

    Ok(if normalize {
        postprocess::normalize_text(&text)
    } else {
        text
    })
}

fn append_page(text: &mut String, page_text: &str) {
    if page_text.is_empty() {
        return;
    }
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(page_text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_separated_by_newline() {
        let mut text = String::new();
        append_page(&mut text, "first page");
        append_page(&mut text, "second page\n");
        append_page(&mut text, "third");
        assert_eq!(text, "first page\nsecond page\nthird");
    }

    #[test]
    fn empty_pages_add_nothing() {
        let mut text = String::new();
        append_page(&mut text, "");
        append_page(&mut text, "only");
        append_page(&mut text, "");
        assert_eq!(text, "only");
    }
}
