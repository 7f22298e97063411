//! Image pass: decode every image object on the selected pages.
//!
//! `get_raw_image` returns the image's own pixels at its intrinsic size,
//! not the rendered appearance on the page, so captions and downloads match
//! what the document embeds.

use crate::config::PageSelection;
use crate::error::PassError;
use crate::output::{ExtractedImage, PassKind};
use crate::pipeline::document;
use pdfium_render::prelude::*;
use tracing::debug;

/// Decode all image objects on the selected pages, in page order.
///
/// Images are numbered from 1 on each page. Any failure aborts the pass.
pub fn extract_images_blocking(
    pdfium: &Pdfium,
    bytes: &[u8],
    pages: &PageSelection,
    password: Option<&str>,
) -> Result<Vec<ExtractedImage>, PassError> {
    let document = document::open_document(pdfium, bytes, password, PassKind::Images)?;

    let mut images = Vec::new();
    document::for_each_selected_page(&document, pages, PassKind::Images, |page_num, page| {
        let mut index = 0;
        for object in page.objects().iter() {
            let Some(image_object) = object.as_image_object() else {
                continue;
            };
            index += 1;
            let image = image_object
                .get_raw_image()
                .map_err(|e| PassError::PageFailed {
                    pass: PassKind::Images,
                    page: page_num,
                    detail: format!("image {}: {:?}", index, e),
                })?;
            debug!(
                "Page {}: image {} → {}x{} px",
                page_num,
                index,
                image.width(),
                image.height()
            );
            images.push(ExtractedImage {
                page: page_num,
                index,
                image,
            });
        }
        Ok(())
    })?;

    Ok(images)
}
