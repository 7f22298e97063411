//! Result types produced by an extraction.
//!
//! [`ExtractionOutput`] carries everything one run produced: the file
//! details, the text, the decoded images, the detected tables, the summary
//! status, and the non-fatal errors of any pass that failed.

use crate::error::PassError;
use crate::pipeline::encode;
use image::DynamicImage;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// One kind of content retrieved from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassKind {
    Text,
    Images,
    Tables,
    Summary,
}

impl PassKind {
    /// All passes in the order they run.
    pub const ALL: [PassKind; 4] = [
        PassKind::Text,
        PassKind::Images,
        PassKind::Tables,
        PassKind::Summary,
    ];
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PassKind::Text => "text",
            PassKind::Images => "images",
            PassKind::Tables => "tables",
            PassKind::Summary => "summary",
        };
        f.pad(name)
    }
}

/// What the user uploaded, as shown before any extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDetails {
    pub filename: String,
    pub file_type: String,
    pub size_bytes: u64,
}

impl FileDetails {
    /// Human-readable size, e.g. `"12.50 KB"`.
    pub fn size_display(&self) -> String {
        format!("{:.2} KB", self.size_bytes as f64 / 1024.0)
    }
}

/// PDF document metadata, read without extracting content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// An image object found on a page.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// 1-indexed page number.
    pub page: usize,
    /// 1-indexed position among the images of that page.
    pub index: usize,
    pub image: DynamicImage,
}

impl ExtractedImage {
    /// Display caption, e.g. `"Page 2, Image 1"`.
    pub fn caption(&self) -> String {
        format!("Page {}, Image {}", self.page, self.index)
    }
}

impl Serialize for ExtractedImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct ImageRecord<'a> {
            caption: String,
            page: usize,
            index: usize,
            width: u32,
            height: u32,
            mime_type: &'a str,
            data: String,
        }

        let data = encode::png_base64(&self.image).map_err(serde::ser::Error::custom)?;
        ImageRecord {
            caption: self.caption(),
            page: self.page,
            index: self.index,
            width: self.image.width(),
            height: self.image.height(),
            mime_type: "image/png",
            data,
        }
        .serialize(serializer)
    }
}

/// A table detected on a page.
///
/// Every row in `rows` has exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTable {
    /// 1-indexed page number.
    pub page: usize,
    /// 1-indexed position among the tables of that page.
    pub table_number: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// `true` when the first detected row became the column names.
    pub header_detected: bool,
}

impl ExtractedTable {
    /// Display caption, e.g. `"Table 1 (Page 3)"`.
    pub fn caption(&self) -> String {
        format!("Table {} (Page {})", self.table_number, self.page)
    }
}

/// Outcome of the summary pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryStatus {
    /// The backend returned a summary.
    Generated { text: String },
    /// No summary backend (API key) was configured; no call was made.
    NotConfigured,
    /// A backend was configured but there was no text to summarise.
    NoText,
    /// The call failed; the error is also recorded in `ExtractionOutput::errors`.
    Failed { message: String },
    /// The summary pass was disabled.
    Skipped,
}

impl SummaryStatus {
    /// The summary text, if one was generated.
    pub fn text(&self) -> Option<&str> {
        match self {
            SummaryStatus::Generated { text } => Some(text),
            _ => None,
        }
    }
}

/// Timing and counts for one extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages visited by the extraction passes.
    pub selected_pages: usize,
    pub text_chars: usize,
    pub image_count: usize,
    pub table_count: usize,
    pub failed_passes: usize,
    pub text_duration_ms: u64,
    pub images_duration_ms: u64,
    pub tables_duration_ms: u64,
    pub summary_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything one extraction produced.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutput {
    pub file: FileDetails,
    /// `None` when the document could not be opened to read metadata.
    pub metadata: Option<DocumentMetadata>,
    /// Concatenated page text; empty if the text pass failed or was disabled.
    pub text: String,
    pub images: Vec<ExtractedImage>,
    pub tables: Vec<ExtractedTable>,
    pub summary: SummaryStatus,
    /// Non-fatal errors, one per failed pass.
    pub errors: Vec<PassError>,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// The error recorded for `pass`, if that pass failed.
    pub fn error_for(&self, pass: PassKind) -> Option<&PassError> {
        self.errors.iter().find(|e| e.pass() == pass)
    }

    /// Whether every pass that ran succeeded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn size_display_two_decimals() {
        let details = FileDetails {
            filename: "a.pdf".into(),
            file_type: "application/pdf".into(),
            size_bytes: 12_800,
        };
        assert_eq!(details.size_display(), "12.50 KB");
    }

    #[test]
    fn captions() {
        let img = ExtractedImage {
            page: 2,
            index: 1,
            image: DynamicImage::ImageRgba8(RgbaImage::new(1, 1)),
        };
        assert_eq!(img.caption(), "Page 2, Image 1");

        let table = ExtractedTable {
            page: 3,
            table_number: 1,
            columns: vec!["A".into()],
            rows: vec![],
            header_detected: true,
        };
        assert_eq!(table.caption(), "Table 1 (Page 3)");
    }

    #[test]
    fn image_serialises_as_base64_png() {
        let img = ExtractedImage {
            page: 1,
            index: 1,
            image: DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 3, Rgba([0, 0, 255, 255]))),
        };
        let value = serde_json::to_value(&img).expect("serialise");
        assert_eq!(value["caption"], "Page 1, Image 1");
        assert_eq!(value["width"], 4);
        assert_eq!(value["height"], 3);
        assert_eq!(value["mime_type"], "image/png");
        assert!(!value["data"].as_str().unwrap_or_default().is_empty());
    }

    #[test]
    fn summary_status_is_tagged() {
        let json = serde_json::to_string(&SummaryStatus::NotConfigured).expect("serialise");
        assert_eq!(json, r#"{"status":"not_configured"}"#);
        assert_eq!(
            SummaryStatus::Generated { text: "x".into() }.text(),
            Some("x")
        );
        assert_eq!(SummaryStatus::NoText.text(), None);
    }
}
