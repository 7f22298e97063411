//! Downloadable files built from an [`ExtractionOutput`].
//!
//! Each artifact corresponds to one download button of the report: the full
//! text, one PNG per image, one CSV per table, and the summary. File names
//! start with the uploaded file's name, e.g. `report.pdf_page2_table_1.csv`.

use crate::error::ExtractError;
use crate::output::{ExtractionOutput, PassKind};
use crate::pipeline::encode;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

static RE_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[/\\\x00-\x1f\x7f]").unwrap());

/// One downloadable file.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub kind: PassKind,
    /// Button label, e.g. `Download Table 1 from Page 2 as CSV`.
    pub label: String,
    pub file_name: String,
    pub mime: &'static str,
    pub data: Vec<u8>,
}

/// Build every artifact the output offers, in report order.
///
/// The text artifact is present only when text was extracted, the summary
/// artifact only when a summary was generated.
pub fn artifacts(output: &ExtractionOutput) -> Result<Vec<Artifact>, ExtractError> {
    let name = &output.file.filename;
    let mut out = Vec::new();

    if !output.text.is_empty() {
        out.push(Artifact {
            kind: PassKind::Text,
            label: "Download Text".to_string(),
            file_name: sanitize_file_name(&format!("{}_text.txt", name)),
            mime: "text/plain",
            data: output.text.as_bytes().to_vec(),
        });
    }

    for image in &output.images {
        let caption = image.caption();
        let file_name = sanitize_file_name(&format!("{}_{}.png", name, caption));
        let data = encode::png_bytes(&image.image).map_err(|e| ExtractError::ArtifactEncodeFailed {
            file_name: file_name.clone(),
            detail: e.to_string(),
        })?;
        out.push(Artifact {
            kind: PassKind::Images,
            label: format!("Download {}", caption),
            file_name,
            mime: "image/png",
            data,
        });
    }

    for table in &output.tables {
        let file_name = sanitize_file_name(&format!(
            "{}_page{}_table_{}.csv",
            name, table.page, table.table_number
        ));
        let data = encode::table_to_csv(table).map_err(|e| ExtractError::ArtifactEncodeFailed {
            file_name: file_name.clone(),
            detail: e.to_string(),
        })?;
        out.push(Artifact {
            kind: PassKind::Tables,
            label: format!(
                "Download Table {} from Page {} as CSV",
                table.table_number, table.page
            ),
            file_name,
            mime: "text/csv",
            data,
        });
    }

    if let Some(summary) = output.summary.text() {
        out.push(Artifact {
            kind: PassKind::Summary,
            label: "Download Summary".to_string(),
            file_name: sanitize_file_name(&format!("{}_summary.txt", name)),
            mime: "text/plain",
            data: summary.as_bytes().to_vec(),
        });
    }

    Ok(out)
}

/// Replace path separators and control characters with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned = RE_UNSAFE.replace_all(name, "_");
    match cleaned.as_ref() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned.into_owned(),
    }
}

/// Write `artifacts` into `dir`, creating it if needed.
///
/// Each file is written to a temporary file in `dir` and then persisted
/// under its final name, so a reader never sees a partial file.
pub fn write_artifacts(artifacts: &[Artifact], dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    std::fs::create_dir_all(dir).map_err(|e| ExtractError::OutputWriteFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = dir.join(&artifact.file_name);
        let write_err = |source| ExtractError::OutputWriteFailed {
            path: path.clone(),
            source,
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&artifact.data).map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        debug!("Wrote {} ({} bytes)", path.display(), artifact.data.len());
        written.push(path);
    }
    Ok(written)
}
