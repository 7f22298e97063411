//! Input resolution: turn a user-supplied path, URL or byte buffer into a
//! [`LoadedPdf`].
//!
//! Every extraction pass reads from the same immutable buffer, so the document
//! is read or downloaded exactly once. The `%PDF` header is checked here so
//! callers get a meaningful error instead of one failure per pass.

use crate::error::ExtractError;
use crate::output::FileDetails;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// PDF readers accept the header anywhere in the first kilobyte.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// A PDF held in memory together with the name it was uploaded under.
#[derive(Clone)]
pub struct LoadedPdf {
    /// File name used for display and artifact naming, e.g. `report.pdf`.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl LoadedPdf {
    /// The details shown before extraction starts.
    pub fn details(&self) -> FileDetails {
        FileDetails {
            filename: self.name.clone(),
            file_type: "application/pdf".to_string(),
            size_bytes: self.bytes.len() as u64,
        }
    }
}

impl std::fmt::Debug for LoadedPdf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPdf")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an in-memory PDF.
///
/// If the input is a URL, download it. If the input is a local file, read it.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<LoadedPdf, ExtractError> {
    if input.trim().is_empty() {
        return Err(ExtractError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

/// Wrap caller-provided bytes, validating that they look like a PDF.
pub fn load_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<LoadedPdf, ExtractError> {
    let name = name.into();
    validate_pdf_header(&name, &bytes)?;
    Ok(LoadedPdf { name, bytes })
}

/// Reject empty buffers and buffers without a `%PDF` header.
pub fn validate_pdf_header(name: &str, bytes: &[u8]) -> Result<(), ExtractError> {
    if bytes.is_empty() {
        return Err(ExtractError::EmptyInput {
            name: name.to_string(),
        });
    }
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    if window.windows(4).any(|w| w == b"%PDF") {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    Err(ExtractError::NotAPdf {
        name: name.to_string(),
        magic,
    })
}

/// Read a local file, mapping I/O failures to input errors.
async fn read_local(path: &Path) -> Result<LoadedPdf, ExtractError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ExtractError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    let name = file_name_of(path);
    validate_pdf_header(&name, &bytes)?;
    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(LoadedPdf { name, bytes })
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(path).to_string_lossy().into_owned())
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<LoadedPdf, ExtractError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ExtractError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ExtractError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                ExtractError::DownloadTimeout {
                    url: url.to_string(),
                    secs: timeout_secs,
                }
            } else {
                ExtractError::DownloadFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?
        .to_vec();

    let name = filename_from_url(url);
    validate_pdf_header(&name, &bytes)?;
    info!("Downloaded {} ({} bytes)", name, bytes.len());

    Ok(LoadedPdf { name, bytes })
}

/// Extract a reasonable filename from the URL path.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_from_url_path() {
        assert_eq!(filename_from_url("https://example.com/a/report.pdf"), "report.pdf");
        assert_eq!(filename_from_url("https://example.com/pdf/1706"), "downloaded.pdf");
        assert_eq!(filename_from_url("not a url"), "downloaded.pdf");
    }

    #[test]
    fn header_validation() {
        assert!(validate_pdf_header("a.pdf", b"%PDF-1.7\n...").is_ok());
        // Leading junk before the header is tolerated.
        assert!(validate_pdf_header("a.pdf", b"\xEF\xBB\xBF%PDF-1.4").is_ok());

        match validate_pdf_header("notes.txt", b"hello world") {
            Err(ExtractError::NotAPdf { name, magic }) => {
                assert_eq!(name, "notes.txt");
                assert_eq!(&magic, b"hell");
            }
            other => panic!("expected NotAPdf, got {other:?}"),
        }
        assert!(matches!(
            validate_pdf_header("empty.pdf", b""),
            Err(ExtractError::EmptyInput { .. })
        ));
    }

    #[test]
    fn details_report_size_and_type() {
        let pdf = load_bytes("report.pdf", b"%PDF-1.4 body".to_vec()).expect("valid");
        let details = pdf.details();
        assert_eq!(details.filename, "report.pdf");
        assert_eq!(details.file_type, "application/pdf");
        assert_eq!(details.size_bytes, 13);
    }

    #[tokio::test]
    async fn missing_local_file() {
        let err = resolve_input("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn local_file_is_read_with_its_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sample.pdf");
        std::fs::write(&path, b"%PDF-1.5\n%%EOF").expect("write");
        let pdf = resolve_input(path.to_str().expect("utf-8 path"), 5)
            .await
            .expect("resolves");
        assert_eq!(pdf.name, "sample.pdf");
        assert_eq!(pdf.bytes, b"%PDF-1.5\n%%EOF");
    }
}
