//! Extraction entry points.
//!
//! One extraction reads the PDF once, then runs the enabled passes in the
//! order Text → Images → Tables → Summary. Each PDFium pass opens the
//! document afresh from the shared buffer inside `spawn_blocking`; a pass
//! that fails contributes an empty result and a [`PassError`], and the next
//! pass still runs.

use crate::artifacts;
use crate::config::{ExtractionConfig, PageSelection, TableSettings};
use crate::error::{ExtractError, PassError};
use crate::output::{
    DocumentMetadata, ExtractedImage, ExtractedTable, ExtractionOutput, ExtractionStats, PassKind,
    SummaryStatus,
};
use crate::pipeline::input::{self, LoadedPdf};
use crate::pipeline::{document, images, summarize, tables, text};
use pdfium_render::prelude::Pdfium;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract text, images, tables and a summary from a PDF file or URL.
///
/// # Arguments
/// * `input`  — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Extraction configuration
///
/// # Returns
/// `Ok(ExtractionOutput)` even when some passes failed; check
/// `output.errors`.
///
/// # Errors
/// Returns `Err(ExtractError)` only for fatal errors:
/// - File not found, permission denied, download failure
/// - Input is empty or not a PDF
/// - PDFium could not be bound
pub async fn extract(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let loaded = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    extract_loaded(loaded, config).await
}

/// Extract from PDF bytes already in memory, e.g. an upload.
///
/// `name` is the file name shown in the report and used for artifact names.
///
/// # Example
/// ```rust,no_run
/// use pdf_content_extractor::{extract_from_bytes, ExtractionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("report.pdf")?;
/// let output = extract_from_bytes("report.pdf", bytes, &ExtractionConfig::default()).await?;
/// println!("{} tables", output.tables.len());
/// # Ok(())
/// # }
/// ```
pub async fn extract_from_bytes(
    name: impl Into<String>,
    bytes: Vec<u8>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let loaded = input::load_bytes(name, bytes)?;
    extract_loaded(loaded, config).await
}

/// Run every enabled pass over a loaded PDF.
pub async fn extract_loaded(
    pdf: LoadedPdf,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    run_passes(Arc::new(PdfiumSource), pdf, config).await
}

async fn run_passes<S: PassSource>(
    source: Arc<S>,
    pdf: LoadedPdf,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let total_start = Instant::now();
    let file = pdf.details();
    info!("Starting extraction: {} ({})", file.filename, file.size_display());

    let bytes: Arc<[u8]> = Arc::from(pdf.bytes);
    let password = config.password.clone();

    // Binding failures surface here, once, instead of once per pass.
    let metadata = {
        let source = Arc::clone(&source);
        let bytes = Arc::clone(&bytes);
        let password = password.clone();
        tokio::task::spawn_blocking(move || source.metadata(&bytes, password.as_deref()))
            .await
            .map_err(|e| ExtractError::Internal(format!("metadata task failed: {}", e)))??
    };

    let total_pages = metadata.as_ref().map_or(0, |m| m.page_count);
    let selected_pages = config.pages.to_indices(total_pages).len();
    let passes_to_run = PassKind::ALL
        .iter()
        .filter(|p| config.passes.is_enabled(**p))
        .count();
    info!(
        "PDF has {} pages, {} selected, {} pass(es) enabled",
        total_pages, selected_pages, passes_to_run
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(passes_to_run, selected_pages);
    }

    let mut runner = PassRunner::new(config);
    let mut stats = ExtractionStats {
        total_pages,
        selected_pages,
        ..Default::default()
    };

    // ── Text ─────────────────────────────────────────────────────────────
    let mut extracted_text = String::new();
    if config.passes.text {
        let (result, ms) = runner
            .run(PassKind::Text, |t: &String| t.chars().count(), {
                let source = Arc::clone(&source);
                let bytes = Arc::clone(&bytes);
                let pages = config.pages.clone();
                let password = password.clone();
                let normalize = config.normalize_text;
                run_blocking(PassKind::Text, move || {
                    source.text(&bytes, &pages, password.as_deref(), normalize)
                })
            })
            .await;
        extracted_text = result.unwrap_or_default();
        stats.text_duration_ms = ms;
    }

    // ── Images ───────────────────────────────────────────────────────────
    let mut extracted_images = Vec::new();
    if config.passes.images {
        let (result, ms) = runner
            .run(PassKind::Images, Vec::len, {
                let source = Arc::clone(&source);
                let bytes = Arc::clone(&bytes);
                let pages = config.pages.clone();
                let password = password.clone();
                run_blocking(PassKind::Images, move || {
                    source.images(&bytes, &pages, password.as_deref())
                })
            })
            .await;
        extracted_images = result.unwrap_or_default();
        stats.images_duration_ms = ms;
    }

    // ── Tables ───────────────────────────────────────────────────────────
    let mut extracted_tables = Vec::new();
    if config.passes.tables {
        let (result, ms) = runner
            .run(PassKind::Tables, Vec::len, {
                let source = Arc::clone(&source);
                let bytes = Arc::clone(&bytes);
                let pages = config.pages.clone();
                let password = password.clone();
                let settings = config.tables;
                run_blocking(PassKind::Tables, move || {
                    source.tables(&bytes, &pages, password.as_deref(), &settings)
                })
            })
            .await;
        extracted_tables = result.unwrap_or_default();
        stats.tables_duration_ms = ms;
    }

    // ── Summary ──────────────────────────────────────────────────────────
    let summary = if config.passes.summary {
        let start = Instant::now();
        runner.start(PassKind::Summary);

        // With the text pass disabled the summary still needs the text; read
        // it without reporting it.
        let text_source = if !config.passes.text && config.summary.is_some() {
            let source = Arc::clone(&source);
            let bytes = Arc::clone(&bytes);
            let pages = config.pages.clone();
            let password = password.clone();
            let normalize = config.normalize_text;
            run_blocking(PassKind::Summary, move || {
                source.text(&bytes, &pages, password.as_deref(), normalize)
            })
            .await
            .map_err(|e| PassError::SummaryFailed {
                detail: format!("could not read text to summarise: {}", e),
            })
        } else {
            Ok(extracted_text.clone())
        };

        let (status, error) = match text_source {
            Ok(text) => summarize::run_summary_pass(&text, config.summary.as_ref()).await,
            Err(e) => (
                SummaryStatus::Failed {
                    message: e.to_string(),
                },
                Some(e),
            ),
        };
        match error {
            Some(e) => runner.fail(e),
            None => runner.complete(
                PassKind::Summary,
                status.text().map_or(0, |t| t.chars().count()),
            ),
        }
        stats.summary_duration_ms = start.elapsed().as_millis() as u64;
        status
    } else {
        SummaryStatus::Skipped
    };

    let errors = runner.errors;
    stats.text_chars = extracted_text.chars().count();
    stats.image_count = extracted_images.len();
    stats.table_count = extracted_tables.len();
    stats.failed_passes = errors.len();
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Extraction complete: {} chars, {} image(s), {} table(s), {} failed pass(es), {}ms",
        stats.text_chars,
        stats.image_count,
        stats.table_count,
        stats.failed_passes,
        stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(passes_to_run, errors.len());
    }

    Ok(ExtractionOutput {
        file,
        metadata,
        text: extracted_text,
        images: extracted_images,
        tables: extracted_tables,
        summary,
        errors,
        stats,
    })
}

/// Extract and write every artifact into `output_dir`.
///
/// Returns the output together with the paths written.
pub async fn extract_to_dir(
    input_str: impl AsRef<str>,
    output_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<(ExtractionOutput, Vec<PathBuf>), ExtractError> {
    let output = extract(input_str, config).await?;
    let dir = output_dir.as_ref().to_path_buf();
    let written = {
        let items = artifacts::artifacts(&output)?;
        tokio::task::spawn_blocking(move || artifacts::write_artifacts(&items, &dir))
            .await
            .map_err(|e| ExtractError::Internal(format!("artifact task failed: {}", e)))??
    };
    info!("Wrote {} artifact(s)", written.len());
    Ok((output, written))
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input_str, config))
}

/// Read document metadata without extracting content.
///
/// Uses the config's password and download timeout; makes no summary call.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<DocumentMetadata, ExtractError> {
    let loaded = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    let name = loaded.name.clone();
    let password = config.password.clone();
    let metadata = tokio::task::spawn_blocking(move || {
        document::load_metadata_blocking(&loaded.bytes, password.as_deref())
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("metadata task failed: {}", e)))??;

    metadata.ok_or_else(|| ExtractError::CorruptPdf {
        name,
        detail: "PDFium could not open the document".to_string(),
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// The blocking work behind each pass.
trait PassSource: Send + Sync + 'static {
    fn metadata(
        &self,
        bytes: &[u8],
        password: Option<&str>,
    ) -> Result<Option<DocumentMetadata>, ExtractError>;

    fn text(
        &self,
        bytes: &[u8],
        pages: &PageSelection,
        password: Option<&str>,
        normalize: bool,
    ) -> Result<String, PassError>;

    fn images(
        &self,
        bytes: &[u8],
        pages: &PageSelection,
        password: Option<&str>,
    ) -> Result<Vec<ExtractedImage>, PassError>;

    fn tables(
        &self,
        bytes: &[u8],
        pages: &PageSelection,
        password: Option<&str>,
        settings: &TableSettings,
    ) -> Result<Vec<ExtractedTable>, PassError>;
}

/// Every pass binds its own pdfium instance.
struct PdfiumSource;

impl PdfiumSource {
    fn with_pdfium<T>(
        pass: PassKind,
        f: impl FnOnce(&Pdfium) -> Result<T, PassError>,
    ) -> Result<T, PassError> {
        let pdfium = document::bind_pdfium().map_err(|e| PassError::LoadFailed {
            pass,
            detail: e.to_string(),
        })?;
        f(&pdfium)
    }
}

impl PassSource for PdfiumSource {
    fn metadata(
        &self,
        bytes: &[u8],
        password: Option<&str>,
    ) -> Result<Option<DocumentMetadata>, ExtractError> {
        document::load_metadata_blocking(bytes, password)
    }

    fn text(
        &self,
        bytes: &[u8],
        pages: &PageSelection,
        password: Option<&str>,
        normalize: bool,
    ) -> Result<String, PassError> {
        Self::with_pdfium(PassKind::Text, |pdfium| {
            text::extract_text_blocking(pdfium, bytes, pages, password, normalize)
        })
    }

    fn images(
        &self,
        bytes: &[u8],
        pages: &PageSelection,
        password: Option<&str>,
    ) -> Result<Vec<ExtractedImage>, PassError> {
        Self::with_pdfium(PassKind::Images, |pdfium| {
            images::extract_images_blocking(pdfium, bytes, pages, password)
        })
    }

    fn tables(
        &self,
        bytes: &[u8],
        pages: &PageSelection,
        password: Option<&str>,
        settings: &TableSettings,
    ) -> Result<Vec<ExtractedTable>, PassError> {
        Self::with_pdfium(PassKind::Tables, |pdfium| {
            tables::extract_tables_blocking(pdfium, bytes, pages, password, settings)
        })
    }
}

/// Run one pass on a blocking thread.
///
/// A panic inside the pass becomes [`PassError::Internal`].
async fn run_blocking<T, F>(pass: PassKind, f: F) -> Result<T, PassError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PassError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PassError::Internal {
            pass,
            detail: format!("task failed: {}", e),
        })?
}

/// Fires progress events, logs outcomes and collects pass errors.
struct PassRunner<'a> {
    config: &'a ExtractionConfig,
    errors: Vec<PassError>,
}

impl<'a> PassRunner<'a> {
    fn new(config: &'a ExtractionConfig) -> Self {
        Self {
            config,
            errors: Vec::new(),
        }
    }

    fn start(&self, pass: PassKind) {
        debug!("{}: starting", pass);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_pass_start(pass);
        }
    }

    fn complete(&self, pass: PassKind, items: usize) {
        debug!("{}: done, {} item(s)", pass, items);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_pass_complete(pass, items);
        }
    }

    fn fail(&mut self, error: PassError) {
        warn!("{}", error);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_pass_error(error.pass(), &error.to_string());
        }
        self.errors.push(error);
    }

    /// Await one pass; returns its result (or `None` on failure) and duration.
    async fn run<T>(
        &mut self,
        pass: PassKind,
        count: impl Fn(&T) -> usize,
        fut: impl std::future::Future<Output = Result<T, PassError>>,
    ) -> (Option<T>, u64) {
        let start = Instant::now();
        self.start(pass);
        let result = match fut.await {
            Ok(value) => {
                self.complete(pass, count(&value));
                Some(value)
            }
            Err(e) => {
                self.fail(e);
                None
            }
        };
        (result, start.elapsed().as_millis() as u64)
    }
}
