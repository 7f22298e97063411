//! Configuration types for PDF content extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The summary backend lives in its own
//! [`SummaryConfig`]; leaving it unset is how a caller opts out of every
//! network call.

use crate::error::ExtractError;
use crate::output::PassKind;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Base URL of the Cohere API.
pub const COHERE_API_BASE: &str = "https://api.cohere.ai";

/// Instruction appended to every summary request unless overridden.
pub const DEFAULT_ADDITIONAL_COMMAND: &str = "Make it comprehensive and highlight key points";

/// Longest input the Cohere summarize endpoint accepts, in characters.
pub const DEFAULT_MAX_SUMMARY_INPUT_CHARS: usize = 100_000;

/// Most summary retries a configuration may request.
pub const MAX_SUMMARY_RETRIES: u32 = 10;

/// Upper bound on a single summary retry delay, in milliseconds.
pub const MAX_RETRY_DELAY_MS: u64 = 60_000;

/// Configuration for one extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_content_extractor::{ExtractionConfig, PageSelection};
///
/// let config = ExtractionConfig::builder()
///     .pages(PageSelection::Range(1, 3))
///     .cohere_api_key("co-...")
///     .build()
///     .unwrap();
/// assert!(config.summary.is_some());
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Which passes run. Default: all four.
    pub passes: PassSelection,

    /// Page selection shared by the text, images and tables passes. Default: all pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Clean up extracted text (line endings, invisible characters, trailing
    /// whitespace, runs of blank lines). Default: true.
    pub normalize_text: bool,

    /// Tuning for the table detector.
    pub tables: TableSettings,

    /// Summary backend and request options. `None` means no summary call is
    /// ever made. Default: None.
    pub summary: Option<SummaryConfig>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-pass progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            passes: PassSelection::default(),
            pages: PageSelection::default(),
            password: None,
            normalize_text: true,
            tables: TableSettings::default(),
            summary: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("passes", &self.passes)
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("normalize_text", &self.normalize_text)
            .field("tables", &self.tables)
            .field("summary", &self.summary)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn passes(mut self, passes: PassSelection) -> Self {
        self.config.passes = passes;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn normalize_text(mut self, v: bool) -> Self {
        self.config.normalize_text = v;
        self
    }

    pub fn tables(mut self, settings: TableSettings) -> Self {
        self.config.tables = settings;
        self
    }

    pub fn summary(mut self, summary: SummaryConfig) -> Self {
        self.config.summary = Some(summary);
        self
    }

    /// Configure the Cohere backend with default request options.
    ///
    /// A blank key leaves the summary unconfigured, the same as never
    /// calling this method.
    pub fn cohere_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.config.summary = if key.trim().is_empty() {
            None
        } else {
            Some(SummaryConfig::cohere(key))
        };
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if !c.passes.any() {
            return Err(ExtractError::InvalidConfig(
                "At least one pass must be enabled".into(),
            ));
        }
        if c.tables.min_columns < 2 {
            return Err(ExtractError::InvalidConfig(format!(
                "Tables need at least 2 columns, got {}",
                c.tables.min_columns
            )));
        }
        if c.tables.min_rows < 1 {
            return Err(ExtractError::InvalidConfig(
                "Tables need at least 1 row".into(),
            ));
        }
        if c.tables.line_tolerance <= 0.0 || c.tables.min_column_gap <= 0.0 {
            return Err(ExtractError::InvalidConfig(
                "Table tolerances must be positive".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(ExtractError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        if let Some(ref s) = c.summary {
            if let SummaryBackend::Cohere { ref api_key, .. } = s.backend {
                if api_key.trim().is_empty() {
                    return Err(ExtractError::InvalidConfig(
                        "Cohere API key must not be blank".into(),
                    ));
                }
            }
            if s.max_input_chars == 0 {
                return Err(ExtractError::InvalidConfig(
                    "Summary input limit must be ≥ 1 character".into(),
                ));
            }
            if s.timeout_secs == 0 {
                return Err(ExtractError::InvalidConfig(
                    "Summary timeout must be ≥ 1 second".into(),
                ));
            }
            if s.max_retries > MAX_SUMMARY_RETRIES {
                return Err(ExtractError::InvalidConfig(format!(
                    "Summary retries must be ≤ {}, got {}",
                    MAX_SUMMARY_RETRIES, s.max_retries
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Passes ───────────────────────────────────────────────────────────────

/// Which extraction passes to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSelection {
    pub text: bool,
    pub images: bool,
    pub tables: bool,
    pub summary: bool,
}

impl Default for PassSelection {
    fn default() -> Self {
        Self {
            text: true,
            images: true,
            tables: true,
            summary: true,
        }
    }
}

impl PassSelection {
    /// A selection with only the given passes enabled.
    pub fn only(passes: &[PassKind]) -> Self {
        Self {
            text: passes.contains(&PassKind::Text),
            images: passes.contains(&PassKind::Images),
            tables: passes.contains(&PassKind::Tables),
            summary: passes.contains(&PassKind::Summary),
        }
    }

    pub fn is_enabled(&self, pass: PassKind) -> bool {
        match pass {
            PassKind::Text => self.text,
            PassKind::Images => self.images,
            PassKind::Tables => self.tables,
            PassKind::Summary => self.summary,
        }
    }

    pub fn any(&self) -> bool {
        self.text || self.images || self.tables || self.summary
    }
}

/// Specifies which pages of the PDF to extract from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSelection {
    /// All pages (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

// ── Tables ───────────────────────────────────────────────────────────────

/// Thresholds for the alignment-based table detector. Distances are in PDF
/// points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableSettings {
    /// Two text runs whose vertical centres differ by at most this much sit
    /// on the same line. Default: 3.0.
    pub line_tolerance: f32,

    /// Runs on one line separated by a wider gap than this start a new cell.
    /// Default: 10.0.
    pub min_column_gap: f32,

    /// Consecutive rows further apart than this multiple of the line height
    /// end the table. Default: 2.5.
    pub max_row_spacing: f32,

    /// Fewest rows (header included) a block needs to count as a table. Default: 2.
    pub min_rows: usize,

    /// Fewest columns a block needs to count as a table. Default: 2.
    pub min_columns: usize,

    /// Blocks whose cells average more characters than this are running text
    /// (multi-column layouts), not tables. Default: 40.0.
    pub max_mean_cell_chars: f32,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            line_tolerance: 3.0,
            min_column_gap: 10.0,
            max_row_spacing: 2.5,
            min_rows: 2,
            min_columns: 2,
            max_mean_cell_chars: 40.0,
        }
    }
}

// ── Summary ──────────────────────────────────────────────────────────────

/// Where summary requests go.
#[derive(Clone)]
pub enum SummaryBackend {
    /// Cohere's `/v1/summarize` endpoint.
    Cohere { api_key: String, base_url: String },
    /// Any chat-completion provider built by `edgequake-llm`.
    Llm(Arc<dyn LLMProvider>),
}

impl fmt::Debug for SummaryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryBackend::Cohere { base_url, .. } => f
                .debug_struct("Cohere")
                .field("api_key", &"<redacted>")
                .field("base_url", base_url)
                .finish(),
            SummaryBackend::Llm(_) => f.write_str("Llm(<dyn LLMProvider>)"),
        }
    }
}

/// Summary request options.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub backend: SummaryBackend,

    /// Approximate summary length. Default: Medium.
    pub length: SummaryLength,

    /// Paragraph or bullet points. Default: Paragraph.
    pub format: SummaryFormat,

    /// How closely the summary reuses sentences from the source. Default: None (API default).
    pub extractiveness: Option<SummaryExtractiveness>,

    /// Model identifier. Default: `"command"` for Cohere; LLM providers use
    /// the model they were built with.
    pub model: String,

    /// Free-form instruction for the summarizer. Default: [`DEFAULT_ADDITIONAL_COMMAND`].
    pub additional_command: Option<String>,

    /// Sampling temperature. Default: None (API default).
    pub temperature: Option<f32>,

    /// Maximum tokens the LLM backend may generate. Default: 1024.
    pub max_tokens: usize,

    /// Longer inputs are truncated. Default: [`DEFAULT_MAX_SUMMARY_INPUT_CHARS`].
    pub max_input_chars: usize,

    /// Per-call timeout in seconds. Default: 60.
    pub timeout_secs: u64,

    /// Retries for rate-limit, timeout and 5xx failures, at most
    /// [`MAX_SUMMARY_RETRIES`]. Default: 0.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled after each attempt. Default: 500.
    pub retry_backoff_ms: u64,
}

impl SummaryConfig {
    /// Cohere backend against the public API with default options.
    pub fn cohere(api_key: impl Into<String>) -> Self {
        Self::with_backend(SummaryBackend::Cohere {
            api_key: api_key.into(),
            base_url: COHERE_API_BASE.to_string(),
        })
    }

    /// LLM-provider backend with default options.
    pub fn llm(provider: Arc<dyn LLMProvider>) -> Self {
        Self::with_backend(SummaryBackend::Llm(provider))
    }

    fn with_backend(backend: SummaryBackend) -> Self {
        Self {
            backend,
            length: SummaryLength::default(),
            format: SummaryFormat::default(),
            extractiveness: None,
            model: "command".to_string(),
            additional_command: Some(DEFAULT_ADDITIONAL_COMMAND.to_string()),
            temperature: None,
            max_tokens: 1024,
            max_input_chars: DEFAULT_MAX_SUMMARY_INPUT_CHARS,
            timeout_secs: 60,
            max_retries: 0,
            retry_backoff_ms: 500,
        }
    }

    /// Point the Cohere backend at another host (proxies, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        if let SummaryBackend::Cohere {
            ref mut base_url, ..
        } = self.backend
        {
            *base_url = url.into();
        }
        self
    }
}

/// Approximate summary length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
    Auto,
}

impl SummaryLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryLength::Short => "short",
            SummaryLength::Medium => "medium",
            SummaryLength::Long => "long",
            SummaryLength::Auto => "auto",
        }
    }
}

/// Shape of the summary text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    #[default]
    Paragraph,
    Bullets,
    Auto,
}

impl SummaryFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryFormat::Paragraph => "paragraph",
            SummaryFormat::Bullets => "bullets",
            SummaryFormat::Auto => "auto",
        }
    }
}

/// How much of the summary is copied verbatim from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryExtractiveness {
    Low,
    Medium,
    High,
    Auto,
}

impl SummaryExtractiveness {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryExtractiveness::Low => "low",
            SummaryExtractiveness::Medium => "medium",
            SummaryExtractiveness::High => "high",
            SummaryExtractiveness::Auto => "auto",
        }
    }
}
