//! CLI binary for pdf-content-extractor.
//!
//! Maps flags onto `ExtractionConfig`, prints one report section per content
//! kind (Text, Images, Tables, Summary) and optionally writes the
//! downloadable artifacts to a directory.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_content_extractor::{
    artifacts, extract, inspect, provider_from_name, write_artifacts, ExtractionConfig,
    ExtractionOutput, ExtractionProgressCallback, PageSelection, PassKind, PassSelection,
    ProgressCallback, SummaryConfig, SummaryExtractiveness, SummaryFormat, SummaryLength,
    SummaryStatus,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Characters of text shown in the report unless `--full-text` is given.
const TEXT_PREVIEW_CHARS: usize = 2000;

// ── ANSI colour helpers ──────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────

/// Spinner with one log line per finished pass.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            started: Mutex::new(None),
        })
    }

    fn elapsed(&self) -> String {
        let secs = self
            .started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, passes: usize, pages: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting {passes} pass(es) over {pages} page(s)…"))
        ));
    }

    fn on_pass_start(&self, pass: PassKind) {
        if let Ok(mut s) = self.started.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_prefix("Extracting");
        self.bar.set_message(pass.to_string());
    }

    fn on_pass_complete(&self, pass: PassKind, items: usize) {
        let unit = match pass {
            PassKind::Text | PassKind::Summary => "chars",
            PassKind::Images => "images",
            PassKind::Tables => "tables",
        };
        self.bar.println(format!(
            "  {} {:<8} {}  {}",
            green("✓"),
            pass,
            dim(&format!("{items:>6} {unit}")),
            self.elapsed()
        ));
    }

    fn on_pass_error(&self, pass: PassKind, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<8} {}  {}",
            red("✗"),
            pass,
            red(&msg),
            self.elapsed()
        ));
    }

    fn on_extraction_complete(&self, passes: usize, failed: usize) {
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!("{} {} pass(es) completed", green("✔"), bold(&passes.to_string()));
        } else {
            eprintln!(
                "{} {}/{} pass(es) completed  ({} failed)",
                cyan("⚠"),
                bold(&(passes - failed).to_string()),
                passes,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Text, images and tables (no summary without a key)
  pdfx report.pdf

  # Also summarise with Cohere
  COHERE_API_KEY=... pdfx report.pdf

  # Save every download (text, PNGs, CSVs, summary) into a directory
  pdfx report.pdf --output-dir out/

  # Only tables from pages 3-5
  pdfx --passes tables --pages 3-5 report.pdf

  # Summarise with another provider
  pdfx --summary-provider openai --summary-model gpt-4.1-nano report.pdf

  # Whole extraction as JSON (images as base64 PNG)
  pdfx --json report.pdf > report.json

  # Document metadata only
  pdfx --inspect-only report.pdf

ENVIRONMENT VARIABLES:
  COHERE_API_KEY      Cohere API key (enables the summary)
  OPENAI_API_KEY      Used with --summary-provider openai (likewise for others)
  PDFIUM_LIB_PATH     Path to an existing libpdfium
  RUST_LOG            Override log filtering (e.g. pdf_content_extractor=debug)
"#;

/// Extract text, images, tables and a summary from a PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pdfx",
    version,
    about = "Extract text, images, tables and an AI summary from a PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write the downloadable artifacts into this directory.
    #[arg(short, long, env = "PDFX_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDFX_PAGES", default_value = "all")]
    pages: String,

    /// Passes to run, comma separated.
    #[arg(
        long,
        env = "PDFX_PASSES",
        value_enum,
        value_delimiter = ',',
        default_value = "text,images,tables,summary"
    )]
    passes: Vec<PassArg>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFX_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Cohere API key; enables the summary.
    #[arg(long, env = "COHERE_API_KEY", hide_env_values = true)]
    cohere_api_key: Option<String>,

    /// Summarise with this edgequake-llm provider instead of Cohere
    /// (openai, anthropic, gemini, ollama, ...).
    #[arg(long, env = "PDFX_SUMMARY_PROVIDER")]
    summary_provider: Option<String>,

    /// Model for the summary backend. Default: command (Cohere), gpt-4.1-nano (providers).
    #[arg(long, env = "PDFX_SUMMARY_MODEL")]
    summary_model: Option<String>,

    /// Summary length.
    #[arg(long, env = "PDFX_SUMMARY_LENGTH", value_enum, default_value = "medium")]
    summary_length: LengthArg,

    /// Summary format.
    #[arg(long, env = "PDFX_SUMMARY_FORMAT", value_enum, default_value = "paragraph")]
    summary_format: FormatArg,

    /// How much the summary reuses source sentences (Cohere only).
    #[arg(long, env = "PDFX_SUMMARY_EXTRACTIVENESS", value_enum)]
    summary_extractiveness: Option<ExtractivenessArg>,

    /// Sampling temperature for the summary.
    #[arg(long, env = "PDFX_SUMMARY_TEMPERATURE")]
    summary_temperature: Option<f32>,

    /// Retries on rate-limit, timeout or 5xx summary errors.
    #[arg(long, env = "PDFX_SUMMARY_RETRIES", default_value_t = 0)]
    summary_retries: u32,

    /// Summary call timeout in seconds.
    #[arg(long, env = "PDFX_SUMMARY_TIMEOUT", default_value_t = 60)]
    summary_timeout: u64,

    /// Keep the raw PDFium text (no whitespace cleanup).
    #[arg(long, env = "PDFX_RAW_TEXT")]
    raw_text: bool,

    /// Print the whole text instead of a preview.
    #[arg(long, env = "PDFX_FULL_TEXT")]
    full_text: bool,

    /// Output structured JSON (ExtractionOutput) instead of the report.
    #[arg(long, env = "PDFX_JSON")]
    json: bool,

    /// Print PDF metadata only, no extraction.
    #[arg(long, env = "PDFX_INSPECT_ONLY")]
    inspect_only: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDFX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the requested results.
    #[arg(short, long, env = "PDFX_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFX_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq)]
enum PassArg {
    Text,
    Images,
    Tables,
    Summary,
}

impl From<PassArg> for PassKind {
    fn from(v: PassArg) -> Self {
        match v {
            PassArg::Text => PassKind::Text,
            PassArg::Images => PassKind::Images,
            PassArg::Tables => PassKind::Tables,
            PassArg::Summary => PassKind::Summary,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LengthArg {
    Short,
    Medium,
    Long,
    Auto,
}

impl From<LengthArg> for SummaryLength {
    fn from(v: LengthArg) -> Self {
        match v {
            LengthArg::Short => SummaryLength::Short,
            LengthArg::Medium => SummaryLength::Medium,
            LengthArg::Long => SummaryLength::Long,
            LengthArg::Auto => SummaryLength::Auto,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Paragraph,
    Bullets,
    Auto,
}

impl From<FormatArg> for SummaryFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Paragraph => SummaryFormat::Paragraph,
            FormatArg::Bullets => SummaryFormat::Bullets,
            FormatArg::Auto => SummaryFormat::Auto,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ExtractivenessArg {
    Low,
    Medium,
    High,
    Auto,
}

impl From<ExtractivenessArg> for SummaryExtractiveness {
    fn from(v: ExtractivenessArg) -> Self {
        match v {
            ExtractivenessArg::Low => SummaryExtractiveness::Low,
            ExtractivenessArg::Medium => SummaryExtractiveness::Medium,
            ExtractivenessArg::High => SummaryExtractiveness::High,
            ExtractivenessArg::Auto => SummaryExtractiveness::Auto,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already reports each pass; library INFO logs would
    // interleave with it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let mut builder = ExtractionConfig::builder().download_timeout_secs(cli.download_timeout);
        if let Some(ref pwd) = cli.password {
            builder = builder.password(pwd);
        }
        let config = builder.build().context("Invalid configuration")?;
        let meta = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            let fields = [
                ("Title:", &meta.title),
                ("Author:", &meta.author),
                ("Subject:", &meta.subject),
                ("Creator:", &meta.creator),
                ("Producer:", &meta.producer),
                ("Created:", &meta.creation_date),
                ("Modified:", &meta.modification_date),
            ];
            for (label, value) in fields {
                if let Some(v) = value {
                    println!("{label:<13} {v}");
                }
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run extraction ───────────────────────────────────────────────────
    let output = extract(&cli.input, &config)
        .await
        .context("Extraction failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let stdout = io::stdout();
        write_report(&mut stdout.lock(), &output, &cli.passes, cli.full_text)
            .context("Failed to write report")?;
    }

    // Pass errors never abort the run; they are reported on stderr.
    for error in &output.errors {
        eprintln!("{}", red(&error.to_string()));
    }

    if let Some(ref dir) = cli.output_dir {
        let items = artifacts(&output).context("Failed to prepare downloads")?;
        let written = write_artifacts(&items, dir)
            .with_context(|| format!("Failed to write artifacts to {}", dir.display()))?;
        if !cli.quiet {
            eprintln!(
                "{}  {} file(s)  →  {}",
                green("✔"),
                written.len(),
                bold(&dir.display().to_string())
            );
        }
    }

    if !cli.quiet && !show_progress {
        eprintln!(
            "Extracted {} chars, {} image(s), {} table(s) from {}/{} pages in {}ms",
            output.stats.text_chars,
            output.stats.image_count,
            output.stats.table_count,
            output.stats.selected_pages,
            output.stats.total_pages,
            output.stats.total_duration_ms
        );
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let passes: Vec<PassKind> = cli.passes.iter().map(|p| (*p).into()).collect();

    let mut builder = ExtractionConfig::builder()
        .passes(PassSelection::only(&passes))
        .pages(parse_pages(&cli.pages)?)
        .normalize_text(!cli.raw_text)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(summary) = summary_config(cli)? {
        builder = builder.summary(summary);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// The summary backend: a named provider wins over a Cohere key; neither
/// means no summary call. Nothing is built unless the summary pass runs.
fn summary_config(cli: &Cli) -> Result<Option<SummaryConfig>> {
    if !cli.passes.contains(&PassArg::Summary) {
        return Ok(None);
    }
    let mut summary = if let Some(ref name) = cli.summary_provider {
        let model = cli.summary_model.as_deref().unwrap_or("gpt-4.1-nano");
        let provider = provider_from_name(name, model)
            .with_context(|| format!("Failed to create summary provider '{name}'"))?;
        let mut s = SummaryConfig::llm(provider);
        s.model = model.to_string();
        s
    } else {
        match cli.cohere_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {
                let mut s = SummaryConfig::cohere(key);
                if let Some(ref model) = cli.summary_model {
                    s.model = model.clone();
                }
                s
            }
            _ => return Ok(None),
        }
    };

    summary.length = cli.summary_length.into();
    summary.format = cli.summary_format.into();
    summary.extractiveness = cli.summary_extractiveness.map(Into::into);
    summary.temperature = cli.summary_temperature;
    summary.max_retries = cli.summary_retries;
    summary.timeout_secs = cli.summary_timeout;
    Ok(Some(summary))
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;
        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }
        return Ok(PageSelection::Range(start, end));
    }

    if s.contains(',') {
        let pages = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;
        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }
        return Ok(PageSelection::Set(pages));
    }

    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }
    Ok(PageSelection::Single(page))
}

// ── Report ───────────────────────────────────────────────────────────────

/// No-images message for the Images section.
const NO_IMAGES_MESSAGE: &str = "No images found in the PDF.";

/// No-tables message for the Tables section.
const NO_TABLES_MESSAGE: &str = "No tables found in the PDF. Table detection may not work on all PDF types.\n\
For complex tables, you might need to use alternative methods.";

/// Summary prompt shown when no backend is configured.
const NOT_CONFIGURED_MESSAGE: &str =
    "Enter a Cohere API key (--cohere-api-key or COHERE_API_KEY) to generate a summary.";

/// Summary message when there was no text to summarise.
const NO_TEXT_MESSAGE: &str = "No text was extracted, so there is nothing to summarise.";

fn heading(out: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", bold(&format!("── {title} ")))
}

/// Write one section per requested pass. A pass that failed gets its heading
/// only; its error is printed to stderr afterwards.
fn write_report(
    out: &mut impl Write,
    output: &ExtractionOutput,
    passes: &[PassArg],
    full_text: bool,
) -> io::Result<()> {
    writeln!(out, "{}", bold("📄 PDF Content Extractor"))?;
    writeln!(out, "  Filename:   {}", output.file.filename)?;
    writeln!(out, "  File type:  {}", output.file.file_type)?;
    writeln!(out, "  File size:  {}", output.file.size_display())?;

    if passes.contains(&PassArg::Text) {
        heading(out, "Extracted Text")?;
        if output.error_for(PassKind::Text).is_none() {
            write_text(out, &output.text, full_text)?;
        }
    }

    if passes.contains(&PassArg::Images) {
        heading(out, "Extracted Images")?;
        if output.images.is_empty() && output.error_for(PassKind::Images).is_none() {
            writeln!(out, "{NO_IMAGES_MESSAGE}")?;
        }
        for image in &output.images {
            writeln!(
                out,
                "  {:<24} {}",
                image.caption(),
                dim(&format!("{}x{} px", image.image.width(), image.image.height()))
            )?;
        }
    }

    if passes.contains(&PassArg::Tables) {
        heading(out, "Extracted Tables")?;
        if output.tables.is_empty() && output.error_for(PassKind::Tables).is_none() {
            writeln!(out, "{NO_TABLES_MESSAGE}")?;
        }
        for table in &output.tables {
            writeln!(out)?;
            writeln!(out, "{}", cyan(&table.caption()))?;
            write_grid(out, &table.columns, &table.rows)?;
        }
    }

    if passes.contains(&PassArg::Summary) {
        heading(out, "Document Summary")?;
        match &output.summary {
            SummaryStatus::Generated { text } => writeln!(out, "{text}")?,
            SummaryStatus::NotConfigured => writeln!(out, "{NOT_CONFIGURED_MESSAGE}")?,
            SummaryStatus::NoText => writeln!(out, "{NO_TEXT_MESSAGE}")?,
            SummaryStatus::Failed { .. } | SummaryStatus::Skipped => {}
        }
    }
    Ok(())
}

fn write_text(out: &mut impl Write, text: &str, full: bool) -> io::Result<()> {
    if text.is_empty() {
        return writeln!(out, "{}", dim("(no text)"));
    }
    let total = text.chars().count();
    if full || total <= TEXT_PREVIEW_CHARS {
        writeln!(out, "{}", text.trim_end())
    } else {
        let preview: String = text.chars().take(TEXT_PREVIEW_CHARS).collect();
        writeln!(out, "{}", preview.trim_end())?;
        writeln!(
            out,
            "{}",
            dim(&format!(
                "… {} more characters (use --full-text or --output-dir)",
                total - TEXT_PREVIEW_CHARS
            ))
        )
    }
}

/// Rows padded to the widest cell of each column.
fn write_grid(out: &mut impl Write, columns: &[String], rows: &[Vec<String>]) -> io::Result<()> {
    let width = |i: usize| {
        std::iter::once(columns)
            .chain(rows.iter().map(Vec::as_slice))
            .filter_map(|r| r.get(i))
            .map(|c| c.chars().count())
            .max()
            .unwrap_or(0)
    };
    let widths: Vec<usize> = (0..columns.len()).map(width).collect();
    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    writeln!(out, "  {}", bold(&line(columns)))?;
    for row in rows {
        writeln!(out, "  {}", line(row))?;
    }
    Ok(())
}
