//! Post-processing: deterministic cleanup of PDFium text output.
//!
//! PDFium returns page text exactly as the content stream encodes it:
//! Windows line endings, zero-width joiners, soft hyphens, trailing spaces
//! from justified lines, and long runs of empty lines where graphics sat.
//! These rules remove that noise without touching the words themselves.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so every later rule can split on `\n`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all text rules to raw extracted text.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, …)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 2
///
/// Empty input stays empty.
pub fn normalize_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    collapse_blank_lines(&s)
}

/// Clean the text of a single table cell: collapse whitespace runs
/// (including line breaks inside the cell) to one space and trim.
pub fn clean_cell(input: &str) -> String {
    let s = remove_invisible_chars(input);
    RE_WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FFFE}',
        ],
        "",
    )
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    let mut out = input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    // `lines()` drops a final newline; keep it when the page text had one.
    if input.ends_with('\n') {
        out.push('\n');
    }
    out
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}
