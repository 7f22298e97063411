//! Prompts for the chat-model summary backend.
//!
//! The Cohere backend has a dedicated summarize endpoint and only receives
//! the additional command; chat models need the whole instruction spelled
//! out, which is built here from the same [`SummaryConfig`] fields.

use crate::config::{SummaryConfig, SummaryFormat, SummaryLength};

/// Base system prompt for summarising extracted PDF text.
pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You are an expert document analyst. You will receive the raw text extracted from a PDF document. Write a summary of that document.

Rules:
- Summarise only what the text says; do not invent facts
- Keep names, figures and dates exactly as written
- Ignore page numbers, running headers and footers, and extraction noise
- Output ONLY the summary, with no preamble or commentary"#;

fn length_instruction(length: SummaryLength) -> Option<&'static str> {
    match length {
        SummaryLength::Short => Some("Keep the summary short: one to two sentences."),
        SummaryLength::Medium => Some("Keep the summary medium length: three to five sentences."),
        SummaryLength::Long => Some("Write a long summary: more than five sentences."),
        SummaryLength::Auto => None,
    }
}

fn format_instruction(format: SummaryFormat) -> Option<&'static str> {
    match format {
        SummaryFormat::Paragraph => Some("Write the summary as a single paragraph."),
        SummaryFormat::Bullets => Some("Write the summary as a list of bullet points starting with '- '."),
        SummaryFormat::Auto => None,
    }
}

/// Build the full system prompt for `config`.
pub fn summary_system_prompt(config: &SummaryConfig) -> String {
    let mut prompt = String::from(SUMMARY_SYSTEM_PROMPT);
    let extra = [
        length_instruction(config.length),
        format_instruction(config.format),
        config.additional_command.as_deref(),
    ];
    for line in extra.into_iter().flatten() {
        if !line.trim().is_empty() {
            prompt.push_str("\n- ");
            prompt.push_str(line.trim());
        }
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_carries_length_format_and_command() {
        let config = SummaryConfig::cohere("k");
        let prompt = summary_system_prompt(&config);
        assert!(prompt.starts_with(SUMMARY_SYSTEM_PROMPT));
        assert!(prompt.contains("medium length"));
        assert!(prompt.contains("single paragraph"));
        assert!(prompt.contains("highlight key points"));
    }

    #[test]
    fn auto_options_add_nothing() {
        let mut config = SummaryConfig::cohere("k");
        config.length = SummaryLength::Auto;
        config.format = SummaryFormat::Auto;
        config.additional_command = None;
        assert_eq!(summary_system_prompt(&config), SUMMARY_SYSTEM_PROMPT);
    }
}
