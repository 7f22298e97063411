//! Summary pass: one call to Cohere's summarize endpoint or to a chat model.
//!
//! ## Retry Strategy
//!
//! Rate limits, timeouts and 5xx answers are transient. With `max_retries > 0`
//! the call is repeated after `retry_backoff_ms * 2^(attempt-1)`, so a 500 ms
//! base gives 500 ms → 1 s → 2 s. A 429 with `Retry-After` waits at least
//! that long. No single delay exceeds one minute. Authentication and other
//! API errors are returned immediately.

use crate::config::{SummaryBackend, SummaryConfig, MAX_RETRY_DELAY_MS};
use crate::error::{ExtractError, PassError};
use crate::output::SummaryStatus;
use crate::prompts::summary_system_prompt;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Run the summary pass over already-extracted text.
///
/// No backend or blank text means no network call.
pub async fn run_summary_pass(
    text: &str,
    config: Option<&SummaryConfig>,
) -> (SummaryStatus, Option<PassError>) {
    let Some(config) = config else {
        debug!("Summary: no backend configured, skipping call");
        return (SummaryStatus::NotConfigured, None);
    };
    if text.trim().is_empty() {
        debug!("Summary: no text to summarise");
        return (SummaryStatus::NoText, None);
    }

    match summarize(text, config).await {
        Ok(summary) => (SummaryStatus::Generated { text: summary }, None),
        Err(e) => (
            SummaryStatus::Failed {
                message: e.to_string(),
            },
            Some(e),
        ),
    }
}

/// Summarise `text` with the configured backend, retrying transient failures.
pub async fn summarize(text: &str, config: &SummaryConfig) -> Result<String, PassError> {
    let input = truncate_chars(text, config.max_input_chars);
    if input.len() < text.len() {
        warn!(
            "Summary: input truncated to {} of {} characters",
            config.max_input_chars,
            text.chars().count()
        );
    }

    let mut attempt = 0;
    loop {
        match summarize_once(input, config).await {
            Ok(summary) => {
                info!("Summary: {} characters generated", summary.chars().count());
                return Ok(summary);
            }
            Err(e) if e.is_transient() && attempt < config.max_retries => {
                attempt += 1;
                let delay = retry_delay(config.retry_backoff_ms, attempt, &e);
                warn!(
                    "Summary: attempt {} failed: {}; retry {}/{} after {}ms",
                    attempt,
                    e,
                    attempt,
                    config.max_retries,
                    delay.as_millis()
                );
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Delay before retry number `attempt` (1-based): exponential backoff, at
/// least the server's `Retry-After`, never more than [`MAX_RETRY_DELAY_MS`].
fn retry_delay(backoff_ms: u64, attempt: u32, error: &PassError) -> Duration {
    let factor = 2u64
        .checked_pow(attempt.saturating_sub(1))
        .unwrap_or(u64::MAX);
    let exponential = backoff_ms.saturating_mul(factor);
    let requested = match error {
        PassError::SummaryRateLimited {
            retry_after_secs: Some(secs),
        } => secs.saturating_mul(1000),
        _ => 0,
    };
    Duration::from_millis(exponential.max(requested).min(MAX_RETRY_DELAY_MS))
}

async fn summarize_once(text: &str, config: &SummaryConfig) -> Result<String, PassError> {
    let secs = config.timeout_secs;
    let call = async {
        match &config.backend {
            SummaryBackend::Cohere { api_key, base_url } => {
                cohere_summarize(text, config, api_key, base_url).await
            }
            SummaryBackend::Llm(provider) => llm_summarize(text, config, provider).await,
        }
    };
    timeout(Duration::from_secs(secs), call)
        .await
        .map_err(|_| PassError::SummaryTimeout { secs })?
}

// ── Cohere ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CohereRequest<'a> {
    text: &'a str,
    length: &'static str,
    format: &'static str,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    additional_command: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extractiveness: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct CohereResponse {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn cohere_request<'a>(text: &'a str, config: &'a SummaryConfig) -> CohereRequest<'a> {
    CohereRequest {
        text,
        length: config.length.as_str(),
        format: config.format.as_str(),
        model: &config.model,
        additional_command: config
            .additional_command
            .as_deref()
            .filter(|c| !c.trim().is_empty()),
        temperature: config.temperature,
        extractiveness: config.extractiveness.map(|e| e.as_str()),
    }
}

async fn cohere_summarize(
    text: &str,
    config: &SummaryConfig,
    api_key: &str,
    base_url: &str,
) -> Result<String, PassError> {
    let url = format!("{}/v1/summarize", base_url.trim_end_matches('/'));
    debug!("Summary: POST {} ({} chars)", url, text.chars().count());

    let response = reqwest::Client::new()
        .post(&url)
        .bearer_auth(api_key)
        .json(&cohere_request(text, config))
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                PassError::SummaryTimeout {
                    secs: config.timeout_secs,
                }
            } else {
                PassError::SummaryFailed {
                    detail: e.to_string(),
                }
            }
        })?;

    let status = response.status();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = response.text().await.map_err(|e| PassError::SummaryFailed {
        detail: format!("reading response: {}", e),
    })?;

    parse_cohere_response(status.as_u16(), retry_after, &body)
}

/// Map a Cohere HTTP answer to a summary or a pass error.
fn parse_cohere_response(
    status: u16,
    retry_after_secs: Option<u64>,
    body: &str,
) -> Result<String, PassError> {
    let parsed: Option<CohereResponse> = serde_json::from_str(body).ok();
    let message = || {
        parsed
            .as_ref()
            .and_then(|r| r.message.clone())
            .unwrap_or_else(|| body.trim().to_string())
    };

    match status {
        200..=299 => parsed
            .as_ref()
            .and_then(|r| r.summary.clone())
            .ok_or_else(|| PassError::SummaryFailed {
                detail: "response has no summary field".to_string(),
            }),
        401 | 403 => Err(PassError::SummaryAuth { detail: message() }),
        429 => Err(PassError::SummaryRateLimited { retry_after_secs }),
        500..=599 => Err(PassError::SummaryServerError {
            status,
            detail: message(),
        }),
        _ => Err(PassError::SummaryFailed {
            detail: format!("HTTP {}: {}", status, message()),
        }),
    }
}

// ── Chat model ───────────────────────────────────────────────────────────

async fn llm_summarize(
    text: &str,
    config: &SummaryConfig,
    provider: &Arc<dyn LLMProvider>,
) -> Result<String, PassError> {
    let messages = vec![
        ChatMessage::system(summary_system_prompt(config)),
        ChatMessage::user(text),
    ];
    let options = CompletionOptions {
        temperature: config.temperature,
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    };

    let response = provider
        .chat(&messages, Some(&options))
        .await
        .map_err(|e| PassError::SummaryFailed {
            detail: e.to_string(),
        })?;
    debug!(
        "Summary: {} input tokens, {} output tokens",
        response.prompt_tokens, response.completion_tokens
    );

    let summary = response.content.trim().to_string();
    if summary.is_empty() {
        return Err(PassError::SummaryFailed {
            detail: "model returned an empty summary".to_string(),
        });
    }
    Ok(summary)
}

/// Build a named chat provider (`openai`, `anthropic`, `ollama`, ...).
pub fn provider_from_name(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ExtractError> {
    ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        ExtractError::ProviderNotConfigured {
            provider: name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Longest prefix of `text` with at most `max_chars` characters.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SummaryExtractiveness, SummaryFormat, SummaryLength};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request.
    async fn one_shot_server(
        status_line: &'static str,
        extra_headers: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let base = format!("http://{}", listener.local_addr().expect("addr"));

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.expect("read");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                extra_headers,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.expect("write");
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (base, handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    #[test]
    fn request_body_uses_defaults() {
        let config = SummaryConfig::cohere("key");
        let body = serde_json::to_value(cohere_request("hello", &config)).expect("json");
        assert_eq!(body["text"], "hello");
        assert_eq!(body["length"], "medium");
        assert_eq!(body["format"], "paragraph");
        assert_eq!(body["model"], "command");
        assert_eq!(
            body["additional_command"],
            "Make it comprehensive and highlight key points"
        );
        assert!(body.get("temperature").is_none());
        assert!(body.get("extractiveness").is_none());
    }

    #[test]
    fn request_body_carries_options() {
        let mut config = SummaryConfig::cohere("key");
        config.length = SummaryLength::Short;
        config.format = SummaryFormat::Bullets;
        config.extractiveness = Some(SummaryExtractiveness::High);
        config.temperature = Some(0.3);
        config.additional_command = None;
        let body = serde_json::to_value(cohere_request("x", &config)).expect("json");
        assert_eq!(body["length"], "short");
        assert_eq!(body["format"], "bullets");
        assert_eq!(body["extractiveness"], "high");
        assert!(body.get("additional_command").is_none());
        assert!((body["temperature"].as_f64().expect("f64") - 0.3).abs() < 1e-6);
    }

    #[test]
    fn response_statuses_map_to_errors() {
        assert_eq!(
            parse_cohere_response(200, None, r#"{"id":"1","summary":"Short."}"#).expect("ok"),
            "Short."
        );
        assert!(matches!(
            parse_cohere_response(401, None, r#"{"message":"invalid api token"}"#),
            Err(PassError::SummaryAuth { detail }) if detail == "invalid api token"
        ));
        assert!(matches!(
            parse_cohere_response(429, Some(7), "{}"),
            Err(PassError::SummaryRateLimited { retry_after_secs: Some(7) })
        ));
        assert!(matches!(
            parse_cohere_response(503, None, "upstream down"),
            Err(PassError::SummaryServerError { status: 503, .. })
        ));
        match parse_cohere_response(400, None, r#"{"message":"text too short"}"#) {
            Err(PassError::SummaryFailed { detail }) => {
                assert!(detail.contains("400"));
                assert!(detail.contains("text too short"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            parse_cohere_response(200, None, r#"{"id":"1"}"#),
            Err(PassError::SummaryFailed { .. })
        ));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[tokio::test]
    async fn no_backend_means_no_call() {
        let (status, err) = run_summary_pass("some text", None).await;
        assert_eq!(status, SummaryStatus::NotConfigured);
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn blank_text_means_no_call() {
        // Unroutable base URL: any request would fail the test.
        let config = SummaryConfig::cohere("key").with_base_url("http://127.0.0.1:1");
        let (status, err) = run_summary_pass("  \n ", Some(&config)).await;
        assert_eq!(status, SummaryStatus::NoText);
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn cohere_success_against_local_server() {
        let (base, server) = one_shot_server(
            "200 OK",
            "",
            r#"{"id":"abc","summary":"A concise summary.","meta":{}}"#,
        )
        .await;
        let config = SummaryConfig::cohere("secret-key").with_base_url(base);

        let (status, err) = run_summary_pass("Long document text.", Some(&config)).await;
        assert!(err.is_none(), "unexpected error: {err:?}");
        assert_eq!(status.text(), Some("A concise summary."));

        let request = server.await.expect("server task");
        assert!(request.starts_with("POST /v1/summarize"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer secret-key"));
        assert!(request.contains("\"text\":\"Long document text.\""));
    }

    #[tokio::test]
    async fn cohere_auth_failure_is_reported() {
        let (base, _server) =
            one_shot_server("401 Unauthorized", "", r#"{"message":"invalid api token"}"#).await;
        let config = SummaryConfig::cohere("bad").with_base_url(base);

        let (status, err) = run_summary_pass("text", Some(&config)).await;
        assert!(matches!(err, Some(PassError::SummaryAuth { .. })));
        match status {
            SummaryStatus::Failed { message } => {
                assert!(message.starts_with("Error with summary API"));
                assert!(message.contains("invalid api token"));
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }

    /// Answer every request with the same response; returns the request count.
    async fn repeating_server(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, Arc<std::sync::atomic::AtomicUsize>) {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let base = format!("http://{}", listener.local_addr().expect("addr"));
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut request = Vec::new();
                let mut buf = [0u8; 4096];
                while let Ok(n) = socket.read(&mut buf).await {
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                    if request_complete(&request) {
                        break;
                    }
                }
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (base, hits)
    }

    #[test]
    fn retry_delay_doubles_and_is_capped() {
        let busy = PassError::SummaryServerError {
            status: 503,
            detail: String::new(),
        };
        assert_eq!(retry_delay(500, 1, &busy), Duration::from_millis(500));
        assert_eq!(retry_delay(500, 2, &busy), Duration::from_millis(1000));
        assert_eq!(retry_delay(500, 3, &busy), Duration::from_millis(2000));
        assert_eq!(
            retry_delay(500, 80, &busy),
            Duration::from_millis(MAX_RETRY_DELAY_MS)
        );
        assert_eq!(
            retry_delay(u64::MAX, u32::MAX, &busy),
            Duration::from_millis(MAX_RETRY_DELAY_MS)
        );
        assert_eq!(retry_delay(0, 80, &busy), Duration::ZERO);
    }

    #[test]
    fn retry_delay_honours_retry_after() {
        let limited = PassError::SummaryRateLimited {
            retry_after_secs: Some(2),
        };
        assert_eq!(retry_delay(500, 1, &limited), Duration::from_secs(2));
        assert_eq!(retry_delay(0, 1, &limited), Duration::from_secs(2));

        let long = PassError::SummaryRateLimited {
            retry_after_secs: Some(u64::MAX),
        };
        assert_eq!(
            retry_delay(500, 1, &long),
            Duration::from_millis(MAX_RETRY_DELAY_MS)
        );

        let no_header = PassError::SummaryRateLimited {
            retry_after_secs: None,
        };
        assert_eq!(retry_delay(250, 1, &no_header), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn persistent_rate_limit_exhausts_retries_without_panicking() {
        let (base, hits) = repeating_server("429 Too Many Requests", "{}").await;
        let mut config = SummaryConfig::cohere("key").with_base_url(base);
        config.max_retries = 80;
        config.retry_backoff_ms = 0;

        let err = summarize("text", &config).await.expect_err("never succeeds");
        assert!(matches!(err, PassError::SummaryRateLimited { .. }));
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 81);
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_reported() {
        let (base, hits) = repeating_server("503 Service Unavailable", "{}").await;
        let mut config = SummaryConfig::cohere("key").with_base_url(base);
        config.max_retries = 2;
        config.retry_backoff_ms = 1;

        let (status, err) = run_summary_pass("text", Some(&config)).await;
        assert!(matches!(err, Some(PassError::SummaryServerError { status: 503, .. })));
        assert!(matches!(status, SummaryStatus::Failed { .. }));
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cohere_rate_limit_reads_retry_after() {
        let (base, _server) =
            one_shot_server("429 Too Many Requests", "Retry-After: 12\r\n", "{}").await;
        let config = SummaryConfig::cohere("key").with_base_url(base);

        let err = summarize("text", &config).await.expect_err("should fail");
        assert!(matches!(
            err,
            PassError::SummaryRateLimited {
                retry_after_secs: Some(12)
            }
        ));
    }
}
