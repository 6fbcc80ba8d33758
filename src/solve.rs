//! Solve request adapter: encoded file + language → [`SolutionResult`].
//!
//! One attempt per call. There is no retry and no partial result: either the
//! model's answer validates and is normalised, or the caller gets
//! [`SolverError::SolveFailed`] carrying the generic localised message. The
//! underlying cause is logged at `error` level and goes no further.

use crate::config::SolverConfig;
use crate::error::SolverError;
use crate::model::{Language, SolutionResult, UploadedFile};
use crate::pipeline::{encode, ingest, postprocess};
use crate::prompts::{response_schema, solve_instruction};
use crate::provider::{GeminiProvider, GenerateRequest, SolveProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Solve the problem in an ingested file.
///
/// This is the primary entry point for the library.
///
/// # Example
/// ```rust,no_run
/// use codesolver::{ingest_path, solve_problem, IngestSource, Language, SolverConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let file = ingest_path("bai1.png", IngestSource::Picker).await?;
/// let config = SolverConfig::default();
/// let result = solve_problem(&file, Language::Cpp, &config).await?;
/// println!("{}", result.raw_code);
/// # Ok(())
/// # }
/// ```
pub async fn solve_problem(
    file: &UploadedFile,
    language: Language,
    config: &SolverConfig,
) -> Result<SolutionResult, SolverError> {
    solve_encoded(&file.encoded_data, &file.mime_type, language, config).await
}

/// Solve from a data URL and its MIME type.
///
/// # Errors
/// Every failure (bad data URL, transport, HTTP status, blocked prompt,
/// malformed JSON) returns [`SolverError::SolveFailed`].
pub async fn solve_encoded(
    encoded_data: &str,
    mime_type: &str,
    language: Language,
    config: &SolverConfig,
) -> Result<SolutionResult, SolverError> {
    let start = Instant::now();

    let payload = encode::strip_data_url_prefix(encoded_data).map_err(|e| {
        error!("Solve aborted before sending: {}", e);
        SolverError::solve_failed()
    })?;

    let provider = resolve_provider(config).map_err(|e| {
        error!("Provider setup failed: {}", e);
        SolverError::solve_failed()
    })?;

    let mime_type = match mime_type.trim() {
        "" => encode::data_url_mime(encoded_data).unwrap_or_default(),
        declared => declared,
    };

    let request = build_request(payload, mime_type, language, config);
    info!(
        "Solving with {} ({}, {}, {} bytes)",
        provider.name(),
        language,
        mime_type,
        payload.len()
    );

    let text = provider.generate(&request).await.map_err(|e| {
        error!("{} API error: {}", provider.name(), e);
        SolverError::solve_failed()
    })?;
    debug!("Response: {} bytes", text.len());

    let result = postprocess::parse_response(&text).map_err(|e| {
        error!("Response did not match the declared schema: {}", e);
        SolverError::solve_failed()
    })?;

    info!(
        "Solved in {}ms: {} chars of explanation, {} lines of code, {} test cases",
        start.elapsed().as_millis(),
        result.markdown.chars().count(),
        result.raw_code.lines().count(),
        result.test_cases.len()
    );
    Ok(result)
}

/// Ingest a local path or URL, then solve it.
pub async fn solve_path(
    input: impl AsRef<str>,
    language: Language,
    config: &SolverConfig,
) -> Result<SolutionResult, SolverError> {
    let input = input.as_ref();
    let file = if ingest::is_url(input) {
        ingest::ingest_url(input, config.download_timeout_secs).await?
    } else {
        ingest::ingest_path(input, ingest::IngestSource::Picker).await?
    };
    solve_problem(&file, language, config).await
}

/// Synchronous wrapper around [`solve_problem`].
///
/// Creates a temporary tokio runtime internally.
pub fn solve_sync(
    file: &UploadedFile,
    language: Language,
    config: &SolverConfig,
) -> Result<SolutionResult, SolverError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SolverError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(solve_problem(file, language, config))
}

/// Assemble the single outbound request.
pub fn build_request(
    payload: &str,
    mime_type: &str,
    language: Language,
    config: &SolverConfig,
) -> GenerateRequest {
    let instruction = config
        .instruction
        .clone()
        .unwrap_or_else(|| solve_instruction(language, config.test_case_count));
    GenerateRequest {
        mime_type: mime_type.to_string(),
        data: payload.to_string(),
        instruction,
        response_schema: response_schema(language, config.test_case_count),
        temperature: config.temperature,
        thinking_budget: config.thinking_budget,
    }
}

/// Use the injected provider, or build a Gemini client from the config.
fn resolve_provider(config: &SolverConfig) -> Result<Arc<dyn SolveProvider>, SolverError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }
    let gemini = GeminiProvider::new(
        &config.base_url,
        &config.model,
        &config.api_key,
        config.api_timeout_secs,
    )
    .map_err(|e| SolverError::Internal(e.to_string()))?;
    Ok(Arc::new(gemini))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, SOLVE_FAILED_MESSAGE};
    use futures::future::{BoxFuture, FutureExt};
    use std::sync::Mutex;

    /// Returns a canned answer and records what it was sent.
    struct Canned {
        answer: Result<String, u16>,
        seen: Mutex<Vec<GenerateRequest>>,
    }

    impl Canned {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn status(code: u16) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(code),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl SolveProvider for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        fn generate<'a>(
            &'a self,
            request: &'a GenerateRequest,
        ) -> BoxFuture<'a, Result<String, ProviderError>> {
            self.seen.lock().unwrap().push(request.clone());
            let answer = match &self.answer {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(ProviderError::Status {
                    status: *status,
                    body: "quota exceeded".into(),
                }),
            };
            async move { answer }.boxed()
        }
    }

    fn config_with(provider: Arc<dyn SolveProvider>) -> SolverConfig {
        SolverConfig::builder().provider(provider).build().unwrap()
    }

    #[tokio::test]
    async fn strips_prefix_and_tags_mime() {
        let canned = Canned::ok(r#"{"explanation":"e","sourceCode":"c","testCases":[]}"#);
        let config = config_with(canned.clone());
        let result = solve_encoded(
            "data:application/pdf;base64,JVBERi0=",
            "application/pdf",
            Language::Python,
            &config,
        )
        .await
        .unwrap();
        assert_eq!(result.raw_code, "c");

        let seen = canned.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].data, "JVBERi0=");
        assert_eq!(seen[0].mime_type, "application/pdf");
        assert!(seen[0].instruction.contains("Python"));
        assert_eq!(seen[0].thinking_budget, 2048);
    }

    #[tokio::test]
    async fn remote_failure_becomes_generic_message() {
        let config = config_with(Canned::status(429));
        let err = solve_encoded("data:image/png;base64,AA==", "image/png", Language::Cpp, &config)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), SOLVE_FAILED_MESSAGE);
        assert!(!err.to_string().contains("quota"));
    }

    #[tokio::test]
    async fn malformed_json_becomes_generic_message() {
        let config = config_with(Canned::ok("sure! here is the code"));
        let err = solve_encoded("data:image/png;base64,AA==", "image/png", Language::Cpp, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, SolverError::SolveFailed { .. }));
    }

    #[tokio::test]
    async fn bad_data_url_never_reaches_provider() {
        let canned = Canned::ok("{}");
        let config = config_with(canned.clone());
        let err = solve_encoded("AAAA", "image/png", Language::Cpp, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, SolverError::SolveFailed { .. }));
        assert!(canned.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_mime_is_read_from_data_url() {
        let canned = Canned::ok("{}");
        let config = config_with(canned.clone());
        solve_encoded("data:image/webp;base64,UklGRg==", " ", Language::Cpp, &config)
            .await
            .unwrap();
        assert_eq!(canned.seen.lock().unwrap()[0].mime_type, "image/webp");
    }

    #[tokio::test]
    async fn solve_path_reads_local_file() {
        let canned = Canned::ok(r#"{"sourceCode":"print(1)"}"#);
        let config = config_with(canned.clone());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("de.pdf");
        std::fs::write(&path, b"%PDF-1.7\n").unwrap();

        let result = solve_path(path.to_string_lossy(), Language::Python, &config)
            .await
            .unwrap();
        assert_eq!(result.raw_code, "print(1)");
        assert_eq!(canned.seen.lock().unwrap()[0].mime_type, "application/pdf");
    }

    #[tokio::test]
    async fn solve_path_reports_missing_file() {
        let canned = Canned::ok("{}");
        let config = config_with(canned.clone());
        let err = solve_path("/no/such/bai.png", Language::Cpp, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, SolverError::FileNotFound { .. }));
        assert!(canned.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn custom_instruction_overrides_template() {
        let config = SolverConfig::builder()
            .instruction("just solve")
            .build()
            .unwrap();
        let req = build_request("AA==", "image/png", Language::Cpp, &config);
        assert_eq!(req.instruction, "just solve");
        assert_eq!(req.response_schema["type"], "OBJECT");
    }

    #[test]
    fn sync_wrapper_runs_to_completion() {
        let config = config_with(Canned::ok(r#"{"sourceCode":"```py\nprint(2)\n```"}"#));
        let file = UploadedFile {
            name: "a.png".into(),
            mime_type: "image/png".into(),
            encoded_data: "data:image/png;base64,AA==".into(),
            preview_url: "data:image/png;base64,AA==".into(),
        };
        let result = solve_sync(&file, Language::Python, &config).unwrap();
        assert_eq!(result.raw_code, "print(2)");
    }
}
