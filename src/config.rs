//! Configuration for the solve request.
//!
//! Every knob the adapter reads lives in [`SolverConfig`], built via its
//! [`SolverConfigBuilder`]. The builder lets callers set only what they care
//! about and rely on documented defaults for the rest.

use crate::error::SolverError;
use crate::provider::SolveProvider;
use std::fmt;
use std::sync::Arc;

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

/// Default Generative Language API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// API key baked in at compile time from the `API_KEY` environment variable.
///
/// Empty when the variable was not set during the build. The build never
/// fails on a missing key; the first remote call does.
pub const BUILD_API_KEY: &str = match option_env!("API_KEY") {
    Some(key) => key,
    None => "",
};

/// Configuration for a solve request.
///
/// # Example
/// ```rust
/// use codesolver::SolverConfig;
///
/// let config = SolverConfig::builder()
///     .model("gemini-2.5-flash")
///     .temperature(0.2)
///     .test_case_count(20)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gemini-2.5-flash");
/// ```
#[derive(Clone)]
pub struct SolverConfig {
    /// Gemini API key. Resolved by [`resolve_api_key`] when left unset.
    pub api_key: String,

    /// Gemini model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// API root, without a trailing slash. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Sampling temperature. Range 0.0–2.0. Default: 0.2.
    pub temperature: f32,

    /// Thinking token budget. Default: 2048.
    pub thinking_budget: u32,

    /// Number of test cases requested from the model. Default: 20.
    ///
    /// Only the instruction mentions it. The response is accepted with
    /// whatever number of cases it carries.
    pub test_case_count: usize,

    /// Optional per-request timeout in seconds. Default: none.
    pub api_timeout_secs: Option<u64>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Custom instruction text. If None, uses the built-in template.
    pub instruction: Option<String>,

    /// Pre-constructed provider. Takes precedence over the Gemini settings.
    pub provider: Option<Arc<dyn SolveProvider>>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            api_key: resolve_api_key(None),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.2,
            thinking_budget: 2048,
            test_case_count: 20,
            api_timeout_secs: None,
            download_timeout_secs: 120,
            instruction: None,
            provider: None,
        }
    }
}

impl fmt::Debug for SolverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverConfig")
            .field(
                "api_key",
                &if self.api_key.is_empty() { "<empty>" } else { "<redacted>" },
            )
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("thinking_budget", &self.thinking_budget)
            .field("test_case_count", &self.test_case_count)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("instruction", &self.instruction.as_ref().map(|s| s.len()))
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}

impl SolverConfig {
    /// Create a new builder for `SolverConfig`.
    pub fn builder() -> SolverConfigBuilder {
        SolverConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Resolve the API key, from most-specific to least-specific.
///
/// 1. an explicit key (CLI flag or builder call)
/// 2. `API_KEY` in the runtime environment
/// 3. `GEMINI_API_KEY` in the runtime environment
/// 4. [`BUILD_API_KEY`]
///
/// Blank values are skipped. Falls back to an empty string.
pub fn resolve_api_key(explicit: Option<&str>) -> String {
    let runtime = |var: &str| std::env::var(var).ok();
    explicit
        .map(str::to_string)
        .into_iter()
        .chain(runtime("API_KEY"))
        .chain(runtime("GEMINI_API_KEY"))
        .chain(std::iter::once(BUILD_API_KEY.to_string()))
        .find(|k| !k.trim().is_empty())
        .unwrap_or_default()
}

/// Builder for [`SolverConfig`].
pub struct SolverConfigBuilder {
    config: SolverConfig,
}

impl fmt::Debug for SolverConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SolverConfigBuilder").field(&self.config).finish()
    }
}

impl SolverConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn thinking_budget(mut self, tokens: u32) -> Self {
        self.config.thinking_budget = tokens;
        self
    }

    pub fn test_case_count(mut self, n: usize) -> Self {
        self.config.test_case_count = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn instruction(mut self, text: impl Into<String>) -> Self {
        self.config.instruction = Some(text.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn SolveProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SolverConfig, SolverError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(SolverError::InvalidConfig("Model must not be empty".into()));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(SolverError::InvalidConfig(format!(
                "Base URL must be http(s), got '{}'",
                c.base_url
            )));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(SolverError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = SolverConfig::default();
        assert_eq!(c.model, DEFAULT_MODEL);
        assert_eq!(c.temperature, 0.2);
        assert_eq!(c.thinking_budget, 2048);
        assert_eq!(c.test_case_count, 20);
        assert!(c.api_timeout_secs.is_none());
    }

    #[test]
    fn builder_clamps_and_trims() {
        let c = SolverConfig::builder()
            .temperature(5.0)
            .test_case_count(0)
            .base_url("http://localhost:1234/")
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.test_case_count, 1);
        assert_eq!(c.base_url, "http://localhost:1234");
    }

    #[test]
    fn builder_rejects_bad_values() {
        assert!(SolverConfig::builder().model(" ").build().is_err());
        assert!(SolverConfig::builder().base_url("ftp://x").build().is_err());
        assert!(SolverConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn explicit_key_wins() {
        assert_eq!(resolve_api_key(Some("k-123")), "k-123");
    }

    #[test]
    fn debug_redacts_key() {
        let c = SolverConfig::builder().api_key("secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
