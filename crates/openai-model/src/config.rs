use std::fmt::Debug;
use std::time::Duration;

use ai_common_model::ResponseFormat;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Builder for [`OpenAIConfig`].
#[derive(Clone, PartialEq)]
pub struct OpenAIConfigBuilder {
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    max_tokens: Option<u32>,
    reasoning_effort: Option<String>,
    service_tier: Option<String>,
    response_format: Option<ResponseFormat>,
}

impl OpenAIConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            model: None,
            base_url: None,
            timeout: None,
            temperature: None,
            top_p: None,
            max_tokens: None,
            reasoning_effort: None,
            service_tier: None,
            response_format: None,
        }
    }

    /// Sets the model to use.
    ///
    /// If no model is set, the provider asks the server for the model it
    /// serves on the first request. This is what single-model servers
    /// like vLLM expect.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the timeout of every HTTP request.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the sampling temperature.
    #[inline]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the nucleus sampling probability mass.
    #[inline]
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Caps the number of generated tokens.
    #[inline]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the reasoning effort (`low`, `medium`, `high`, ...).
    #[inline]
    pub fn with_reasoning_effort<S: Into<String>>(mut self, effort: S) -> Self {
        self.reasoning_effort = Some(effort.into());
        self
    }

    /// Sets the service tier, e.g. `auto` for Groq.
    #[inline]
    pub fn with_service_tier<S: Into<String>>(mut self, tier: S) -> Self {
        self.service_tier = Some(tier.into());
        self
    }

    /// Sets the default response format.
    #[inline]
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> OpenAIConfig {
        OpenAIConfig {
            api_key: self.api_key,
            model: self.model,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            timeout: self.timeout,
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            reasoning_effort: self.reasoning_effort,
            service_tier: self.service_tier,
            response_format: self.response_format,
        }
    }
}

impl Debug for OpenAIConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Configuration for the OpenAI-compatible provider.
#[derive(Clone, PartialEq)]
pub struct OpenAIConfig {
    pub(crate) api_key: String,
    pub(crate) model: Option<String>,
    pub(crate) base_url: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) temperature: Option<f64>,
    pub(crate) top_p: Option<f64>,
    pub(crate) max_tokens: Option<u32>,
    pub(crate) reasoning_effort: Option<String>,
    pub(crate) service_tier: Option<String>,
    pub(crate) response_format: Option<ResponseFormat>,
}

impl OpenAIConfig {
    /// The configured model, if any.
    #[inline]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// The base URL requests are sent to.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The request timeout.
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The sampling temperature.
    #[inline]
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// The nucleus sampling probability mass.
    #[inline]
    pub fn top_p(&self) -> Option<f64> {
        self.top_p
    }

    /// The generated token cap.
    #[inline]
    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    /// The reasoning effort.
    #[inline]
    pub fn reasoning_effort(&self) -> Option<&str> {
        self.reasoning_effort.as_deref()
    }

    /// The service tier.
    #[inline]
    pub fn service_tier(&self) -> Option<&str> {
        self.service_tier.as_deref()
    }

    /// The default response format.
    #[inline]
    pub fn response_format(&self) -> Option<ResponseFormat> {
        self.response_format
    }
}

impl Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_tokens", &self.max_tokens)
            .field("reasoning_effort", &self.reasoning_effort)
            .field("service_tier", &self.service_tier)
            .field("response_format", &self.response_format)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OpenAIConfigBuilder::with_api_key("sk-secret").build();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.model(), None);
        assert_eq!(config.temperature(), None);
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = OpenAIConfigBuilder::with_api_key("sk-secret")
            .with_model("gpt-4")
            .build();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("gpt-4"));

        let builder = OpenAIConfigBuilder::with_api_key("sk-secret");
        assert!(!format!("{builder:?}").contains("sk-secret"));
    }
}
