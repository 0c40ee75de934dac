use std::fmt::Debug;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Builder for [`AnthropicConfig`].
#[derive(Clone, PartialEq)]
pub struct AnthropicConfigBuilder {
    api_key: String,
    model: String,
    base_url: Option<String>,
    timeout: Option<Duration>,
    stop_sequences: Vec<String>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    max_tokens: Option<u32>,
}

impl AnthropicConfigBuilder {
    /// Creates a builder with the given API key and model.
    #[inline]
    pub fn new<K: Into<String>, M: Into<String>>(api_key: K, model: M) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            timeout: None,
            stop_sequences: vec![],
            temperature: None,
            top_p: None,
            max_tokens: None,
        }
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

    /// Sets sequences that make the model stop generating.
    #[inline]
    pub fn with_stop_sequences<I, S>(mut self, stop: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_sequences = stop.into_iter().map(Into::into).collect();
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

    /// Caps the number of generated tokens. Anthropic requires a cap, so
    /// 1024 is used when none is set.
    #[inline]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> AnthropicConfig {
        AnthropicConfig {
            api_key: self.api_key,
            model: self.model,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            timeout: self.timeout,
            stop_sequences: self.stop_sequences,
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }
}

impl Debug for AnthropicConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Configuration for the Anthropic provider.
#[derive(Clone, PartialEq)]
pub struct AnthropicConfig {
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) base_url: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) stop_sequences: Vec<String>,
    pub(crate) temperature: Option<f64>,
    pub(crate) top_p: Option<f64>,
    pub(crate) max_tokens: u32,
}

impl AnthropicConfig {
    /// The model requests are sent to.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
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

    /// Sequences that make the model stop generating.
    #[inline]
    pub fn stop_sequences(&self) -> &[String] {
        &self.stop_sequences
    }

    /// The generated token cap.
    #[inline]
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

impl Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("stop_sequences", &self.stop_sequences)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}
