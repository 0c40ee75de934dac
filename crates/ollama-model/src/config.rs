use std::fmt::Debug;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

/// How much the model should think before answering.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Reasoning {
    /// Turns thinking on or off.
    Enabled(bool),
    /// A named effort level, such as `low` or `high`.
    Effort(String),
}

/// Builder for [`OllamaConfig`].
#[derive(Clone, PartialEq)]
pub struct OllamaConfigBuilder {
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<Duration>,
    format: Option<Value>,
    num_ctx: Option<u32>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    max_tokens: Option<u32>,
    reasoning: Option<Reasoning>,
}

impl OllamaConfigBuilder {
    /// Creates a builder for the given server and model.
    #[inline]
    pub fn new<U, M>(base_url: U, model: M) -> Self
    where
        U: Into<String>,
        M: Into<String>,
    {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            timeout: None,
            format: None,
            num_ctx: None,
            temperature: None,
            top_p: None,
            max_tokens: None,
            reasoning: None,
        }
    }

    /// Sets a bearer token, needed for hosted Ollama.
    #[inline]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the timeout of every HTTP request.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the response format: either `"json"` or a JSON schema.
    #[inline]
    pub fn with_format(mut self, format: Value) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets the context window length.
    #[inline]
    pub fn with_num_ctx(mut self, num_ctx: u32) -> Self {
        self.num_ctx = Some(num_ctx);
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

    /// Sets the thinking behavior.
    #[inline]
    pub fn with_reasoning(mut self, reasoning: Reasoning) -> Self {
        self.reasoning = Some(reasoning);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> OllamaConfig {
        OllamaConfig {
            base_url: self.base_url,
            model: self.model,
            api_key: self.api_key,
            timeout: self.timeout,
            format: self.format,
            num_ctx: self.num_ctx,
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            reasoning: self.reasoning,
        }
    }
}

impl Debug for OllamaConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaConfigBuilder")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// Configuration for the Ollama provider.
#[derive(Clone, PartialEq)]
pub struct OllamaConfig {
    pub(crate) base_url: String,
    pub(crate) model: String,
    pub(crate) api_key: Option<String>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) format: Option<Value>,
    pub(crate) num_ctx: Option<u32>,
    pub(crate) temperature: Option<f64>,
    pub(crate) top_p: Option<f64>,
    pub(crate) max_tokens: Option<u32>,
    pub(crate) reasoning: Option<Reasoning>,
}

impl OllamaConfig {
    /// The model requests are sent to.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The server URL.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The response format.
    #[inline]
    pub fn format(&self) -> Option<&Value> {
        self.format.as_ref()
    }

    /// The context window length.
    #[inline]
    pub fn num_ctx(&self) -> Option<u32> {
        self.num_ctx
    }

    /// The thinking behavior.
    #[inline]
    pub fn reasoning(&self) -> Option<&Reasoning> {
        self.reasoning.as_ref()
    }
}

impl Debug for OllamaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("format", &self.format)
            .field("num_ctx", &self.num_ctx)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_tokens", &self.max_tokens)
            .field("reasoning", &self.reasoning)
            .finish()
    }
}
