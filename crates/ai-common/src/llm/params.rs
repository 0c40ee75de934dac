use std::fmt::{self, Debug};
use std::time::Duration;

use ai_common_anthropic_model::{AnthropicConfigBuilder, AnthropicProvider};
use ai_common_ollama_model::{
    OllamaConfigBuilder, OllamaProvider, Reasoning,
};
use ai_common_openai_model::{OpenAIConfigBuilder, OpenAIProvider};
use serde_json::{Map, Value};
use thiserror::Error;

use super::{ChatModelHandle, LlmServer, ResolveError, resolve_model_alias};

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const GROQ_SERVICE_TIER: &str = "auto";

/// Loosely typed parameters for [`resolve`](super::resolve).
///
/// `null` values count as absent.
#[derive(Clone, Default, PartialEq)]
pub struct ParameterBag(Map<String, Value>);

impl ParameterBag {
    /// Creates an empty bag.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, replacing any previous value.
    #[inline]
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.insert(key, value);
        self
    }

    /// Adds a parameter, replacing any previous value.
    #[inline]
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the value of `key`, unless it is absent or `null`.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    /// Returns `true` if `key` has a non-null value.
    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The underlying map.
    #[inline]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ParameterBag {
    #[inline]
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ParameterBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl Debug for ParameterBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.0 {
            if key == "api_key" {
                map.entry(key, &"<redacted>");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

/// A parameter is missing or has the wrong type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// A required parameter is absent.
    #[error("missing `{key}` for {provider}")]
    MissingKey {
        /// The provider being resolved.
        provider: LlmServer,
        /// The absent key.
        key: &'static str,
    },
    /// A parameter has a value of the wrong type or range.
    #[error("invalid `{key}` for {provider}: expected {expected}")]
    InvalidValue {
        /// The provider being resolved.
        provider: LlmServer,
        /// The offending key.
        key: &'static str,
        /// What the value should look like.
        expected: &'static str,
    },
}

impl ParameterError {
    /// Returns the provider the error is about.
    #[inline]
    pub fn provider(&self) -> LlmServer {
        match self {
            ParameterError::MissingKey { provider, .. }
            | ParameterError::InvalidValue { provider, .. } => *provider,
        }
    }

    /// Returns the parameter the error is about.
    #[inline]
    pub fn key(&self) -> &'static str {
        match self {
            ParameterError::MissingKey { key, .. }
            | ParameterError::InvalidValue { key, .. } => key,
        }
    }
}

/// Typed access to a [`ParameterBag`] on behalf of one provider.
struct Reader<'a> {
    server: LlmServer,
    bag: &'a ParameterBag,
}

impl Reader<'_> {
    fn invalid(
        &self,
        key: &'static str,
        expected: &'static str,
    ) -> ParameterError {
        ParameterError::InvalidValue {
            provider: self.server,
            key,
            expected,
        }
    }

    fn required_str(
        &self,
        key: &'static str,
    ) -> Result<String, ParameterError> {
        self.optional_str(key)?.ok_or(ParameterError::MissingKey {
            provider: self.server,
            key,
        })
    }

    fn optional_str(
        &self,
        key: &'static str,
    ) -> Result<Option<String>, ParameterError> {
        match self.bag.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.invalid(key, "a string")),
        }
    }

    fn optional_f64(
        &self,
        key: &'static str,
    ) -> Result<Option<f64>, ParameterError> {
        match self.bag.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(key, "a number")),
        }
    }

    fn optional_u32(
        &self,
        key: &'static str,
    ) -> Result<Option<u32>, ParameterError> {
        match self.bag.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.invalid(key, "a non-negative integer")),
        }
    }

    fn optional_duration(
        &self,
        key: &'static str,
    ) -> Result<Option<Duration>, ParameterError> {
        match self.optional_f64(key) {
            Ok(None) => Ok(None),
            Ok(Some(secs)) if secs.is_finite() && secs >= 0.0 => {
                Ok(Some(Duration::from_secs_f64(secs)))
            }
            _ => Err(self.invalid(key, "a non-negative number of seconds")),
        }
    }

    fn optional_str_list(
        &self,
        key: &'static str,
    ) -> Result<Vec<String>, ParameterError> {
        let expected = "a list of strings";
        match self.bag.get(key) {
            None => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(vec![s.clone()]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_owned)
                        .ok_or_else(|| self.invalid(key, expected))
                })
                .collect(),
            Some(_) => Err(self.invalid(key, expected)),
        }
    }

    /// Reads `key`, falling back to `alias` when `key` is absent.
    fn optional_str_or(
        &self,
        key: &'static str,
        alias: &'static str,
    ) -> Result<Option<String>, ParameterError> {
        match self.optional_str(key)? {
            Some(value) => Ok(Some(value)),
            None => self.optional_str(alias),
        }
    }

    fn optional_reasoning(
        &self,
        key: &'static str,
    ) -> Result<Option<Reasoning>, ParameterError> {
        match self.bag.get(key) {
            None => Ok(None),
            Some(Value::Bool(enabled)) => {
                Ok(Some(Reasoning::Enabled(*enabled)))
            }
            Some(Value::String(effort)) => {
                Ok(Some(Reasoning::Effort(effort.clone())))
            }
            Some(_) => Err(self.invalid(key, "a boolean or an effort level")),
        }
    }

    fn model_name(&self) -> Result<String, ParameterError> {
        let name = self.required_str("model_name")?;
        Ok(resolve_model_alias(self.server, &name).to_owned())
    }

    fn sampling(&self) -> Result<SamplingParams, ParameterError> {
        Ok(SamplingParams {
            temperature: self.optional_f64("temperature")?,
            top_p: self.optional_f64("top_p")?,
            max_tokens: self.optional_u32("max_tokens")?,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct SamplingParams {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct OpenAIParams {
    pub model_name: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub sampling: SamplingParams,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AnthropicParams {
    pub model_name: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub stop: Vec<String>,
    pub sampling: SamplingParams,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GroqParams {
    pub model_name: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub reasoning_effort: Option<String>,
    pub sampling: SamplingParams,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct OllamaParams {
    pub model_name: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub format: Option<Value>,
    pub num_ctx: Option<u32>,
    pub reasoning: Option<Reasoning>,
    pub sampling: SamplingParams,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct VllmParams {
    pub model_name: Option<String>,
    pub base_url: String,
    pub api_key: String,
    pub sampling: SamplingParams,
}

/// Validated parameters of one provider.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ProviderParams {
    Anthropic(AnthropicParams),
    Groq(GroqParams),
    OpenAI(OpenAIParams),
    Ollama(OllamaParams),
    Vllm(VllmParams),
}

impl ProviderParams {
    pub fn from_bag(
        server: LlmServer,
        bag: &ParameterBag,
    ) -> Result<Self, ParameterError> {
        let r = Reader { server, bag };
        let params = match server {
            LlmServer::Anthropic => ProviderParams::Anthropic(AnthropicParams {
                model_name: r.model_name()?,
                api_key: r.required_str("api_key")?,
                base_url: r.optional_str("base_url")?,
                timeout: r.optional_duration("timeout")?,
                stop: r.optional_str_list("stop")?,
                sampling: r.sampling()?,
            }),
            LlmServer::Groq => ProviderParams::Groq(GroqParams {
                model_name: r.model_name()?,
                api_key: r.required_str("api_key")?,
                base_url: r.optional_str("base_url")?,
                reasoning_effort: r
                    .optional_str_or("reasoning_effort", "reasoning")?,
                sampling: r.sampling()?,
            }),
            LlmServer::OpenAI => ProviderParams::OpenAI(OpenAIParams {
                model_name: r.model_name()?,
                api_key: r.required_str("api_key")?,
                base_url: r.optional_str("base_url")?,
                sampling: r.sampling()?,
            }),
            LlmServer::Ollama => ProviderParams::Ollama(OllamaParams {
                model_name: r.model_name()?,
                base_url: r.required_str("base_url")?,
                api_key: r.optional_str("api_key")?,
                format: r.bag.get("format").cloned(),
                num_ctx: r.optional_u32("num_ctx")?,
                reasoning: match r.optional_reasoning("reasoning")? {
                    Some(reasoning) => Some(reasoning),
                    None => r.optional_reasoning("reasoning_effort")?,
                },
                sampling: r.sampling()?,
            }),
            LlmServer::Vllm => ProviderParams::Vllm(VllmParams {
                model_name: r.optional_str("model_name")?,
                base_url: r.required_str("base_url")?,
                api_key: r.required_str("api_key")?,
                sampling: r.sampling()?,
            }),
        };
        Ok(params)
    }

    #[inline]
    pub fn server(&self) -> LlmServer {
        match self {
            ProviderParams::Anthropic(_) => LlmServer::Anthropic,
            ProviderParams::Groq(_) => LlmServer::Groq,
            ProviderParams::OpenAI(_) => LlmServer::OpenAI,
            ProviderParams::Ollama(_) => LlmServer::Ollama,
            ProviderParams::Vllm(_) => LlmServer::Vllm,
        }
    }

    pub fn into_handle(self) -> Result<ChatModelHandle, ResolveError> {
        let server = self.server();
        match self {
            ProviderParams::Anthropic(p) => {
                let mut builder =
                    AnthropicConfigBuilder::new(p.api_key, p.model_name)
                        .with_stop_sequences(p.stop);
                if let Some(base_url) = p.base_url {
                    builder = builder.with_base_url(base_url);
                }
                if let Some(timeout) = p.timeout {
                    builder = builder.with_timeout(timeout);
                }
                if let Some(temperature) = p.sampling.temperature {
                    builder = builder.with_temperature(temperature);
                }
                if let Some(top_p) = p.sampling.top_p {
                    builder = builder.with_top_p(top_p);
                }
                if let Some(max_tokens) = p.sampling.max_tokens {
                    builder = builder.with_max_tokens(max_tokens);
                }
                let provider = AnthropicProvider::new(builder.build())
                    .map_err(|err| ResolveError::construction(server, err))?;
                Ok(ChatModelHandle::Anthropic(provider))
            }
            ProviderParams::Groq(p) => {
                let mut builder = OpenAIConfigBuilder::with_api_key(p.api_key)
                    .with_model(p.model_name)
                    .with_base_url(
                        p.base_url.unwrap_or_else(|| GROQ_BASE_URL.to_owned()),
                    )
                    .with_service_tier(GROQ_SERVICE_TIER);
                if let Some(effort) = p.reasoning_effort {
                    builder = builder.with_reasoning_effort(effort);
                }
                openai_compatible(server, with_sampling(builder, p.sampling))
            }
            ProviderParams::OpenAI(p) => {
                let mut builder = OpenAIConfigBuilder::with_api_key(p.api_key)
                    .with_model(p.model_name);
                if let Some(base_url) = p.base_url {
                    builder = builder.with_base_url(base_url);
                }
                openai_compatible(server, with_sampling(builder, p.sampling))
            }
            ProviderParams::Ollama(p) => {
                let mut builder =
                    OllamaConfigBuilder::new(p.base_url, p.model_name);
                if let Some(api_key) = p.api_key {
                    builder = builder.with_api_key(api_key);
                }
                if let Some(format) = p.format {
                    builder = builder.with_format(format);
                }
                if let Some(num_ctx) = p.num_ctx {
                    builder = builder.with_num_ctx(num_ctx);
                }
                if let Some(reasoning) = p.reasoning {
                    builder = builder.with_reasoning(reasoning);
                }
                if let Some(temperature) = p.sampling.temperature {
                    builder = builder.with_temperature(temperature);
                }
                if let Some(top_p) = p.sampling.top_p {
                    builder = builder.with_top_p(top_p);
                }
                if let Some(max_tokens) = p.sampling.max_tokens {
                    builder = builder.with_max_tokens(max_tokens);
                }
                let provider = OllamaProvider::new(builder.build())
                    .map_err(|err| ResolveError::construction(server, err))?;
                Ok(ChatModelHandle::Ollama(provider))
            }
            ProviderParams::Vllm(p) => {
                let mut builder = OpenAIConfigBuilder::with_api_key(p.api_key)
                    .with_base_url(p.base_url);
                if let Some(model_name) = p.model_name {
                    builder = builder.with_model(model_name);
                }
                openai_compatible(server, with_sampling(builder, p.sampling))
            }
        }
    }
}

fn with_sampling(
    mut builder: OpenAIConfigBuilder,
    sampling: SamplingParams,
) -> OpenAIConfigBuilder {
    if let Some(temperature) = sampling.temperature {
        builder = builder.with_temperature(temperature);
    }
    if let Some(top_p) = sampling.top_p {
        builder = builder.with_top_p(top_p);
    }
    if let Some(max_tokens) = sampling.max_tokens {
        builder = builder.with_max_tokens(max_tokens);
    }
    builder
}

fn openai_compatible(
    server: LlmServer,
    builder: OpenAIConfigBuilder,
) -> Result<ChatModelHandle, ResolveError> {
    let provider = OpenAIProvider::new(builder.build())
        .map_err(|err| ResolveError::construction(server, err))?;
    Ok(ChatModelHandle::OpenAICompatible { server, provider })
}
