//! Turns a provider name and a loose parameter map into a chat model.

mod handle;
mod params;
#[cfg(test)]
mod tests;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::str::FromStr;

use ai_common_ollama_model::{OllamaConfigBuilder, OllamaProvider};
use thiserror::Error;

pub use handle::{ChatModelHandle, HandleError};
pub use params::{ParameterBag, ParameterError};

use params::ProviderParams;

/// The LLM servers a chat model can be resolved for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LlmServer {
    /// Anthropic's Messages API.
    Anthropic,
    /// Groq's OpenAI-compatible API.
    Groq,
    /// OpenAI's Chat Completions API.
    OpenAI,
    /// A self-hosted or cloud Ollama server.
    Ollama,
    /// A self-hosted vLLM server.
    Vllm,
}

impl LlmServer {
    /// All servers, in alphabetical order.
    pub const ALL: [LlmServer; 5] = [
        LlmServer::Anthropic,
        LlmServer::Groq,
        LlmServer::OpenAI,
        LlmServer::Ollama,
        LlmServer::Vllm,
    ];

    /// The lowercase name of the server.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            LlmServer::Anthropic => "anthropic",
            LlmServer::Groq => "groq",
            LlmServer::OpenAI => "openai",
            LlmServer::Ollama => "ollama",
            LlmServer::Vllm => "vllm",
        }
    }
}

impl Display for LlmServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The name isn't one of the supported LLM servers.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unsupported llm server `{0}`")]
pub struct UnknownServerError(pub String);

impl FromStr for LlmServer {
    type Err = UnknownServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        LlmServer::ALL
            .into_iter()
            .find(|server| server.as_str() == name)
            .ok_or_else(|| UnknownServerError(s.to_owned()))
    }
}

/// Errors returned by [`resolve`].
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A parameter is missing or has the wrong type.
    #[error(transparent)]
    Configuration(#[from] ParameterError),
    /// The client for the provider couldn't be created.
    #[error("failed to create the {provider} client: {source}")]
    ProviderConstruction {
        /// The provider being resolved.
        provider: LlmServer,
        /// The client error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl ResolveError {
    pub(crate) fn construction<E>(provider: LlmServer, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        ResolveError::ProviderConstruction {
            provider,
            source: Box::new(source),
        }
    }

    /// Returns the provider the error is about.
    pub fn provider(&self) -> LlmServer {
        match self {
            ResolveError::Configuration(err) => err.provider(),
            ResolveError::ProviderConstruction { provider, .. } => *provider,
        }
    }
}

/// Creates a chat model for `server` from `params`.
///
/// Required keys per server, with optional ones in parentheses:
///
/// * `anthropic`: `model_name`, `api_key` (`timeout`, `stop`, `base_url`)
/// * `groq`: `model_name`, `api_key` (`reasoning_effort` or `reasoning`,
///   `base_url`)
/// * `openai`: `model_name`, `api_key` (`base_url`)
/// * `ollama`: `model_name`, `base_url` (`format`, `num_ctx`, `api_key`,
///   `reasoning` or `reasoning_effort`)
/// * `vllm`: `base_url`, `api_key` (`model_name`)
///
/// Every server also takes `temperature`, `top_p` and `max_tokens`.
///
/// Nothing is sent over the network here.
pub fn resolve(
    server: LlmServer,
    params: &ParameterBag,
) -> Result<ChatModelHandle, ResolveError> {
    let params = ProviderParams::from_bag(server, params)?;
    debug!("resolved parameters for {server}");
    params.into_handle()
}

/// Alias of [`resolve`].
#[inline]
pub fn get_llm(
    server: LlmServer,
    params: &ParameterBag,
) -> Result<ChatModelHandle, ResolveError> {
    resolve(server, params)
}

/// Maps portable model names to the name a server knows them by.
///
/// Unknown names are returned as they are.
pub fn resolve_model_alias(server: LlmServer, model_name: &str) -> &str {
    match (model_name, server) {
        ("gpt-oss-120b", LlmServer::Groq) => "openai/gpt-oss-120b",
        ("gpt-oss-120b", LlmServer::Ollama) => "gpt-oss:120b-cloud",
        ("gpt-oss-20b", LlmServer::Groq) => "openai/gpt-oss-20b",
        ("gpt-oss-20b", LlmServer::Ollama) => "gpt-oss:20b-cloud",
        _ => model_name,
    }
}

/// Makes sure `model_name` is available and loaded on the Ollama server at
/// `base_url`, pulling it first when needed.
pub async fn load_ollama_model(
    model_name: &str,
    base_url: &str,
) -> Result<(), ai_common_ollama_model::Error> {
    let config = OllamaConfigBuilder::new(base_url, model_name).build();
    OllamaProvider::new(config)?.ensure_model_loaded().await
}
