use ai_common_anthropic_model::AnthropicProvider;
use ai_common_model::{
    ChatModel, ChatRequest, ChatResponse, ErrorKind, ModelProviderError,
};
use ai_common_ollama_model::OllamaProvider;
use ai_common_openai_model::OpenAIProvider;
use futures_util::TryFutureExt;
use futures_util::future::Either;
use thiserror::Error;

use super::LlmServer;

/// A chat model resolved by [`resolve`](super::resolve).
///
/// The handle owns its client. Cloning it is cheap and shares the
/// connection pool.
#[derive(Clone, Debug)]
pub enum ChatModelHandle {
    /// OpenAI, Groq or vLLM.
    OpenAICompatible {
        /// Which server the client talks to.
        server: LlmServer,
        /// The client.
        provider: OpenAIProvider,
    },
    /// Anthropic.
    Anthropic(AnthropicProvider),
    /// Ollama.
    Ollama(OllamaProvider),
}

impl ChatModelHandle {
    /// Returns the server this handle talks to.
    #[inline]
    pub fn server(&self) -> LlmServer {
        match self {
            ChatModelHandle::OpenAICompatible { server, .. } => *server,
            ChatModelHandle::Anthropic(_) => LlmServer::Anthropic,
            ChatModelHandle::Ollama(_) => LlmServer::Ollama,
        }
    }

    /// Returns the OpenAI-compatible client, if this is one.
    #[inline]
    pub fn as_openai(&self) -> Option<&OpenAIProvider> {
        match self {
            ChatModelHandle::OpenAICompatible { provider, .. } => {
                Some(provider)
            }
            _ => None,
        }
    }

    /// Returns the Anthropic client, if this is one.
    #[inline]
    pub fn as_anthropic(&self) -> Option<&AnthropicProvider> {
        match self {
            ChatModelHandle::Anthropic(provider) => Some(provider),
            _ => None,
        }
    }

    /// Returns the Ollama client, if this is one.
    #[inline]
    pub fn as_ollama(&self) -> Option<&OllamaProvider> {
        match self {
            ChatModelHandle::Ollama(provider) => Some(provider),
            _ => None,
        }
    }
}

/// Error type for [`ChatModelHandle`].
#[derive(Debug, Error)]
pub enum HandleError {
    /// Error of an OpenAI-compatible server.
    #[error(transparent)]
    OpenAI(#[from] ai_common_openai_model::Error),
    /// Error of the Anthropic API.
    #[error(transparent)]
    Anthropic(#[from] ai_common_anthropic_model::Error),
    /// Error of an Ollama server.
    #[error(transparent)]
    Ollama(#[from] ai_common_ollama_model::Error),
}

impl ModelProviderError for HandleError {
    fn kind(&self) -> ErrorKind {
        match self {
            HandleError::OpenAI(err) => err.kind(),
            HandleError::Anthropic(err) => err.kind(),
            HandleError::Ollama(err) => err.kind(),
        }
    }
}

impl ChatModel for ChatModelHandle {
    type Error = HandleError;

    fn model_name(&self) -> Option<&str> {
        match self {
            ChatModelHandle::OpenAICompatible { provider, .. } => {
                provider.model_name()
            }
            ChatModelHandle::Anthropic(provider) => provider.model_name(),
            ChatModelHandle::Ollama(provider) => provider.model_name(),
        }
    }

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, Self::Error>> + Send + 'static
    {
        trace!("dispatching a chat request to {}", self.server());
        match self {
            ChatModelHandle::OpenAICompatible { provider, .. } => Either::Left(
                provider.send_request(req).map_err(HandleError::from),
            ),
            ChatModelHandle::Anthropic(provider) => Either::Right(
                Either::Left(
                    provider.send_request(req).map_err(HandleError::from),
                ),
            ),
            ChatModelHandle::Ollama(provider) => Either::Right(Either::Right(
                provider.send_request(req).map_err(HandleError::from),
            )),
        }
    }
}
