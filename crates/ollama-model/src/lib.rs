//! A chat model for Ollama's native API, plus helpers for managing the
//! models available on an Ollama server.
//!
//! The native API is used instead of the OpenAI-compatible one because only
//! the former honors `format` and `num_ctx`.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use ai_common_model::{
    ChatModel, ChatRequest, ChatResponse, ErrorKind, ModelProviderError,
};
use reqwest::{Client, RequestBuilder, Response, Url, header};
use serde::de::DeserializeOwned;

pub use config::{OllamaConfig, OllamaConfigBuilder, Reasoning};

/// Error type for [`OllamaProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Ollama chat model.
#[derive(Clone, Debug)]
pub struct OllamaProvider {
    client: Client,
    config: Arc<OllamaConfig>,
}

impl OllamaProvider {
    /// Creates a new `OllamaProvider` with the given configuration.
    pub fn new(config: OllamaConfig) -> Result<Self, Error> {
        if let Err(err) = Url::parse(&config.base_url) {
            return Err(Error::new(
                format!("invalid base url `{}`: {err}", config.base_url),
                ErrorKind::Other,
            ));
        }

        let mut headers = header::HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            let mut value = header::HeaderValue::from_str(&format!(
                "Bearer {api_key}"
            ))
            .map_err(|_| {
                Error::new(
                    "api key contains characters not allowed in a header",
                    ErrorKind::Authentication,
                )
            })?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Lists the models available on the server.
    pub async fn list_models(&self) -> Result<Vec<String>, Error> {
        let resp: proto::TagsResponse =
            send_json(self.client.get(self.endpoint("api/tags"))).await?;
        Ok(resp
            .models
            .into_iter()
            .map(|m| m.model.unwrap_or(m.name))
            .collect())
    }

    /// Downloads a model to the server, waiting until it completes.
    pub async fn pull_model(&self, model: &str) -> Result<(), Error> {
        info!("pulling {model}");
        let resp: proto::StatusResponse = send_json(
            self.client
                .post(self.endpoint("api/pull"))
                .json(&proto::ModelRequestBody {
                    model,
                    stream: false,
                }),
        )
        .await?;
        if resp.status != "success" {
            return Err(Error::new(
                format!("pulling {model} ended with `{}`", resp.status),
                ErrorKind::InvalidResponse,
            ));
        }
        Ok(())
    }

    /// Loads a model into memory by sending a generate request without a
    /// prompt.
    pub async fn load_model(&self, model: &str) -> Result<(), Error> {
        debug!("loading {model} into memory");
        send_json::<serde_json::Value>(
            self.client
                .post(self.endpoint("api/generate"))
                .json(&proto::ModelRequestBody {
                    model,
                    stream: false,
                }),
        )
        .await?;
        Ok(())
    }

    /// Makes sure the configured model is present and loaded, pulling it
    /// first if the server doesn't have it.
    pub async fn ensure_model_loaded(&self) -> Result<(), Error> {
        let model = self.config.model.as_str();
        let available = self.list_models().await?;
        if !available.iter().any(|m| same_model(m, model)) {
            self.pull_model(model).await?;
        }
        self.load_model(model).await
    }

    #[inline]
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }
}

impl ChatModel for OllamaProvider {
    type Error = Error;

    #[inline]
    fn model_name(&self) -> Option<&str> {
        Some(&self.config.model)
    }

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, Self::Error>> + Send + 'static
    {
        let ollama_req = proto::create_request(req, &self.config);
        trace!("sending a chat request: {ollama_req:?}");
        let builder =
            self.client.post(self.endpoint("api/chat")).json(&ollama_req);

        async move {
            let resp: proto::ChatResponseBody = send_json(builder).await?;
            Ok(proto::into_chat_response(resp))
        }
    }
}

async fn send_json<T: DeserializeOwned>(
    builder: RequestBuilder,
) -> Result<T, Error> {
    let resp = match builder.send().await.and_then(Response::error_for_status) {
        Ok(resp) => resp,
        Err(err) => {
            error!("request failed: {err}");
            let kind = err
                .status()
                .map(|status| ErrorKind::from_status(status.as_u16()))
                .unwrap_or(ErrorKind::Other);
            return Err(Error::new(format!("{err}"), kind));
        }
    };
    resp.json()
        .await
        .map_err(|err| Error::new(format!("{err}"), ErrorKind::InvalidResponse))
}

/// Compares model names, treating a missing tag as `latest`.
fn same_model(a: &str, b: &str) -> bool {
    with_default_tag(a) == with_default_tag(b)
}

fn with_default_tag(name: &str) -> Cow<'_, str> {
    let base = name.rsplit_once('/').map_or(name, |(_, base)| base);
    if base.contains(':') {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{name}:latest"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let config =
            OllamaConfigBuilder::new("https://ollama.com", "gpt-oss:20b-cloud")
                .with_api_key("secret")
                .build();
        let provider = OllamaProvider::new(config).unwrap();
        assert_eq!(provider.model_name(), Some("gpt-oss:20b-cloud"));
        assert_eq!(
            provider.endpoint("api/tags"),
            "https://ollama.com/api/tags"
        );
        assert!(!format!("{:?}", provider.config()).contains("secret"));
    }

    #[test]
    fn test_new_rejects_bad_url() {
        let config = OllamaConfigBuilder::new("", "llama3").build();
        assert!(OllamaProvider::new(config).is_err());

        let config =
            OllamaConfigBuilder::new("http://localhost:11434", "llama3")
                .with_api_key("line\nbreak")
                .build();
        let err = OllamaProvider::new(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_same_model_defaults_tag() {
        assert!(same_model("llama3:latest", "llama3"));
        assert!(same_model("llama3", "llama3"));
        assert!(same_model("gpt-oss:20b-cloud", "gpt-oss:20b-cloud"));
        assert!(!same_model("llama3:8b", "llama3"));
        assert!(same_model(
            "registry.example:5000/team/llama3:latest",
            "registry.example:5000/team/llama3"
        ));
        assert!(!same_model("qwen3", "llama3"));
    }
}
