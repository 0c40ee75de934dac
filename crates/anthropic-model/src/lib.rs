//! A chat model for the Anthropic Messages API.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use ai_common_model::{
    ChatModel, ChatRequest, ChatResponse, ErrorKind, ModelProviderError,
};
use reqwest::{Client, Url, header};

pub use config::{AnthropicConfig, AnthropicConfigBuilder};

const API_VERSION: &str = "2023-06-01";

/// Error type for [`AnthropicProvider`].
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

/// Anthropic chat model.
#[derive(Clone, Debug)]
pub struct AnthropicProvider {
    client: Client,
    config: Arc<AnthropicConfig>,
}

impl AnthropicProvider {
    /// Creates a new `AnthropicProvider` with the given configuration.
    ///
    /// The credentials are baked into the default headers of the HTTP
    /// client here, so a malformed key is rejected before any request.
    pub fn new(config: AnthropicConfig) -> Result<Self, Error> {
        if let Err(err) = Url::parse(&config.base_url) {
            return Err(Error::new(
                format!("invalid base url `{}`: {err}", config.base_url),
                ErrorKind::Other,
            ));
        }

        let mut api_key = header::HeaderValue::from_str(&config.api_key)
            .map_err(|_| {
                Error::new(
                    "api key contains characters not allowed in a header",
                    ErrorKind::Authentication,
                )
            })?;
        api_key.set_sensitive(true);
        let mut headers = header::HeaderMap::new();
        headers.insert("x-api-key", api_key);
        headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static(API_VERSION),
        );

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
    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }
}

impl ChatModel for AnthropicProvider {
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
        if req.response_format.is_some() {
            debug!("anthropic has no response format switch, ignoring it");
        }
        let anthropic_req = proto::create_request(req, &self.config);
        let url = format!(
            "{}/messages",
            self.config.base_url.trim_end_matches('/')
        );
        let resp_fut = self.client.post(url).json(&anthropic_req).send();

        async move {
            trace!("sent a messages request: {anthropic_req:?}");
            let resp = match resp_fut.await {
                Ok(resp) => resp,
                Err(err) => {
                    error!("request failed: {err}");
                    return Err(Error::new(format!("{err}"), ErrorKind::Other));
                }
            };

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                error!("server responded with {status}: {body}");
                // Prefer the structured message when the body has one.
                let message =
                    match serde_json::from_str::<proto::ErrorResponse>(&body) {
                        Ok(resp) => format!(
                            "{status}: {}: {}",
                            resp.error.r#type, resp.error.message
                        ),
                        Err(_) => format!("{status}: {body}"),
                    };
                let kind = match status.as_u16() {
                    529 => ErrorKind::RateLimitExceeded,
                    code => ErrorKind::from_status(code),
                };
                return Err(Error::new(message, kind));
            }

            let resp: proto::MessagesResponse =
                resp.json().await.map_err(|err| {
                    Error::new(format!("{err}"), ErrorKind::InvalidResponse)
                })?;
            proto::into_chat_response(resp)
        }
    }
}
