//! A chat model for OpenAI-compatible APIs.
//!
//! Besides OpenAI itself, this serves every server speaking the same
//! `/chat/completions` protocol, such as Groq and vLLM.

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
use mime::Mime;
use reqwest::{Client, Response, Url, header};
use tokio::sync::OnceCell;

pub use config::{OpenAIConfig, OpenAIConfigBuilder};

/// Error type for [`OpenAIProvider`].
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

/// OpenAI-compatible chat model.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
    discovered_model: Arc<OnceCell<String>>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    ///
    /// This validates the configuration and sets up the HTTP client, but
    /// doesn't connect to the server.
    pub fn new(config: OpenAIConfig) -> Result<Self, Error> {
        if let Err(err) = Url::parse(&config.base_url) {
            return Err(Error::new(
                format!("invalid base url `{}`: {err}", config.base_url),
                ErrorKind::Other,
            ));
        }
        if header::HeaderValue::from_str(&config.api_key).is_err() {
            return Err(Error::new(
                "api key contains characters not allowed in a header",
                ErrorKind::Authentication,
            ));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;

        Ok(Self {
            client,
            config: Arc::new(config),
            discovered_model: Arc::new(OnceCell::new()),
        })
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

impl ChatModel for OpenAIProvider {
    type Error = Error;

    fn model_name(&self) -> Option<&str> {
        self.config
            .model
            .as_deref()
            .or_else(|| self.discovered_model.get().map(String::as_str))
    }

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, Self::Error>> + Send + 'static
    {
        let client = self.client.clone();
        let config = Arc::clone(&self.config);
        let discovered_model = Arc::clone(&self.discovered_model);
        let req = req.clone();

        async move {
            let model = match &config.model {
                Some(model) => model.clone(),
                None => discovered_model
                    .get_or_try_init(|| discover_model(&client, &config))
                    .await?
                    .clone(),
            };

            let openai_req = proto::create_request(&req, &config, model);
            trace!("sending a chat completion request: {openai_req:?}");
            let resp = client
                .post(endpoint(&config.base_url, "chat/completions"))
                .bearer_auth(&config.api_key)
                .json(&openai_req)
                .send()
                .await;
            let resp = check_response(resp).await?;

            let completion: proto::ChatCompletion =
                resp.json().await.map_err(|err| {
                    Error::new(format!("{err}"), ErrorKind::InvalidResponse)
                })?;
            proto::into_chat_response(completion)
        }
    }
}

/// Asks the server which model it serves. Used when no model is configured.
async fn discover_model(
    client: &Client,
    config: &OpenAIConfig,
) -> Result<String, Error> {
    debug!("no model configured, asking {} for one", config.base_url);
    let resp = client
        .get(endpoint(&config.base_url, "models"))
        .bearer_auth(&config.api_key)
        .send()
        .await;
    let resp = check_response(resp).await?;
    let models: proto::ModelList = resp.json().await.map_err(|err| {
        Error::new(format!("{err}"), ErrorKind::InvalidResponse)
    })?;
    let Some(model) = models.data.into_iter().next() else {
        return Err(Error::new(
            "server doesn't serve any model",
            ErrorKind::InvalidResponse,
        ));
    };
    debug!("discovered model: {}", model.id);
    Ok(model.id)
}

#[inline]
fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

async fn check_response(
    resp: reqwest::Result<Response>,
) -> Result<Response, Error> {
    let resp = match resp {
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
        return Err(Error::new(
            format!("{status}: {body}"),
            ErrorKind::from_status(status.as_u16()),
        ));
    }

    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Mime>().ok());
    match content_type {
        Some(mime) if mime.subtype() != mime::JSON => Err(Error::new(
            format!("unexpected content type: {mime}"),
            ErrorKind::InvalidResponse,
        )),
        _ => Ok(resp),
    }
}
