use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use mime::Mime;
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};

use crate::{
    ConfigurationError, SearchBackend, SearchRequest, SearchResult,
    SearchTransportError,
};

const DEFAULT_ENDPOINT: &str = "https://api.tavily.com/search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_RETRY_ELAPSED: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct SearchBody<'a> {
    query: &'a str,
    topic: &'static str,
    max_results: u32,
    include_raw_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    days: Option<u32>,
}

impl<'a> From<&'a SearchRequest> for SearchBody<'a> {
    fn from(req: &'a SearchRequest) -> Self {
        Self {
            query: &req.query,
            topic: req.category.as_str(),
            max_results: req.max_results,
            include_raw_content: req.include_raw_content,
            days: req.days,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// [`SearchBackend`] backed by the Tavily search API.
///
/// Connection failures, rate limiting and server errors are retried with
/// exponential backoff for up to 30 seconds per query.
#[derive(Clone)]
pub struct TavilyClient {
    client: Client,
    api_key: Arc<str>,
    endpoint: Arc<str>,
}

impl TavilyClient {
    /// Creates a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigurationError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigurationError::MissingApiKey);
        }
        if header::HeaderValue::from_str(&api_key).is_err() {
            return Err(ConfigurationError::Client(
                "api key contains characters not allowed in a header"
                    .to_owned(),
            ));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ConfigurationError::Client(err.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.into(),
        })
    }

    /// Sends requests to `endpoint` instead of the public API.
    #[inline]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().into();
        self
    }

    /// The URL queries are posted to.
    #[inline]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Debug for TavilyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TavilyClient")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl SearchBackend for TavilyClient {
    fn search(
        &self,
        request: SearchRequest,
    ) -> impl Future<Output = Result<Vec<SearchResult>, SearchTransportError>>
    + Send
    + 'static {
        let client = self.client.clone();
        let api_key = Arc::clone(&self.api_key);
        let endpoint = Arc::clone(&self.endpoint);

        async move {
            let body = SearchBody::from(&request);
            let policy = ExponentialBackoffBuilder::new()
                .with_max_elapsed_time(Some(MAX_RETRY_ELAPSED))
                .build();
            let results = backoff::future::retry(policy, || {
                let pending = client
                    .post(&*endpoint)
                    .bearer_auth(&*api_key)
                    .json(&body)
                    .send();
                let query = request.query.as_str();
                async move { classify(query, pending.await).await }
            })
            .await?;
            trace!(
                "tavily returned {} results for `{}`",
                results.len(),
                request.query
            );
            Ok(results)
        }
    }
}

/// Turns a response into results, or into a retryable or final error.
async fn classify(
    query: &str,
    resp: reqwest::Result<reqwest::Response>,
) -> Result<Vec<SearchResult>, backoff::Error<SearchTransportError>> {
    let resp = match resp {
        Ok(resp) => resp,
        Err(err) => {
            let transient = err.is_connect() || err.is_timeout();
            error!("search request for `{query}` failed: {err}");
            let err = SearchTransportError::new(query, err.to_string());
            return Err(if transient {
                backoff::Error::transient(err)
            } else {
                backoff::Error::permanent(err)
            });
        }
    };

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        error!("tavily responded with {status} for `{query}`: {body}");
        let err = SearchTransportError::new(query, format!("{status}: {body}"))
            .with_status(status.as_u16());
        return Err(if is_retryable(status) {
            backoff::Error::transient(err)
        } else {
            backoff::Error::permanent(err)
        });
    }

    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Mime>().ok());
    if let Some(mime) = content_type {
        if mime.subtype() != mime::JSON {
            return Err(backoff::Error::permanent(SearchTransportError::new(
                query,
                format!("unexpected content type: {mime}"),
            )));
        }
    }

    let resp: SearchResponse = resp.json().await.map_err(|err| {
        backoff::Error::permanent(SearchTransportError::new(
            query,
            format!("invalid response: {err}"),
        ))
    })?;
    Ok(resp.results)
}

#[inline]
fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::SearchCategory;

    #[test]
    fn test_news_body() {
        let req = SearchRequest {
            query: "rust release".to_owned(),
            category: SearchCategory::News,
            days: Some(7),
            max_results: 3,
            include_raw_content: true,
        };
        assert_eq!(
            serde_json::to_value(SearchBody::from(&req)).unwrap(),
            json!({
                "query": "rust release",
                "topic": "news",
                "max_results": 3,
                "include_raw_content": true,
                "days": 7
            })
        );
    }

    #[test]
    fn test_general_body_has_no_days() {
        let req = SearchRequest {
            query: "borrow checker".to_owned(),
            category: SearchCategory::General,
            days: None,
            max_results: 5,
            include_raw_content: false,
        };
        let body = serde_json::to_value(SearchBody::from(&req)).unwrap();
        assert!(body.get("days").is_none());
        assert_eq!(body["topic"], "general");
    }

    #[test]
    fn test_parse_response() {
        let resp: SearchResponse = serde_json::from_value(json!({
            "query": "borrow checker",
            "response_time": 1.2,
            "results": [{
                "title": "The Rust Book",
                "url": "https://doc.rust-lang.org/book/",
                "content": "References and borrowing",
                "raw_content": "Full chapter",
                "score": 0.97,
                "published_date": "2024-11-02"
            }]
        }))
        .unwrap();
        assert_eq!(resp.results.len(), 1);
        let result = &resp.results[0];
        assert_eq!(result.raw_content(), Some("Full chapter"));
        assert_eq!(result.published_date.as_deref(), Some("2024-11-02"));
    }

    #[test]
    fn test_retryable_status() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_new_rejects_bad_keys() {
        assert_eq!(
            TavilyClient::new("").unwrap_err(),
            ConfigurationError::MissingApiKey
        );
        assert!(matches!(
            TavilyClient::new("tvly\nkey"),
            Err(ConfigurationError::Client(_))
        ));
        let client = TavilyClient::new("tvly-key").unwrap();
        assert_eq!(client.endpoint(), DEFAULT_ENDPOINT);
        assert!(!format!("{client:?}").contains("tvly-key"));
    }
}
