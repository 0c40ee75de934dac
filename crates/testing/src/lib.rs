//! Local fakes of chat models and search backends for testing purpose.

mod preset;

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use ai_common_model::{
    ChatMessage, ChatModel, ChatRequest, ChatResponse, ErrorKind,
    FinishReason, ModelProviderError,
};
use ai_common_web_search::{
    SearchBackend, SearchRequest, SearchResult, SearchTransportError,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A local fake chat model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should answer. The step is selected by the number of assistant
/// messages in the request, so a fresh conversation gets the first step.
/// If there are no enough steps in the script, an error will be returned.
#[derive(Clone, Default)]
pub struct TestChatModel {
    model_name: Option<String>,
    script: Vec<PresetResponse>,
    delay: Option<Duration>,
    attempts: Arc<Mutex<HashMap<usize, u64>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl TestChatModel {
    #[inline]
    pub fn add_response_step(&mut self, preset: PresetResponse) {
        self.script.push(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    #[inline]
    pub fn set_model_name(&mut self, model_name: impl Into<String>) {
        self.model_name = Some(model_name.into());
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn answer(&self, req: &ChatRequest) -> Result<ChatResponse, Error> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(req.clone());

        let step_idx = req
            .messages
            .iter()
            .filter(|msg| matches!(msg, ChatMessage::Assistant(_)))
            .count();
        let Some(step) = self.script.get(step_idx) else {
            return Err(Error {
                message: "no enough steps".to_owned(),
                kind: ErrorKind::Other,
            });
        };

        let mut attempts =
            self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
        let attempt = attempts.entry(step_idx).or_default();
        *attempt += 1;
        let failing = match step.failures {
            Some(0) => true,
            Some(failures) => *attempt <= failures,
            None => false,
        };
        if failing {
            return Err(Error {
                message: format!("simulated failure of step {step_idx}"),
                kind: ErrorKind::RateLimitExceeded,
            });
        }

        Ok(ChatResponse {
            content: step.content.clone(),
            reasoning: step.reasoning.clone(),
            usage: step.usage,
            finish_reason: Some(FinishReason::Stop),
        })
    }
}

impl ChatModel for TestChatModel {
    type Error = crate::Error;

    #[inline]
    fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, Self::Error>> + Send + 'static
    {
        let result = self.answer(req);
        let delay = self.delay.unwrap_or(Duration::from_millis(1));
        async move {
            sleep(delay).await;
            result
        }
    }
}

/// A local fake search backend for testing purpose.
///
/// Every query it will be asked needs a preset; unknown queries fail.
#[derive(Clone, Default)]
pub struct TestSearchBackend {
    presets: HashMap<String, PresetSearch>,
    calls: Arc<Mutex<Vec<String>>>,
    completed: Arc<AtomicUsize>,
}

impl TestSearchBackend {
    #[inline]
    pub fn add_preset(
        &mut self,
        query: impl Into<String>,
        preset: PresetSearch,
    ) {
        self.presets.insert(query.into(), preset);
    }

    /// Shorthand for a preset answering `query` with `results`.
    #[inline]
    pub fn add_results(
        &mut self,
        query: impl Into<String>,
        results: impl Into<Vec<SearchResult>>,
    ) {
        self.add_preset(query, PresetSearch::with_results(results));
    }

    /// Returns the queries received so far, in dispatch order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns how many queries ran to completion.
    #[inline]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl Debug for TestSearchBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSearchBackend")
            .field("queries", &self.presets.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl SearchBackend for TestSearchBackend {
    fn search(
        &self,
        request: SearchRequest,
    ) -> impl Future<Output = Result<Vec<SearchResult>, SearchTransportError>>
    + Send
    + 'static {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.query.clone());
        let preset = self.presets.get(&request.query).cloned();
        let completed = Arc::clone(&self.completed);

        async move {
            let Some(preset) = preset else {
                return Err(SearchTransportError::new(
                    request.query,
                    "no preset for query",
                ));
            };
            if preset.delay_ms > 0 {
                sleep(Duration::from_millis(preset.delay_ms)).await;
            }
            completed.fetch_add(1, Ordering::SeqCst);
            match preset.failure {
                Some(message) => {
                    Err(SearchTransportError::new(request.query, message))
                }
                None => Ok(preset
                    .results
                    .into_iter()
                    .take(request.max_results as usize)
                    .collect()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ai_common_web_search::SearchCategory;

    use super::*;

    fn request(query: &str) -> SearchRequest {
        SearchRequest {
            query: query.to_owned(),
            category: SearchCategory::General,
            days: None,
            max_results: 2,
            include_raw_content: false,
        }
    }

    #[tokio::test]
    async fn test_chat_steps() {
        let mut model = TestChatModel::default();
        model.add_response_step(
            PresetResponse::with_content("Hello, world!").with_usage(3, 4),
        );
        model.add_response_step(
            PresetResponse::with_content("Sure.").with_failures(1),
        );

        let mut req = ChatRequest::from_user("Hi");
        let resp = model.send_request(&req).await.unwrap();
        assert_eq!(resp.content, "Hello, world!");
        assert_eq!(resp.usage.total(), 7);

        req.messages.push(ChatMessage::Assistant(resp.content));
        req.messages.push(ChatMessage::User("Again".to_owned()));
        let err = model.send_request(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        let resp = model.send_request(&req).await.unwrap();
        assert_eq!(resp.content, "Sure.");
        assert_eq!(model.requests().len(), 3);

        req.messages.push(ChatMessage::Assistant(resp.content));
        let err = model.send_request(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[tokio::test]
    async fn test_search_presets() {
        let mut backend = TestSearchBackend::default();
        backend.add_results(
            "rust",
            [
                SearchResult::new("https://a.example", "A", "a"),
                SearchResult::new("https://b.example", "B", "b"),
                SearchResult::new("https://c.example", "C", "c"),
            ],
        );
        backend.add_preset("down", PresetSearch::failing("503"));

        let results = backend.search(request("rust")).await.unwrap();
        assert_eq!(results.len(), 2);
        let err = backend.search(request("down")).await.unwrap_err();
        assert_eq!(err.query, "down");
        let err = backend.search(request("unknown")).await.unwrap_err();
        assert_eq!(err.message, "no preset for query");

        assert_eq!(backend.calls(), ["rust", "down", "unknown"]);
        assert_eq!(backend.completed(), 2);
    }
}
