use ai_common_model::TokenUsage;
use ai_common_web_search::SearchResult;
use serde::{Deserialize, Serialize};

/// The preset answer for one chat step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetResponse {
    /// The answer text.
    pub content: String,
    /// Out-of-band reasoning, if the fake provider should report some.
    #[serde(default)]
    pub reasoning: Option<String>,
    /// Reported token usage.
    #[serde(default)]
    pub usage: TokenUsage,
    /// If set, the request will fail in the first `failure` attempts.
    /// `Some(0)` means the request will fail infinitely.
    #[serde(default)]
    pub failures: Option<u64>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` answering with `content`.
    #[inline]
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Sets the out-of-band reasoning.
    #[inline]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    /// Sets the reported token usage.
    #[inline]
    pub fn with_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.usage = TokenUsage::new(input_tokens, output_tokens);
        self
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }
}

/// The preset answer for one search query.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetSearch {
    /// Results returned for the query.
    #[serde(default)]
    pub results: Vec<SearchResult>,
    /// How long the query takes, in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,
    /// If set, the query fails with this message after the delay.
    #[serde(default)]
    pub failure: Option<String>,
}

impl PresetSearch {
    /// Creates a `PresetSearch` returning `results`.
    #[inline]
    pub fn with_results(results: impl Into<Vec<SearchResult>>) -> Self {
        Self {
            results: results.into(),
            ..Default::default()
        }
    }

    /// Creates a `PresetSearch` that fails with `message`.
    #[inline]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    /// Delays the answer by `delay_ms` milliseconds.
    #[inline]
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_presets() {
        let response: PresetResponse = serde_json::from_value(json!({
            "content": "{\"queries\": []}",
            "usage": { "input_tokens": 10, "output_tokens": 4 }
        }))
        .unwrap();
        assert_eq!(
            response,
            PresetResponse::with_content("{\"queries\": []}").with_usage(10, 4)
        );

        let search: PresetSearch = serde_json::from_value(json!({
            "results": [{
                "url": "https://a.example",
                "title": "A",
                "content": "snippet"
            }],
            "delay_ms": 20
        }))
        .unwrap();
        assert_eq!(
            search,
            PresetSearch::with_results([SearchResult::new(
                "https://a.example",
                "A",
                "snippet"
            )])
            .with_delay_ms(20)
        );
    }
}
