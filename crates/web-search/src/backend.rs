use serde::{Deserialize, Serialize};

use crate::{SearchCategory, SearchTransportError};

/// One query as sent to a [`SearchBackend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    /// The query text.
    pub query: String,
    /// The search category.
    pub category: SearchCategory,
    /// Recency window in days, only set for news searches.
    pub days: Option<u32>,
    /// Upper bound on the number of results.
    pub max_results: u32,
    /// Whether the full page content is wanted.
    pub include_raw_content: bool,
}

/// A single hit returned by a search backend.
///
/// The URL identifies the source: two results with the same URL are the
/// same source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The page URL.
    pub url: String,
    /// The page title.
    #[serde(default)]
    pub title: String,
    /// The snippet most relevant to the query.
    #[serde(default)]
    pub content: String,
    /// The full page content, when requested and available.
    #[serde(default)]
    pub raw_content: Option<String>,
    /// Publication date as reported by the backend.
    #[serde(default)]
    pub published_date: Option<String>,
    /// Relevance score.
    #[serde(default)]
    pub score: Option<f64>,
}

impl SearchResult {
    /// Creates a result with the given URL, title and snippet.
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Attaches the full page content.
    #[inline]
    pub fn with_raw_content(mut self, raw_content: impl Into<String>) -> Self {
        self.raw_content = Some(raw_content.into());
        self
    }

    /// Attaches the publication date.
    #[inline]
    pub fn with_published_date(mut self, date: impl Into<String>) -> Self {
        self.published_date = Some(date.into());
        self
    }

    /// Returns the raw content if it is present and not empty.
    #[inline]
    pub fn raw_content(&self) -> Option<&str> {
        self.raw_content.as_deref().filter(|raw| !raw.is_empty())
    }
}

/// Something that answers search queries.
///
/// The returned future owns everything it needs, so the pipeline can poll
/// many of them at once and drop them all on cancellation.
pub trait SearchBackend: Send + Sync {
    /// Runs one query.
    fn search(
        &self,
        request: SearchRequest,
    ) -> impl Future<Output = Result<Vec<SearchResult>, SearchTransportError>>
    + Send
    + 'static;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_result() {
        let result: SearchResult = serde_json::from_value(json!({
            "url": "https://a.example",
            "title": "A",
            "content": "snippet",
            "raw_content": null,
            "score": 0.82
        }))
        .unwrap();
        assert_eq!(result.url, "https://a.example");
        assert_eq!(result.raw_content, None);
        assert_eq!(result.score, Some(0.82));
    }

    #[test]
    fn test_empty_raw_content_is_absent() {
        let result = SearchResult::new("https://a.example", "A", "snippet")
            .with_raw_content("");
        assert_eq!(result.raw_content(), None);
    }
}
