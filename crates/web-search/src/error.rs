use thiserror::Error;

/// Invalid search settings, reported when the pipeline is built.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The category is not one the search API knows.
    #[error("invalid search category `{0}`, expected `general` or `news`")]
    InvalidCategory(String),
    /// The recency window must be at least one day.
    #[error("number of days back must be positive, got {0}")]
    NonPositiveDaysBack(i64),
    /// Each query must be allowed at least one result.
    #[error("max results per query must be positive, got {0}")]
    NonPositiveMaxResults(i64),
    /// No API key was given.
    #[error("missing search api key")]
    MissingApiKey,
    /// The HTTP client could not be set up.
    #[error("failed to create the search client: {0}")]
    Client(String),
}

/// A single query failed to reach the search API or got an error back.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("search for `{query}` failed: {message}")]
pub struct SearchTransportError {
    /// The query that failed.
    pub query: String,
    /// HTTP status, when the server answered.
    pub status: Option<u16>,
    /// What went wrong.
    pub message: String,
}

impl SearchTransportError {
    /// Creates an error for `query`.
    pub fn new(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Attaches the HTTP status.
    #[inline]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// What happened to one query of a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The query returned `results` hits (before deduplication).
    Succeeded {
        /// The query text.
        query: String,
        /// Number of hits returned.
        results: usize,
    },
    /// The query failed and was skipped.
    Failed(SearchTransportError),
}

impl QueryOutcome {
    /// Returns the query text.
    #[inline]
    pub fn query(&self) -> &str {
        match self {
            QueryOutcome::Succeeded { query, .. } => query,
            QueryOutcome::Failed(err) => &err.query,
        }
    }

    /// Returns `true` if the query succeeded.
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, QueryOutcome::Succeeded { .. })
    }
}

/// Every query of a batch failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{}", batch_message(.outcomes))]
pub struct SearchBatchError {
    /// Per-query outcomes, in query order. All of them are failures.
    pub outcomes: Vec<QueryOutcome>,
}

impl SearchBatchError {
    /// Iterates over the transport errors.
    pub fn errors(&self) -> impl Iterator<Item = &SearchTransportError> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            QueryOutcome::Failed(err) => Some(err),
            QueryOutcome::Succeeded { .. } => None,
        })
    }
}

fn batch_message(outcomes: &[QueryOutcome]) -> String {
    let mut message = format!("all {} search queries failed", outcomes.len());
    for outcome in outcomes {
        if let QueryOutcome::Failed(err) = outcome {
            message.push_str("; ");
            message.push_str(&err.to_string());
        }
    }
    message
}

/// Errors returned by [`WebSearch::search`](crate::WebSearch::search).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The batch had no queries.
    #[error("at least one search query is required")]
    NoQueries,
    /// Every query failed.
    #[error(transparent)]
    Batch(#[from] SearchBatchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_error_names_queries() {
        let err = SearchBatchError {
            outcomes: vec![
                QueryOutcome::Failed(
                    SearchTransportError::new("rust async", "timed out"),
                ),
                QueryOutcome::Failed(
                    SearchTransportError::new("tokio", "bad gateway")
                        .with_status(502),
                ),
            ],
        };
        let message = SearchError::from(err).to_string();
        assert_eq!(
            message,
            "all 2 search queries failed; \
             search for `rust async` failed: timed out; \
             search for `tokio` failed: bad gateway"
        );
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = QueryOutcome::Succeeded {
            query: "a".to_owned(),
            results: 3,
        };
        let failed =
            QueryOutcome::Failed(SearchTransportError::new("b", "refused"));
        assert!(ok.is_success());
        assert!(!failed.is_success());
        assert_eq!(ok.query(), "a");
        assert_eq!(failed.query(), "b");
    }
}
