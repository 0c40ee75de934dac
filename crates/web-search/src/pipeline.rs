use futures_util::future::join_all;
use tracing::Instrument;

use crate::format::format_sources;
use crate::{
    ConfigurationError, QueryOutcome, SearchBackend, SearchBatchError,
    SearchConfig, SearchError, SearchResult, SourceIndex, TavilyClient,
};

/// Result of a successful [`WebSearch::search`].
#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutput {
    /// The sources rendered as text.
    pub formatted: String,
    /// Unique sources in query order, then result order.
    pub sources: Vec<SearchResult>,
    /// What happened to each query, in query order.
    pub outcomes: Vec<QueryOutcome>,
    /// Sources left out of `formatted` by the character budget.
    pub omitted: usize,
}

impl SearchOutput {
    /// Returns the queries that failed and were skipped.
    pub fn failed_queries(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.is_success())
            .map(QueryOutcome::query)
    }
}

/// Runs batches of queries against a search backend and merges the
/// results into a deduplicated, formatted source list.
#[derive(Clone, Debug)]
pub struct WebSearch<B = TavilyClient> {
    backend: B,
    config: SearchConfig,
}

impl WebSearch<TavilyClient> {
    /// Creates a pipeline that searches with Tavily.
    pub fn new(config: SearchConfig) -> Result<Self, ConfigurationError> {
        let backend = TavilyClient::new(config.api_key.clone())?;
        Ok(Self { backend, config })
    }
}

impl<B: SearchBackend> WebSearch<B> {
    /// Creates a pipeline on top of a custom backend.
    #[inline]
    pub fn with_backend(config: SearchConfig, backend: B) -> Self {
        Self { backend, config }
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Returns the backend.
    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs all `queries` concurrently and merges their results.
    ///
    /// Failed queries are logged and skipped. The call only fails if no
    /// query was given or every query failed. Dropping the returned future
    /// cancels all queries still in flight.
    pub async fn search<I, S>(
        &self,
        queries: I,
    ) -> Result<SearchOutput, SearchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queries: Vec<String> =
            queries.into_iter().map(Into::into).collect();
        if queries.is_empty() {
            return Err(SearchError::NoQueries);
        }
        debug!(
            "searching {} queries in category {}",
            queries.len(),
            self.config.category()
        );

        let pending = queries.iter().enumerate().map(|(idx, query)| {
            self.backend
                .search(self.config.request_for(query))
                .instrument(debug_span!(
                    "search query",
                    idx,
                    query = query.as_str()
                ))
        });
        let responses = join_all(pending).await;

        let max_results = self.config.max_results_per_query() as usize;
        let mut index = SourceIndex::new();
        let mut outcomes = Vec::with_capacity(queries.len());
        for (query, response) in queries.into_iter().zip(responses) {
            match response {
                Ok(mut results) => {
                    results.truncate(max_results);
                    outcomes.push(QueryOutcome::Succeeded {
                        query,
                        results: results.len(),
                    });
                    index.extend(results);
                }
                Err(err) => {
                    warn!("skipping failed query: {err}");
                    outcomes.push(QueryOutcome::Failed(err));
                }
            }
        }

        if !outcomes.iter().any(QueryOutcome::is_success) {
            return Err(SearchBatchError { outcomes }.into());
        }

        let formatted =
            format_sources(index.as_slice(), &self.config.format_options());
        debug!(
            "found {} unique sources, {} formatted",
            index.len(),
            formatted.included
        );
        Ok(SearchOutput {
            formatted: formatted.text,
            sources: index.into_sources(),
            outcomes,
            omitted: formatted.omitted,
        })
    }
}
