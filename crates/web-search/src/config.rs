use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use crate::ConfigurationError;
use crate::backend::SearchRequest;
use crate::format::FormatOptions;

const DEFAULT_DAYS_BACK: i64 = 7;
const DEFAULT_MAX_RESULTS: i64 = 3;
const DEFAULT_MAX_TOKENS_PER_SOURCE: usize = 1000;

/// The kind of content to search for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SearchCategory {
    /// Web pages of any kind.
    #[default]
    General,
    /// News articles, limited to a recency window.
    News,
}

impl SearchCategory {
    /// The topic name used on the wire.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            SearchCategory::General => "general",
            SearchCategory::News => "news",
        }
    }
}

impl Display for SearchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchCategory {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(SearchCategory::General),
            "news" => Ok(SearchCategory::News),
            _ => Err(ConfigurationError::InvalidCategory(s.to_owned())),
        }
    }
}

/// Builder for [`SearchConfig`].
#[derive(Clone, PartialEq)]
pub struct SearchConfigBuilder {
    api_key: String,
    category: SearchCategory,
    days_back: i64,
    include_raw_content: bool,
    max_results_per_query: i64,
    max_tokens_per_source: usize,
    max_total_chars: Option<usize>,
}

impl SearchConfigBuilder {
    /// Creates a builder with the given API key and default settings.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            category: SearchCategory::General,
            days_back: DEFAULT_DAYS_BACK,
            include_raw_content: false,
            max_results_per_query: DEFAULT_MAX_RESULTS,
            max_tokens_per_source: DEFAULT_MAX_TOKENS_PER_SOURCE,
            max_total_chars: None,
        }
    }

    /// Sets the search category.
    #[inline]
    pub fn with_category(mut self, category: SearchCategory) -> Self {
        self.category = category;
        self
    }

    /// Sets the recency window for news searches, in days.
    #[inline]
    pub fn with_days_back(mut self, days: i64) -> Self {
        self.days_back = days;
        self
    }

    /// Whether to ask for and print the full page content.
    #[inline]
    pub fn with_raw_content(mut self, include: bool) -> Self {
        self.include_raw_content = include;
        self
    }

    /// Sets how many results each query may return.
    #[inline]
    pub fn with_max_results_per_query(mut self, max_results: i64) -> Self {
        self.max_results_per_query = max_results;
        self
    }

    /// Sets the raw content limit of each source, in tokens.
    #[inline]
    pub fn with_max_tokens_per_source(mut self, max_tokens: usize) -> Self {
        self.max_tokens_per_source = max_tokens;
        self
    }

    /// Caps the formatted output at `max_chars` characters. Sources that
    /// don't fit are left out, starting from the last one.
    #[inline]
    pub fn with_max_total_chars(mut self, max_chars: usize) -> Self {
        self.max_total_chars = Some(max_chars);
        self
    }

    /// Validates the settings and builds the configuration.
    pub fn build(self) -> Result<SearchConfig, ConfigurationError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigurationError::MissingApiKey);
        }
        if self.days_back <= 0 {
            return Err(ConfigurationError::NonPositiveDaysBack(
                self.days_back,
            ));
        }
        if self.max_results_per_query <= 0 {
            return Err(ConfigurationError::NonPositiveMaxResults(
                self.max_results_per_query,
            ));
        }
        Ok(SearchConfig {
            api_key: self.api_key,
            category: self.category,
            days_back: u32::try_from(self.days_back).unwrap_or(u32::MAX),
            include_raw_content: self.include_raw_content,
            max_results_per_query: u32::try_from(self.max_results_per_query)
                .unwrap_or(u32::MAX),
            max_tokens_per_source: self.max_tokens_per_source,
            max_total_chars: self.max_total_chars,
        })
    }
}

impl Debug for SearchConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("category", &self.category)
            .field("days_back", &self.days_back)
            .finish_non_exhaustive()
    }
}

/// Validated web search settings.
#[derive(Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub(crate) api_key: String,
    category: SearchCategory,
    days_back: u32,
    include_raw_content: bool,
    max_results_per_query: u32,
    max_tokens_per_source: usize,
    max_total_chars: Option<usize>,
}

impl SearchConfig {
    /// The search category.
    #[inline]
    pub fn category(&self) -> SearchCategory {
        self.category
    }

    /// The recency window in days. Only news searches use it.
    #[inline]
    pub fn days_back(&self) -> u32 {
        self.days_back
    }

    /// Whether full page content is requested.
    #[inline]
    pub fn include_raw_content(&self) -> bool {
        self.include_raw_content
    }

    /// The result bound of each query.
    #[inline]
    pub fn max_results_per_query(&self) -> u32 {
        self.max_results_per_query
    }

    /// The raw content limit of each source, in tokens.
    #[inline]
    pub fn max_tokens_per_source(&self) -> usize {
        self.max_tokens_per_source
    }

    /// The character budget of the formatted output.
    #[inline]
    pub fn max_total_chars(&self) -> Option<usize> {
        self.max_total_chars
    }

    pub(crate) fn request_for(&self, query: &str) -> SearchRequest {
        SearchRequest {
            query: query.to_owned(),
            category: self.category,
            days: match self.category {
                SearchCategory::News => Some(self.days_back),
                SearchCategory::General => None,
            },
            max_results: self.max_results_per_query,
            include_raw_content: self.include_raw_content,
        }
    }

    /// Returns the options the formatted output is rendered with.
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            include_raw_content: self.include_raw_content,
            max_tokens_per_source: self.max_tokens_per_source,
            max_total_chars: self.max_total_chars,
        }
    }
}

impl Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &"<redacted>")
            .field("category", &self.category)
            .field("days_back", &self.days_back)
            .field("include_raw_content", &self.include_raw_content)
            .field("max_results_per_query", &self.max_results_per_query)
            .field("max_tokens_per_source", &self.max_tokens_per_source)
            .field("max_total_chars", &self.max_total_chars)
            .finish()
    }
}
