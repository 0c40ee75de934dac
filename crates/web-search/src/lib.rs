//! Concurrent web search with source deduplication and formatting.
//!
//! [`WebSearch`] sends a batch of queries to a [`SearchBackend`] at once,
//! waits for all of them, collapses results sharing a URL and renders the
//! unique sources as text ready to be put into a prompt.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod backend;
mod config;
mod error;
mod format;
mod index;
mod pipeline;
mod query;
mod tavily;

pub use backend::{SearchBackend, SearchRequest, SearchResult};
pub use config::{SearchCategory, SearchConfig, SearchConfigBuilder};
pub use error::{
    ConfigurationError, QueryOutcome, SearchBatchError, SearchError,
    SearchTransportError,
};
pub use format::{
    FormatOptions, FormattedSources, format_sources, truncate_chars,
};
pub use index::{SourceIndex, deduplicate_sources};
pub use pipeline::{SearchOutput, WebSearch};
pub use query::{Queries, SearchQueryPlan};
pub use tavily::TavilyClient;
