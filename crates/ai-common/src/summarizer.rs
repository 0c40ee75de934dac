use ai_common_model::{ChatModel, ChatRequest, ModelProviderError, TokenUsage};
use ai_common_web_search::{
    FormatOptions, SearchBackend, SearchError, SearchResult, WebSearch,
    format_sources,
};
use futures_util::future::try_join_all;
use thiserror::Error;
use tracing::Instrument;

use crate::strip_thinking_tokens;

/// Characters of page content handed to the model per source.
const DEFAULT_MAX_CONTEXT_CHARS: usize = 100 * 1024;

const INSTRUCTIONS: &str = r#"
You are a world class researcher who is working on a report about a specific topic.

<goal>
Generate a very high quality informative summary of the given context in accordance with the topic.
</goal>

The topic you are working on:
<topic>
{topic}
</topic>

The context to use in generating the informative summary:
<context>
{context}
</context>

Prepare your summary according to the topic.
Include all necessary information related with the topic in your summary.
"#;

/// Sources whose content was replaced by a model-written summary.
#[derive(Clone, Debug, PartialEq)]
pub struct SummarizedSources {
    /// The summaries rendered like search results, without raw content.
    pub formatted: String,
    /// Unique sources in search order, `content` holding the summary.
    pub sources: Vec<SearchResult>,
    /// Tokens spent on all summaries.
    pub usage: TokenUsage,
}

/// Errors returned by [`SourceSummarizer`].
#[derive(Debug, Error)]
pub enum SummarizerError<E: ModelProviderError> {
    /// The web search failed.
    #[error(transparent)]
    Search(#[from] SearchError),
    /// Summarizing the source with this URL failed.
    #[error("summarizing `{url}` failed: {source}")]
    Model {
        /// URL of the source.
        url: String,
        /// Error of the model.
        #[source]
        source: E,
    },
}

/// Searches the web and has a chat model summarize every unique source.
#[derive(Clone, Debug)]
pub struct SourceSummarizer<M> {
    model: M,
    max_context_chars: usize,
}

impl<M: ChatModel> SourceSummarizer<M> {
    /// Creates a summarizer backed by `model`.
    #[inline]
    pub fn new(model: M) -> Self {
        Self {
            model,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }

    /// Caps the page content sent to the model per source.
    #[inline]
    pub fn with_max_context_chars(mut self, max_chars: usize) -> Self {
        self.max_context_chars = max_chars;
        self
    }

    /// Returns the model.
    #[inline]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Renders the instructions for one source.
    ///
    /// The raw page content is used when present, cut after the context
    /// limit; otherwise the search snippet.
    pub fn prompt(&self, topic: &str, source: &SearchResult) -> String {
        let context = match source.raw_content() {
            Some(raw) => match raw.char_indices().nth(self.max_context_chars)
            {
                Some((end, _)) => &raw[..end],
                None => raw,
            },
            None => &source.content,
        };
        INSTRUCTIONS
            .replace("{topic}", topic)
            .replace("{context}", context)
    }

    /// Runs `queries` through `search` and summarizes the unique sources.
    pub async fn search_and_summarize<B, I, S>(
        &self,
        search: &WebSearch<B>,
        topic: &str,
        queries: I,
    ) -> Result<SummarizedSources, SummarizerError<M::Error>>
    where
        B: SearchBackend,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let output = search.search(queries).await?;
        let options = search.config().format_options();
        self.summarize(topic, output.sources, &options).await
    }

    /// Summarizes all `sources` concurrently.
    ///
    /// The first failing request fails the whole batch and cancels the
    /// others. The summaries are formatted with `options`, but never with
    /// raw content.
    pub async fn summarize(
        &self,
        topic: &str,
        sources: Vec<SearchResult>,
        options: &FormatOptions,
    ) -> Result<SummarizedSources, SummarizerError<M::Error>> {
        debug!("summarizing {} sources", sources.len());
        let pending = sources.iter().enumerate().map(|(idx, source)| {
            let req = ChatRequest::from_user(self.prompt(topic, source));
            let url = source.url.clone();
            async move {
                self.model.send_request(&req).await.map_err(|err| SummarizerError::Model {
                    url,
                    source: err,
                })
            }
            .instrument(debug_span!(
                "summarize",
                idx,
                url = source.url.as_str()
            ))
        });
        let responses = try_join_all(pending).await?;

        let mut usage = TokenUsage::default();
        let sources: Vec<_> = sources
            .into_iter()
            .zip(responses)
            .map(|(source, resp)| {
                usage += resp.usage;
                SearchResult {
                    content: strip_thinking_tokens(&resp.content)
                        .trim()
                        .to_owned(),
                    raw_content: None,
                    ..source
                }
            })
            .collect();
        trace!(
            "summaries took {} input and {} output tokens",
            usage.input_tokens, usage.output_tokens
        );

        let options = FormatOptions {
            include_raw_content: false,
            ..*options
        };
        let formatted = format_sources(&sources, &options);
        Ok(SummarizedSources {
            formatted: formatted.text,
            sources,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use ai_common_testing::TestChatModel;

    use super::*;

    #[test]
    fn test_prompt_prefers_capped_raw_content() {
        let summarizer = SourceSummarizer::new(TestChatModel::default())
            .with_max_context_chars(4);
        let source = SearchResult::new("https://a.example", "A", "snippet")
            .with_raw_content("héllo world");
        let prompt = summarizer.prompt("greetings", &source);
        assert!(prompt.contains("<topic>\ngreetings\n</topic>"));
        assert!(prompt.contains("<context>\nhéll\n</context>"));

        let source = SearchResult::new("https://a.example", "A", "snippet");
        let prompt = summarizer.prompt("greetings", &source);
        assert!(prompt.contains("<context>\nsnippet\n</context>"));
    }
}
