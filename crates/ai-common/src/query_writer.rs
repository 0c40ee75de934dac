use ai_common_model::{
    ChatModel, ChatRequest, ModelProviderError, ResponseFormat, TokenUsage,
};
use ai_common_web_search::{Queries, SearchQueryPlan};
use chrono::NaiveDate;
use thiserror::Error;

use crate::strip_thinking_tokens;

const DEFAULT_NUMBER_OF_QUERIES: usize = 3;

const INSTRUCTIONS: &str = r#"<Goal>
Generate targeted web search queries that gather comprehensive information for writing a summary about a topic.
You will generate exactly {number_of_queries} queries.
</Goal>

<topic>
{topic}
</topic>

Today's date is:
<today>
{today}
</today>

<Requirements>
When generating the search queries:
1. Cover different aspects of the topic.
2. Account for the most current information available as of today.

Your queries should be:
- Specific enough to avoid generic or irrelevant results.
- Targeted to gather specific information about the topic.
- Diverse enough to cover all aspects of the summary.
</Requirements>

<Format>
Respond with a JSON object with one field:
- queries: the queries you generate for the topic.
Each query has three fields:
- search_query: text of the query.
- aspect: which aspect of the topic the query covers.
- rationale: your reasoning.

{
    "queries": [
        {
            "search_query": "string",
            "aspect": "string",
            "rationale": "string"
        }
    ]
}
</Format>

<Task>
Generate exactly {number_of_queries} targeted web search queries for the given topic.
</Task>"#;

/// Queries produced by [`QueryWriter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedQueries {
    /// The planned queries.
    pub queries: Vec<SearchQueryPlan>,
    /// Tokens spent generating them.
    pub usage: TokenUsage,
}

/// Errors returned by [`QueryWriter`].
#[derive(Debug, Error)]
pub enum QueryWriterError<E: ModelProviderError> {
    /// The model request failed.
    #[error("query generation request failed: {0}")]
    Model(#[source] E),
    /// The answer isn't the expected JSON.
    #[error("model answered with invalid queries: {0}")]
    InvalidAnswer(#[source] serde_json::Error),
}

/// Asks a chat model for web search queries about a topic.
#[derive(Clone, Debug)]
pub struct QueryWriter<M> {
    model: M,
    number_of_queries: usize,
}

impl<M: ChatModel> QueryWriter<M> {
    /// Creates a writer asking `model` for three queries.
    #[inline]
    pub fn new(model: M) -> Self {
        Self {
            model,
            number_of_queries: DEFAULT_NUMBER_OF_QUERIES,
        }
    }

    /// Sets how many queries to ask for.
    #[inline]
    pub fn with_number_of_queries(mut self, number_of_queries: usize) -> Self {
        self.number_of_queries = number_of_queries;
        self
    }

    /// Returns the model.
    #[inline]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Renders the instructions sent to the model.
    pub fn prompt(&self, topic: &str, today: NaiveDate) -> String {
        INSTRUCTIONS
            .replace("{number_of_queries}", &self.number_of_queries.to_string())
            .replace("{today}", &today.to_string())
            .replace("{topic}", topic)
    }

    /// Generates queries about `topic`, dated today.
    pub async fn generate_queries(
        &self,
        topic: &str,
    ) -> Result<GeneratedQueries, QueryWriterError<M::Error>> {
        let today = chrono::Local::now().date_naive();
        self.generate_queries_on(topic, today).await
    }

    /// Generates queries about `topic` as if today were `today`.
    pub async fn generate_queries_on(
        &self,
        topic: &str,
        today: NaiveDate,
    ) -> Result<GeneratedQueries, QueryWriterError<M::Error>> {
        let req = ChatRequest::from_user(self.prompt(topic, today))
            .with_response_format(ResponseFormat::JsonObject);
        debug!(
            "asking {} for {} queries",
            self.model.model_name().unwrap_or("the model"),
            self.number_of_queries
        );
        let resp = self
            .model
            .send_request(&req)
            .await
            .map_err(QueryWriterError::Model)?;

        let answer = strip_thinking_tokens(&resp.content);
        let queries: Queries = serde_json::from_str(extract_json(&answer))
            .map_err(QueryWriterError::InvalidAnswer)?;
        if queries.queries.len() != self.number_of_queries {
            warn!(
                "asked for {} queries, got {}",
                self.number_of_queries,
                queries.queries.len()
            );
        }
        Ok(GeneratedQueries {
            queries: queries.queries,
            usage: resp.usage,
        })
    }
}

/// Pulls the JSON object out of an answer that may wrap it in a code
/// fence or surround it with prose.
fn extract_json(answer: &str) -> &str {
    let answer = answer.trim();
    if let Some(fenced) = answer.strip_prefix("```") {
        let body = fenced
            .split_once('\n')
            .map_or(fenced, |(_, body)| body);
        return body.trim_end().trim_end_matches("```").trim();
    }
    match (answer.find('{'), answer.rfind('}')) {
        (Some(start), Some(end)) if start < end => &answer[start..=end],
        _ => answer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json() {
        assert_eq!(extract_json(" {\"queries\": []} "), "{\"queries\": []}");
        assert_eq!(
            extract_json("```json\n{\"queries\": []}\n```"),
            "{\"queries\": []}"
        );
        assert_eq!(
            extract_json("Here you go: {\"queries\": []} Enjoy!"),
            "{\"queries\": []}"
        );
        assert_eq!(extract_json("no json"), "no json");
    }
}
