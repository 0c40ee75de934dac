use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A search query produced by a planning model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchQueryPlan {
    /// The query to run.
    pub search_query: String,
    /// The part of the topic the query covers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect: Option<String>,
    /// Why the query helps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl SearchQueryPlan {
    /// Creates a plan with only the query text.
    #[inline]
    pub fn new(search_query: impl Into<String>) -> Self {
        Self {
            search_query: search_query.into(),
            aspect: None,
            rationale: None,
        }
    }
}

impl From<SearchQueryPlan> for String {
    #[inline]
    fn from(plan: SearchQueryPlan) -> Self {
        plan.search_query
    }
}

impl From<&SearchQueryPlan> for String {
    #[inline]
    fn from(plan: &SearchQueryPlan) -> Self {
        plan.search_query.clone()
    }
}

/// A list of planned search queries.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema,
)]
pub struct Queries {
    /// The planned queries.
    pub queries: Vec<SearchQueryPlan>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_queries() {
        let queries: Queries = serde_json::from_value(json!({
            "queries": [
                {
                    "search_query": "tokio runtime internals",
                    "aspect": "scheduling",
                    "rationale": "explains work stealing"
                },
                { "search_query": "async rust cancellation" }
            ]
        }))
        .unwrap();
        assert_eq!(queries.queries.len(), 2);
        assert_eq!(
            queries.queries[1],
            SearchQueryPlan::new("async rust cancellation")
        );
        let texts: Vec<String> =
            queries.queries.iter().map(String::from).collect();
        assert_eq!(texts[0], "tokio runtime internals");
    }

    #[test]
    fn test_schema_lists_query_fields() {
        let schema = serde_json::to_value(schemars::schema_for!(Queries))
            .unwrap()
            .to_string();
        assert!(schema.contains("search_query"));
        assert!(schema.contains("rationale"));
    }
}
