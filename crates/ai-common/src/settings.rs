//! Settings loaded from a parameter map with environment overrides.

use std::fmt::{self, Debug};

use ai_common_web_search::{
    ConfigurationError, SearchCategory, SearchConfig, SearchConfigBuilder,
};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// Settings could not be loaded.
#[derive(Debug, Error)]
#[error("invalid settings: {0}")]
pub struct SettingsError(#[from] serde_json::Error);

/// A settings struct that can be loaded from parameters.
///
/// Each field is looked up by name in the parameter map. An environment
/// variable named after the upper-cased field takes precedence. Empty and
/// `null` values are skipped so the field keeps its serde default.
/// Environment values are parsed as JSON when possible and taken as plain
/// strings otherwise; string fields always get the raw text.
pub trait Settings: DeserializeOwned + JsonSchema {
    /// Loads the settings from `params` and the process environment.
    fn from_parameters(
        params: &Map<String, Value>,
    ) -> Result<Self, SettingsError> {
        Self::from_parameters_with_env(params, |name| {
            std::env::var(name).ok()
        })
    }

    /// Loads the settings from `params`, reading overrides through `env`.
    fn from_parameters_with_env<F>(
        params: &Map<String, Value>,
        env: F,
    ) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = Map::new();
        for field in fields::<Self>() {
            let from_env = env(&field.name.to_uppercase())
                .map(|raw| field.parse_env(raw))
                .filter(|v| !is_empty(v));
            let value = match from_env {
                Some(value) => Some(value),
                None => params
                    .get(&field.name)
                    .filter(|v| !is_empty(v))
                    .cloned(),
            };
            if let Some(value) = value {
                trace!("setting `{}` is present", field.name);
                values.insert(field.name, value);
            }
        }
        Ok(serde_json::from_value(Value::Object(values))?)
    }
}

struct Field {
    name: String,
    accepts_string: bool,
}

impl Field {
    /// Parses an environment value as JSON. String fields keep the raw text
    /// unless it parses to `null` or a string.
    fn parse_env(&self, raw: String) -> Value {
        match serde_json::from_str(&raw) {
            Ok(value @ (Value::Null | Value::String(_))) => value,
            Ok(_) if self.accepts_string => Value::String(raw),
            Ok(value) => value,
            Err(_) => Value::String(raw),
        }
    }
}

fn fields<T: JsonSchema>() -> Vec<Field> {
    let schema = schema_for!(T).to_value();
    let Some(props) = schema.get("properties").and_then(Value::as_object)
    else {
        return vec![];
    };
    props
        .iter()
        .map(|(name, prop)| Field {
            name: name.clone(),
            accepts_string: accepts_string(prop),
        })
        .collect()
}

fn accepts_string(prop: &Value) -> bool {
    match prop.get("type") {
        Some(Value::String(ty)) => ty == "string",
        Some(Value::Array(types)) => {
            types.iter().any(|ty| ty.as_str() == Some("string"))
        }
        _ => false,
    }
}

#[inline]
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Settings of the web search pipeline.
#[derive(Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WebSearchSettings {
    /// Tavily API key.
    pub tavily_api_key: Option<String>,
    /// `general` or `news`.
    pub search_category: String,
    /// Recency window of news searches, in days.
    pub number_of_days_back: i64,
    /// Result bound of each query.
    pub max_results_per_query: i64,
    /// Raw content limit of each source, in tokens.
    pub max_tokens_per_source: usize,
    /// Whether to fetch and print the full page content.
    pub include_raw_content: bool,
    /// Character budget of the formatted sources.
    pub max_total_chars: Option<usize>,
}

impl Default for WebSearchSettings {
    fn default() -> Self {
        Self {
            tavily_api_key: None,
            search_category: SearchCategory::General.to_string(),
            number_of_days_back: 7,
            max_results_per_query: 3,
            max_tokens_per_source: 1000,
            include_raw_content: true,
            max_total_chars: None,
        }
    }
}

impl Settings for WebSearchSettings {}

impl WebSearchSettings {
    /// Converts the settings into a search config builder.
    pub fn to_builder(
        &self,
    ) -> Result<SearchConfigBuilder, ConfigurationError> {
        let category: SearchCategory = self.search_category.parse()?;
        let api_key = self
            .tavily_api_key
            .clone()
            .ok_or(ConfigurationError::MissingApiKey)?;
        let mut builder = SearchConfigBuilder::with_api_key(api_key)
            .with_category(category)
            .with_days_back(self.number_of_days_back)
            .with_max_results_per_query(self.max_results_per_query)
            .with_max_tokens_per_source(self.max_tokens_per_source)
            .with_raw_content(self.include_raw_content);
        if let Some(max_chars) = self.max_total_chars {
            builder = builder.with_max_total_chars(max_chars);
        }
        Ok(builder)
    }

    /// Validates the settings and builds a search config.
    #[inline]
    pub fn to_config(&self) -> Result<SearchConfig, ConfigurationError> {
        self.to_builder()?.build()
    }
}

impl Debug for WebSearchSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSearchSettings")
            .field(
                "tavily_api_key",
                &self.tavily_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("search_category", &self.search_category)
            .field("number_of_days_back", &self.number_of_days_back)
            .field("max_results_per_query", &self.max_results_per_query)
            .field("max_tokens_per_source", &self.max_tokens_per_source)
            .field("include_raw_content", &self.include_raw_content)
            .field("max_total_chars", &self.max_total_chars)
            .finish()
    }
}
