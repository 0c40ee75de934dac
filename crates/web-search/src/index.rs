use std::collections::HashMap;

use crate::SearchResult;

/// Sources collected from a batch of queries, unique by URL.
///
/// Iteration yields sources in the order they were first inserted. When a
/// URL shows up again, the first record is kept, but it takes the raw
/// content and publication date of the later one if it lacks them.
#[derive(Clone, Debug, Default)]
pub struct SourceIndex {
    positions: HashMap<String, usize>,
    sources: Vec<SearchResult>,
}

impl SourceIndex {
    /// Creates an empty index.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a result. Returns `true` if its URL wasn't seen before.
    pub fn insert(&mut self, result: SearchResult) -> bool {
        if let Some(&pos) = self.positions.get(&result.url) {
            let kept = &mut self.sources[pos];
            if kept.raw_content().is_none() && result.raw_content().is_some()
            {
                trace!("taking raw content of {} from a duplicate", kept.url);
                kept.raw_content = result.raw_content;
            }
            if kept.published_date.is_none() {
                kept.published_date = result.published_date;
            }
            return false;
        }
        self.positions.insert(result.url.clone(), self.sources.len());
        self.sources.push(result);
        true
    }

    /// Returns the source with the given URL.
    #[inline]
    pub fn get(&self, url: &str) -> Option<&SearchResult> {
        self.positions.get(url).map(|&pos| &self.sources[pos])
    }

    /// Number of unique sources.
    #[inline]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if nothing was inserted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// The sources in insertion order.
    #[inline]
    pub fn as_slice(&self) -> &[SearchResult] {
        &self.sources
    }

    /// Consumes the index, returning the sources in insertion order.
    #[inline]
    pub fn into_sources(self) -> Vec<SearchResult> {
        self.sources
    }
}

impl Extend<SearchResult> for SourceIndex {
    fn extend<I: IntoIterator<Item = SearchResult>>(&mut self, iter: I) {
        for result in iter {
            self.insert(result);
        }
    }
}

impl FromIterator<SearchResult> for SourceIndex {
    fn from_iter<I: IntoIterator<Item = SearchResult>>(iter: I) -> Self {
        let mut index = Self::new();
        index.extend(iter);
        index
    }
}

/// Flattens per-query result lists into unique sources, keeping the first
/// occurrence of every URL.
pub fn deduplicate_sources<I>(responses: I) -> Vec<SearchResult>
where
    I: IntoIterator<Item = Vec<SearchResult>>,
{
    responses
        .into_iter()
        .flatten()
        .collect::<SourceIndex>()
        .into_sources()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str, title: &str) -> SearchResult {
        SearchResult::new(url, title, format!("about {title}"))
    }

    #[test]
    fn test_first_seen_wins() {
        let sources = deduplicate_sources([
            vec![
                result("https://a.example", "A"),
                result("https://b.example", "B"),
            ],
            vec![
                result("https://b.example", "B again"),
                result("https://c.example", "C"),
            ],
        ]);
        let titles: Vec<_> =
            sources.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["A", "B", "C"]);
    }

    #[test]
    fn test_duplicate_fills_missing_raw_content() {
        let mut index = SourceIndex::new();
        assert!(index.insert(result("https://a.example", "A")));
        assert!(!index.insert(
            result("https://a.example", "A2")
                .with_raw_content("full page")
                .with_published_date("2025-01-02"),
        ));

        let kept = index.get("https://a.example").unwrap();
        assert_eq!(kept.title, "A");
        assert_eq!(kept.raw_content(), Some("full page"));
        assert_eq!(kept.published_date.as_deref(), Some("2025-01-02"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_duplicate_keeps_existing_raw_content() {
        let mut index = SourceIndex::new();
        index.insert(
            result("https://a.example", "A").with_raw_content("first"),
        );
        index.insert(
            result("https://a.example", "A").with_raw_content("second"),
        );
        index.insert(result("https://a.example", "A"));
        assert_eq!(
            index.get("https://a.example").unwrap().raw_content(),
            Some("first")
        );
    }

    #[test]
    fn test_empty_raw_content_is_replaced() {
        let mut index = SourceIndex::new();
        index.insert(result("https://a.example", "A").with_raw_content(""));
        index
            .insert(result("https://a.example", "A").with_raw_content("body"));
        assert_eq!(
            index.get("https://a.example").unwrap().raw_content(),
            Some("body")
        );
    }
}
