use std::borrow::Cow;

use crate::SearchResult;

const CHARS_PER_TOKEN: usize = 4;
const TRUNCATED_SUFFIX: &str = "... [truncated]";
const HEADER: &str = "Sources:\n\n";
const SEPARATOR: &str = "====================================\n\n";

/// How [`format_sources`] renders sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatOptions {
    /// Print the full page content of sources that have it.
    pub include_raw_content: bool,
    /// Raw content limit per source, in tokens.
    pub max_tokens_per_source: usize,
    /// Character budget of the whole text.
    pub max_total_chars: Option<usize>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            include_raw_content: false,
            max_tokens_per_source: 1000,
            max_total_chars: None,
        }
    }
}

/// Text produced by [`format_sources`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormattedSources {
    /// The rendered text.
    pub text: String,
    /// Number of sources in `text`.
    pub included: usize,
    /// Number of sources left out to stay within the budget.
    pub omitted: usize,
}

/// Renders sources as numbered, human-readable blocks.
///
/// Sources are appended whole. With a character budget, the first source
/// that doesn't fit ends the text and it and every later source count as
/// omitted. The budget covers the whole returned text, header included; a
/// budget too small for the header yields an empty text.
pub fn format_sources(
    sources: &[SearchResult],
    options: &FormatOptions,
) -> FormattedSources {
    let mut text = String::from(HEADER);
    let mut used = HEADER.chars().count();
    let mut included = 0;

    for (i, source) in sources.iter().enumerate() {
        let block = format_source(i + 1, source, options);
        if let Some(budget) = options.max_total_chars {
            // The trailing whitespace of the last block is trimmed away.
            let visible = used + block.trim_end().chars().count();
            if visible > budget {
                debug!(
                    "character budget {budget} reached, omitting {} sources",
                    sources.len() - i
                );
                break;
            }
        }
        used += block.chars().count();
        text.push_str(&block);
        included += 1;
    }

    let mut text = text.trim().to_owned();
    if let Some(budget) = options.max_total_chars {
        if text.chars().count() > budget {
            text.clear();
        }
    }
    FormattedSources {
        text,
        included,
        omitted: sources.len() - included,
    }
}

fn format_source(
    number: usize,
    source: &SearchResult,
    options: &FormatOptions,
) -> String {
    let mut block = format!(
        "Source {number}:\n\nTitle: {}\n\nURL: {}\n\n",
        source.title, source.url
    );
    if let Some(date) = &source.published_date {
        block.push_str(&format!("Published: {date}\n\n"));
    }
    block.push_str("Most relevant content from source:\n");
    block.push_str(&source.content);
    block.push_str("\n==\n\n");
    if options.include_raw_content {
        match source.raw_content() {
            Some(raw) => {
                let limit = options.max_tokens_per_source * CHARS_PER_TOKEN;
                block.push_str(&format!(
                    "Full source content limited to {} tokens:\n {}\n\n",
                    options.max_tokens_per_source,
                    truncate_chars(raw, limit)
                ));
            }
            None => warn!("no raw content found for source {}", source.url),
        }
    }
    block.push_str(SEPARATOR);
    block
}

/// Cuts `text` after `limit` characters and marks the cut.
pub fn truncate_chars(text: &str, limit: usize) -> Cow<'_, str> {
    match text.char_indices().nth(limit) {
        Some((end, _)) => {
            Cow::Owned(format!("{}{TRUNCATED_SUFFIX}", &text[..end]))
        }
        None => Cow::Borrowed(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_single_source() {
        let sources = [SearchResult::new(
            "https://a.example",
            "Alpha",
            "alpha snippet",
        )
        .with_published_date("2025-03-01")];
        let formatted = format_sources(&sources, &FormatOptions::default());
        assert_eq!(
            formatted.text,
            "Sources:\n\n\
             Source 1:\n\n\
             Title: Alpha\n\n\
             URL: https://a.example\n\n\
             Published: 2025-03-01\n\n\
             Most relevant content from source:\nalpha snippet\n==\n\n\
             ===================================="
        );
        assert_eq!(formatted.included, 1);
        assert_eq!(formatted.omitted, 0);
    }

    #[test]
    fn test_raw_content_is_truncated() {
        let sources = [SearchResult::new("https://a.example", "A", "a")
            .with_raw_content("x".repeat(50))];
        let options = FormatOptions {
            include_raw_content: true,
            max_tokens_per_source: 10,
            max_total_chars: None,
        };
        let text = format_sources(&sources, &options).text;
        let expected = format!(
            "Full source content limited to 10 tokens:\n {}... [truncated]\n",
            "x".repeat(40)
        );
        assert!(text.contains(&expected), "{text}");
    }

    #[test]
    fn test_raw_content_section_needs_content() {
        let sources = [SearchResult::new("https://a.example", "A", "a")];
        let options = FormatOptions {
            include_raw_content: true,
            ..Default::default()
        };
        let text = format_sources(&sources, &options).text;
        assert!(!text.contains("Full source content"));

        let sources = [sources[0].clone().with_raw_content("page")];
        let text = format_sources(&sources, &FormatOptions::default()).text;
        assert!(!text.contains("Full source content"));
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("héllo", 5), "héllo");
        assert_eq!(truncate_chars("héllo", 2), "hé... [truncated]");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn test_budget_omits_trailing_sources() {
        let sources: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|name| {
                SearchResult::new(
                    format!("https://{name}.example"),
                    name.to_uppercase(),
                    "snippet",
                )
            })
            .collect();
        let full = format_sources(&sources, &FormatOptions::default());
        let first_two =
            format_sources(&sources[..2], &FormatOptions::default());

        let options = FormatOptions {
            max_total_chars: Some(first_two.text.chars().count()),
            ..Default::default()
        };
        let formatted = format_sources(&sources, &options);
        assert_eq!(formatted.text, first_two.text);
        assert_eq!(formatted.included, 2);
        assert_eq!(formatted.omitted, 1);
        assert!(full.text.len() > formatted.text.len());
    }

    #[test]
    fn test_budget_keeps_order_after_overflow() {
        let sources = [
            SearchResult::new("https://a.example", "A", "x".repeat(500)),
            SearchResult::new("https://b.example", "B", "short"),
        ];
        let options = FormatOptions {
            max_total_chars: Some(200),
            ..Default::default()
        };
        let formatted = format_sources(&sources, &options);
        assert_eq!(formatted.included, 0);
        assert_eq!(formatted.omitted, 2);
        assert_eq!(formatted.text, "Sources:");
    }

    #[test]
    fn test_budget_fits_exact_length() {
        let sources =
            [SearchResult::new("https://a.example", "Alpha", "snippet")];
        let full = format_sources(&sources, &FormatOptions::default());
        let budget = full.text.chars().count();

        let options = FormatOptions {
            max_total_chars: Some(budget),
            ..Default::default()
        };
        let formatted = format_sources(&sources, &options);
        assert_eq!(formatted.text, full.text);
        assert_eq!(formatted.included, 1);

        let options = FormatOptions {
            max_total_chars: Some(budget - 1),
            ..Default::default()
        };
        let formatted = format_sources(&sources, &options);
        assert_eq!(formatted.text, "Sources:");
        assert_eq!(formatted.omitted, 1);
    }

    #[test]
    fn test_budget_smaller_than_header() {
        let options = FormatOptions {
            max_total_chars: Some(3),
            ..Default::default()
        };
        let formatted = format_sources(&[], &options);
        assert_eq!(formatted.text, "");

        let sources = [SearchResult::new("https://a.example", "A", "a")];
        let formatted = format_sources(&sources, &options);
        assert_eq!(formatted.text, "");
        assert_eq!(formatted.included, 0);
        assert_eq!(formatted.omitted, 1);

        let options = FormatOptions {
            max_total_chars: Some("Sources:".len()),
            ..Default::default()
        };
        assert_eq!(format_sources(&[], &options).text, "Sources:");
    }
}
