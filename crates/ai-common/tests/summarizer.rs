use ai_common::model::{ChatMessage, TokenUsage};
use ai_common::web_search::{
    SearchConfigBuilder, SearchError, SearchResult, WebSearch,
};
use ai_common::{SourceSummarizer, SummarizerError};
use ai_common_testing::{PresetResponse, TestChatModel, TestSearchBackend};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn search(backend: TestSearchBackend) -> WebSearch<TestSearchBackend> {
    let config = SearchConfigBuilder::with_api_key("tvly-test")
        .with_raw_content(true)
        .build()
        .unwrap();
    WebSearch::with_backend(config, backend)
}

fn backend() -> TestSearchBackend {
    let mut backend = TestSearchBackend::default();
    backend.add_results(
        "rust async runtimes",
        [
            SearchResult::new("https://a.example", "A", "tokio snippet")
                .with_raw_content("tokio full page"),
            SearchResult::new("https://b.example", "B", "smol snippet"),
        ],
    );
    backend.add_results(
        "rust executors",
        [SearchResult::new("https://a.example", "A", "tokio snippet")],
    );
    backend
}

fn user_prompt(message: &ChatMessage) -> &str {
    let ChatMessage::User(prompt) = message else {
        panic!("expected a user message");
    };
    prompt
}

#[tokio::test(start_paused = true)]
async fn test_summarize_unique_sources() {
    init_tracing();
    let mut model = TestChatModel::default();
    model.add_response_step(
        PresetResponse::with_content("<think>hmm</think>\nA short summary.")
            .with_usage(100, 20),
    );
    let summarizer = SourceSummarizer::new(model);

    let summarized = summarizer
        .search_and_summarize(
            &search(backend()),
            "Rust async",
            ["rust async runtimes", "rust executors"],
        )
        .await
        .unwrap();

    let urls: Vec<_> =
        summarized.sources.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(urls, ["https://a.example", "https://b.example"]);
    assert!(summarized.sources.iter().all(|s| s.raw_content.is_none()));
    assert!(
        summarized
            .sources
            .iter()
            .all(|s| s.content == "A short summary.")
    );
    assert_eq!(summarized.usage, TokenUsage::new(200, 40));
    assert!(summarized.formatted.starts_with("Sources:"));
    assert!(summarized.formatted.contains("URL: https://b.example"));
    assert!(!summarized.formatted.contains("Full source content"));

    let requests = summarizer.model().requests();
    assert_eq!(requests.len(), 2);
    let prompts: Vec<_> = requests
        .iter()
        .map(|req| user_prompt(&req.messages[0]))
        .collect();
    assert!(prompts.iter().any(|p| p.contains("tokio full page")));
    assert!(prompts.iter().any(|p| p.contains("smol snippet")));
    assert!(prompts.iter().all(|p| p.contains("<topic>\nRust async\n")));
}

#[tokio::test(start_paused = true)]
async fn test_model_failure_names_source() {
    let mut model = TestChatModel::default();
    model.add_response_step(
        PresetResponse::with_content("summary").with_failures(0),
    );
    let summarizer = SourceSummarizer::new(model);

    let err = summarizer
        .search_and_summarize(
            &search(backend()),
            "Rust async",
            ["rust executors"],
        )
        .await
        .unwrap_err();
    match err {
        SummarizerError::Model { url, .. } => {
            assert_eq!(url, "https://a.example");
        }
        err => panic!("expected a model error, got {err:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_search_failure_is_reported() {
    let summarizer = SourceSummarizer::new(TestChatModel::default());

    let err = summarizer
        .search_and_summarize(&search(backend()), "Rust async", ["unknown"])
        .await
        .unwrap_err();
    assert!(matches!(err, SummarizerError::Search(SearchError::Batch(_))));
    assert!(summarizer.model().requests().is_empty());
}
