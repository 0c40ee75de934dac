use std::time::Duration;

use ai_common_model::ChatModel;
use ai_common_ollama_model::Reasoning;
use serde_json::json;

use super::params::ProviderParams;
use super::*;

fn full_params(server: LlmServer) -> ParameterBag {
    let bag = ParameterBag::new().with("api_key", "secret");
    match server {
        LlmServer::Ollama => bag
            .with("model_name", "llama3.1")
            .with("base_url", "http://localhost:11434"),
        LlmServer::Vllm => bag.with("base_url", "http://localhost:8000/v1"),
        _ => bag.with("model_name", "some-model"),
    }
}

fn required_keys(server: LlmServer) -> &'static [&'static str] {
    match server {
        LlmServer::Anthropic | LlmServer::Groq | LlmServer::OpenAI => {
            &["model_name", "api_key"]
        }
        LlmServer::Ollama => &["model_name", "base_url"],
        LlmServer::Vllm => &["base_url", "api_key"],
    }
}

fn without(bag: &ParameterBag, key: &str) -> ParameterBag {
    bag.as_map()
        .iter()
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[test]
fn test_parse_server() {
    for server in LlmServer::ALL {
        assert_eq!(server.to_string().parse::<LlmServer>(), Ok(server));
    }
    assert_eq!("OpenAI".parse::<LlmServer>(), Ok(LlmServer::OpenAI));
    assert_eq!(
        "mistral".parse::<LlmServer>(),
        Err(UnknownServerError("mistral".to_owned()))
    );
}

#[test]
fn test_every_server_resolves() {
    for server in LlmServer::ALL {
        let handle = resolve(server, &full_params(server)).unwrap();
        assert_eq!(handle.server(), server);
    }
}

#[test]
fn test_missing_required_key() {
    for server in LlmServer::ALL {
        let params = full_params(server);
        for &key in required_keys(server) {
            let err = resolve(server, &without(&params, key)).unwrap_err();
            match err {
                ResolveError::Configuration(ParameterError::MissingKey {
                    provider,
                    key: missing,
                }) => {
                    assert_eq!(provider, server);
                    assert_eq!(missing, key);
                }
                other => panic!("{server} without {key}: {other:?}"),
            }
        }
    }
}

#[test]
fn test_null_counts_as_missing() {
    let params = full_params(LlmServer::Groq).with("api_key", json!(null));
    let err = resolve(LlmServer::Groq, &params).unwrap_err();
    assert!(err.to_string().contains("`api_key`"), "{err}");
}

#[test]
fn test_openai_gpt4() {
    let params = ParameterBag::new()
        .with("model_name", "gpt-4")
        .with("api_key", "x");
    let handle = get_llm(LlmServer::OpenAI, &params).unwrap();
    assert_eq!(handle.model_name(), Some("gpt-4"));
    assert_eq!(
        handle.as_openai().unwrap().config().base_url(),
        "https://api.openai.com/v1"
    );

    let params = ParameterBag::new().with("model_name", "gpt-4");
    let err = get_llm(LlmServer::OpenAI, &params).unwrap_err();
    let ResolveError::Configuration(err) = err else {
        panic!("expected a configuration error, got {err:?}");
    };
    assert_eq!(err.key(), "api_key");
    assert_eq!(err.provider(), LlmServer::OpenAI);
}

#[test]
fn test_wrong_types() {
    let params = full_params(LlmServer::OpenAI).with("temperature", "hot");
    let err = resolve(LlmServer::OpenAI, &params).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Configuration(ParameterError::InvalidValue {
            key: "temperature",
            ..
        })
    ));

    let params = full_params(LlmServer::Anthropic).with("timeout", -1);
    let err = resolve(LlmServer::Anthropic, &params).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid `timeout` for anthropic: \
         expected a non-negative number of seconds"
    );

    let params = full_params(LlmServer::Ollama).with("num_ctx", 1.5);
    assert!(resolve(LlmServer::Ollama, &params).is_err());
}

#[test]
fn test_model_aliases() {
    assert_eq!(
        resolve_model_alias(LlmServer::Groq, "gpt-oss-120b"),
        "openai/gpt-oss-120b"
    );
    assert_eq!(
        resolve_model_alias(LlmServer::Ollama, "gpt-oss-20b"),
        "gpt-oss:20b-cloud"
    );
    assert_eq!(
        resolve_model_alias(LlmServer::OpenAI, "gpt-oss-20b"),
        "gpt-oss-20b"
    );

    let params =
        full_params(LlmServer::Ollama).with("model_name", "gpt-oss-120b");
    let handle = resolve(LlmServer::Ollama, &params).unwrap();
    assert_eq!(handle.model_name(), Some("gpt-oss:120b-cloud"));
}

#[test]
fn test_groq_params() {
    let params = full_params(LlmServer::Groq)
        .with("reasoning", "low")
        .with("top_p", 0.9);
    let ProviderParams::Groq(groq) =
        ProviderParams::from_bag(LlmServer::Groq, &params).unwrap()
    else {
        panic!("expected groq params");
    };
    assert_eq!(groq.reasoning_effort.as_deref(), Some("low"));
    assert_eq!(groq.sampling.top_p, Some(0.9));

    let params = params.with("reasoning_effort", "high");
    let handle = resolve(LlmServer::Groq, &params).unwrap();
    let config = handle.as_openai().unwrap().config();
    assert_eq!(config.reasoning_effort(), Some("high"));
    assert_eq!(config.service_tier(), Some("auto"));
    assert_eq!(config.base_url(), "https://api.groq.com/openai/v1");
}

#[test]
fn test_ollama_params() {
    let params = full_params(LlmServer::Ollama)
        .with("reasoning_effort", "medium")
        .with("format", "json")
        .with("num_ctx", 8192);
    let handle = resolve(LlmServer::Ollama, &params).unwrap();
    let config = handle.as_ollama().unwrap().config();
    assert_eq!(
        config.reasoning(),
        Some(&Reasoning::Effort("medium".to_owned()))
    );
    assert_eq!(config.format(), Some(&json!("json")));
    assert_eq!(config.num_ctx(), Some(8192));

    let params = params.with("reasoning", false);
    let handle = resolve(LlmServer::Ollama, &params).unwrap();
    assert_eq!(
        handle.as_ollama().unwrap().config().reasoning(),
        Some(&Reasoning::Enabled(false))
    );
}

#[test]
fn test_anthropic_params() {
    let params = full_params(LlmServer::Anthropic)
        .with("timeout", 30)
        .with("stop", json!(["\n\nHuman:"]))
        .with("max_tokens", 2048);
    let handle = resolve(LlmServer::Anthropic, &params).unwrap();
    let config = handle.as_anthropic().unwrap().config();
    assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    assert_eq!(config.stop_sequences(), ["\n\nHuman:"]);
    assert_eq!(config.max_tokens(), 2048);
}

#[test]
fn test_vllm_model_is_optional() {
    let handle =
        resolve(LlmServer::Vllm, &full_params(LlmServer::Vllm)).unwrap();
    assert_eq!(handle.model_name(), None);

    let params = full_params(LlmServer::Vllm).with("model_name", "qwen3");
    let handle = resolve(LlmServer::Vllm, &params).unwrap();
    assert_eq!(handle.model_name(), Some("qwen3"));
}

#[test]
fn test_construction_error() {
    let params = full_params(LlmServer::OpenAI).with("base_url", "::nope");
    let err = resolve(LlmServer::OpenAI, &params).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::ProviderConstruction {
            provider: LlmServer::OpenAI,
            ..
        }
    ));
    assert_eq!(err.provider(), LlmServer::OpenAI);
}

#[test]
fn test_debug_hides_api_key() {
    let params = full_params(LlmServer::OpenAI);
    assert!(!format!("{params:?}").contains("secret"));
}
