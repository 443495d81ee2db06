use super::*;
use crate::testing::ScriptedBackend;
use std::time::Duration;

#[test]
fn test_from_config_rejects_unknown_provider() {
    let mut config = Config::minimal_for_testing();
    config.llm.provider = Some("carrier-pigeon".to_string());

    let err = from_config(&config).err().unwrap();
    assert!(matches!(err, LlmError::Unsupported(_)));
    assert!(err.to_string().contains("carrier-pigeon"));
}

#[test]
fn test_from_config_reports_missing_key() {
    let mut config = Config::minimal_for_testing();
    config.llm.openai = Some(codecritic_config::OpenAiConfig {
        api_key_env: Some("CODECRITIC_UNSET_KEY_FOR_FACTORY_TEST".to_string()),
        ..Default::default()
    });

    let err = from_config(&config).err().unwrap();
    assert!(matches!(err, LlmError::Misconfiguration(_)));
}

#[tokio::test]
async fn test_scripted_backend_replays_in_order_and_records() {
    let backend = ScriptedBackend::with_responses(["first", "second"]);
    backend.push_error(LlmError::ProviderOutage("down".to_string()));

    let shared: Arc<dyn LlmBackend> = Arc::new(backend);
    let inv = |stage: &str| LlmInvocation::new(stage, "m", Duration::from_secs(5), vec![Message::user("x")]);

    assert_eq!(shared.invoke(inv("draft")).await.unwrap().raw_response, "first");
    assert_eq!(shared.invoke(inv("review")).await.unwrap().raw_response, "second");
    assert!(matches!(
        shared.invoke(inv("translate")).await,
        Err(LlmError::ProviderOutage(_))
    ));
    assert!(matches!(
        shared.invoke(inv("extra")).await,
        Err(LlmError::Transport(_))
    ));
}

#[tokio::test]
async fn test_scripted_backend_invocation_log() {
    let backend = ScriptedBackend::with_responses(["{}"]);
    backend
        .invoke(LlmInvocation::new("draft", "m", Duration::from_secs(5), vec![]))
        .await
        .unwrap();

    assert_eq!(backend.call_count(), 1);
    assert_eq!(backend.remaining(), 0);
    assert_eq!(backend.invocations()[0].stage, "draft");
}
