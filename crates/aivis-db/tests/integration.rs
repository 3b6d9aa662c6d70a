//! Offline tests for the in-memory store and pool configuration.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use aivis_core::{
    AnalysisReport, AppConfig, Backend, BrandScore, Environment, LogLevel, ProjectStatus,
    ResponseStatus, SentimentLabel,
};
use aivis_db::{
    DbError, MemoryStore, NewMention, NewProject, NewSentiment, PoolConfig, VisibilityStore,
};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        openai_api_key: None,
        anthropic_api_key: None,
        gemini_api_key: None,
        openai_model: "gpt-4o".to_string(),
        claude_model: "claude".to_string(),
        gemini_model: "gemini".to_string(),
        reasoning_backend: Backend::Gemini,
        llm_request_timeout_secs: 60,
        llm_max_attempts: 3,
        llm_retry_backoff_base_secs: 2,
        query_max_concurrency: 2,
        max_concurrent_runs: 2,
    }
}

fn new_project(company: &str) -> NewProject {
    NewProject {
        name: format!("{company} audit"),
        company_name: company.to_string(),
        description: None,
        area_of_work: None,
        status: ProjectStatus::Setup,
        is_competitor_view: false,
        competitor_brand_id: None,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[tokio::test]
async fn missing_project_is_not_found() {
    let store = MemoryStore::new();
    let err = store.get_project(999).await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");

    let err = store
        .set_project_status(999, ProjectStatus::Failed)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn competitor_names_are_unique_case_insensitively() {
    let store = MemoryStore::new();
    let project = store.create_project(&new_project("Acme")).await.unwrap();

    store
        .add_competitor(project.id, "Beta", None)
        .await
        .unwrap();
    let err = store
        .add_competitor(project.id, "BETA", None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Conflict { .. }), "got {err:?}");
}

#[tokio::test]
async fn selected_backends_carry_catalog_weights_in_name_order() {
    let store = MemoryStore::new();
    let project = store.create_project(&new_project("Acme")).await.unwrap();

    store
        .select_backend(project.id, "gemini", true)
        .await
        .unwrap();
    store
        .select_backend(project.id, "chatgpt", true)
        .await
        .unwrap();
    store
        .select_backend(project.id, "claude", false)
        .await
        .unwrap();

    let selected = store.list_selected_backends(project.id).await.unwrap();
    let names: Vec<&str> = selected.iter().map(|b| b.backend_name.as_str()).collect();
    assert_eq!(names, vec!["chatgpt", "gemini"]);
    assert!((selected[1].weight - 0.8).abs() < f64::EPSILON);
    assert_eq!(selected[1].display_name, "Gemini");

    let err = store
        .select_backend(project.id, "llama", true)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn response_is_get_or_create_by_natural_key() {
    let store = MemoryStore::new();
    let project = store.create_project(&new_project("Acme")).await.unwrap();
    let prompt = store
        .add_prompt(project.id, "best tool?", true)
        .await
        .unwrap();

    let first = store
        .get_or_create_response(project.id, prompt.id, "chatgpt")
        .await
        .unwrap();
    assert_eq!(first.status, ResponseStatus::Pending);

    store.fail_response(first.id, "timeout").await.unwrap();
    store.complete_response(first.id, "Acme wins").await.unwrap();

    let again = store
        .get_or_create_response(project.id, prompt.id, "chatgpt")
        .await
        .unwrap();
    assert_eq!(again.id, first.id);
    assert_eq!(again.status, ResponseStatus::Success);
    assert_eq!(again.retry_count, 1);
    assert!(again.error_message.is_none());
    assert_eq!(again.raw_response.as_deref(), Some("Acme wins"));
}

#[tokio::test]
async fn mentions_and_sentiments_are_insert_once() {
    let store = MemoryStore::new();
    let project = store.create_project(&new_project("Acme")).await.unwrap();
    let prompt = store.add_prompt(project.id, "p", true).await.unwrap();
    let response = store
        .get_or_create_response(project.id, prompt.id, "claude")
        .await
        .unwrap();
    store
        .complete_response(response.id, "Acme is great")
        .await
        .unwrap();

    let mention = NewMention {
        response_id: response.id,
        brand_name: "Acme".to_string(),
        position: 1,
        context: "Acme is great".to_string(),
        is_main_brand: true,
        competitor_id: None,
    };
    assert!(store.insert_mention_if_absent(&mention).await.unwrap());
    let shouting = NewMention {
        brand_name: "ACME".to_string(),
        ..mention.clone()
    };
    assert!(!store.insert_mention_if_absent(&shouting).await.unwrap());

    let pending = store.list_unclassified_mentions(project.id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].response_text, "Acme is great");

    let sentiment = NewSentiment {
        mention_id: pending[0].mention_id,
        label: SentimentLabel::Positive,
        confidence: 1.0,
        reasoning: "praised".to_string(),
    };
    assert!(store.insert_sentiment_if_absent(&sentiment).await.unwrap());
    assert!(!store.insert_sentiment_if_absent(&sentiment).await.unwrap());
    assert!(store
        .list_unclassified_mentions(project.id)
        .await
        .unwrap()
        .is_empty());

    let corpus = store.load_corpus(project.id).await.unwrap();
    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus[0].prompt_text, "p");
    assert_eq!(corpus[0].backend_name, "claude");
    assert_eq!(corpus[0].sentiment, Some(SentimentLabel::Positive));
}

#[tokio::test]
async fn brand_scores_upsert_in_place_and_keep_first_write_order() {
    let store = MemoryStore::new();
    let project = store.create_project(&new_project("Acme")).await.unwrap();

    store
        .upsert_brand_score(project.id, &BrandScore::zero("Beta", false))
        .await
        .unwrap();
    store
        .upsert_brand_score(project.id, &BrandScore::zero("Acme", true))
        .await
        .unwrap();

    let mut rescored = BrandScore::zero("Beta", false);
    rescored.normalized_score = 42.0;
    store
        .upsert_brand_score(project.id, &rescored)
        .await
        .unwrap();

    let scores = store.list_brand_scores(project.id).await.unwrap();
    assert_eq!(scores.len(), 2);
    assert_eq!(scores[0].brand_name, "Beta");
    assert!((scores[0].normalized_score - 42.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn report_upsert_replaces_previous_report() {
    let store = MemoryStore::new();
    let project = store.create_project(&new_project("Acme")).await.unwrap();
    assert!(store.get_report(project.id).await.unwrap().is_none());

    let mut report = AnalysisReport {
        competitor_comparison: aivis_core::CompetitorComparison::default(),
        prompt_wise: vec![],
        backend_wise: vec![],
        negative_sentiment: aivis_core::NegativeSentimentDigest::default(),
        sources: vec!["https://a.example".to_string()],
        insights: aivis_core::Insights::placeholder(),
        action_plan: aivis_core::ActionPlan::default(),
    };
    store.upsert_report(project.id, &report).await.unwrap();
    report.sources.clear();
    store.upsert_report(project.id, &report).await.unwrap();

    let stored = store.get_report(project.id).await.unwrap().unwrap();
    assert!(stored.sources.is_empty());
}

#[tokio::test]
async fn logs_return_most_recent_entries_oldest_first() {
    let store = MemoryStore::new();
    let project = store.create_project(&new_project("Acme")).await.unwrap();

    for i in 0..5 {
        store
            .append_log(project.id, "query", LogLevel::Info, &format!("entry {i}"))
            .await
            .unwrap();
    }

    let logs = store.list_logs(project.id, 2).await.unwrap();
    let messages: Vec<&str> = logs.iter().map(|l| l.message.as_str()).collect();
    assert_eq!(messages, vec!["entry 3", "entry 4"]);
}
