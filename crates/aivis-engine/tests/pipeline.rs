//! End-to-end pipeline tests over `MemoryStore` with a scripted generator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aivis_core::{
    Backend, LogLevel, ProjectStatus, ResponseStatus, SentimentLabel, INSIGHT_PLACEHOLDER,
};
use aivis_db::{MemoryStore, NewProject, VisibilityStore};
use aivis_engine::extract::extract_stage;
use aivis_engine::query::query_stage;
use aivis_engine::{
    impersonate_competitor, project_brands, run_pipeline, EngineConfig, EngineError,
    PipelineRunner,
};
use aivis_llm::{LlmError, RetryPolicy, TextGenerator};
use async_trait::async_trait;

const P1: &str = "What is the best project management tool?";
const P2: &str = "Which tools suit small teams?";
const P3: &str = "An unselected question";

/// Answers backend queries from a fixed table and reasoning requests by
/// looking at the request text.
#[derive(Default)]
struct ScriptedGenerator {
    answers: HashMap<(Backend, String), String>,
    reasoning_down: bool,
    calls: Mutex<Vec<(Backend, String)>>,
}

impl ScriptedGenerator {
    fn market() -> Self {
        let mut answers = HashMap::new();
        answers.insert(
            (Backend::ChatGpt, P1.to_string()),
            "Asana is great for planning. Acme is also good. See https://asana.example/guide"
                .to_string(),
        );
        answers.insert(
            (Backend::Gemini, P1.to_string()),
            "Acme leads the pack, while Trello trails behind.".to_string(),
        );
        answers.insert(
            (Backend::ChatGpt, P2.to_string()),
            "Trello works for small teams.".to_string(),
        );
        Self {
            answers,
            ..Self::default()
        }
    }

    fn query_calls(&self, backend: Backend, prompt: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(b, p)| *b == backend && p == prompt)
            .count()
    }
}

fn unauthorized(backend: Backend) -> LlmError {
    LlmError::Api {
        backend,
        status: 401,
        message: "invalid api key".to_string(),
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn invoke(
        &self,
        backend: Backend,
        prompt: &str,
        _temperature: f64,
    ) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((backend, prompt.to_string()));

        let reasoning = prompt.starts_with("Analyze the sentiment")
            || prompt.starts_with("You are a strategic brand consultant")
            || prompt.starts_with("Based on these insights");
        if reasoning {
            if self.reasoning_down {
                return Err(unauthorized(backend));
            }
            return Ok(reasoning_reply(prompt));
        }

        self.answers
            .get(&(backend, prompt.to_string()))
            .cloned()
            .ok_or_else(|| unauthorized(backend))
    }
}

fn reasoning_reply(prompt: &str) -> String {
    if prompt.starts_with("Analyze the sentiment") {
        let label = if prompt.contains("Brand: Trello") {
            "negative"
        } else {
            "positive"
        };
        return format!(r#"{{"sentiment": "{label}", "reasoning": "scripted {label}"}}"#);
    }
    if prompt.starts_with("You are a strategic") {
        return "```json\n{\"why_competitors_win\": \"Asana publishes guides\", \
                \"content_gaps\": \"No templates\", \
                \"messaging_gaps\": \"Vague value\", \
                \"positioning_weaknesses\": \"Unknown brand\"}\n```"
            .to_string();
    }
    r#"{"content_ideas": ["Template gallery"], "seo_pr": ["Pitch reviews"], "messaging": ["Lead with speed"]}"#
        .to_string()
}

fn config() -> EngineConfig {
    EngineConfig {
        retry: RetryPolicy {
            max_attempts: 3,
            backoff_base: Duration::ZERO,
        },
        ..EngineConfig::default()
    }
}

/// Acme vs. Asana and Trello; two selected prompts, one unselected;
/// ChatGPT (1.0) and Gemini (0.8) selected.
async fn seed(store: &MemoryStore) -> i64 {
    let project = store
        .create_project(&NewProject {
            name: "Acme visibility".to_string(),
            company_name: "Acme".to_string(),
            description: Some("Work management".to_string()),
            area_of_work: Some("Productivity software".to_string()),
            status: ProjectStatus::Validating,
            is_competitor_view: false,
            competitor_brand_id: None,
        })
        .await
        .unwrap();
    store.add_competitor(project.id, "Asana", None).await.unwrap();
    store.add_competitor(project.id, "Trello", None).await.unwrap();
    store.add_prompt(project.id, P1, true).await.unwrap();
    store.add_prompt(project.id, P2, true).await.unwrap();
    store.add_prompt(project.id, P3, false).await.unwrap();
    store.select_backend(project.id, "chatgpt", true).await.unwrap();
    store.select_backend(project.id, "gemini", true).await.unwrap();
    project.id
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[tokio::test]
async fn full_run_scores_brands_and_builds_report() {
    let store = MemoryStore::new();
    let project_id = seed(&store).await;
    let generator = ScriptedGenerator::market();

    let report = run_pipeline(&store, &generator, &config(), project_id)
        .await
        .expect("pipeline should succeed");

    let project = store.get_project(project_id).await.unwrap();
    assert_eq!(project.status, ProjectStatus::Completed);

    let scores = store.list_brand_scores(project_id).await.unwrap();
    let by_name: HashMap<&str, _> = scores.iter().map(|s| (s.brand_name.as_str(), s)).collect();
    assert_eq!(scores.len(), 3);

    let acme = by_name["Acme"];
    assert!(acme.is_main_brand);
    assert!(close(acme.frequency_score, 0.5));
    assert!(close(acme.prominence_score, 0.75));
    assert!(close(acme.sentiment_score, 1.0));
    assert!(close(acme.model_coverage_score, 0.9));
    assert!(close(acme.normalized_score, 33.75));

    let trello = by_name["Trello"];
    assert!(close(trello.frequency_score, 1.0));
    assert!(close(trello.sentiment_score, 0.4));
    assert!(close(trello.normalized_score, 27.0));
    assert_eq!(trello.total_mentions, 2);
    assert_eq!(trello.prompts_appeared_in, 2);

    let leaderboard: Vec<&str> = report
        .competitor_comparison
        .leaderboard
        .iter()
        .map(|e| e.brand.as_str())
        .collect();
    assert_eq!(leaderboard, vec!["Asana", "Acme", "Trello"]);
    let gap = report.competitor_comparison.gap_analysis.as_ref().unwrap();
    assert_eq!(gap.compared_to, "Asana");
    assert!(close(gap.score_gap, 16.25));
    assert!(close(gap.frequency_gap, 0.0));
    assert!(close(gap.prominence_gap, 0.25));

    assert_eq!(report.prompt_wise.len(), 2);
    assert_eq!(report.prompt_wise[0].winner, "Asana");
    assert_eq!(report.prompt_wise[0].main_brand_position, Some(1.5));
    assert_eq!(report.prompt_wise[1].winner, "Trello");
    assert!(!report.prompt_wise[1].main_brand_present);

    assert_eq!(report.backend_wise.len(), 2);
    assert_eq!(report.backend_wise[0].backend, "ChatGPT");
    assert_eq!(report.backend_wise[0].top_brand.as_deref(), Some("Asana"));
    assert_eq!(report.backend_wise[0].main_brand_avg_position, Some(2.0));
    assert_eq!(report.backend_wise[1].backend, "Gemini");
    assert_eq!(report.backend_wise[1].top_brand.as_deref(), Some("Acme"));

    assert_eq!(report.negative_sentiment.total_negative, 2);
    assert!(report
        .negative_sentiment
        .instances
        .iter()
        .all(|i| i.brand == "Trello" && i.reasoning == "scripted negative"));

    assert_eq!(report.sources, vec!["https://asana.example/guide"]);
    assert_eq!(report.insights.why_competitors_win, "Asana publishes guides");
    assert_eq!(report.action_plan.content_ideas, vec!["Template gallery"]);

    let stored = store.get_report(project_id).await.unwrap();
    assert_eq!(stored.as_ref(), Some(&report));
}

#[tokio::test]
async fn failed_pairs_are_recorded_and_unselected_prompts_skipped() {
    let store = MemoryStore::new();
    let project_id = seed(&store).await;
    let generator = ScriptedGenerator::market();

    run_pipeline(&store, &generator, &config(), project_id)
        .await
        .unwrap();

    let responses = store.responses(project_id).await;
    assert_eq!(responses.len(), 4, "two selected prompts x two backends");
    let failed: Vec<_> = responses
        .iter()
        .filter(|r| r.status == ResponseStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].backend_name, "gemini");
    assert_eq!(failed[0].retry_count, 1);
    assert!(failed[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("invalid api key"));

    assert_eq!(generator.query_calls(Backend::Gemini, P2), 1, "terminal errors are not retried");
    assert_eq!(generator.query_calls(Backend::ChatGpt, P3), 0);

    let logs = store.list_logs(project_id, 100).await.unwrap();
    assert!(logs
        .iter()
        .any(|l| l.message == "Queried backends: 3/4 completed"));
    assert!(logs
        .iter()
        .any(|l| l.level == LogLevel::Warning && l.message.starts_with("Failed to query Gemini")));
    assert!(logs.iter().any(|l| l.message == "Analysis completed successfully"));
}

#[tokio::test]
async fn rerun_is_idempotent_and_skips_successful_pairs() {
    let store = MemoryStore::new();
    let project_id = seed(&store).await;
    let generator = ScriptedGenerator::market();

    let first = run_pipeline(&store, &generator, &config(), project_id)
        .await
        .unwrap();
    let scores_first = store.list_brand_scores(project_id).await.unwrap();

    let second = run_pipeline(&store, &generator, &config(), project_id)
        .await
        .unwrap();
    let scores_second = store.list_brand_scores(project_id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(scores_first, scores_second);
    assert_eq!(generator.query_calls(Backend::ChatGpt, P1), 1);
    assert_eq!(generator.query_calls(Backend::Gemini, P2), 2, "failed pair is retried on rerun");

    let failed = store
        .responses(project_id)
        .await
        .into_iter()
        .find(|r| r.status == ResponseStatus::Failed)
        .unwrap();
    assert_eq!(failed.retry_count, 2);
}

#[tokio::test]
async fn reasoning_outage_degrades_to_fallbacks() {
    let store = MemoryStore::new();
    let project_id = seed(&store).await;
    let generator = ScriptedGenerator {
        reasoning_down: true,
        ..ScriptedGenerator::market()
    };

    let report = run_pipeline(&store, &generator, &config(), project_id)
        .await
        .expect("fallbacks keep the run alive");

    let corpus = store.load_corpus(project_id).await.unwrap();
    assert!(!corpus.is_empty());
    assert!(corpus
        .iter()
        .all(|m| m.sentiment == Some(SentimentLabel::Neutral)));
    assert!(corpus
        .iter()
        .all(|m| m.sentiment_reasoning.as_deref().is_some_and(|r| r.starts_with("Error: "))));

    assert_eq!(report.insights.content_gaps, INSIGHT_PLACEHOLDER);
    assert!(report.action_plan.content_ideas.is_empty());
    assert!(report.action_plan.seo_pr.is_empty());
    assert_eq!(report.negative_sentiment.total_negative, 0);
}

#[tokio::test]
async fn unknown_backend_only_skips_its_own_queries() {
    let store = MemoryStore::new();
    store.register_backend("mistral", "Mistral", 0.5).await;
    let project_id = seed(&store).await;
    store.select_backend(project_id, "mistral", true).await.unwrap();
    let generator = ScriptedGenerator::market();

    run_pipeline(&store, &generator, &config(), project_id)
        .await
        .expect("other backends still run");

    assert_eq!(
        store.get_project(project_id).await.unwrap().status,
        ProjectStatus::Completed
    );
    let logs = store.list_logs(project_id, 100).await.unwrap();
    assert!(logs
        .iter()
        .any(|l| l.level == LogLevel::Error && l.message.starts_with("Skipping backend mistral")));
    assert!(logs
        .iter()
        .any(|l| l.message == "Queried backends: 3/6 completed"));
    assert!(store
        .responses(project_id)
        .await
        .iter()
        .all(|r| r.backend_name != "mistral"));
}

#[tokio::test]
async fn one_brand_score_failure_does_not_block_others() {
    let store = MemoryStore::new();
    let project_id = seed(&store).await;
    store.fail_brand_score_writes("Trello").await;
    let generator = ScriptedGenerator::market();

    let report = run_pipeline(&store, &generator, &config(), project_id)
        .await
        .unwrap();

    let names: Vec<String> = store
        .list_brand_scores(project_id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.brand_name)
        .collect();
    assert_eq!(names, vec!["Acme", "Asana"]);
    assert_eq!(report.competitor_comparison.leaderboard.len(), 2);

    let logs = store.list_logs(project_id, 100).await.unwrap();
    assert!(logs
        .iter()
        .any(|l| l.level == LogLevel::Error && l.message.contains("brand Trello")));
}

#[tokio::test]
async fn failed_mention_write_skips_only_that_response() {
    let store = MemoryStore::new();
    let project_id = seed(&store).await;
    let generator = ScriptedGenerator::market();

    query_stage(&store, &generator, &config(), project_id)
        .await
        .unwrap();
    let gemini = store
        .responses(project_id)
        .await
        .into_iter()
        .find(|r| r.backend_name == "gemini" && r.status == ResponseStatus::Success)
        .expect("gemini answered P1");
    store.fail_mention_writes(gemini.id).await;

    run_pipeline(&store, &generator, &config(), project_id)
        .await
        .expect("one bad response must not fail the run");
    assert_eq!(
        store.get_project(project_id).await.unwrap().status,
        ProjectStatus::Completed
    );

    let corpus = store.load_corpus(project_id).await.unwrap();
    assert!(corpus.iter().all(|m| m.response_id != gemini.id));
    let mut others: Vec<&str> = corpus.iter().map(|m| m.brand_name.as_str()).collect();
    others.sort_unstable();
    assert_eq!(others, vec!["Acme", "Asana", "Trello"]);

    let expected = format!("Failed to extract mentions from response {}", gemini.id);
    let logs = store.list_logs(project_id, 100).await.unwrap();
    assert!(logs
        .iter()
        .any(|l| l.level == LogLevel::Warning && l.message.starts_with(&expected)));

    store.clear_write_failures().await;
    run_pipeline(&store, &generator, &config(), project_id)
        .await
        .unwrap();

    let mut refilled: Vec<(String, i32)> = store
        .load_corpus(project_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.response_id == gemini.id)
        .map(|m| (m.brand_name, m.position))
        .collect();
    refilled.sort_by_key(|(_, position)| *position);
    assert_eq!(
        refilled,
        vec![("Acme".to_string(), 1), ("Trello".to_string(), 2)]
    );
}

#[tokio::test]
async fn failed_sentiment_write_leaves_mention_for_the_next_run() {
    let store = MemoryStore::new();
    let project_id = seed(&store).await;
    let generator = ScriptedGenerator::market();

    query_stage(&store, &generator, &config(), project_id)
        .await
        .unwrap();
    let project = store.get_project(project_id).await.unwrap();
    let competitors = store.list_competitors(project_id).await.unwrap();
    extract_stage(&store, project_id, &project_brands(&project, &competitors))
        .await
        .unwrap();
    let trello = store
        .load_corpus(project_id)
        .await
        .unwrap()
        .into_iter()
        .find(|m| m.brand_name == "Trello" && m.prompt_text == P2)
        .expect("Trello mentioned for P2");
    store.fail_sentiment_writes(trello.mention_id).await;

    run_pipeline(&store, &generator, &config(), project_id)
        .await
        .expect("one bad mention must not fail the run");
    assert_eq!(
        store.get_project(project_id).await.unwrap().status,
        ProjectStatus::Completed
    );

    let corpus = store.load_corpus(project_id).await.unwrap();
    for mention in &corpus {
        if mention.mention_id == trello.mention_id {
            assert_eq!(mention.sentiment, None);
        } else {
            assert!(mention.sentiment.is_some(), "{} unclassified", mention.brand_name);
        }
    }
    let expected = format!("Failed to store sentiment for Trello (mention {})", trello.mention_id);
    let logs = store.list_logs(project_id, 100).await.unwrap();
    assert!(logs
        .iter()
        .any(|l| l.level == LogLevel::Warning && l.message.starts_with(&expected)));

    store.clear_write_failures().await;
    run_pipeline(&store, &generator, &config(), project_id)
        .await
        .unwrap();

    let classified = store
        .load_corpus(project_id)
        .await
        .unwrap()
        .into_iter()
        .find(|m| m.mention_id == trello.mention_id)
        .unwrap();
    assert_eq!(classified.sentiment, Some(SentimentLabel::Negative));
}

#[tokio::test]
async fn no_successful_responses_still_writes_zero_scores() {
    let store = MemoryStore::new();
    let project_id = seed(&store).await;
    let generator = ScriptedGenerator::default();

    let report = run_pipeline(&store, &generator, &config(), project_id)
        .await
        .unwrap();

    let scores = store.list_brand_scores(project_id).await.unwrap();
    assert_eq!(scores.len(), 3);
    assert!(scores.iter().all(|s| s.total_mentions == 0 && s.normalized_score == 0.0));
    assert!(report.prompt_wise.is_empty());
    assert!(report.sources.is_empty());
}

#[tokio::test]
async fn missing_project_fails_the_run() {
    let store = MemoryStore::new();
    let generator = ScriptedGenerator::market();

    let err = run_pipeline(&store, &generator, &config(), 999)
        .await
        .expect_err("unknown project");
    assert!(matches!(err, EngineError::ProjectNotFound(999)));
}

#[tokio::test]
async fn runner_refuses_duplicate_submissions() {
    let store = Arc::new(MemoryStore::new());
    let project_id = seed(&store).await;
    let runner = PipelineRunner::new(
        store.clone(),
        Arc::new(ScriptedGenerator::market()),
        config(),
        2,
    );

    let handle = runner.submit(project_id).expect("first submission accepted");
    assert!(runner.is_in_flight(project_id));
    assert!(matches!(
        runner.submit(project_id),
        Err(EngineError::AlreadyRunning(id)) if id == project_id
    ));

    handle.await.unwrap();
    assert!(!runner.is_in_flight(project_id));
    assert_eq!(runner.status(project_id).await.unwrap(), ProjectStatus::Completed);
    assert!(!runner.logs(project_id, 5).await.unwrap().is_empty());

    runner
        .submit(project_id)
        .expect("finished project can run again")
        .await
        .unwrap();
}

#[tokio::test]
async fn runner_reports_unknown_projects() {
    let runner = PipelineRunner::new(
        Arc::new(MemoryStore::new()),
        Arc::new(ScriptedGenerator::default()),
        config(),
        1,
    );
    assert!(matches!(
        runner.status(42).await,
        Err(EngineError::ProjectNotFound(42))
    ));
}

#[tokio::test]
async fn competitor_view_swaps_the_main_brand() {
    let store = MemoryStore::new();
    let project_id = seed(&store).await;
    let asana = store
        .list_competitors(project_id)
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.name == "Asana")
        .unwrap();

    let view = impersonate_competitor(&store, project_id, asana.id)
        .await
        .unwrap();

    assert_eq!(view.company_name, "Asana");
    assert!(view.is_competitor_view);
    assert_eq!(view.competitor_brand_id, Some(asana.id));
    assert_eq!(view.status, ProjectStatus::Setup);

    let competitors: Vec<String> = store
        .list_competitors(view.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(competitors, vec!["Trello", "Acme"]);

    let prompts = store.list_prompts(view.id).await.unwrap();
    assert_eq!(prompts.len(), 3);
    assert!(!prompts[2].is_selected);

    let backends: Vec<String> = store
        .list_selected_backends(view.id)
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.backend_name)
        .collect();
    assert_eq!(backends, vec!["chatgpt", "gemini"]);

    let err = impersonate_competitor(&store, project_id, 12_345)
        .await
        .expect_err("unknown competitor");
    assert!(matches!(err, EngineError::CompetitorNotFound { .. }));
}

#[tokio::test]
async fn interrupted_impersonation_leaves_view_failed() {
    let store = MemoryStore::new();
    let project_id = seed(&store).await;
    let trello = store
        .list_competitors(project_id)
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.name == "Trello")
        .unwrap();
    store.fail_backend_selections().await;

    let err = impersonate_competitor(&store, project_id, trello.id)
        .await
        .expect_err("backend copy fails");
    assert!(matches!(err, EngineError::Store(_)));

    let view = store
        .list_projects()
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.competitor_brand_id == Some(trello.id))
        .expect("view row exists");
    assert_eq!(view.status, ProjectStatus::Failed);
    assert_eq!(store.list_prompts(view.id).await.unwrap().len(), 3);

    let logs = store.list_logs(view.id, 10).await.unwrap();
    assert!(logs.iter().any(|l| l.level == LogLevel::Error
        && l.message.starts_with("Competitor view setup failed")));

    store.clear_write_failures().await;
    let retried = impersonate_competitor(&store, project_id, trello.id)
        .await
        .unwrap();
    assert_eq!(retried.status, ProjectStatus::Setup);
    assert_ne!(retried.id, view.id);
}
