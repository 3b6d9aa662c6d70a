//! Query stage: one response per selected (prompt, backend) pair.
//!
//! Pairs run through a bounded pool. A pair whose stored response already
//! succeeded is not queried again.

use aivis_core::{Backend, LogLevel, ResponseStatus};
use aivis_db::{BackendSelection, PromptRecord, VisibilityStore};
use aivis_llm::{invoke_with_retry, TextGenerator};
use futures::stream::{self, StreamExt};

use crate::audit::{record, MODULE_VISIBILITY};
use crate::error::EngineError;
use crate::types::{EngineConfig, QuerySummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairOutcome {
    Cached,
    Succeeded,
    Failed,
}

async fn query_pair<S, G>(
    store: &S,
    generator: &G,
    config: &EngineConfig,
    project_id: i64,
    prompt: &PromptRecord,
    backend: Backend,
) -> Result<PairOutcome, EngineError>
where
    S: VisibilityStore + ?Sized,
    G: TextGenerator + ?Sized,
{
    let response = store
        .get_or_create_response(project_id, prompt.id, backend.name())
        .await?;
    if response.status == ResponseStatus::Success {
        return Ok(PairOutcome::Cached);
    }

    let outcome = invoke_with_retry(
        generator,
        config.retry,
        backend,
        &prompt.text,
        config.query_temperature,
    )
    .await;

    match outcome {
        Ok(text) => {
            store.complete_response(response.id, &text).await?;
            record(
                store,
                project_id,
                MODULE_VISIBILITY,
                LogLevel::Info,
                &format!("Successfully queried {}", backend.display_name()),
            )
            .await;
            Ok(PairOutcome::Succeeded)
        }
        Err(e) => {
            let message = e.to_string();
            store.fail_response(response.id, &message).await?;
            tracing::warn!(project_id, prompt_id = prompt.id, backend = %backend, error = %message, "backend query failed");
            record(
                store,
                project_id,
                MODULE_VISIBILITY,
                LogLevel::Warning,
                &format!("Failed to query {}: {message}", backend.display_name()),
            )
            .await;
            Ok(PairOutcome::Failed)
        }
    }
}

/// Resolves selected backend names. An unknown name is logged and dropped so
/// only that backend's queries are skipped.
async fn resolve_backends<S>(
    store: &S,
    project_id: i64,
    selections: &[BackendSelection],
) -> Vec<Backend>
where
    S: VisibilityStore + ?Sized,
{
    let mut backends = Vec::with_capacity(selections.len());
    for selection in selections {
        match selection.backend_name.parse::<Backend>() {
            Ok(backend) => backends.push(backend),
            Err(e) => {
                let err = EngineError::from(e);
                tracing::error!(project_id, backend = %selection.backend_name, error = %err, "skipping backend");
                record(
                    store,
                    project_id,
                    MODULE_VISIBILITY,
                    LogLevel::Error,
                    &format!("Skipping backend {}: {err}", selection.backend_name),
                )
                .await;
            }
        }
    }
    backends
}

/// Queries every selected prompt against every selected backend.
///
/// # Errors
///
/// Returns [`EngineError::Store`] if the selections cannot be loaded. Store
/// failures inside a single pair count that pair as failed.
pub async fn query_stage<S, G>(
    store: &S,
    generator: &G,
    config: &EngineConfig,
    project_id: i64,
) -> Result<QuerySummary, EngineError>
where
    S: VisibilityStore + ?Sized,
    G: TextGenerator + ?Sized,
{
    let prompts = store.list_selected_prompts(project_id).await?;
    let selections = store.list_selected_backends(project_id).await?;

    if prompts.is_empty() {
        tracing::warn!(project_id, "no prompts selected");
        record(store, project_id, MODULE_VISIBILITY, LogLevel::Warning, "No prompts selected").await;
        return Ok(QuerySummary::default());
    }
    if selections.is_empty() {
        tracing::warn!(project_id, "no backends selected");
        record(store, project_id, MODULE_VISIBILITY, LogLevel::Warning, "No backends selected").await;
        return Ok(QuerySummary::default());
    }

    let backends = resolve_backends(store, project_id, &selections).await;
    let pairs: Vec<(&PromptRecord, Backend)> = prompts
        .iter()
        .flat_map(|p| backends.iter().map(move |&b| (p, b)))
        .collect();

    let pair_futures: Vec<_> = pairs
        .iter()
        .map(|&(prompt, backend)| query_pair(store, generator, config, project_id, prompt, backend))
        .collect();
    let outcomes: Vec<Result<PairOutcome, EngineError>> = stream::iter(pair_futures)
        .buffer_unordered(config.query_concurrency.max(1))
        .collect()
        .await;

    let mut summary = QuerySummary {
        total: prompts.len() * selections.len(),
        ..QuerySummary::default()
    };
    for outcome in outcomes {
        match outcome {
            Ok(PairOutcome::Cached | PairOutcome::Succeeded) => summary.completed += 1,
            Ok(PairOutcome::Failed) => summary.failed += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::error!(project_id, error = %e, "query pair aborted");
            }
        }
    }

    tracing::info!(
        project_id,
        completed = summary.completed,
        failed = summary.failed,
        total = summary.total,
        "query stage finished"
    );
    record(
        store,
        project_id,
        MODULE_VISIBILITY,
        LogLevel::Info,
        &format!("Queried backends: {}/{} completed", summary.completed, summary.total),
    )
    .await;
    Ok(summary)
}
