//! Pipeline orchestration.
//!
//! A run is two sequential stages. The visibility check (`checking`) runs
//! query → extract → classify → score and leaves the project `analyzing`;
//! the analysis stage then builds the report and marks it `completed`. Any
//! stage error marks the project `failed`.

use aivis_core::{AnalysisReport, LogLevel, ProjectStatus};
use aivis_db::{ProjectRecord, VisibilityStore};
use aivis_llm::TextGenerator;

use crate::analysis::{analyze, AnalysisSnapshot};
use crate::audit::{record, MODULE_ANALYSIS, MODULE_PIPELINE, MODULE_VISIBILITY};
use crate::error::EngineError;
use crate::extract::extract_stage;
use crate::insights;
use crate::query::query_stage;
use crate::scorer::score_stage;
use crate::sentiment::classify_stage;
use crate::types::{project_brands, EngineConfig};

async fn load_project<S>(store: &S, project_id: i64) -> Result<ProjectRecord, EngineError>
where
    S: VisibilityStore + ?Sized,
{
    store
        .get_project(project_id)
        .await
        .map_err(|e| EngineError::from_project_lookup(project_id, e))
}

async fn visibility_steps<S, G>(
    store: &S,
    generator: &G,
    config: &EngineConfig,
    project_id: i64,
) -> Result<(), EngineError>
where
    S: VisibilityStore + ?Sized,
    G: TextGenerator + ?Sized,
{
    let project = load_project(store, project_id).await?;
    store
        .set_project_status(project_id, ProjectStatus::Checking)
        .await?;

    let competitors = store.list_competitors(project_id).await?;
    let brands = project_brands(&project, &competitors);

    query_stage(store, generator, config, project_id).await?;
    extract_stage(store, project_id, &brands).await?;
    classify_stage(store, generator, config, project_id).await?;
    score_stage(store, project_id, &brands).await?;

    store
        .set_project_status(project_id, ProjectStatus::Analyzing)
        .await?;
    Ok(())
}

/// Runs the visibility check stage.
///
/// # Errors
///
/// Returns [`EngineError`] when the project is missing or the store fails
/// outside a per-item operation. The project is then marked `failed`.
pub async fn run_visibility_check<S, G>(
    store: &S,
    generator: &G,
    config: &EngineConfig,
    project_id: i64,
) -> Result<(), EngineError>
where
    S: VisibilityStore + ?Sized,
    G: TextGenerator + ?Sized,
{
    tracing::info!(project_id, "visibility check started");
    record(store, project_id, MODULE_VISIBILITY, LogLevel::Info, "Starting visibility check engine").await;

    match visibility_steps(store, generator, config, project_id).await {
        Ok(()) => {
            record(store, project_id, MODULE_VISIBILITY, LogLevel::Info, "Visibility check completed successfully").await;
            Ok(())
        }
        Err(e) => {
            fail_project(store, project_id, MODULE_VISIBILITY, &format!("Visibility check failed: {e}")).await;
            Err(e)
        }
    }
}

/// Loads the single snapshot every analysis view is built from.
async fn load_snapshot<S>(store: &S, project: &ProjectRecord) -> Result<AnalysisSnapshot, EngineError>
where
    S: VisibilityStore + ?Sized,
{
    Ok(AnalysisSnapshot {
        main_brand: project.company_name.clone(),
        scores: store.list_brand_scores(project.id).await?,
        prompts: store.list_selected_prompts(project.id).await?,
        backends: store.list_selected_backends(project.id).await?,
        corpus: store.load_corpus(project.id).await?,
        responses: store.list_successful_responses(project.id).await?,
    })
}

async fn analysis_steps<S, G>(
    store: &S,
    generator: &G,
    config: &EngineConfig,
    project_id: i64,
) -> Result<AnalysisReport, EngineError>
where
    S: VisibilityStore + ?Sized,
    G: TextGenerator + ?Sized,
{
    let project = load_project(store, project_id).await?;
    let snapshot = load_snapshot(store, &project).await?;
    let mut report = analyze(&snapshot);

    let (insights, action_plan) = insights::generate(
        generator,
        config,
        &snapshot.main_brand,
        &report.competitor_comparison,
        &report.prompt_wise,
        &report.backend_wise,
        &report.negative_sentiment,
    )
    .await;
    report.insights = insights;
    report.action_plan = action_plan;

    store.upsert_report(project_id, &report).await?;
    store
        .set_project_status(project_id, ProjectStatus::Completed)
        .await?;
    Ok(report)
}

/// Runs the analysis stage and stores the report.
///
/// # Errors
///
/// Returns [`EngineError`] when the project is missing or the store fails.
/// The project is then marked `failed`.
pub async fn run_analysis<S, G>(
    store: &S,
    generator: &G,
    config: &EngineConfig,
    project_id: i64,
) -> Result<AnalysisReport, EngineError>
where
    S: VisibilityStore + ?Sized,
    G: TextGenerator + ?Sized,
{
    tracing::info!(project_id, "analysis started");
    record(store, project_id, MODULE_ANALYSIS, LogLevel::Info, "Starting analysis engine").await;

    match analysis_steps(store, generator, config, project_id).await {
        Ok(report) => {
            record(store, project_id, MODULE_ANALYSIS, LogLevel::Info, "Analysis completed successfully").await;
            Ok(report)
        }
        Err(e) => {
            fail_project(store, project_id, MODULE_ANALYSIS, &format!("Analysis failed: {e}")).await;
            Err(e)
        }
    }
}

/// Runs both stages in order; analysis only runs after a successful check.
///
/// # Errors
///
/// Returns the first stage error.
pub async fn run_pipeline<S, G>(
    store: &S,
    generator: &G,
    config: &EngineConfig,
    project_id: i64,
) -> Result<AnalysisReport, EngineError>
where
    S: VisibilityStore + ?Sized,
    G: TextGenerator + ?Sized,
{
    run_visibility_check(store, generator, config, project_id).await?;
    let report = run_analysis(store, generator, config, project_id).await?;
    tracing::info!(project_id, "pipeline completed");
    record(store, project_id, MODULE_PIPELINE, LogLevel::Info, "Pipeline completed").await;
    Ok(report)
}

/// Marks the project `failed` and logs why. Both writes are best-effort.
async fn fail_project<S>(store: &S, project_id: i64, module: &str, message: &str)
where
    S: VisibilityStore + ?Sized,
{
    tracing::error!(project_id, module, "{message}");
    if let Err(e) = store
        .set_project_status(project_id, ProjectStatus::Failed)
        .await
    {
        tracing::error!(project_id, error = %e, "failed to mark project as failed");
    }
    record(store, project_id, module, LogLevel::Error, message).await;
}
