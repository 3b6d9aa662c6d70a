//! Pipeline execution and progress inspection.

use aivis_core::AppConfig;
use aivis_db::VisibilityStore;
use aivis_engine::EngineConfig;
use aivis_llm::{LlmClient, LlmSettings};

/// Run the full pipeline in the foreground and print the headline result.
///
/// Progress goes to the project's execution log as the run proceeds; use
/// `logs` to inspect it afterwards.
///
/// A project already `checking` or `analyzing` is refused unless `force` is
/// set, which recovers a project left mid-run by a crashed process.
///
/// # Errors
///
/// Returns an error if the project does not exist or is already running,
/// the LLM client cannot be built, or a stage fails outright. The project is
/// marked `failed` in the latter case.
pub(crate) async fn run_project_pipeline<S>(
    store: &S,
    config: &AppConfig,
    project_id: i64,
    force: bool,
) -> anyhow::Result<()>
where
    S: VisibilityStore + ?Sized,
{
    let project = store.get_project(project_id).await?;
    if project.status.is_running() && !force {
        anyhow::bail!(
            "project {project_id} is already {}; wait for it to finish or pass `--force`",
            project.status
        );
    }

    let client = LlmClient::new(LlmSettings::from_app_config(config))?;
    let engine_config = EngineConfig::from_app_config(config);

    let report = aivis_engine::run_pipeline(store, &client, &engine_config, project_id).await?;

    println!("project {project_id} completed");
    if let Some(main) = &report.competitor_comparison.main_brand {
        println!(
            "{}: visibility {:.2}, mentioned in {} prompt(s)",
            main.brand, main.visibility_score, main.prompts_appeared
        );
    }
    if let Some(gap) = &report.competitor_comparison.gap_analysis {
        println!("behind {} by {:.2} points", gap.compared_to, gap.score_gap);
    }
    println!("run `report --project {project_id}` for the full report");
    Ok(())
}

/// Print a project's current status.
///
/// # Errors
///
/// Returns an error if the project does not exist.
pub(crate) async fn run_status<S>(store: &S, project_id: i64) -> anyhow::Result<()>
where
    S: VisibilityStore + ?Sized,
{
    let project = store
        .get_project(project_id)
        .await
        .map_err(|e| anyhow::anyhow!("project {project_id}: {e}"))?;
    println!("{} ({}): {}", project.name, project.id, project.status);
    Ok(())
}

/// Print the most recent execution-log entries, oldest first.
///
/// # Errors
///
/// Returns an error if the project does not exist or the query fails.
pub(crate) async fn run_logs<S>(store: &S, project_id: i64, limit: i64) -> anyhow::Result<()>
where
    S: VisibilityStore + ?Sized,
{
    store.get_project(project_id).await?;
    let entries = store.list_logs(project_id, limit.clamp(1, 1000)).await?;
    if entries.is_empty() {
        println!("no log entries for project {project_id}; run `run --project {project_id}` first");
        return Ok(());
    }

    println!("{:<21}{:<9}{:<18}MESSAGE", "TIME", "LEVEL", "MODULE");
    for entry in &entries {
        println!(
            "{:<21}{:<9}{:<18}{}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.level,
            entry.module,
            entry.message
        );
    }
    Ok(())
}
