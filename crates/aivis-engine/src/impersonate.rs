//! Competitor views: the same market seen from a competitor's side.

use aivis_core::{LogLevel, ProjectStatus};
use aivis_db::{CompetitorRecord, NewProject, ProjectRecord, VisibilityStore};

use crate::audit::{record, MODULE_PIPELINE};
use crate::error::EngineError;

/// Creates a project whose main brand is `competitor_id`.
///
/// The other competitors carry over, the original company becomes a
/// competitor, and prompts (with their selection flags) and backend
/// selections are copied. The new project starts in `setup`.
///
/// The copy is not one transaction. If a write fails after the view exists,
/// the view is left `failed` with an error entry in its execution log and
/// the error is returned; delete it or impersonate again.
///
/// # Errors
///
/// Returns [`EngineError::ProjectNotFound`] or
/// [`EngineError::CompetitorNotFound`] for unknown ids, and
/// [`EngineError::Store`] for storage failures.
pub async fn impersonate_competitor<S>(
    store: &S,
    project_id: i64,
    competitor_id: i64,
) -> Result<ProjectRecord, EngineError>
where
    S: VisibilityStore + ?Sized,
{
    let source = store
        .get_project(project_id)
        .await
        .map_err(|e| EngineError::from_project_lookup(project_id, e))?;
    let competitors = store.list_competitors(project_id).await?;
    let Some(target) = competitors.iter().find(|c| c.id == competitor_id) else {
        return Err(EngineError::CompetitorNotFound {
            project_id,
            competitor_id,
        });
    };

    let view = store
        .create_project(&NewProject {
            name: format!("{} (competitor view of {})", target.name, source.name),
            company_name: target.name.clone(),
            description: target.description.clone(),
            area_of_work: source.area_of_work.clone(),
            status: ProjectStatus::Setup,
            is_competitor_view: true,
            competitor_brand_id: Some(target.id),
        })
        .await?;

    if let Err(e) = copy_setup(store, &source, &competitors, competitor_id, view.id).await {
        tracing::warn!(project_id = view.id, error = %e, "competitor view setup failed");
        if let Err(status_err) = store
            .set_project_status(view.id, ProjectStatus::Failed)
            .await
        {
            tracing::warn!(project_id = view.id, error = %status_err, "failed to mark view failed");
        }
        record(
            store,
            view.id,
            MODULE_PIPELINE,
            LogLevel::Error,
            &format!("Competitor view setup failed: {e}"),
        )
        .await;
        return Err(e);
    }

    tracing::info!(
        source_project = project_id,
        competitor = %target.name,
        project_id = view.id,
        "competitor view created"
    );
    Ok(view)
}

/// Copies competitors, prompts and backend selections into the view.
async fn copy_setup<S>(
    store: &S,
    source: &ProjectRecord,
    competitors: &[CompetitorRecord],
    competitor_id: i64,
    view_id: i64,
) -> Result<(), EngineError>
where
    S: VisibilityStore + ?Sized,
{
    for competitor in competitors.iter().filter(|c| c.id != competitor_id) {
        store
            .add_competitor(view_id, &competitor.name, competitor.description.as_deref())
            .await?;
    }
    store
        .add_competitor(view_id, &source.company_name, source.description.as_deref())
        .await?;

    for prompt in store.list_prompts(source.id).await? {
        store
            .add_prompt(view_id, &prompt.text, prompt.is_selected)
            .await?;
    }
    for backend in store.list_selected_backends(source.id).await? {
        store
            .select_backend(view_id, &backend.backend_name, true)
            .await?;
    }
    Ok(())
}
