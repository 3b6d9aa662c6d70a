//! Project command handlers: load a YAML definition, list projects, and
//! create competitor views.

use std::path::PathBuf;

use aivis_core::{ProjectFile, ProjectStatus};
use aivis_db::{NewProject, ProjectRecord, VisibilityStore};
use clap::Subcommand;

/// Sub-commands available under `project`.
#[derive(Debug, Subcommand)]
pub enum ProjectCommands {
    /// Create a project from a YAML definition file
    Load {
        /// Path to the project file
        #[arg(long)]
        file: PathBuf,
    },
    /// List every project with its status
    List,
    /// Create a project that tracks the market from a competitor's side
    Impersonate {
        /// Source project id
        #[arg(long)]
        project: i64,
        /// Competitor id within the source project
        #[arg(long)]
        competitor: i64,
    },
}

/// Writes a validated project definition: the project in `validating`,
/// then its competitors, prompts and backend selections.
///
/// # Errors
///
/// Returns an error if any store write fails, including a backend missing
/// from the catalog.
pub(crate) async fn persist_project_file<S>(
    store: &S,
    file: &ProjectFile,
) -> anyhow::Result<ProjectRecord>
where
    S: VisibilityStore + ?Sized,
{
    let backends = file.parsed_backends()?;
    let project = store
        .create_project(&NewProject {
            name: file.project_name().to_string(),
            company_name: file.company_name.trim().to_string(),
            description: file.description.clone(),
            area_of_work: file.area_of_work.clone(),
            status: ProjectStatus::Validating,
            is_competitor_view: false,
            competitor_brand_id: None,
        })
        .await?;

    for competitor in &file.competitors {
        store
            .add_competitor(
                project.id,
                competitor.name.trim(),
                competitor.description.as_deref(),
            )
            .await?;
    }
    for prompt in &file.prompts {
        store
            .add_prompt(project.id, prompt.text().trim(), prompt.is_selected())
            .await?;
    }
    for backend in backends {
        store.select_backend(project.id, backend.name(), true).await?;
    }

    tracing::info!(
        project_id = project.id,
        competitors = file.competitors.len(),
        prompts = file.prompts.len(),
        "project loaded"
    );
    Ok(project)
}

/// Load a project definition file and persist it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, or if
/// any database write fails.
pub(crate) async fn run_project_load<S>(store: &S, path: &std::path::Path) -> anyhow::Result<()>
where
    S: VisibilityStore + ?Sized,
{
    let file = aivis_core::load_project_file(path)?;
    let project = persist_project_file(store, &file).await?;
    println!(
        "created project {} \"{}\" ({} competitors, {} prompts, {} backends)",
        project.id,
        project.name,
        file.competitors.len(),
        file.prompts.len(),
        file.backends.len()
    );
    Ok(())
}

/// Print every project as a table.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_project_list<S>(store: &S) -> anyhow::Result<()>
where
    S: VisibilityStore + ?Sized,
{
    let projects = store.list_projects().await?;
    if projects.is_empty() {
        println!("no projects found; run `project load` first");
        return Ok(());
    }

    println!("{:<6}{:<12}{:<24}NAME", "ID", "STATUS", "MAIN BRAND");
    for project in &projects {
        let name = if project.is_competitor_view {
            format!("{} [competitor view]", project.name)
        } else {
            project.name.clone()
        };
        println!(
            "{:<6}{:<12}{:<24}{}",
            project.id, project.status, project.company_name, name
        );
    }
    Ok(())
}

/// Create a competitor view of a project.
///
/// # Errors
///
/// Returns an error if the project or competitor does not exist, or if a
/// database write fails.
pub(crate) async fn run_project_impersonate<S>(
    store: &S,
    project_id: i64,
    competitor_id: i64,
) -> anyhow::Result<()>
where
    S: VisibilityStore + ?Sized,
{
    let view = aivis_engine::impersonate_competitor(store, project_id, competitor_id).await?;
    println!(
        "created project {} \"{}\" tracking {}",
        view.id, view.name, view.company_name
    );
    Ok(())
}
