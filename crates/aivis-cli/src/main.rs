mod project;
mod report;
mod run;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::project::ProjectCommands;

#[derive(Debug, Parser)]
#[command(name = "aivis-cli")]
#[command(about = "AI answer visibility tracker command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Create and inspect projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Run the full pipeline for a project and wait for it to finish
    Run {
        /// Project id
        #[arg(long)]
        project: i64,
        /// Run even if the project is marked as running
        #[arg(long)]
        force: bool,
    },
    /// Show a project's current status
    Status {
        /// Project id
        #[arg(long)]
        project: i64,
    },
    /// Print the stored analysis report
    Report {
        /// Project id
        #[arg(long)]
        project: i64,
        /// Emit the report as JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
    /// Show the most recent execution log entries
    Logs {
        /// Project id
        #[arg(long)]
        project: i64,
        /// Maximum number of entries to show
        #[arg(long, default_value = "50")]
        limit: i64,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check database connectivity
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("aivis-cli ready; run `aivis-cli --help` for commands");
        return Ok(());
    };

    let config = aivis_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = aivis_db::PoolConfig::from_app_config(&config);
    let pool = aivis_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Migrate => {
                let applied = aivis_db::run_migrations(&pool).await?;
                println!("applied {applied} migration(s)");
            }
            DbCommands::Ping => {
                aivis_db::ping(&pool).await?;
                println!("database reachable");
            }
        },
        Commands::Project { command } => {
            let store = aivis_db::PgStore::new(pool);
            match command {
                ProjectCommands::Load { file } => project::run_project_load(&store, &file).await?,
                ProjectCommands::List => project::run_project_list(&store).await?,
                ProjectCommands::Impersonate {
                    project,
                    competitor,
                } => project::run_project_impersonate(&store, project, competitor).await?,
            }
        }
        Commands::Run { project, force } => {
            let store = aivis_db::PgStore::new(pool);
            run::run_project_pipeline(&store, &config, project, force).await?;
        }
        Commands::Status { project } => {
            let store = aivis_db::PgStore::new(pool);
            run::run_status(&store, project).await?;
        }
        Commands::Report { project, json } => {
            let store = aivis_db::PgStore::new(pool);
            report::run_report(&store, project, json).await?;
        }
        Commands::Logs { project, limit } => {
            let store = aivis_db::PgStore::new(pool);
            run::run_logs(&store, project, limit).await?;
        }
    }

    Ok(())
}
