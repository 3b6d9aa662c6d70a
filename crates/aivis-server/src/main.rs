mod api;
mod middleware;

use std::sync::Arc;

use aivis_engine::{EngineConfig, PipelineRunner};
use aivis_llm::{LlmClient, LlmSettings};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = aivis_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = aivis_db::PoolConfig::from_app_config(&config);
    let pool = aivis_db::connect_pool(&config.database_url, pool_config).await?;
    aivis_db::run_migrations(&pool).await?;

    let client = LlmClient::new(LlmSettings::from_app_config(&config))?;
    let runner = PipelineRunner::new(
        Arc::new(aivis_db::PgStore::new(pool)),
        Arc::new(client),
        EngineConfig::from_app_config(&config),
        config.max_concurrent_runs,
    );

    let auth = AuthState::from_env(matches!(config.env, aivis_core::Environment::Development))?;
    let app = build_app(AppState { runner }, auth);

    tracing::info!(addr = %config.bind_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown; in-flight runs are abandoned");
}
