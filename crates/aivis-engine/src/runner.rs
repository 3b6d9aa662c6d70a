//! Fire-and-forget execution of pipeline runs.
//!
//! At most `max_concurrent_runs` pipelines execute at once; extra
//! submissions wait for a permit. A project already queued or running is
//! refused. Callers observe progress only through the project's status and
//! execution log.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use aivis_core::ProjectStatus;
use aivis_db::{LogEntry, VisibilityStore};
use aivis_llm::TextGenerator;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error::EngineError;
use crate::pipeline::run_pipeline;
use crate::types::EngineConfig;

#[derive(Clone)]
pub struct PipelineRunner {
    store: Arc<dyn VisibilityStore>,
    generator: Arc<dyn TextGenerator>,
    config: EngineConfig,
    permits: Arc<Semaphore>,
    in_flight: Arc<Mutex<HashSet<i64>>>,
}

/// Removes the project from the in-flight set when the run ends, however
/// it ends.
struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<i64>>>,
    project_id: i64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.project_id);
    }
}

impl PipelineRunner {
    #[must_use]
    pub fn new(
        store: Arc<dyn VisibilityStore>,
        generator: Arc<dyn TextGenerator>,
        config: EngineConfig,
        max_concurrent_runs: usize,
    ) -> Self {
        Self {
            store,
            generator,
            config,
            permits: Arc::new(Semaphore::new(max_concurrent_runs.max(1))),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn VisibilityStore> {
        &self.store
    }

    /// Whether a run for `project_id` is queued or executing.
    #[must_use]
    pub fn is_in_flight(&self, project_id: i64) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&project_id)
    }

    /// Queues a run and returns immediately. The handle may be dropped; the
    /// run continues in the background.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyRunning`] if the project already has a
    /// run queued or executing.
    pub fn submit(&self, project_id: i64) -> Result<JoinHandle<()>, EngineError> {
        if !self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(project_id)
        {
            return Err(EngineError::AlreadyRunning(project_id));
        }
        let guard = InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            project_id,
        };

        let runner = self.clone();
        tracing::info!(project_id, "pipeline run queued");
        Ok(tokio::spawn(async move {
            let _guard = guard;
            let Ok(_permit) = runner.permits.acquire().await else {
                tracing::error!(project_id, "run pool closed; run dropped");
                return;
            };
            match run_pipeline(
                runner.store.as_ref(),
                runner.generator.as_ref(),
                &runner.config,
                project_id,
            )
            .await
            {
                Ok(_) => tracing::info!(project_id, "pipeline run finished"),
                Err(e) => tracing::error!(project_id, error = %e, "pipeline run failed"),
            }
        }))
    }

    /// # Errors
    ///
    /// Returns [`EngineError::ProjectNotFound`] for an unknown project.
    pub async fn status(&self, project_id: i64) -> Result<ProjectStatus, EngineError> {
        let project = self
            .store
            .get_project(project_id)
            .await
            .map_err(|e| EngineError::from_project_lookup(project_id, e))?;
        Ok(project.status)
    }

    /// Most recent `limit` execution-log entries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ProjectNotFound`] for an unknown project.
    pub async fn logs(&self, project_id: i64, limit: i64) -> Result<Vec<LogEntry>, EngineError> {
        self.status(project_id).await?;
        Ok(self.store.list_logs(project_id, limit).await?)
    }
}
