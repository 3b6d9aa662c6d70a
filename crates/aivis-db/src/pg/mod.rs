//! Postgres-backed [`VisibilityStore`].

pub mod logs;
pub mod mentions;
pub mod projects;
pub mod responses;
pub mod scores;

use aivis_core::{AnalysisReport, BrandScore, LogLevel, ProjectStatus};
use async_trait::async_trait;
use sqlx::PgPool;

use crate::store::VisibilityStore;
use crate::types::{
    BackendSelection, CompetitorRecord, LogEntry, MentionRecord, NewMention, NewProject,
    NewSentiment, ProjectRecord, PromptRecord, ResponseRecord, UnclassifiedMention,
};
use crate::DbError;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl VisibilityStore for PgStore {
    async fn get_project(&self, project_id: i64) -> Result<ProjectRecord, DbError> {
        projects::get_project(&self.pool, project_id).await
    }

    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, DbError> {
        projects::list_projects(&self.pool).await
    }

    async fn create_project(&self, project: &NewProject) -> Result<ProjectRecord, DbError> {
        projects::create_project(&self.pool, project).await
    }

    async fn set_project_status(
        &self,
        project_id: i64,
        status: ProjectStatus,
    ) -> Result<(), DbError> {
        projects::set_project_status(&self.pool, project_id, status).await
    }

    async fn add_competitor(
        &self,
        project_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<CompetitorRecord, DbError> {
        projects::add_competitor(&self.pool, project_id, name, description).await
    }

    async fn list_competitors(&self, project_id: i64) -> Result<Vec<CompetitorRecord>, DbError> {
        projects::list_competitors(&self.pool, project_id).await
    }

    async fn add_prompt(
        &self,
        project_id: i64,
        text: &str,
        is_selected: bool,
    ) -> Result<PromptRecord, DbError> {
        projects::add_prompt(&self.pool, project_id, text, is_selected).await
    }

    async fn list_prompts(&self, project_id: i64) -> Result<Vec<PromptRecord>, DbError> {
        projects::list_prompts(&self.pool, project_id, false).await
    }

    async fn list_selected_prompts(&self, project_id: i64) -> Result<Vec<PromptRecord>, DbError> {
        projects::list_prompts(&self.pool, project_id, true).await
    }

    async fn select_backend(
        &self,
        project_id: i64,
        backend_name: &str,
        is_selected: bool,
    ) -> Result<(), DbError> {
        projects::select_backend(&self.pool, project_id, backend_name, is_selected).await
    }

    async fn list_selected_backends(
        &self,
        project_id: i64,
    ) -> Result<Vec<BackendSelection>, DbError> {
        projects::list_selected_backends(&self.pool, project_id).await
    }

    async fn get_or_create_response(
        &self,
        project_id: i64,
        prompt_id: i64,
        backend_name: &str,
    ) -> Result<ResponseRecord, DbError> {
        responses::get_or_create_response(&self.pool, project_id, prompt_id, backend_name).await
    }

    async fn complete_response(&self, response_id: i64, text: &str) -> Result<(), DbError> {
        responses::complete_response(&self.pool, response_id, text).await
    }

    async fn fail_response(&self, response_id: i64, error: &str) -> Result<(), DbError> {
        responses::fail_response(&self.pool, response_id, error).await
    }

    async fn list_successful_responses(
        &self,
        project_id: i64,
    ) -> Result<Vec<ResponseRecord>, DbError> {
        responses::list_successful_responses(&self.pool, project_id).await
    }

    async fn insert_mention_if_absent(&self, mention: &NewMention) -> Result<bool, DbError> {
        mentions::insert_mention_if_absent(&self.pool, mention).await
    }

    async fn list_unclassified_mentions(
        &self,
        project_id: i64,
    ) -> Result<Vec<UnclassifiedMention>, DbError> {
        mentions::list_unclassified_mentions(&self.pool, project_id).await
    }

    async fn insert_sentiment_if_absent(&self, sentiment: &NewSentiment) -> Result<bool, DbError> {
        mentions::insert_sentiment_if_absent(&self.pool, sentiment).await
    }

    async fn load_corpus(&self, project_id: i64) -> Result<Vec<MentionRecord>, DbError> {
        mentions::load_corpus(&self.pool, project_id).await
    }

    async fn upsert_brand_score(
        &self,
        project_id: i64,
        score: &BrandScore,
    ) -> Result<(), DbError> {
        scores::upsert_brand_score(&self.pool, project_id, score).await
    }

    async fn list_brand_scores(&self, project_id: i64) -> Result<Vec<BrandScore>, DbError> {
        scores::list_brand_scores(&self.pool, project_id).await
    }

    async fn upsert_report(
        &self,
        project_id: i64,
        report: &AnalysisReport,
    ) -> Result<(), DbError> {
        scores::upsert_report(&self.pool, project_id, report).await
    }

    async fn get_report(&self, project_id: i64) -> Result<Option<AnalysisReport>, DbError> {
        scores::get_report(&self.pool, project_id).await
    }

    async fn append_log(
        &self,
        project_id: i64,
        module: &str,
        level: LogLevel,
        message: &str,
    ) -> Result<(), DbError> {
        logs::append_log(&self.pool, project_id, module, level, message).await
    }

    async fn list_logs(&self, project_id: i64, limit: i64) -> Result<Vec<LogEntry>, DbError> {
        logs::list_logs(&self.pool, project_id, limit).await
    }

    async fn ping(&self) -> Result<(), DbError> {
        crate::ping(&self.pool).await?;
        Ok(())
    }
}
