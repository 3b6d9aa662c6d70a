//! The storage seam every pipeline stage goes through.

use aivis_core::{AnalysisReport, BrandScore, LogLevel, ProjectStatus};
use async_trait::async_trait;

use crate::types::{
    BackendSelection, CompetitorRecord, LogEntry, MentionRecord, NewMention, NewProject,
    NewSentiment, ProjectRecord, PromptRecord, ResponseRecord, UnclassifiedMention,
};
use crate::DbError;

/// Project-scoped persistence with get-or-create and upsert semantics keyed
/// by natural keys, so re-running any stage reproduces the same rows.
///
/// Natural keys: response `(project, prompt, backend)`, mention
/// `(response, lower(brand))`, sentiment `(mention)`, brand score
/// `(project, brand)`, report `(project)`.
#[async_trait]
pub trait VisibilityStore: Send + Sync {
    // -- projects --------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the project does not exist.
    async fn get_project(&self, project_id: i64) -> Result<ProjectRecord, DbError>;

    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, DbError>;

    async fn create_project(&self, project: &NewProject) -> Result<ProjectRecord, DbError>;

    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the project does not exist.
    async fn set_project_status(&self, project_id: i64, status: ProjectStatus)
        -> Result<(), DbError>;

    // -- competitors, prompts, backends ----------------------------------

    /// # Errors
    ///
    /// Returns [`DbError::Conflict`] if the project already has a competitor
    /// with the same case-insensitive name.
    async fn add_competitor(
        &self,
        project_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<CompetitorRecord, DbError>;

    /// Competitors in insertion order.
    async fn list_competitors(&self, project_id: i64) -> Result<Vec<CompetitorRecord>, DbError>;

    async fn add_prompt(
        &self,
        project_id: i64,
        text: &str,
        is_selected: bool,
    ) -> Result<PromptRecord, DbError>;

    /// All prompts in insertion order, selected or not.
    async fn list_prompts(&self, project_id: i64) -> Result<Vec<PromptRecord>, DbError>;

    /// Selected prompts in insertion order.
    async fn list_selected_prompts(&self, project_id: i64) -> Result<Vec<PromptRecord>, DbError>;

    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if `backend_name` is not in the catalog.
    async fn select_backend(
        &self,
        project_id: i64,
        backend_name: &str,
        is_selected: bool,
    ) -> Result<(), DbError>;

    /// Selected backends ordered by name, with catalog display name and weight.
    async fn list_selected_backends(
        &self,
        project_id: i64,
    ) -> Result<Vec<BackendSelection>, DbError>;

    // -- responses -------------------------------------------------------

    async fn get_or_create_response(
        &self,
        project_id: i64,
        prompt_id: i64,
        backend_name: &str,
    ) -> Result<ResponseRecord, DbError>;

    /// Store the generated text, mark `success` and clear any previous error.
    async fn complete_response(&self, response_id: i64, text: &str) -> Result<(), DbError>;

    /// Mark `failed`, store the error and increment the retry counter.
    async fn fail_response(&self, response_id: i64, error: &str) -> Result<(), DbError>;

    /// Successful responses in id order.
    async fn list_successful_responses(
        &self,
        project_id: i64,
    ) -> Result<Vec<ResponseRecord>, DbError>;

    // -- mentions and sentiment -----------------------------------------

    /// Returns `false` when a mention for `(response, lower(brand))` already exists.
    async fn insert_mention_if_absent(&self, mention: &NewMention) -> Result<bool, DbError>;

    /// Mentions without a sentiment score, in mention id order.
    async fn list_unclassified_mentions(
        &self,
        project_id: i64,
    ) -> Result<Vec<UnclassifiedMention>, DbError>;

    /// Returns `false` when the mention already has a score.
    async fn insert_sentiment_if_absent(&self, sentiment: &NewSentiment) -> Result<bool, DbError>;

    /// Every mention of the project joined to its prompt, backend and
    /// sentiment, in mention id order.
    async fn load_corpus(&self, project_id: i64) -> Result<Vec<MentionRecord>, DbError>;

    // -- scores and report -----------------------------------------------

    async fn upsert_brand_score(&self, project_id: i64, score: &BrandScore)
        -> Result<(), DbError>;

    /// Brand scores in the order they were first written.
    async fn list_brand_scores(&self, project_id: i64) -> Result<Vec<BrandScore>, DbError>;

    async fn upsert_report(&self, project_id: i64, report: &AnalysisReport)
        -> Result<(), DbError>;

    async fn get_report(&self, project_id: i64) -> Result<Option<AnalysisReport>, DbError>;

    // -- execution log ---------------------------------------------------

    async fn append_log(
        &self,
        project_id: i64,
        module: &str,
        level: LogLevel,
        message: &str,
    ) -> Result<(), DbError>;

    /// Most recent `limit` entries, oldest first.
    async fn list_logs(&self, project_id: i64, limit: i64) -> Result<Vec<LogEntry>, DbError>;

    async fn ping(&self) -> Result<(), DbError>;
}
