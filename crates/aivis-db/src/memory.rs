//! In-process [`VisibilityStore`] with the same natural-key semantics as
//! Postgres. Used by tests and by `--dry-run` style tooling.

use std::collections::{BTreeMap, HashSet};

use aivis_core::{AnalysisReport, Backend, BrandScore, LogLevel, ProjectStatus, ResponseStatus};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::store::VisibilityStore;
use crate::types::{
    BackendSelection, CompetitorRecord, LogEntry, MentionRecord, NewMention, NewProject,
    NewSentiment, ProjectRecord, PromptRecord, ResponseRecord, UnclassifiedMention,
};
use crate::DbError;

#[derive(Debug, Clone)]
struct CatalogEntry {
    display_name: String,
    weight: f64,
}

#[derive(Debug, Clone)]
struct StoredMention {
    id: i64,
    mention: NewMention,
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    catalog: BTreeMap<String, CatalogEntry>,
    projects: BTreeMap<i64, ProjectRecord>,
    competitors: Vec<CompetitorRecord>,
    prompts: Vec<PromptRecord>,
    selections: BTreeMap<(i64, String), bool>,
    responses: Vec<ResponseRecord>,
    mentions: Vec<StoredMention>,
    sentiments: BTreeMap<i64, NewSentiment>,
    scores: Vec<(i64, BrandScore)>,
    reports: BTreeMap<i64, AnalysisReport>,
    logs: Vec<LogEntry>,
    failing_score_brands: HashSet<String>,
    failing_mention_responses: HashSet<i64>,
    failing_sentiment_mentions: HashSet<i64>,
    failing_backend_selections: bool,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn project_mut(&mut self, project_id: i64) -> Result<&mut ProjectRecord, DbError> {
        self.projects
            .get_mut(&project_id)
            .ok_or_else(|| DbError::not_found("project", project_id))
    }

    fn response_mut(&mut self, response_id: i64) -> Result<&mut ResponseRecord, DbError> {
        self.responses
            .iter_mut()
            .find(|r| r.id == response_id)
            .ok_or_else(|| DbError::not_found("response", response_id))
    }

    fn response(&self, response_id: i64) -> Option<&ResponseRecord> {
        self.responses.iter().find(|r| r.id == response_id)
    }

    fn prompts_for(&self, project_id: i64, selected_only: bool) -> Vec<PromptRecord> {
        self.prompts
            .iter()
            .filter(|p| p.project_id == project_id && (!selected_only || p.is_selected))
            .cloned()
            .collect()
    }
}

fn injected_failure(what: &str) -> DbError {
    DbError::Sqlx(sqlx::Error::Protocol(format!("injected failure writing {what}")))
}

/// A [`VisibilityStore`] held entirely in memory.
///
/// The backend catalog starts with the three supported backends at their
/// default weights; [`MemoryStore::register_backend`] adds or reweights
/// catalog rows.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        let mut state = State::default();
        for backend in Backend::ALL {
            state.catalog.insert(
                backend.name().to_string(),
                CatalogEntry {
                    display_name: backend.display_name().to_string(),
                    weight: backend.default_weight(),
                },
            );
        }
        Self {
            state: Mutex::new(state),
        }
    }

    /// Adds or replaces a catalog row.
    pub async fn register_backend(&self, name: &str, display_name: &str, weight: f64) {
        self.state.lock().await.catalog.insert(
            name.to_string(),
            CatalogEntry {
                display_name: display_name.to_string(),
                weight,
            },
        );
    }

    /// Makes every later `upsert_brand_score` for `brand` fail.
    pub async fn fail_brand_score_writes(&self, brand: &str) {
        self.state
            .lock()
            .await
            .failing_score_brands
            .insert(brand.to_lowercase());
    }

    /// Makes every later `insert_mention_if_absent` for `response_id` fail.
    pub async fn fail_mention_writes(&self, response_id: i64) {
        self.state
            .lock()
            .await
            .failing_mention_responses
            .insert(response_id);
    }

    /// Makes every later `insert_sentiment_if_absent` for `mention_id` fail.
    pub async fn fail_sentiment_writes(&self, mention_id: i64) {
        self.state
            .lock()
            .await
            .failing_sentiment_mentions
            .insert(mention_id);
    }

    /// Makes every later `select_backend` fail.
    pub async fn fail_backend_selections(&self) {
        self.state.lock().await.failing_backend_selections = true;
    }

    /// Removes every injected write failure.
    pub async fn clear_write_failures(&self) {
        let mut state = self.state.lock().await;
        state.failing_score_brands.clear();
        state.failing_mention_responses.clear();
        state.failing_sentiment_mentions.clear();
        state.failing_backend_selections = false;
    }

    /// All responses of a project in id order, whatever their status.
    pub async fn responses(&self, project_id: i64) -> Vec<ResponseRecord> {
        self.state
            .lock()
            .await
            .responses
            .iter()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl VisibilityStore for MemoryStore {
    async fn get_project(&self, project_id: i64) -> Result<ProjectRecord, DbError> {
        let state = self.state.lock().await;
        state
            .projects
            .get(&project_id)
            .cloned()
            .ok_or_else(|| DbError::not_found("project", project_id))
    }

    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, DbError> {
        Ok(self.state.lock().await.projects.values().cloned().collect())
    }

    async fn create_project(&self, project: &NewProject) -> Result<ProjectRecord, DbError> {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let record = ProjectRecord {
            id,
            name: project.name.clone(),
            company_name: project.company_name.clone(),
            description: project.description.clone(),
            area_of_work: project.area_of_work.clone(),
            status: project.status,
            is_competitor_view: project.is_competitor_view,
            competitor_brand_id: project.competitor_brand_id,
            created_at: Utc::now(),
        };
        state.projects.insert(id, record.clone());
        Ok(record)
    }

    async fn set_project_status(
        &self,
        project_id: i64,
        status: ProjectStatus,
    ) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        state.project_mut(project_id)?.status = status;
        Ok(())
    }

    async fn add_competitor(
        &self,
        project_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<CompetitorRecord, DbError> {
        let mut state = self.state.lock().await;
        let lowered = name.to_lowercase();
        if state
            .competitors
            .iter()
            .any(|c| c.project_id == project_id && c.name.to_lowercase() == lowered)
        {
            return Err(DbError::conflict("competitor", name));
        }
        let id = state.next_id();
        let record = CompetitorRecord {
            id,
            project_id,
            name: name.to_string(),
            description: description.map(str::to_string),
        };
        state.competitors.push(record.clone());
        Ok(record)
    }

    async fn list_competitors(&self, project_id: i64) -> Result<Vec<CompetitorRecord>, DbError> {
        let state = self.state.lock().await;
        Ok(state
            .competitors
            .iter()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn add_prompt(
        &self,
        project_id: i64,
        text: &str,
        is_selected: bool,
    ) -> Result<PromptRecord, DbError> {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let record = PromptRecord {
            id,
            project_id,
            text: text.to_string(),
            is_selected,
        };
        state.prompts.push(record.clone());
        Ok(record)
    }

    async fn list_prompts(&self, project_id: i64) -> Result<Vec<PromptRecord>, DbError> {
        Ok(self.state.lock().await.prompts_for(project_id, false))
    }

    async fn list_selected_prompts(&self, project_id: i64) -> Result<Vec<PromptRecord>, DbError> {
        Ok(self.state.lock().await.prompts_for(project_id, true))
    }

    async fn select_backend(
        &self,
        project_id: i64,
        backend_name: &str,
        is_selected: bool,
    ) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        if state.failing_backend_selections {
            return Err(injected_failure(&format!("selection of {backend_name}")));
        }
        if !state.catalog.contains_key(backend_name) {
            return Err(DbError::not_found("backend", backend_name));
        }
        state
            .selections
            .insert((project_id, backend_name.to_string()), is_selected);
        Ok(())
    }

    async fn list_selected_backends(
        &self,
        project_id: i64,
    ) -> Result<Vec<BackendSelection>, DbError> {
        let state = self.state.lock().await;
        Ok(state
            .selections
            .iter()
            .filter(|((pid, _), selected)| *pid == project_id && **selected)
            .filter_map(|((_, name), _)| {
                state.catalog.get(name).map(|entry| BackendSelection {
                    backend_name: name.clone(),
                    display_name: entry.display_name.clone(),
                    weight: entry.weight,
                })
            })
            .collect())
    }

    async fn get_or_create_response(
        &self,
        project_id: i64,
        prompt_id: i64,
        backend_name: &str,
    ) -> Result<ResponseRecord, DbError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.responses.iter().find(|r| {
            r.project_id == project_id && r.prompt_id == prompt_id && r.backend_name == backend_name
        }) {
            return Ok(existing.clone());
        }
        let id = state.next_id();
        let record = ResponseRecord {
            id,
            project_id,
            prompt_id,
            backend_name: backend_name.to_string(),
            raw_response: None,
            status: ResponseStatus::Pending,
            retry_count: 0,
            error_message: None,
        };
        state.responses.push(record.clone());
        Ok(record)
    }

    async fn complete_response(&self, response_id: i64, text: &str) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        let response = state.response_mut(response_id)?;
        response.raw_response = Some(text.to_string());
        response.status = ResponseStatus::Success;
        response.error_message = None;
        Ok(())
    }

    async fn fail_response(&self, response_id: i64, error: &str) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        let response = state.response_mut(response_id)?;
        response.status = ResponseStatus::Failed;
        response.error_message = Some(error.to_string());
        response.retry_count += 1;
        Ok(())
    }

    async fn list_successful_responses(
        &self,
        project_id: i64,
    ) -> Result<Vec<ResponseRecord>, DbError> {
        let state = self.state.lock().await;
        Ok(state
            .responses
            .iter()
            .filter(|r| r.project_id == project_id && r.status == ResponseStatus::Success)
            .cloned()
            .collect())
    }

    async fn insert_mention_if_absent(&self, mention: &NewMention) -> Result<bool, DbError> {
        let mut state = self.state.lock().await;
        if state
            .failing_mention_responses
            .contains(&mention.response_id)
        {
            return Err(injected_failure(&format!(
                "mention of {} in response {}",
                mention.brand_name, mention.response_id
            )));
        }
        let lowered = mention.brand_name.to_lowercase();
        if state.mentions.iter().any(|m| {
            m.mention.response_id == mention.response_id
                && m.mention.brand_name.to_lowercase() == lowered
        }) {
            return Ok(false);
        }
        let id = state.next_id();
        state.mentions.push(StoredMention {
            id,
            mention: mention.clone(),
        });
        Ok(true)
    }

    async fn list_unclassified_mentions(
        &self,
        project_id: i64,
    ) -> Result<Vec<UnclassifiedMention>, DbError> {
        let state = self.state.lock().await;
        Ok(state
            .mentions
            .iter()
            .filter(|m| !state.sentiments.contains_key(&m.id))
            .filter_map(|m| {
                let response = state.response(m.mention.response_id)?;
                (response.project_id == project_id).then(|| UnclassifiedMention {
                    mention_id: m.id,
                    brand_name: m.mention.brand_name.clone(),
                    context: m.mention.context.clone(),
                    response_text: response.raw_response.clone().unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn insert_sentiment_if_absent(&self, sentiment: &NewSentiment) -> Result<bool, DbError> {
        let mut state = self.state.lock().await;
        if state
            .failing_sentiment_mentions
            .contains(&sentiment.mention_id)
        {
            return Err(injected_failure(&format!(
                "sentiment of mention {}",
                sentiment.mention_id
            )));
        }
        if state.sentiments.contains_key(&sentiment.mention_id) {
            return Ok(false);
        }
        if !state.mentions.iter().any(|m| m.id == sentiment.mention_id) {
            return Err(DbError::not_found("mention", sentiment.mention_id));
        }
        state
            .sentiments
            .insert(sentiment.mention_id, sentiment.clone());
        Ok(true)
    }

    async fn load_corpus(&self, project_id: i64) -> Result<Vec<MentionRecord>, DbError> {
        let state = self.state.lock().await;
        let mut records = Vec::new();
        for stored in &state.mentions {
            let Some(response) = state.response(stored.mention.response_id) else {
                continue;
            };
            if response.project_id != project_id {
                continue;
            }
            let prompt_text = state
                .prompts
                .iter()
                .find(|p| p.id == response.prompt_id)
                .map(|p| p.text.clone())
                .unwrap_or_default();
            let sentiment = state.sentiments.get(&stored.id);
            records.push(MentionRecord {
                mention_id: stored.id,
                response_id: response.id,
                prompt_id: response.prompt_id,
                prompt_text,
                backend_name: response.backend_name.clone(),
                brand_name: stored.mention.brand_name.clone(),
                position: stored.mention.position,
                context: stored.mention.context.clone(),
                is_main_brand: stored.mention.is_main_brand,
                sentiment: sentiment.map(|s| s.label),
                sentiment_reasoning: sentiment.map(|s| s.reasoning.clone()),
            });
        }
        Ok(records)
    }

    async fn upsert_brand_score(
        &self,
        project_id: i64,
        score: &BrandScore,
    ) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        if state
            .failing_score_brands
            .contains(&score.brand_name.to_lowercase())
        {
            return Err(injected_failure(&format!("score for {}", score.brand_name)));
        }
        if let Some((_, existing)) = state
            .scores
            .iter_mut()
            .find(|(pid, s)| *pid == project_id && s.brand_name == score.brand_name)
        {
            *existing = score.clone();
        } else {
            state.scores.push((project_id, score.clone()));
        }
        Ok(())
    }

    async fn list_brand_scores(&self, project_id: i64) -> Result<Vec<BrandScore>, DbError> {
        let state = self.state.lock().await;
        Ok(state
            .scores
            .iter()
            .filter(|(pid, _)| *pid == project_id)
            .map(|(_, s)| s.clone())
            .collect())
    }

    async fn upsert_report(
        &self,
        project_id: i64,
        report: &AnalysisReport,
    ) -> Result<(), DbError> {
        self.state
            .lock()
            .await
            .reports
            .insert(project_id, report.clone());
        Ok(())
    }

    async fn get_report(&self, project_id: i64) -> Result<Option<AnalysisReport>, DbError> {
        Ok(self.state.lock().await.reports.get(&project_id).cloned())
    }

    async fn append_log(
        &self,
        project_id: i64,
        module: &str,
        level: LogLevel,
        message: &str,
    ) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.logs.push(LogEntry {
            id,
            project_id,
            module: module.to_string(),
            level,
            message: message.to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_logs(&self, project_id: i64, limit: i64) -> Result<Vec<LogEntry>, DbError> {
        let state = self.state.lock().await;
        let entries: Vec<LogEntry> = state
            .logs
            .iter()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect();
        let keep = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let skip = entries.len().saturating_sub(keep);
        Ok(entries.into_iter().skip(skip).collect())
    }

    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}
