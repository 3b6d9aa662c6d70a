use aivis_core::{AppConfig, Backend};
use aivis_db::{CompetitorRecord, ProjectRecord};
use aivis_llm::RetryPolicy;

/// Temperature used for every text-generation call made by the pipeline.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Tuning for one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Backend used for sentiment, insight and action-plan calls.
    pub reasoning_backend: Backend,
    pub query_temperature: f64,
    pub reasoning_temperature: f64,
    /// Upper bound on in-flight (prompt, backend) queries.
    pub query_concurrency: usize,
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reasoning_backend: Backend::Gemini,
            query_temperature: DEFAULT_TEMPERATURE,
            reasoning_temperature: DEFAULT_TEMPERATURE,
            query_concurrency: 2,
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            reasoning_backend: config.reasoning_backend,
            query_concurrency: config.query_max_concurrency.max(1),
            retry: RetryPolicy::from_app_config(config),
            ..Self::default()
        }
    }
}

/// A brand tracked by a project: the main brand or one of its competitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brand {
    pub name: String,
    pub is_main_brand: bool,
    pub competitor_id: Option<i64>,
}

/// The main brand followed by every competitor, in insertion order.
#[must_use]
pub fn project_brands(project: &ProjectRecord, competitors: &[CompetitorRecord]) -> Vec<Brand> {
    let mut brands = Vec::with_capacity(competitors.len() + 1);
    brands.push(Brand {
        name: project.company_name.clone(),
        is_main_brand: true,
        competitor_id: None,
    });
    brands.extend(competitors.iter().map(|c| Brand {
        name: c.name.clone(),
        is_main_brand: false,
        competitor_id: Some(c.id),
    }));
    brands
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuerySummary {
    /// Pairs that ended with a successful response, cached ones included.
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub responses_scanned: usize,
    pub responses_failed: usize,
    pub mentions_inserted: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifySummary {
    pub classified: usize,
    /// Mentions that fell back to a neutral score.
    pub fallbacks: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreSummary {
    pub brands_scored: usize,
    pub brands_failed: usize,
}
