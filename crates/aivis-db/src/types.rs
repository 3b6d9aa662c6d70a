//! Records exchanged between the store and the pipeline.

use aivis_core::{LogLevel, ProjectStatus, ResponseStatus, SentimentLabel};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    pub id: i64,
    pub name: String,
    /// The main brand.
    pub company_name: String,
    pub description: Option<String>,
    pub area_of_work: Option<String>,
    pub status: ProjectStatus,
    pub is_competitor_view: bool,
    /// Source competitor when the project was created by impersonation.
    pub competitor_brand_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub company_name: String,
    pub description: Option<String>,
    pub area_of_work: Option<String>,
    pub status: ProjectStatus,
    pub is_competitor_view: bool,
    pub competitor_brand_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompetitorRecord {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptRecord {
    pub id: i64,
    pub project_id: i64,
    pub text: String,
    pub is_selected: bool,
}

/// A backend selected for a project, joined to its catalog row.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSelection {
    pub backend_name: String,
    pub display_name: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRecord {
    pub id: i64,
    pub project_id: i64,
    pub prompt_id: i64,
    pub backend_name: String,
    pub raw_response: Option<String>,
    pub status: ResponseStatus,
    pub retry_count: i32,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMention {
    pub response_id: i64,
    pub brand_name: String,
    pub position: i32,
    pub context: String,
    pub is_main_brand: bool,
    pub competitor_id: Option<i64>,
}

/// A mention still waiting for a sentiment score, with the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct UnclassifiedMention {
    pub mention_id: i64,
    pub brand_name: String,
    pub context: String,
    pub response_text: String,
}

#[derive(Debug, Clone)]
pub struct NewSentiment {
    pub mention_id: i64,
    pub label: SentimentLabel,
    pub confidence: f64,
    pub reasoning: String,
}

/// One mention joined to its response, prompt and (optional) sentiment.
///
/// The scorer and every analysis view read the same `Vec<MentionRecord>`,
/// loaded once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct MentionRecord {
    pub mention_id: i64,
    pub response_id: i64,
    pub prompt_id: i64,
    pub prompt_text: String,
    pub backend_name: String,
    pub brand_name: String,
    pub position: i32,
    pub context: String,
    pub is_main_brand: bool,
    pub sentiment: Option<SentimentLabel>,
    pub sentiment_reasoning: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub id: i64,
    pub project_id: i64,
    pub module: String,
    pub level: LogLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
