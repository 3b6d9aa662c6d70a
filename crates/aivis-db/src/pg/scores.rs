//! Database operations for `brand_scores` and `analysis_reports`.

use aivis_core::{AnalysisReport, BrandScore};
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandScoreRow {
    pub brand_name: String,
    pub is_main_brand: bool,
    pub frequency_score: f64,
    pub prominence_score: f64,
    pub sentiment_score: f64,
    pub model_coverage_score: f64,
    pub raw_score: f64,
    pub normalized_score: f64,
    pub total_mentions: i64,
    pub prompts_appeared_in: i64,
}

impl From<BrandScoreRow> for BrandScore {
    fn from(row: BrandScoreRow) -> Self {
        Self {
            brand_name: row.brand_name,
            is_main_brand: row.is_main_brand,
            frequency_score: row.frequency_score,
            prominence_score: row.prominence_score,
            sentiment_score: row.sentiment_score,
            model_coverage_score: row.model_coverage_score,
            raw_score: row.raw_score,
            normalized_score: row.normalized_score,
            total_mentions: row.total_mentions,
            prompts_appeared_in: row.prompts_appeared_in,
        }
    }
}

/// A row from `analysis_reports`; each section is a JSONB document.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportRow {
    pub competitor_comparison: Value,
    pub prompt_wise: Value,
    pub backend_wise: Value,
    pub negative_sentiment: Value,
    pub sources: Value,
    pub insights: Value,
    pub action_plan: Value,
}

impl TryFrom<ReportRow> for AnalysisReport {
    type Error = DbError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        Ok(Self {
            competitor_comparison: serde_json::from_value(row.competitor_comparison)?,
            prompt_wise: serde_json::from_value(row.prompt_wise)?,
            backend_wise: serde_json::from_value(row.backend_wise)?,
            negative_sentiment: serde_json::from_value(row.negative_sentiment)?,
            sources: serde_json::from_value(row.sources)?,
            insights: serde_json::from_value(row.insights)?,
            action_plan: serde_json::from_value(row.action_plan)?,
        })
    }
}

// ---------------------------------------------------------------------------
// brand_scores
// ---------------------------------------------------------------------------

/// Inserts or recomputes the score row for `(project, brand)` in place.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_brand_score(
    pool: &PgPool,
    project_id: i64,
    score: &BrandScore,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO brand_scores \
             (project_id, brand_name, is_main_brand, frequency_score, prominence_score, \
              sentiment_score, model_coverage_score, raw_score, normalized_score, \
              total_mentions, prompts_appeared_in) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (project_id, brand_name) DO UPDATE SET \
             is_main_brand        = EXCLUDED.is_main_brand, \
             frequency_score      = EXCLUDED.frequency_score, \
             prominence_score     = EXCLUDED.prominence_score, \
             sentiment_score      = EXCLUDED.sentiment_score, \
             model_coverage_score = EXCLUDED.model_coverage_score, \
             raw_score            = EXCLUDED.raw_score, \
             normalized_score     = EXCLUDED.normalized_score, \
             total_mentions       = EXCLUDED.total_mentions, \
             prompts_appeared_in  = EXCLUDED.prompts_appeared_in, \
             calculated_at        = NOW()",
    )
    .bind(project_id)
    .bind(&score.brand_name)
    .bind(score.is_main_brand)
    .bind(score.frequency_score)
    .bind(score.prominence_score)
    .bind(score.sentiment_score)
    .bind(score.model_coverage_score)
    .bind(score.raw_score)
    .bind(score.normalized_score)
    .bind(score.total_mentions)
    .bind(score.prompts_appeared_in)
    .execute(pool)
    .await?;

    Ok(())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_brand_scores(pool: &PgPool, project_id: i64) -> Result<Vec<BrandScore>, DbError> {
    let rows = sqlx::query_as::<_, BrandScoreRow>(
        "SELECT brand_name, is_main_brand, frequency_score, prominence_score, sentiment_score, \
                model_coverage_score, raw_score, normalized_score, total_mentions, \
                prompts_appeared_in \
         FROM brand_scores \
         WHERE project_id = $1 \
         ORDER BY id",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(BrandScore::from).collect())
}

// ---------------------------------------------------------------------------
// analysis_reports
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Serialization`] if a section cannot be encoded, or
/// [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_report(
    pool: &PgPool,
    project_id: i64,
    report: &AnalysisReport,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO analysis_reports \
             (project_id, competitor_comparison, prompt_wise, backend_wise, \
              negative_sentiment, sources, insights, action_plan) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (project_id) DO UPDATE SET \
             competitor_comparison = EXCLUDED.competitor_comparison, \
             prompt_wise           = EXCLUDED.prompt_wise, \
             backend_wise          = EXCLUDED.backend_wise, \
             negative_sentiment    = EXCLUDED.negative_sentiment, \
             sources               = EXCLUDED.sources, \
             insights              = EXCLUDED.insights, \
             action_plan           = EXCLUDED.action_plan, \
             updated_at            = NOW()",
    )
    .bind(project_id)
    .bind(serde_json::to_value(&report.competitor_comparison)?)
    .bind(serde_json::to_value(&report.prompt_wise)?)
    .bind(serde_json::to_value(&report.backend_wise)?)
    .bind(serde_json::to_value(&report.negative_sentiment)?)
    .bind(serde_json::to_value(&report.sources)?)
    .bind(serde_json::to_value(&report.insights)?)
    .bind(serde_json::to_value(&report.action_plan)?)
    .execute(pool)
    .await?;

    Ok(())
}

/// # Errors
///
/// Returns [`DbError::Serialization`] if a stored section no longer matches
/// the report types, or [`DbError::Sqlx`] if the query fails.
pub async fn get_report(pool: &PgPool, project_id: i64) -> Result<Option<AnalysisReport>, DbError> {
    let row = sqlx::query_as::<_, ReportRow>(
        "SELECT competitor_comparison, prompt_wise, backend_wise, negative_sentiment, \
                sources, insights, action_plan \
         FROM analysis_reports \
         WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await?;

    row.map(AnalysisReport::try_from).transpose()
}
