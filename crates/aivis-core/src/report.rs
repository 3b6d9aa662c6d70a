//! Scored brands and the analysis report derived from them.
//!
//! Every type here is a plain serde record: the store persists them as
//! JSONB sections and the HTTP surface returns them unchanged.

use serde::{Deserialize, Serialize};

/// Fallback text for any insight field the reasoning backend failed to produce.
pub const INSIGHT_PLACEHOLDER: &str = "Analysis pending";

/// Visibility score for one brand in one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandScore {
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

impl BrandScore {
    /// Score row for a brand that was never mentioned.
    #[must_use]
    pub fn zero(brand_name: impl Into<String>, is_main_brand: bool) -> Self {
        Self {
            brand_name: brand_name.into(),
            is_main_brand,
            frequency_score: 0.0,
            prominence_score: 0.0,
            sentiment_score: 0.0,
            model_coverage_score: 0.0,
            raw_score: 0.0,
            normalized_score: 0.0,
            total_mentions: 0,
            prompts_appeared_in: 0,
        }
    }
}

/// One leaderboard row, rounded for display.
///
/// `frequency` is a percentage (0–100, 1 dp); `visibility_score` has 2 dp;
/// `prominence` and `sentiment` have 3 dp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub brand: String,
    pub is_main_brand: bool,
    pub visibility_score: f64,
    pub frequency: f64,
    pub prominence: f64,
    pub sentiment: f64,
    pub mentions: i64,
    pub prompts_appeared: i64,
}

/// Leading competitor minus main brand, computed from rounded leaderboard rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub compared_to: String,
    pub score_gap: f64,
    pub frequency_gap: f64,
    pub prominence_gap: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompetitorComparison {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub main_brand: Option<LeaderboardEntry>,
    pub gap_analysis: Option<GapAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptWinner {
    pub prompt: String,
    pub winner: String,
    pub winner_avg_position: f64,
    pub main_brand_present: bool,
    pub main_brand_position: Option<f64>,
    pub brands_mentioned: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendFavorite {
    pub backend: String,
    pub top_brand: Option<String>,
    pub top_brand_avg_position: Option<f64>,
    pub main_brand_avg_position: Option<f64>,
    pub main_brand_mentions: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegativeInstance {
    pub brand: String,
    pub prompt: String,
    pub backend: String,
    pub context: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NegativeSentimentDigest {
    pub total_negative: usize,
    pub instances: Vec<NegativeInstance>,
}

/// The four strategic-insight paragraphs returned by the reasoning backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub why_competitors_win: String,
    pub content_gaps: String,
    pub messaging_gaps: String,
    pub positioning_weaknesses: String,
}

impl Insights {
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            why_competitors_win: INSIGHT_PLACEHOLDER.to_string(),
            content_gaps: INSIGHT_PLACEHOLDER.to_string(),
            messaging_gaps: INSIGHT_PLACEHOLDER.to_string(),
            positioning_weaknesses: INSIGHT_PLACEHOLDER.to_string(),
        }
    }
}

impl Default for Insights {
    fn default() -> Self {
        Self::placeholder()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionPlan {
    pub content_ideas: Vec<String>,
    pub seo_pr: Vec<String>,
    pub messaging: Vec<String>,
}

/// Final per-project report. Upserted once per pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub competitor_comparison: CompetitorComparison,
    pub prompt_wise: Vec<PromptWinner>,
    pub backend_wise: Vec<BackendFavorite>,
    pub negative_sentiment: NegativeSentimentDigest,
    pub sources: Vec<String>,
    pub insights: Insights,
    pub action_plan: ActionPlan,
}
