//! Four-factor visibility scoring.
//!
//! `raw = frequency × prominence × sentiment × coverage` and
//! `normalized = min(raw × 100, 100)`. A brand without mentions scores zero
//! on every factor but still gets a row.

use std::collections::{HashMap, HashSet};

use aivis_core::{BrandScore, LogLevel, UNCLASSIFIED_SENTIMENT_WEIGHT};
use aivis_db::{BackendSelection, MentionRecord, VisibilityStore};

use crate::audit::{record, MODULE_VISIBILITY};
use crate::error::EngineError;
use crate::types::{Brand, ScoreSummary};

/// Weight for a backend missing from the project's selection.
const DEFAULT_BACKEND_WEIGHT: f64 = 1.0;

/// Project-wide inputs shared by every brand's score.
#[derive(Debug, Clone, Default)]
pub struct ScoringContext {
    pub selected_prompts: HashSet<i64>,
    pub backend_weights: HashMap<String, f64>,
}

impl ScoringContext {
    #[must_use]
    pub fn new(selected_prompt_ids: impl IntoIterator<Item = i64>, backends: &[BackendSelection]) -> Self {
        Self {
            selected_prompts: selected_prompt_ids.into_iter().collect(),
            backend_weights: backends
                .iter()
                .map(|b| (b.backend_name.clone(), b.weight))
                .collect(),
        }
    }

    fn backend_weight(&self, backend_name: &str) -> f64 {
        self.backend_weights
            .get(backend_name)
            .copied()
            .unwrap_or(DEFAULT_BACKEND_WEIGHT)
    }

    /// Scores one brand against the corpus. Brand names compare
    /// case-insensitively.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score_brand(&self, brand: &Brand, corpus: &[MentionRecord]) -> BrandScore {
        let key = brand.name.to_lowercase();
        let mentions: Vec<&MentionRecord> = corpus
            .iter()
            .filter(|m| m.brand_name.to_lowercase() == key)
            .collect();

        if mentions.is_empty() {
            return BrandScore::zero(brand.name.clone(), brand.is_main_brand);
        }
        let count = mentions.len() as f64;

        let prompts: HashSet<i64> = mentions
            .iter()
            .map(|m| m.prompt_id)
            .filter(|id| self.selected_prompts.contains(id))
            .collect();
        let frequency = if self.selected_prompts.is_empty() {
            0.0
        } else {
            prompts.len() as f64 / self.selected_prompts.len() as f64
        };

        let prominence = mentions
            .iter()
            .map(|m| 1.0 / f64::from(m.position.max(1)))
            .sum::<f64>()
            / count;

        let weights: Vec<f64> = mentions
            .iter()
            .filter_map(|m| m.sentiment.map(aivis_core::SentimentLabel::weight))
            .collect();
        let sentiment = if weights.is_empty() {
            UNCLASSIFIED_SENTIMENT_WEIGHT
        } else {
            weights.iter().sum::<f64>() / weights.len() as f64
        };

        let coverage = mentions
            .iter()
            .map(|m| self.backend_weight(&m.backend_name))
            .sum::<f64>()
            / count;

        let raw = frequency * prominence * sentiment * coverage;
        BrandScore {
            brand_name: brand.name.clone(),
            is_main_brand: brand.is_main_brand,
            frequency_score: frequency,
            prominence_score: prominence,
            sentiment_score: sentiment,
            model_coverage_score: coverage,
            raw_score: raw,
            normalized_score: normalize(raw),
            total_mentions: i64::try_from(mentions.len()).unwrap_or(i64::MAX),
            prompts_appeared_in: i64::try_from(prompts.len()).unwrap_or(i64::MAX),
        }
    }
}

/// `min(raw × 100, 100)`.
#[must_use]
pub fn normalize(raw: f64) -> f64 {
    (raw * 100.0).min(100.0)
}

/// Scores and upserts every brand of the project from one corpus snapshot.
///
/// # Errors
///
/// Returns [`EngineError::Store`] if the scoring inputs cannot be loaded.
/// A failed write for one brand is logged and the rest are still scored.
pub async fn score_stage<S>(
    store: &S,
    project_id: i64,
    brands: &[Brand],
) -> Result<ScoreSummary, EngineError>
where
    S: VisibilityStore + ?Sized,
{
    let prompts = store.list_selected_prompts(project_id).await?;
    let backends = store.list_selected_backends(project_id).await?;
    let corpus = store.load_corpus(project_id).await?;
    let context = ScoringContext::new(prompts.iter().map(|p| p.id), &backends);

    if store.list_successful_responses(project_id).await?.is_empty() {
        tracing::warn!(project_id, "no successful responses; every brand scores zero");
    }

    let mut summary = ScoreSummary::default();
    for brand in brands {
        let score = context.score_brand(brand, &corpus);
        match store.upsert_brand_score(project_id, &score).await {
            Ok(()) => summary.brands_scored += 1,
            Err(e) => {
                summary.brands_failed += 1;
                tracing::error!(project_id, brand = %brand.name, error = %e, "failed to store brand score");
                record(
                    store,
                    project_id,
                    MODULE_VISIBILITY,
                    LogLevel::Error,
                    &format!("Error calculating score for brand {}: {e}", brand.name),
                )
                .await;
            }
        }
    }

    tracing::info!(
        project_id,
        scored = summary.brands_scored,
        failed = summary.brands_failed,
        "visibility scoring finished"
    );
    Ok(summary)
}
