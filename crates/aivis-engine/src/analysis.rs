//! Report views derived from the brand scores and one mention corpus
//! snapshot: leaderboard with gaps, per-prompt winners, per-backend
//! favorites, the negative-sentiment digest and cited sources.
//!
//! Every view is deterministic. Ties on mean position go to the brand whose
//! name sorts first and sources are sorted lexicographically.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

use aivis_core::{
    AnalysisReport, BackendFavorite, BrandScore, CompetitorComparison, GapAnalysis,
    LeaderboardEntry, NegativeInstance, NegativeSentimentDigest, PromptWinner, SentimentLabel,
};
use aivis_db::{BackendSelection, MentionRecord, PromptRecord, ResponseRecord};
use regex::Regex;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).expect("valid URL regex")
});

/// Everything the analysis views read, captured once per run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSnapshot {
    pub main_brand: String,
    pub scores: Vec<BrandScore>,
    pub prompts: Vec<PromptRecord>,
    pub backends: Vec<BackendSelection>,
    pub corpus: Vec<MentionRecord>,
    pub responses: Vec<ResponseRecord>,
}

/// Rounds half away from zero to `places` decimals.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[allow(clippy::cast_precision_loss)]
fn mean_position(positions: &[i32]) -> f64 {
    positions.iter().map(|&p| f64::from(p)).sum::<f64>() / positions.len() as f64
}

/// Brand with the lowest mean position; ties go to the first name in order.
fn lowest_mean<'a>(groups: &'a BTreeMap<String, Vec<i32>>) -> Option<(&'a str, f64)> {
    let mut best: Option<(&str, f64)> = None;
    for (brand, positions) in groups {
        let mean = mean_position(positions);
        if best.is_none_or(|(_, current)| mean < current) {
            best = Some((brand.as_str(), mean));
        }
    }
    best
}

fn leaderboard_entry(score: &BrandScore) -> LeaderboardEntry {
    LeaderboardEntry {
        brand: score.brand_name.clone(),
        is_main_brand: score.is_main_brand,
        visibility_score: round_to(score.normalized_score, 2),
        frequency: round_to(score.frequency_score * 100.0, 1),
        prominence: round_to(score.prominence_score, 3),
        sentiment: round_to(score.sentiment_score, 3),
        mentions: score.total_mentions,
        prompts_appeared: score.prompts_appeared_in,
    }
}

/// Leaderboard sorted by normalized score (stable for equal scores) and the
/// gap from the main brand to the leading competitor.
#[must_use]
pub fn competitor_comparison(scores: &[BrandScore]) -> CompetitorComparison {
    let mut sorted: Vec<&BrandScore> = scores.iter().collect();
    sorted.sort_by(|a, b| b.normalized_score.total_cmp(&a.normalized_score));
    let leaderboard: Vec<LeaderboardEntry> = sorted.into_iter().map(leaderboard_entry).collect();

    let main_brand = leaderboard.iter().find(|e| e.is_main_brand).cloned();
    let leader = match leaderboard.first() {
        Some(top) if !top.is_main_brand => Some(top),
        Some(_) => leaderboard.get(1),
        None => None,
    };
    let gap_analysis = match (&main_brand, leader) {
        (Some(main), Some(leader)) => Some(GapAnalysis {
            compared_to: leader.brand.clone(),
            score_gap: round_to(leader.visibility_score - main.visibility_score, 2),
            frequency_gap: round_to(leader.frequency - main.frequency, 1),
            prominence_gap: round_to(leader.prominence - main.prominence, 3),
        }),
        _ => None,
    };

    CompetitorComparison {
        leaderboard,
        main_brand,
        gap_analysis,
    }
}

/// One row per selected prompt that has mentions, in prompt order.
#[must_use]
pub fn prompt_wise(prompts: &[PromptRecord], corpus: &[MentionRecord]) -> Vec<PromptWinner> {
    let mut rows = Vec::new();
    for prompt in prompts {
        let mut groups: BTreeMap<String, Vec<i32>> = BTreeMap::new();
        let mut main_positions = Vec::new();
        for mention in corpus.iter().filter(|m| m.prompt_id == prompt.id) {
            groups
                .entry(mention.brand_name.clone())
                .or_default()
                .push(mention.position);
            if mention.is_main_brand {
                main_positions.push(mention.position);
            }
        }

        let Some((winner, winner_mean)) = lowest_mean(&groups) else {
            continue;
        };
        rows.push(PromptWinner {
            prompt: prompt.text.clone(),
            winner: winner.to_string(),
            winner_avg_position: round_to(winner_mean, 2),
            main_brand_present: !main_positions.is_empty(),
            main_brand_position: (!main_positions.is_empty())
                .then(|| round_to(mean_position(&main_positions), 2)),
            brands_mentioned: groups.keys().cloned().collect(),
        });
    }
    rows
}

/// One row per selected backend, labelled with its display name.
#[must_use]
pub fn backend_wise(backends: &[BackendSelection], corpus: &[MentionRecord]) -> Vec<BackendFavorite> {
    backends
        .iter()
        .map(|backend| {
            let mut groups: BTreeMap<String, Vec<i32>> = BTreeMap::new();
            let mut main_positions = Vec::new();
            for mention in corpus
                .iter()
                .filter(|m| m.backend_name == backend.backend_name)
            {
                groups
                    .entry(mention.brand_name.clone())
                    .or_default()
                    .push(mention.position);
                if mention.is_main_brand {
                    main_positions.push(mention.position);
                }
            }
            let favorite = lowest_mean(&groups);
            BackendFavorite {
                backend: backend.display_name.clone(),
                top_brand: favorite.map(|(brand, _)| brand.to_string()),
                top_brand_avg_position: favorite.map(|(_, mean)| round_to(mean, 2)),
                main_brand_avg_position: (!main_positions.is_empty())
                    .then(|| round_to(mean_position(&main_positions), 2)),
                main_brand_mentions: i64::try_from(main_positions.len()).unwrap_or(i64::MAX),
            }
        })
        .collect()
}

/// Every negatively classified mention, in mention order.
#[must_use]
pub fn negative_digest(
    backends: &[BackendSelection],
    corpus: &[MentionRecord],
) -> NegativeSentimentDigest {
    let display: HashMap<&str, &str> = backends
        .iter()
        .map(|b| (b.backend_name.as_str(), b.display_name.as_str()))
        .collect();

    let instances: Vec<NegativeInstance> = corpus
        .iter()
        .filter(|m| m.sentiment == Some(SentimentLabel::Negative))
        .map(|m| NegativeInstance {
            brand: m.brand_name.clone(),
            prompt: m.prompt_text.clone(),
            backend: display
                .get(m.backend_name.as_str())
                .map_or_else(|| backend_label(&m.backend_name), |d| (*d).to_string()),
            context: m.context.clone(),
            reasoning: m.sentiment_reasoning.clone().unwrap_or_default(),
        })
        .collect();

    NegativeSentimentDigest {
        total_negative: instances.len(),
        instances,
    }
}

/// Display name for a backend that is no longer selected.
fn backend_label(name: &str) -> String {
    name.parse::<aivis_core::Backend>()
        .map_or_else(|_| name.to_string(), |b| b.display_name().to_string())
}

/// Unique URLs cited by successful responses, sorted.
#[must_use]
pub fn extract_sources(responses: &[ResponseRecord]) -> Vec<String> {
    let mut sources = BTreeSet::new();
    for response in responses {
        if response.status != aivis_core::ResponseStatus::Success {
            continue;
        }
        let Some(text) = response.raw_response.as_deref() else {
            continue;
        };
        sources.extend(URL_RE.find_iter(text).map(|m| m.as_str().to_string()));
    }
    sources.into_iter().collect()
}

/// Builds the report from one snapshot. Insights and the action plan are
/// left at their placeholders.
#[must_use]
pub fn analyze(snapshot: &AnalysisSnapshot) -> AnalysisReport {
    AnalysisReport {
        competitor_comparison: competitor_comparison(&snapshot.scores),
        prompt_wise: prompt_wise(&snapshot.prompts, &snapshot.corpus),
        backend_wise: backend_wise(&snapshot.backends, &snapshot.corpus),
        negative_sentiment: negative_digest(&snapshot.backends, &snapshot.corpus),
        sources: extract_sources(&snapshot.responses),
        insights: aivis_core::Insights::placeholder(),
        action_plan: aivis_core::ActionPlan::default(),
    }
}

#[cfg(test)]
#[path = "analysis_test.rs"]
mod tests;
