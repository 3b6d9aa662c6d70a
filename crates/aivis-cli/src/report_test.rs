use super::*;

use aivis_core::{
    ActionPlan, BackendFavorite, CompetitorComparison, GapAnalysis, Insights, LeaderboardEntry,
    NegativeInstance, ProjectStatus, PromptWinner,
};
use chrono::TimeZone;

fn project() -> ProjectRecord {
    ProjectRecord {
        id: 7,
        name: "Acme launch".to_string(),
        company_name: "Acme".to_string(),
        description: None,
        area_of_work: Some("project management".to_string()),
        status: ProjectStatus::Completed,
        is_competitor_view: false,
        competitor_brand_id: None,
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn entry(brand: &str, is_main: bool, score: f64) -> LeaderboardEntry {
    LeaderboardEntry {
        brand: brand.to_string(),
        is_main_brand: is_main,
        visibility_score: score,
        frequency: 50.0,
        prominence: 0.75,
        sentiment: 1.0,
        mentions: 2,
        prompts_appeared: 1,
    }
}

fn report() -> AnalysisReport {
    let main = entry("Acme", true, 33.75);
    AnalysisReport {
        competitor_comparison: CompetitorComparison {
            leaderboard: vec![entry("Asana", false, 50.0), main.clone()],
            main_brand: Some(main),
            gap_analysis: Some(GapAnalysis {
                compared_to: "Asana".to_string(),
                score_gap: 16.25,
                frequency_gap: 0.0,
                prominence_gap: 0.25,
            }),
        },
        prompt_wise: vec![PromptWinner {
            prompt: "best tool | teams".to_string(),
            winner: "Asana".to_string(),
            winner_avg_position: 0.0,
            main_brand_present: false,
            main_brand_position: None,
            brands_mentioned: vec!["Asana".to_string()],
        }],
        backend_wise: vec![BackendFavorite {
            backend: "ChatGPT".to_string(),
            top_brand: Some("Asana".to_string()),
            top_brand_avg_position: Some(0.0),
            main_brand_avg_position: Some(12.5),
            main_brand_mentions: 1,
        }],
        negative_sentiment: NegativeSentimentDigest {
            total_negative: 1,
            instances: vec![NegativeInstance {
                brand: "Acme".to_string(),
                prompt: "best tool | teams".to_string(),
                backend: "Gemini".to_string(),
                context: "Acme is\nclunky".to_string(),
                reasoning: "called clunky".to_string(),
            }],
        },
        sources: vec!["https://asana.example/guide".to_string()],
        insights: Insights::placeholder(),
        action_plan: ActionPlan {
            content_ideas: vec!["Comparison guide".to_string()],
            seo_pr: vec![],
            messaging: vec!["Lead with speed".to_string()],
        },
    }
}

#[test]
fn renders_leaderboard_with_main_brand_in_bold() {
    let out = render_report(&project(), &report(), Utc.with_ymd_and_hms(2026, 10, 1, 9, 30, 0).unwrap());

    assert!(out.starts_with("# AI Visibility Report: Acme\n"));
    assert!(out.contains("**Generated**: 2026-10-01 09:30 UTC"));
    assert!(out.contains("| 1 | Asana | 50.00 | 50.0 | 0.750 | 1.000 | 2 | 1 |"));
    assert!(out.contains("| 2 | **Acme** | 33.75 |"));
}

#[test]
fn renders_gap_and_missing_positions() {
    let out = render_report(&project(), &report(), Utc::now());

    assert!(out.contains("## Gap to Asana"));
    assert!(out.contains("- Score gap: 16.25"));
    assert!(out.contains("| best tool \\| teams | Asana | 0.00 | \u{2014} |"));
    assert!(out.contains("| ChatGPT | Asana | 0.00 | 12.50 | 1 |"));
}

#[test]
fn renders_negative_context_on_one_line() {
    let out = render_report(&project(), &report(), Utc::now());

    assert!(out.contains("**Total negative mentions**: 1"));
    assert!(out.contains("  > Acme is clunky"));
}

#[test]
fn empty_lists_render_placeholders() {
    let mut report = report();
    report.sources.clear();
    report.competitor_comparison.gap_analysis = None;

    let out = render_report(&project(), &report, Utc::now());

    assert!(out.contains("_No URLs cited._"));
    assert!(out.contains("No competitor scored."));
    assert!(out.contains("### SEO and PR\n\n_None_\n"));
    assert!(out.contains("- Lead with speed"));
}

#[test]
fn long_negative_digest_is_truncated() {
    let mut report = report();
    let instance = report.negative_sentiment.instances[0].clone();
    report.negative_sentiment.instances = vec![instance; 12];
    report.negative_sentiment.total_negative = 12;

    let out = render_report(&project(), &report, Utc::now());

    assert_eq!(out.matches("  > Acme is clunky").count(), MAX_NEGATIVE_SHOWN);
    assert!(out.contains("_2 more not shown"));
}
