//! Markdown rendering of a stored analysis report.

use std::fmt::Write as _;

use aivis_core::{AnalysisReport, NegativeSentimentDigest};
use aivis_db::{ProjectRecord, VisibilityStore};
use chrono::{DateTime, Utc};

/// Negative instances shown before the list is cut off.
const MAX_NEGATIVE_SHOWN: usize = 10;

/// Print the stored report for a project as markdown or JSON.
///
/// # Errors
///
/// Returns an error if the project does not exist, has no report yet, or
/// the report cannot be serialized.
pub(crate) async fn run_report<S>(store: &S, project_id: i64, json: bool) -> anyhow::Result<()>
where
    S: VisibilityStore + ?Sized,
{
    let project = store.get_project(project_id).await?;
    let report = store.get_report(project_id).await?.ok_or_else(|| {
        anyhow::anyhow!("no report for project {project_id}; run `run --project {project_id}` first")
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&project, &report, Utc::now()));
    }
    Ok(())
}

fn fmt_position(position: Option<f64>) -> String {
    position.map_or_else(|| "\u{2014}".to_string(), |p| format!("{p:.2}"))
}

fn push_list(out: &mut String, title: &str, items: &[String]) {
    let _ = writeln!(out, "### {title}");
    out.push('\n');
    if items.is_empty() {
        out.push_str("_None_\n");
    }
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
    out.push('\n');
}

fn push_negative(out: &mut String, digest: &NegativeSentimentDigest) {
    let _ = writeln!(out, "## Negative Sentiment\n");
    let _ = writeln!(out, "**Total negative mentions**: {}\n", digest.total_negative);
    for instance in digest.instances.iter().take(MAX_NEGATIVE_SHOWN) {
        let _ = writeln!(
            out,
            "- **{}** on {} for \"{}\": {}",
            instance.brand, instance.backend, instance.prompt, instance.reasoning
        );
        let _ = writeln!(out, "  > {}", instance.context.replace('\n', " "));
    }
    if digest.instances.len() > MAX_NEGATIVE_SHOWN {
        let _ = writeln!(
            out,
            "\n_{} more not shown; use `--json` for the full list._",
            digest.instances.len() - MAX_NEGATIVE_SHOWN
        );
    }
    out.push('\n');
}

/// Renders the full report as a markdown document.
pub(crate) fn render_report(
    project: &ProjectRecord,
    report: &AnalysisReport,
    generated: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    let comparison = &report.competitor_comparison;

    let _ = writeln!(out, "# AI Visibility Report: {}\n", project.company_name);
    let _ = writeln!(out, "**Project**: {} ({})", project.name, project.id);
    let _ = writeln!(
        out,
        "**Generated**: {}\n",
        generated.format("%Y-%m-%d %H:%M UTC")
    );

    out.push_str("## Leaderboard\n\n");
    out.push_str("| # | Brand | Score | Frequency % | Prominence | Sentiment | Mentions | Prompts |\n");
    out.push_str("|---|-------|-------|-------------|------------|-----------|----------|---------|\n");
    for (rank, entry) in comparison.leaderboard.iter().enumerate() {
        let brand = if entry.is_main_brand {
            format!("**{}**", entry.brand)
        } else {
            entry.brand.clone()
        };
        let _ = writeln!(
            out,
            "| {} | {} | {:.2} | {:.1} | {:.3} | {:.3} | {} | {} |",
            rank + 1,
            brand,
            entry.visibility_score,
            entry.frequency,
            entry.prominence,
            entry.sentiment,
            entry.mentions,
            entry.prompts_appeared
        );
    }
    out.push('\n');

    match &comparison.gap_analysis {
        Some(gap) => {
            let _ = writeln!(out, "## Gap to {}\n", gap.compared_to);
            let _ = writeln!(out, "- Score gap: {:.2}", gap.score_gap);
            let _ = writeln!(out, "- Frequency gap: {:.1}", gap.frequency_gap);
            let _ = writeln!(out, "- Prominence gap: {:.3}\n", gap.prominence_gap);
        }
        None => out.push_str("## Gap Analysis\n\nNo competitor scored.\n\n"),
    }

    out.push_str("## Prompt Winners\n\n");
    out.push_str("| Prompt | Winner | Winner Avg Pos | Main Brand Pos |\n");
    out.push_str("|--------|--------|----------------|----------------|\n");
    for winner in &report.prompt_wise {
        let _ = writeln!(
            out,
            "| {} | {} | {:.2} | {} |",
            winner.prompt.replace('|', "\\|"),
            winner.winner,
            winner.winner_avg_position,
            fmt_position(winner.main_brand_position)
        );
    }
    out.push('\n');

    out.push_str("## Backend Favorites\n\n");
    out.push_str("| Backend | Top Brand | Top Avg Pos | Main Brand Pos | Main Brand Mentions |\n");
    out.push_str("|---------|-----------|-------------|----------------|---------------------|\n");
    for favorite in &report.backend_wise {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            favorite.backend,
            favorite.top_brand.as_deref().unwrap_or("\u{2014}"),
            fmt_position(favorite.top_brand_avg_position),
            fmt_position(favorite.main_brand_avg_position),
            favorite.main_brand_mentions
        );
    }
    out.push('\n');

    push_negative(&mut out, &report.negative_sentiment);

    out.push_str("## Sources\n\n");
    if report.sources.is_empty() {
        out.push_str("_No URLs cited._\n");
    }
    for source in &report.sources {
        let _ = writeln!(out, "- <{source}>");
    }
    out.push('\n');

    let insights = &report.insights;
    out.push_str("## Insights\n\n");
    let _ = writeln!(out, "### Why competitors win\n\n{}\n", insights.why_competitors_win);
    let _ = writeln!(out, "### Content gaps\n\n{}\n", insights.content_gaps);
    let _ = writeln!(out, "### Messaging gaps\n\n{}\n", insights.messaging_gaps);
    let _ = writeln!(
        out,
        "### Positioning weaknesses\n\n{}\n",
        insights.positioning_weaknesses
    );

    out.push_str("## Action Plan\n\n");
    push_list(&mut out, "Content ideas", &report.action_plan.content_ideas);
    push_list(&mut out, "SEO and PR", &report.action_plan.seo_pr);
    push_list(&mut out, "Messaging", &report.action_plan.messaging);

    out
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
