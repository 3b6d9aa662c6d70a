//! Strategic insights and the action plan, both produced by the reasoning
//! backend from the finished analysis.
//!
//! Both calls degrade instead of failing: insights fall back to the
//! placeholder text and action-plan lists fall back to empty, key by key.

use aivis_core::{
    ActionPlan, BackendFavorite, CompetitorComparison, Insights, NegativeSentimentDigest,
    PromptWinner, INSIGHT_PLACEHOLDER,
};
use aivis_llm::{invoke_with_retry, TextGenerator};
use serde::Serialize;

use crate::reply::{parse_object, string_field, string_list_field};
use crate::types::EngineConfig;

/// Prompt-wise rows included in the insights request.
const TOP_PROMPTS: usize = 5;

fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

#[must_use]
pub fn build_insights_prompt(
    brand: &str,
    comparison: &CompetitorComparison,
    prompt_wise: &[PromptWinner],
    backend_wise: &[BackendFavorite],
    negative: &NegativeSentimentDigest,
) -> String {
    let top_prompts = &prompt_wise[..prompt_wise.len().min(TOP_PROMPTS)];
    let data = format!(
        "VISIBILITY ANALYSIS DATA:\n\n\
         Main Brand: {brand}\n\n\
         LEADERBOARD:\n{}\n\n\
         GAP ANALYSIS:\n{}\n\n\
         PROMPT-WISE WINNERS:\n{}\n\n\
         MODEL-WISE PERFORMANCE:\n{}\n\n\
         NEGATIVE SENTIMENT:\n{}\n",
        pretty(&comparison.leaderboard),
        pretty(&comparison.gap_analysis),
        pretty(top_prompts),
        pretty(backend_wise),
        pretty(negative),
    );

    format!(
        r#"You are a strategic brand consultant. Analyze this AI visibility data and provide insights:

{data}
Provide a comprehensive analysis addressing:

1. WHY COMPETITORS WIN
   - What makes top competitors more visible?
   - What patterns emerge from their mentions?
   - How do they position themselves?

2. CONTENT GAPS
   - What topics/angles are competitors covering that {brand} isn't?
   - What use cases are missing?

3. MESSAGING GAPS
   - How do competitors communicate their value?
   - What messaging resonates with AI models?

4. POSITIONING WEAKNESSES
   - Where does {brand} fall short?
   - What positioning adjustments are needed?

Return as JSON:
{{
    "why_competitors_win": "Detailed explanation...",
    "content_gaps": "Specific gaps...",
    "messaging_gaps": "Messaging issues...",
    "positioning_weaknesses": "Positioning problems..."
}}
"#
    )
}

#[must_use]
pub fn build_action_plan_prompt(brand: &str, insights: &Insights) -> String {
    let insights = pretty(insights);
    format!(
        r#"Based on these insights about {brand}'s AI visibility:

{insights}

Generate a concrete ACTION PLAN with:

1. CONTENT IDEAS (5-7 specific pieces)
   - Blog posts, guides, comparisons
   - Topics that will improve visibility

2. SEO/PR RECOMMENDATIONS (5-7 actions)
   - Link building strategies
   - PR opportunities
   - Authority building

3. MESSAGING IMPROVEMENTS (5-7 changes)
   - Value proposition refinements
   - Positioning adjustments
   - Key messages to emphasize

Be specific and actionable.

Return as JSON:
{{
    "content_ideas": ["Idea 1", "Idea 2", ...],
    "seo_pr": ["Action 1", "Action 2", ...],
    "messaging": ["Change 1", "Change 2", ...]
}}
"#
    )
}

/// Reads the four insight strings. A missing key, or an unusable reply,
/// yields the placeholder for that field.
#[must_use]
pub fn parse_insights(reply: Option<&str>) -> Insights {
    let object = reply.and_then(parse_object).unwrap_or_default();
    let field = |key: &str| string_field(&object, key).unwrap_or_else(|| INSIGHT_PLACEHOLDER.to_string());
    Insights {
        why_competitors_win: field("why_competitors_win"),
        content_gaps: field("content_gaps"),
        messaging_gaps: field("messaging_gaps"),
        positioning_weaknesses: field("positioning_weaknesses"),
    }
}

/// Reads the three action-plan lists, each empty when missing.
#[must_use]
pub fn parse_action_plan(reply: Option<&str>) -> ActionPlan {
    let object = reply.and_then(parse_object).unwrap_or_default();
    let list = |key: &str| string_list_field(&object, key).unwrap_or_default();
    ActionPlan {
        content_ideas: list("content_ideas"),
        seo_pr: list("seo_pr"),
        messaging: list("messaging"),
    }
}

async fn ask<G>(generator: &G, config: &EngineConfig, prompt: &str, what: &str) -> Option<String>
where
    G: TextGenerator + ?Sized,
{
    match invoke_with_retry(
        generator,
        config.retry,
        config.reasoning_backend,
        prompt,
        config.reasoning_temperature,
    )
    .await
    {
        Ok(reply) => Some(reply),
        Err(e) => {
            tracing::warn!(error = %e, "{what} call failed; using fallback");
            None
        }
    }
}

/// Requests insights, then an action plan built from them (placeholder
/// insights included).
pub async fn generate<G>(
    generator: &G,
    config: &EngineConfig,
    brand: &str,
    comparison: &CompetitorComparison,
    prompt_wise: &[PromptWinner],
    backend_wise: &[BackendFavorite],
    negative: &NegativeSentimentDigest,
) -> (Insights, ActionPlan)
where
    G: TextGenerator + ?Sized,
{
    let prompt = build_insights_prompt(brand, comparison, prompt_wise, backend_wise, negative);
    let reply = ask(generator, config, &prompt, "insights").await;
    let insights = parse_insights(reply.as_deref());
    if insights == Insights::placeholder() {
        tracing::warn!(brand, "insights unavailable; placeholder text stored");
    }

    let prompt = build_action_plan_prompt(brand, &insights);
    let reply = ask(generator, config, &prompt, "action plan").await;
    let plan = parse_action_plan(reply.as_deref());

    (insights, plan)
}
