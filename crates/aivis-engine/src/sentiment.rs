//! Sentiment classification of mentions through the reasoning backend.
//!
//! Classification never fails: every mention ends up with a stored score,
//! falling back to a neutral label when the call or its reply is unusable.

use aivis_core::{LogLevel, SentimentLabel};
use aivis_db::{NewSentiment, UnclassifiedMention, VisibilityStore};
use aivis_llm::{invoke_with_retry, TextGenerator};

use crate::audit::{record, MODULE_VISIBILITY};
use crate::error::EngineError;
use crate::reply::{parse_object, string_field};
use crate::types::{ClassifySummary, EngineConfig};

/// Characters of the full response included in the classification request.
const RESPONSE_EXCERPT_CHARS: usize = 500;

pub const PARSE_FAILURE_REASONING: &str = "Failed to parse sentiment";
const PARSE_FAILURE_CONFIDENCE: f64 = 0.5;
const CALL_FAILURE_CONFIDENCE: f64 = 0.3;

#[must_use]
pub fn build_sentiment_prompt(brand: &str, context: &str, response_text: &str) -> String {
    let excerpt: String = response_text.chars().take(RESPONSE_EXCERPT_CHARS).collect();
    format!(
        r#"Analyze the sentiment of how this brand is mentioned:

Brand: {brand}
Context: {context}
Full response: {excerpt}

Determine the sentiment: very_positive, positive, neutral, or negative

Consider:
- Is the brand recommended?
- Are there positive attributes mentioned?
- Any criticisms or limitations?
- Overall tone

Return ONLY a JSON object:
{{
    "sentiment": "positive",
    "reasoning": "Brief explanation"
}}
"#
    )
}

/// Reads `{"sentiment", "reasoning"}`. An unknown label counts as unparsable.
#[must_use]
pub fn parse_sentiment_reply(reply: &str) -> Option<(SentimentLabel, String)> {
    let object = parse_object(reply)?;
    let label = string_field(&object, "sentiment")?.parse().ok()?;
    let reasoning = string_field(&object, "reasoning").unwrap_or_default();
    Some((label, reasoning))
}

/// Maps a call result onto the score that gets stored.
#[must_use]
pub fn resolve_sentiment<E: std::fmt::Display>(
    mention_id: i64,
    outcome: Result<String, E>,
) -> NewSentiment {
    let (label, confidence, reasoning) = match outcome {
        Ok(reply) => match parse_sentiment_reply(&reply) {
            Some((label, reasoning)) => (label, 1.0, reasoning),
            None => (
                SentimentLabel::Neutral,
                PARSE_FAILURE_CONFIDENCE,
                PARSE_FAILURE_REASONING.to_string(),
            ),
        },
        Err(e) => (
            SentimentLabel::Neutral,
            CALL_FAILURE_CONFIDENCE,
            format!("Error: {e}"),
        ),
    };
    NewSentiment {
        mention_id,
        label,
        confidence,
        reasoning,
    }
}

/// Classifies one mention.
pub async fn classify<G>(
    generator: &G,
    config: &EngineConfig,
    mention: &UnclassifiedMention,
) -> NewSentiment
where
    G: TextGenerator + ?Sized,
{
    let prompt = build_sentiment_prompt(
        &mention.brand_name,
        &mention.context,
        &mention.response_text,
    );
    let outcome = invoke_with_retry(
        generator,
        config.retry,
        config.reasoning_backend,
        &prompt,
        config.reasoning_temperature,
    )
    .await;
    if let Err(e) = &outcome {
        tracing::warn!(mention_id = mention.mention_id, error = %e, "sentiment call failed");
    }
    resolve_sentiment(mention.mention_id, outcome)
}

/// Classifies every mention of the project that has no score yet.
///
/// # Errors
///
/// Returns [`EngineError::Store`] if the pending mentions cannot be listed.
/// A failed write for one mention is logged and skipped.
pub async fn classify_stage<S, G>(
    store: &S,
    generator: &G,
    config: &EngineConfig,
    project_id: i64,
) -> Result<ClassifySummary, EngineError>
where
    S: VisibilityStore + ?Sized,
    G: TextGenerator + ?Sized,
{
    let pending = store.list_unclassified_mentions(project_id).await?;
    let mut summary = ClassifySummary::default();

    for mention in &pending {
        let sentiment = classify(generator, config, mention).await;
        let fallback = sentiment.confidence < 1.0;
        match store.insert_sentiment_if_absent(&sentiment).await {
            Ok(_) => {
                summary.classified += 1;
                if fallback {
                    summary.fallbacks += 1;
                }
            }
            Err(e) => {
                tracing::warn!(project_id, mention_id = mention.mention_id, error = %e, "failed to store sentiment");
                record(
                    store,
                    project_id,
                    MODULE_VISIBILITY,
                    LogLevel::Warning,
                    &format!(
                        "Failed to store sentiment for {} (mention {}): {e}",
                        mention.brand_name, mention.mention_id
                    ),
                )
                .await;
            }
        }
    }

    tracing::info!(
        project_id,
        classified = summary.classified,
        fallbacks = summary.fallbacks,
        "sentiment classification finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_brand_context_and_excerpt() {
        let long = "z".repeat(800);
        let prompt = build_sentiment_prompt("Acme", "Acme is great", &long);
        assert!(prompt.contains("Brand: Acme"));
        assert!(prompt.contains("Context: Acme is great"));
        assert!(prompt.contains(&format!("Full response: {}\n", "z".repeat(500))));
        assert!(!prompt.contains(&"z".repeat(501)));
    }

    #[test]
    fn valid_reply_keeps_label_with_full_confidence() {
        let score = resolve_sentiment::<String>(
            7,
            Ok(r#"{"sentiment": "very_positive", "reasoning": "Top pick"}"#.to_string()),
        );
        assert_eq!(score.mention_id, 7);
        assert_eq!(score.label, SentimentLabel::VeryPositive);
        assert!((score.confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(score.reasoning, "Top pick");
    }

    #[test]
    fn fenced_reply_without_reasoning_is_accepted() {
        let score = resolve_sentiment::<String>(
            1,
            Ok("```json\n{\"sentiment\": \"negative\"}\n```".to_string()),
        );
        assert_eq!(score.label, SentimentLabel::Negative);
        assert_eq!(score.reasoning, "");
    }

    #[test]
    fn unparsable_reply_falls_back_to_neutral() {
        let score = resolve_sentiment::<String>(1, Ok("I think it's positive".to_string()));
        assert_eq!(score.label, SentimentLabel::Neutral);
        assert!((score.confidence - 0.5).abs() < f64::EPSILON);
        assert_eq!(score.reasoning, PARSE_FAILURE_REASONING);
    }

    #[test]
    fn unknown_label_is_a_parse_failure() {
        let score =
            resolve_sentiment::<String>(1, Ok(r#"{"sentiment": "ecstatic"}"#.to_string()));
        assert_eq!(score.label, SentimentLabel::Neutral);
        assert!((score.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn single_line_fenced_reply_is_parsed() {
        let reply = r#"```json {"sentiment": "negative", "reasoning": "buggy"} ```"#;
        let score = resolve_sentiment::<String>(7, Ok(reply.to_string()));
        assert_eq!(score.label, SentimentLabel::Negative);
        assert!((score.confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(score.reasoning, "buggy");
    }

    #[test]
    fn call_failure_records_error_text() {
        let score = resolve_sentiment(1, Err("gemini rate limit exceeded: slow down"));
        assert_eq!(score.label, SentimentLabel::Neutral);
        assert!((score.confidence - 0.3).abs() < f64::EPSILON);
        assert_eq!(score.reasoning, "Error: gemini rate limit exceeded: slow down");
    }
}
