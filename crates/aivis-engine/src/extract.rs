//! Brand mention extraction.
//!
//! Each brand is matched case-insensitively on word boundaries. Only the
//! first occurrence of a brand counts; positions are ranks by first
//! occurrence, so they always form the dense sequence `1..=N`.

use std::collections::HashSet;

use aivis_core::LogLevel;
use aivis_db::{NewMention, ResponseRecord, VisibilityStore};
use regex::Regex;

use crate::audit::{record, MODULE_VISIBILITY};
use crate::error::EngineError;
use crate::types::{Brand, ExtractSummary};

/// Characters of surrounding text kept on each side of a match.
pub const CONTEXT_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMention {
    /// The configured brand string, not the matched text.
    pub brand: String,
    /// Original-case text around the match, trimmed.
    pub context: String,
    /// 1-based rank by first occurrence.
    pub position: usize,
}

fn brand_pattern(brand: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(brand)))
}

/// Finds the first occurrence of every brand in `text`.
///
/// Offsets and the context window are measured in characters.
///
/// # Errors
///
/// Returns [`regex::Error`] if a brand pattern cannot be compiled.
pub fn extract_mentions<S: AsRef<str>>(
    text: &str,
    brands: &[S],
) -> Result<Vec<ExtractedMention>, regex::Error> {
    // Byte offset of every char boundary, including the end of the text.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_index = |byte: usize| boundaries.partition_point(|&b| b < byte);
    let total_chars = boundaries.len() - 1;

    let mut hits: Vec<(usize, usize, &str)> = Vec::new();
    for brand in brands {
        let brand = brand.as_ref().trim();
        if brand.is_empty() {
            continue;
        }
        let pattern = brand_pattern(brand)?;
        for m in pattern.find_iter(text) {
            hits.push((char_index(m.start()), char_index(m.end()), brand));
        }
    }
    hits.sort_by_key(|&(start, _, _)| start);

    let mut seen = HashSet::new();
    let mut mentions = Vec::new();
    for (start, end, brand) in hits {
        if !seen.insert(brand.to_lowercase()) {
            continue;
        }
        let from = start.saturating_sub(CONTEXT_CHARS);
        let to = (end + CONTEXT_CHARS).min(total_chars);
        mentions.push(ExtractedMention {
            brand: brand.to_string(),
            context: text[boundaries[from]..boundaries[to]].trim().to_string(),
            position: mentions.len() + 1,
        });
    }
    Ok(mentions)
}

/// Extracts and persists the mentions of one response. Returns the number
/// of new rows; existing `(response, brand)` rows are left untouched.
async fn extract_response<S>(
    store: &S,
    response: &ResponseRecord,
    brands: &[Brand],
) -> Result<usize, EngineError>
where
    S: VisibilityStore + ?Sized,
{
    let text = response.raw_response.as_deref().unwrap_or_default();
    let names: Vec<&str> = brands.iter().map(|b| b.name.as_str()).collect();
    let extracted = extract_mentions(text, &names)?;

    let mut inserted = 0;
    for mention in extracted {
        let key = mention.brand.to_lowercase();
        let brand = brands
            .iter()
            .find(|b| b.name.trim().to_lowercase() == key);
        let new = NewMention {
            response_id: response.id,
            brand_name: mention.brand,
            position: i32::try_from(mention.position).unwrap_or(i32::MAX),
            context: mention.context,
            is_main_brand: brand.is_some_and(|b| b.is_main_brand),
            competitor_id: brand.and_then(|b| b.competitor_id),
        };
        if store.insert_mention_if_absent(&new).await? {
            inserted += 1;
        }
    }
    Ok(inserted)
}

/// Runs extraction over every successful response of the project.
///
/// A failing response is logged and skipped.
///
/// # Errors
///
/// Returns [`EngineError::Store`] if the responses cannot be listed.
pub async fn extract_stage<S>(
    store: &S,
    project_id: i64,
    brands: &[Brand],
) -> Result<ExtractSummary, EngineError>
where
    S: VisibilityStore + ?Sized,
{
    let responses = store.list_successful_responses(project_id).await?;
    let mut summary = ExtractSummary::default();

    for response in &responses {
        match extract_response(store, response, brands).await {
            Ok(inserted) => {
                summary.responses_scanned += 1;
                summary.mentions_inserted += inserted;
            }
            Err(e) => {
                summary.responses_failed += 1;
                tracing::warn!(project_id, response_id = response.id, error = %e, "mention extraction failed");
                record(
                    store,
                    project_id,
                    MODULE_VISIBILITY,
                    LogLevel::Warning,
                    &format!("Failed to extract mentions from response {}: {e}", response.id),
                )
                .await;
            }
        }
    }

    tracing::info!(
        project_id,
        responses = summary.responses_scanned,
        mentions = summary.mentions_inserted,
        "mention extraction finished"
    );
    Ok(summary)
}
