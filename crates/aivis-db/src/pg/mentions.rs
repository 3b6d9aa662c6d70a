//! Database operations for `mentions` and `sentiment_scores`.

use aivis_core::SentimentLabel;
use sqlx::PgPool;

use crate::types::{MentionRecord, NewMention, NewSentiment, UnclassifiedMention};
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UnclassifiedMentionRow {
    pub mention_id: i64,
    pub brand_name: String,
    pub context: String,
    pub response_text: Option<String>,
}

/// A mention joined to its response, prompt and sentiment score.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CorpusRow {
    pub mention_id: i64,
    pub response_id: i64,
    pub prompt_id: i64,
    pub prompt_text: String,
    pub backend_name: String,
    pub brand_name: String,
    pub position: i32,
    pub context: String,
    pub is_main_brand: bool,
    pub sentiment: Option<String>,
    pub reasoning: Option<String>,
}

impl TryFrom<CorpusRow> for MentionRecord {
    type Error = DbError;

    fn try_from(row: CorpusRow) -> Result<Self, Self::Error> {
        let sentiment = row
            .sentiment
            .as_deref()
            .map(str::parse::<SentimentLabel>)
            .transpose()?;
        Ok(Self {
            mention_id: row.mention_id,
            response_id: row.response_id,
            prompt_id: row.prompt_id,
            prompt_text: row.prompt_text,
            backend_name: row.backend_name,
            brand_name: row.brand_name,
            position: row.position,
            context: row.context,
            is_main_brand: row.is_main_brand,
            sentiment,
            sentiment_reasoning: row.reasoning,
        })
    }
}

// ---------------------------------------------------------------------------
// mentions
// ---------------------------------------------------------------------------

/// Inserts a mention unless `(response, lower(brand))` already exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_mention_if_absent(pool: &PgPool, mention: &NewMention) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO mentions \
             (response_id, brand_name, position, context, is_main_brand, competitor_id) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (response_id, lower(brand_name)) DO NOTHING",
    )
    .bind(mention.response_id)
    .bind(&mention.brand_name)
    .bind(mention.position)
    .bind(&mention.context)
    .bind(mention.is_main_brand)
    .bind(mention.competitor_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_unclassified_mentions(
    pool: &PgPool,
    project_id: i64,
) -> Result<Vec<UnclassifiedMention>, DbError> {
    let rows = sqlx::query_as::<_, UnclassifiedMentionRow>(
        "SELECT m.id AS mention_id, m.brand_name, m.context, r.raw_response AS response_text \
         FROM mentions m \
         JOIN responses r ON r.id = m.response_id \
         LEFT JOIN sentiment_scores s ON s.mention_id = m.id \
         WHERE r.project_id = $1 AND s.id IS NULL \
         ORDER BY m.id",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| UnclassifiedMention {
            mention_id: row.mention_id,
            brand_name: row.brand_name,
            context: row.context,
            response_text: row.response_text.unwrap_or_default(),
        })
        .collect())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn load_corpus(pool: &PgPool, project_id: i64) -> Result<Vec<MentionRecord>, DbError> {
    let rows = sqlx::query_as::<_, CorpusRow>(
        "SELECT m.id AS mention_id, m.response_id, r.prompt_id, p.text AS prompt_text, \
                r.backend_name, m.brand_name, m.position, m.context, m.is_main_brand, \
                s.sentiment, s.reasoning \
         FROM mentions m \
         JOIN responses r ON r.id = m.response_id \
         JOIN prompts p ON p.id = r.prompt_id \
         LEFT JOIN sentiment_scores s ON s.mention_id = m.id \
         WHERE r.project_id = $1 \
         ORDER BY m.id",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(MentionRecord::try_from).collect()
}

// ---------------------------------------------------------------------------
// sentiment_scores
// ---------------------------------------------------------------------------

/// Inserts a sentiment score unless the mention already has one.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_sentiment_if_absent(
    pool: &PgPool,
    sentiment: &NewSentiment,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO sentiment_scores (mention_id, sentiment, score, confidence, reasoning) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (mention_id) DO NOTHING",
    )
    .bind(sentiment.mention_id)
    .bind(sentiment.label.as_str())
    .bind(sentiment.label.weight())
    .bind(sentiment.confidence)
    .bind(&sentiment.reasoning)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
