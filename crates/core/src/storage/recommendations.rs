use crate::domain::recommendation::RecommendationRecord;
use crate::recovery::ParseOutcome;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewBatch<'a> {
    /// `quiz` or `text`.
    pub source: &'a str,
    pub input: Value,
    pub provider: &'a str,
    pub outcome: &'a ParseOutcome,
    pub raw_text: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredBatch {
    pub batch_id: Uuid,
    pub source: String,
    pub provider: String,
    pub strategy: String,
    pub generated_at: DateTime<Utc>,
    pub recommendations: Vec<RecommendationRecord>,
}

pub async fn persist_batch(pool: &sqlx::PgPool, new: NewBatch<'_>) -> anyhow::Result<Uuid> {
    let batch_id = Uuid::new_v4();
    let generated_at = Utc::now();
    let raw_llm_response = new.raw_text.map(|raw| {
        serde_json::from_str::<Value>(raw).unwrap_or_else(|_| serde_json::json!({ "raw_text": raw }))
    });

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    sqlx::query(
        "INSERT INTO recommendation_batches (id, source, input, provider, strategy, generated_at, raw_llm_response) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(batch_id)
    .bind(new.source)
    .bind(&new.input)
    .bind(new.provider)
    .bind(new.outcome.strategy.as_str())
    .bind(generated_at)
    .bind(raw_llm_response)
    .execute(&mut *tx)
    .await
    .context("insert recommendation_batches failed")?;

    for (position, record) in new.outcome.batch.iter().enumerate() {
        insert_record(&mut tx, batch_id, position as i16, record).await?;
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(batch_id)
}

async fn insert_record(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    batch_id: Uuid,
    position: i16,
    record: &RecommendationRecord,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO career_recommendations (batch_id, position, title, match_score, sector, record) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(batch_id)
    .bind(position)
    .bind(&record.title)
    .bind(record.match_score)
    .bind(record.sector.as_str())
    .bind(Json(record))
    .execute(&mut **tx)
    .await
    .context("insert career_recommendations failed")?;

    Ok(())
}

pub async fn fetch_batch(pool: &sqlx::PgPool, batch_id: Uuid) -> anyhow::Result<Option<StoredBatch>> {
    let row = sqlx::query_as::<_, (String, String, String, DateTime<Utc>)>(
        "SELECT source, provider, strategy, generated_at \
         FROM recommendation_batches \
         WHERE id = $1",
    )
    .bind(batch_id)
    .fetch_optional(pool)
    .await
    .context("select recommendation_batches failed")?;

    let Some((source, provider, strategy, generated_at)) = row else {
        return Ok(None);
    };

    let records = sqlx::query_as::<_, (Json<RecommendationRecord>,)>(
        "SELECT record \
         FROM career_recommendations \
         WHERE batch_id = $1 \
         ORDER BY position ASC",
    )
    .bind(batch_id)
    .fetch_all(pool)
    .await
    .context("select career_recommendations failed")?;

    Ok(Some(StoredBatch {
        batch_id,
        source,
        provider,
        strategy,
        generated_at,
        recommendations: records.into_iter().map(|(Json(record),)| record).collect(),
    }))
}
