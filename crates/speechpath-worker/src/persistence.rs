//! `sqlx`-backed storage adapters: report/curriculum persistence, the G2P
//! cache, the child lexicon store, and the drift baseline. Every store here
//! swallows its own errors except [`ReportStore`], whose failure must abort
//! the submission per the report+curriculum atomicity invariant.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use speechpath_g2p::G2PCache;
use speechpath_types::WeaknessTag;

use crate::curriculum::difficulty_for_score;
use crate::drift::DriftStore;
use crate::lexicon::{ChildLexiconRow, LexiconStore};

/// Idempotent DDL for the auxiliary tables the core owns. Run once during
/// worker-context construction, never per message.
pub async fn run_ddl(pool: &PgPool) -> sqlx::Result<()> {
    sqlx::query(
        r#"create table if not exists child_g2p_cache(
            child_id text not null,
            word text not null,
            phonemes jsonb not null,
            primary key(child_id, word)
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"create table if not exists worker_drift_baseline(
            name text primary key,
            hist jsonb not null
        )"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub struct ReportStore {
    pool: PgPool,
}

impl ReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the feedback report and upsert the child's curriculum in one
    /// transaction; failure rolls back and propagates so the message is
    /// abandoned.
    pub async fn persist(
        &self,
        submission_id: &str,
        child_id: &str,
        score: i32,
        weakness: WeaknessTag,
        recommendation: &str,
        focus_phonemes_csv: &str,
    ) -> sqlx::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"insert into "FeedbackReports"
                ("Id","SubmissionId","Score0_100","Weakness","Recommendation","CreatedAtUtc")
                values ($1,$2,$3,$4,$5,$6)"#,
        )
        .bind(Uuid::new_v4())
        .bind(submission_id)
        .bind(score)
        .bind(weakness.as_str())
        .bind(recommendation)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let difficulty = difficulty_for_score(score);
        // SuccessStreak is reset to 0 on every upsert; preserved from the
        // source rather than made monotonic (see DESIGN.md).
        sqlx::query(
            r#"insert into "ChildCurricula"
                ("Id","ChildId","FocusPhonemesCsv","Difficulty","SuccessStreak","UpdatedAtUtc")
                values ($1,$2,$3,$4,0,$5)
                on conflict ("ChildId") do update set
                    "FocusPhonemesCsv" = excluded."FocusPhonemesCsv",
                    "Difficulty" = excluded."Difficulty",
                    "SuccessStreak" = 0,
                    "UpdatedAtUtc" = excluded."UpdatedAtUtc""#,
        )
        .bind(Uuid::new_v4())
        .bind(child_id)
        .bind(focus_phonemes_csv)
        .bind(difficulty)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    }
}

pub struct PgG2PCache {
    pool: PgPool,
}

impl PgG2PCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl G2PCache for PgG2PCache {
    async fn lookup(&self, child_id: &str, words: &[String]) -> HashMap<String, Vec<String>> {
        let rows: sqlx::Result<Vec<(String, serde_json::Value)>> =
            sqlx::query_as("select word, phonemes from child_g2p_cache where child_id = $1 and word = any($2)")
                .bind(child_id)
                .bind(words)
                .fetch_all(&self.pool)
                .await;

        match rows {
            Ok(rows) => rows
                .into_iter()
                .filter_map(|(word, phonemes)| serde_json::from_value::<Vec<String>>(phonemes).ok().map(|p| (word, p)))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "g2p cache lookup failed; treating as all-miss");
                HashMap::new()
            }
        }
    }

    async fn store(&self, child_id: &str, mapping: &HashMap<String, Vec<String>>) {
        for (word, phonemes) in mapping {
            let value = serde_json::to_value(phonemes).unwrap_or(serde_json::Value::Array(vec![]));
            let result = sqlx::query(
                r#"insert into child_g2p_cache(child_id, word, phonemes) values ($1, $2, $3)
                   on conflict(child_id, word) do update set phonemes = excluded.phonemes"#,
            )
            .bind(child_id)
            .bind(word)
            .bind(value)
            .execute(&self.pool)
            .await;

            if let Err(e) = result {
                tracing::warn!(error = %e, word = %word, "g2p cache store failed");
            }
        }
    }
}

pub struct PgLexiconStore {
    pool: PgPool,
}

impl PgLexiconStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LexiconStore for PgLexiconStore {
    async fn fetch(&self, child_id: &str) -> Option<ChildLexiconRow> {
        let row: sqlx::Result<Option<(Option<serde_json::Value>, Option<Vec<String>>)>> =
            sqlx::query_as("select phonemes, words from child_lexicon where child_id = $1")
                .bind(child_id)
                .fetch_optional(&self.pool)
                .await;

        match row {
            Ok(Some((phonemes, words))) => Some(ChildLexiconRow {
                phonemes: phonemes.and_then(|v| serde_json::from_value(v).ok()),
                words,
            }),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, child_id = %child_id, "child lexicon fetch failed");
                None
            }
        }
    }
}

pub struct PgDriftStore {
    pool: PgPool,
}

impl PgDriftStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DriftStore for PgDriftStore {
    async fn load(&self) -> Option<Vec<f64>> {
        let row: sqlx::Result<Option<(serde_json::Value,)>> =
            sqlx::query_as("select hist from worker_drift_baseline where name = 'phoneme_hist'")
                .fetch_optional(&self.pool)
                .await;

        match row {
            Ok(Some((hist,))) => serde_json::from_value(hist).ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "drift baseline load failed");
                None
            }
        }
    }

    async fn save(&self, hist: &[f64]) {
        let value = serde_json::to_value(hist).unwrap_or(serde_json::Value::Array(vec![]));
        let result = sqlx::query(
            r#"insert into worker_drift_baseline(name, hist) values ('phoneme_hist', $1)
               on conflict(name) do update set hist = excluded.hist"#,
        )
        .bind(value)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, "drift baseline save failed");
        }
    }
}
