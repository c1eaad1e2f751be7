use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use crate::core::pair::UserPair;
use crate::models::{DimensionScores, Like, Match, Profile, ProfileDetails, ProfileScores};
use crate::services::store::{LikeStore, MatchStore, ProfileStore, Store, StoreError};

const PROFILE_COLUMNS: &str = r#"
    id, full_name, age, city, intent, bio,
    dimension_emotional, dimension_self_awareness, dimension_communication,
    dimension_stability, dimension_boundaries,
    readiness_score, readiness_label, readiness_description, has_completed_quiz
"#;

/// PostgreSQL backend for profiles, likes and matches
///
/// Uniqueness lives in the schema (see `migrations/`): the `likes` table
/// is unique per ordered pair and `matches` per unordered pair.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

/// Map SQLSTATE 23505 to [`StoreError::Conflict`]
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Conflict(db.message().to_string());
        }
    }
    err.into()
}

fn match_from_row(row: &PgRow) -> Result<Match, sqlx::Error> {
    Ok(Match {
        id: row.try_get("id")?,
        user_a_id: row.try_get("user_a_id")?,
        user_b_id: row.try_get("user_b_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn score_column(row: &PgRow, column: &str) -> Result<Option<u8>, sqlx::Error> {
    let value: Option<i16> = row.try_get(column)?;
    Ok(value.map(|v| v.clamp(0, 10) as u8))
}

fn profile_from_row(row: &PgRow) -> Result<Profile, sqlx::Error> {
    let dimensions = [
        score_column(row, "dimension_emotional")?,
        score_column(row, "dimension_self_awareness")?,
        score_column(row, "dimension_communication")?,
        score_column(row, "dimension_stability")?,
        score_column(row, "dimension_boundaries")?,
    ];

    let dimension_scores = match dimensions {
        [Some(emotional), Some(self_awareness), Some(communication), Some(stability), Some(boundaries)] => {
            Some(DimensionScores {
                emotional,
                self_awareness,
                communication,
                stability,
                boundaries,
            })
        }
        _ => None,
    };

    let age: Option<i16> = row.try_get("age")?;

    Ok(Profile {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        age: age.and_then(|a| u8::try_from(a).ok()),
        city: row.try_get("city")?,
        intent: row.try_get("intent")?,
        bio: row.try_get("bio")?,
        dimension_scores,
        readiness_score: score_column(row, "readiness_score")?,
        readiness_label: row.try_get("readiness_label")?,
        readiness_description: row.try_get("readiness_description")?,
        has_completed_quiz: row.try_get("has_completed_quiz")?,
    })
}

#[async_trait]
impl LikeStore for PostgresClient {
    async fn insert_like(&self, like: &Like) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO likes (user_id, liked_user_id, created_at)
            VALUES ($1, $2, $3)
        "#;

        sqlx::query(query)
            .bind(&like.user_id)
            .bind(&like.liked_user_id)
            .bind(like.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(())
    }

    async fn like_exists(&self, user_id: &str, liked_user_id: &str) -> Result<bool, StoreError> {
        let query = r#"
            SELECT EXISTS (
                SELECT 1 FROM likes
                WHERE user_id = $1 AND liked_user_id = $2
            ) AS liked
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .bind(liked_user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("liked")?)
    }
}

#[async_trait]
impl MatchStore for PostgresClient {
    async fn find_match(&self, pair: &UserPair) -> Result<Option<Match>, StoreError> {
        // Either orientation: rows written by older clients may be reversed.
        // Duplicates resolve to the newest row, as in `Match::recency_key`.
        let query = r#"
            SELECT id, user_a_id, user_b_id, created_at
            FROM matches
            WHERE (user_a_id = $1 AND user_b_id = $2)
               OR (user_a_id = $2 AND user_b_id = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(pair.low())
            .bind(pair.high())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(match_from_row).transpose()?)
    }

    async fn insert_match(
        &self,
        pair: &UserPair,
        created_at: DateTime<Utc>,
    ) -> Result<Match, StoreError> {
        let query = r#"
            INSERT INTO matches (id, user_a_id, user_b_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_a_id, user_b_id, created_at
        "#;

        let row = sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(pair.low())
            .bind(pair.high())
            .bind(created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(match_from_row(&row)?)
    }

    async fn matches_involving(&self, user_id: &str) -> Result<Vec<Match>, StoreError> {
        let query = r#"
            SELECT id, user_a_id, user_b_id, created_at
            FROM matches
            WHERE user_a_id = $1 OR user_b_id = $1
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;

        let matches: Result<Vec<Match>, _> = rows.iter().map(match_from_row).collect();
        Ok(matches?)
    }
}

#[async_trait]
impl ProfileStore for PostgresClient {
    async fn get_profile(&self, user_id: &str) -> Result<Profile, StoreError> {
        let query = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);

        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Profile not found for user {}", user_id)))?;

        Ok(profile_from_row(&row)?)
    }

    async fn upsert_profile(&self, details: &ProfileDetails) -> Result<Profile, StoreError> {
        let query = format!(
            r#"
            INSERT INTO profiles (id, full_name, age, city, intent, bio)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                age = EXCLUDED.age,
                city = EXCLUDED.city,
                intent = EXCLUDED.intent,
                bio = EXCLUDED.bio,
                updated_at = NOW()
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(&details.id)
            .bind(&details.full_name)
            .bind(details.age.map(i16::from))
            .bind(&details.city)
            .bind(&details.intent)
            .bind(&details.bio)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!("Upserted profile {}", details.id);
        Ok(profile_from_row(&row)?)
    }

    async fn save_scores(&self, user_id: &str, scores: &ProfileScores) -> Result<(), StoreError> {
        let query = r#"
            UPDATE profiles SET
                has_completed_quiz = TRUE,
                readiness_score = $2,
                readiness_label = $3,
                readiness_description = $4,
                dimension_emotional = $5,
                dimension_self_awareness = $6,
                dimension_communication = $7,
                dimension_stability = $8,
                dimension_boundaries = $9
            WHERE id = $1
        "#;

        let dims = &scores.dimension_scores;
        let result = sqlx::query(query)
            .bind(user_id)
            .bind(i16::from(scores.overall_score))
            .bind(&scores.label)
            .bind(&scores.description)
            .bind(i16::from(dims.emotional))
            .bind(i16::from(dims.self_awareness))
            .bind(i16::from(dims.communication))
            .bind(i16::from(dims.stability))
            .bind(i16::from(dims.boundaries))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Profile not found for user {}", user_id)));
        }

        tracing::debug!("Updated readiness scores for {}", user_id);
        Ok(())
    }

    async fn list_candidates(
        &self,
        viewer_id: &str,
        min_readiness: u8,
        limit: usize,
    ) -> Result<Vec<Profile>, StoreError> {
        let query = format!(
            r#"
            SELECT {}
            FROM profiles
            WHERE id <> $1
              AND readiness_score IS NOT NULL
              AND readiness_score >= $2
            ORDER BY id
            LIMIT $3
            "#,
            PROFILE_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(viewer_id)
            .bind(i16::from(min_readiness))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let profiles: Result<Vec<Profile>, _> = rows.iter().map(profile_from_row).collect();
        Ok(profiles?)
    }
}

#[async_trait]
impl Store for PostgresClient {
    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
