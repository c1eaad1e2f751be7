use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::pair::UserPair;
use crate::models::{Like, Match, Profile, ProfileDetails, ProfileScores};

/// Errors reported by a storage backend
///
/// `Conflict` is the only variant callers treat as an expected outcome:
/// it means a uniqueness constraint rejected the write.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Persistence for directional likes, unique per ordered pair
#[async_trait]
pub trait LikeStore: Send + Sync {
    /// Insert a like; a duplicate ordered pair yields [`StoreError::Conflict`]
    async fn insert_like(&self, like: &Like) -> Result<(), StoreError>;

    async fn like_exists(&self, user_id: &str, liked_user_id: &str) -> Result<bool, StoreError>;
}

/// Persistence for matches, unique per unordered pair
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Find the match for `pair` in either stored orientation
    async fn find_match(&self, pair: &UserPair) -> Result<Option<Match>, StoreError>;

    /// Atomically insert a canonical row; a duplicate pair yields [`StoreError::Conflict`]
    async fn insert_match(
        &self,
        pair: &UserPair,
        created_at: DateTime<Utc>,
    ) -> Result<Match, StoreError>;

    async fn matches_involving(&self, user_id: &str) -> Result<Vec<Match>, StoreError>;
}

/// Persistence for profiles and their readiness scores
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Profile, StoreError>;

    /// Create the profile or overwrite its editable fields, keeping any scores
    async fn upsert_profile(&self, details: &ProfileDetails) -> Result<Profile, StoreError>;

    /// Write scores and mark the quiz completed; unknown users yield `NotFound`
    async fn save_scores(&self, user_id: &str, scores: &ProfileScores) -> Result<(), StoreError>;

    /// Profiles other than `viewer_id` scoring at least `min_readiness`
    async fn list_candidates(
        &self,
        viewer_id: &str,
        min_readiness: u8,
        limit: usize,
    ) -> Result<Vec<Profile>, StoreError>;
}

/// A complete backend
#[async_trait]
pub trait Store: LikeStore + MatchStore + ProfileStore {
    async fn health_check(&self) -> Result<bool, StoreError>;
}
