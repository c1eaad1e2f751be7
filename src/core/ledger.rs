use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::models::Like;
use crate::services::store::{LikeStore, StoreError};

/// A like could not be recorded or checked
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Like store failure: {0}")]
    Store(#[from] StoreError),
}

/// Records one-directional likes and answers "has A liked B?"
#[derive(Clone)]
pub struct LikeLedger {
    store: Arc<dyn LikeStore>,
}

impl LikeLedger {
    pub fn new(store: Arc<dyn LikeStore>) -> Self {
        Self { store }
    }

    /// Record that `user_id` liked `liked_user_id`
    ///
    /// Idempotent: a like that already exists is reported as success.
    pub async fn record(&self, user_id: &str, liked_user_id: &str) -> Result<(), LedgerError> {
        self.record_at(user_id, liked_user_id, Utc::now()).await
    }

    pub async fn record_at(
        &self,
        user_id: &str,
        liked_user_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let like = Like {
            user_id: user_id.to_string(),
            liked_user_id: liked_user_id.to_string(),
            created_at,
        };

        match self.store.insert_like(&like).await {
            Ok(()) => {
                tracing::debug!("Recorded like: {} -> {}", user_id, liked_user_id);
                Ok(())
            }
            Err(StoreError::Conflict(_)) => {
                tracing::debug!("Like already recorded: {} -> {}", user_id, liked_user_id);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to record like {} -> {}: {}", user_id, liked_user_id, e);
                Err(e.into())
            }
        }
    }

    /// Whether `user_id` has liked `liked_user_id` (direction matters)
    pub async fn has_liked(&self, user_id: &str, liked_user_id: &str) -> Result<bool, LedgerError> {
        Ok(self.store.like_exists(user_id, liked_user_id).await?)
    }
}
