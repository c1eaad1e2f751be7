use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::core::pair::{PairError, UserPair};
use crate::models::{Match, MatchSummary};
use crate::services::store::{MatchStore, StoreError};

/// A match could not be resolved
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid pair: {0}")]
    Pair(#[from] PairError),

    #[error("Match store failure: {0}")]
    Store(#[from] StoreError),

    #[error("Insert for ({0}, {1}) conflicted but no match row was found")]
    ConflictWithoutRow(String, String),
}

/// Guarantees at most one match row per unordered user pair
///
/// Takes no locks. The store's unique index decides which concurrent
/// insert wins; losers read back the winner's row.
#[derive(Clone)]
pub struct MatchRegistry {
    store: Arc<dyn MatchStore>,
}

impl MatchRegistry {
    pub fn new(store: Arc<dyn MatchStore>) -> Self {
        Self { store }
    }

    /// Return the match for `{first, second}`, creating it if needed
    pub async fn get_or_create(&self, first: &str, second: &str) -> Result<Match, RegistryError> {
        self.get_or_create_at(first, second, Utc::now()).await
    }

    /// Same as [`get_or_create`](Self::get_or_create) with an explicit creation time
    ///
    /// # Protocol
    /// 1. Canonicalize the pair
    /// 2. Look up an existing row (either orientation); return it if found
    /// 3. Insert a canonical row
    /// 4. On a uniqueness conflict, look up once more and return that row
    ///
    /// Any other store error is returned as-is, without retrying.
    pub async fn get_or_create_at(
        &self,
        first: &str,
        second: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Match, RegistryError> {
        let pair = UserPair::new(first, second)?;

        if let Some(existing) = self.store.find_match(&pair).await? {
            tracing::debug!("Match already exists for ({}, {})", pair.low(), pair.high());
            return Ok(existing);
        }

        match self.store.insert_match(&pair, created_at).await {
            Ok(created) => {
                tracing::info!("Created match {} for ({}, {})", created.id, pair.low(), pair.high());
                Ok(created)
            }
            Err(StoreError::Conflict(reason)) => {
                tracing::warn!(
                    "Concurrent match insert for ({}, {}), reading back: {}",
                    pair.low(),
                    pair.high(),
                    reason
                );
                self.store.find_match(&pair).await?.ok_or_else(|| {
                    RegistryError::ConflictWithoutRow(pair.low().to_string(), pair.high().to_string())
                })
            }
            Err(e) => {
                tracing::error!("Failed to create match for ({}, {}): {}", pair.low(), pair.high(), e);
                Err(e.into())
            }
        }
    }

    /// Matches for `user_id`, one per other user, newest first
    ///
    /// Rows from older writers may duplicate a pair; only the most recent
    /// row per other user is kept.
    pub async fn matches_for(&self, user_id: &str) -> Result<Vec<MatchSummary>, RegistryError> {
        let rows = self.store.matches_involving(user_id).await?;

        let mut by_other: HashMap<String, MatchSummary> = HashMap::new();
        for row in rows {
            let pair = match row.pair() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!("Skipping malformed match row {}: {}", row.id, e);
                    continue;
                }
            };
            let other = pair.other_of(user_id)?.to_string();

            let newer = by_other
                .get(&other)
                .map_or(true, |existing| row.recency_key() > (existing.matched_at, existing.match_id));
            if newer {
                by_other.insert(
                    other.clone(),
                    MatchSummary {
                        match_id: row.id,
                        other_user_id: other,
                        matched_at: row.created_at,
                    },
                );
            }
        }

        let mut summaries: Vec<MatchSummary> = by_other.into_values().collect();
        summaries.sort_by(|a, b| {
            b.matched_at
                .cmp(&a.matched_at)
                .then_with(|| a.other_user_id.cmp(&b.other_user_id))
        });

        tracing::debug!("User {} has {} matches", user_id, summaries.len());
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;
    use chrono::Duration;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_get_or_create_is_symmetric() {
        let store = Arc::new(MemoryStore::new());
        let registry = MatchRegistry::new(store.clone());

        let first = registry.get_or_create("bob", "alice").await.unwrap();
        let second = registry.get_or_create("alice", "bob").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.user_a_id, "alice");
        assert_eq!(first.user_b_id, "bob");
        assert_eq!(store.match_count().await, 1);
    }

    #[tokio::test]
    async fn test_finds_legacy_reversed_row() {
        let store = Arc::new(MemoryStore::new());
        let legacy = Match {
            id: Uuid::new_v4(),
            user_a_id: "bob".to_string(),
            user_b_id: "alice".to_string(),
            created_at: Utc::now() - Duration::days(3),
        };
        store.seed_match(legacy.clone()).await;

        let registry = MatchRegistry::new(store.clone());
        let found = registry.get_or_create("alice", "bob").await.unwrap();

        assert_eq!(found, legacy);
        assert_eq!(store.match_count().await, 1);
    }

    #[tokio::test]
    async fn test_rejects_self_pair() {
        let registry = MatchRegistry::new(Arc::new(MemoryStore::new()));
        let err = registry.get_or_create("alice", "alice").await.unwrap_err();
        assert!(matches!(err, RegistryError::Pair(PairError::SameUser(_))));
    }

    #[tokio::test]
    async fn test_matches_for_dedupes_by_other_user() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        let older = Match {
            id: Uuid::new_v4(),
            user_a_id: "alice".to_string(),
            user_b_id: "bob".to_string(),
            created_at: now - Duration::days(10),
        };
        let newer = Match {
            id: Uuid::new_v4(),
            user_a_id: "bob".to_string(),
            user_b_id: "alice".to_string(),
            created_at: now - Duration::days(1),
        };
        store.seed_match(older).await;
        store.seed_match(newer.clone()).await;

        let registry = MatchRegistry::new(store.clone());
        registry.get_or_create_at("carol", "alice", now).await.unwrap();

        let summaries = registry.matches_for("alice").await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].other_user_id, "carol");
        assert_eq!(summaries[1].other_user_id, "bob");
        assert_eq!(summaries[1].match_id, newer.id);
    }

    #[tokio::test]
    async fn test_duplicate_rows_resolve_to_the_listed_match() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        let newer = Match {
            id: Uuid::new_v4(),
            user_a_id: "dave".to_string(),
            user_b_id: "erin".to_string(),
            created_at: now - Duration::hours(1),
        };
        let older = Match {
            id: Uuid::new_v4(),
            user_a_id: "erin".to_string(),
            user_b_id: "dave".to_string(),
            created_at: now - Duration::days(2),
        };
        // Insertion order must not decide which duplicate wins
        store.seed_match(newer.clone()).await;
        store.seed_match(older).await;

        let registry = MatchRegistry::new(store.clone());
        let resolved = registry.get_or_create("erin", "dave").await.unwrap();
        let listed = registry.matches_for("dave").await.unwrap();

        assert_eq!(resolved.id, newer.id);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].match_id, resolved.id);
    }
}
