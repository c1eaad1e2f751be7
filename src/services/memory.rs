use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::core::filters::is_eligible_candidate;
use crate::core::pair::UserPair;
use crate::models::{Like, Match, Profile, ProfileDetails, ProfileScores};
use crate::services::store::{LikeStore, MatchStore, ProfileStore, Store, StoreError};

/// In-process store with the same uniqueness rules as the Postgres schema
///
/// Each insert checks and writes under one write lock, which gives the
/// same atomic insert-or-conflict behavior as a unique index.
#[derive(Default)]
pub struct MemoryStore {
    likes: RwLock<HashMap<(String, String), Like>>,
    matches: RwLock<Vec<Match>>,
    profiles: RwLock<HashMap<String, Profile>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with [`StoreError::Unavailable`] until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Insert a profile as if the user had registered
    pub async fn seed_profile(&self, profile: Profile) {
        self.profiles.write().await.insert(profile.id.clone(), profile);
    }

    /// Insert a match row verbatim, bypassing canonicalization
    ///
    /// Used to reproduce rows written by older clients.
    pub async fn seed_match(&self, record: Match) {
        self.matches.write().await.push(record);
    }

    pub async fn like_count(&self) -> usize {
        self.likes.read().await.len()
    }

    pub async fn match_count(&self) -> usize {
        self.matches.read().await.len()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

fn same_pair(record: &Match, pair: &UserPair) -> bool {
    (record.user_a_id == pair.low() && record.user_b_id == pair.high())
        || (record.user_a_id == pair.high() && record.user_b_id == pair.low())
}

#[async_trait]
impl LikeStore for MemoryStore {
    async fn insert_like(&self, like: &Like) -> Result<(), StoreError> {
        self.check_available()?;

        let key = (like.user_id.clone(), like.liked_user_id.clone());
        let mut likes = self.likes.write().await;
        if likes.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "likes ({}, {})",
                like.user_id, like.liked_user_id
            )));
        }
        likes.insert(key, like.clone());
        Ok(())
    }

    async fn like_exists(&self, user_id: &str, liked_user_id: &str) -> Result<bool, StoreError> {
        self.check_available()?;

        let key = (user_id.to_string(), liked_user_id.to_string());
        Ok(self.likes.read().await.contains_key(&key))
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn find_match(&self, pair: &UserPair) -> Result<Option<Match>, StoreError> {
        self.check_available()?;

        let matches = self.matches.read().await;
        Ok(matches
            .iter()
            .filter(|m| same_pair(m, pair))
            .max_by_key(|m| m.recency_key())
            .cloned())
    }

    async fn insert_match(
        &self,
        pair: &UserPair,
        created_at: DateTime<Utc>,
    ) -> Result<Match, StoreError> {
        self.check_available()?;

        let mut matches = self.matches.write().await;
        if matches.iter().any(|m| same_pair(m, pair)) {
            return Err(StoreError::Conflict(format!(
                "matches ({}, {})",
                pair.low(),
                pair.high()
            )));
        }

        let record = Match::new(pair, created_at);
        matches.push(record.clone());
        Ok(record)
    }

    async fn matches_involving(&self, user_id: &str) -> Result<Vec<Match>, StoreError> {
        self.check_available()?;

        let matches = self.matches.read().await;
        Ok(matches.iter().filter(|m| m.involves(user_id)).cloned().collect())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, user_id: &str) -> Result<Profile, StoreError> {
        self.check_available()?;

        self.profiles
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Profile not found for user {}", user_id)))
    }

    async fn upsert_profile(&self, details: &ProfileDetails) -> Result<Profile, StoreError> {
        self.check_available()?;

        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .entry(details.id.clone())
            .and_modify(|existing| existing.apply_details(details))
            .or_insert_with(|| Profile::from_details(details));
        Ok(profile.clone())
    }

    async fn save_scores(&self, user_id: &str, scores: &ProfileScores) -> Result<(), StoreError> {
        self.check_available()?;

        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(format!("Profile not found for user {}", user_id)))?;
        profile.apply_scores(scores);
        Ok(())
    }

    async fn list_candidates(
        &self,
        viewer_id: &str,
        min_readiness: u8,
        limit: usize,
    ) -> Result<Vec<Profile>, StoreError> {
        self.check_available()?;

        let profiles = self.profiles.read().await;
        let mut candidates: Vec<Profile> = profiles
            .values()
            .filter(|p| is_eligible_candidate(p, viewer_id, min_readiness))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        candidates.truncate(limit);
        Ok(candidates)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(!self.unavailable.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn like(from: &str, to: &str) -> Like {
        Like {
            user_id: from.to_string(),
            liked_user_id: to.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_like_conflicts() {
        let store = MemoryStore::new();

        store.insert_like(&like("a", "b")).await.unwrap();
        let err = store.insert_like(&like("a", "b")).await.unwrap_err();

        assert!(err.is_conflict());
        // The reverse direction is a different fact
        store.insert_like(&like("b", "a")).await.unwrap();
        assert_eq!(store.like_count().await, 2);
    }

    #[tokio::test]
    async fn test_match_unique_per_unordered_pair() {
        let store = MemoryStore::new();
        let pair = UserPair::new("b", "a").unwrap();

        let record = store.insert_match(&pair, Utc::now()).await.unwrap();
        assert_eq!(record.user_a_id, "a");

        let reversed = UserPair::new("a", "b").unwrap();
        let err = store.insert_match(&reversed, Utc::now()).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.match_count().await, 1);
    }

    #[tokio::test]
    async fn test_upsert_profile_keeps_scores() {
        let store = MemoryStore::new();
        let mut details = ProfileDetails {
            id: "alice".to_string(),
            full_name: Some("Alice".to_string()),
            age: Some(29),
            city: None,
            intent: Some("Long-term".to_string()),
            bio: None,
        };

        let created = store.upsert_profile(&details).await.unwrap();
        assert!(!created.has_completed_quiz);

        let scores = crate::core::ScoreCalculator::standard()
            .compute_scores(&(1..=40).map(|id| (id, 4)).collect())
            .unwrap();
        store.save_scores("alice", &scores).await.unwrap();

        details.city = Some("Lisbon".to_string());
        let edited = store.upsert_profile(&details).await.unwrap();
        assert_eq!(edited.city.as_deref(), Some("Lisbon"));
        assert_eq!(edited.intent.as_deref(), Some("Long-term"));
        assert_eq!(edited.readiness_score, Some(scores.overall_score));
        assert!(edited.has_completed_quiz);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_without_conflict() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        let err = store.insert_like(&like("a", "b")).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(!store.health_check().await.unwrap());
    }
}
