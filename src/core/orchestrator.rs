use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::core::ledger::{LedgerError, LikeLedger};
use crate::core::pair::PairError;
use crate::core::registry::{MatchRegistry, RegistryError};
use crate::models::{Match, SwipeOutcome};

/// Default age below which a resolved match counts as newly formed
pub const DEFAULT_FRESHNESS_WINDOW_MS: i64 = 5_000;

/// Source of "now" for a swipe
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// A positive swipe failed
///
/// Every path is safe to retry: likes and matches are idempotent.
#[derive(Debug, Error)]
pub enum SwipeError {
    #[error("Invalid swipe: {0}")]
    InvalidPair(#[from] PairError),

    #[error("Failed to record like: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Failed to resolve match: {0}")]
    Registry(#[from] RegistryError),
}

/// Whether `record` was created less than `window` before `now`
///
/// A heuristic, not a creation signal: `get_or_create` returns the same
/// row whether or not this caller inserted it, so age is all we have.
/// Two racing callers may both see a fresh match.
pub fn is_fresh(record: &Match, now: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(record.created_at) < window
}

/// Turns swipes into likes and, on mutual interest, into matches
///
/// # Positive swipe
/// 1. Record the like (a failure aborts the swipe)
/// 2. Check whether the target already liked the actor
/// 3. If not, stop with no match
/// 4. If so, get or create the match for the pair
/// 5. Flag the match as new if it is younger than the freshness window
#[derive(Clone)]
pub struct SwipeOrchestrator {
    ledger: LikeLedger,
    registry: MatchRegistry,
    freshness_window: Duration,
    clock: Clock,
}

impl SwipeOrchestrator {
    pub fn new(ledger: LikeLedger, registry: MatchRegistry) -> Self {
        Self {
            ledger,
            registry,
            freshness_window: Duration::milliseconds(DEFAULT_FRESHNESS_WINDOW_MS),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &MatchRegistry {
        &self.registry
    }

    /// Positive swipe from `actor_id` on `target_id`
    pub async fn swipe_right(&self, actor_id: &str, target_id: &str) -> Result<SwipeOutcome, SwipeError> {
        if actor_id == target_id {
            return Err(PairError::SameUser(actor_id.to_string()).into());
        }

        self.ledger
            .record_at(actor_id, target_id, (self.clock)())
            .await?;

        let mutual = self.ledger.has_liked(target_id, actor_id).await?;
        if !mutual {
            tracing::debug!("No mutual like yet: {} -> {}", actor_id, target_id);
            return Ok(SwipeOutcome::no_match());
        }

        let record = self
            .registry
            .get_or_create_at(actor_id, target_id, (self.clock)())
            .await?;

        let is_new = is_fresh(&record, (self.clock)(), self.freshness_window);
        tracing::info!(
            "Mutual like between {} and {} resolved to match {} (new: {})",
            actor_id,
            target_id,
            record.id,
            is_new
        );

        Ok(SwipeOutcome::matched(record, is_new))
    }

    /// Negative swipe: advances to the next candidate without writing anything
    pub fn swipe_left(&self, actor_id: &str, target_id: &str) {
        tracing::debug!("Passed: {} -> {}", actor_id, target_id);
    }
}
