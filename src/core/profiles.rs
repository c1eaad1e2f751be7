use std::sync::Arc;
use thiserror::Error;

use crate::core::filters::{eligible_candidates, DEFAULT_CANDIDATE_LIMIT, DEFAULT_MIN_READINESS};
use crate::core::scoring::{readiness_insights, ScoreCalculator, ScoringError};
use crate::models::{Profile, ProfileDetails, ProfileScores, QuizAnswers, ReadinessInsights};
use crate::services::store::{ProfileStore, StoreError};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Invalid quiz answers: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Profile store failure: {0}")]
    Store(#[from] StoreError),

    #[error("User {0} has not completed the readiness quiz")]
    QuizIncomplete(String),
}

/// Scores plus the strengths/growth breakdown shown after the quiz
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    pub scores: ProfileScores,
    pub insights: ReadinessInsights,
}

/// Quiz submission and candidate browsing on top of the profile store
#[derive(Clone)]
pub struct ProfileService {
    calculator: Arc<ScoreCalculator>,
    store: Arc<dyn ProfileStore>,
    min_readiness: u8,
    candidate_limit: usize,
}

impl ProfileService {
    pub fn new(calculator: Arc<ScoreCalculator>, store: Arc<dyn ProfileStore>) -> Self {
        Self {
            calculator,
            store,
            min_readiness: DEFAULT_MIN_READINESS,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }

    pub fn with_candidate_rules(mut self, min_readiness: u8, candidate_limit: usize) -> Self {
        self.min_readiness = min_readiness;
        self.candidate_limit = candidate_limit;
        self
    }

    pub fn calculator(&self) -> &ScoreCalculator {
        &self.calculator
    }

    /// Create the user's profile or edit its basic fields
    pub async fn save_profile(&self, details: &ProfileDetails) -> Result<Profile, ProfileError> {
        let profile = self.store.upsert_profile(details).await?;
        tracing::info!("Saved profile {} (quiz completed: {})", profile.id, profile.has_completed_quiz);
        Ok(profile)
    }

    pub async fn profile(&self, user_id: &str) -> Result<Profile, ProfileError> {
        Ok(self.store.get_profile(user_id).await?)
    }

    /// Score answers without persisting anything
    pub fn compute_scores(&self, answers: &QuizAnswers) -> Result<ProfileScores, ProfileError> {
        Ok(self.calculator.compute_scores(answers)?)
    }

    /// Score answers and write the result onto the user's profile
    ///
    /// Invalid answers are rejected before anything is written.
    pub async fn submit_quiz(&self, user_id: &str, answers: &QuizAnswers) -> Result<QuizResult, ProfileError> {
        let scores = self.calculator.compute_scores(answers)?;
        self.store.save_scores(user_id, &scores).await?;

        tracing::info!(
            "Saved readiness scores for {}: {} ({})",
            user_id,
            scores.overall_score,
            scores.label
        );

        let insights = readiness_insights(&scores.dimension_scores);
        Ok(QuizResult { scores, insights })
    }

    /// Profiles `viewer_id` may browse; the viewer must have taken the quiz
    pub async fn candidates_for(&self, viewer_id: &str) -> Result<Vec<Profile>, ProfileError> {
        let viewer = self.store.get_profile(viewer_id).await?;
        if !viewer.has_completed_quiz {
            return Err(ProfileError::QuizIncomplete(viewer_id.to_string()));
        }

        let profiles = self
            .store
            .list_candidates(viewer_id, self.min_readiness, self.candidate_limit)
            .await?;

        Ok(eligible_candidates(
            profiles,
            viewer_id,
            self.min_readiness,
            self.candidate_limit,
        ))
    }
}
