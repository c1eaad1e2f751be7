use serde::{Deserialize, Serialize};

use crate::core::scoring::Question;
use crate::models::domain::{MatchSummary, Profile, ProfileScores, ReadinessInsights};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// The question bank
#[derive(Debug, Clone, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<Question>,
    pub count: usize,
}

/// Scores plus insights after a quiz submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResultResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub scores: ProfileScores,
    pub insights: ReadinessInsights,
}

/// Negative swipe acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeLeftResponse {
    pub advanced: bool,
}

/// A user's matches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub matches: Vec<MatchSummary>,
    pub count: usize,
}

/// Profiles a user may browse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatesResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub candidates: Vec<Profile>,
    pub count: usize,
}

/// A single profile after it was created or edited
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub profile: Profile,
}
