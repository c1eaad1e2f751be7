use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{ProfileDetails, QuizAnswers};

/// Request to score quiz answers without saving them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreQuizRequest {
    #[serde(default)]
    pub answers: QuizAnswers,
}

/// Request to score and persist a user's quiz answers
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub answers: QuizAnswers,
}

/// Request body for a left or right swipe
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SwipeRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "actor_id", rename = "actorId")]
    pub actor_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "target_id", rename = "targetId")]
    pub target_id: String,
}

/// `?userId=` query for per-user lookups
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}

/// Create or edit the caller's basic profile fields
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpsertProfileRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[serde(rename = "fullName", default)]
    pub full_name: Option<String>,
    #[validate(range(min = 18, max = 120))]
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub intent: Option<String>,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub bio: Option<String>,
}

impl UpsertProfileRequest {
    /// Blank strings are stored as absent
    pub fn into_details(self) -> ProfileDetails {
        fn non_blank(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }

        ProfileDetails {
            id: self.user_id,
            full_name: non_blank(self.full_name),
            age: self.age,
            city: non_blank(self.city),
            intent: non_blank(self.intent),
            bio: non_blank(self.bio),
        }
    }
}
