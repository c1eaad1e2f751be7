use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::core::pair::{PairError, UserPair};

/// Raw quiz input: question id (1..=40) to Likert response (1..=5)
///
/// Unanswered questions are simply absent from the map.
pub type QuizAnswers = BTreeMap<u8, u8>;

/// One of the five readiness axes measured by the quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Emotional,
    SelfAwareness,
    Communication,
    Stability,
    Boundaries,
}

impl Dimension {
    /// All dimensions, in questionnaire order
    pub const ALL: [Dimension; 5] = [
        Dimension::Emotional,
        Dimension::SelfAwareness,
        Dimension::Communication,
        Dimension::Stability,
        Dimension::Boundaries,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Emotional => "emotional",
            Dimension::SelfAwareness => "self_awareness",
            Dimension::Communication => "communication",
            Dimension::Stability => "stability",
            Dimension::Boundaries => "boundaries",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-dimension readiness scores, each in 0..=10
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub emotional: u8,
    pub self_awareness: u8,
    pub communication: u8,
    pub stability: u8,
    pub boundaries: u8,
}

impl DimensionScores {
    pub fn get(&self, dimension: Dimension) -> u8 {
        match dimension {
            Dimension::Emotional => self.emotional,
            Dimension::SelfAwareness => self.self_awareness,
            Dimension::Communication => self.communication,
            Dimension::Stability => self.stability,
            Dimension::Boundaries => self.boundaries,
        }
    }

    pub fn set(&mut self, dimension: Dimension, score: u8) {
        match dimension {
            Dimension::Emotional => self.emotional = score,
            Dimension::SelfAwareness => self.self_awareness = score,
            Dimension::Communication => self.communication = score,
            Dimension::Stability => self.stability = score,
            Dimension::Boundaries => self.boundaries = score,
        }
    }

    /// Iterate `(dimension, score)` in questionnaire order
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, u8)> + '_ {
        Dimension::ALL.iter().map(move |d| (*d, self.get(*d)))
    }
}

/// Output of the score calculator, written back onto the profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileScores {
    #[serde(rename = "dimensionScores")]
    pub dimension_scores: DimensionScores,
    #[serde(rename = "overallScore")]
    pub overall_score: u8,
    pub label: String,
    pub description: String,
}

/// Strongest and weakest dimensions of a completed quiz
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessInsights {
    pub strengths: Vec<Dimension>,
    #[serde(rename = "growthArea")]
    pub growth_area: Dimension,
    #[serde(rename = "growthScore")]
    pub growth_score: u8,
}

/// Fields a user edits on their own profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDetails {
    pub id: String,
    #[serde(rename = "fullName", default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// User profile with derived readiness state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(rename = "fullName", default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub city: Option<String>,
    /// What the user is looking for, shown on every candidate card
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(rename = "dimensionScores", default)]
    pub dimension_scores: Option<DimensionScores>,
    #[serde(rename = "readinessScore", default)]
    pub readiness_score: Option<u8>,
    #[serde(rename = "readinessLabel", default)]
    pub readiness_label: Option<String>,
    #[serde(rename = "readinessDescription", default)]
    pub readiness_description: Option<String>,
    #[serde(rename = "hasCompletedQuiz", default)]
    pub has_completed_quiz: bool,
}

impl Profile {
    /// A freshly registered profile that has not taken the quiz yet
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: None,
            age: None,
            city: None,
            intent: None,
            bio: None,
            dimension_scores: None,
            readiness_score: None,
            readiness_label: None,
            readiness_description: None,
            has_completed_quiz: false,
        }
    }

    /// Build a profile from user-edited details, with no quiz taken yet
    pub fn from_details(details: &ProfileDetails) -> Self {
        let mut profile = Self::new(details.id.clone());
        profile.apply_details(details);
        profile
    }

    /// Overwrite the user-editable fields; readiness state is left alone
    pub fn apply_details(&mut self, details: &ProfileDetails) {
        self.full_name = details.full_name.clone();
        self.age = details.age;
        self.city = details.city.clone();
        self.intent = details.intent.clone();
        self.bio = details.bio.clone();
    }

    /// Write calculator output back onto the profile
    pub fn apply_scores(&mut self, scores: &ProfileScores) {
        self.dimension_scores = Some(scores.dimension_scores);
        self.readiness_score = Some(scores.overall_score);
        self.readiness_label = Some(scores.label.clone());
        self.readiness_description = Some(scores.description.clone());
        self.has_completed_quiz = true;
    }
}

/// Directional interest fact: `user_id` liked `liked_user_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "likedUserId")]
    pub liked_user_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Canonical mutual-interest record
///
/// Rows written by this service always satisfy `user_a_id < user_b_id`.
/// Rows read back may come from older writers, so code that needs the
/// pair goes through [`Match::pair`] rather than trusting the field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    #[serde(rename = "userAId")]
    pub user_a_id: String,
    #[serde(rename = "userBId")]
    pub user_b_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Build a new canonical match row for `pair`
    pub fn new(pair: &UserPair, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_a_id: pair.low().to_string(),
            user_b_id: pair.high().to_string(),
            created_at,
        }
    }

    /// Order used to pick one row when a pair has duplicates: newest wins,
    /// ties broken by id
    pub fn recency_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.created_at, self.id)
    }

    /// The unordered pair this row is about
    pub fn pair(&self) -> Result<UserPair, PairError> {
        UserPair::new(&self.user_a_id, &self.user_b_id)
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.user_a_id == user_id || self.user_b_id == user_id
    }
}

/// A match as seen from one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    #[serde(rename = "matchId")]
    pub match_id: Uuid,
    #[serde(rename = "otherUserId")]
    pub other_user_id: String,
    #[serde(rename = "matchedAt")]
    pub matched_at: DateTime<Utc>,
}

/// Result of a positive swipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeOutcome {
    pub matched: bool,
    #[serde(rename = "isNew")]
    pub is_new: bool,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none", default)]
    pub match_record: Option<Match>,
}

impl SwipeOutcome {
    pub fn no_match() -> Self {
        Self {
            matched: false,
            is_new: false,
            match_record: None,
        }
    }

    pub fn matched(record: Match, is_new: bool) -> Self {
        Self {
            matched: true,
            is_new,
            match_record: Some(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_serde_names() {
        let json = serde_json::to_string(&Dimension::SelfAwareness).unwrap();
        assert_eq!(json, "\"self_awareness\"");
        assert_eq!(Dimension::Boundaries.to_string(), "boundaries");
    }

    #[test]
    fn test_dimension_scores_get_set() {
        let mut scores = DimensionScores::default();
        scores.set(Dimension::Stability, 7);
        assert_eq!(scores.get(Dimension::Stability), 7);
        assert_eq!(scores.iter().map(|(_, s)| s as u32).sum::<u32>(), 7);
    }

    #[test]
    fn test_match_pair_tolerates_reversed_rows() {
        let now = Utc::now();
        let legacy = Match {
            id: Uuid::new_v4(),
            user_a_id: "zed".to_string(),
            user_b_id: "amy".to_string(),
            created_at: now,
        };

        let pair = legacy.pair().unwrap();
        assert_eq!(pair.low(), "amy");
        assert_eq!(pair.high(), "zed");
        assert!(legacy.involves("amy"));
        assert!(!legacy.involves("bob"));
    }

    #[test]
    fn test_swipe_outcome_serializes_match_key() {
        let outcome = SwipeOutcome::no_match();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["matched"], false);
        assert_eq!(json["isNew"], false);
        assert!(json.get("match").is_none());
    }
}
