// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Dimension, DimensionScores, Like, Match, MatchSummary, Profile, ProfileDetails, ProfileScores, QuizAnswers,
    ReadinessInsights, SwipeOutcome,
};
pub use requests::{ScoreQuizRequest, SubmitQuizRequest, SwipeRequest, UpsertProfileRequest, UserQuery};
pub use responses::{
    CandidatesResponse, ErrorResponse, HealthResponse, MatchesResponse, ProfileResponse, QuestionsResponse,
    QuizResultResponse, SwipeLeftResponse,
};
