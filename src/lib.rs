//! Kinnect Match - readiness scoring and match formation for the Kinnect dating app
//!
//! Two pieces of logic live here: turning the 40-question readiness quiz
//! into dimension and overall scores, and turning two independent likes
//! into exactly one match record even when both likes race.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    LikeLedger, MatchRegistry, ProfileService, ScoreCalculator, SwipeOrchestrator, UserPair,
};
pub use crate::models::{Match, Profile, ProfileScores, QuizAnswers, SwipeOutcome};
