// Core algorithm exports
pub mod filters;
pub mod ledger;
pub mod orchestrator;
pub mod pair;
pub mod profiles;
pub mod registry;
pub mod scoring;

pub use filters::{eligible_candidates, is_eligible_candidate};
pub use ledger::{LedgerError, LikeLedger};
pub use orchestrator::{is_fresh, SwipeError, SwipeOrchestrator};
pub use pair::{other_of, PairError, UserPair};
pub use profiles::{ProfileError, ProfileService, QuizResult};
pub use registry::{MatchRegistry, RegistryError};
pub use scoring::{readiness_insights, QuestionBank, ReadinessTables, ScoreCalculator, ScoringError};
