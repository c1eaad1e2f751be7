use crate::models::{Dimension, DimensionScores, ProfileScores, QuizAnswers, ReadinessInsights};
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// Highest Likert response
pub const LIKERT_MAX: u8 = 5;

/// Upper bound of every dimension score and of the overall score
pub const MAX_SCORE: u8 = 10;

/// Number of questions each dimension must have in a question bank
pub const QUESTIONS_PER_DIMENSION: usize = 8;

/// Errors raised while validating quiz input or question banks
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("Unknown question id: {0}")]
    UnknownQuestion(u8),

    #[error("Answer {value} for question {question} is outside 1..=5")]
    AnswerOutOfRange { question: u8, value: u8 },

    #[error("Duplicate question id in question bank: {0}")]
    DuplicateQuestion(u8),

    #[error("Dimension {dimension} has {count} questions, expected {expected}")]
    DimensionSize {
        dimension: Dimension,
        count: usize,
        expected: usize,
    },
}

/// A single quiz statement
#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: u8,
    pub text: String,
    pub dimension: Dimension,
}

const STANDARD_QUESTIONS: [(u8, &str, Dimension); 40] = [
    (1, "I feel emotionally available to start something new.", Dimension::Emotional),
    (2, "I'm not stuck on my past relationships anymore.", Dimension::Emotional),
    (3, "I can handle emotional ups and downs without shutting down.", Dimension::Emotional),
    (4, "I'm open to being vulnerable with someone I trust.", Dimension::Emotional),
    (5, "I'm not dating just to distract myself from loneliness.", Dimension::Emotional),
    (6, "I can manage rejection or disappointment in a healthy way.", Dimension::Emotional),
    (7, "I feel stable enough to let someone into my life.", Dimension::Emotional),
    (8, "I'm not afraid of developing feelings for someone.", Dimension::Emotional),
    (9, "I understand my own needs clearly.", Dimension::SelfAwareness),
    (10, "I am aware of my relationship patterns.", Dimension::SelfAwareness),
    (11, "I take responsibility for my mistakes.", Dimension::SelfAwareness),
    (12, "I know what triggers me emotionally.", Dimension::SelfAwareness),
    (13, "I'm able to express my needs without guilt.", Dimension::SelfAwareness),
    (14, "I understand the type of partner I work best with.", Dimension::SelfAwareness),
    (15, "I'm honest with myself about what I truly want.", Dimension::SelfAwareness),
    (16, "I'm ready to show up as my authentic self.", Dimension::SelfAwareness),
    (17, "I can talk about difficult topics without avoiding them.", Dimension::Communication),
    (18, "I express my feelings clearly instead of bottling them up.", Dimension::Communication),
    (19, "I listen actively without interrupting.", Dimension::Communication),
    (20, "I can disagree respectfully.", Dimension::Communication),
    (21, "I can communicate when I need space.", Dimension::Communication),
    (22, "I can communicate when I need closeness.", Dimension::Communication),
    (23, "I'm willing to work through misunderstandings.", Dimension::Communication),
    (24, "I prefer clarity over assumptions.", Dimension::Communication),
    (25, "My life is generally stable right now.", Dimension::Stability),
    (26, "I can make time for someone consistently.", Dimension::Stability),
    (27, "My daily routine supports a healthy relationship.", Dimension::Stability),
    (28, "I manage stress well enough to date intentionally.", Dimension::Stability),
    (29, "I'm not overwhelmed by other responsibilities.", Dimension::Stability),
    (30, "I'm emotionally in control most days.", Dimension::Stability),
    (31, "I can balance personal goals and a relationship.", Dimension::Stability),
    (32, "I can offer emotional support without burning out.", Dimension::Stability),
    (33, "I respect my own boundaries.", Dimension::Boundaries),
    (34, "I respect other people's boundaries.", Dimension::Boundaries),
    (35, "I can say \"no\" without guilt.", Dimension::Boundaries),
    (36, "I can accept \"no\" without feeling rejected.", Dimension::Boundaries),
    (37, "I don't depend on constant attention to feel secure.", Dimension::Boundaries),
    (38, "I'm comfortable giving someone space when needed.", Dimension::Boundaries),
    (39, "I'm comfortable receiving space without fear.", Dimension::Boundaries),
    (40, "I'm genuinely ready to invest in someone.", Dimension::Boundaries),
];

const STANDARD_LABELS: [&str; 11] = [
    "Closed Off",
    "Avoidant",
    "Uncertain",
    "Processing",
    "Slowly Warming Up",
    "Half-Ready",
    "Open but Careful",
    "Ready to Build",
    "Fully Available",
    "Relationship-Oriented",
    "Partnership-Ready",
];

const STANDARD_DESCRIPTIONS: [&str; 11] = [
    "You may need more time before dating.",
    "You're keeping distance from connection.",
    "You're questioning if you're ready.",
    "You're working through past experiences.",
    "You're starting to open up.",
    "You're partly ready but cautious.",
    "You're open but taking your time.",
    "You're ready to build something real.",
    "You're emotionally ready and available.",
    "You're prioritizing meaningful relationships.",
    "You're fully ready for partnership.",
];

/// Fixed questionnaire: 5 dimensions of 8 questions each
#[derive(Debug, Clone, Serialize)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank, checking ids are unique and every dimension is full
    pub fn new(questions: Vec<Question>) -> Result<Self, ScoringError> {
        let mut seen = HashSet::new();
        for question in &questions {
            if !seen.insert(question.id) {
                return Err(ScoringError::DuplicateQuestion(question.id));
            }
        }

        for dimension in Dimension::ALL {
            let count = questions.iter().filter(|q| q.dimension == dimension).count();
            if count != QUESTIONS_PER_DIMENSION {
                return Err(ScoringError::DimensionSize {
                    dimension,
                    count,
                    expected: QUESTIONS_PER_DIMENSION,
                });
            }
        }

        Ok(Self { questions })
    }

    /// The 40-question readiness quiz shipped with the app
    pub fn standard() -> Self {
        let questions = STANDARD_QUESTIONS
            .iter()
            .map(|(id, text, dimension)| Question {
                id: *id,
                text: (*text).to_string(),
                dimension: *dimension,
            })
            .collect();

        Self { questions }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn dimension_of(&self, question_id: u8) -> Option<Dimension> {
        self.questions
            .iter()
            .find(|q| q.id == question_id)
            .map(|q| q.dimension)
    }

    fn questions_for(&self, dimension: Dimension) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(move |q| q.dimension == dimension)
    }
}

/// Label and description tables indexed by overall score (0..=10)
#[derive(Debug, Clone)]
pub struct ReadinessTables {
    labels: [String; 11],
    descriptions: [String; 11],
}

impl ReadinessTables {
    pub fn new(labels: [String; 11], descriptions: [String; 11]) -> Self {
        Self { labels, descriptions }
    }

    pub fn standard() -> Self {
        Self {
            labels: STANDARD_LABELS.map(|s| s.to_string()),
            descriptions: STANDARD_DESCRIPTIONS.map(|s| s.to_string()),
        }
    }

    pub fn label(&self, score: u8) -> &str {
        &self.labels[usize::from(score.min(MAX_SCORE))]
    }

    pub fn description(&self, score: u8) -> &str {
        &self.descriptions[usize::from(score.min(MAX_SCORE))]
    }
}

/// Converts quiz answers into readiness scores
///
/// Pure: holds only the static question bank and label tables.
#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    bank: QuestionBank,
    tables: ReadinessTables,
}

impl ScoreCalculator {
    pub fn new(bank: QuestionBank, tables: ReadinessTables) -> Self {
        Self { bank, tables }
    }

    pub fn standard() -> Self {
        Self::new(QuestionBank::standard(), ReadinessTables::standard())
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Compute dimension scores, overall score, label and description
    ///
    /// Missing answers count as 0. Unknown question ids and responses
    /// outside the Likert scale are rejected.
    pub fn compute_scores(&self, answers: &QuizAnswers) -> Result<ProfileScores, ScoringError> {
        self.validate(answers)?;

        let mut dimension_scores = DimensionScores::default();
        for dimension in Dimension::ALL {
            dimension_scores.set(dimension, self.dimension_score(dimension, answers));
        }

        let overall_score = overall_score(&dimension_scores);

        Ok(ProfileScores {
            dimension_scores,
            overall_score,
            label: self.tables.label(overall_score).to_string(),
            description: self.tables.description(overall_score).to_string(),
        })
    }

    fn validate(&self, answers: &QuizAnswers) -> Result<(), ScoringError> {
        for (&question, &value) in answers {
            if self.bank.dimension_of(question).is_none() {
                return Err(ScoringError::UnknownQuestion(question));
            }
            if !(1..=LIKERT_MAX).contains(&value) {
                return Err(ScoringError::AnswerOutOfRange { question, value });
            }
        }
        Ok(())
    }

    /// round((sum / (count * 5)) * 10), where count is the bank's fixed
    /// question count for the dimension, not the number answered
    fn dimension_score(&self, dimension: Dimension, answers: &QuizAnswers) -> u8 {
        let mut count = 0u32;
        let mut sum = 0u32;
        for question in self.bank.questions_for(dimension) {
            count += 1;
            sum += u32::from(answers.get(&question.id).copied().unwrap_or(0));
        }

        if count == 0 {
            return 0;
        }

        let avg = f64::from(sum) / f64::from(count);
        let score = ((avg / f64::from(LIKERT_MAX)) * 10.0).round();
        score.clamp(0.0, f64::from(MAX_SCORE)) as u8
    }
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::standard()
    }
}

/// round(mean of the five dimension scores)
pub fn overall_score(scores: &DimensionScores) -> u8 {
    let total: u32 = scores.iter().map(|(_, s)| u32::from(s)).sum();
    let mean = f64::from(total) / Dimension::ALL.len() as f64;
    mean.round().clamp(0.0, f64::from(MAX_SCORE)) as u8
}

/// Top two dimensions and the weakest one
///
/// Ties keep questionnaire order.
pub fn readiness_insights(scores: &DimensionScores) -> ReadinessInsights {
    let mut ranked: Vec<(Dimension, u8)> = scores.iter().collect();
    // sort_by is stable, so equal scores stay in questionnaire order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let strengths = ranked.iter().take(2).map(|(d, _)| *d).collect();
    let (growth_area, growth_score) = ranked[ranked.len() - 1];

    ReadinessInsights {
        strengths,
        growth_area,
        growth_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_answers(value: u8) -> QuizAnswers {
        (1..=40).map(|id| (id, value)).collect()
    }

    #[test]
    fn test_standard_bank_is_valid() {
        let bank = QuestionBank::standard();
        assert_eq!(bank.len(), 40);
        assert!(QuestionBank::new(bank.questions().to_vec()).is_ok());
        assert_eq!(bank.dimension_of(9), Some(Dimension::SelfAwareness));
        assert_eq!(bank.dimension_of(41), None);
    }

    #[test]
    fn test_all_strongly_agree() {
        let scores = ScoreCalculator::standard()
            .compute_scores(&uniform_answers(5))
            .unwrap();

        assert!(scores.dimension_scores.iter().all(|(_, s)| s == 10));
        assert_eq!(scores.overall_score, 10);
        assert_eq!(scores.label, "Partnership-Ready");
        assert_eq!(scores.description, "You're fully ready for partnership.");
    }

    #[test]
    fn test_all_strongly_disagree() {
        let scores = ScoreCalculator::standard()
            .compute_scores(&uniform_answers(1))
            .unwrap();

        assert!(scores.dimension_scores.iter().all(|(_, s)| s == 2));
        assert_eq!(scores.overall_score, 2);
        assert_eq!(scores.label, "Uncertain");
    }

    #[test]
    fn test_missing_answers_count_as_zero() {
        let scores = ScoreCalculator::standard()
            .compute_scores(&QuizAnswers::new())
            .unwrap();

        assert_eq!(scores.dimension_scores, DimensionScores::default());
        assert_eq!(scores.overall_score, 0);
        assert_eq!(scores.label, "Closed Off");
    }

    #[test]
    fn test_half_point_rounds_up() {
        // Emotional: six 4s and two 3s -> 30 / 40 * 10 = 7.5 -> 8
        let mut answers = QuizAnswers::new();
        for id in 1..=6 {
            answers.insert(id, 4);
        }
        answers.insert(7, 3);
        answers.insert(8, 3);

        let scores = ScoreCalculator::standard().compute_scores(&answers).unwrap();
        assert_eq!(scores.dimension_scores.emotional, 8);
        assert_eq!(scores.dimension_scores.self_awareness, 0);
        // 8 / 5 = 1.6 -> 2
        assert_eq!(scores.overall_score, 2);
    }

    #[test]
    fn test_rejects_unknown_question() {
        let mut answers = uniform_answers(3);
        answers.insert(41, 3);

        let err = ScoreCalculator::standard().compute_scores(&answers).unwrap_err();
        assert_eq!(err, ScoringError::UnknownQuestion(41));
    }

    #[test]
    fn test_rejects_out_of_range_answer() {
        let mut answers = uniform_answers(3);
        answers.insert(12, 6);

        let err = ScoreCalculator::standard().compute_scores(&answers).unwrap_err();
        assert_eq!(err, ScoringError::AnswerOutOfRange { question: 12, value: 6 });
    }

    #[test]
    fn test_bank_rejects_short_dimension() {
        let mut questions = QuestionBank::standard().questions().to_vec();
        questions.pop();

        let err = QuestionBank::new(questions).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::DimensionSize { dimension: Dimension::Boundaries, count: 7, .. }
        ));
    }

    #[test]
    fn test_insights_pick_strengths_and_growth() {
        let scores = DimensionScores {
            emotional: 6,
            self_awareness: 9,
            communication: 9,
            stability: 3,
            boundaries: 7,
        };

        let insights = readiness_insights(&scores);
        assert_eq!(
            insights.strengths,
            vec![Dimension::SelfAwareness, Dimension::Communication]
        );
        assert_eq!(insights.growth_area, Dimension::Stability);
        assert_eq!(insights.growth_score, 3);
    }

    #[test]
    fn test_insights_ties_keep_questionnaire_order() {
        let scores = DimensionScores {
            emotional: 5,
            self_awareness: 5,
            communication: 5,
            stability: 5,
            boundaries: 5,
        };

        let insights = readiness_insights(&scores);
        assert_eq!(insights.strengths, vec![Dimension::Emotional, Dimension::SelfAwareness]);
        assert_eq!(insights.growth_area, Dimension::Boundaries);
    }
}
