//! Course recommendation scoring
//!
//! Scoring is a pluggable policy behind [`RecommendationPolicy`]. The default
//! [`TallyScorer`] counts every selected tag across all questions and
//! recommends the most frequent one.
//!
//! **Tie-break:** equal counts resolve by a fixed priority order, by default
//! `aa_hl > ai_hl > aa_sl > ai_sl` (HL before SL, then AA before AI).
//!
//! **Confidence:** winning count / total selections, as a percentage rounded
//! to two decimal places.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::questionnaire::{AnswerMap, QuestionBank, Tag};

/// Default tie-break priority, highest first
pub const DEFAULT_PRIORITY: [Tag; 4] = [Tag::AaHl, Tag::AiHl, Tag::AaSl, Tag::AiSl];

/// Recommended course and how strongly the answers support it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommended_course: Tag,
    /// Percentage in [0, 100]
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("no answers selected")]
    NoSelections,

    /// Required questions without a selection
    #[error("{missing} required question(s) unanswered")]
    Incomplete { missing: usize },

    #[error("tie-break priority must list each tag exactly once")]
    InvalidPriority,

    #[error("answer for unknown question: {0}")]
    UnknownQuestion(String),

    #[error("question {question} has {count} selections")]
    TooManySelections { question: String, count: usize },
}

/// Scoring strategy consumed by the questionnaire service
pub trait RecommendationPolicy: Send + Sync {
    /// Short identifier for logs
    fn name(&self) -> &'static str;

    /// Score a completed answer map
    fn score(&self, answers: &AnswerMap) -> Result<Recommendation, ScoreError>;
}

/// Per-tag selection counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TagTally {
    counts: [usize; 4],
}

impl TagTally {
    pub fn from_answers(answers: &AnswerMap) -> Self {
        let mut tally = Self::default();
        for (_, selections) in answers.iter() {
            for tag in selections {
                tally.counts[tag.index()] += 1;
            }
        }
        tally
    }

    pub fn count(&self, tag: Tag) -> usize {
        self.counts[tag.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Highest tag count wins, ties broken by priority order
#[derive(Debug, Clone)]
pub struct TallyScorer {
    priority: [Tag; 4],
    required_questions: Vec<String>,
}

impl Default for TallyScorer {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            required_questions: Vec::new(),
        }
    }
}

impl TallyScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scorer that also refuses answer maps missing any question of `bank`
    pub fn for_bank(bank: &QuestionBank) -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            required_questions: bank.questions().iter().map(|q| q.id.clone()).collect(),
        }
    }

    /// Replace the tie-break order (highest priority first)
    pub fn with_priority(mut self, priority: &[Tag]) -> Result<Self, ScoreError> {
        if priority.len() != 4 || Tag::all().iter().any(|tag| !priority.contains(tag)) {
            return Err(ScoreError::InvalidPriority);
        }
        self.priority.copy_from_slice(priority);
        Ok(self)
    }

    pub fn priority(&self) -> &[Tag; 4] {
        &self.priority
    }
}

impl RecommendationPolicy for TallyScorer {
    fn name(&self) -> &'static str {
        "tally"
    }

    fn score(&self, answers: &AnswerMap) -> Result<Recommendation, ScoreError> {
        for (id, selections) in answers.iter() {
            if selections.len() > AnswerMap::MAX_SELECTIONS {
                return Err(ScoreError::TooManySelections {
                    question: id.to_string(),
                    count: selections.len(),
                });
            }
            // Bank-bound scorers only accept ids from their bank
            if !self.required_questions.is_empty()
                && !self.required_questions.iter().any(|required| required == id)
            {
                return Err(ScoreError::UnknownQuestion(id.to_string()));
            }
        }

        let missing = self
            .required_questions
            .iter()
            .filter(|id| !answers.is_answered(id))
            .count();
        if missing > 0 {
            return Err(ScoreError::Incomplete { missing });
        }

        let tally = TagTally::from_answers(answers);
        let total = tally.total();
        if total == 0 {
            return Err(ScoreError::NoSelections);
        }

        // Walk in priority order and only replace on a strictly higher count
        let mut winner = self.priority[0];
        for &tag in &self.priority[1..] {
            if tally.count(tag) > tally.count(winner) {
                winner = tag;
            }
        }

        let share = tally.count(winner) as f64 * 100.0 / total as f64;
        Ok(Recommendation {
            recommended_course: winner,
            confidence_score: (share * 100.0).round() / 100.0,
        })
    }
}
