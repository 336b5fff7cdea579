//! Questionnaire state machine
//!
//! Tracks the current section, the answer map and whether a validation
//! summary has been requested. Navigation between sections is free (advance,
//! retreat, jump); only the final submission is gated on every question
//! having at least one selection.
//!
//! ```text
//!   section 0 <-> section 1 <-> ... <-> section 4 --advance(complete)--> in flight
//!        ^___________ jump_to(any) ___________^                           |   |
//!                                                      abort_submission  |   | complete_submission
//!                                       section 4 (editing) <------------+   v
//!                                                                        submitted
//! ```

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use super::answers::{AnswerMap, Tag};
use super::bank::QuestionBank;

/// Where the questionnaire is relative to the persistence hand-off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    /// Answers may change; no submission running
    Editing,
    /// A submission has been handed to the sink and has not resolved yet
    InFlight,
    /// Terminal: results persisted
    Submitted,
}

/// Unanswered questions in one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionGap {
    pub section: usize,
    pub title: String,
    pub unanswered: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

/// Result of [`Questionnaire::advance`]
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// Moved forward to `section`
    Moved { section: usize },
    /// Last section reached with gaps; validation summary requested
    Blocked { gaps: Vec<SectionGap> },
    /// Form complete; submission is now in flight with these answers
    Submit(AnswerMap),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Question id not present in the bank
    #[error("question {0:?} is not part of the question bank")]
    UnknownQuestion(String),

    #[error("section {index} is out of range (0..{count})")]
    SectionOutOfRange { index: usize, count: usize },

    /// Submission requested while questions remain unanswered
    #[error("{unanswered} question(s) still unanswered")]
    Incomplete { unanswered: usize },

    #[error("a submission is already in progress")]
    SubmissionInFlight,

    #[error("questionnaire has already been submitted")]
    AlreadySubmitted,
}

/// One student's in-progress questionnaire
#[derive(Debug, Clone)]
pub struct Questionnaire {
    bank: Arc<QuestionBank>,
    current_section: usize,
    answers: AnswerMap,
    validation_requested: bool,
    phase: SubmissionPhase,
}

impl Questionnaire {
    pub fn new(bank: Arc<QuestionBank>) -> Self {
        Self {
            bank,
            current_section: 0,
            answers: AnswerMap::new(),
            validation_requested: false,
            phase: SubmissionPhase::Editing,
        }
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn current_section(&self) -> usize {
        self.current_section
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn validation_requested(&self) -> bool {
        self.validation_requested
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    fn last_section(&self) -> usize {
        self.bank.section_count().saturating_sub(1)
    }

    fn ensure_editable(&self) -> Result<(), EngineError> {
        match self.phase {
            SubmissionPhase::Editing => Ok(()),
            SubmissionPhase::InFlight => Err(EngineError::SubmissionInFlight),
            SubmissionPhase::Submitted => Err(EngineError::AlreadySubmitted),
        }
    }

    /// Select or deselect `tag` for `question_id`
    ///
    /// See [`AnswerMap::toggle`] for the selection rules. Clears any pending
    /// validation summary.
    pub fn toggle_answer(&mut self, question_id: &str, tag: Tag) -> Result<&[Tag], EngineError> {
        self.ensure_editable()?;
        if !self.bank.contains(question_id) {
            return Err(EngineError::UnknownQuestion(question_id.to_string()));
        }

        self.validation_requested = false;
        Ok(self.answers.toggle(question_id, tag))
    }

    /// Unanswered question count for one section (0 for unknown sections)
    pub fn unanswered_in_section(&self, index: usize) -> usize {
        self.bank
            .section_question_ids(index)
            .iter()
            .filter(|id| !self.answers.is_answered(id))
            .count()
    }

    pub fn is_section_complete(&self, index: usize) -> bool {
        index < self.bank.section_count() && self.unanswered_in_section(index) == 0
    }

    pub fn is_form_complete(&self) -> bool {
        (0..self.bank.section_count()).all(|idx| self.is_section_complete(idx))
    }

    pub fn progress(&self) -> Progress {
        let answered = self
            .bank
            .questions()
            .iter()
            .filter(|q| self.answers.is_answered(&q.id))
            .count();

        Progress {
            answered,
            total: self.bank.question_count(),
        }
    }

    /// Every section with at least one unanswered question
    pub fn section_gaps(&self) -> Vec<SectionGap> {
        self.bank
            .sections()
            .iter()
            .enumerate()
            .filter_map(|(idx, section)| {
                let unanswered = self.unanswered_in_section(idx);
                (unanswered > 0).then(|| SectionGap {
                    section: idx,
                    title: section.title.clone(),
                    unanswered,
                })
            })
            .collect()
    }

    /// Move forward, or attempt submission from the last section
    ///
    /// Before the last section this always moves. On the last section an
    /// incomplete form stays put and reports its gaps; a complete form
    /// enters [`SubmissionPhase::InFlight`] and yields the answers to submit.
    pub fn advance(&mut self) -> Result<AdvanceOutcome, EngineError> {
        self.ensure_editable()?;

        if self.current_section < self.last_section() {
            self.current_section += 1;
            return Ok(AdvanceOutcome::Moved {
                section: self.current_section,
            });
        }

        if !self.is_form_complete() {
            self.validation_requested = true;
            return Ok(AdvanceOutcome::Blocked {
                gaps: self.section_gaps(),
            });
        }

        self.begin_submission().map(AdvanceOutcome::Submit)
    }

    /// Move back one section; no-op on the first section
    pub fn retreat(&mut self) -> Result<usize, EngineError> {
        if self.phase == SubmissionPhase::Submitted {
            return Err(EngineError::AlreadySubmitted);
        }
        self.current_section = self.current_section.saturating_sub(1);
        Ok(self.current_section)
    }

    /// Jump straight to any section, bypassing completeness checks
    pub fn jump_to(&mut self, index: usize) -> Result<usize, EngineError> {
        if self.phase == SubmissionPhase::Submitted {
            return Err(EngineError::AlreadySubmitted);
        }
        let count = self.bank.section_count();
        if index >= count {
            return Err(EngineError::SectionOutOfRange { index, count });
        }
        self.current_section = index;
        Ok(index)
    }

    /// Start a submission (or a retry after a failed one)
    ///
    /// Fails when the form is incomplete or a submission is already running.
    pub fn begin_submission(&mut self) -> Result<AnswerMap, EngineError> {
        self.ensure_editable()?;

        if !self.is_form_complete() {
            self.validation_requested = true;
            let progress = self.progress();
            return Err(EngineError::Incomplete {
                unanswered: progress.total - progress.answered,
            });
        }

        self.phase = SubmissionPhase::InFlight;
        Ok(self.answers.clone())
    }

    /// Mark the in-flight submission as persisted
    pub fn complete_submission(&mut self) {
        if self.phase == SubmissionPhase::InFlight {
            self.phase = SubmissionPhase::Submitted;
        }
    }

    /// Return to editing after a failed submission; answers are kept
    pub fn abort_submission(&mut self) {
        if self.phase == SubmissionPhase::InFlight {
            self.phase = SubmissionPhase::Editing;
        }
    }
}
