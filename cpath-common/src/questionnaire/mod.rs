//! Question bank, answer collection and section navigation

pub mod answers;
pub mod bank;
pub mod engine;

pub use answers::{AnswerMap, Tag, UnknownTag};
pub use bank::{
    BankError, Question, QuestionBank, QuestionOption, Section, QUESTIONS_PER_SECTION,
    QUESTION_COUNT, SECTION_COUNT,
};
pub use engine::{AdvanceOutcome, EngineError, Progress, Questionnaire, SectionGap, SubmissionPhase};
