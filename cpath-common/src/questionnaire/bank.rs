//! Static question bank
//!
//! The bank is read once at startup, either from the compiled-in
//! `question_bank.toml` or from an operator-supplied file with the same
//! layout. Section membership is an explicit list of question ids per
//! section, checked at load time so that reordering the `[[questions]]`
//! entries can never shift a question into a different section.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

use super::answers::Tag;
use crate::Result;

/// Number of sections in a bank
pub const SECTION_COUNT: usize = 5;

/// Number of questions in every section
pub const QUESTIONS_PER_SECTION: usize = 5;

/// Total number of questions in a bank
pub const QUESTION_COUNT: usize = SECTION_COUNT * QUESTIONS_PER_SECTION;

const BUILTIN_BANK: &str = include_str!("question_bank.toml");

/// One selectable answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub value: Tag,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<QuestionOption>,
}

/// Named group of question ids shown together as one screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BankFile {
    sections: Vec<Section>,
    questions: Vec<Question>,
}

/// Structural problems found while loading a bank
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("expected {expected} sections, found {found}")]
    SectionCount { expected: usize, found: usize },

    #[error("section {section} must list {expected} questions, found {found}")]
    SectionSize {
        section: usize,
        expected: usize,
        found: usize,
    },

    #[error("expected {expected} questions, found {found}")]
    QuestionCount { expected: usize, found: usize },

    #[error("duplicate question id {0:?}")]
    DuplicateQuestion(String),

    #[error("section {section} references unknown question {id:?}")]
    UnknownSectionMember { section: usize, id: String },

    #[error("question {0:?} is listed in more than one section")]
    DuplicateMembership(String),

    #[error("question {0:?} has no options")]
    NoOptions(String),

    #[error("question {question:?} offers tag {tag} more than once")]
    DuplicateOption { question: String, tag: Tag },
}

/// Immutable, validated question bank
#[derive(Debug, Clone)]
pub struct QuestionBank {
    sections: Vec<Section>,
    questions: Vec<Question>,
    by_id: HashMap<String, usize>,
    section_of: HashMap<String, usize>,
}

impl QuestionBank {
    /// Load the compiled-in bank
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_BANK)
    }

    /// Load a bank from a TOML file on disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a bank document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: BankFile = toml::from_str(content)?;
        Ok(Self::from_parts(file.sections, file.questions)?)
    }

    /// Validate sections and questions into a bank
    pub fn from_parts(
        sections: Vec<Section>,
        questions: Vec<Question>,
    ) -> std::result::Result<Self, BankError> {
        if sections.len() != SECTION_COUNT {
            return Err(BankError::SectionCount {
                expected: SECTION_COUNT,
                found: sections.len(),
            });
        }
        if questions.len() != QUESTION_COUNT {
            return Err(BankError::QuestionCount {
                expected: QUESTION_COUNT,
                found: questions.len(),
            });
        }

        let mut by_id = HashMap::with_capacity(questions.len());
        for (idx, question) in questions.iter().enumerate() {
            if by_id.insert(question.id.clone(), idx).is_some() {
                return Err(BankError::DuplicateQuestion(question.id.clone()));
            }
            if question.options.is_empty() {
                return Err(BankError::NoOptions(question.id.clone()));
            }
            let mut seen = HashSet::new();
            for option in &question.options {
                if !seen.insert(option.value) {
                    return Err(BankError::DuplicateOption {
                        question: question.id.clone(),
                        tag: option.value,
                    });
                }
            }
        }

        let mut section_of = HashMap::with_capacity(questions.len());
        for (section_idx, section) in sections.iter().enumerate() {
            if section.questions.len() != QUESTIONS_PER_SECTION {
                return Err(BankError::SectionSize {
                    section: section_idx,
                    expected: QUESTIONS_PER_SECTION,
                    found: section.questions.len(),
                });
            }
            for id in &section.questions {
                if !by_id.contains_key(id) {
                    return Err(BankError::UnknownSectionMember {
                        section: section_idx,
                        id: id.clone(),
                    });
                }
                if section_of.insert(id.clone(), section_idx).is_some() {
                    return Err(BankError::DuplicateMembership(id.clone()));
                }
            }
        }

        // 5 sections x 5 distinct known ids == 25 questions, so every
        // question belongs to exactly one section at this point.

        Ok(Self {
            sections,
            questions,
            by_id,
            section_of,
        })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Questions in bank order
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.by_id.get(id).map(|&idx| &self.questions[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Section index a question belongs to
    pub fn section_of(&self, id: &str) -> Option<usize> {
        self.section_of.get(id).copied()
    }

    /// Question ids of one section, in display order
    pub fn section_question_ids(&self, index: usize) -> &[String] {
        self.sections
            .get(index)
            .map(|s| s.questions.as_slice())
            .unwrap_or(&[])
    }

    /// Questions of one section, in display order
    pub fn section_questions(&self, index: usize) -> impl Iterator<Item = &Question> {
        self.section_question_ids(index)
            .iter()
            .filter_map(move |id| self.question(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn sample_parts() -> (Vec<Section>, Vec<Question>) {
        let questions: Vec<Question> = (1..=QUESTION_COUNT)
            .map(|n| Question {
                id: format!("q{:02}", n),
                text: format!("Question {}", n),
                options: Tag::all()
                    .into_iter()
                    .map(|tag| QuestionOption {
                        value: tag,
                        label: tag.course_name().to_string(),
                    })
                    .collect(),
            })
            .collect();
        let sections = (0..SECTION_COUNT)
            .map(|s| Section {
                title: format!("Section {}", s + 1),
                questions: questions[s * QUESTIONS_PER_SECTION..(s + 1) * QUESTIONS_PER_SECTION]
                    .iter()
                    .map(|q| q.id.clone())
                    .collect(),
            })
            .collect();
        (sections, questions)
    }

    #[test]
    fn test_builtin_bank_loads() {
        let bank = QuestionBank::builtin().expect("built-in bank should be valid");
        assert_eq!(bank.section_count(), SECTION_COUNT);
        assert_eq!(bank.question_count(), QUESTION_COUNT);

        for question in bank.questions() {
            let tags: Vec<Tag> = question.options.iter().map(|o| o.value).collect();
            assert_eq!(tags, Tag::all().to_vec(), "{} should offer every tag once", question.id);
        }
    }

    #[test]
    fn test_builtin_section_mapping_is_explicit() {
        let bank = QuestionBank::builtin().unwrap();
        assert_eq!(bank.section_question_ids(0), &["q01", "q02", "q03", "q04", "q05"]);
        assert_eq!(bank.section_question_ids(4), &["q21", "q22", "q23", "q24", "q25"]);
        assert_eq!(bank.section_of("q13"), Some(2));
        assert_eq!(bank.section_of("q99"), None);
        assert!(bank.section_question_ids(5).is_empty());
    }

    #[test]
    fn test_reordered_questions_keep_sections() {
        let (sections, mut questions) = sample_parts();
        questions.reverse();
        let bank = QuestionBank::from_parts(sections, questions).unwrap();

        assert_eq!(bank.section_of("q01"), Some(0));
        assert_eq!(bank.section_of("q25"), Some(4));
        let first: Vec<&str> = bank.section_questions(0).map(|q| q.id.as_str()).collect();
        assert_eq!(first, vec!["q01", "q02", "q03", "q04", "q05"]);
    }

    #[test]
    fn test_rejects_wrong_section_count() {
        let (mut sections, questions) = sample_parts();
        sections.pop();
        let err = QuestionBank::from_parts(sections, questions).unwrap_err();
        assert_eq!(err, BankError::SectionCount { expected: 5, found: 4 });
    }

    #[test]
    fn test_rejects_duplicate_question_id() {
        let (sections, mut questions) = sample_parts();
        questions[3].id = "q01".to_string();
        let err = QuestionBank::from_parts(sections, questions).unwrap_err();
        assert_eq!(err, BankError::DuplicateQuestion("q01".to_string()));
    }

    #[test]
    fn test_rejects_unknown_section_member() {
        let (mut sections, questions) = sample_parts();
        sections[1].questions[2] = "nope".to_string();
        let err = QuestionBank::from_parts(sections, questions).unwrap_err();
        assert!(matches!(err, BankError::UnknownSectionMember { section: 1, .. }));
    }

    #[test]
    fn test_rejects_question_in_two_sections() {
        let (mut sections, questions) = sample_parts();
        sections[1].questions[0] = "q01".to_string();
        let err = QuestionBank::from_parts(sections, questions).unwrap_err();
        assert_eq!(err, BankError::DuplicateMembership("q01".to_string()));
    }

    #[test]
    fn test_rejects_repeated_option_tag() {
        let (sections, mut questions) = sample_parts();
        questions[0].options[1].value = Tag::AaHl;
        let err = QuestionBank::from_parts(sections, questions).unwrap_err();
        assert!(matches!(err, BankError::DuplicateOption { .. }));
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let result = QuestionBank::from_toml_str("sections = 3");
        assert!(matches!(result, Err(Error::TomlParse(_))));
    }

    #[test]
    fn test_unknown_tag_in_file_is_rejected() {
        let doc = BUILTIN_BANK.replacen("value = \"ai_sl\"", "value = \"ai_xl\"", 1);
        assert!(matches!(QuestionBank::from_toml_str(&doc), Err(Error::TomlParse(_))));
    }
}
