//! Course tags and the per-question answer map

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Mathematics course variant an option votes for
///
/// Analysis & Approaches (AA) or Applications & Interpretation (AI), each at
/// Higher (HL) or Standard (SL) level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    AaHl,
    AaSl,
    AiHl,
    AiSl,
}

impl Tag {
    /// All tags in declaration order
    pub fn all() -> [Tag; 4] {
        [Tag::AaHl, Tag::AaSl, Tag::AiHl, Tag::AiSl]
    }

    /// Wire/storage code (`aa_hl`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::AaHl => "aa_hl",
            Tag::AaSl => "aa_sl",
            Tag::AiHl => "ai_hl",
            Tag::AiSl => "ai_sl",
        }
    }

    /// Human-readable course name
    pub fn course_name(&self) -> &'static str {
        match self {
            Tag::AaHl => "Analysis & Approaches HL",
            Tag::AaSl => "Analysis & Approaches SL",
            Tag::AiHl => "Applications & Interpretation HL",
            Tag::AiSl => "Applications & Interpretation SL",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Tag::AaHl => 0,
            Tag::AaSl => 1,
            Tag::AiHl => 2,
            Tag::AiSl => 3,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a string that is not a canonical tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown course tag: {0:?}")]
pub struct UnknownTag(pub String);

impl FromStr for Tag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aa_hl" => Ok(Tag::AaHl),
            "aa_sl" => Ok(Tag::AaSl),
            "ai_hl" => Ok(Tag::AiHl),
            "ai_sl" => Ok(Tag::AiSl),
            other => Err(UnknownTag(other.to_string())),
        }
    }
}

/// Selected tags per question id, in selection order
///
/// Entries hold at most [`AnswerMap::MAX_SELECTIONS`] tags. A question whose
/// last selection is removed drops out of the map entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap {
    entries: BTreeMap<String, Vec<Tag>>,
}

impl AnswerMap {
    /// Maximum number of tags selectable for a single question
    pub const MAX_SELECTIONS: usize = 2;

    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle `tag` for `question_id` and return the resulting selections
    ///
    /// - already selected: removed
    /// - entry full: oldest selection evicted, then `tag` appended
    /// - otherwise: `tag` appended
    ///
    /// Does not check `question_id` against a bank; see
    /// [`Questionnaire::toggle_answer`](super::Questionnaire::toggle_answer).
    pub fn toggle(&mut self, question_id: &str, tag: Tag) -> &[Tag] {
        let entry = self.entries.entry(question_id.to_string()).or_default();

        if let Some(pos) = entry.iter().position(|selected| *selected == tag) {
            entry.remove(pos);
        } else {
            if entry.len() >= Self::MAX_SELECTIONS {
                entry.remove(0);
            }
            entry.push(tag);
        }

        if entry.is_empty() {
            self.entries.remove(question_id);
            return &[];
        }

        self.selections(question_id)
    }

    /// Selections for one question (empty if unanswered)
    pub fn selections(&self, question_id: &str) -> &[Tag] {
        self.entries
            .get(question_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        !self.selections(question_id).is_empty()
    }

    /// Number of questions with at least one selection
    pub fn answered_count(&self) -> usize {
        self.entries.values().filter(|tags| !tags.is_empty()).count()
    }

    /// Number of selected tags across all questions
    pub fn total_selections(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Iterate `(question_id, selections)` in question id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Tag])> {
        self.entries
            .iter()
            .map(|(id, tags)| (id.as_str(), tags.as_slice()))
    }

    pub fn question_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
