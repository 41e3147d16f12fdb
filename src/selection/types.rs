//! 选题引擎的核心数据类型：难度、技能快照、会话与阶段

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of features the scoring model consumes. Changing the layout of
/// [`FeatureVector`] requires a new model artifact version.
pub const FEATURE_DIM: usize = 6;

/// `[overall_accuracy, accuracy_on_domain, accuracy_on_difficulty,
///   avg_time_on_domain, difficulty_encoded, domain_encoded]`
pub type FeatureVector = [f64; FEATURE_DIM];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Ordinal encoding used as a model feature.
    pub fn ordinal(self) -> f64 {
        match self {
            Self::Easy => 0.0,
            Self::Medium => 1.0,
            Self::Hard => 2.0,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The slice of a question the encoder looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionMeta<'a> {
    pub domain: &'a str,
    pub difficulty: Difficulty,
}

/// One answered question joined with the metadata of the question it answered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptOutcome<'a> {
    pub correct: bool,
    pub time_taken: f64,
    pub meta: QuestionMeta<'a>,
}

/// Point-in-time aggregate of a learner's history. A domain or difficulty
/// missing from a map means "never attempted", which is not the same as 0%.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillSnapshot {
    pub overall_accuracy: f64,
    pub accuracy_by_domain: BTreeMap<String, f64>,
    pub accuracy_by_difficulty: BTreeMap<Difficulty, f64>,
    pub avg_time_by_domain: BTreeMap<String, f64>,
}

/// Session phase. Transitions only `Diagnostic -> Adaptive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Diagnostic,
    Adaptive,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: u64,
    pub learner_name: String,
    /// Attempted ids in first-seen order; `attempted_set` backs membership checks.
    pub attempted: Vec<u64>,
    #[serde(skip)]
    pub attempted_set: BTreeSet<u64>,
    pub diagnostic_done: bool,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: u64, learner_name: &str) -> Self {
        Self {
            id,
            learner_name: learner_name.to_string(),
            attempted: Vec::new(),
            attempted_set: BTreeSet::new(),
            diagnostic_done: false,
            created_at: Utc::now(),
        }
    }

    pub fn phase(&self) -> Phase {
        if self.diagnostic_done {
            Phase::Adaptive
        } else {
            Phase::Diagnostic
        }
    }

    pub fn has_attempted(&self, question_id: u64) -> bool {
        self.attempted_set.contains(&question_id)
    }

    /// Returns `false` if the question was already recorded.
    pub fn record_attempt(&mut self, question_id: u64) -> bool {
        if !self.attempted_set.insert(question_id) {
            return false;
        }
        self.attempted.push(question_id);
        true
    }

    /// Returns `true` only on the call that performed the transition.
    pub fn mark_diagnostic_done(&mut self) -> bool {
        let flipped = !self.diagnostic_done;
        self.diagnostic_done = true;
        flipped
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub learner_name: String,
    pub attempted_count: usize,
    pub attempted_ids: Vec<u64>,
}
