//! 技能快照聚合：把作答历史归约为按领域 / 难度统计的正确率与平均用时

use std::collections::{BTreeMap, HashMap};

use crate::selection::types::{AttemptOutcome, Difficulty, QuestionMeta, SkillSnapshot};
use crate::store::operations::attempts::AttemptRecord;
use crate::store::operations::questions::Question;

#[derive(Debug, Default, Clone, Copy)]
struct Counter {
    count: u64,
    correct: u64,
    time: f64,
}

impl Counter {
    fn push(&mut self, correct: bool, time_taken: f64) {
        self.count += 1;
        if correct {
            self.correct += 1;
        }
        self.time += time_taken;
    }

    fn accuracy(&self) -> f64 {
        self.correct as f64 / self.count as f64
    }

    fn avg_time(&self) -> f64 {
        self.time / self.count as f64
    }
}

/// Single pass over the history; ratios are derived once at the end.
pub fn compute_stats(attempts: &[AttemptOutcome<'_>]) -> SkillSnapshot {
    if attempts.is_empty() {
        return SkillSnapshot::default();
    }

    let mut overall = Counter::default();
    let mut by_domain: HashMap<&str, Counter> = HashMap::new();
    let mut by_difficulty: HashMap<Difficulty, Counter> = HashMap::new();

    for attempt in attempts {
        overall.push(attempt.correct, attempt.time_taken);
        by_domain
            .entry(attempt.meta.domain)
            .or_default()
            .push(attempt.correct, attempt.time_taken);
        by_difficulty
            .entry(attempt.meta.difficulty)
            .or_default()
            .push(attempt.correct, attempt.time_taken);
    }

    let mut accuracy_by_domain = BTreeMap::new();
    let mut avg_time_by_domain = BTreeMap::new();
    for (domain, counter) in &by_domain {
        accuracy_by_domain.insert(domain.to_string(), counter.accuracy());
        avg_time_by_domain.insert(domain.to_string(), counter.avg_time());
    }

    let accuracy_by_difficulty = by_difficulty
        .into_iter()
        .map(|(difficulty, counter)| (difficulty, counter.accuracy()))
        .collect();

    SkillSnapshot {
        overall_accuracy: overall.accuracy(),
        accuracy_by_domain,
        accuracy_by_difficulty,
        avg_time_by_domain,
    }
}

/// Joins stored attempts with the question bank. Attempts whose question no
/// longer exists carry no domain or difficulty and are left out.
pub fn join_attempts<'a>(
    attempts: &[AttemptRecord],
    questions: &'a HashMap<u64, Question>,
) -> Vec<AttemptOutcome<'a>> {
    let mut outcomes = Vec::with_capacity(attempts.len());
    for attempt in attempts {
        let Some(question) = questions.get(&attempt.question_id) else {
            tracing::warn!(
                attempt_id = %attempt.id,
                question_id = attempt.question_id,
                "Skipping attempt for unknown question"
            );
            continue;
        };
        outcomes.push(AttemptOutcome {
            correct: attempt.correct,
            time_taken: attempt.time_taken,
            meta: QuestionMeta {
                domain: &question.domain,
                difficulty: question.difficulty,
            },
        });
    }
    outcomes
}
