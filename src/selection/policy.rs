//! 选题策略：诊断阶段随机抽题，自适应阶段按模型预测概率瞄准中等难度区间

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::selection::config::SelectionConfig;
use crate::selection::features;
use crate::selection::model::LogisticModel;
use crate::selection::types::{Difficulty, FeatureVector, SkillSnapshot};
use crate::store::operations::questions::Question;

fn unattempted<'q>(questions: &'q [Question], attempted: &BTreeSet<u64>) -> Vec<&'q Question> {
    questions
        .iter()
        .filter(|q| !attempted.contains(&q.id))
        .collect()
}

/// Uniform random choice over the unattempted questions. `None` means the
/// diagnostic pool is exhausted.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiagnosticSelector;

impl DiagnosticSelector {
    pub fn next<'q, R: Rng + ?Sized>(
        &self,
        questions: &'q [Question],
        attempted: &BTreeSet<u64>,
        rng: &mut R,
    ) -> Option<&'q Question> {
        unattempted(questions, attempted).choose(rng).copied()
    }
}

#[derive(Debug, Clone)]
pub struct AdaptiveSelector<'a> {
    config: &'a SelectionConfig,
}

impl<'a> AdaptiveSelector<'a> {
    pub fn new(config: &'a SelectionConfig) -> Self {
        Self { config }
    }

    /// Index of the probability closest to `target`, preferring entries inside
    /// the moderate window. The earliest index wins ties; non-finite entries
    /// are never chosen.
    pub fn pick_index(&self, probs: &[f64]) -> Option<usize> {
        let target = self.config.target;
        let argmin = |accept: &dyn Fn(f64) -> bool| {
            let mut best: Option<(usize, f64)> = None;
            for (idx, &p) in probs.iter().enumerate() {
                if !p.is_finite() || !accept(p) {
                    continue;
                }
                let distance = (p - target).abs();
                match best {
                    Some((_, best_distance)) if distance >= best_distance => {}
                    _ => best = Some((idx, distance)),
                }
            }
            best.map(|(idx, _)| idx)
        };

        argmin(&|p| self.config.in_moderate_window(p)).or_else(|| argmin(&|_| true))
    }

    pub fn next<'q, R: Rng + ?Sized>(
        &self,
        questions: &'q [Question],
        attempted: &BTreeSet<u64>,
        snapshot: &SkillSnapshot,
        model: &LogisticModel,
        rng: &mut R,
    ) -> Option<&'q Question> {
        let candidates = unattempted(questions, attempted);
        if candidates.is_empty() {
            return None;
        }

        let rows: Vec<FeatureVector> = candidates
            .iter()
            .map(|q| features::encode(snapshot, q.meta(), self.config))
            .collect();
        let probs = model.predict_batch(&rows);

        if let Some(idx) = self.pick_index(&probs) {
            tracing::debug!(
                question_id = candidates[idx].id,
                probability = probs[idx],
                candidates = candidates.len(),
                "Adaptive pick"
            );
            return Some(candidates[idx]);
        }

        // Only reachable when no candidate produced a finite probability.
        tracing::warn!(
            candidates = candidates.len(),
            "No finite probability for any candidate, falling back to random pick"
        );
        let medium: Vec<&Question> = candidates
            .iter()
            .copied()
            .filter(|q| q.difficulty == Difficulty::Medium)
            .collect();
        medium
            .choose(rng)
            .or_else(|| candidates.choose(rng))
            .copied()
    }
}
