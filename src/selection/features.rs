//! Feature encoding: one candidate question plus the learner snapshot become a fixed-width model input.

use sha2::{Digest, Sha256};

use crate::selection::config::SelectionConfig;
use crate::selection::types::{FeatureVector, QuestionMeta, SkillSnapshot};

/// Number of buckets the domain tag is reduced to.
pub const DOMAIN_BUCKETS: u64 = 100;

/// Content hash of the domain tag, stable across processes and machines:
/// first eight bytes of the SHA-256 digest, big-endian, modulo [`DOMAIN_BUCKETS`].
pub fn encode_domain(domain: &str) -> u64 {
    let digest = Sha256::digest(domain.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head) % DOMAIN_BUCKETS
}

/// Builds the model input for one candidate question.
///
/// Unseen domains and difficulties read as the learner's overall accuracy;
/// unseen domains get `config.default_avg_time` as their pace.
pub fn encode(
    snapshot: &SkillSnapshot,
    question: QuestionMeta<'_>,
    config: &SelectionConfig,
) -> FeatureVector {
    let overall = snapshot.overall_accuracy;
    let acc_domain = snapshot
        .accuracy_by_domain
        .get(question.domain)
        .copied()
        .unwrap_or(overall);
    let acc_difficulty = snapshot
        .accuracy_by_difficulty
        .get(&question.difficulty)
        .copied()
        .unwrap_or(overall);
    let avg_time = snapshot
        .avg_time_by_domain
        .get(question.domain)
        .copied()
        .unwrap_or(config.default_avg_time);

    [
        overall,
        acc_domain,
        acc_difficulty,
        avg_time,
        question.difficulty.ordinal(),
        encode_domain(question.domain) as f64,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::types::Difficulty;

    #[test]
    fn domain_hash_is_content_stable() {
        assert_eq!(encode_domain("calculus"), 9);
        assert_eq!(encode_domain("algebra"), 0);
        assert_eq!(encode_domain("linear_algebra"), 72);
        assert_eq!(encode_domain("number_theory"), 54);
        assert_eq!(encode_domain(""), 52);
    }

    #[test]
    fn unseen_keys_fall_back_to_overall() {
        let snapshot = SkillSnapshot {
            overall_accuracy: 0.6,
            ..SkillSnapshot::default()
        };
        let meta = QuestionMeta {
            domain: "topology",
            difficulty: Difficulty::Hard,
        };
        let features = encode(&snapshot, meta, &SelectionConfig::default());

        assert_eq!(features.len(), 6);
        assert_eq!(features[0], 0.6);
        assert_eq!(features[1], 0.6);
        assert_eq!(features[2], 0.6);
        assert_eq!(features[3], 30.0);
        assert_eq!(features[4], 2.0);
        assert_eq!(features[5], encode_domain("topology") as f64);
    }

    #[test]
    fn seen_keys_use_snapshot_values() {
        let mut snapshot = SkillSnapshot {
            overall_accuracy: 0.75,
            ..SkillSnapshot::default()
        };
        snapshot
            .accuracy_by_domain
            .insert("calculus".to_string(), 0.0);
        snapshot
            .avg_time_by_domain
            .insert("calculus".to_string(), 42.0);
        snapshot
            .accuracy_by_difficulty
            .insert(Difficulty::Easy, 0.5);

        let meta = QuestionMeta {
            domain: "calculus",
            difficulty: Difficulty::Easy,
        };
        let features = encode(&snapshot, meta, &SelectionConfig::default());
        assert_eq!(features, [0.75, 0.0, 0.5, 42.0, 0.0, 9.0]);
    }
}
