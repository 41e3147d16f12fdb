use serde::{Deserialize, Serialize};

/// Tunables of the adaptive policy and the feature encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionConfig {
    /// Lower bound of the moderate window (inclusive).
    pub moderate_low: f64,
    /// Upper bound of the moderate window (inclusive).
    pub moderate_high: f64,
    /// Probability the adaptive policy steers towards.
    pub target: f64,
    /// Assumed pace for a domain the learner has never answered.
    pub default_avg_time: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            moderate_low: 0.4,
            moderate_high: 0.7,
            target: 0.55,
            default_avg_time: 30.0,
        }
    }
}

impl SelectionConfig {
    pub fn validate(&self) -> Result<(), String> {
        let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if !in_unit(self.moderate_low) || !in_unit(self.moderate_high) {
            return Err(format!(
                "moderate window bounds must lie in [0, 1], got [{}, {}]",
                self.moderate_low, self.moderate_high
            ));
        }
        if self.moderate_low > self.moderate_high {
            return Err(format!(
                "moderate window is empty: low {} > high {}",
                self.moderate_low, self.moderate_high
            ));
        }
        if !in_unit(self.target) {
            return Err(format!("target must lie in [0, 1], got {}", self.target));
        }
        if !self.default_avg_time.is_finite() || self.default_avg_time < 0.0 {
            return Err(format!(
                "default_avg_time must be a non-negative number, got {}",
                self.default_avg_time
            ));
        }
        Ok(())
    }

    pub fn in_moderate_window(&self, p: f64) -> bool {
        self.moderate_low <= p && p <= self.moderate_high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(SelectionConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_window_is_rejected() {
        let cfg = SelectionConfig {
            moderate_low: 0.8,
            moderate_high: 0.2,
            ..SelectionConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn negative_pace_is_rejected() {
        let cfg = SelectionConfig {
            default_avg_time: -1.0,
            ..SelectionConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let cfg = SelectionConfig::default();
        assert!(cfg.in_moderate_window(0.4));
        assert!(cfg.in_moderate_window(0.7));
        assert!(!cfg.in_moderate_window(0.39));
        assert!(!cfg.in_moderate_window(0.71));
    }
}
