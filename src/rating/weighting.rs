//! Match weighting policy
//!
//! Computes the importance, event-quality and season-position multipliers
//! applied to each match in a team's fold.

use crate::config::rating::{RatingConfig, TierWeights};
use crate::types::{CompetitionTier, MatchRecord};
use serde::{Deserialize, Serialize};

/// Which tier table a strategy weights matches with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportancePolicy {
    /// Playoff tiers weigh more
    Recency,
    /// Qualification weighs more
    Legacy,
}

/// Multipliers for a single match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWeights {
    pub importance: f64,
    pub event_quality: f64,
    pub decay: f64,
}

/// Event code with the leading season digits stripped ("2024cur" → "cur")
pub fn event_code(event_key: &str) -> &str {
    event_key.trim_start_matches(|c: char| c.is_ascii_digit())
}

#[derive(Debug, Clone)]
pub struct WeightingPolicy<'c> {
    config: &'c RatingConfig,
    tiers: TierWeights,
}

impl<'c> WeightingPolicy<'c> {
    pub fn new(config: &'c RatingConfig, policy: ImportancePolicy) -> Self {
        let tiers = match policy {
            ImportancePolicy::Recency => config.recency_tiers,
            ImportancePolicy::Legacy => config.legacy_tiers,
        };
        Self { config, tiers }
    }

    pub fn importance(&self, tier: CompetitionTier) -> f64 {
        self.tiers.weight(tier)
    }

    /// Division and finale events share the same factor
    pub fn event_quality(&self, event_key: &str) -> f64 {
        let code = event_code(event_key);
        let listed = |codes: &[String]| codes.iter().any(|c| c.eq_ignore_ascii_case(code));

        if listed(&self.config.division_event_codes) || listed(&self.config.finale_event_codes) {
            self.config.event_quality_factor
        } else {
            1.0
        }
    }

    /// Weight of the `index`-th (1-based) of `total` matches.
    ///
    /// Grows quadratically towards `event_quality` over the season.
    pub fn decay(&self, event_quality: f64, index: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let position = index as f64 / total as f64;
        event_quality * position * position
    }

    pub fn weights_for(&self, record: &MatchRecord, index: usize, total: usize) -> MatchWeights {
        let event_quality = self.event_quality(&record.event_key);
        MatchWeights {
            importance: self.importance(record.tier),
            event_quality,
            decay: self.decay(event_quality, index, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_code() {
        assert_eq!(event_code("2024cur"), "cur");
        assert_eq!(event_code("2019cmptx"), "cmptx");
        assert_eq!(event_code("casj"), "casj");
    }

    #[test]
    fn test_importance_policies() {
        let config = RatingConfig::default();
        let recency = WeightingPolicy::new(&config, ImportancePolicy::Recency);
        let legacy = WeightingPolicy::new(&config, ImportancePolicy::Legacy);

        assert_eq!(recency.importance(CompetitionTier::Qualification), 1.0);
        assert_eq!(recency.importance(CompetitionTier::Quarterfinal), 1.1);
        assert_eq!(recency.importance(CompetitionTier::Semifinal), 1.2);
        assert_eq!(recency.importance(CompetitionTier::Final), 1.2);
        assert!(
            legacy.importance(CompetitionTier::Qualification)
                > legacy.importance(CompetitionTier::Final)
        );
    }

    #[test]
    fn test_division_and_finale_share_factor() {
        let config = RatingConfig::default();
        let policy = WeightingPolicy::new(&config, ImportancePolicy::Recency);

        assert_eq!(policy.event_quality("2024cur"), 0.85);
        assert_eq!(policy.event_quality("2024cmptx"), 0.85);
        assert_eq!(policy.event_quality("2024casj"), 1.0);
    }

    #[test]
    fn test_decay_grows_through_season() {
        let config = RatingConfig::default();
        let policy = WeightingPolicy::new(&config, ImportancePolicy::Recency);

        assert!((policy.decay(1.0, 1, 3) - 1.0 / 9.0).abs() < 1e-12);
        assert!((policy.decay(1.0, 2, 3) - 4.0 / 9.0).abs() < 1e-12);
        assert_eq!(policy.decay(1.0, 3, 3), 1.0);
        assert_eq!(policy.decay(0.85, 3, 3), 0.85);
        assert_eq!(policy.decay(1.0, 1, 0), 0.0);
    }
}
