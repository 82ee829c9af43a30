//! Rating engine configuration
//!
//! Every constant the engine uses lives here so a season can be re-rated
//! with different tuning without touching the fold itself.

use crate::error::EngineError;
use crate::types::CompetitionTier;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Point values used to turn a score breakdown into phase estimates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseWeights {
    pub auto_amp_note: f64,
    pub auto_speaker_note: f64,
    /// Multiplier applied to the alliance mobility points
    pub auto_leave: f64,
    pub teleop_amp_note: f64,
    pub teleop_speaker_note: f64,
    pub teleop_speaker_note_amplified: f64,
    pub trap_note: f64,
    /// End-state label to points; unknown labels score zero
    pub end_game_points: HashMap<String, f64>,
}

impl Default for PhaseWeights {
    fn default() -> Self {
        let end_game_points = [
            ("Parked", 1.0),
            ("Onstage", 3.0),
            ("StageLeft", 3.0),
            ("CenterStage", 3.0),
            ("StageRight", 3.0),
        ]
        .into_iter()
        .map(|(label, points)| (label.to_string(), points))
        .collect();

        Self {
            auto_amp_note: 2.0,
            auto_speaker_note: 5.0,
            auto_leave: 1.0,
            teleop_amp_note: 1.0,
            teleop_speaker_note: 2.0,
            teleop_speaker_note_amplified: 5.0,
            trap_note: 5.0,
            end_game_points,
        }
    }
}

/// Importance multiplier per competition tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierWeights {
    pub qualification: f64,
    pub quarterfinal: f64,
    pub semifinal: f64,
    pub final_match: f64,
}

impl TierWeights {
    /// Playoff tiers weigh more than qualification
    pub fn recency() -> Self {
        Self {
            qualification: 1.0,
            quarterfinal: 1.1,
            semifinal: 1.2,
            final_match: 1.2,
        }
    }

    /// Older season-average model, qualification weighs more than playoffs
    pub fn legacy() -> Self {
        Self {
            qualification: 1.0,
            quarterfinal: 0.7,
            semifinal: 0.7,
            final_match: 0.7,
        }
    }

    pub fn weight(&self, tier: CompetitionTier) -> f64 {
        match tier {
            CompetitionTier::Qualification => self.qualification,
            CompetitionTier::Quarterfinal => self.quarterfinal,
            CompetitionTier::Semifinal => self.semifinal,
            CompetitionTier::Final => self.final_match,
        }
    }

    fn values(&self) -> [f64; 4] {
        [
            self.qualification,
            self.quarterfinal,
            self.semifinal,
            self.final_match,
        ]
    }
}

/// Base learning-rate schedule keyed by match count
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KSchedule {
    /// Rate used up to and including `ramp_start`
    pub initial: f64,
    /// Rate reached at `ramp_end`
    pub peak: f64,
    /// Rate used after `ramp_end`
    pub settled: f64,
    pub ramp_start: u32,
    pub ramp_end: u32,
}

impl Default for KSchedule {
    fn default() -> Self {
        Self {
            initial: 0.5,
            peak: 1.0,
            settled: 0.3,
            ramp_start: 6,
            ramp_end: 12,
        }
    }
}

impl KSchedule {
    /// Base rate for the `match_count`-th match (1-based)
    pub fn rate(&self, match_count: u32) -> f64 {
        if match_count <= self.ramp_start {
            self.initial
        } else if match_count <= self.ramp_end {
            let span = (self.ramp_end - self.ramp_start) as f64;
            let progress = (match_count - self.ramp_start) as f64 / span;
            self.initial + (self.peak - self.initial) * progress
        } else {
            self.settled
        }
    }
}

/// Weights of the confidence components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub consistency: f64,
    pub veteran: f64,
    pub carry: f64,
    pub dominance: f64,
    pub record_alignment: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            consistency: 0.25,
            veteran: 0.10,
            carry: 0.25,
            dominance: 0.25,
            record_alignment: 0.15,
        }
    }
}

impl ConfidenceWeights {
    fn values(&self) -> [f64; 5] {
        [
            self.consistency,
            self.veteran,
            self.carry,
            self.dominance,
            self.record_alignment,
        ]
    }
}

/// Complete rating engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub phase_weights: PhaseWeights,
    pub early_cap: f64,
    pub early_trim_min_samples: usize,
    pub early_trim_fraction: f64,
    pub k_schedule: KSchedule,
    pub recency_tiers: TierWeights,
    pub legacy_tiers: TierWeights,
    /// Event codes (season prefix stripped) of championship divisions
    pub division_event_codes: Vec<String>,
    /// Event codes of the championship finale
    pub finale_event_codes: Vec<String>,
    pub event_quality_factor: f64,
    pub carry_steepness: f64,
    pub carry_midpoint: f64,
    pub carry_cap: f64,
    pub dominance_divisor: f64,
    pub confidence_weights: ConfidenceWeights,
    pub veteran_bonus: f64,
    pub rookie_bonus: f64,
    pub record_alignment_tolerance: f64,
    pub epsilon: f64,
    /// Seasons before this one use the season-average model
    pub legacy_cutoff_season: i32,
}

impl Default for RatingConfig {
    fn default() -> Self {
        let division_event_codes = [
            "arc", "cur", "dal", "gal", "hop", "joh", "mil", "new", "carv", "tes", "roe", "dar",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();

        Self {
            phase_weights: PhaseWeights::default(),
            early_cap: 33.0,
            early_trim_min_samples: 4,
            early_trim_fraction: 0.25,
            k_schedule: KSchedule::default(),
            recency_tiers: TierWeights::recency(),
            legacy_tiers: TierWeights::legacy(),
            division_event_codes,
            finale_event_codes: vec!["cmptx".to_string(), "cmpmi".to_string()],
            event_quality_factor: 0.85,
            carry_steepness: 4.0,
            carry_midpoint: 0.5,
            carry_cap: 1.25,
            dominance_divisor: 1.3,
            confidence_weights: ConfidenceWeights::default(),
            veteran_bonus: 1.0,
            rookie_bonus: 0.6,
            record_alignment_tolerance: 0.8,
            epsilon: 1e-6,
            legacy_cutoff_season: 2015,
        }
    }
}

impl RatingConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.epsilon <= 0.0 {
            return Err(EngineError::ConfigurationError {
                message: "Epsilon must be positive".to_string(),
            }
            .into());
        }

        if self.early_cap <= 0.0 {
            return Err(EngineError::ConfigurationError {
                message: "Early-phase cap must be positive".to_string(),
            }
            .into());
        }

        if !(0.0..1.0).contains(&self.early_trim_fraction) {
            return Err(EngineError::ConfigurationError {
                message: "Early-phase trim fraction must be in [0, 1)".to_string(),
            }
            .into());
        }

        if self.k_schedule.ramp_end <= self.k_schedule.ramp_start {
            return Err(EngineError::ConfigurationError {
                message: "K ramp must end after it starts".to_string(),
            }
            .into());
        }

        if self.dominance_divisor <= 0.0 || self.record_alignment_tolerance <= 0.0 {
            return Err(EngineError::ConfigurationError {
                message: "Dominance divisor and alignment tolerance must be positive"
                    .to_string(),
            }
            .into());
        }

        let negative = self
            .recency_tiers
            .values()
            .iter()
            .chain(self.legacy_tiers.values().iter())
            .chain(self.confidence_weights.values().iter())
            .any(|w| *w < 0.0);
        if negative || self.event_quality_factor < 0.0 || self.carry_cap < 0.0 {
            return Err(EngineError::ConfigurationError {
                message: "Weights and multipliers must be non-negative".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RatingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.early_cap, 33.0);
        assert_eq!(config.epsilon, 1e-6);
    }

    #[test]
    fn test_config_validation() {
        let mut config = RatingConfig::default();
        config.epsilon = 0.0;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.early_trim_fraction = 1.0;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.k_schedule.ramp_end = config.k_schedule.ramp_start;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.confidence_weights.carry = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_k_schedule() {
        let k = KSchedule::default();
        for count in 1..=6 {
            assert_eq!(k.rate(count), 0.5);
        }
        assert!((k.rate(9) - 0.75).abs() < 1e-12);
        assert_eq!(k.rate(12), 1.0);
        assert!(k.rate(7) > k.rate(6) && k.rate(8) > k.rate(7));
        assert_eq!(k.rate(13), 0.3);
        assert_eq!(k.rate(40), 0.3);
    }

    #[test]
    fn test_tier_weights() {
        let recency = TierWeights::recency();
        assert_eq!(recency.weight(CompetitionTier::Qualification), 1.0);
        assert_eq!(recency.weight(CompetitionTier::Quarterfinal), 1.1);
        assert_eq!(recency.weight(CompetitionTier::Final), 1.2);

        let legacy = TierWeights::legacy();
        assert!(
            legacy.weight(CompetitionTier::Qualification)
                > legacy.weight(CompetitionTier::Semifinal)
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RatingConfig = toml::from_str("early_cap = 40.0\n").unwrap();
        assert_eq!(config.early_cap, 40.0);
        assert_eq!(config.carry_cap, 1.25);
        assert_eq!(config.phase_weights.auto_speaker_note, 5.0);
    }
}
