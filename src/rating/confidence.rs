//! Confidence synthesis
//!
//! Runs once per team after the fold and combines consistency, veteran
//! status, carry, dominance and win/loss alignment into a single [0, 1]
//! confidence score.

use crate::config::rating::RatingConfig;
use crate::rating::state::TeamRatingState;
use crate::utils::{mean, sample_std_dev};
use serde::{Deserialize, Serialize};

/// Individual confidence components and their combination
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub consistency: f64,
    pub veteran_bonus: f64,
    pub carry: f64,
    pub dominance: f64,
    pub record_alignment: f64,
    pub confidence: f64,
}

/// 1 − stdev / peak over per-match contributions, floored at 0
pub fn consistency(contributions: &[f64], epsilon: f64) -> f64 {
    let Some(std_dev) = sample_std_dev(contributions) else {
        return 1.0;
    };
    let peak = contributions
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    (1.0 - std_dev / (peak + epsilon)).max(0.0)
}

/// How well the win/loss record backs up the dominance signal
pub fn record_alignment(
    wins: u32,
    losses: u32,
    match_count: u32,
    dominance: f64,
    tolerance: f64,
) -> f64 {
    if match_count == 0 {
        return 1.0;
    }
    let actual_margin = (wins as f64 - losses as f64) / match_count as f64;
    if actual_margin >= dominance {
        1.0
    } else {
        (1.0 - (dominance - actual_margin) / tolerance).max(0.0)
    }
}

/// Combine a finished fold into a confidence breakdown
pub fn synthesize(
    state: &TeamRatingState,
    is_veteran: bool,
    config: &RatingConfig,
) -> ConfidenceBreakdown {
    let consistency = consistency(state.contributions(), config.epsilon);

    let veteran_bonus = if is_veteran {
        config.veteran_bonus
    } else {
        config.rookie_bonus
    };

    let carry = mean(state.carry_scores())
        .unwrap_or(1.0)
        .clamp(0.0, config.carry_cap);

    let dominance = mean(state.dominance_scores())
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);

    let record_alignment = record_alignment(
        state.wins(),
        state.losses(),
        state.match_count(),
        dominance,
        config.record_alignment_tolerance,
    );

    let w = &config.confidence_weights;
    let combined = w.consistency * consistency
        + w.veteran * veteran_bonus
        + w.carry * carry
        + w.dominance * dominance
        + w.record_alignment * record_alignment;

    ConfidenceBreakdown {
        consistency,
        veteran_bonus,
        carry,
        dominance,
        record_alignment,
        confidence: combined.clamp(0.0, 1.0),
    }
}
