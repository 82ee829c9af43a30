//! Rating finalization
//!
//! Freezes a folded state and produces the rounded, immutable snapshot
//! handed to persistence.

use crate::rating::confidence::ConfidenceBreakdown;
use crate::rating::state::TeamRatingState;
use crate::types::RatingResult;
use crate::utils::{mean, round2};

/// Build the output snapshot; `None` when no match was folded.
///
/// The state is marked finalized either way. Values are rounded here and
/// nowhere earlier.
pub fn finalize(
    state: &mut TeamRatingState,
    confidence: &ConfidenceBreakdown,
) -> Option<RatingResult> {
    state.finalize();

    let phases = state.phases()?;
    let overall = phases.overall();

    Some(RatingResult {
        overall: round2(overall),
        early_phase: round2(phases.early),
        mid_phase: round2(phases.mid),
        end_phase: round2(phases.end),
        consistency: round2(confidence.consistency),
        confidence: round2(confidence.confidence),
        adjusted_rating: round2(overall * confidence.confidence),
        average_match_score: round2(mean(state.alliance_scores()).unwrap_or(0.0)),
        wins: state.wins(),
        losses: state.losses(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::rating::RatingConfig;
    use crate::rating::confidence::synthesize;
    use crate::rating::phase::PhaseEstimate;
    use crate::rating::state::{MatchObservation, MatchOutcome};

    #[test]
    fn test_empty_state_yields_nothing() {
        let config = RatingConfig::default();
        let mut state = TeamRatingState::new();
        let confidence = synthesize(&state, true, &config);

        assert!(finalize(&mut state, &confidence).is_none());
        assert!(state.is_finalized());
    }

    #[test]
    fn test_rounds_at_output() {
        let config = RatingConfig::default();
        let mut state = TeamRatingState::new();
        let obs = MatchObservation {
            estimate: PhaseEstimate {
                early: 1.0 / 3.0,
                mid: 20.0 / 3.0,
                end: 3.0,
            },
            carry: Some(0.6),
            dominance: 0.55,
            outcome: MatchOutcome::Win,
            alliance_score: 55.556,
        };
        state.apply(&obs, 1.0).unwrap();

        let confidence = synthesize(&state, true, &config);
        let result = finalize(&mut state, &confidence).unwrap();

        assert_eq!(result.early_phase, 0.33);
        assert_eq!(result.mid_phase, 6.67);
        assert_eq!(result.end_phase, 3.0);
        assert_eq!(result.overall, 10.0);
        assert_eq!(result.average_match_score, 55.56);
        assert_eq!(result.wins, 1);
        assert_eq!(result.losses, 0);
        assert_eq!(
            result.adjusted_rating,
            round2(10.0 * confidence.confidence)
        );
    }
}
