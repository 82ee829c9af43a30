//! Per-team rating state and the fold step that updates it
//!
//! A `TeamRatingState` lives for one team in one season. It advances one
//! match at a time in chronological order and becomes read-only once
//! finalized.

use crate::error::EngineError;
use crate::rating::phase::PhaseEstimate;
use serde::{Deserialize, Serialize};

/// Lifecycle of a team's rating state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoldPhase {
    Uninitialized,
    Initialized,
    Accumulating,
    Finalized,
}

/// Result of a match from the team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Win,
    Loss,
    /// Tie or no recorded winner
    Undecided,
}

/// Everything the updater needs to know about one match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchObservation {
    pub estimate: PhaseEstimate,
    pub carry: Option<f64>,
    pub dominance: f64,
    pub outcome: MatchOutcome,
    pub alliance_score: f64,
}

/// Running rating for one team in one season
#[derive(Debug, Clone, PartialEq)]
pub struct TeamRatingState {
    phase: FoldPhase,
    early: Option<f64>,
    mid: Option<f64>,
    end: Option<f64>,
    match_count: u32,
    contributions: Vec<f64>,
    carry_scores: Vec<f64>,
    dominance_scores: Vec<f64>,
    alliance_scores: Vec<f64>,
    wins: u32,
    losses: u32,
}

impl Default for TeamRatingState {
    fn default() -> Self {
        Self::new()
    }
}

impl TeamRatingState {
    pub fn new() -> Self {
        Self {
            phase: FoldPhase::Uninitialized,
            early: None,
            mid: None,
            end: None,
            match_count: 0,
            contributions: Vec::new(),
            carry_scores: Vec::new(),
            dominance_scores: Vec::new(),
            alliance_scores: Vec::new(),
            wins: 0,
            losses: 0,
        }
    }

    /// Fold one match into the state.
    ///
    /// The first match assigns the estimate directly. Later matches move
    /// each phase towards the estimate by `blend` (0 = ignore, 1 = replace).
    pub fn apply(&mut self, observation: &MatchObservation, blend: f64) -> crate::error::Result<()> {
        let estimate = observation.estimate;

        match self.phase {
            FoldPhase::Finalized => {
                return Err(EngineError::InvalidInput {
                    reason: "Cannot fold a match into a finalized rating".to_string(),
                }
                .into());
            }
            FoldPhase::Uninitialized => {
                self.early = Some(estimate.early);
                self.mid = Some(estimate.mid);
                self.end = Some(estimate.end);
                self.phase = FoldPhase::Initialized;
            }
            FoldPhase::Initialized | FoldPhase::Accumulating => {
                self.early = self.early.map(|p| p + blend * (estimate.early - p));
                self.mid = self.mid.map(|p| p + blend * (estimate.mid - p));
                self.end = self.end.map(|p| p + blend * (estimate.end - p));
                self.phase = FoldPhase::Accumulating;
            }
        }

        self.match_count += 1;
        self.contributions.push(estimate.overall());
        if let Some(carry) = observation.carry {
            self.carry_scores.push(carry);
        }
        self.dominance_scores.push(observation.dominance);
        self.alliance_scores.push(observation.alliance_score);

        match observation.outcome {
            MatchOutcome::Win => self.wins += 1,
            MatchOutcome::Loss => self.losses += 1,
            MatchOutcome::Undecided => {}
        }

        Ok(())
    }

    /// Freeze the state; further `apply` calls fail
    pub fn finalize(&mut self) {
        self.phase = FoldPhase::Finalized;
    }

    pub fn phase(&self) -> FoldPhase {
        self.phase
    }

    pub fn is_finalized(&self) -> bool {
        self.phase == FoldPhase::Finalized
    }

    pub fn match_count(&self) -> u32 {
        self.match_count
    }

    /// Current phase estimates, `None` before the first match
    pub fn phases(&self) -> Option<PhaseEstimate> {
        Some(PhaseEstimate {
            early: self.early?,
            mid: self.mid?,
            end: self.end?,
        })
    }

    /// Sum of the phase estimates, `None` before the first match
    pub fn overall(&self) -> Option<f64> {
        self.phases().map(|p| p.overall())
    }

    pub fn contributions(&self) -> &[f64] {
        &self.contributions
    }

    pub fn carry_scores(&self) -> &[f64] {
        &self.carry_scores
    }

    pub fn dominance_scores(&self) -> &[f64] {
        &self.dominance_scores
    }

    pub fn alliance_scores(&self) -> &[f64] {
        &self.alliance_scores
    }

    pub fn wins(&self) -> u32 {
        self.wins
    }

    pub fn losses(&self) -> u32 {
        self.losses
    }
}
