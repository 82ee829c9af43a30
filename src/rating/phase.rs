//! Phase contribution estimation
//!
//! Turns one alliance's score breakdown into per-robot point estimates for
//! the early (autonomous), mid (teleoperated) and end (endgame) phases.

use crate::config::rating::{PhaseWeights, RatingConfig};
use crate::types::{Alliance, MatchRecord, ScoreBreakdown};

/// Where a team stood in a particular match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participation {
    pub alliance: Alliance,
    /// 1-based roster position
    pub position: usize,
    pub team_count: usize,
}

impl Participation {
    /// Locate `team` in `record`; `None` if absent or the roster is empty
    pub fn resolve(record: &MatchRecord, team: &str) -> Option<Self> {
        let alliance = record.alliance_of(team)?;
        let roster = record.alliance(alliance);
        let position = roster.position_of(team)?;
        let team_count = roster.teams.len();
        if team_count == 0 {
            return None;
        }
        Some(Self {
            alliance,
            position,
            team_count,
        })
    }

    pub fn has_partners(&self) -> bool {
        self.team_count > 1
    }
}

/// Point estimate for each phase of a single match
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseEstimate {
    pub early: f64,
    pub mid: f64,
    pub end: f64,
}

impl PhaseEstimate {
    pub fn overall(&self) -> f64 {
        self.early + self.mid + self.end
    }
}

/// Per-robot autonomous score of one breakdown, mobility included
pub fn early_score(breakdown: &ScoreBreakdown, weights: &PhaseWeights, team_count: usize) -> f64 {
    let scored = weights.auto_amp_note * breakdown.auto_amp_note_count as f64
        + weights.auto_speaker_note * breakdown.auto_speaker_note_count as f64
        + weights.auto_leave * breakdown.auto_leave_points;
    scored / team_count as f64
}

/// Per-robot teleoperated score of one breakdown
pub fn mid_score(breakdown: &ScoreBreakdown, weights: &PhaseWeights, team_count: usize) -> f64 {
    let scored = weights.teleop_amp_note * breakdown.teleop_amp_note_count as f64
        + weights.teleop_speaker_note * breakdown.teleop_speaker_note_count as f64
        + weights.teleop_speaker_note_amplified
            * breakdown.teleop_speaker_note_amplified_count as f64
        + weights.trap_note * breakdown.trap_note_count as f64;
    scored / team_count as f64
}

/// Endgame points for the robot at `position`
pub fn end_score(breakdown: &ScoreBreakdown, weights: &PhaseWeights, position: usize) -> f64 {
    breakdown
        .end_game_label(position)
        .and_then(|label| weights.end_game_points.get(label))
        .copied()
        .unwrap_or(0.0)
}

/// Stateful estimator for one team's season.
///
/// The early phase is re-derived from every breakdown seen so far on each
/// call, so an estimator must not be shared between teams.
#[derive(Debug, Clone)]
pub struct PhaseEstimator<'c> {
    config: &'c RatingConfig,
    early_history: Vec<f64>,
}

impl<'c> PhaseEstimator<'c> {
    pub fn new(config: &'c RatingConfig) -> Self {
        Self {
            config,
            early_history: Vec::new(),
        }
    }

    /// Estimate phase contributions for the next match in the season
    pub fn estimate(&mut self, record: &MatchRecord, participation: &Participation) -> PhaseEstimate {
        let alliance = record.alliance(participation.alliance);
        let weights = &self.config.phase_weights;

        match &alliance.breakdown {
            Some(breakdown) => {
                self.early_history
                    .push(early_score(breakdown, weights, participation.team_count));
                PhaseEstimate {
                    early: self.trailing_early(),
                    mid: mid_score(breakdown, weights, participation.team_count),
                    end: end_score(breakdown, weights, participation.position),
                }
            }
            // Pre-breakdown seasons only report the total
            None => PhaseEstimate {
                early: 0.0,
                mid: alliance.score / participation.team_count as f64,
                end: 0.0,
            },
        }
    }

    /// High-trimmed, capped mean of all early-phase samples so far
    fn trailing_early(&self) -> f64 {
        if self.early_history.is_empty() {
            return 0.0;
        }

        let mut samples = self.early_history.clone();
        samples.sort_by(|a, b| a.total_cmp(b));

        if samples.len() >= self.config.early_trim_min_samples {
            let drop = (samples.len() as f64 * self.config.early_trim_fraction) as usize;
            samples.truncate(samples.len() - drop);
        }

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        mean.min(self.config.early_cap)
    }
}
