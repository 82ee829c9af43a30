//! Per-match carry and dominance signals
//!
//! These are not blended into the rating; the updater appends them to
//! lists the confidence synthesizer aggregates after the fold.

use crate::config::rating::RatingConfig;
use crate::rating::phase::Participation;
use crate::types::{MatchRecord, TeamId};
use crate::utils::{guarded_div, logistic};
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only Phase-1 ratings shared with every Phase-2 computation
#[derive(Debug, Clone, Default)]
pub struct PreliminaryRatings {
    overall: Arc<HashMap<TeamId, f64>>,
}

impl PreliminaryRatings {
    pub fn new(overall: HashMap<TeamId, f64>) -> Self {
        Self {
            overall: Arc::new(overall),
        }
    }

    pub fn get(&self, team: &str) -> Option<f64> {
        self.overall.get(team).copied()
    }

    pub fn len(&self) -> usize {
        self.overall.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overall.is_empty()
    }
}

/// Where the teammate share of the carry signal comes from
#[derive(Debug, Clone, Default)]
pub enum CarrySource {
    /// Whatever the alliance scored beyond this team's estimate
    #[default]
    AllianceScore,
    /// Teammates' independently computed ratings
    Preliminary(PreliminaryRatings),
}

/// Carry score for one match, `None` when the team played alone
pub fn carry_signal(
    record: &MatchRecord,
    team: &str,
    participation: &Participation,
    overall_estimate: f64,
    source: &CarrySource,
    config: &RatingConfig,
) -> Option<f64> {
    if !participation.has_partners() {
        return None;
    }

    let alliance = record.alliance(participation.alliance);
    let partners = (participation.team_count - 1) as f64;
    let alliance_share = (alliance.score - overall_estimate) / partners;

    let teammate_share = match source {
        CarrySource::AllianceScore => alliance_share,
        CarrySource::Preliminary(ratings) => {
            let known: Option<Vec<f64>> = alliance
                .teams
                .iter()
                .filter(|t| t.as_str() != team)
                .map(|t| ratings.get(t))
                .collect();
            match known {
                Some(values) if !values.is_empty() => {
                    values.iter().sum::<f64>() / values.len() as f64
                }
                _ => alliance_share,
            }
        }
    };

    let carry_ratio = guarded_div(overall_estimate, teammate_share, config.epsilon);
    Some(logistic(
        config.carry_steepness * (carry_ratio - config.carry_midpoint),
    ))
}

/// Dominance score for one match in [0, 1]
pub fn dominance_signal(
    record: &MatchRecord,
    participation: &Participation,
    overall_estimate: f64,
    config: &RatingConfig,
) -> f64 {
    let opponent = record.alliance(participation.alliance.opponent());
    let opponent_per_robot = opponent.score / participation.team_count as f64;
    let margin = overall_estimate - opponent_per_robot;
    let scaled = guarded_div(margin, opponent_per_robot, config.epsilon);
    ((scaled + 1.0) / config.dominance_divisor).clamp(0.0, 1.0)
}
