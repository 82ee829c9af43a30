//! Rating strategies
//!
//! A strategy folds one team's normalized season into a `TeamRatingState`.
//! Two generations exist: the recency-weighted incremental model and the
//! older season-average model used before breakdown data was available.

use crate::config::rating::RatingConfig;
use crate::error::EngineError;
use crate::rating::confidence::synthesize;
use crate::rating::finalizer::finalize;
use crate::rating::normalizer::NormalizedMatches;
use crate::rating::phase::{Participation, PhaseEstimate, PhaseEstimator};
use crate::rating::signals::{carry_signal, dominance_signal, CarrySource};
use crate::rating::state::{MatchObservation, MatchOutcome, TeamRatingState};
use crate::rating::weighting::{ImportancePolicy, WeightingPolicy};
use crate::types::{MatchRecord, RatingResult, Season, TeamId};
use std::collections::HashSet;
use tracing::debug;

/// Inputs shared by every team rated in a batch
#[derive(Debug, Clone, Copy)]
pub struct RatingContext<'a> {
    pub config: &'a RatingConfig,
    /// Teams that competed in the previous season
    pub veterans: &'a HashSet<TeamId>,
    pub carry_source: &'a CarrySource,
}

impl<'a> RatingContext<'a> {
    pub fn is_veteran(&self, team: &str) -> bool {
        self.veterans.contains(team)
    }
}

/// Trait for turning a team's season into a rating
pub trait RatingStrategy: Send + Sync {
    /// Short identifier recorded in reports
    fn name(&self) -> &'static str;

    /// Fold the matches into a full-precision state (not yet finalized)
    fn fold(
        &self,
        team: &str,
        matches: NormalizedMatches<'_>,
        ctx: &RatingContext<'_>,
    ) -> crate::error::Result<TeamRatingState>;

    /// Fold, synthesize confidence and finalize; `None` for no matches
    fn rate(
        &self,
        team: &str,
        matches: NormalizedMatches<'_>,
        ctx: &RatingContext<'_>,
    ) -> crate::error::Result<Option<RatingResult>> {
        let mut state = self.fold(team, matches, ctx)?;
        let confidence = synthesize(&state, ctx.is_veteran(team), ctx.config);
        Ok(finalize(&mut state, &confidence))
    }
}

/// Recency-weighted incremental model
#[derive(Debug, Clone, Copy, Default)]
pub struct IncrementalStrategy;

/// Season-average model for older seasons
#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonAverageStrategy;

static INCREMENTAL: IncrementalStrategy = IncrementalStrategy;
static SEASON_AVERAGE: SeasonAverageStrategy = SeasonAverageStrategy;

/// Pick the strategy generation for a season
pub fn strategy_for_season(season: Season, config: &RatingConfig) -> &'static dyn RatingStrategy {
    if season < config.legacy_cutoff_season {
        &SEASON_AVERAGE
    } else {
        &INCREMENTAL
    }
}

/// First pass over the season: keep matches the team can be located in
fn resolve_all<'a>(
    team: &str,
    matches: NormalizedMatches<'a>,
) -> Vec<(&'a MatchRecord, Participation)> {
    matches
        .into_iter()
        .filter_map(|record| match Participation::resolve(record, team) {
            Some(participation) => Some((record, participation)),
            None => {
                debug!(
                    "{}",
                    EngineError::DegenerateDivision {
                        match_key: record.key.clone(),
                        reason: format!("{} has no countable alliance", team),
                    }
                );
                None
            }
        })
        .collect()
}

/// Build the observation the updater folds for one match
fn observe(
    record: &MatchRecord,
    team: &str,
    participation: &Participation,
    estimate: PhaseEstimate,
    ctx: &RatingContext<'_>,
) -> MatchObservation {
    let overall = estimate.overall();

    let outcome = match record.winning_alliance {
        Some(winner) if winner == participation.alliance => MatchOutcome::Win,
        Some(_) => MatchOutcome::Loss,
        None => MatchOutcome::Undecided,
    };

    MatchObservation {
        estimate,
        carry: carry_signal(
            record,
            team,
            participation,
            overall,
            ctx.carry_source,
            ctx.config,
        ),
        dominance: dominance_signal(record, participation, overall, ctx.config),
        outcome,
        alliance_score: record.alliance(participation.alliance).score,
    }
}

impl RatingStrategy for IncrementalStrategy {
    fn name(&self) -> &'static str {
        "incremental"
    }

    fn fold(
        &self,
        team: &str,
        matches: NormalizedMatches<'_>,
        ctx: &RatingContext<'_>,
    ) -> crate::error::Result<TeamRatingState> {
        let resolved = resolve_all(team, matches);
        let total = resolved.len();

        let policy = WeightingPolicy::new(ctx.config, ImportancePolicy::Recency);
        let mut estimator = PhaseEstimator::new(ctx.config);
        let mut state = TeamRatingState::new();

        for (index, (record, participation)) in resolved.iter().enumerate() {
            let estimate = estimator.estimate(record, participation);
            let weights = policy.weights_for(record, index + 1, total);
            let k = ctx.config.k_schedule.rate(state.match_count() + 1);
            let effective_rate = k * weights.importance * weights.event_quality;
            let observation = observe(record, team, participation, estimate, ctx);

            state.apply(&observation, weights.decay * effective_rate)?;
        }

        Ok(state)
    }
}

impl RatingStrategy for SeasonAverageStrategy {
    fn name(&self) -> &'static str {
        "season_average"
    }

    fn fold(
        &self,
        team: &str,
        matches: NormalizedMatches<'_>,
        ctx: &RatingContext<'_>,
    ) -> crate::error::Result<TeamRatingState> {
        let resolved = resolve_all(team, matches);

        let policy = WeightingPolicy::new(ctx.config, ImportancePolicy::Legacy);
        let mut estimator = PhaseEstimator::new(ctx.config);
        let mut state = TeamRatingState::new();
        let mut cumulative_weight = 0.0;

        for (record, participation) in &resolved {
            let estimate = estimator.estimate(record, participation);
            let weight =
                policy.importance(record.tier) * policy.event_quality(&record.event_key);
            cumulative_weight += weight;

            // Blending by w / Σw keeps the state equal to the weighted mean
            let blend = if cumulative_weight > 0.0 {
                weight / cumulative_weight
            } else {
                0.0
            };
            let observation = observe(record, team, participation, estimate, ctx);
            state.apply(&observation, blend)?;
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::normalizer::normalize;
    use crate::types::{Alliance, AllianceRecord, CompetitionTier};

    fn solo_match(key: &str, score: f64, timestamp: i64, tier: CompetitionTier) -> MatchRecord {
        MatchRecord {
            key: key.to_string(),
            event_key: "2024casj".to_string(),
            tier,
            red: AllianceRecord {
                teams: vec!["frc1".into()],
                score,
                breakdown: None,
            },
            blue: AllianceRecord {
                teams: vec!["frc2".into()],
                score: 10.0,
                breakdown: None,
            },
            winning_alliance: Some(Alliance::Red),
            timestamp: Some(timestamp),
        }
    }

    fn context<'a>(
        config: &'a RatingConfig,
        veterans: &'a HashSet<TeamId>,
        source: &'a CarrySource,
    ) -> RatingContext<'a> {
        RatingContext {
            config,
            veterans,
            carry_source: source,
        }
    }

    #[test]
    fn test_worked_scenario() {
        let config = RatingConfig::default();
        let veterans = HashSet::new();
        let source = CarrySource::AllianceScore;
        let ctx = context(&config, &veterans, &source);

        let matches = vec![
            solo_match("qm1", 50.0, 1, CompetitionTier::Qualification),
            solo_match("qm2", 60.0, 2, CompetitionTier::Qualification),
            solo_match("qm3", 70.0, 3, CompetitionTier::Qualification),
        ];

        let state = IncrementalStrategy
            .fold("frc1", normalize(&matches, "frc1"), &ctx)
            .unwrap();

        let expected_after_two = 50.0 + (4.0 / 9.0) * 0.5 * 10.0;
        let expected = expected_after_two + 0.5 * (70.0 - expected_after_two);
        assert!((state.overall().unwrap() - expected).abs() < 1e-9);
        assert!((state.overall().unwrap() - 61.11).abs() < 0.01);
        assert_eq!(state.contributions(), &[50.0, 60.0, 70.0]);
    }

    #[test]
    fn test_single_match_is_unblended() {
        let config = RatingConfig::default();
        let veterans = HashSet::new();
        let source = CarrySource::AllianceScore;
        let ctx = context(&config, &veterans, &source);

        let matches = vec![solo_match("qm1", 42.0, 1, CompetitionTier::Final)];
        let state = IncrementalStrategy
            .fold("frc1", normalize(&matches, "frc1"), &ctx)
            .unwrap();
        assert_eq!(state.overall(), Some(42.0));
    }

    #[test]
    fn test_no_matches_rates_nothing() {
        let config = RatingConfig::default();
        let veterans = HashSet::new();
        let source = CarrySource::AllianceScore;
        let ctx = context(&config, &veterans, &source);

        let matches: Vec<MatchRecord> = Vec::new();
        let result = IncrementalStrategy
            .rate("frc1", normalize(&matches, "frc1"), &ctx)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_season_average_weights_qualification_higher() {
        let config = RatingConfig::default();
        let veterans = HashSet::new();
        let source = CarrySource::AllianceScore;
        let ctx = context(&config, &veterans, &source);

        let matches = vec![
            solo_match("qm1", 40.0, 1, CompetitionTier::Qualification),
            solo_match("sf1", 80.0, 2, CompetitionTier::Semifinal),
        ];
        let state = SeasonAverageStrategy
            .fold("frc1", normalize(&matches, "frc1"), &ctx)
            .unwrap();

        let expected = (40.0 * 1.0 + 80.0 * 0.7) / 1.7;
        assert!((state.overall().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_strategy_selection_by_season() {
        let config = RatingConfig::default();
        assert_eq!(strategy_for_season(2008, &config).name(), "season_average");
        assert_eq!(strategy_for_season(2014, &config).name(), "season_average");
        assert_eq!(strategy_for_season(2015, &config).name(), "incremental");
        assert_eq!(strategy_for_season(2024, &config).name(), "incremental");
    }

    #[test]
    fn test_veteran_lookup() {
        let config = RatingConfig::default();
        let veterans: HashSet<TeamId> = ["frc254".to_string()].into_iter().collect();
        let source = CarrySource::AllianceScore;
        let ctx = context(&config, &veterans, &source);
        assert!(ctx.is_veteran("frc254"));
        assert!(!ctx.is_veteran("frc9999"));
    }
}
