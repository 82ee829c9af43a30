//! Batch rating engine
//!
//! Rates every team in a season on a bounded worker pool. Teams are
//! independent: each one's matches are normalized and folded on its own,
//! and a failure in one team is logged and isolated from the rest.

use crate::config::app::AppConfig;
use crate::config::rating::RatingConfig;
use crate::error::EngineError;
use crate::metrics::{MetricsCollector, MetricsTimer};
use crate::rating::normalizer::normalize;
use crate::rating::signals::{CarrySource, PreliminaryRatings};
use crate::rating::strategy::{strategy_for_season, RatingContext};
use crate::types::{MatchRecord, RatingResult, Season, SeasonReport, TeamId, TeamSeasonRating};
use chrono::Utc;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Matches grouped by every team that played in them
type TeamIndex<'a> = BTreeMap<TeamId, Vec<&'a MatchRecord>>;

/// Group a season's matches by participating team
pub fn index_by_team(matches: &[MatchRecord]) -> BTreeMap<TeamId, Vec<&MatchRecord>> {
    let mut index: TeamIndex<'_> = BTreeMap::new();
    for record in matches {
        let mut seen = HashSet::new();
        for team in record.teams() {
            if seen.insert(team.as_str()) {
                index.entry(team.clone()).or_default().push(record);
            }
        }
    }
    index
}

/// Outcome of one team's computation within a batch
enum TeamOutcome {
    Rated(RatingResult),
    NoData,
    Failed(String),
}

pub struct RatingEngine {
    config: Arc<RatingConfig>,
    pool: rayon::ThreadPool,
    metrics: Option<Arc<MetricsCollector>>,
}

impl std::fmt::Debug for RatingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatingEngine")
            .field("config", &self.config)
            .field("worker_threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl RatingEngine {
    /// Create an engine with a pool of `worker_threads` workers
    pub fn new(config: RatingConfig, worker_threads: usize) -> crate::error::Result<Self> {
        config.validate()?;

        if worker_threads == 0 {
            return Err(EngineError::ConfigurationError {
                message: "Worker threads must be greater than 0".to_string(),
            }
            .into());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|i| format!("epa-worker-{}", i))
            .build()
            .map_err(|e| EngineError::ConfigurationError {
                message: format!("Failed to build worker pool: {}", e),
            })?;

        Ok(Self {
            config: Arc::new(config),
            pool,
            metrics: None,
        })
    }

    /// Create an engine from the application configuration
    pub fn from_app_config(config: &AppConfig) -> crate::error::Result<Self> {
        Self::new(config.rating.clone(), config.batch.worker_threads)
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    /// Rate a single team from a (possibly unfiltered) match list
    pub fn rate_team(
        &self,
        team: &str,
        season: Season,
        matches: &[MatchRecord],
        veterans: &HashSet<TeamId>,
    ) -> crate::error::Result<Option<RatingResult>> {
        self.rate_team_with(team, season, matches, veterans, &CarrySource::AllianceScore)
    }

    /// Rate a single team with an explicit carry source
    pub fn rate_team_with<'a, I>(
        &self,
        team: &str,
        season: Season,
        matches: I,
        veterans: &HashSet<TeamId>,
        carry_source: &CarrySource,
    ) -> crate::error::Result<Option<RatingResult>>
    where
        I: IntoIterator<Item = &'a MatchRecord>,
    {
        let timer = MetricsTimer::new();
        let strategy = strategy_for_season(season, &self.config);
        let normalized = normalize(matches, team);
        let match_count = normalized.len();

        let ctx = RatingContext {
            config: &self.config,
            veterans,
            carry_source,
        };

        let result = strategy.rate(team, normalized, &ctx)?;

        if let Some(rating) = &result {
            ensure_finite(team, rating)?;
            if let Some(metrics) = &self.metrics {
                metrics.record_team_rated(strategy.name(), match_count, timer.stop());
            }
        }

        Ok(result)
    }

    /// Rate every team in a season independently
    pub fn rate_season(
        &self,
        season: Season,
        matches: &[MatchRecord],
        veterans: &HashSet<TeamId>,
    ) -> SeasonReport {
        let timer = MetricsTimer::new();
        let index = index_by_team(matches);
        info!(
            "Rating season {} for {} teams over {} matches",
            season,
            index.len(),
            matches.len()
        );

        let (ratings, failed) =
            self.run_phase(season, &index, veterans, &CarrySource::AllianceScore);
        self.report(season, ratings, failed, "single_phase", index.len(), timer)
    }

    /// Rate a season twice, the second pass reading the first pass's
    /// ratings as the teammate baseline for carry
    pub fn rate_season_two_phase(
        &self,
        season: Season,
        matches: &[MatchRecord],
        veterans: &HashSet<TeamId>,
    ) -> SeasonReport {
        let timer = MetricsTimer::new();
        let index = index_by_team(matches);
        info!(
            "Rating season {} in two phases for {} teams",
            season,
            index.len()
        );

        // Returns only once every team has finished
        let snapshot = self.preliminary_ratings(season, &index, veterans);
        debug!("Phase 1 complete with {} preliminary ratings", snapshot.len());

        let (ratings, failed) = self.run_phase(
            season,
            &index,
            veterans,
            &CarrySource::Preliminary(snapshot),
        );
        self.report(season, ratings, failed, "two_phase", index.len(), timer)
    }

    /// Fold every team once and keep the unrounded overall ratings.
    ///
    /// Teams that fail here are left out of the snapshot; Phase 2 reports them.
    fn preliminary_ratings(
        &self,
        season: Season,
        index: &TeamIndex<'_>,
        veterans: &HashSet<TeamId>,
    ) -> PreliminaryRatings {
        let strategy = strategy_for_season(season, &self.config);
        let source = CarrySource::AllianceScore;
        let ctx = RatingContext {
            config: &self.config,
            veterans,
            carry_source: &source,
        };

        let overall: HashMap<TeamId, f64> = self.pool.install(|| {
            index
                .par_iter()
                .filter_map(|(team, matches)| {
                    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
                        strategy.fold(team, normalize(matches.iter().copied(), team), &ctx)
                    }));

                    match attempt {
                        Ok(Ok(state)) => state
                            .overall()
                            .filter(|value| value.is_finite())
                            .map(|value| (team.clone(), value)),
                        Ok(Err(e)) => {
                            debug!("Phase 1 skipped {}: {}", team, e);
                            None
                        }
                        Err(_) => {
                            debug!("Phase 1 skipped {}: rating computation panicked", team);
                            None
                        }
                    }
                })
                .collect()
        });

        PreliminaryRatings::new(overall)
    }

    fn run_phase(
        &self,
        season: Season,
        index: &TeamIndex<'_>,
        veterans: &HashSet<TeamId>,
        carry_source: &CarrySource,
    ) -> (Vec<TeamSeasonRating>, Vec<TeamId>) {
        let outcomes: Vec<(TeamId, TeamOutcome)> = self.pool.install(|| {
            index
                .par_iter()
                .map(|(team, matches)| {
                    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
                        self.rate_team_with(
                            team,
                            season,
                            matches.iter().copied(),
                            veterans,
                            carry_source,
                        )
                    }));

                    let outcome = match attempt {
                        Ok(Ok(Some(rating))) => TeamOutcome::Rated(rating),
                        Ok(Ok(None)) => TeamOutcome::NoData,
                        Ok(Err(e)) => TeamOutcome::Failed(e.to_string()),
                        Err(_) => TeamOutcome::Failed("rating computation panicked".to_string()),
                    };
                    (team.clone(), outcome)
                })
                .collect()
        });

        let mut ratings = Vec::new();
        let mut failed = Vec::new();

        for (team, outcome) in outcomes {
            match outcome {
                TeamOutcome::Rated(rating) => ratings.push(TeamSeasonRating {
                    team,
                    season,
                    rating,
                }),
                TeamOutcome::NoData => {
                    debug!("{}", EngineError::NoData { team });
                    if let Some(metrics) = &self.metrics {
                        metrics.record_team_without_data();
                    }
                }
                TeamOutcome::Failed(reason) => {
                    warn!("{}", EngineError::TeamFailed {
                        team: team.clone(),
                        reason,
                    });
                    if let Some(metrics) = &self.metrics {
                        metrics.record_team_failed();
                    }
                    failed.push(team);
                }
            }
        }

        ratings.sort_by(|a, b| a.team.cmp(&b.team));
        failed.sort();
        (ratings, failed)
    }

    fn report(
        &self,
        season: Season,
        ratings: Vec<TeamSeasonRating>,
        failed_teams: Vec<TeamId>,
        mode: &str,
        team_count: usize,
        timer: MetricsTimer,
    ) -> SeasonReport {
        let duration = timer.stop();
        info!(
            "Season {} rated: {} ratings, {} failures in {:?}",
            season,
            ratings.len(),
            failed_teams.len(),
            duration
        );

        if let Some(metrics) = &self.metrics {
            metrics.record_batch(mode, team_count, duration);
        }

        SeasonReport {
            run_id: Uuid::new_v4(),
            season,
            strategy: strategy_for_season(season, &self.config).name().to_string(),
            generated_at: Utc::now(),
            ratings,
            failed_teams,
        }
    }
}

/// Reject results carrying NaN or infinite values
fn ensure_finite(team: &str, rating: &RatingResult) -> crate::error::Result<()> {
    let values = [
        ("overall", rating.overall),
        ("early_phase", rating.early_phase),
        ("mid_phase", rating.mid_phase),
        ("end_phase", rating.end_phase),
        ("consistency", rating.consistency),
        ("confidence", rating.confidence),
        ("adjusted_rating", rating.adjusted_rating),
        ("average_match_score", rating.average_match_score),
    ];

    match values.iter().find(|(_, value)| !value.is_finite()) {
        Some((field, _)) => Err(EngineError::TeamFailed {
            team: team.to_string(),
            reason: format!("non-finite {}", field),
        }
        .into()),
        None => Ok(()),
    }
}
