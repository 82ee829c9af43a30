//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for epa-engine batch runs using
//! Prometheus metrics.

use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the rating engine
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Team-level outcomes
    team_metrics: TeamMetrics,

    /// Match-level throughput
    match_metrics: MatchMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Team-level metrics
#[derive(Clone)]
pub struct TeamMetrics {
    /// Teams that produced a rating, by strategy
    pub teams_rated_total: IntCounterVec,

    /// Teams omitted because they had no qualifying matches
    pub teams_without_data_total: IntCounter,

    /// Teams whose computation failed and was isolated
    pub teams_failed_total: IntCounter,
}

/// Match-level metrics
#[derive(Clone)]
pub struct MatchMetrics {
    /// Matches folded into a rating
    pub matches_folded_total: IntCounter,

    /// Teams present in the most recent batch
    pub batch_team_count: IntGauge,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Time spent rating a single team
    pub team_rating_duration: Histogram,

    /// Time spent on a whole batch, by mode
    pub batch_duration: HistogramVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let team_metrics = TeamMetrics::new(&registry)?;
        let match_metrics = MatchMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            team_metrics,
            match_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn team(&self) -> &TeamMetrics {
        &self.team_metrics
    }

    pub fn matches(&self) -> &MatchMetrics {
        &self.match_metrics
    }

    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record a team that produced a rating
    pub fn record_team_rated(&self, strategy: &str, matches: usize, duration: Duration) {
        self.team_metrics
            .teams_rated_total
            .with_label_values(&[strategy])
            .inc();
        self.match_metrics
            .matches_folded_total
            .inc_by(matches as u64);
        self.performance_metrics
            .team_rating_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a team omitted for lack of matches
    pub fn record_team_without_data(&self) {
        self.team_metrics.teams_without_data_total.inc();
    }

    /// Record an isolated per-team failure
    pub fn record_team_failed(&self) {
        self.team_metrics.teams_failed_total.inc();
    }

    /// Record a finished batch
    pub fn record_batch(&self, mode: &str, team_count: usize, duration: Duration) {
        self.match_metrics.batch_team_count.set(team_count as i64);
        self.performance_metrics
            .batch_duration
            .with_label_values(&[mode])
            .observe(duration.as_secs_f64());
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl Default for MetricsTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TeamMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let teams_rated_total = IntCounterVec::new(
            Opts::new("epa_engine_teams_rated_total", "Teams that produced a rating"),
            &["strategy"],
        )?;
        registry.register(Box::new(teams_rated_total.clone()))?;

        let teams_without_data_total = IntCounter::new(
            "epa_engine_teams_without_data_total",
            "Teams omitted for lack of qualifying matches",
        )?;
        registry.register(Box::new(teams_without_data_total.clone()))?;

        let teams_failed_total = IntCounter::new(
            "epa_engine_teams_failed_total",
            "Teams whose rating computation failed",
        )?;
        registry.register(Box::new(teams_failed_total.clone()))?;

        Ok(Self {
            teams_rated_total,
            teams_without_data_total,
            teams_failed_total,
        })
    }
}

impl MatchMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matches_folded_total = IntCounter::new(
            "epa_engine_matches_folded_total",
            "Matches folded into team ratings",
        )?;
        registry.register(Box::new(matches_folded_total.clone()))?;

        let batch_team_count = IntGauge::new(
            "epa_engine_batch_team_count",
            "Teams present in the most recent batch",
        )?;
        registry.register(Box::new(batch_team_count.clone()))?;

        Ok(Self {
            matches_folded_total,
            batch_team_count,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let team_rating_duration = Histogram::with_opts(
            HistogramOpts::new(
                "epa_engine_team_rating_duration_seconds",
                "Time spent rating a single team",
            )
            .buckets(vec![0.00001, 0.0001, 0.001, 0.01, 0.1, 1.0]),
        )?;
        registry.register(Box::new(team_rating_duration.clone()))?;

        let batch_duration = HistogramVec::new(
            HistogramOpts::new(
                "epa_engine_batch_duration_seconds",
                "Time spent rating a full season",
            )
            .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0]),
            &["mode"],
        )?;
        registry.register(Box::new(batch_duration.clone()))?;

        Ok(Self {
            team_rating_duration,
            batch_duration,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
