//! Metrics for epa-engine batch runs
//!
//! This module provides Prometheus metrics collection and timing helpers
//! for the rating engine.

pub mod collector;

pub use collector::{MatchMetrics, MetricsCollector, MetricsTimer, PerformanceMetrics, TeamMetrics};
