//! Expected Points Added rating engine
//!
//! This module normalizes a team's matches, estimates per-phase
//! contributions, folds them into a running rating and synthesizes a
//! confidence score once the season is complete.

pub mod confidence;
pub mod engine;
pub mod finalizer;
pub mod normalizer;
pub mod phase;
pub mod signals;
pub mod state;
pub mod strategy;
pub mod weighting;

// Re-export commonly used types
pub use confidence::{synthesize, ConfidenceBreakdown};
pub use engine::{index_by_team, RatingEngine};
pub use finalizer::finalize;
pub use normalizer::{normalize, NormalizedMatches};
pub use phase::{Participation, PhaseEstimate, PhaseEstimator};
pub use signals::{CarrySource, PreliminaryRatings};
pub use state::{FoldPhase, MatchObservation, MatchOutcome, TeamRatingState};
pub use strategy::{
    strategy_for_season, IncrementalStrategy, RatingContext, RatingStrategy, SeasonAverageStrategy,
};
pub use weighting::{ImportancePolicy, MatchWeights, WeightingPolicy};
