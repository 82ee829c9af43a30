//! Error types for the rating engine
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

use crate::types::TeamId;

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific rating scenarios
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("No qualifying matches for team {team}")]
    NoData { team: TeamId },

    #[error("Malformed match record {match_key}: {reason}")]
    MalformedRecord { match_key: String, reason: String },

    #[error("Degenerate division in match {match_key}: {reason}")]
    DegenerateDivision { match_key: String, reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Rating failed for team {team}: {reason}")]
    TeamFailed { team: TeamId, reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}
