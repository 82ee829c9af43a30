//! EPA Engine - Expected Points Added ratings for competition teams
//!
//! This crate turns a season of match results into per-team skill ratings
//! split into early, mid and end phase contributions, each with a bounded
//! confidence score.

pub mod config;
pub mod error;
pub mod metrics;
pub mod rating;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{EngineError, Result};
pub use types::*;

// Re-export key components
pub use config::{AppConfig, RatingConfig};
pub use rating::{RatingEngine, RatingStrategy};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
