//! Configuration management for the epa-engine batch runner
//!
//! This module handles all configuration loading from environment variables
//! and TOML files, validation, and default values for the rating engine.

pub mod app;
pub mod rating;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, BatchSettings, ServiceSettings};
pub use rating::{ConfidenceWeights, KSchedule, PhaseWeights, RatingConfig, TierWeights};
