//! Common types used throughout the rating engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for teams (e.g. "frc254")
pub type TeamId = String;

/// Competition season (calendar year)
pub type Season = i32;

/// Unique identifier for a batch run
pub type RunId = Uuid;

/// One side of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alliance {
    Red,
    Blue,
}

impl Alliance {
    /// The opposing alliance
    pub fn opponent(self) -> Self {
        match self {
            Alliance::Red => Alliance::Blue,
            Alliance::Blue => Alliance::Red,
        }
    }
}

impl std::fmt::Display for Alliance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alliance::Red => write!(f, "red"),
            Alliance::Blue => write!(f, "blue"),
        }
    }
}

/// Stage of an event a match was played in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionTier {
    #[serde(alias = "qm")]
    Qualification,
    #[serde(alias = "qf")]
    Quarterfinal,
    #[serde(alias = "sf")]
    Semifinal,
    #[serde(alias = "f")]
    Final,
}

impl std::fmt::Display for CompetitionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompetitionTier::Qualification => write!(f, "qualification"),
            CompetitionTier::Quarterfinal => write!(f, "quarterfinal"),
            CompetitionTier::Semifinal => write!(f, "semifinal"),
            CompetitionTier::Final => write!(f, "final"),
        }
    }
}

/// Per-alliance detail of how points were earned.
///
/// Every field is optional on the wire; anything the provider omitted
/// resolves to zero (or no end-state label) when the record is parsed,
/// so the rating fold never has to deal with missing values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreBreakdown {
    pub auto_amp_note_count: u32,
    pub auto_speaker_note_count: u32,
    /// Alliance-wide mobility points earned in the autonomous period
    pub auto_leave_points: f64,
    pub teleop_amp_note_count: u32,
    pub teleop_speaker_note_count: u32,
    pub teleop_speaker_note_amplified_count: u32,
    pub trap_note_count: u32,
    pub end_game_robot1: Option<String>,
    pub end_game_robot2: Option<String>,
    pub end_game_robot3: Option<String>,
}

impl ScoreBreakdown {
    /// End-state label for the robot at a 1-based alliance position
    pub fn end_game_label(&self, position: usize) -> Option<&str> {
        match position {
            1 => self.end_game_robot1.as_deref(),
            2 => self.end_game_robot2.as_deref(),
            3 => self.end_game_robot3.as_deref(),
            _ => None,
        }
    }
}

/// Roster and result for one alliance in a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllianceRecord {
    pub teams: Vec<TeamId>,
    pub score: f64,
    #[serde(default)]
    pub breakdown: Option<ScoreBreakdown>,
}

impl AllianceRecord {
    /// 1-based position of a team within the roster
    pub fn position_of(&self, team: &str) -> Option<usize> {
        self.teams.iter().position(|t| t == team).map(|i| i + 1)
    }
}

/// A single played match as delivered by the results provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub key: String,
    pub event_key: String,
    pub tier: CompetitionTier,
    pub red: AllianceRecord,
    pub blue: AllianceRecord,
    /// `None` for ties and unplayed results
    #[serde(default)]
    pub winning_alliance: Option<Alliance>,
    /// Unix seconds
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl MatchRecord {
    pub fn alliance(&self, alliance: Alliance) -> &AllianceRecord {
        match alliance {
            Alliance::Red => &self.red,
            Alliance::Blue => &self.blue,
        }
    }

    /// Which alliance a team played on, if any
    pub fn alliance_of(&self, team: &str) -> Option<Alliance> {
        if self.red.position_of(team).is_some() {
            Some(Alliance::Red)
        } else if self.blue.position_of(team).is_some() {
            Some(Alliance::Blue)
        } else {
            None
        }
    }

    pub fn involves(&self, team: &str) -> bool {
        self.alliance_of(team).is_some()
    }

    /// Missing timestamps sort as the epoch
    pub fn timestamp_or_zero(&self) -> i64 {
        self.timestamp.unwrap_or(0)
    }

    /// All teams appearing on either roster
    pub fn teams(&self) -> impl Iterator<Item = &TeamId> {
        self.red.teams.iter().chain(self.blue.teams.iter())
    }
}

/// Final rating snapshot for one team in one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingResult {
    pub overall: f64,
    pub early_phase: f64,
    pub mid_phase: f64,
    pub end_phase: f64,
    pub consistency: f64,
    pub confidence: f64,
    pub adjusted_rating: f64,
    pub average_match_score: f64,
    pub wins: u32,
    pub losses: u32,
}

/// Rating result keyed by team and season, as handed to persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSeasonRating {
    pub team: TeamId,
    pub season: Season,
    #[serde(flatten)]
    pub rating: RatingResult,
}

/// Output of one batch run over a season
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonReport {
    pub run_id: RunId,
    pub season: Season,
    pub strategy: String,
    pub generated_at: DateTime<Utc>,
    pub ratings: Vec<TeamSeasonRating>,
    /// Teams whose computation failed and was isolated
    pub failed_teams: Vec<TeamId>,
}

impl SeasonReport {
    pub fn rating_for(&self, team: &str) -> Option<&RatingResult> {
        self.ratings
            .iter()
            .find(|r| r.team == team)
            .map(|r| &r.rating)
    }
}
