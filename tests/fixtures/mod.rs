//! Test fixtures for building match records and synthetic seasons

#![allow(dead_code)]

use epa_engine::types::{
    Alliance, AllianceRecord, CompetitionTier, MatchRecord, ScoreBreakdown, TeamId,
};
use std::collections::HashSet;

/// Fluent builder for a single match record
pub struct MatchBuilder {
    record: MatchRecord,
    explicit_winner: bool,
}

impl MatchBuilder {
    pub fn new(key: &str) -> Self {
        Self {
            record: MatchRecord {
                key: key.to_string(),
                event_key: "2024casj".to_string(),
                tier: CompetitionTier::Qualification,
                red: AllianceRecord {
                    teams: Vec::new(),
                    score: 0.0,
                    breakdown: None,
                },
                blue: AllianceRecord {
                    teams: Vec::new(),
                    score: 0.0,
                    breakdown: None,
                },
                winning_alliance: None,
                timestamp: None,
            },
            explicit_winner: false,
        }
    }

    pub fn event(mut self, event_key: &str) -> Self {
        self.record.event_key = event_key.to_string();
        self
    }

    pub fn tier(mut self, tier: CompetitionTier) -> Self {
        self.record.tier = tier;
        self
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.record.timestamp = Some(timestamp);
        self
    }

    pub fn red(mut self, teams: &[&str], score: f64) -> Self {
        self.record.red.teams = teams.iter().map(|t| t.to_string()).collect();
        self.record.red.score = score;
        self
    }

    pub fn blue(mut self, teams: &[&str], score: f64) -> Self {
        self.record.blue.teams = teams.iter().map(|t| t.to_string()).collect();
        self.record.blue.score = score;
        self
    }

    pub fn red_breakdown(mut self, breakdown: ScoreBreakdown) -> Self {
        self.record.red.breakdown = Some(breakdown);
        self
    }

    pub fn blue_breakdown(mut self, breakdown: ScoreBreakdown) -> Self {
        self.record.blue.breakdown = Some(breakdown);
        self
    }

    pub fn winner(mut self, winner: Option<Alliance>) -> Self {
        self.record.winning_alliance = winner;
        self.explicit_winner = true;
        self
    }

    /// Finish the record; the winner follows the scores unless set explicitly
    pub fn build(mut self) -> MatchRecord {
        if !self.explicit_winner {
            let (red, blue) = (self.record.red.score, self.record.blue.score);
            self.record.winning_alliance = if red > blue {
                Some(Alliance::Red)
            } else if blue > red {
                Some(Alliance::Blue)
            } else {
                None
            };
        }
        self.record
    }
}

/// Breakdown with speaker notes and endgame labels for three robots
pub fn breakdown(auto_speaker: u32, teleop_speaker: u32, end: [&str; 3]) -> ScoreBreakdown {
    let label = |s: &str| {
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    };
    ScoreBreakdown {
        auto_speaker_note_count: auto_speaker,
        auto_leave_points: 6.0,
        teleop_speaker_note_count: teleop_speaker,
        end_game_robot1: label(end[0]),
        end_game_robot2: label(end[1]),
        end_game_robot3: label(end[2]),
        ..Default::default()
    }
}

/// Total alliance score implied by a fixture breakdown under default weights
pub fn breakdown_score(b: &ScoreBreakdown) -> f64 {
    let end: f64 = (1..=3)
        .map(|p| match b.end_game_label(p) {
            Some("Parked") => 1.0,
            Some("Onstage") => 3.0,
            _ => 0.0,
        })
        .sum();
    5.0 * b.auto_speaker_note_count as f64
        + b.auto_leave_points
        + 2.0 * b.teleop_speaker_note_count as f64
        + end
}

pub fn team_id(n: usize) -> String {
    format!("frc{}", n)
}

/// Deterministic season of 3-vs-3 matches.
///
/// Teams `frc1..=frcN` get strength equal to their number; every round
/// reshuffles alliances with a fixed permutation so partners vary.
pub fn synthetic_season(team_count: usize, rounds: usize) -> Vec<MatchRecord> {
    assert!(team_count >= 6 && team_count % 6 == 0);
    let stride = [5usize, 7, 11, 13, 17]
        .into_iter()
        .find(|s| gcd(*s, team_count) == 1)
        .unwrap_or(1);

    let mut matches = Vec::new();
    for round in 0..rounds {
        let order: Vec<usize> = (0..team_count)
            .map(|i| (i * stride + round * 3) % team_count + 1)
            .collect();

        for (slot, chunk) in order.chunks(6).enumerate() {
            let red_ids: Vec<String> = chunk[..3].iter().map(|n| team_id(*n)).collect();
            let blue_ids: Vec<String> = chunk[3..].iter().map(|n| team_id(*n)).collect();
            let red_strength: usize = chunk[..3].iter().sum();
            let blue_strength: usize = chunk[3..].iter().sum();

            let red_b = strength_breakdown(red_strength, round);
            let blue_b = strength_breakdown(blue_strength, round + 1);
            let red_refs: Vec<&str> = red_ids.iter().map(|s| s.as_str()).collect();
            let blue_refs: Vec<&str> = blue_ids.iter().map(|s| s.as_str()).collect();

            let tier = if round + 1 == rounds {
                CompetitionTier::Final
            } else {
                CompetitionTier::Qualification
            };

            matches.push(
                MatchBuilder::new(&format!("2024syn_r{}m{}", round, slot))
                    .tier(tier)
                    .at((round * 1000 + slot) as i64)
                    .red(&red_refs, breakdown_score(&red_b))
                    .blue(&blue_refs, breakdown_score(&blue_b))
                    .red_breakdown(red_b)
                    .blue_breakdown(blue_b)
                    .build(),
            );
        }
    }
    matches
}

fn strength_breakdown(strength: usize, salt: usize) -> ScoreBreakdown {
    let labels = ["Onstage", "Parked", ""];
    breakdown(
        (strength / 6) as u32,
        (strength + salt % 4) as u32,
        [
            labels[salt % 3],
            labels[(salt + 1) % 3],
            labels[(strength + salt) % 3],
        ],
    )
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

pub fn veterans(ids: &[&str]) -> HashSet<TeamId> {
    ids.iter().map(|id| id.to_string()).collect()
}
