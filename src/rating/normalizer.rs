//! Match normalization
//!
//! Narrows a raw match list down to the matches one team played in and
//! puts them in chronological order for the rating fold.

use crate::error::EngineError;
use crate::types::MatchRecord;
use tracing::debug;

/// Chronologically ordered matches for a single team.
///
/// The sequence knows its length up front (the weighting policy needs the
/// total before folding) and is consumed exactly once by iterating it.
#[derive(Debug, Clone)]
pub struct NormalizedMatches<'a> {
    team: String,
    matches: Vec<&'a MatchRecord>,
}

impl<'a> NormalizedMatches<'a> {
    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

impl<'a> IntoIterator for NormalizedMatches<'a> {
    type Item = &'a MatchRecord;
    type IntoIter = std::vec::IntoIter<&'a MatchRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

/// Filter `matches` to those involving `team`, sorted by timestamp.
///
/// Ties keep input order. Records with non-finite alliance scores are
/// dropped here so the fold only ever sees usable numbers.
pub fn normalize<'a, I>(matches: I, team: &str) -> NormalizedMatches<'a>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut selected: Vec<&'a MatchRecord> = matches
        .into_iter()
        .filter(|record| record.involves(team))
        .filter(|record| {
            let usable = record.red.score.is_finite() && record.blue.score.is_finite();
            if !usable {
                debug!(
                    "{}",
                    EngineError::MalformedRecord {
                        match_key: record.key.clone(),
                        reason: "non-finite alliance score".to_string(),
                    }
                );
            }
            usable
        })
        .collect();

    // sort_by_key is stable, preserving input order on equal timestamps
    selected.sort_by_key(|record| record.timestamp_or_zero());

    NormalizedMatches {
        team: team.to_string(),
        matches: selected,
    }
}
