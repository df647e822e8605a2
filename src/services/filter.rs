//! Predicate parameters for selecting the subset handed to the spreader.
//!
//! These are pass-through parameters from the interactive layer; they carry no
//! state of their own. In episode mode the year/votes/rating thresholds test
//! the parent's attributes (you pick series worth charting, then place their
//! episodes); in standalone mode they test the row's own attributes.

use crate::domain::SpreadMode;
use crate::models::enriched::EnrichedRecord;
use serde::{Deserialize, Serialize};

/// The subset selector threaded from the interactive layer into the core.
///
/// Threshold semantics follow the timeline UI: `min_year` is inclusive,
/// `min_votes` and `min_rating` are strict lower bounds. Substring matches
/// are case-sensitive against the row's own `genres`/`title_type`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TitleFilter {
    pub min_year: Option<i32>,
    pub min_votes: Option<u64>,
    pub min_rating: Option<f64>,
    /// `Some(true)` keeps only adult titles, `Some(false)` only non-adult,
    /// `None` does not filter on the flag.
    pub adult: Option<bool>,
    pub genre_contains: Option<String>,
    pub type_contains: Option<String>,
    pub mode: SpreadMode,
}

impl TitleFilter {
    #[must_use]
    pub fn matches(&self, record: &EnrichedRecord) -> bool {
        let (year, votes, rating) = match self.mode {
            SpreadMode::Episodes => (
                record.parent_start_year,
                record.parent_num_votes,
                record.parent_average_rating,
            ),
            SpreadMode::Standalone => {
                (record.start_year, record.num_votes, record.average_rating)
            }
        };

        if let Some(min_year) = self.min_year
            && year.is_none_or(|y| y < min_year)
        {
            return false;
        }
        if let Some(min_votes) = self.min_votes
            && votes.is_none_or(|v| v <= min_votes)
        {
            return false;
        }
        if let Some(min_rating) = self.min_rating
            && rating.is_none_or(|r| r <= min_rating)
        {
            return false;
        }
        if let Some(adult) = self.adult
            && record.is_adult != Some(adult)
        {
            return false;
        }
        if let Some(genre) = &self.genre_contains
            && !record
                .genres
                .as_deref()
                .is_some_and(|g| g.contains(genre.as_str()))
        {
            return false;
        }
        if let Some(kind) = &self.type_contains
            && !record
                .title_type
                .as_deref()
                .is_some_and(|t| t.contains(kind.as_str()))
        {
            return false;
        }
        true
    }

    /// Selects the matching subset, preserving input order.
    #[must_use]
    pub fn apply(&self, records: &[EnrichedRecord]) -> Vec<EnrichedRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }

    /// A stable token identifying this parameter tuple, usable as part of a
    /// cache key. Float thresholds are keyed by their bit pattern so that
    /// distinct parameters never collide.
    #[must_use]
    pub fn cache_token(&self) -> String {
        format!(
            "y={:?};v={:?};r={:?};a={:?};g={:?};t={:?};m={}",
            self.min_year,
            self.min_votes,
            self.min_rating.map(f64::to_bits),
            self.adult,
            self.genre_contains,
            self.type_contains,
            self.mode,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TitleId;

    fn record() -> EnrichedRecord {
        EnrichedRecord {
            id: TitleId::new("ep"),
            title_type: Some("tvEpisode".to_string()),
            primary_title: Some("Pilot".to_string()),
            original_title: None,
            is_adult: Some(false),
            start_year: Some(2021),
            end_year: Some(2021),
            runtime_minutes: Some(55),
            genres: Some("Crime,Drama".to_string()),
            average_rating: Some(7.8),
            num_votes: Some(3_000),
            parent_id: Some(TitleId::new("series")),
            season_number: Some(1),
            episode_number: Some(1),
            parent_title_type: Some("tvSeries".to_string()),
            parent_primary_title: Some("Parent Show".to_string()),
            parent_original_title: None,
            parent_is_adult: Some(false),
            parent_start_year: Some(2019),
            parent_end_year: None,
            parent_runtime_minutes: None,
            parent_genres: Some("Crime".to_string()),
            parent_average_rating: Some(8.9),
            parent_num_votes: Some(120_000),
        }
    }

    #[test]
    fn episode_mode_tests_parent_thresholds() {
        let filter = TitleFilter {
            min_year: Some(2019),
            min_votes: Some(100_000),
            min_rating: Some(8.0),
            type_contains: Some("tvEpisode".to_string()),
            mode: SpreadMode::Episodes,
            ..TitleFilter::default()
        };
        assert!(filter.matches(&record()));

        // Own votes are far below the threshold; only the parent's count.
        let strict = TitleFilter {
            min_votes: Some(200_000),
            mode: SpreadMode::Episodes,
            ..TitleFilter::default()
        };
        assert!(!strict.matches(&record()));
    }

    #[test]
    fn standalone_mode_tests_own_thresholds() {
        let filter = TitleFilter {
            min_rating: Some(8.0),
            mode: SpreadMode::Standalone,
            ..TitleFilter::default()
        };
        // Own rating 7.8 fails even though the parent has 8.9.
        assert!(!filter.matches(&record()));

        let looser = TitleFilter {
            min_rating: Some(7.0),
            mode: SpreadMode::Standalone,
            ..TitleFilter::default()
        };
        assert!(looser.matches(&record()));
    }

    #[test]
    fn vote_threshold_is_strict() {
        let filter = TitleFilter {
            min_votes: Some(120_000),
            mode: SpreadMode::Episodes,
            ..TitleFilter::default()
        };
        assert!(!filter.matches(&record()));
    }

    #[test]
    fn adult_flag_and_substrings_test_own_fields() {
        let adult_only = TitleFilter {
            adult: Some(true),
            ..TitleFilter::default()
        };
        assert!(!adult_only.matches(&record()));

        let genre = TitleFilter {
            genre_contains: Some("Drama".to_string()),
            ..TitleFilter::default()
        };
        assert!(genre.matches(&record()));

        let wrong_genre = TitleFilter {
            genre_contains: Some("Comedy".to_string()),
            ..TitleFilter::default()
        };
        assert!(!wrong_genre.matches(&record()));
    }

    #[test]
    fn unmatched_thresholds_reject_null_fields() {
        let mut orphan = record();
        orphan.parent_start_year = None;
        orphan.parent_num_votes = None;
        orphan.parent_average_rating = None;
        let filter = TitleFilter {
            min_year: Some(1900),
            mode: SpreadMode::Episodes,
            ..TitleFilter::default()
        };
        assert!(!filter.matches(&orphan));
    }

    #[test]
    fn cache_token_distinguishes_parameters() {
        let a = TitleFilter {
            min_rating: Some(7.0),
            ..TitleFilter::default()
        };
        let b = TitleFilter {
            min_rating: Some(7.5),
            ..TitleFilter::default()
        };
        assert_ne!(a.cache_token(), b.cache_token());
        assert_eq!(a.cache_token(), a.clone().cache_token());
    }
}
