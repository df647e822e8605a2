//! Join assembler and placeholder-year normalizer.
//!
//! Builds the enriched, denormalized record set out of the three source
//! tables: titles joined with their own rating, their episode link, and their
//! parent's title and rating attributes. Everything here is a pure batch
//! transformation; the memoization layer in [`crate::services::cache`] decides
//! when it reruns.

use crate::config::SourcesConfig;
use crate::domain::TitleId;
use crate::models::enriched::EnrichedRecord;
use crate::models::episode::EpisodeLink;
use crate::models::rating::RatingRecord;
use crate::models::title::TitleRecord;
use crate::parser::{self, SourceError};
use chrono::{Datelike, Utc};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// The sentinel year used for items with no release year yet: one year past
/// the current one, so ongoing/unreleased items land at the leading edge of a
/// timeline ordered by year.
#[must_use]
pub fn placeholder_year() -> i32 {
    Utc::now().year() + 1
}

/// Loads all three sources, assembles the enriched set, and applies the
/// placeholder-year normalizer. One call per distinct source snapshot.
pub fn build(sources: &SourcesConfig, placeholder: i32) -> Result<Vec<EnrichedRecord>, SourceError> {
    let titles = parser::load_titles(Path::new(&sources.titles_path))?;
    let ratings = parser::load_ratings(Path::new(&sources.ratings_path))?;
    let links = parser::load_links(Path::new(&sources.links_path))?;
    info!(
        titles = titles.len(),
        ratings = ratings.len(),
        links = links.len(),
        "sources loaded"
    );

    let mut enriched = assemble(titles, ratings, links);
    normalize(&mut enriched, placeholder);
    info!(rows = enriched.len(), placeholder, "catalog assembled");
    Ok(enriched)
}

/// Rating columns carried into the base record and the parent view.
#[derive(Debug, Clone)]
struct RatingValues {
    average_rating: Option<f64>,
    num_votes: Option<u64>,
}

/// A title joined with its rating; the input to both the link join and the
/// parent-side view.
#[derive(Debug, Clone)]
struct BaseRecord {
    title: TitleRecord,
    rating: RatingValues,
}

/// The parent-side projection of a base record: the same attributes under
/// their parent-prefixed meaning, keyed by the parent's own id.
#[derive(Debug, Clone)]
struct ParentAttrs {
    title_type: Option<String>,
    primary_title: Option<String>,
    original_title: Option<String>,
    is_adult: Option<bool>,
    start_year: Option<i32>,
    end_year: Option<i32>,
    runtime_minutes: Option<i32>,
    genres: Option<String>,
    average_rating: Option<f64>,
    num_votes: Option<u64>,
}

impl From<&BaseRecord> for ParentAttrs {
    fn from(base: &BaseRecord) -> Self {
        Self {
            title_type: base.title.title_type.clone(),
            primary_title: base.title.primary_title.clone(),
            original_title: base.title.original_title.clone(),
            is_adult: base.title.is_adult,
            start_year: base.title.start_year,
            end_year: base.title.end_year,
            runtime_minutes: base.title.runtime_minutes,
            genres: base.title.genres.clone(),
            average_rating: base.rating.average_rating,
            num_votes: base.rating.num_votes,
        }
    }
}

/// Performs the three successive left joins:
/// titles ⋈ ratings, then ⋈ links, then ⋈ the parent-side view of the first
/// result. Every left row survives each join; an absent right-side match
/// leaves that side's fields `None`. Duplicate keys on a right side fan out,
/// one output row per match. Output row order is unspecified.
///
/// The parent view is a value copy of the title⋈rating result, keyed by the
/// would-be `parent_id`. It never aliases the base rows: this is a true
/// self-join, and downstream consumption of one side must not be observable
/// through the other.
#[must_use]
pub fn assemble(
    titles: Vec<TitleRecord>,
    ratings: Vec<RatingRecord>,
    links: Vec<EpisodeLink>,
) -> Vec<EnrichedRecord> {
    let mut ratings_by_id: HashMap<TitleId, Vec<RatingValues>> = HashMap::new();
    for rating in ratings {
        ratings_by_id
            .entry(rating.id)
            .or_default()
            .push(RatingValues {
                average_rating: rating.average_rating,
                num_votes: rating.num_votes,
            });
    }

    let mut base: Vec<BaseRecord> = Vec::with_capacity(titles.len());
    for title in titles {
        match ratings_by_id.get(&title.id) {
            Some(matches) => {
                for rating in matches {
                    base.push(BaseRecord {
                        title: title.clone(),
                        rating: rating.clone(),
                    });
                }
            }
            None => base.push(BaseRecord {
                title,
                rating: RatingValues {
                    average_rating: None,
                    num_votes: None,
                },
            }),
        }
    }
    drop(ratings_by_id);
    debug!(rows = base.len(), "title-rating join done");

    let mut links_by_id: HashMap<TitleId, Vec<EpisodeLink>> = HashMap::new();
    for link in links {
        links_by_id.entry(link.id.clone()).or_default().push(link);
    }

    // Copy the base rows into the parent view before the base itself is
    // consumed below. The map owns its values outright.
    let mut parent_view: HashMap<TitleId, Vec<ParentAttrs>> = HashMap::new();
    for row in &base {
        parent_view
            .entry(row.title.id.clone())
            .or_default()
            .push(ParentAttrs::from(row));
    }

    let mut out: Vec<EnrichedRecord> = Vec::with_capacity(base.len());
    for row in base {
        match links_by_id.get(&row.title.id) {
            Some(link_matches) => {
                for link in link_matches {
                    let parents = link
                        .parent_id
                        .as_ref()
                        .and_then(|pid| parent_view.get(pid));
                    match parents {
                        Some(parent_matches) => {
                            for parent in parent_matches {
                                out.push(enriched_row(&row, Some(link), Some(parent)));
                            }
                        }
                        None => out.push(enriched_row(&row, Some(link), None)),
                    }
                }
            }
            None => out.push(enriched_row(&row, None, None)),
        }
    }
    out
}

fn enriched_row(
    base: &BaseRecord,
    link: Option<&EpisodeLink>,
    parent: Option<&ParentAttrs>,
) -> EnrichedRecord {
    EnrichedRecord {
        id: base.title.id.clone(),
        title_type: base.title.title_type.clone(),
        primary_title: base.title.primary_title.clone(),
        original_title: base.title.original_title.clone(),
        is_adult: base.title.is_adult,
        start_year: base.title.start_year,
        end_year: base.title.end_year,
        runtime_minutes: base.title.runtime_minutes,
        genres: base.title.genres.clone(),

        average_rating: base.rating.average_rating,
        num_votes: base.rating.num_votes,

        parent_id: link.and_then(|l| l.parent_id.clone()),
        season_number: link.and_then(|l| l.season_number),
        episode_number: link.and_then(|l| l.episode_number),

        parent_title_type: parent.and_then(|p| p.title_type.clone()),
        parent_primary_title: parent.and_then(|p| p.primary_title.clone()),
        parent_original_title: parent.and_then(|p| p.original_title.clone()),
        parent_is_adult: parent.and_then(|p| p.is_adult),
        parent_start_year: parent.and_then(|p| p.start_year),
        parent_end_year: parent.and_then(|p| p.end_year),
        parent_runtime_minutes: parent.and_then(|p| p.runtime_minutes),
        parent_genres: parent.and_then(|p| p.genres.clone()),
        parent_average_rating: parent.and_then(|p| p.average_rating),
        parent_num_votes: parent.and_then(|p| p.num_votes),
    }
}

/// Replaces missing start/end years with the placeholder. No other field is
/// touched; in particular parent-side years keep whatever the join produced.
pub fn normalize(records: &mut [EnrichedRecord], placeholder: i32) {
    for record in records {
        record.start_year.get_or_insert(placeholder);
        record.end_year.get_or_insert(placeholder);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(id: &str, kind: &str, name: &str, year: Option<i32>) -> TitleRecord {
        TitleRecord {
            id: TitleId::new(id),
            title_type: Some(kind.to_string()),
            primary_title: Some(name.to_string()),
            original_title: Some(name.to_string()),
            is_adult: Some(false),
            start_year: year,
            end_year: None,
            runtime_minutes: None,
            genres: Some("Drama".to_string()),
        }
    }

    fn rating(id: &str, avg: f64, votes: u64) -> RatingRecord {
        RatingRecord {
            id: TitleId::new(id),
            average_rating: Some(avg),
            num_votes: Some(votes),
        }
    }

    fn link(id: &str, parent: &str, season: i32, episode: i32) -> EpisodeLink {
        EpisodeLink {
            id: TitleId::new(id),
            parent_id: Some(TitleId::new(parent)),
            season_number: Some(season),
            episode_number: Some(episode),
        }
    }

    fn find<'a>(rows: &'a [EnrichedRecord], id: &str) -> &'a EnrichedRecord {
        rows.iter().find(|r| r.id.as_str() == id).unwrap()
    }

    #[test]
    fn title_without_rating_gets_null_rating_fields() {
        let rows = assemble(
            vec![title("t1", "movie", "Solaris", Some(1972))],
            vec![],
            vec![],
        );
        let row = find(&rows, "t1");
        assert_eq!(row.average_rating, None);
        assert_eq!(row.num_votes, None);
        assert_eq!(row.primary_title.as_deref(), Some("Solaris"));
    }

    #[test]
    fn non_child_rows_have_all_parent_fields_null() {
        let rows = assemble(
            vec![title("t1", "movie", "Solaris", Some(1972))],
            vec![rating("t1", 8.1, 90_000)],
            vec![],
        );
        let row = find(&rows, "t1");
        assert_eq!(row.parent_id, None);
        assert!(row.parent_fields_empty());
    }

    #[test]
    fn episode_carries_parent_attributes_under_parent_prefix() {
        let rows = assemble(
            vec![
                title("series", "tvSeries", "The Wire", Some(2002)),
                title("ep", "tvEpisode", "The Target", Some(2002)),
            ],
            vec![rating("series", 9.3, 400_000), rating("ep", 8.2, 10_000)],
            vec![link("ep", "series", 1, 1)],
        );
        let ep = find(&rows, "ep");
        assert_eq!(ep.parent_id.as_ref().map(TitleId::as_str), Some("series"));
        assert_eq!(ep.parent_primary_title.as_deref(), Some("The Wire"));
        assert_eq!(ep.parent_average_rating, Some(9.3));
        assert_eq!(ep.parent_num_votes, Some(400_000));
        assert_eq!(ep.average_rating, Some(8.2));
        assert_eq!(ep.season_number, Some(1));

        // The parent row itself is untouched by the self-join.
        let series = find(&rows, "series");
        assert!(series.parent_fields_empty());
        assert_eq!(series.average_rating, Some(9.3));
    }

    #[test]
    fn dangling_parent_id_yields_null_parent_fields_with_link_populated() {
        let rows = assemble(
            vec![title("ep", "tvEpisode", "Lost Pilot", Some(2004))],
            vec![],
            vec![link("ep", "missing-series", 1, 1)],
        );
        let ep = find(&rows, "ep");
        assert_eq!(
            ep.parent_id.as_ref().map(TitleId::as_str),
            Some("missing-series")
        );
        assert_eq!(ep.season_number, Some(1));
        assert_eq!(ep.episode_number, Some(1));
        assert!(ep.parent_fields_empty());
    }

    #[test]
    fn duplicate_right_side_keys_fan_out() {
        let rows = assemble(
            vec![title("t1", "movie", "Dup", Some(2000))],
            vec![rating("t1", 5.0, 10), rating("t1", 6.0, 20)],
            vec![],
        );
        assert_eq!(rows.len(), 2);
        let avgs: Vec<_> = rows.iter().map(|r| r.average_rating).collect();
        assert!(avgs.contains(&Some(5.0)) && avgs.contains(&Some(6.0)));
    }

    #[test]
    fn normalize_fills_only_missing_years() {
        let mut rows = assemble(
            vec![
                title("released", "movie", "Released", Some(1999)),
                title("upcoming", "movie", "Upcoming", None),
            ],
            vec![],
            vec![],
        );
        let before = find(&rows, "upcoming").clone();
        normalize(&mut rows, 2027);

        let upcoming = find(&rows, "upcoming");
        assert_eq!(upcoming.start_year, Some(2027));
        assert_eq!(upcoming.end_year, Some(2027));
        assert_eq!(upcoming.runtime_minutes, before.runtime_minutes);
        assert_eq!(upcoming.genres, before.genres);
        assert_eq!(upcoming.average_rating, before.average_rating);

        assert_eq!(find(&rows, "released").start_year, Some(1999));
    }

    #[test]
    fn placeholder_year_is_next_year() {
        assert_eq!(placeholder_year(), Utc::now().year() + 1);
    }
}
