//! Interval spreader: assigns each filtered row a disjoint fractional
//! sub-interval of its release year so siblings never overlap on a timeline.
//!
//! Two variants. [`spread_episodes`] subdivides a year among all rows sharing
//! the same (parent, year) group; [`spread_standalone`] gives every row the
//! whole year, for items with no sibling ordering to respect.
//!
//! Group membership and per-group sizes are precomputed in a single pass, then
//! one ordered streaming pass assigns each row its index within its group.
//! The per-group size is looked up once per group, which is also where the
//! grouping-consistency invariant is checked.

use crate::domain::TitleId;
use crate::models::enriched::EnrichedRecord;
use crate::models::spread::SpreadRecord;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors scoped to a single spread pass. A failed pass does not invalidate
/// enriched data cached upstream.
#[derive(Debug, Error)]
pub enum SpreadError {
    #[error(
        "inconsistent grouping for parent {parent:?}, year {year:?}: {detail}"
    )]
    GroupingInconsistency {
        parent: Option<TitleId>,
        year: Option<i32>,
        detail: String,
    },

    #[error("row {id} has no start year; normalize the catalog before spreading")]
    MissingStartYear { id: TitleId },
}

/// The (parent identity, release year) pair every sibling group shares.
type GroupKey = (Option<TitleId>, Option<i32>);

/// Spreads child rows: the k-th of n siblings in a (parent, year) group gets
/// `[year + k/n, year + (k+1)/n)`. Rows are ordered by
/// (parent, year, season, episode) ascending with absent values first; that
/// ordering is the canonical in-group sequence and makes the output exactly
/// reproducible for a fixed input.
pub fn spread_episodes(rows: Vec<EnrichedRecord>) -> Result<Vec<SpreadRecord>, SpreadError> {
    if rows.is_empty() {
        warn!("spread requested for an empty subset");
        return Ok(Vec::new());
    }

    let mut rows = rows;
    rows.sort_by(|a, b| {
        a.parent_id
            .cmp(&b.parent_id)
            .then_with(|| a.start_year.cmp(&b.start_year))
            .then_with(|| a.season_number.cmp(&b.season_number))
            .then_with(|| a.episode_number.cmp(&b.episode_number))
    });

    let mut group_sizes: HashMap<GroupKey, usize> = HashMap::new();
    for row in &rows {
        *group_sizes
            .entry((row.parent_id.clone(), row.start_year))
            .or_insert(0) += 1;
    }
    debug!(rows = rows.len(), groups = group_sizes.len(), "groups counted");

    let mut out = Vec::with_capacity(rows.len());
    let mut current: Option<GroupKey> = None;
    let mut group_size = 0usize;
    let mut index_in_group = 0usize;

    for row in rows {
        let Some(year) = row.start_year else {
            return Err(SpreadError::MissingStartYear { id: row.id });
        };

        let key: GroupKey = (row.parent_id.clone(), row.start_year);
        if current.as_ref() != Some(&key) {
            group_size = *group_sizes.get(&key).ok_or_else(|| {
                SpreadError::GroupingInconsistency {
                    parent: key.0.clone(),
                    year: key.1,
                    detail: "row matches no precomputed group".to_string(),
                }
            })?;
            current = Some(key);
            index_in_group = 0;
        }
        if index_in_group >= group_size {
            let (parent, year) = current.clone().unwrap_or_default();
            return Err(SpreadError::GroupingInconsistency {
                parent,
                year,
                detail: format!("group produced more than {group_size} rows"),
            });
        }

        #[allow(clippy::cast_precision_loss)]
        let fraction = 1.0 / group_size as f64;
        #[allow(clippy::cast_precision_loss)]
        let offset = index_in_group as f64;
        let base = f64::from(year);
        let display_parent_title = row
            .parent_primary_title
            .clone()
            .or_else(|| row.primary_title.clone());

        out.push(SpreadRecord {
            record: row,
            interval_start: fraction.mul_add(offset, base),
            interval_end: fraction.mul_add(offset + 1.0, base),
            display_parent_title,
        });
        index_in_group += 1;
    }
    Ok(out)
}

/// Spreads rows that have no sibling subdivision: each gets the entire year
/// `[year, year + 1)`, ordered by year alone, displayed under its own title.
pub fn spread_standalone(rows: Vec<EnrichedRecord>) -> Result<Vec<SpreadRecord>, SpreadError> {
    if rows.is_empty() {
        warn!("spread requested for an empty subset");
        return Ok(Vec::new());
    }

    let mut rows = rows;
    rows.sort_by(|a, b| a.start_year.cmp(&b.start_year));

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(year) = row.start_year else {
            return Err(SpreadError::MissingStartYear { id: row.id });
        };
        let base = f64::from(year);
        let display_parent_title = row.primary_title.clone();
        out.push(SpreadRecord {
            record: row,
            interval_start: base,
            interval_end: base + 1.0,
            display_parent_title,
        });
    }
    Ok(out)
}
