use crate::domain::TitleId;
use serde::{Deserialize, Serialize};

/// The denormalized output of the join assembler: a title joined with its own
/// rating, its episode link, and its parent's title and rating attributes.
///
/// Invariant: when `parent_id` is `None`, every `parent_*` field is `None`.
/// A dangling `parent_id` (no matching title) also leaves every `parent_*`
/// field `None` while the link fields stay populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRecord {
    pub id: TitleId,
    pub title_type: Option<String>,
    pub primary_title: Option<String>,
    pub original_title: Option<String>,
    pub is_adult: Option<bool>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub runtime_minutes: Option<i32>,
    pub genres: Option<String>,

    pub average_rating: Option<f64>,
    pub num_votes: Option<u64>,

    pub parent_id: Option<TitleId>,
    pub season_number: Option<i32>,
    pub episode_number: Option<i32>,

    pub parent_title_type: Option<String>,
    pub parent_primary_title: Option<String>,
    pub parent_original_title: Option<String>,
    pub parent_is_adult: Option<bool>,
    pub parent_start_year: Option<i32>,
    pub parent_end_year: Option<i32>,
    pub parent_runtime_minutes: Option<i32>,
    pub parent_genres: Option<String>,
    pub parent_average_rating: Option<f64>,
    pub parent_num_votes: Option<u64>,
}

impl EnrichedRecord {
    /// True when every parent-side attribute is unset.
    #[must_use]
    pub const fn parent_fields_empty(&self) -> bool {
        self.parent_title_type.is_none()
            && self.parent_primary_title.is_none()
            && self.parent_original_title.is_none()
            && self.parent_is_adult.is_none()
            && self.parent_start_year.is_none()
            && self.parent_end_year.is_none()
            && self.parent_runtime_minutes.is_none()
            && self.parent_genres.is_none()
            && self.parent_average_rating.is_none()
            && self.parent_num_votes.is_none()
    }
}
