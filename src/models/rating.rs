use crate::domain::TitleId;
use serde::{Deserialize, Serialize};

/// Aggregate audience score for a title. Not every title has a rating row;
/// absence shows up downstream as `None` rating fields after the left join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRecord {
    pub id: TitleId,
    pub average_rating: Option<f64>,
    pub num_votes: Option<u64>,
}
