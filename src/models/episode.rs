use crate::domain::TitleId;
use serde::{Deserialize, Serialize};

/// Links a child title to its parent and gives its ordinal position.
/// Titles that are not children simply have no row in this source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeLink {
    pub id: TitleId,
    pub parent_id: Option<TitleId>,
    pub season_number: Option<i32>,
    pub episode_number: Option<i32>,
}
