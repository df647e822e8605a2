use crate::models::enriched::EnrichedRecord;
use serde::{Deserialize, Serialize};

/// An enriched record placed on the timeline: a disjoint fractional
/// sub-interval of its release year plus the title to group it under when
/// rendering.
///
/// Invariant: `interval_start < interval_end`, both within
/// `[start_year, start_year + 1)` except that the last sibling's end touches
/// `start_year + 1` exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadRecord {
    #[serde(flatten)]
    pub record: EnrichedRecord,
    pub interval_start: f64,
    pub interval_end: f64,
    /// The parent's primary title, or the row's own title for parentless rows.
    pub display_parent_title: Option<String>,
}
