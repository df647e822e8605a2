use crate::domain::TitleId;
use serde::{Deserialize, Serialize};

/// One row of the title source. Every non-key column is nullable: the loader
/// maps the `\N` sentinel to `None` regardless of column type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleRecord {
    pub id: TitleId,
    pub title_type: Option<String>,
    pub primary_title: Option<String>,
    pub original_title: Option<String>,
    pub is_adult: Option<bool>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub runtime_minutes: Option<i32>,
    /// Comma-joined genre list, kept as the source stores it.
    pub genres: Option<String>,
}
