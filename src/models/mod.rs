pub mod enriched;
pub mod episode;
pub mod rating;
pub mod spread;
pub mod title;
