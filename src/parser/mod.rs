pub mod tsv;

pub use tsv::{SourceError, load_links, load_ratings, load_titles};
