pub mod cache;
pub mod catalog;
pub mod filter;
pub mod spread;

pub use cache::CatalogCache;
pub use filter::TitleFilter;
