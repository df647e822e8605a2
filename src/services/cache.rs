//! Memoization for the two expensive stages of the pipeline.
//!
//! Two independent scopes: enriched catalogs keyed by a snapshot of the source
//! files, and spread timelines keyed by snapshot plus filter parameters. A
//! spread entry never outlives questions about its inputs because its key
//! embeds the snapshot it was derived from; evicting or invalidating one scope
//! does not touch the other.

use crate::config::SourcesConfig;
use crate::models::enriched::EnrichedRecord;
use crate::models::spread::SpreadRecord;
use crate::parser::SourceError;
use crate::services::catalog;
use crate::services::filter::TitleFilter;
use crate::services::spread::{self, SpreadError};
use moka::sync::Cache;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to stat {file}: {source}")]
    Stat {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Source(#[from] Arc<SourceError>),

    #[error(transparent)]
    Spread(#[from] Arc<SpreadError>),
}

/// Identity of one source file at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FileStamp {
    path: PathBuf,
    len: u64,
    modified: Option<SystemTime>,
}

impl FileStamp {
    fn capture(path: &Path) -> Result<Self, CacheError> {
        let meta = std::fs::metadata(path).map_err(|source| CacheError::Stat {
            file: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Identity of the whole input set for one enriched catalog. Two snapshots
/// compare equal only if every source file looks unchanged and the placeholder
/// year matches, so a catalog built around a year boundary is never reused
/// with a stale placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    titles: FileStamp,
    ratings: FileStamp,
    links: FileStamp,
    placeholder_year: i32,
}

impl SnapshotKey {
    pub fn capture(sources: &SourcesConfig, placeholder_year: i32) -> Result<Self, CacheError> {
        Ok(Self {
            titles: FileStamp::capture(&sources.titles_path)?,
            ratings: FileStamp::capture(&sources.ratings_path)?,
            links: FileStamp::capture(&sources.links_path)?,
            placeholder_year,
        })
    }

    #[must_use]
    pub const fn placeholder_year(&self) -> i32 {
        self.placeholder_year
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SpreadKey {
    snapshot: SnapshotKey,
    filter: String,
}

/// The two cache scopes. Cheap to clone and share; both inner caches are
/// concurrent and deduplicate loads, so two callers asking for the same key
/// at once trigger a single build.
#[derive(Clone)]
pub struct CatalogCache {
    enriched: Cache<SnapshotKey, Arc<Vec<EnrichedRecord>>>,
    spread: Cache<SpreadKey, Arc<Vec<SpreadRecord>>>,
}

impl CatalogCache {
    #[must_use]
    pub fn new(enriched_capacity: u64, spread_capacity: u64) -> Self {
        Self {
            enriched: Cache::builder().max_capacity(enriched_capacity).build(),
            spread: Cache::builder().max_capacity(spread_capacity).build(),
        }
    }

    /// Returns the enriched catalog for `key`, building it from the source
    /// files on a miss. Concurrent callers with the same key share one build.
    pub fn enriched_or_build(
        &self,
        key: &SnapshotKey,
        sources: &SourcesConfig,
    ) -> Result<Arc<Vec<EnrichedRecord>>, CacheError> {
        self.enriched
            .try_get_with(key.clone(), || {
                debug!("enriched cache miss, building catalog");
                catalog::build(sources, key.placeholder_year).map(Arc::new)
            })
            .map_err(CacheError::from)
    }

    /// Returns the spread timeline for `key` and `filter`, deriving it from
    /// `enriched` on a miss. A failed spread pass is not stored, and the
    /// enriched entry it was derived from stays valid.
    pub fn spread_or_build(
        &self,
        key: &SnapshotKey,
        filter: &TitleFilter,
        enriched: &Arc<Vec<EnrichedRecord>>,
    ) -> Result<Arc<Vec<SpreadRecord>>, CacheError> {
        let spread_key = SpreadKey {
            snapshot: key.clone(),
            filter: filter.cache_token(),
        };
        self.spread
            .try_get_with(spread_key, || {
                debug!(filter = %filter.cache_token(), "spread cache miss");
                let subset = filter.apply(enriched);
                let records = if filter.mode.is_episodes() {
                    spread::spread_episodes(subset)?
                } else {
                    spread::spread_standalone(subset)?
                };
                Ok::<_, SpreadError>(Arc::new(records))
            })
            .map_err(CacheError::from)
    }

    /// Drops every entry in both scopes.
    pub fn invalidate_all(&self) {
        self.enriched.invalidate_all();
        self.spread.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use uuid::Uuid;

    const TITLES: &str = "tconst\ttitleType\tprimaryTitle\toriginalTitle\tisAdult\tstartYear\tendYear\truntimeMinutes\tgenres\n\
        tt01\ttvSeries\tShow\tShow\t0\t2020\t\\N\t\\N\tDrama\n\
        tt02\ttvEpisode\tPilot\tPilot\t0\t2020\t\\N\t45\tDrama\n\
        tt03\ttvEpisode\tFinale\tFinale\t0\t2020\t\\N\t45\tDrama\n";
    const RATINGS: &str = "tconst\taverageRating\tnumVotes\n\
        tt01\t8.5\t50000\n\
        tt02\t8.0\t1000\n";
    const LINKS: &str = "tconst\tparentTconst\tseasonNumber\tepisodeNumber\n\
        tt02\ttt01\t1\t1\n\
        tt03\ttt01\t1\t2\n";

    fn fixture_sources() -> (SourcesConfig, PathBuf) {
        let dir = std::env::temp_dir().join(format!("yearline-cache-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let sources = SourcesConfig {
            titles_path: dir.join("titles.tsv"),
            ratings_path: dir.join("ratings.tsv"),
            links_path: dir.join("links.tsv"),
        };
        fs::write(&sources.titles_path, TITLES).unwrap();
        fs::write(&sources.ratings_path, RATINGS).unwrap();
        fs::write(&sources.links_path, LINKS).unwrap();
        (sources, dir)
    }

    #[test]
    fn repeated_lookups_share_one_catalog() {
        let (sources, dir) = fixture_sources();
        let cache = CatalogCache::new(4, 64);
        let key = SnapshotKey::capture(&sources, 2027).unwrap();

        let first = cache.enriched_or_build(&key, &sources).unwrap();
        let second = cache.enriched_or_build(&key, &sources).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 3);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn placeholder_year_is_part_of_the_identity() {
        let (sources, dir) = fixture_sources();
        let cache = CatalogCache::new(4, 64);
        let this_year = SnapshotKey::capture(&sources, 2027).unwrap();
        let next_year = SnapshotKey::capture(&sources, 2028).unwrap();
        assert_ne!(this_year, next_year);

        let a = cache.enriched_or_build(&this_year, &sources).unwrap();
        let b = cache.enriched_or_build(&next_year, &sources).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn spread_scope_is_keyed_by_filter_parameters() {
        let (sources, dir) = fixture_sources();
        let cache = CatalogCache::new(4, 64);
        let key = SnapshotKey::capture(&sources, 2027).unwrap();
        let enriched = cache.enriched_or_build(&key, &sources).unwrap();

        let loose = TitleFilter::default();
        let strict = TitleFilter {
            min_rating: Some(8.0),
            ..TitleFilter::default()
        };

        let a = cache.spread_or_build(&key, &loose, &enriched).unwrap();
        let b = cache.spread_or_build(&key, &loose, &enriched).unwrap();
        let c = cache.spread_or_build(&key, &strict, &enriched).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn invalidation_clears_both_scopes() {
        let (sources, dir) = fixture_sources();
        let cache = CatalogCache::new(4, 64);
        let key = SnapshotKey::capture(&sources, 2027).unwrap();

        let first = cache.enriched_or_build(&key, &sources).unwrap();
        cache.invalidate_all();
        // moka applies invalidation lazily; run pending work so the next
        // lookup is a genuine miss.
        cache.enriched.run_pending_tasks();
        let second = cache.enriched_or_build(&key, &sources).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_source_file_fails_capture() {
        let (sources, dir) = fixture_sources();
        fs::remove_file(&sources.ratings_path).unwrap();
        let err = SnapshotKey::capture(&sources, 2027).unwrap_err();
        assert!(matches!(err, CacheError::Stat { .. }));

        fs::remove_dir_all(dir).ok();
    }
}
