//! Tabular source loader for the three tab-separated catalog files.
//!
//! Parsing rules shared by all sources: header row required, quoting disabled
//! entirely (titles legitimately contain quote characters, so quotes are
//! data), line-feed terminated rows, and the `\N` sentinel mapped to `None`
//! for every nullable column. A malformed row is fatal for the whole load;
//! there is no partial-row recovery.

use crate::domain::TitleId;
use crate::models::episode::EpisodeLink;
use crate::models::rating::RatingRecord;
use crate::models::title::TitleRecord;
use csv::{ReaderBuilder, StringRecord, Terminator};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// The two-character escape the sources use for "no value".
const NULL_SENTINEL: &str = "\\N";

const TITLE_HEADERS: [&str; 9] = [
    "tconst",
    "titleType",
    "primaryTitle",
    "originalTitle",
    "isAdult",
    "startYear",
    "endYear",
    "runtimeMinutes",
    "genres",
];
const RATING_HEADERS: [&str; 3] = ["tconst", "averageRating", "numVotes"];
const LINK_HEADERS: [&str; 4] = ["tconst", "parentTconst", "seasonNumber", "episodeNumber"];

/// Errors raised while loading a tabular source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}: malformed row: {reason}")]
    Format {
        file: String,
        line: u64,
        reason: String,
    },
}

impl SourceError {
    fn format(file: &str, line: u64, reason: impl Into<String>) -> Self {
        Self::Format {
            file: file.to_string(),
            line,
            reason: reason.into(),
        }
    }
}

pub fn load_titles(path: &Path) -> Result<Vec<TitleRecord>, SourceError> {
    let name = path.display().to_string();
    let file = open(path, &name)?;
    read_titles(file, &name)
}

pub fn load_ratings(path: &Path) -> Result<Vec<RatingRecord>, SourceError> {
    let name = path.display().to_string();
    let file = open(path, &name)?;
    read_ratings(file, &name)
}

pub fn load_links(path: &Path) -> Result<Vec<EpisodeLink>, SourceError> {
    let name = path.display().to_string();
    let file = open(path, &name)?;
    read_links(file, &name)
}

pub fn read_titles<R: Read>(reader: R, name: &str) -> Result<Vec<TitleRecord>, SourceError> {
    for_each_row(reader, name, &TITLE_HEADERS, |row, line| {
        Ok(TitleRecord {
            id: TitleId::new(&row[0]),
            title_type: opt_string(&row[1]),
            primary_title: opt_string(&row[2]),
            original_title: opt_string(&row[3]),
            is_adult: opt_bool(name, line, TITLE_HEADERS[4], &row[4])?,
            start_year: opt_i32(name, line, TITLE_HEADERS[5], &row[5])?,
            end_year: opt_i32(name, line, TITLE_HEADERS[6], &row[6])?,
            runtime_minutes: opt_i32(name, line, TITLE_HEADERS[7], &row[7])?,
            genres: opt_string(&row[8]),
        })
    })
}

pub fn read_ratings<R: Read>(reader: R, name: &str) -> Result<Vec<RatingRecord>, SourceError> {
    for_each_row(reader, name, &RATING_HEADERS, |row, line| {
        Ok(RatingRecord {
            id: TitleId::new(&row[0]),
            average_rating: opt_f64(name, line, RATING_HEADERS[1], &row[1])?,
            num_votes: opt_u64(name, line, RATING_HEADERS[2], &row[2])?,
        })
    })
}

pub fn read_links<R: Read>(reader: R, name: &str) -> Result<Vec<EpisodeLink>, SourceError> {
    for_each_row(reader, name, &LINK_HEADERS, |row, line| {
        Ok(EpisodeLink {
            id: TitleId::new(&row[0]),
            parent_id: opt_string(&row[1]).map(TitleId::new),
            season_number: opt_i32(name, line, LINK_HEADERS[2], &row[2])?,
            episode_number: opt_i32(name, line, LINK_HEADERS[3], &row[3])?,
        })
    })
}

fn open(path: &Path, name: &str) -> Result<File, SourceError> {
    File::open(path).map_err(|source| SourceError::Io {
        file: name.to_string(),
        source,
    })
}

fn for_each_row<R, T, F>(
    reader: R,
    name: &str,
    expected_headers: &[&str],
    mut parse: F,
) -> Result<Vec<T>, SourceError>
where
    R: Read,
    F: FnMut(&StringRecord, u64) -> Result<T, SourceError>,
{
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .terminator(Terminator::Any(b'\n'))
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| csv_format_error(name, &e))?
        .clone();
    if headers.iter().ne(expected_headers.iter().copied()) {
        return Err(SourceError::format(
            name,
            1,
            format!(
                "unexpected header row {:?}, expected {:?}",
                headers.iter().collect::<Vec<_>>(),
                expected_headers
            ),
        ));
    }

    let mut out = Vec::new();
    for result in rdr.records() {
        let row = result.map_err(|e| csv_format_error(name, &e))?;
        let line = row.position().map_or(0, csv::Position::line);
        if row.len() != expected_headers.len() {
            return Err(SourceError::format(
                name,
                line,
                format!(
                    "expected {} columns, found {}",
                    expected_headers.len(),
                    row.len()
                ),
            ));
        }
        out.push(parse(&row, line)?);
    }
    Ok(out)
}

fn csv_format_error(name: &str, err: &csv::Error) -> SourceError {
    let line = err.position().map_or(0, csv::Position::line);
    SourceError::format(name, line, err.to_string())
}

fn opt(field: &str) -> Option<&str> {
    if field == NULL_SENTINEL {
        None
    } else {
        Some(field)
    }
}

fn opt_string(field: &str) -> Option<String> {
    opt(field).map(str::to_string)
}

fn opt_i32(name: &str, line: u64, column: &str, field: &str) -> Result<Option<i32>, SourceError> {
    opt(field)
        .map(|v| {
            v.parse::<i32>().map_err(|_| {
                SourceError::format(name, line, format!("{column}: not an integer: {v:?}"))
            })
        })
        .transpose()
}

fn opt_u64(name: &str, line: u64, column: &str, field: &str) -> Result<Option<u64>, SourceError> {
    opt(field)
        .map(|v| {
            v.parse::<u64>().map_err(|_| {
                SourceError::format(
                    name,
                    line,
                    format!("{column}: not a non-negative integer: {v:?}"),
                )
            })
        })
        .transpose()
}

fn opt_f64(name: &str, line: u64, column: &str, field: &str) -> Result<Option<f64>, SourceError> {
    opt(field)
        .map(|v| {
            v.parse::<f64>().map_err(|_| {
                SourceError::format(name, line, format!("{column}: not a number: {v:?}"))
            })
        })
        .transpose()
}

/// Booleans are stored numerically (`0`/`1`) in the title source.
fn opt_bool(name: &str, line: u64, column: &str, field: &str) -> Result<Option<bool>, SourceError> {
    Ok(opt_f64(name, line, column, field)?.map(|v| v != 0.0))
}
