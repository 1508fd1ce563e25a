use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use prorate_core::calculations::ProgressiveAllocator;
use prorate_core::{Bracket, InvalidArgument};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading a bracket table.
#[derive(Debug, Error)]
pub enum BracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("cannot open bracket file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid bracket table: {0}")]
    InvalidSchedule(#[from] InvalidArgument),
}

impl From<csv::Error> for BracketLoaderError {
    fn from(err: csv::Error) -> Self {
        BracketLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of a bracket CSV file.
///
/// - `upper_threshold`: inclusive upper bound of the bracket; an empty cell
///   (or `unbounded`) marks the final, open-ended bracket
/// - `rate`: the bracket rate as a fraction (e.g. `0.15` for 15%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    #[serde(deserialize_with = "deserialize_threshold")]
    pub upper_threshold: Option<Decimal>,
    pub rate: Decimal,
}

impl From<BracketRecord> for Bracket {
    fn from(record: BracketRecord) -> Self {
        Bracket {
            upper_threshold: record.upper_threshold,
            rate: record.rate,
        }
    }
}

fn deserialize_threshold<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("unbounded") => Ok(None),
        Some(s) => s.parse::<Decimal>().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Loader for bracket tables stored as CSV.
///
/// Rows must appear in ascending threshold order; the loader validates the
/// whole table with the same rules the allocator applies, so a table that
/// loads is a table that allocates.
pub struct BracketLoader;

impl BracketLoader {
    /// Parse bracket records from a CSV reader without validating them.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketRecord>, BracketLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(false)
            .from_reader(reader);

        let records = csv_reader
            .deserialize()
            .collect::<Result<Vec<BracketRecord>, csv::Error>>()?;

        Ok(records)
    }

    /// Parse and validate a bracket table.
    ///
    /// # Errors
    ///
    /// * [`BracketLoaderError::CsvParse`] if the CSV is malformed or a cell
    ///   is not a decimal.
    /// * [`BracketLoaderError::InvalidSchedule`] if the rows do not form a
    ///   valid progressive schedule.
    pub fn load<R: Read>(reader: R) -> Result<Vec<Bracket>, BracketLoaderError> {
        let brackets: Vec<Bracket> = Self::parse(reader)?
            .into_iter()
            .map(Bracket::from)
            .collect();

        ProgressiveAllocator::new(&brackets).validate()?;
        debug!(brackets = brackets.len(), "loaded bracket table");

        Ok(brackets)
    }

    /// Open `path` and load it as a bracket table.
    pub fn load_from_file(path: &Path) -> Result<Vec<Bracket>, BracketLoaderError> {
        let file = File::open(path).map_err(|source| BracketLoaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load(file)
    }
}
