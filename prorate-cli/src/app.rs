use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use prorate_core::calculations::{Amortizer, ProgressiveAllocator};
use prorate_core::{AllocationResult, AmortizationSchedule, Bracket, LoanTerms};
use prorate_data::{BracketLoader, BracketLoaderError, default_brackets};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::settings::Settings;

/// Where the active bracket table came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BracketSource {
    CommandLine(PathBuf),
    SettingsFile(PathBuf),
    Inline,
    BuiltIn,
}

impl fmt::Display for BracketSource {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::CommandLine(path) | Self::SettingsFile(path) => write!(f, "{}", path.display()),
            Self::Inline => write!(f, "inline settings table"),
            Self::BuiltIn => write!(f, "built-in table"),
        }
    }
}

/// A computed result ready to be rendered.
#[derive(Debug, Clone)]
pub enum Report {
    Allocation(AllocationResult),
    Amortization {
        schedule: AmortizationSchedule,
        summary_only: bool,
    },
}

/// Chooses the bracket table to allocate against.
///
/// Precedence: `--brackets` CSV, then the settings `brackets_file`, then
/// inline `[[brackets]]`, then the built-in table.
pub fn resolve_brackets(
    cli_file: Option<&Path>,
    settings: &Settings,
) -> Result<(Vec<Bracket>, BracketSource), BracketLoaderError> {
    if let Some(path) = cli_file {
        let brackets = BracketLoader::load_from_file(path)?;
        return Ok((brackets, BracketSource::CommandLine(path.to_path_buf())));
    }
    if let Some(path) = &settings.brackets_file {
        let brackets = BracketLoader::load_from_file(path)?;
        return Ok((brackets, BracketSource::SettingsFile(path.clone())));
    }
    if !settings.brackets.is_empty() {
        ProgressiveAllocator::new(&settings.brackets).validate()?;
        return Ok((settings.brackets.clone(), BracketSource::Inline));
    }
    Ok((default_brackets(), BracketSource::BuiltIn))
}

/// Allocates `quantity` across the resolved bracket table.
pub fn allocation_report(
    quantity: Decimal,
    cli_file: Option<&Path>,
    settings: &Settings,
) -> Result<Report> {
    let (brackets, source) =
        resolve_brackets(cli_file, settings).context("Failed to load bracket table")?;
    info!(source = %source, brackets = brackets.len(), "using bracket table");

    let result = ProgressiveAllocator::new(&brackets)
        .allocate(quantity)
        .with_context(|| format!("Cannot allocate {quantity}"))?;

    Ok(Report::Allocation(result))
}

/// Builds the amortization schedule for `terms`.
pub fn amortization_report(
    terms: LoanTerms,
    summary_only: bool,
) -> Result<Report> {
    debug!(?terms, "amortizing loan");

    let schedule = Amortizer::new(terms)
        .schedule()
        .context("Cannot build amortization schedule")?;

    Ok(Report::Amortization {
        schedule,
        summary_only,
    })
}
