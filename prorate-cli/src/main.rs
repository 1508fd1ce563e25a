use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::debug;

use prorate_cli::settings::{OutputFormat, Settings};
use prorate_cli::{app, logging, render};
use prorate_core::LoanTerms;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Progressive bracket allocation and loan amortization.
#[derive(Debug, Parser)]
#[command(name = "prorate", version, about, long_about = None)]
struct Cli {
    /// TOML settings file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `prorate_core=trace`.
    /// Overrides `RUST_LOG` and the settings file.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output format. Defaults to the settings file, then `text`.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Allocate a quantity across progressive brackets.
    Allocate {
        /// Quantity to allocate, e.g. taxable income.
        #[arg(short, long, allow_negative_numbers = true)]
        quantity: Decimal,

        /// Bracket CSV with `upper_threshold,rate` columns.
        #[arg(short, long)]
        brackets: Option<PathBuf>,
    },

    /// Build a monthly amortization schedule for a fixed-payment loan.
    Amortize {
        /// Amount borrowed.
        #[arg(short, long, allow_negative_numbers = true)]
        principal: Decimal,

        /// Annual interest rate in percent, e.g. `6` for 6%.
        #[arg(short, long, allow_negative_numbers = true)]
        rate: Decimal,

        /// Term in years.
        #[arg(short, long)]
        years: u32,

        /// Extra principal paid every month.
        #[arg(long, default_value_t = Decimal::ZERO, allow_negative_numbers = true)]
        extra: Decimal,

        /// Print totals only, without the per-payment table.
        #[arg(long)]
        summary: bool,
    },
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings: {}", path.display()))?,
        None => Settings::default(),
    };

    let filter = logging::resolve_filter(cli.log_level.as_deref(), settings.log_level.as_deref())?;
    logging::init_logging(filter, settings.log_file.as_deref())?;

    let format = cli.format.unwrap_or(settings.format);
    debug!(?format, config = ?cli.config, "starting");

    let report = match cli.command {
        Command::Allocate { quantity, brackets } => {
            app::allocation_report(quantity, brackets.as_deref(), &settings)?
        }
        Command::Amortize {
            principal,
            rate,
            years,
            extra,
            summary,
        } => {
            let terms =
                LoanTerms::new(principal, rate, years).with_extra_monthly_principal(extra);
            app::amortization_report(terms, summary)?
        }
    };

    println!("{}", render::render(&report, format)?);

    Ok(())
}
