//! Argument errors raised by the proration engine.
//!
//! Every failure the engine can report is an invalid argument: the engine
//! performs no I/O, so there is nothing to retry. Each variant names the
//! violated constraint and carries the offending value so callers can
//! re-prompt with a precise message.

use rust_decimal::Decimal;
use thiserror::Error;

/// Invalid input detected before any computation proceeds.
///
/// Bracket indexes in the variants are 1-based, matching how brackets are
/// numbered in user-facing tables.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidArgument {
    /// The quantity to allocate was negative.
    #[error("quantity must be non-negative, got {0}")]
    NegativeQuantity(Decimal),

    /// The bracket sequence was empty.
    #[error("at least one bracket is required")]
    NoBrackets,

    /// A bracket threshold was zero or negative.
    #[error("bracket {index} threshold must be positive, got {threshold}")]
    NonPositiveThreshold { index: usize, threshold: Decimal },

    /// A bracket threshold did not exceed the threshold before it.
    #[error(
        "bracket {index} threshold {threshold} must exceed the previous threshold {previous}"
    )]
    NonIncreasingThreshold {
        index: usize,
        previous: Decimal,
        threshold: Decimal,
    },

    /// An unbounded bracket appeared before the end of the sequence.
    #[error("only the last bracket may be unbounded, but bracket {0} is")]
    UnboundedBeforeLast(usize),

    /// The last bracket carried a threshold instead of being unbounded.
    #[error("the last bracket must be unbounded, got threshold {0}")]
    BoundedLastBracket(Decimal),

    /// A bracket rate fell outside `[0, 1]`.
    #[error("bracket {index} rate must be between 0 and 1, got {rate}")]
    InvalidRate { index: usize, rate: Decimal },

    /// The loan principal was zero or negative.
    #[error("principal must be positive, got {0}")]
    NonPositivePrincipal(Decimal),

    /// The annual interest rate was negative.
    #[error("annual interest rate must be non-negative, got {0}")]
    NegativeInterestRate(Decimal),

    /// The loan term was zero years.
    #[error("term must be at least one year")]
    ZeroTerm,

    /// The loan term exceeded the supported maximum.
    #[error("term must be at most {max} years, got {years}")]
    TermTooLong { years: u32, max: u32 },

    /// The extra monthly principal was negative.
    #[error("extra monthly principal must be non-negative, got {0}")]
    NegativeExtraPrincipal(Decimal),

    /// The annuity factor for the given terms does not fit in a decimal.
    #[error(
        "payment for principal {principal} at {annual_rate_percent}% over {number_of_payments} payments is out of range"
    )]
    PaymentOutOfRange {
        principal: Decimal,
        annual_rate_percent: Decimal,
        number_of_payments: u32,
    },
}
