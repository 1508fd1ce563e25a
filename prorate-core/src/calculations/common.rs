//! Shared helpers for the proration calculations.
//!
//! All money values pass through [`round_half_up`] at the points where a
//! calculator commits to a two-decimal amount. Keeping a single rounding
//! rule here means the allocator and the amortizer can never disagree on
//! how a cent is rounded.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places, half away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use prorate_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(1199.1010)), dec!(1199.10));
/// assert_eq!(round_half_up(dec!(15.835)), dec!(15.84));
/// assert_eq!(round_half_up(dec!(-0.005)), dec!(-0.01));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the larger of two decimal values.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Formats an amount for bracket descriptions, grouping thousands with commas.
///
/// Trailing fractional zeros are dropped, so whole thresholds read as
/// integers.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use prorate_core::calculations::common::format_amount;
///
/// assert_eq!(format_amount(dec!(50000)), "50,000");
/// assert_eq!(format_amount(dec!(11925.50)), "11,925.5");
/// assert_eq!(format_amount(dec!(999)), "999");
/// ```
pub fn format_amount(value: Decimal) -> String {
    group_thousands(value.normalize())
}

/// Formats a money value with exactly two decimals and grouped thousands.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use prorate_core::calculations::common::format_money;
///
/// assert_eq!(format_money(dec!(1199.1)), "1,199.10");
/// assert_eq!(format_money(dec!(231676.384)), "231,676.38");
/// ```
pub fn format_money(value: Decimal) -> String {
    let mut rounded = round_half_up(value);
    rounded.rescale(2);
    group_thousands(rounded)
}

fn group_thousands(value: Decimal) -> String {
    let digits = value.abs().to_string();
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits.as_str(), None),
    };

    let mut formatted = String::with_capacity(digits.len() + whole.len() / 3 + 1);
    if value.is_sign_negative() && !value.is_zero() {
        formatted.push('-');
    }
    for (position, digit) in whole.chars().enumerate() {
        if position > 0 && (whole.len() - position) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(digit);
    }
    if let Some(fraction) = fraction {
        formatted.push('.');
        formatted.push_str(fraction);
    }
    formatted
}
