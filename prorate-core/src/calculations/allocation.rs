//! Progressive bracket allocation.
//!
//! Splits a quantity (typically taxable income) across an ascending sequence
//! of brackets, charging each bracket's portion at that bracket's rate.
//!
//! # Algorithm
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Start with `remaining = quantity` and a lower bound of zero |
//! | 2    | Bracket width is `upper_threshold - lower_bound`; an unbounded bracket absorbs `remaining` |
//! | 3    | Portion in bracket is the smaller of `remaining` and the width |
//! | 4    | Amount is the portion × rate, rounded to cents |
//! | 5    | Subtract the portion, move the lower bound up, repeat until nothing remains |
//! | 6    | Total is the rounded sum of amounts; effective rate is total / quantity as a percentage |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use prorate_core::{Bracket, calculations::ProgressiveAllocator};
//!
//! let brackets = [
//!     Bracket::bounded(dec!(10000), dec!(0.10)),
//!     Bracket::bounded(dec!(50000), dec!(0.15)),
//!     Bracket::unbounded(dec!(0.25)),
//! ];
//!
//! let result = ProgressiveAllocator::new(&brackets).allocate(dec!(60000)).unwrap();
//!
//! assert_eq!(result.total_amount, dec!(9500.00));
//! assert_eq!(result.effective_rate, dec!(15.83));
//! assert_eq!(result.line_items[1].description, "10,001 - 50,000");
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Bracket;
use crate::calculations::common::{format_amount, round_half_up};
use crate::error::InvalidArgument;

/// The slice of the quantity that fell into one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationLineItem {
    /// Threshold of the previous bracket, zero for the first.
    pub lower_bound: Decimal,

    /// Upper threshold of the bracket, `None` for the unbounded bracket.
    pub upper_threshold: Option<Decimal>,

    /// Rate applied to this bracket's portion.
    pub rate: Decimal,

    /// Portion of the quantity that fell within this bracket.
    pub taxable_in_bracket: Decimal,

    /// `taxable_in_bracket × rate`, rounded to cents.
    pub amount: Decimal,

    /// Human-readable span, e.g. `"Up to 10,000"` or `"Over 50,000"`.
    pub description: String,
}

/// Outcome of allocating a quantity across a bracket schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    /// The quantity that was allocated.
    pub quantity: Decimal,

    /// One entry per bracket reached, in ascending bracket order.
    ///
    /// Empty when the quantity is zero.
    pub line_items: Vec<AllocationLineItem>,

    /// Rounded sum of the line item amounts.
    pub total_amount: Decimal,

    /// `total_amount / quantity` as a percentage rounded to two places,
    /// or zero when the quantity is zero.
    pub effective_rate: Decimal,
}

impl AllocationResult {
    fn empty(quantity: Decimal) -> Self {
        Self {
            quantity,
            line_items: Vec::new(),
            total_amount: Decimal::ZERO,
            effective_rate: Decimal::ZERO,
        }
    }

    /// Rate of the highest bracket the quantity reached, if any.
    pub fn marginal_rate(&self) -> Option<Decimal> {
        self.line_items.last().map(|item| item.rate)
    }

    /// Sum of the per-bracket portions; always equals `quantity`.
    pub fn allocated_quantity(&self) -> Decimal {
        self.line_items
            .iter()
            .map(|item| item.taxable_in_bracket)
            .sum()
    }
}

/// Allocator over a borrowed, ascending bracket schedule.
#[derive(Debug, Clone)]
pub struct ProgressiveAllocator<'a> {
    brackets: &'a [Bracket],
}

impl<'a> ProgressiveAllocator<'a> {
    /// Creates an allocator over `brackets`.
    ///
    /// The schedule is checked on every call to [`allocate`](Self::allocate);
    /// call [`validate`](Self::validate) to check it up front.
    pub fn new(brackets: &'a [Bracket]) -> Self {
        Self { brackets }
    }

    /// Checks that the schedule is usable.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument`] if:
    /// - the schedule is empty
    /// - any threshold is zero or negative
    /// - thresholds are not strictly increasing
    /// - an unbounded bracket is not last, or the last bracket is bounded
    /// - any rate is outside `[0, 1]`
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use prorate_core::{Bracket, InvalidArgument, calculations::ProgressiveAllocator};
    ///
    /// let brackets = [
    ///     Bracket::bounded(dec!(50000), dec!(0.10)),
    ///     Bracket::bounded(dec!(10000), dec!(0.15)),
    ///     Bracket::unbounded(dec!(0.25)),
    /// ];
    ///
    /// assert_eq!(
    ///     ProgressiveAllocator::new(&brackets).validate(),
    ///     Err(InvalidArgument::NonIncreasingThreshold {
    ///         index: 2,
    ///         previous: dec!(50000),
    ///         threshold: dec!(10000),
    ///     })
    /// );
    /// ```
    pub fn validate(&self) -> Result<(), InvalidArgument> {
        let last = self.brackets.len().checked_sub(1).ok_or(InvalidArgument::NoBrackets)?;
        let mut previous: Option<Decimal> = None;

        for (position, bracket) in self.brackets.iter().enumerate() {
            let index = position + 1;

            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(InvalidArgument::InvalidRate {
                    index,
                    rate: bracket.rate,
                });
            }

            match bracket.upper_threshold {
                None if position != last => {
                    return Err(InvalidArgument::UnboundedBeforeLast(index));
                }
                None => {}
                Some(threshold) if position == last => {
                    return Err(InvalidArgument::BoundedLastBracket(threshold));
                }
                Some(threshold) if threshold <= Decimal::ZERO => {
                    return Err(InvalidArgument::NonPositiveThreshold { index, threshold });
                }
                Some(threshold) => {
                    if let Some(previous) = previous.filter(|previous| threshold <= *previous) {
                        return Err(InvalidArgument::NonIncreasingThreshold {
                            index,
                            previous,
                            threshold,
                        });
                    }
                    previous = Some(threshold);
                }
            }
        }

        Ok(())
    }

    /// Allocates `quantity` across the schedule.
    ///
    /// Iteration stops at the bracket that exhausts the quantity, so brackets
    /// above it produce no line items.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument`] if the schedule is invalid (see
    /// [`validate`](Self::validate)) or `quantity` is negative.
    pub fn allocate(
        &self,
        quantity: Decimal,
    ) -> Result<AllocationResult, InvalidArgument> {
        self.validate()?;

        if quantity < Decimal::ZERO {
            return Err(InvalidArgument::NegativeQuantity(quantity));
        }
        if quantity.is_zero() {
            return Ok(AllocationResult::empty(quantity));
        }

        let mut remaining = quantity;
        let mut lower_bound = Decimal::ZERO;
        let mut running_total = Decimal::ZERO;
        let mut line_items = Vec::with_capacity(self.brackets.len());

        for (position, bracket) in self.brackets.iter().enumerate() {
            if remaining <= Decimal::ZERO {
                break;
            }

            let item = self.allocate_bracket(position, bracket, lower_bound, remaining);

            running_total += item.amount;
            remaining -= item.taxable_in_bracket;
            if let Some(upper) = bracket.upper_threshold {
                lower_bound = upper;
            }
            line_items.push(item);
        }

        let total_amount = round_half_up(running_total);
        let effective_rate = self.effective_rate(total_amount, quantity);

        debug!(
            quantity = %quantity,
            brackets_reached = line_items.len(),
            total_amount = %total_amount,
            effective_rate = %effective_rate,
            "allocated quantity across brackets"
        );

        Ok(AllocationResult {
            quantity,
            line_items,
            total_amount,
            effective_rate,
        })
    }

    /// Computes the line item for one bracket given what is left to allocate.
    fn allocate_bracket(
        &self,
        position: usize,
        bracket: &Bracket,
        lower_bound: Decimal,
        remaining: Decimal,
    ) -> AllocationLineItem {
        let taxable_in_bracket = match bracket.upper_threshold {
            Some(upper) => remaining.min(upper - lower_bound),
            None => remaining,
        };

        AllocationLineItem {
            lower_bound,
            upper_threshold: bracket.upper_threshold,
            rate: bracket.rate,
            taxable_in_bracket,
            amount: round_half_up(taxable_in_bracket * bracket.rate),
            description: self.describe(position, bracket, lower_bound),
        }
    }

    /// Describes a bracket's span.
    ///
    /// The unbounded check comes first, so a single-bracket schedule reads
    /// `"Over 0"`.
    fn describe(
        &self,
        position: usize,
        bracket: &Bracket,
        lower_bound: Decimal,
    ) -> String {
        match bracket.upper_threshold {
            None => format!("Over {}", format_amount(lower_bound)),
            Some(upper) if position == 0 => format!("Up to {}", format_amount(upper)),
            Some(upper) => format!(
                "{} - {}",
                format_amount(lower_bound.saturating_add(Decimal::ONE)),
                format_amount(upper)
            ),
        }
    }

    fn effective_rate(
        &self,
        total_amount: Decimal,
        quantity: Decimal,
    ) -> Decimal {
        if quantity <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        // total_amount <= quantity, so divide before scaling to a percentage.
        round_half_up(total_amount / quantity * Decimal::ONE_HUNDRED)
    }
}

/// Allocates `quantity` across `brackets`.
///
/// Shorthand for `ProgressiveAllocator::new(brackets).allocate(quantity)`.
pub fn allocate(
    quantity: Decimal,
    brackets: &[Bracket],
) -> Result<AllocationResult, InvalidArgument> {
    ProgressiveAllocator::new(brackets).allocate(quantity)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn three_brackets() -> Vec<Bracket> {
        vec![
            Bracket::bounded(dec!(10000), dec!(0.10)),
            Bracket::bounded(dec!(50000), dec!(0.15)),
            Bracket::unbounded(dec!(0.25)),
        ]
    }

    // =========================================================================
    // validate tests
    // =========================================================================

    #[test]
    fn validate_accepts_single_unbounded_bracket() {
        let brackets = [Bracket::unbounded(dec!(0.20))];

        assert_eq!(ProgressiveAllocator::new(&brackets).validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_empty_schedule() {
        assert_eq!(
            ProgressiveAllocator::new(&[]).validate(),
            Err(InvalidArgument::NoBrackets)
        );
    }

    #[test]
    fn validate_rejects_equal_thresholds() {
        let brackets = [
            Bracket::bounded(dec!(10000), dec!(0.10)),
            Bracket::bounded(dec!(10000), dec!(0.15)),
            Bracket::unbounded(dec!(0.25)),
        ];

        assert_eq!(
            ProgressiveAllocator::new(&brackets).validate(),
            Err(InvalidArgument::NonIncreasingThreshold {
                index: 2,
                previous: dec!(10000),
                threshold: dec!(10000),
            })
        );
    }

    #[test]
    fn validate_rejects_zero_threshold() {
        let brackets = [
            Bracket::bounded(dec!(0), dec!(0.10)),
            Bracket::unbounded(dec!(0.25)),
        ];

        assert_eq!(
            ProgressiveAllocator::new(&brackets).validate(),
            Err(InvalidArgument::NonPositiveThreshold {
                index: 1,
                threshold: dec!(0),
            })
        );
    }

    #[test]
    fn validate_rejects_unbounded_bracket_in_the_middle() {
        let brackets = [
            Bracket::bounded(dec!(10000), dec!(0.10)),
            Bracket::unbounded(dec!(0.15)),
            Bracket::unbounded(dec!(0.25)),
        ];

        assert_eq!(
            ProgressiveAllocator::new(&brackets).validate(),
            Err(InvalidArgument::UnboundedBeforeLast(2))
        );
    }

    #[test]
    fn validate_rejects_bounded_last_bracket() {
        let brackets = [
            Bracket::bounded(dec!(10000), dec!(0.10)),
            Bracket::bounded(dec!(50000), dec!(0.15)),
        ];

        assert_eq!(
            ProgressiveAllocator::new(&brackets).validate(),
            Err(InvalidArgument::BoundedLastBracket(dec!(50000)))
        );
    }

    #[test]
    fn validate_rejects_rate_above_one() {
        let brackets = [
            Bracket::bounded(dec!(10000), dec!(0.10)),
            Bracket::unbounded(dec!(25)),
        ];

        assert_eq!(
            ProgressiveAllocator::new(&brackets).validate(),
            Err(InvalidArgument::InvalidRate {
                index: 2,
                rate: dec!(25),
            })
        );
    }

    // =========================================================================
    // allocate tests
    // =========================================================================

    #[test]
    fn allocate_spreads_quantity_across_all_brackets() {
        let result = allocate(dec!(60000), &three_brackets()).unwrap();

        let amounts: Vec<_> = result.line_items.iter().map(|i| i.amount).collect();
        let portions: Vec<_> = result
            .line_items
            .iter()
            .map(|i| i.taxable_in_bracket)
            .collect();

        assert_eq!(portions, vec![dec!(10000), dec!(40000), dec!(10000)]);
        assert_eq!(amounts, vec![dec!(1000), dec!(6000), dec!(2500)]);
        assert_eq!(result.total_amount, dec!(9500));
        assert_eq!(result.effective_rate, dec!(15.83));
        assert_eq!(result.marginal_rate(), Some(dec!(0.25)));
    }

    #[test]
    fn allocate_describes_each_bracket_span() {
        let result = allocate(dec!(60000), &three_brackets()).unwrap();

        let descriptions: Vec<_> = result
            .line_items
            .iter()
            .map(|i| i.description.as_str())
            .collect();

        assert_eq!(
            descriptions,
            vec!["Up to 10,000", "10,001 - 50,000", "Over 50,000"]
        );
    }

    #[test]
    fn allocate_stops_at_bracket_that_exhausts_quantity() {
        let result = allocate(dec!(25000), &three_brackets()).unwrap();

        assert_eq!(result.line_items.len(), 2);
        assert_eq!(result.line_items[1].taxable_in_bracket, dec!(15000));
        assert_eq!(result.total_amount, dec!(3250));
        assert_eq!(result.effective_rate, dec!(13.00));
    }

    #[test]
    fn allocate_quantity_on_threshold_does_not_reach_next_bracket() {
        let result = allocate(dec!(10000), &three_brackets()).unwrap();

        assert_eq!(result.line_items.len(), 1);
        assert_eq!(result.total_amount, dec!(1000));
        assert_eq!(result.effective_rate, dec!(10.00));
    }

    #[test]
    fn allocate_zero_quantity_yields_zero_result() {
        let result = allocate(dec!(0), &three_brackets()).unwrap();

        assert!(result.line_items.is_empty());
        assert_eq!(result.total_amount, dec!(0));
        assert_eq!(result.effective_rate, dec!(0));
        assert_eq!(result.marginal_rate(), None);
    }

    #[test]
    fn allocate_rounds_each_bracket_amount_to_cents() {
        let brackets = [
            Bracket::bounded(dec!(100), dec!(0.105)),
            Bracket::unbounded(dec!(0.333)),
        ];

        let result = allocate(dec!(100.55), &brackets).unwrap();

        // 100 × 0.105 = 10.5; 0.55 × 0.333 = 0.18315
        assert_eq!(result.line_items[0].amount, dec!(10.50));
        assert_eq!(result.line_items[1].amount, dec!(0.18));
        assert_eq!(result.total_amount, dec!(10.68));
        assert_eq!(result.allocated_quantity(), dec!(100.55));
    }

    #[test]
    fn allocate_single_unbounded_bracket_is_flat_rate() {
        let brackets = [Bracket::unbounded(dec!(0.20))];

        let result = allocate(dec!(1234.56), &brackets).unwrap();

        assert_eq!(result.line_items.len(), 1);
        assert_eq!(result.line_items[0].description, "Over 0");
        assert_eq!(result.total_amount, dec!(246.91));
        assert_eq!(result.effective_rate, dec!(20.00));
    }

    #[test]
    fn allocate_quantity_near_decimal_limit_keeps_effective_rate() {
        let brackets = [Bracket::unbounded(dec!(1))];

        let quantity = Decimal::from_i128_with_scale(10_i128.pow(27), 0);

        let large = allocate(quantity, &brackets).unwrap();
        let max = allocate(Decimal::MAX, &brackets).unwrap();

        assert_eq!(large.total_amount, quantity);
        assert_eq!(large.effective_rate, dec!(100));
        assert_eq!(max.total_amount, Decimal::MAX);
        assert_eq!(max.effective_rate, dec!(100));
    }

    #[test]
    fn allocate_describes_bracket_ending_at_decimal_limit() {
        let brackets = [
            Bracket::bounded(Decimal::MAX - Decimal::ONE, dec!(0)),
            Bracket::bounded(Decimal::MAX, dec!(0)),
            Bracket::unbounded(dec!(0)),
        ];

        let result = allocate(Decimal::MAX, &brackets).unwrap();

        assert_eq!(result.line_items.len(), 2);
        assert_eq!(result.line_items[1].taxable_in_bracket, dec!(1));
        assert_eq!(
            result.line_items[1].description,
            "79,228,162,514,264,337,593,543,950,335 - 79,228,162,514,264,337,593,543,950,335"
        );
        assert_eq!(result.effective_rate, dec!(0));
    }

    #[test]
    fn allocate_rejects_negative_quantity() {
        let result = allocate(dec!(-1), &three_brackets());

        assert_eq!(result, Err(InvalidArgument::NegativeQuantity(dec!(-1))));
    }

    #[test]
    fn allocate_rejects_invalid_schedule_before_computing() {
        let brackets = [Bracket::bounded(dec!(10000), dec!(0.10))];

        let result = allocate(dec!(5000), &brackets);

        assert_eq!(result, Err(InvalidArgument::BoundedLastBracket(dec!(10000))));
    }
}
