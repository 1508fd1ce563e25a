use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One band of a progressive schedule.
///
/// A bracket covers the span from the previous bracket's threshold (or zero
/// for the first bracket) up to and including `upper_threshold`. The last
/// bracket of a schedule has no threshold and absorbs everything above the
/// one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    /// Inclusive upper bound of the bracket, `None` when unbounded.
    pub upper_threshold: Option<Decimal>,

    /// Fraction of the bracket's portion that is charged, in `[0, 1]`.
    pub rate: Decimal,
}

impl Bracket {
    pub fn bounded(
        upper_threshold: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            upper_threshold: Some(upper_threshold),
            rate,
        }
    }

    pub fn unbounded(rate: Decimal) -> Self {
        Self {
            upper_threshold: None,
            rate,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.upper_threshold.is_none()
    }
}
