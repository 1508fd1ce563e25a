//! Built-in bracket table used when no table is configured.

use prorate_core::Bracket;
use rust_decimal::Decimal;

/// The calculator's stock three-band progressive table:
/// 10% up to 10,000, 15% up to 50,000, 25% above.
pub fn default_brackets() -> Vec<Bracket> {
    vec![
        Bracket::bounded(Decimal::new(10_000, 0), Decimal::new(10, 2)),
        Bracket::bounded(Decimal::new(50_000, 0), Decimal::new(15, 2)),
        Bracket::unbounded(Decimal::new(25, 2)),
    ]
}
