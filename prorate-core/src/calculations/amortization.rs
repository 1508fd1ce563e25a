//! Fixed-payment loan amortization.
//!
//! Produces the month-by-month schedule of a level-payment loan: each
//! payment first covers the month's interest on the outstanding balance and
//! the rest reduces principal.
//!
//! # Schedule Construction
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Monthly rate `r` = annual percent / 100 / 12; `n` = years × 12 |
//! | 2    | Payment = `P·r(1+r)^n / ((1+r)^n − 1)`, or `P / n` at zero interest, rounded to cents |
//! | 3    | Each regular month: interest = balance × `r`; principal = payment − interest (+ extra) |
//! | 4    | Final month: principal = whatever balance is left, absorbing rounding drift |
//! | 5    | Totals are summed from the entries, not derived from payment × `n` |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use prorate_core::calculations::amortize;
//!
//! let schedule = amortize(dec!(200000), dec!(6), 30).unwrap();
//!
//! assert_eq!(schedule.monthly_payment, dec!(1199.10));
//! assert_eq!(schedule.entries.len(), 360);
//! assert_eq!(schedule.entries.last().unwrap().remaining_balance, dec!(0));
//! assert_eq!(schedule.total_principal(), dec!(200000));
//! ```

use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::LoanTerms;
use crate::calculations::common::{max, round_half_up};
use crate::error::InvalidArgument;

/// One month of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    /// 1-based payment number.
    pub period: u32,

    /// Amount paid this month: `principal_payment + interest_payment`.
    pub payment: Decimal,

    /// Portion of the payment that reduced the balance.
    pub principal_payment: Decimal,

    /// Portion of the payment that covered interest.
    pub interest_payment: Decimal,

    /// Balance outstanding after this payment.
    pub remaining_balance: Decimal,
}

/// A complete repayment schedule and its totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    /// Terms the schedule was computed from.
    pub terms: LoanTerms,

    /// Periodic (monthly) interest rate as a fraction.
    pub monthly_rate: Decimal,

    /// Number of payments over the full term.
    pub number_of_payments: u32,

    /// Nominal level payment, before any extra principal.
    pub monthly_payment: Decimal,

    /// Payments in order. Shorter than `number_of_payments` when the loan is
    /// paid off early.
    pub entries: Vec<AmortizationEntry>,

    /// Sum of every payment actually made.
    pub total_payment: Decimal,

    /// `total_payment - principal`, with the principal rounded to cents.
    pub total_interest: Decimal,
}

impl AmortizationSchedule {
    /// Sum of the principal components; equals the principal rounded to cents.
    pub fn total_principal(&self) -> Decimal {
        self.entries.iter().map(|e| e.principal_payment).sum()
    }

    /// Whether the balance reached zero before the last scheduled payment.
    pub fn paid_off_early(&self) -> bool {
        self.entries.len() < self.number_of_payments as usize
    }
}

/// Schedule generator for one set of [`LoanTerms`].
#[derive(Debug, Clone)]
pub struct Amortizer {
    terms: LoanTerms,
}

impl Amortizer {
    pub fn new(terms: LoanTerms) -> Self {
        Self { terms }
    }

    /// Builds the full amortization schedule.
    ///
    /// Balances are tracked in cents, so a principal with a fraction of a
    /// cent is rounded half-up before the first period and the totals are
    /// taken against that rounded amount.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument`] if the terms fail
    /// [`LoanTerms::validate`], or [`InvalidArgument::PaymentOutOfRange`] if
    /// the annuity factor, a period's payment, or the schedule total
    /// overflows the decimal range. No entries are produced in either case.
    ///
    /// # Example: Extra Principal
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use prorate_core::{LoanTerms, calculations::Amortizer};
    ///
    /// let terms = LoanTerms::new(dec!(10000), dec!(5), 5)
    ///     .with_extra_monthly_principal(dec!(100));
    ///
    /// let schedule = Amortizer::new(terms).schedule().unwrap();
    ///
    /// assert!(schedule.paid_off_early());
    /// assert_eq!(schedule.total_principal(), dec!(10000));
    /// ```
    pub fn schedule(&self) -> Result<AmortizationSchedule, InvalidArgument> {
        self.terms.validate()?;

        let number_of_payments = self.terms.number_of_payments();
        let monthly_rate = self.monthly_rate();
        let monthly_payment = self.monthly_payment(monthly_rate, number_of_payments)?;

        let principal = round_half_up(self.terms.principal);
        let mut balance = principal;
        let mut entries = Vec::with_capacity(number_of_payments as usize);

        for period in 1..=number_of_payments {
            let entry = if period == number_of_payments {
                self.final_period(period, balance, monthly_rate)?
            } else {
                self.regular_period(period, balance, monthly_payment, monthly_rate)?
            };

            balance = entry.remaining_balance;
            entries.push(entry);

            if balance <= Decimal::ZERO && period < number_of_payments {
                self.log_early_payoff(period, number_of_payments);
                break;
            }
        }

        let total_payment = entries
            .iter()
            .try_fold(Decimal::ZERO, |total, e| total.checked_add(e.payment))
            .ok_or_else(|| self.out_of_range())?;
        let total_interest = total_payment - principal;

        debug!(
            principal = %principal,
            monthly_payment = %monthly_payment,
            payments = entries.len(),
            total_interest = %total_interest,
            "built amortization schedule"
        );

        Ok(AmortizationSchedule {
            terms: self.terms.clone(),
            monthly_rate,
            number_of_payments,
            monthly_payment,
            entries,
            total_payment,
            total_interest,
        })
    }

    /// Periodic interest rate: annual percent / 100 / 12.
    pub fn monthly_rate(&self) -> Decimal {
        self.terms.annual_rate_percent / Decimal::ONE_HUNDRED / Decimal::from(12)
    }

    /// Nominal level payment, rounded to cents.
    fn monthly_payment(
        &self,
        monthly_rate: Decimal,
        number_of_payments: u32,
    ) -> Result<Decimal, InvalidArgument> {
        let principal = self.terms.principal;
        let straight_line = || round_half_up(principal / Decimal::from(number_of_payments));

        if monthly_rate.is_zero() {
            warn!(
                principal = %principal,
                number_of_payments,
                "Zero interest rate; using straight-line payments"
            );
            return Ok(straight_line());
        }

        let growth = (Decimal::ONE + monthly_rate)
            .checked_powu(u64::from(number_of_payments))
            .ok_or_else(|| self.out_of_range())?;
        let denominator = growth - Decimal::ONE;
        if denominator.is_zero() {
            // Rate too small to register over the term at decimal precision.
            return Ok(straight_line());
        }

        let payment = monthly_rate
            .checked_mul(growth)
            .and_then(|factor| principal.checked_mul(factor))
            .and_then(|numerator| numerator.checked_div(denominator))
            .ok_or_else(|| self.out_of_range())?;

        Ok(round_half_up(payment))
    }

    /// Any period before the last.
    ///
    /// The principal component is capped at the outstanding balance so that
    /// extra payments never drive the balance negative.
    fn regular_period(
        &self,
        period: u32,
        balance: Decimal,
        monthly_payment: Decimal,
        monthly_rate: Decimal,
    ) -> Result<AmortizationEntry, InvalidArgument> {
        let interest_payment = self.interest_on(balance, monthly_rate)?;
        let scheduled_principal = max(
            round_half_up(monthly_payment - interest_payment),
            Decimal::ZERO,
        );
        let extra = round_half_up(self.terms.extra_monthly_principal);
        let principal_payment = scheduled_principal.saturating_add(extra).min(balance);

        Ok(AmortizationEntry {
            period,
            payment: self.payment_of(principal_payment, interest_payment)?,
            principal_payment,
            interest_payment,
            remaining_balance: round_half_up(balance - principal_payment),
        })
    }

    /// The last scheduled period.
    ///
    /// Rounding each month's interest and principal to cents leaves a small
    /// residue by the end of the term. The final payment retires exactly the
    /// balance that is left, so its amount may differ from the nominal
    /// payment by a few cents.
    fn final_period(
        &self,
        period: u32,
        balance: Decimal,
        monthly_rate: Decimal,
    ) -> Result<AmortizationEntry, InvalidArgument> {
        let interest_payment = self.interest_on(balance, monthly_rate)?;
        let principal_payment = balance;

        Ok(AmortizationEntry {
            period,
            payment: self.payment_of(principal_payment, interest_payment)?,
            principal_payment,
            interest_payment,
            remaining_balance: Decimal::ZERO,
        })
    }

    fn interest_on(
        &self,
        balance: Decimal,
        monthly_rate: Decimal,
    ) -> Result<Decimal, InvalidArgument> {
        balance
            .checked_mul(monthly_rate)
            .map(round_half_up)
            .ok_or_else(|| self.out_of_range())
    }

    fn payment_of(
        &self,
        principal_payment: Decimal,
        interest_payment: Decimal,
    ) -> Result<Decimal, InvalidArgument> {
        principal_payment
            .checked_add(interest_payment)
            .ok_or_else(|| self.out_of_range())
    }

    fn out_of_range(&self) -> InvalidArgument {
        InvalidArgument::PaymentOutOfRange {
            principal: self.terms.principal,
            annual_rate_percent: self.terms.annual_rate_percent,
            number_of_payments: self.terms.number_of_payments(),
        }
    }

    fn log_early_payoff(
        &self,
        period: u32,
        number_of_payments: u32,
    ) {
        if self.terms.extra_monthly_principal.is_zero() {
            warn!(
                period,
                number_of_payments,
                "Balance reached zero before the final scheduled payment"
            );
        } else {
            debug!(
                period,
                number_of_payments,
                extra_monthly_principal = %self.terms.extra_monthly_principal,
                "Extra principal paid the loan off early"
            );
        }
    }
}

/// Builds the schedule for a plain level-payment loan.
///
/// Shorthand for `Amortizer::new(LoanTerms::new(..)).schedule()`.
pub fn amortize(
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_years: u32,
) -> Result<AmortizationSchedule, InvalidArgument> {
    Amortizer::new(LoanTerms::new(principal, annual_rate_percent, term_years)).schedule()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tracing_subscriber::fmt::format::FmtSpan;

    use super::*;

    /// Routes warnings to the test writer so the logging paths run.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_span_events(FmtSpan::NONE)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    fn assert_balances_non_increasing(schedule: &AmortizationSchedule) {
        let mut previous = schedule.terms.principal;
        for entry in &schedule.entries {
            assert!(
                entry.remaining_balance <= previous,
                "balance rose at period {}: {} > {}",
                entry.period,
                entry.remaining_balance,
                previous
            );
            assert!(entry.remaining_balance >= Decimal::ZERO);
            previous = entry.remaining_balance;
        }
    }

    // =========================================================================
    // monthly rate and payment tests
    // =========================================================================

    #[test]
    fn monthly_rate_divides_annual_percent() {
        let amortizer = Amortizer::new(LoanTerms::new(dec!(200000), dec!(6), 30));

        assert_eq!(amortizer.monthly_rate(), dec!(0.005));
    }

    #[test]
    fn monthly_payment_uses_annuity_formula() {
        let amortizer = Amortizer::new(LoanTerms::new(dec!(200000), dec!(6), 30));

        let payment = amortizer.monthly_payment(dec!(0.005), 360).unwrap();

        assert_eq!(payment, dec!(1199.10));
    }

    #[test]
    fn monthly_payment_is_straight_line_at_zero_rate() {
        let _guard = init_test_tracing();
        let amortizer = Amortizer::new(LoanTerms::new(dec!(1000), dec!(0), 1));

        let payment = amortizer.monthly_payment(Decimal::ZERO, 12).unwrap();

        assert_eq!(payment, dec!(83.33));
    }

    // =========================================================================
    // schedule tests
    // =========================================================================

    #[test]
    fn schedule_thirty_year_mortgage_fully_amortizes() {
        let schedule = amortize(dec!(200000), dec!(6), 30).unwrap();

        assert_eq!(schedule.monthly_rate, dec!(0.005));
        assert_eq!(schedule.number_of_payments, 360);
        assert_eq!(schedule.monthly_payment, dec!(1199.10));
        assert_eq!(schedule.entries.len(), 360);
        assert_eq!(schedule.entries[359].remaining_balance, dec!(0));
        assert_eq!(schedule.total_principal(), dec!(200000));
        assert_eq!(
            schedule.total_interest,
            schedule.total_payment - dec!(200000)
        );
        assert!(!schedule.paid_off_early());
        assert_balances_non_increasing(&schedule);
    }

    #[test]
    fn schedule_first_mortgage_period_splits_interest_and_principal() {
        let schedule = amortize(dec!(200000), dec!(6), 30).unwrap();

        let first = &schedule.entries[0];

        assert_eq!(first.period, 1);
        assert_eq!(first.interest_payment, dec!(1000.00));
        assert_eq!(first.principal_payment, dec!(199.10));
        assert_eq!(first.remaining_balance, dec!(199800.90));
        assert_eq!(first.payment, dec!(1199.10));
    }

    #[test]
    fn schedule_zero_rate_pays_equal_principal() {
        let _guard = init_test_tracing();

        let schedule = amortize(dec!(1200), dec!(0), 1).unwrap();

        assert_eq!(schedule.entries.len(), 12);
        for entry in &schedule.entries {
            assert_eq!(entry.interest_payment, dec!(0));
            assert_eq!(entry.principal_payment, dec!(100));
        }
        assert_eq!(schedule.entries[11].remaining_balance, dec!(0));
        assert_eq!(schedule.total_interest, dec!(0));
        assert_eq!(schedule.total_payment, dec!(1200));
    }

    #[test]
    fn schedule_periods_are_contiguous_from_one() {
        let schedule = amortize(dec!(5000), dec!(7.25), 2).unwrap();

        let periods: Vec<u32> = schedule.entries.iter().map(|e| e.period).collect();

        assert_eq!(periods, (1..=24).collect::<Vec<_>>());
    }

    #[test]
    fn schedule_totals_come_from_entries_not_nominal_payment() {
        let schedule = amortize(dec!(1000), dec!(0), 1).unwrap();

        // 83.33 × 12 = 999.96; the final period makes up the difference.
        assert_eq!(schedule.monthly_payment, dec!(83.33));
        assert_eq!(schedule.entries[11].principal_payment, dec!(83.37));
        assert_eq!(schedule.total_payment, dec!(1000));
        assert_eq!(schedule.total_interest, dec!(0));
    }

    #[test]
    fn schedule_extra_principal_pays_off_early_and_saves_interest() {
        let _guard = init_test_tracing();
        let plain = amortize(dec!(10000), dec!(5), 5).unwrap();
        let terms =
            LoanTerms::new(dec!(10000), dec!(5), 5).with_extra_monthly_principal(dec!(100));

        let accelerated = Amortizer::new(terms).schedule().unwrap();

        assert!(accelerated.paid_off_early());
        assert!(accelerated.entries.len() < plain.entries.len());
        assert!(accelerated.total_interest < plain.total_interest);
        assert_eq!(
            accelerated.entries.last().unwrap().remaining_balance,
            dec!(0)
        );
        assert_eq!(accelerated.total_principal(), dec!(10000));
        assert_balances_non_increasing(&accelerated);
    }

    #[test]
    fn schedule_rejects_invalid_terms() {
        assert_eq!(
            amortize(dec!(0), dec!(5), 10),
            Err(InvalidArgument::NonPositivePrincipal(dec!(0)))
        );
        assert_eq!(
            amortize(dec!(1000), dec!(-1), 10),
            Err(InvalidArgument::NegativeInterestRate(dec!(-1)))
        );
        assert_eq!(
            amortize(dec!(1000), dec!(5), 0),
            Err(InvalidArgument::ZeroTerm)
        );
    }

    #[test]
    fn schedule_reports_total_beyond_decimal_range() {
        let principal = Decimal::MAX / dec!(2);

        let result = amortize(principal, dec!(6), 30);

        assert_eq!(
            result,
            Err(InvalidArgument::PaymentOutOfRange {
                principal,
                annual_rate_percent: dec!(6),
                number_of_payments: 360,
            })
        );
    }

    #[test]
    fn schedule_extra_principal_at_decimal_limit_pays_off_first_period() {
        let _guard = init_test_tracing();
        let terms =
            LoanTerms::new(dec!(1000), dec!(6), 1).with_extra_monthly_principal(Decimal::MAX);

        let schedule = Amortizer::new(terms).schedule().unwrap();

        assert_eq!(schedule.entries.len(), 1);
        assert_eq!(schedule.entries[0].principal_payment, dec!(1000));
        assert_eq!(schedule.entries[0].interest_payment, dec!(5.00));
        assert_eq!(schedule.total_payment, dec!(1005.00));
    }

    #[test]
    fn schedule_rounds_sub_cent_principal_before_first_period() {
        let schedule = amortize(dec!(1000.005), dec!(5), 1).unwrap();

        assert_eq!(schedule.terms.principal, dec!(1000.005));
        assert_eq!(schedule.total_principal(), dec!(1000.01));
        assert_eq!(
            schedule.total_interest,
            schedule.total_payment - dec!(1000.01)
        );
        assert_eq!(schedule.entries[11].remaining_balance, dec!(0));
    }

    // =========================================================================
    // final period correction tests
    // =========================================================================

    #[test]
    fn final_period_retires_exact_remaining_balance() {
        let amortizer = Amortizer::new(LoanTerms::new(dec!(10000), dec!(12), 1));

        let entry = amortizer.final_period(12, dec!(887.49), dec!(0.01)).unwrap();

        assert_eq!(entry.principal_payment, dec!(887.49));
        assert_eq!(entry.interest_payment, dec!(8.87));
        assert_eq!(entry.payment, dec!(896.36));
        assert_eq!(entry.remaining_balance, dec!(0));
    }

    #[test]
    fn regular_period_caps_principal_at_balance() {
        let terms =
            LoanTerms::new(dec!(10000), dec!(12), 1).with_extra_monthly_principal(dec!(500));
        let amortizer = Amortizer::new(terms);

        let entry = amortizer
            .regular_period(11, dec!(300), dec!(888.49), dec!(0.01))
            .unwrap();

        assert_eq!(entry.interest_payment, dec!(3.00));
        assert_eq!(entry.principal_payment, dec!(300));
        assert_eq!(entry.payment, dec!(303.00));
        assert_eq!(entry.remaining_balance, dec!(0));
    }
}
