use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::InvalidArgument;

/// Longest loan term the amortizer will schedule.
pub const MAX_TERM_YEARS: u32 = 100;

/// Parameters of a fixed-payment loan paid monthly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Amount borrowed.
    pub principal: Decimal,

    /// Nominal annual interest rate as a percentage, e.g. `6` for 6%.
    pub annual_rate_percent: Decimal,

    /// Length of the loan in years; payments are monthly.
    pub term_years: u32,

    /// Additional principal paid on top of every regular payment.
    ///
    /// Zero for a plain annuity. A positive value pays the loan off before
    /// the end of the term.
    #[serde(default)]
    pub extra_monthly_principal: Decimal,
}

impl LoanTerms {
    pub fn new(
        principal: Decimal,
        annual_rate_percent: Decimal,
        term_years: u32,
    ) -> Self {
        Self {
            principal,
            annual_rate_percent,
            term_years,
            extra_monthly_principal: Decimal::ZERO,
        }
    }

    pub fn with_extra_monthly_principal(
        mut self,
        extra: Decimal,
    ) -> Self {
        self.extra_monthly_principal = extra;
        self
    }

    /// Total number of monthly payments over the full term.
    pub fn number_of_payments(&self) -> u32 {
        self.term_years.saturating_mul(12)
    }

    /// Checks the terms before any schedule is computed.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument`] if:
    /// - `principal` is not positive
    /// - `annual_rate_percent` is negative
    /// - `term_years` is zero or above [`MAX_TERM_YEARS`]
    /// - `extra_monthly_principal` is negative
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use prorate_core::{InvalidArgument, LoanTerms};
    ///
    /// let terms = LoanTerms::new(dec!(-5000), dec!(6), 5);
    ///
    /// assert_eq!(
    ///     terms.validate(),
    ///     Err(InvalidArgument::NonPositivePrincipal(dec!(-5000)))
    /// );
    /// ```
    pub fn validate(&self) -> Result<(), InvalidArgument> {
        if self.principal <= Decimal::ZERO {
            return Err(InvalidArgument::NonPositivePrincipal(self.principal));
        }
        if self.annual_rate_percent < Decimal::ZERO {
            return Err(InvalidArgument::NegativeInterestRate(
                self.annual_rate_percent,
            ));
        }
        if self.term_years == 0 {
            return Err(InvalidArgument::ZeroTerm);
        }
        if self.term_years > MAX_TERM_YEARS {
            return Err(InvalidArgument::TermTooLong {
                years: self.term_years,
                max: MAX_TERM_YEARS,
            });
        }
        if self.extra_monthly_principal < Decimal::ZERO {
            return Err(InvalidArgument::NegativeExtraPrincipal(
                self.extra_monthly_principal,
            ));
        }
        Ok(())
    }
}
