//! Text and JSON rendering of reports.

use std::fmt::Write;

use anyhow::Result;
use prorate_core::calculations::common::format_money;
use prorate_core::{AllocationResult, AmortizationSchedule};
use rust_decimal::Decimal;

use crate::app::Report;
use crate::settings::OutputFormat;

pub fn render(
    report: &Report,
    format: OutputFormat,
) -> Result<String> {
    match (format, report) {
        (OutputFormat::Json, Report::Allocation(result)) => Ok(serde_json::to_string_pretty(result)?),
        (OutputFormat::Json, Report::Amortization { schedule, .. }) => {
            Ok(serde_json::to_string_pretty(schedule)?)
        }
        (OutputFormat::Text, Report::Allocation(result)) => Ok(allocation_text(result)),
        (OutputFormat::Text, Report::Amortization {
            schedule,
            summary_only,
        }) => Ok(amortization_text(schedule, *summary_only)),
    }
}

fn percent(fraction: Decimal) -> String {
    format!("{}%", format_money(fraction * Decimal::ONE_HUNDRED))
}

fn allocation_text(result: &AllocationResult) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "Quantity: {}", format_money(result.quantity));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<24} {:>8} {:>16} {:>14}",
        "Bracket", "Rate", "Portion", "Amount"
    );
    for item in &result.line_items {
        let _ = writeln!(
            out,
            "{:<24} {:>8} {:>16} {:>14}",
            item.description,
            percent(item.rate),
            format_money(item.taxable_in_bracket),
            format_money(item.amount)
        );
    }
    let _ = writeln!(
        out,
        "{:<24} {:>8} {:>16} {:>14}",
        "Total",
        "",
        format_money(result.allocated_quantity()),
        format_money(result.total_amount)
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Effective rate: {}%", format_money(result.effective_rate));
    if let Some(rate) = result.marginal_rate() {
        let _ = writeln!(out, "Marginal rate: {}", percent(rate));
    }

    out
}

fn amortization_text(
    schedule: &AmortizationSchedule,
    summary_only: bool,
) -> String {
    let terms = &schedule.terms;
    let mut out = String::new();

    let _ = writeln!(out, "Principal:       {}", format_money(terms.principal));
    let _ = writeln!(
        out,
        "Annual rate:     {}%",
        format_money(terms.annual_rate_percent)
    );
    let _ = writeln!(
        out,
        "Term:            {} years ({} payments)",
        terms.term_years, schedule.number_of_payments
    );
    let _ = writeln!(out, "Monthly payment: {}", format_money(schedule.monthly_payment));
    if !terms.extra_monthly_principal.is_zero() {
        let _ = writeln!(
            out,
            "Extra principal: {}",
            format_money(terms.extra_monthly_principal)
        );
    }
    let _ = writeln!(out, "Total payment:   {}", format_money(schedule.total_payment));
    let _ = writeln!(out, "Total interest:  {}", format_money(schedule.total_interest));
    if schedule.paid_off_early() {
        let _ = writeln!(
            out,
            "Paid off after {} of {} payments",
            schedule.entries.len(),
            schedule.number_of_payments
        );
    }

    if summary_only {
        return out;
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:>6} {:>14} {:>14} {:>14} {:>16}",
        "Period", "Payment", "Principal", "Interest", "Balance"
    );
    for entry in &schedule.entries {
        let _ = writeln!(
            out,
            "{:>6} {:>14} {:>14} {:>14} {:>16}",
            entry.period,
            format_money(entry.payment),
            format_money(entry.principal_payment),
            format_money(entry.interest_payment),
            format_money(entry.remaining_balance)
        );
    }

    out
}
