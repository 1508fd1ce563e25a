//! Proration calculations.
//!
//! This module provides the two instantiations of the bracketed proration
//! engine: progressive bracket allocation and fixed-payment amortization.

pub mod allocation;
pub mod amortization;
pub mod common;

pub use allocation::{AllocationLineItem, AllocationResult, ProgressiveAllocator, allocate};
pub use amortization::{AmortizationEntry, AmortizationSchedule, Amortizer, amortize};
