pub mod calculations;
pub mod error;
pub mod models;

pub use calculations::{
    AllocationLineItem, AllocationResult, AmortizationEntry, AmortizationSchedule, allocate,
    amortize,
};
pub use error::InvalidArgument;
pub use models::*;
