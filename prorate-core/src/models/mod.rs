mod bracket;
mod loan_terms;

pub use bracket::Bracket;
pub use loan_terms::{LoanTerms, MAX_TERM_YEARS};
