//! Bracket tables as data.
//!
//! Brackets are configuration, not code: this crate reads them from CSV and
//! provides the built-in table the CLI falls back to.

mod defaults;
mod loader;

pub use defaults::default_brackets;
pub use loader::{BracketLoader, BracketLoaderError, BracketRecord};
