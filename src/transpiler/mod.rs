//! Oracle translator for the query IR.
//!
//! Compiles a [`Query`](crate::ast::Query) into unassembled fragments
//! (condition, sort, join, combine, pre-scripts). Statement assembly lives
//! in [`crate::statement`].
//!
//! Dialect conventions:
//! - identifiers `"UPPER"` (both toggles in [`OracleOptions`](crate::config::OracleOptions))
//! - parameters `:Name{seq}`
//! - row caps through `ROWNUM`, set difference `MINUS`
//! - hierarchy `START WITH ... CONNECT BY PRIOR ...`

pub mod context;
pub mod conversion;
pub mod criterion;
pub mod format;
pub mod query;

#[cfg(test)]
mod tests;

pub use context::{ROOT_ALIAS, TranslationContext};
pub use criterion::Fragment;
pub use format::{Formatter, wrap_keyword};
pub use query::{SelectParts, Translation};
