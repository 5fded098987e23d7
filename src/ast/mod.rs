//! Query IR: dialect-independent queries and commands.

pub mod command;
pub mod operators;
pub mod query;
pub mod values;

pub use command::*;
pub use operators::*;
pub use query::*;
pub use values::*;
