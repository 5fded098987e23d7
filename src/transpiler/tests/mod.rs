//! Translator test modules.
//!
//! - `conditions`: criteria, groups, operators and parameters
//! - `subqueries`: scalar and IN subqueries with row caps
//! - `queries`: joins, combines and recursion

mod subqueries;
