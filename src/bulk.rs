//! Destination naming for an external bulk-copy facility.
//!
//! Loading rows is the facility's job; this only formats the destination
//! table and columns the same way statements format them.

use serde::Deserialize;

use crate::config::OracleOptions;
use crate::transpiler::Formatter;

/// Source column to destination column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnMapping {
    pub source: String,
    pub destination: String,
}

impl ColumnMapping {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BulkCopyOptions {
    pub use_transaction: bool,
    /// Rows per batch sent by the facility, 0 for its default.
    pub batch_size: u32,
    /// Seconds, 0 for no timeout.
    pub timeout: u32,
    /// Progress notification interval in rows, 0 for none.
    pub notify_after: u32,
    pub uppercase: bool,
    pub wrap_with_quotes: bool,
    /// Explicit mappings; empty maps every source column to itself.
    pub column_mappings: Vec<ColumnMapping>,
}

impl Default for BulkCopyOptions {
    fn default() -> Self {
        Self {
            use_transaction: false,
            batch_size: 0,
            timeout: 0,
            notify_after: 0,
            uppercase: true,
            wrap_with_quotes: true,
            column_mappings: Vec::new(),
        }
    }
}

/// Formatted destination of one bulk copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkCopyPlan {
    pub destination_table: String,
    pub column_mappings: Vec<ColumnMapping>,
    pub use_transaction: bool,
    pub batch_size: Option<u32>,
    pub timeout: Option<u32>,
    pub notify_after: Option<u32>,
}

impl BulkCopyPlan {
    pub fn new<I, S>(table: &str, source_columns: I, options: &BulkCopyOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let formatter = Formatter::new(OracleOptions {
            uppercase: options.uppercase,
            wrap_with_quotes: options.wrap_with_quotes,
            formatting_guid: false,
        });
        let column_mappings = if options.column_mappings.is_empty() {
            source_columns
                .into_iter()
                .map(|c| ColumnMapping::new(c.as_ref(), formatter.format_identifier(c.as_ref())))
                .collect()
        } else {
            options
                .column_mappings
                .iter()
                .map(|m| ColumnMapping::new(&m.source, formatter.format_identifier(&m.destination)))
                .collect()
        };
        let positive = |n: u32| (n > 0).then_some(n);
        Self {
            destination_table: formatter.format_identifier(table),
            column_mappings,
            use_transaction: options.use_transaction,
            batch_size: positive(options.batch_size),
            timeout: positive(options.timeout),
            notify_after: positive(options.notify_after),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_from_source_columns() {
        let plan = BulkCopyPlan::new("orders", ["id", "amount"], &BulkCopyOptions::default());
        assert_eq!(plan.destination_table, "\"ORDERS\"");
        assert_eq!(
            plan.column_mappings,
            vec![
                ColumnMapping::new("id", "\"ID\""),
                ColumnMapping::new("amount", "\"AMOUNT\"")
            ]
        );
        assert_eq!(plan.batch_size, None);
    }

    #[test]
    fn test_plan_with_explicit_mappings() {
        let options = BulkCopyOptions {
            uppercase: false,
            wrap_with_quotes: false,
            batch_size: 500,
            column_mappings: vec![ColumnMapping::new("Total", "order_total")],
            ..BulkCopyOptions::default()
        };
        let plan = BulkCopyPlan::new("orders", ["ignored"], &options);
        assert_eq!(plan.destination_table, "orders");
        assert_eq!(plan.column_mappings, vec![ColumnMapping::new("Total", "order_total")]);
        assert_eq!(plan.batch_size, Some(500));
    }
}
