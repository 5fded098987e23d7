//! Identifier formatting for the Oracle dialect.

use crate::config::OracleOptions;
use crate::schema::EntityField;

const QUOTE: char = '"';
const PARAMETER_PREFIX: char = ':';

/// Case-folds and quotes identifiers according to [`OracleOptions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Formatter {
    options: OracleOptions,
}

impl Formatter {
    pub fn new(options: OracleOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &OracleOptions {
        &self.options
    }

    /// Uppercase then quote, each when enabled. Already-quoted names are not quoted twice.
    pub fn format_identifier(&self, name: &str) -> String {
        let name = if self.options.uppercase {
            name.to_uppercase()
        } else {
            name.to_string()
        };
        if self.options.wrap_with_quotes && !is_quoted(&name) {
            wrap_keyword(&name)
        } else {
            name
        }
    }

    /// `alias.COLUMN`
    pub fn column(&self, alias: &str, field: &EntityField) -> String {
        format!("{}.{}", alias, self.format_identifier(&field.column))
    }

    /// `alias.COLUMN`, with `AS "Property"` when a template is present or,
    /// if `convert_name` is set, when the column differs from the property.
    pub fn format_field(&self, alias: &str, field: &EntityField, convert_name: bool) -> String {
        let column = self.column(alias, field);
        match &field.query_format {
            Some(template) => format!(
                "{} AS {}",
                template.replace("{0}", &column),
                wrap_keyword(&field.property)
            ),
            None if convert_name && field.column != field.property => {
                format!("{} AS {}", column, wrap_keyword(&field.property))
            }
            None => column,
        }
    }

    /// Comma-separated [`Formatter::format_field`] list.
    pub fn format_fields<'a, I>(&self, alias: &str, fields: I, convert_name: bool) -> String
    where
        I: IntoIterator<Item = &'a EntityField>,
    {
        fields
            .into_iter()
            .map(|f| self.format_field(alias, f, convert_name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `:name`
    pub fn parameter(&self, name: &str) -> String {
        format!("{}{}", PARAMETER_PREFIX, name)
    }
}

/// Quote unconditionally, preserving case (used for output aliases).
pub fn wrap_keyword(name: &str) -> String {
    format!("{}{}{}", QUOTE, name, QUOTE)
}

fn is_quoted(name: &str) -> bool {
    name.len() >= 2 && name.starts_with(QUOTE) && name.ends_with(QUOTE)
}
