//! Error types for qail-oracle.

use thiserror::Error;

/// Boxed error raised by a database driver behind [`crate::engine::Connection`].
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for translation and execution.
#[derive(Debug, Error)]
pub enum Error {
    /// The entity is not registered in the schema.
    #[error("Unknown entity: '{0}'")]
    UnknownEntity(String),

    /// The property is not declared on the entity.
    #[error("Unknown field: '{entity}.{field}'")]
    UnknownField { entity: String, field: String },

    /// A join-based update/delete or an exists probe needs primary keys.
    #[error("{0} not set primary key")]
    MissingPrimaryKey(String),

    /// A subquery was used without a projection field.
    #[error("Subquery: {0} must set query field")]
    MissingQueryField(String),

    /// Aggregates other than COUNT need a field to operate on.
    #[error("Must specify the field to perform for the {function} operation on {entity}")]
    MissingAggregateField { entity: String, function: String },

    /// No explicit, primary-key or relation predicate could be found for a join.
    #[error("No join predicate between {from} and {to}")]
    MissingJoinPredicate { from: String, to: String },

    /// An update command without assignments.
    #[error("No fields are set to update for {0}")]
    EmptyUpdate(String),

    /// Auto-increment fields cannot be combined with table splitting.
    #[error("{0} has both an auto-increment field and a split field")]
    AutoIncrementWithSplit(String),

    /// A split entity was addressed without a split value.
    #[error("Get table name failed for {0}: no split value supplied")]
    MissingSplitValue(String),

    /// Operator, conversion or statement shape the dialect cannot express.
    #[error("Unsupported in Oracle: {0}")]
    Unsupported(String),

    /// Invalid value.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Error reported by the database driver, passed through unchanged.
    #[error("{0}")]
    Driver(#[source] DriverError),

    /// Execution was cancelled through the cancellation token.
    #[error("Execution cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML decode error.
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an unknown field error.
    pub fn unknown_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            entity: entity.into(),
            field: field.into(),
        }
    }

    /// Wrap a driver error without altering it.
    pub fn driver(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Driver(Box::new(err))
    }

    /// Whether this error is a translation-time configuration error.
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            Self::Driver(_) | Self::Cancelled | Self::Io(_) | Self::Toml(_) | Self::Config(_)
        )
    }
}

/// Result type alias for qail-oracle operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingQueryField("Order".into());
        assert_eq!(err.to_string(), "Subquery: Order must set query field");

        let err = Error::unknown_field("User", "Nickname");
        assert_eq!(err.to_string(), "Unknown field: 'User.Nickname'");
    }

    #[test]
    fn test_driver_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "ORA-03113: end-of-file");
        let err = Error::driver(io);
        assert_eq!(err.to_string(), "ORA-03113: end-of-file");
        assert!(!err.is_configuration());
        assert!(Error::MissingPrimaryKey("User".into()).is_configuration());
    }
}
