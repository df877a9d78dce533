use crate::SqlDialect;
use thiserror::Error;

/// Misconfiguration detected while resolving mappings, dialects or statement builders.
///
/// Returned wrapped inside [`crate::Error`], use `downcast_ref::<ConfigurationError>()` to
/// inspect it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Dialect {0} is not supported")]
    UnsupportedDialect(SqlDialect),
    #[error("Unknown dialect `{0}`")]
    UnknownDialectName(String),
    #[error("A mapping of `{found}` cannot be used to generate statements for `{expected}`")]
    EntityMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("Entity `{entity}` has no key properties, single row statements cannot be generated")]
    NoKeyProperties { entity: &'static str },
    #[error("Entity `{entity}` has no properties that can be updated")]
    NoUpdatableProperties { entity: &'static str },
    #[error("Property `{property}` is not part of the mapping of `{entity}`")]
    UnknownProperty {
        entity: &'static str,
        property: String,
    },
    #[error("Property `{property}` is mapped more than once in `{entity}`")]
    DuplicateProperty {
        entity: &'static str,
        property: String,
    },
    #[error("Column `{column}` is mapped by more than one property of `{entity}`")]
    DuplicateColumn {
        entity: &'static str,
        column: String,
    },
    #[error("Entity `{entity}` is mapped to an empty table name")]
    EmptyTableName { entity: &'static str },
}
