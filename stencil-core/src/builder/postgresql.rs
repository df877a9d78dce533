use super::{statement_builder, statement_builder_accessors};
use crate::StatementBuilder;

statement_builder!(
    /// PostgreSQL statements: `"quoted"` identifiers, `RETURNING` refresh, `LIMIT .. OFFSET ..`
    /// paging.
    PostgreSqlBuilder
);

impl StatementBuilder for PostgreSqlBuilder {
    statement_builder_accessors!();
}
