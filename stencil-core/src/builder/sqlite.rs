use super::{statement_builder, statement_builder_accessors};
use crate::StatementBuilder;
use std::fmt::Write;

statement_builder!(
    /// SQLite statements, schemas are never written.
    SqLiteBuilder
);

impl StatementBuilder for SqLiteBuilder {
    statement_builder_accessors!();

    fn write_paging(&self, out: &mut String, _ordered: bool, skip: Option<u64>, top: Option<u64>) {
        if top.is_none() && skip.is_none() {
            return;
        }
        // OFFSET is only accepted after a LIMIT, -1 means no limit
        match top {
            Some(top) => {
                let _ = write!(out, "\nLIMIT {}", top);
            }
            None => out.push_str("\nLIMIT -1"),
        }
        if let Some(skip) = skip {
            let _ = write!(out, " OFFSET {}", skip);
        }
    }
}
