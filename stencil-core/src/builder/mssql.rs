use super::{statement_builder, statement_builder_accessors};
use crate::{PropertyMapping, Result, StatementBuilder, separated_by};
use std::fmt::Write;

statement_builder!(
    /// SQL Server statements: `[quoted]` identifiers, `OUTPUT inserted.*` refresh and
    /// `OFFSET .. FETCH` paging.
    MsSqlBuilder
);

impl MsSqlBuilder {
    fn write_output<'a>(
        &self,
        out: &mut String,
        properties: &mut dyn Iterator<Item = &'a PropertyMapping>,
    ) {
        let mut properties = properties.peekable();
        if properties.peek().is_none() {
            return;
        }
        out.push_str("\nOUTPUT ");
        separated_by(
            out,
            properties,
            |out, v| {
                out.push_str("inserted.");
                self.write_column_selection(out, v);
            },
            ", ",
        );
    }
}

impl StatementBuilder for MsSqlBuilder {
    statement_builder_accessors!();

    fn write_insert_output(&self, out: &mut String) {
        self.write_output(out, &mut self.mapping.refreshed_on_inserts());
    }

    fn write_insert_refresh(&self, _out: &mut String) -> Result<()> {
        Ok(())
    }

    fn write_update_output(&self, out: &mut String) {
        self.write_output(out, &mut self.mapping.refreshed_on_updates());
    }

    fn write_update_refresh(&self, _out: &mut String) -> Result<()> {
        Ok(())
    }

    fn write_paging(&self, out: &mut String, ordered: bool, skip: Option<u64>, top: Option<u64>) {
        if top.is_none() && skip.is_none() {
            return;
        }
        if !ordered {
            // OFFSET requires ORDER BY
            out.push_str("\nORDER BY ");
            let mut keys = self.mapping.key_properties().peekable();
            if keys.peek().is_some() {
                self.write_column_list(out, &mut keys);
            } else {
                out.push_str("(SELECT NULL)");
            }
        }
        let _ = write!(out, "\nOFFSET {} ROWS", skip.unwrap_or(0));
        if let Some(top) = top {
            let _ = write!(out, " FETCH NEXT {} ROWS ONLY", top);
        }
    }
}
