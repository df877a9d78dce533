use super::{statement_builder, statement_builder_accessors};
use crate::{ConfigurationError, PropertyMapping, Result, StatementBuilder, separated_by};
use std::fmt::Write;

statement_builder!(
    /// MySQL / MariaDB statements: `` `quoted` `` identifiers, refreshed values are read back with
    /// a follow-up `SELECT`.
    MySqlBuilder
);

impl MySqlBuilder {
    fn write_refresh_select<'a>(
        &self,
        out: &mut String,
        properties: &mut dyn Iterator<Item = &'a PropertyMapping>,
        after_insert: bool,
    ) -> Result<()> {
        let mut properties = properties.peekable();
        if properties.peek().is_none() {
            return Ok(());
        }
        // The refreshed row is selected by key
        let mut keys = self.mapping.key_properties().peekable();
        if keys.peek().is_none() {
            return Err(ConfigurationError::NoKeyProperties {
                entity: self.entity.name(),
            }
            .into());
        }
        out.push_str(";\nSELECT ");
        self.write_selection_list(out, &mut properties);
        out.push_str("\nFROM ");
        self.write_table_name(out);
        out.push_str("\nWHERE ");
        separated_by(
            out,
            keys,
            |out, v| {
                self.write_column(out, v);
                out.push_str(" = ");
                if after_insert && v.is_database_generated() {
                    out.push_str("LAST_INSERT_ID()");
                } else {
                    self.write_parameter(out, v.name());
                }
            },
            " AND ",
        );
        Ok(())
    }
}

impl StatementBuilder for MySqlBuilder {
    statement_builder_accessors!();

    fn write_insert_default_values(&self, out: &mut String) {
        out.push_str("() VALUES ()");
    }

    fn write_insert_refresh(&self, out: &mut String) -> Result<()> {
        self.write_refresh_select(out, &mut self.mapping.refreshed_on_inserts(), true)
    }

    fn write_update_refresh(&self, out: &mut String) -> Result<()> {
        self.write_refresh_select(out, &mut self.mapping.refreshed_on_updates(), false)
    }

    fn write_paging(&self, out: &mut String, _ordered: bool, skip: Option<u64>, top: Option<u64>) {
        let _ = match (skip, top) {
            (None, None) => Ok(()),
            (None, Some(top)) => write!(out, "\nLIMIT {}", top),
            (Some(skip), Some(top)) => write!(out, "\nLIMIT {}, {}", skip, top),
            (Some(skip), None) => write!(out, "\nLIMIT {}, {}", skip, u64::MAX),
        };
    }
}
