mod mssql;
mod mysql;
mod postgresql;
mod sqlite;

pub use mssql::*;
pub use mysql::*;
pub use postgresql::*;
pub use sqlite::*;

use crate::{
    ConfigurationError, DialectConfiguration, EntityMapping, EntityType, Parameter,
    PropertyMapping, Result, SqlDialect, Value, separated_by,
};
use std::{any::Any, borrow::Cow, fmt::Write, sync::Arc};

/// Constructs the statement builder of a dialect for an entity mapping.
///
/// The entity is identified by its [`EntityType`] rather than by its
/// [`EntityDescriptor`](crate::EntityDescriptor): the descriptor is generic over the entity and
/// factories are stored as trait objects shared by every entity.
///
/// Any `Fn(Arc<DialectConfiguration>, &EntityType, EntityMapping) -> Box<dyn StatementBuilder>`
/// is a factory, the built-in builders expose one as `create`.
pub trait StatementBuilderFactory: Send + Sync {
    fn create(
        &self,
        configuration: Arc<DialectConfiguration>,
        entity: &EntityType,
        mapping: EntityMapping,
    ) -> Box<dyn StatementBuilder>;
}

impl<F> StatementBuilderFactory for F
where
    F: Fn(Arc<DialectConfiguration>, &EntityType, EntityMapping) -> Box<dyn StatementBuilder>
        + Send
        + Sync,
{
    fn create(
        &self,
        configuration: Arc<DialectConfiguration>,
        entity: &EntityType,
        mapping: EntityMapping,
    ) -> Box<dyn StatementBuilder> {
        self(configuration, entity, mapping)
    }
}

/// Filtering, ordering and paging of a multiple rows select.
///
/// Conditions and ordering are raw SQL fragments, they can reference named parameters bound with
/// [`SelectOptions::bind`].
#[derive(Default, Debug, Clone, PartialEq)]
pub struct SelectOptions {
    pub condition: Option<Cow<'static, str>>,
    pub order_by: Option<Cow<'static, str>>,
    pub skip: Option<u64>,
    pub top: Option<u64>,
    pub parameters: Vec<Parameter>,
}

impl SelectOptions {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn condition(mut self, condition: impl Into<Cow<'static, str>>) -> Self {
        self.condition = Some(condition.into());
        self
    }
    pub fn order_by(mut self, order_by: impl Into<Cow<'static, str>>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }
    pub fn top(mut self, top: u64) -> Self {
        self.top = Some(top);
        self
    }
    pub fn bind(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }
}

/// Dialect printer generating the CRUD statements of one entity mapping.
///
/// The default methods produce the generic form (closest to PostgreSQL), dialects override the
/// pieces that differ. Every statement is terminated by `;` and separated by a newline from any
/// content already present in `out`.
pub trait StatementBuilder: Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn configuration(&self) -> &DialectConfiguration;

    fn entity(&self) -> &EntityType;

    fn mapping(&self) -> &EntityMapping;

    fn dialect(&self) -> SqlDialect {
        self.configuration().dialect
    }

    /// Escape occurrences of `search` with `replace` while copying into buffer.
    fn write_escaped(&self, out: &mut String, value: &str, search: &str, replace: &str) {
        if search.is_empty() {
            out.push_str(value);
            return;
        }
        let mut position = 0;
        for (i, _) in value.match_indices(search) {
            out.push_str(&value[position..i]);
            out.push_str(replace);
            position = i + search.len();
        }
        out.push_str(&value[position..]);
    }

    /// Delimit an identifier, doubling the closing delimiter inside it.
    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        let configuration = self.configuration();
        let end = &configuration.end_delimiter;
        out.push_str(&configuration.start_delimiter);
        self.write_escaped(out, value, end, &end.repeat(2));
        out.push_str(end);
    }

    fn write_table_name(&self, out: &mut String) {
        let mapping = self.mapping();
        if self.configuration().is_using_schemas && !mapping.schema_name().is_empty() {
            self.write_identifier_quoted(out, mapping.schema_name());
            out.push('.');
        }
        self.write_identifier_quoted(out, mapping.table_name());
    }

    fn write_column(&self, out: &mut String, property: &PropertyMapping) {
        self.write_identifier_quoted(out, property.column_name());
    }

    /// Column aliased to the property name when they differ, rows come back labeled by property.
    fn write_column_selection(&self, out: &mut String, property: &PropertyMapping) {
        self.write_column(out, property);
        if property.column_name() != property.name() {
            out.push_str(" AS ");
            self.write_identifier_quoted(out, property.name());
        }
    }

    fn write_column_list<'a>(
        &self,
        out: &mut String,
        properties: &mut dyn Iterator<Item = &'a PropertyMapping>,
    ) {
        separated_by(out, properties, |out, v| self.write_column(out, v), ", ");
    }

    fn write_selection_list<'a>(
        &self,
        out: &mut String,
        properties: &mut dyn Iterator<Item = &'a PropertyMapping>,
    ) {
        separated_by(
            out,
            properties,
            |out, v| self.write_column_selection(out, v),
            ", ",
        );
    }

    fn write_parameter(&self, out: &mut String, name: &str) {
        out.push_str(&self.configuration().parameter_prefix);
        out.push_str(name);
    }

    /// `column = @property` pairs joined by `separator`.
    fn write_assignments<'a>(
        &self,
        out: &mut String,
        properties: &mut dyn Iterator<Item = &'a PropertyMapping>,
        separator: &str,
    ) {
        separated_by(
            out,
            properties,
            |out, v| {
                self.write_column(out, v);
                out.push_str(" = ");
                self.write_parameter(out, v.name());
            },
            separator,
        );
    }

    /// Condition matching the row identified by the key properties.
    fn write_key_condition(&self, out: &mut String) -> Result<()> {
        let mapping = self.mapping();
        if mapping.key_properties().next().is_none() {
            return Err(ConfigurationError::NoKeyProperties {
                entity: self.entity().name(),
            }
            .into());
        }
        self.write_assignments(out, &mut mapping.key_properties(), " AND ");
        Ok(())
    }

    fn write_statement_start(&self, out: &mut String) {
        if !out.is_empty() {
            out.push('\n');
        }
    }

    fn write_insert_default_values(&self, out: &mut String) {
        out.push_str("DEFAULT VALUES");
    }

    /// Fragment placed between the column list and `VALUES` of an insert.
    fn write_insert_output(&self, _out: &mut String) {}

    /// Fragment placed after the values of an insert to read back the refreshed properties.
    ///
    /// Fails when the dialect cannot read them back for this mapping.
    fn write_insert_refresh(&self, out: &mut String) -> Result<()> {
        self.write_returning(out, &mut self.mapping().refreshed_on_inserts());
        Ok(())
    }

    /// Fragment placed between `SET` and `WHERE` of an update.
    fn write_update_output(&self, _out: &mut String) {}

    /// Fragment placed after the condition of an update to read back the refreshed properties.
    fn write_update_refresh(&self, out: &mut String) -> Result<()> {
        self.write_returning(out, &mut self.mapping().refreshed_on_updates());
        Ok(())
    }

    fn write_returning<'a>(
        &self,
        out: &mut String,
        properties: &mut dyn Iterator<Item = &'a PropertyMapping>,
    ) {
        let mut properties = properties.peekable();
        if properties.peek().is_none() {
            return;
        }
        out.push_str("\nRETURNING ");
        self.write_selection_list(out, &mut properties);
    }

    /// Row limits of a select, `ordered` tells whether an `ORDER BY` was already written.
    fn write_paging(&self, out: &mut String, _ordered: bool, skip: Option<u64>, top: Option<u64>) {
        if top.is_none() && skip.is_none() {
            return;
        }
        out.push('\n');
        if let Some(top) = top {
            let _ = write!(out, "LIMIT {}", top);
        }
        if let Some(skip) = skip {
            if top.is_some() {
                out.push(' ');
            }
            let _ = write!(out, "OFFSET {}", skip);
        }
    }

    /// Insert a single entity.
    fn write_insert(&self, out: &mut String) -> Result<()> {
        let mapping = self.mapping();
        self.write_statement_start(out);
        out.push_str("INSERT INTO ");
        self.write_table_name(out);
        let mut properties = mapping.insert_properties().peekable();
        let empty = properties.peek().is_none();
        if !empty {
            out.push_str(" (");
            self.write_column_list(out, &mut properties);
            out.push(')');
        }
        self.write_insert_output(out);
        out.push('\n');
        if empty {
            self.write_insert_default_values(out);
        } else {
            out.push_str("VALUES (");
            separated_by(
                out,
                mapping.insert_properties(),
                |out, v| self.write_parameter(out, v.name()),
                ", ",
            );
            out.push(')');
        }
        self.write_insert_refresh(out)?;
        out.push(';');
        Ok(())
    }

    /// Update a single entity identified by its key.
    fn write_update(&self, out: &mut String) -> Result<()> {
        let mapping = self.mapping();
        if mapping.update_properties().next().is_none() {
            return Err(ConfigurationError::NoUpdatableProperties {
                entity: self.entity().name(),
            }
            .into());
        }
        self.write_statement_start(out);
        out.push_str("UPDATE ");
        self.write_table_name(out);
        out.push_str("\nSET ");
        self.write_assignments(out, &mut mapping.update_properties(), ", ");
        self.write_update_output(out);
        out.push_str("\nWHERE ");
        self.write_key_condition(out)?;
        self.write_update_refresh(out)?;
        out.push(';');
        Ok(())
    }

    /// Delete a single entity identified by its key.
    fn write_delete(&self, out: &mut String) -> Result<()> {
        self.write_statement_start(out);
        out.push_str("DELETE FROM ");
        self.write_table_name(out);
        out.push_str("\nWHERE ");
        self.write_key_condition(out)?;
        out.push(';');
        Ok(())
    }

    /// Select a single entity identified by its key.
    fn write_select_by_id(&self, out: &mut String) -> Result<()> {
        self.write_statement_start(out);
        out.push_str("SELECT ");
        self.write_selection_list(out, &mut self.mapping().properties().iter());
        out.push_str("\nFROM ");
        self.write_table_name(out);
        out.push_str("\nWHERE ");
        self.write_key_condition(out)?;
        out.push(';');
        Ok(())
    }

    /// Select multiple entities.
    fn write_select(&self, out: &mut String, options: &SelectOptions) {
        self.write_statement_start(out);
        out.push_str("SELECT ");
        self.write_selection_list(out, &mut self.mapping().properties().iter());
        out.push_str("\nFROM ");
        self.write_table_name(out);
        if let Some(condition) = &options.condition {
            out.push_str("\nWHERE ");
            out.push_str(condition);
        }
        if let Some(order_by) = &options.order_by {
            out.push_str("\nORDER BY ");
            out.push_str(order_by);
        }
        self.write_paging(out, options.order_by.is_some(), options.skip, options.top);
        out.push(';');
    }

    /// Count the rows matching `condition`, all of them when `None`.
    fn write_count(&self, out: &mut String, condition: Option<&str>) {
        self.write_statement_start(out);
        out.push_str("SELECT COUNT(*)\nFROM ");
        self.write_table_name(out);
        if let Some(condition) = condition {
            out.push_str("\nWHERE ");
            out.push_str(condition);
        }
        out.push(';');
    }

    /// Update the updatable columns of every row matching `condition`.
    fn write_bulk_update(&self, out: &mut String, condition: Option<&str>) -> Result<()> {
        let mapping = self.mapping();
        if mapping.update_properties().next().is_none() {
            return Err(ConfigurationError::NoUpdatableProperties {
                entity: self.entity().name(),
            }
            .into());
        }
        self.write_statement_start(out);
        out.push_str("UPDATE ");
        self.write_table_name(out);
        out.push_str("\nSET ");
        self.write_assignments(out, &mut mapping.update_properties(), ", ");
        if let Some(condition) = condition {
            out.push_str("\nWHERE ");
            out.push_str(condition);
        }
        out.push(';');
        Ok(())
    }

    /// Delete every row matching `condition`.
    fn write_bulk_delete(&self, out: &mut String, condition: Option<&str>) {
        self.write_statement_start(out);
        out.push_str("DELETE FROM ");
        self.write_table_name(out);
        if let Some(condition) = condition {
            out.push_str("\nWHERE ");
            out.push_str(condition);
        }
        out.push(';');
    }
}

/// Declares a statement builder struct holding its configuration, entity and mapping.
macro_rules! statement_builder {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name {
            configuration: ::std::sync::Arc<$crate::DialectConfiguration>,
            entity: $crate::EntityType,
            mapping: $crate::EntityMapping,
        }

        impl $name {
            pub fn new(
                configuration: ::std::sync::Arc<$crate::DialectConfiguration>,
                entity: &$crate::EntityType,
                mapping: $crate::EntityMapping,
            ) -> Self {
                Self {
                    configuration,
                    entity: *entity,
                    mapping,
                }
            }

            /// Factory registered for the dialect by default.
            pub fn create(
                configuration: ::std::sync::Arc<$crate::DialectConfiguration>,
                entity: &$crate::EntityType,
                mapping: $crate::EntityMapping,
            ) -> Box<dyn $crate::StatementBuilder> {
                Box::new(Self::new(configuration, entity, mapping))
            }
        }
    };
}

/// Accessors shared by every builder declared with `statement_builder!`.
macro_rules! statement_builder_accessors {
    () => {
        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }
        fn configuration(&self) -> &$crate::DialectConfiguration {
            &self.configuration
        }
        fn entity(&self) -> &$crate::EntityType {
            &self.entity
        }
        fn mapping(&self) -> &$crate::EntityMapping {
            &self.mapping
        }
    };
}

pub(crate) use {statement_builder, statement_builder_accessors};
