use crate::{EntityDescriptor, EntityMapping, Result, RowLabeled, StatementSet, Value};
use std::sync::Arc;

/// Compile time shape of a single entity property, as discovered by `#[derive(Entity)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDef {
    /// Rust field name, also used as the parameter name in generated statements.
    pub name: &'static str,
    /// Default column name.
    pub column_name: &'static str,
    /// Position of the column in the generated statements.
    pub order: i32,
    /// Part of the primary key.
    pub key: bool,
    /// Value assigned by the database (identity, serial, defaults), refreshed after inserts.
    pub database_generated: bool,
}

/// A plain data type mapped to a relational table.
///
/// Normally implemented through `#[derive(Entity)]`, which also provides the process wide
/// [`EntityDescriptor`] of the type.
pub trait Entity: Sized + Send + Sync + 'static {
    fn table_name() -> &'static str;

    fn schema_name() -> &'static str;

    /// Mapped properties in declaration order.
    fn properties() -> &'static [PropertyDef];

    /// The descriptor of this entity type, created on first access and alive for the rest of
    /// the process.
    fn descriptor() -> &'static EntityDescriptor<Self>;

    /// Value of the property named `property`, `None` when the entity has no such property.
    fn property_value(&self, property: &str) -> Option<Value>;

    fn set_property_value(&mut self, property: &str, value: Value) -> Result<()>;

    /// Builds the entity from a row labeled with property names. Missing labels decode as NULL.
    fn from_row(row: RowLabeled) -> Result<Self>;

    /// Statements for `mapping`, or for the default mapping when `None`.
    fn sql_statements(mapping: Option<&EntityMapping>) -> Result<Arc<StatementSet<Self>>> {
        Self::descriptor().get_sql_statements(mapping)
    }
}
