use crate::{ConfigurationError, Entity, OrmConfiguration, Result, SqlDialect};
use std::{
    any::{self, TypeId},
    borrow::Cow,
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

/// How a single entity property maps to a column.
///
/// Mutable only through [`EntityMappingBuilder::property`], a frozen [`EntityMapping`] hands out
/// shared references exclusively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyMapping {
    name: Cow<'static, str>,
    column_name: Cow<'static, str>,
    order: i32,
    key: bool,
    database_generated: bool,
    excluded_from_inserts: bool,
    excluded_from_updates: bool,
    refreshed_on_inserts: bool,
    refreshed_on_updates: bool,
}

impl PropertyMapping {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        Self {
            column_name: name.clone(),
            name,
            order: 0,
            key: false,
            database_generated: false,
            excluded_from_inserts: false,
            excluded_from_updates: false,
            refreshed_on_inserts: false,
            refreshed_on_updates: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn column_name(&self) -> &str {
        &self.column_name
    }
    pub fn order(&self) -> i32 {
        self.order
    }
    pub fn is_key(&self) -> bool {
        self.key
    }
    pub fn is_database_generated(&self) -> bool {
        self.database_generated
    }
    pub fn is_excluded_from_inserts(&self) -> bool {
        self.excluded_from_inserts || self.database_generated
    }
    pub fn is_excluded_from_updates(&self) -> bool {
        self.excluded_from_updates || self.database_generated || self.key
    }
    pub fn is_refreshed_on_inserts(&self) -> bool {
        self.refreshed_on_inserts || self.database_generated
    }
    pub fn is_refreshed_on_updates(&self) -> bool {
        self.refreshed_on_updates
    }

    pub fn set_column_name(&mut self, column_name: impl Into<Cow<'static, str>>) -> &mut Self {
        self.column_name = column_name.into();
        self
    }
    pub fn set_order(&mut self, order: i32) -> &mut Self {
        self.order = order;
        self
    }
    pub fn set_key(&mut self, key: bool) -> &mut Self {
        self.key = key;
        self
    }
    /// Database generated properties are never inserted or updated and are refreshed after an
    /// insert.
    pub fn set_database_generated(&mut self, database_generated: bool) -> &mut Self {
        self.database_generated = database_generated;
        self
    }
    pub fn exclude_from_inserts(&mut self, excluded: bool) -> &mut Self {
        self.excluded_from_inserts = excluded;
        self
    }
    pub fn exclude_from_updates(&mut self, excluded: bool) -> &mut Self {
        self.excluded_from_updates = excluded;
        self
    }
    pub fn refresh_on_inserts(&mut self, refreshed: bool) -> &mut Self {
        self.refreshed_on_inserts = refreshed;
        self
    }
    pub fn refresh_on_updates(&mut self, refreshed: bool) -> &mut Self {
        self.refreshed_on_updates = refreshed;
        self
    }
}

/// Identity of the entity type a mapping belongs to.
#[derive(Debug, Clone, Copy)]
pub struct EntityType {
    id: TypeId,
    name: &'static str,
}

impl EntityType {
    pub fn of<E: 'static>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: any::type_name::<E>(),
        }
    }
    pub fn id(&self) -> TypeId {
        self.id
    }
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityType {}

impl Hash for EntityType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct MappingState {
    entity: EntityType,
    table_name: Cow<'static, str>,
    schema_name: Cow<'static, str>,
    dialect: SqlDialect,
    properties: Box<[PropertyMapping]>,
}

/// Frozen description of how an entity maps to a table and which dialect it targets.
///
/// Equality and hashing are structural, which makes it usable as a cache key. There is no way
/// to change a mapping once frozen, derive a new one with [`EntityMapping::to_builder`].
#[derive(Clone)]
pub struct EntityMapping {
    state: Arc<MappingState>,
}

impl EntityMapping {
    /// Mapping derived from the shape of `E` targeting the configured default dialect.
    pub fn auto_generated<E: Entity>() -> Result<Self> {
        EntityMappingBuilder::auto_generated::<E>().freeze()
    }

    pub fn entity(&self) -> EntityType {
        self.state.entity
    }
    pub fn table_name(&self) -> &str {
        &self.state.table_name
    }
    pub fn schema_name(&self) -> &str {
        &self.state.schema_name
    }
    pub fn dialect(&self) -> SqlDialect {
        self.state.dialect
    }
    /// Always true, a mapping only exists in its frozen form.
    pub fn is_frozen(&self) -> bool {
        true
    }

    /// Properties ordered by column order.
    pub fn properties(&self) -> &[PropertyMapping] {
        &self.state.properties
    }
    pub fn property(&self, name: &str) -> Option<&PropertyMapping> {
        self.properties().iter().find(|v| v.name() == name)
    }
    pub fn key_properties(&self) -> impl Iterator<Item = &PropertyMapping> + Clone {
        self.properties().iter().filter(|v| v.is_key())
    }
    pub fn insert_properties(&self) -> impl Iterator<Item = &PropertyMapping> + Clone {
        self.properties()
            .iter()
            .filter(|v| !v.is_excluded_from_inserts())
    }
    pub fn update_properties(&self) -> impl Iterator<Item = &PropertyMapping> + Clone {
        self.properties()
            .iter()
            .filter(|v| !v.is_excluded_from_updates())
    }
    pub fn refreshed_on_inserts(&self) -> impl Iterator<Item = &PropertyMapping> + Clone {
        self.properties()
            .iter()
            .filter(|v| v.is_refreshed_on_inserts())
    }
    pub fn refreshed_on_updates(&self) -> impl Iterator<Item = &PropertyMapping> + Clone {
        self.properties()
            .iter()
            .filter(|v| v.is_refreshed_on_updates())
    }

    /// A mutable copy of this mapping, the mapping itself is left untouched.
    pub fn to_builder(&self) -> EntityMappingBuilder {
        EntityMappingBuilder {
            entity: self.state.entity,
            table_name: self.state.table_name.clone(),
            schema_name: self.state.schema_name.clone(),
            dialect: self.state.dialect,
            properties: self.state.properties.to_vec(),
            unknown_property: None,
        }
    }
}

impl PartialEq for EntityMapping {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state) || self.state == other.state
    }
}

impl Eq for EntityMapping {}

impl Hash for EntityMapping {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.state.hash(state);
    }
}

impl fmt::Debug for EntityMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMapping")
            .field("entity", &self.state.entity.name())
            .field("table_name", &self.state.table_name)
            .field("schema_name", &self.state.schema_name)
            .field("dialect", &self.state.dialect)
            .field("properties", &self.state.properties)
            .finish()
    }
}

/// Mutable half of [`EntityMapping`]: configure, then [`freeze`](EntityMappingBuilder::freeze).
#[derive(Debug, Clone)]
pub struct EntityMappingBuilder {
    entity: EntityType,
    table_name: Cow<'static, str>,
    schema_name: Cow<'static, str>,
    dialect: SqlDialect,
    properties: Vec<PropertyMapping>,
    unknown_property: Option<String>,
}

impl EntityMappingBuilder {
    /// Empty mapping for `E`: no properties, default table and schema names.
    pub fn new<E: Entity>() -> Self {
        Self {
            entity: EntityType::of::<E>(),
            table_name: E::table_name().into(),
            schema_name: E::schema_name().into(),
            dialect: OrmConfiguration::default_dialect(),
            properties: Vec::new(),
            unknown_property: None,
        }
    }

    /// Mapping for `E` built from the properties discovered by the derive.
    pub fn auto_generated<E: Entity>() -> Self {
        let mut result = Self::new::<E>();
        result.properties = E::properties()
            .iter()
            .map(|def| {
                let mut property = PropertyMapping::new(def.name);
                property
                    .set_column_name(def.column_name)
                    .set_order(def.order)
                    .set_key(def.key)
                    .set_database_generated(def.database_generated);
                property
            })
            .collect();
        result
    }

    pub fn table_name(mut self, table_name: impl Into<Cow<'static, str>>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn schema_name(mut self, schema_name: impl Into<Cow<'static, str>>) -> Self {
        self.schema_name = schema_name.into();
        self
    }

    pub fn dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Adds a property, or replaces the one having the same name.
    pub fn add_property(mut self, property: PropertyMapping) -> Self {
        match self.properties.iter_mut().find(|v| v.name == property.name) {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
        self
    }

    /// Edits an existing property. Naming a missing property makes `freeze` fail.
    pub fn property(mut self, name: &str, configure: impl FnOnce(&mut PropertyMapping)) -> Self {
        match self.properties.iter_mut().find(|v| v.name == name) {
            Some(property) => configure(property),
            None => {
                self.unknown_property.get_or_insert_with(|| name.to_string());
            }
        }
        self
    }

    /// Removes a property from the mapping, it won't appear in any statement.
    pub fn remove_property(mut self, name: &str) -> Self {
        let len = self.properties.len();
        self.properties.retain(|v| v.name != name);
        if self.properties.len() == len {
            self.unknown_property.get_or_insert_with(|| name.to_string());
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        Ok(self.check()?)
    }

    pub(crate) fn check(&self) -> std::result::Result<(), ConfigurationError> {
        let entity = self.entity.name();
        if let Some(property) = &self.unknown_property {
            return Err(ConfigurationError::UnknownProperty {
                entity,
                property: property.clone(),
            });
        }
        if self.table_name.is_empty() {
            return Err(ConfigurationError::EmptyTableName { entity });
        }
        let mut names = HashSet::new();
        let mut columns = HashSet::new();
        for property in &self.properties {
            if !names.insert(property.name()) {
                return Err(ConfigurationError::DuplicateProperty {
                    entity,
                    property: property.name().to_string(),
                });
            }
            if !columns.insert(property.column_name()) {
                return Err(ConfigurationError::DuplicateColumn {
                    entity,
                    column: property.column_name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Validates the configuration and turns it into an immutable mapping.
    pub fn freeze(self) -> Result<EntityMapping> {
        self.validate()?;
        Ok(self.into_mapping())
    }

    /// Freezes without validating.
    pub(crate) fn into_mapping(self) -> EntityMapping {
        let mut properties = self.properties;
        // Stable: equal orders keep the declaration order
        properties.sort_by_key(PropertyMapping::order);
        EntityMapping {
            state: Arc::new(MappingState {
                entity: self.entity,
                table_name: self.table_name,
                schema_name: self.schema_name,
                dialect: self.dialect,
                properties: properties.into_boxed_slice(),
            }),
        }
    }
}
