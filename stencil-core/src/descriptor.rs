use crate::{
    ConfigurationError, Entity, EntityMapping, EntityMappingBuilder, EntityType, OrmConfiguration,
    Result, StatementSet,
};
use arc_swap::ArcSwap;
use std::{collections::HashMap, fmt, sync::Arc};

type Registry<E> = HashMap<EntityMapping, Arc<StatementSet<E>>>;

/// Per entity type owner of the default mapping and of the statement sets cache.
///
/// The cache is copy-on-write: lookups read an immutable snapshot without any lock, a miss
/// builds the statement set and publishes a new snapshot with a single compare-and-swap.
/// Concurrent misses on the same mapping may build more than one statement set, only one of
/// them gets published and returned from then on.
pub struct EntityDescriptor<E: Entity> {
    entity: EntityType,
    default_mapping: EntityMapping,
    /// Why the default mapping cannot generate statements, if it can't.
    default_mapping_error: Option<ConfigurationError>,
    registered: ArcSwap<Registry<E>>,
}

impl<E: Entity> EntityDescriptor<E> {
    /// Descriptor with the mapping auto generated from the shape of `E`.
    ///
    /// An invalid shape still yields a default mapping, it can be inspected and fixed through
    /// [`EntityMapping::to_builder`], but requesting its statements fails.
    pub fn new() -> Self {
        let builder = EntityMappingBuilder::auto_generated::<E>();
        let default_mapping_error = builder.check().err();
        let default_mapping = builder.into_mapping();
        match &default_mapping_error {
            Some(error) => log::error!(
                "The default mapping of `{}` is invalid: {}",
                default_mapping.entity().name(),
                error
            ),
            None => log::debug!(
                "Creating the entity descriptor of `{}` (default dialect {})",
                default_mapping.entity().name(),
                default_mapping.dialect()
            ),
        }
        Self {
            entity: default_mapping.entity(),
            default_mapping,
            default_mapping_error,
            registered: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    pub fn entity(&self) -> &EntityType {
        &self.entity
    }

    pub fn default_mapping(&self) -> &EntityMapping {
        &self.default_mapping
    }

    /// Mappings having a published statement set.
    pub fn registered_mappings(&self) -> Vec<EntityMapping> {
        self.registered.load().keys().cloned().collect()
    }

    /// Number of published statement sets.
    pub fn cached_statements(&self) -> usize {
        self.registered.load().len()
    }

    /// Statements for `mapping`, or for the default mapping when `None`.
    ///
    /// Equal mappings get the same statement set instance once it has been published. Fails when
    /// the mapping belongs to another entity or when its dialect has no statement builder, in
    /// which case nothing is cached.
    pub fn get_sql_statements(
        &self,
        mapping: Option<&EntityMapping>,
    ) -> Result<Arc<StatementSet<E>>> {
        let mapping = mapping.unwrap_or(&self.default_mapping);
        let mut current = self.registered.load_full();
        if let Some(statements) = current.get(mapping) {
            log::trace!(
                "Statements cache hit for `{}` ({})",
                self.entity.name(),
                mapping.dialect()
            );
            return Ok(statements.clone());
        }
        let statements = Arc::new(self.build_statements(mapping)?);
        loop {
            let mut registry = HashMap::clone(&current);
            registry.insert(mapping.clone(), statements.clone());
            let previous = self.registered.compare_and_swap(&current, Arc::new(registry));
            if Arc::ptr_eq(&previous, &current) {
                log::debug!(
                    "Published the {} statements of `{}` ({} cached)",
                    mapping.dialect(),
                    self.entity.name(),
                    current.len() + 1
                );
                return Ok(statements);
            }
            current = arc_swap::Guard::into_inner(previous);
            if let Some(published) = current.get(mapping) {
                log::debug!(
                    "Statements of `{}` ({}) were published concurrently, discarding the local ones",
                    self.entity.name(),
                    mapping.dialect()
                );
                return Ok(published.clone());
            }
        }
    }

    /// Dispatch to the statement builder factory registered for the mapping dialect.
    fn build_statements(&self, mapping: &EntityMapping) -> Result<StatementSet<E>> {
        if let Some(error) = &self.default_mapping_error {
            if *mapping == self.default_mapping {
                return Err(error.clone().into());
            }
        }
        if mapping.entity() != self.entity {
            return Err(ConfigurationError::EntityMismatch {
                expected: self.entity.name(),
                found: mapping.entity().name(),
            }
            .into());
        }
        let dialect = mapping.dialect();
        let factory = OrmConfiguration::builder_factory(dialect).inspect_err(|_| {
            log::warn!(
                "Cannot generate the statements of `{}`: dialect {} is not supported",
                self.entity.name(),
                dialect
            )
        })?;
        let configuration = OrmConfiguration::dialect_configuration(dialect)?;
        let builder = factory.create(configuration, &self.entity, mapping.clone());
        Ok(StatementSet::new(builder))
    }
}

impl<E: Entity> Default for EntityDescriptor<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> fmt::Debug for EntityDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("entity", &self.entity.name())
            .field("default_mapping", &self.default_mapping)
            .field("default_mapping_error", &self.default_mapping_error)
            .field("cached_statements", &self.cached_statements())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::EntityDescriptor;
    use crate::{
        ConfigurationError, Entity, EntityMappingBuilder, MsSqlBuilder, PostgreSqlBuilder,
        SqlDialect,
        testing::{Customer, DuplicateColumns, Order, init_logs},
    };
    use std::{
        sync::{Arc, Barrier},
        thread,
    };

    #[test]
    fn memoizes_equal_mappings() {
        init_logs();
        let descriptor = EntityDescriptor::<Order>::new();
        let mapping = descriptor
            .default_mapping()
            .to_builder()
            .dialect(SqlDialect::SqLite)
            .freeze()
            .unwrap();
        let first = descriptor.get_sql_statements(Some(&mapping)).unwrap();
        let equal = mapping.to_builder().freeze().unwrap();
        let second = descriptor.get_sql_statements(Some(&equal)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(descriptor.cached_statements(), 1);
    }

    #[test]
    fn default_mapping_is_used_for_none() {
        let descriptor = EntityDescriptor::<Order>::new();
        let implicit = descriptor.get_sql_statements(None).unwrap();
        let explicit = descriptor
            .get_sql_statements(Some(&descriptor.default_mapping().clone()))
            .unwrap();
        assert!(Arc::ptr_eq(&implicit, &explicit));
        assert_eq!(implicit.dialect(), SqlDialect::MsSql);
        assert!(implicit.builder().as_any().is::<MsSqlBuilder>());
        assert!(descriptor.default_mapping().is_frozen());
    }

    #[test]
    fn distinct_mappings_are_cached_independently() {
        let descriptor = EntityDescriptor::<Order>::new();
        let postgres = descriptor
            .default_mapping()
            .to_builder()
            .dialect(SqlDialect::PostgreSql)
            .freeze()
            .unwrap();
        let renamed = postgres.to_builder().table_name("archived_orders").freeze().unwrap();
        let a = descriptor.get_sql_statements(Some(&postgres)).unwrap();
        let b = descriptor.get_sql_statements(Some(&renamed)).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(a.builder().as_any().is::<PostgreSqlBuilder>());
        assert_eq!(b.mapping().table_name(), "archived_orders");
        assert_eq!(descriptor.cached_statements(), 2);
        let mut registered = descriptor.registered_mappings();
        registered.sort_by(|a, b| a.table_name().cmp(b.table_name()));
        assert_eq!(registered, [renamed, postgres]);
    }

    #[test]
    fn unsupported_dialect_leaves_the_cache_untouched() {
        let descriptor = EntityDescriptor::<Order>::new();
        descriptor.get_sql_statements(None).unwrap();
        let duckdb = descriptor
            .default_mapping()
            .to_builder()
            .dialect(SqlDialect::DuckDb)
            .freeze()
            .unwrap();
        let before = descriptor.cached_statements();
        let error = descriptor.get_sql_statements(Some(&duckdb)).unwrap_err();
        assert_eq!(
            error.downcast_ref::<ConfigurationError>(),
            Some(&ConfigurationError::UnsupportedDialect(SqlDialect::DuckDb))
        );
        assert_eq!(descriptor.cached_statements(), before);
        assert!(descriptor.get_sql_statements(None).is_ok());
    }

    #[test]
    fn mapping_of_another_entity_is_rejected() {
        let descriptor = EntityDescriptor::<Order>::new();
        let foreign = EntityMappingBuilder::auto_generated::<Customer>()
            .freeze()
            .unwrap();
        let error = descriptor.get_sql_statements(Some(&foreign)).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ConfigurationError>(),
            Some(ConfigurationError::EntityMismatch { .. })
        ));
        assert_eq!(descriptor.cached_statements(), 0);
    }

    #[test]
    fn concurrent_misses_publish_a_single_entry() {
        const THREADS: usize = 16;
        let descriptor = Arc::new(EntityDescriptor::<Order>::new());
        let mapping = descriptor
            .default_mapping()
            .to_builder()
            .dialect(SqlDialect::MySql)
            .freeze()
            .unwrap();
        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let descriptor = descriptor.clone();
                let mapping = mapping.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    descriptor.get_sql_statements(Some(&mapping)).unwrap()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(descriptor.cached_statements(), 1);
        let published = descriptor.get_sql_statements(Some(&mapping)).unwrap();
        assert!(results.iter().all(|v| Arc::ptr_eq(v, &published)));
    }

    #[test]
    fn invalid_default_mapping_is_never_published() {
        let descriptor = EntityDescriptor::<DuplicateColumns>::new();
        for mapping in [None, Some(descriptor.default_mapping())] {
            let error = descriptor.get_sql_statements(mapping).unwrap_err();
            assert_eq!(
                error.downcast_ref::<ConfigurationError>(),
                Some(&ConfigurationError::DuplicateColumn {
                    entity: std::any::type_name::<DuplicateColumns>(),
                    column: "x".into(),
                })
            );
        }
        assert_eq!(descriptor.cached_statements(), 0);
        assert!(DuplicateColumns::sql_statements(None).is_err());

        let fixed = descriptor
            .default_mapping()
            .to_builder()
            .property("b", |v| {
                v.set_column_name("y");
            })
            .freeze()
            .unwrap();
        let statements = descriptor.get_sql_statements(Some(&fixed)).unwrap();
        assert_eq!(
            statements.insert_sql().unwrap(),
            "INSERT INTO [duplicate_columns] ([x], [y])\nVALUES (@a, @b);"
        );
        assert_eq!(descriptor.cached_statements(), 1);
    }
}
