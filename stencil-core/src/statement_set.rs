use crate::{
    AsValue, Context, Entity, EntityMapping, Error, Executor, Parameter, PropertyMapping, Result,
    RowLabeled, SelectOptions, SqlDialect, Statement, StatementBuilder,
    stream::{Stream, StreamExt},
    util::memoized,
};
use futures::TryFutureExt;
use log::Level;
use std::{borrow::Cow, fmt, future::Future, marker::PhantomData, sync::OnceLock};

/// Dialect agnostic CRUD operations of an entity mapping.
///
/// Wraps the [`StatementBuilder`] selected for the mapping dialect, the generated SQL of the
/// single row statements is memoized on first use. Instances are obtained from
/// [`EntityDescriptor::get_sql_statements`](crate::EntityDescriptor::get_sql_statements) and
/// shared for the rest of the process.
pub struct StatementSet<E: Entity> {
    builder: Box<dyn StatementBuilder>,
    insert: OnceLock<String>,
    update: OnceLock<String>,
    delete: OnceLock<String>,
    select_by_id: OnceLock<String>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> StatementSet<E> {
    pub fn new(builder: Box<dyn StatementBuilder>) -> Self {
        Self {
            builder,
            insert: OnceLock::new(),
            update: OnceLock::new(),
            delete: OnceLock::new(),
            select_by_id: OnceLock::new(),
            _entity: PhantomData,
        }
    }

    pub fn builder(&self) -> &dyn StatementBuilder {
        self.builder.as_ref()
    }

    pub fn dialect(&self) -> SqlDialect {
        self.builder.dialect()
    }

    pub fn mapping(&self) -> &EntityMapping {
        self.builder.mapping()
    }

    pub fn insert_sql(&self) -> Result<&str> {
        memoized(&self.insert, || {
            let mut out = String::with_capacity(256);
            self.builder.write_insert(&mut out)?;
            Ok(out)
        })
    }

    pub fn update_sql(&self) -> Result<&str> {
        memoized(&self.update, || {
            let mut out = String::with_capacity(256);
            self.builder.write_update(&mut out)?;
            Ok(out)
        })
    }

    pub fn delete_sql(&self) -> Result<&str> {
        memoized(&self.delete, || {
            let mut out = String::with_capacity(128);
            self.builder.write_delete(&mut out)?;
            Ok(out)
        })
    }

    pub fn select_by_id_sql(&self) -> Result<&str> {
        memoized(&self.select_by_id, || {
            let mut out = String::with_capacity(256);
            self.builder.write_select_by_id(&mut out)?;
            Ok(out)
        })
    }

    pub fn select_sql(&self, options: &SelectOptions) -> String {
        let mut out = String::with_capacity(256);
        self.builder.write_select(&mut out, options);
        out
    }

    pub fn count_sql(&self, condition: Option<&str>) -> String {
        let mut out = String::with_capacity(128);
        self.builder.write_count(&mut out, condition);
        out
    }

    pub fn bulk_update_sql(&self, condition: Option<&str>) -> Result<String> {
        let mut out = String::with_capacity(256);
        self.builder.write_bulk_update(&mut out, condition)?;
        Ok(out)
    }

    pub fn bulk_delete_sql(&self, condition: Option<&str>) -> String {
        let mut out = String::with_capacity(128);
        self.builder.write_bulk_delete(&mut out, condition);
        out
    }

    fn bind_properties<'a>(
        &self,
        statement: &mut Statement,
        entity: &E,
        properties: impl Iterator<Item = &'a PropertyMapping>,
    ) -> Result<()> {
        for property in properties {
            let Some(value) = entity.property_value(property.name()) else {
                return Err(Error::msg(format!(
                    "Entity `{}` does not have a property `{}`",
                    self.builder.entity().name(),
                    property.name()
                )));
            };
            statement.bind(Cow::Owned(property.name().to_string()), value);
        }
        Ok(())
    }

    fn apply_row<'a>(
        &self,
        entity: &mut E,
        mut row: RowLabeled,
        properties: impl Iterator<Item = &'a PropertyMapping>,
    ) -> Result<()> {
        for property in properties {
            let value = row.take(property.name());
            entity
                .set_property_value(property.name(), value)
                .with_context(|| {
                    format!(
                        "While refreshing property `{}` of `{}`",
                        property.name(),
                        self.builder.entity().name()
                    )
                })?;
        }
        Ok(())
    }

    /// Insert `entity`, then assign the values generated by the database to it.
    pub fn insert<Exec: Executor>(
        &self,
        executor: &mut Exec,
        entity: &mut E,
    ) -> impl Future<Output = Result<()>> + Send {
        let mapping = self.mapping();
        let prepared = self.insert_sql().and_then(|sql| {
            let mut statement = Statement::new(sql);
            self.bind_properties(&mut statement, entity, mapping.insert_properties())?;
            Ok(statement)
        });
        let refresh = mapping.refreshed_on_inserts().next().is_some();
        async move {
            let statement = prepared?;
            if refresh {
                let row = executor.fetch_one(statement).await?.ok_or_else(|| {
                    Error::msg(format!(
                        "Insert into `{}` did not return the refreshed row",
                        mapping.table_name()
                    ))
                })?;
                self.apply_row(entity, row, mapping.refreshed_on_inserts())
            } else {
                executor.execute(statement).await.map(|_| ())
            }
        }
    }

    /// Update the row identified by the key of `entity`, returns `false` when no row matched.
    pub fn update<Exec: Executor>(
        &self,
        executor: &mut Exec,
        entity: &mut E,
    ) -> impl Future<Output = Result<bool>> + Send {
        let mapping = self.mapping();
        let prepared = self.update_sql().and_then(|sql| {
            let mut statement = Statement::new(sql);
            self.bind_properties(&mut statement, entity, mapping.update_properties())?;
            self.bind_properties(&mut statement, entity, mapping.key_properties())?;
            Ok(statement)
        });
        let refresh = mapping.refreshed_on_updates().next().is_some();
        async move {
            let statement = prepared?;
            if refresh {
                match executor.fetch_one(statement).await? {
                    Some(row) => {
                        self.apply_row(entity, row, mapping.refreshed_on_updates())?;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            } else {
                let affected = executor.execute(statement).await?;
                self.single_row(affected.rows_affected, "updated")
            }
        }
    }

    /// Delete the row identified by the key of `entity`, returns `false` when no row matched.
    pub fn delete<Exec: Executor>(
        &self,
        executor: &mut Exec,
        entity: &E,
    ) -> impl Future<Output = Result<bool>> + Send {
        let prepared = self.key_statement(self.delete_sql(), entity);
        async move {
            let affected = executor.execute(prepared?).await?;
            self.single_row(affected.rows_affected, "deleted")
        }
    }

    /// Select the row identified by the key of `entity`.
    pub fn get<Exec: Executor>(
        &self,
        executor: &mut Exec,
        entity: &E,
    ) -> impl Future<Output = Result<Option<E>>> + Send {
        let prepared = self.key_statement(self.select_by_id_sql(), entity);
        async move {
            let row = executor.fetch_one(prepared?).await?;
            row.map(E::from_row).transpose()
        }
    }

    /// Select the rows matching `options`.
    pub fn find<'s, Exec: Executor>(
        &'s self,
        executor: &'s mut Exec,
        options: SelectOptions,
    ) -> impl Stream<Item = Result<E>> + Send + 's {
        let mut statement = Statement::new(self.select_sql(&options));
        statement.parameters = options.parameters;
        executor
            .fetch(statement)
            .map(|row| row.and_then(E::from_row))
    }

    /// Count the rows matching `condition`, all of them when `None`.
    pub fn count<Exec: Executor>(
        &self,
        executor: &mut Exec,
        condition: Option<&str>,
        parameters: Vec<Parameter>,
    ) -> impl Future<Output = Result<u64>> + Send {
        let mut statement = Statement::new(self.count_sql(condition));
        statement.parameters = parameters;
        executor.fetch_one(statement).and_then(|row| async move {
            let Some(row) = row else {
                return Err(Error::msg("The count query did not return any row"));
            };
            let value = row.values.into_vec().into_iter().next().unwrap_or_default();
            u64::try_from_value(value).context("While decoding the row count")
        })
    }

    /// Assign the updatable properties of `entity` to every row matching `condition`.
    pub fn bulk_update<Exec: Executor>(
        &self,
        executor: &mut Exec,
        entity: &E,
        condition: Option<&str>,
        parameters: Vec<Parameter>,
    ) -> impl Future<Output = Result<u64>> + Send {
        let prepared = self.bulk_update_sql(condition).and_then(|sql| {
            let mut statement = Statement::new(sql);
            self.bind_properties(&mut statement, entity, self.mapping().update_properties())?;
            for (name, value) in parameters {
                statement.bind(name, value);
            }
            Ok(statement)
        });
        async move {
            let affected = executor.execute(prepared?).await?;
            Ok(affected.rows_affected)
        }
    }

    /// Delete every row matching `condition`.
    pub fn bulk_delete<Exec: Executor>(
        &self,
        executor: &mut Exec,
        condition: Option<&str>,
        parameters: Vec<Parameter>,
    ) -> impl Future<Output = Result<u64>> + Send {
        let mut statement = Statement::new(self.bulk_delete_sql(condition));
        statement.parameters = parameters;
        executor
            .execute(statement)
            .map_ok(|affected| affected.rows_affected)
    }

    fn key_statement(&self, sql: Result<&str>, entity: &E) -> Result<Statement> {
        let mut statement = Statement::new(sql?);
        self.bind_properties(&mut statement, entity, self.mapping().key_properties())?;
        Ok(statement)
    }

    fn single_row(&self, rows_affected: u64, action: &str) -> Result<bool> {
        match rows_affected {
            0 | 1 => Ok(rows_affected == 1),
            _ => {
                let error = Error::msg(format!(
                    "The query {} {} rows of `{}` instead of the expected 1",
                    action,
                    rows_affected,
                    self.mapping().table_name()
                ));
                log::log!(Level::Error, "{}", error);
                Err(error)
            }
        }
    }
}

impl<E: Entity> fmt::Debug for StatementSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementSet")
            .field("entity", &self.builder.entity().name())
            .field("dialect", &self.builder.dialect())
            .field("mapping", self.builder.mapping())
            .finish()
    }
}
