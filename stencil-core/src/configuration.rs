use crate::{
    ConfigurationError, MsSqlBuilder, MySqlBuilder, PostgreSqlBuilder, Result, SqLiteBuilder,
    SqlDialect, StatementBuilderFactory,
};
use arc_swap::ArcSwap;
use std::{
    borrow::Cow,
    collections::HashMap,
    env,
    sync::{Arc, LazyLock},
};

/// Environment variable read by [`OrmConfiguration::load_from_env`].
pub const DEFAULT_DIALECT_ENV: &str = "STENCIL_DEFAULT_DIALECT";

/// Dialect specific options consumed by the statement builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectConfiguration {
    pub dialect: SqlDialect,
    /// Opening identifier delimiter.
    pub start_delimiter: Cow<'static, str>,
    /// Closing identifier delimiter, doubled when it appears inside an identifier.
    pub end_delimiter: Cow<'static, str>,
    /// Prefix of named parameters.
    pub parameter_prefix: Cow<'static, str>,
    /// Whether table names get qualified with the schema.
    pub is_using_schemas: bool,
}

impl DialectConfiguration {
    /// Built-in configuration of `dialect`, `None` for the dialects without one.
    pub fn for_dialect(dialect: SqlDialect) -> Option<Self> {
        let (start_delimiter, end_delimiter, is_using_schemas) = match dialect {
            SqlDialect::MsSql => ("[", "]", true),
            SqlDialect::MySql => ("`", "`", false),
            SqlDialect::PostgreSql => ("\"", "\"", true),
            SqlDialect::SqLite => ("\"", "\"", false),
            SqlDialect::DuckDb => return None,
        };
        Some(Self {
            dialect,
            start_delimiter: start_delimiter.into(),
            end_delimiter: end_delimiter.into(),
            parameter_prefix: "@".into(),
            is_using_schemas,
        })
    }
}

#[derive(Clone)]
struct Settings {
    default_dialect: SqlDialect,
    dialects: HashMap<SqlDialect, Arc<DialectConfiguration>>,
    factories: HashMap<SqlDialect, Arc<dyn StatementBuilderFactory>>,
}

impl Default for Settings {
    fn default() -> Self {
        let dialects = SqlDialect::ALL
            .into_iter()
            .filter_map(|v| DialectConfiguration::for_dialect(v).map(|c| (v, Arc::new(c))))
            .collect();
        let mut factories: HashMap<SqlDialect, Arc<dyn StatementBuilderFactory>> =
            HashMap::new();
        factories.insert(SqlDialect::MsSql, Arc::new(MsSqlBuilder::create));
        factories.insert(SqlDialect::MySql, Arc::new(MySqlBuilder::create));
        factories.insert(SqlDialect::PostgreSql, Arc::new(PostgreSqlBuilder::create));
        factories.insert(SqlDialect::SqLite, Arc::new(SqLiteBuilder::create));
        Self {
            default_dialect: SqlDialect::default(),
            dialects,
            factories,
        }
    }
}

static SETTINGS: LazyLock<ArcSwap<Settings>> = LazyLock::new(Default::default);

/// Process wide configuration: default dialect, dialect options and statement builder factories.
///
/// Reads never block, every change publishes a whole new copy of the settings. Changing the
/// default dialect only affects the entity descriptors created afterwards.
pub struct OrmConfiguration;

impl OrmConfiguration {
    pub fn default_dialect() -> SqlDialect {
        SETTINGS.load().default_dialect
    }

    pub fn set_default_dialect(dialect: SqlDialect) {
        log::debug!("Default dialect set to {}", dialect);
        SETTINGS.rcu(|settings| {
            let mut settings = Settings::clone(settings);
            settings.default_dialect = dialect;
            settings
        });
    }

    /// Configuration of `dialect`, fails when the dialect has none.
    pub fn dialect_configuration(dialect: SqlDialect) -> Result<Arc<DialectConfiguration>> {
        SETTINGS
            .load()
            .dialects
            .get(&dialect)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnsupportedDialect(dialect).into())
    }

    /// Installs (or replaces) the configuration of `configuration.dialect`.
    ///
    /// Statement sets already cached keep the configuration they were built with.
    pub fn set_dialect_configuration(configuration: DialectConfiguration) {
        let configuration = Arc::new(configuration);
        SETTINGS.rcu(|settings| {
            let mut settings = Settings::clone(settings);
            settings
                .dialects
                .insert(configuration.dialect, configuration.clone());
            settings
        });
    }

    /// Factory producing the statement builders of `dialect`, fails when none is registered.
    pub fn builder_factory(dialect: SqlDialect) -> Result<Arc<dyn StatementBuilderFactory>> {
        SETTINGS
            .load()
            .factories
            .get(&dialect)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnsupportedDialect(dialect).into())
    }

    /// Registers (or replaces) the statement builder factory of `dialect`.
    pub fn register_builder_factory(
        dialect: SqlDialect,
        factory: impl StatementBuilderFactory + 'static,
    ) {
        log::debug!("Registering statement builder factory for {}", dialect);
        let factory: Arc<dyn StatementBuilderFactory> = Arc::new(factory);
        SETTINGS.rcu(|settings| {
            let mut settings = Settings::clone(settings);
            settings.factories.insert(dialect, factory.clone());
            settings
        });
    }

    /// Applies the settings found in the environment, currently the default dialect from
    /// `STENCIL_DEFAULT_DIALECT`. Missing variables leave the configuration unchanged.
    pub fn load_from_env() -> Result<()> {
        if let Ok(value) = env::var(DEFAULT_DIALECT_ENV) {
            let dialect = value.parse::<SqlDialect>()?;
            Self::set_default_dialect(dialect);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DialectConfiguration, OrmConfiguration};
    use crate::{ConfigurationError, SqlDialect};

    #[test]
    fn builtin_dialect_configurations() {
        let mssql = OrmConfiguration::dialect_configuration(SqlDialect::MsSql).unwrap();
        assert_eq!(mssql.start_delimiter, "[");
        assert_eq!(mssql.end_delimiter, "]");
        assert!(mssql.is_using_schemas);
        let mysql = OrmConfiguration::dialect_configuration(SqlDialect::MySql).unwrap();
        assert_eq!(mysql.start_delimiter, "`");
        assert!(!mysql.is_using_schemas);
        for dialect in [SqlDialect::PostgreSql, SqlDialect::SqLite] {
            let configuration = OrmConfiguration::dialect_configuration(dialect).unwrap();
            assert_eq!(configuration.start_delimiter, "\"");
            assert_eq!(configuration.parameter_prefix, "@");
        }
        assert!(DialectConfiguration::for_dialect(SqlDialect::DuckDb).is_none());
    }

    #[test]
    fn duckdb_is_not_supported_out_of_the_box() {
        let error = OrmConfiguration::dialect_configuration(SqlDialect::DuckDb).unwrap_err();
        assert_eq!(
            error.downcast_ref::<ConfigurationError>(),
            Some(&ConfigurationError::UnsupportedDialect(SqlDialect::DuckDb))
        );
        let error = OrmConfiguration::builder_factory(SqlDialect::DuckDb)
            .err()
            .expect("DuckDb has no factory");
        assert_eq!(error.to_string(), "Dialect DuckDb is not supported");
    }

    #[test]
    fn default_dialect_is_mssql() {
        assert_eq!(OrmConfiguration::default_dialect(), SqlDialect::MsSql);
    }
}
