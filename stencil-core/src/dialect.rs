use crate::ConfigurationError;
use std::{fmt, str::FromStr};

/// SQL flavor targeted by an entity mapping.
///
/// The set is closed, the dialects that can actually produce statements are the ones having a
/// registered [`StatementBuilderFactory`](crate::StatementBuilderFactory). `DuckDb` has none out
/// of the box.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SqlDialect {
    #[default]
    MsSql,
    MySql,
    PostgreSql,
    SqLite,
    DuckDb,
}

impl SqlDialect {
    pub const ALL: [SqlDialect; 5] = [
        SqlDialect::MsSql,
        SqlDialect::MySql,
        SqlDialect::PostgreSql,
        SqlDialect::SqLite,
        SqlDialect::DuckDb,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SqlDialect::MsSql => "MsSql",
            SqlDialect::MySql => "MySql",
            SqlDialect::PostgreSql => "PostgreSql",
            SqlDialect::SqLite => "SqLite",
            SqlDialect::DuckDb => "DuckDb",
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlDialect {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.trim().to_ascii_lowercase().as_str() {
            "mssql" | "sqlserver" => SqlDialect::MsSql,
            "mysql" | "mariadb" => SqlDialect::MySql,
            "postgresql" | "postgres" => SqlDialect::PostgreSql,
            "sqlite" => SqlDialect::SqLite,
            "duckdb" => SqlDialect::DuckDb,
            _ => return Err(ConfigurationError::UnknownDialectName(value.to_string())),
        })
    }
}
