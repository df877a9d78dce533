use crate::Value;
use std::{
    borrow::Cow,
    fmt::{self, Display},
    mem,
    sync::Arc,
};

/// A named parameter bound to a statement.
pub type Parameter = (Cow<'static, str>, Value);

/// SQL text together with the values of its named parameters, ready for an
/// [`Executor`](crate::Executor).
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub parameters: Vec<Parameter>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            parameters: Vec::new(),
        }
    }

    /// Bind (or rebind) the parameter `name`.
    pub fn bind(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.parameters.iter_mut().find(|(n, _)| *n == name) {
            Some(parameter) => parameter.1 = value,
            None => self.parameters.push((name, value)),
        }
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find_map(|(n, v)| if n == name { Some(v) } else { None })
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    /// Total number of rows impacted.
    pub rows_affected: u64,
    /// Backend-specific last inserted identifier when available.
    pub last_affected_id: Option<i64>,
}

/// Shared column label list.
pub type RowNames = Arc<[String]>;
/// Row values, aligned by index with `RowNames`.
pub type Row = Box<[Value]>;

/// A result row with its labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    pub labels: RowNames,
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }

    pub fn get(&self, label: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == label)
            .map(|i| &self.values[i])
    }

    /// Move out the value labeled `label`, leaving `Value::Null` behind. Missing labels yield
    /// `Value::Null` as well.
    pub fn take(&mut self, label: &str) -> Value {
        match self.labels.iter().position(|v| v == label) {
            Some(i) => mem::take(&mut self.values[i]),
            None => Value::Null,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<L: Into<String>, V: Into<Value>, const N: usize> From<[(L, V); N]> for RowLabeled {
    fn from(value: [(L, V); N]) -> Self {
        let (labels, values): (Vec<String>, Vec<Value>) = value
            .into_iter()
            .map(|(l, v)| (l.into(), v.into()))
            .unzip();
        Self::new(labels.into(), values.into_boxed_slice())
    }
}
