#![allow(dead_code)]

use log::LevelFilter;
use std::{collections::VecDeque, env, future::Future};
use stencil::{
    Executor, Result, RowLabeled, RowsAffected, Statement,
    future,
    stream::{self, Stream},
};

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Executor that records every statement and replies with queued results.
#[derive(Default, Debug)]
pub struct RecordingExecutor {
    pub statements: Vec<Statement>,
    /// Rows returned by the next calls to `fetch`, one entry per call.
    pub rows: VecDeque<Vec<RowLabeled>>,
    /// Rows affected reported by the next calls to `execute`, one entry per call.
    pub affected: VecDeque<u64>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn reply_rows(&mut self, rows: Vec<RowLabeled>) -> &mut Self {
        self.rows.push_back(rows);
        self
    }

    pub fn reply_affected(&mut self, rows_affected: u64) -> &mut Self {
        self.affected.push_back(rows_affected);
        self
    }

    pub fn last(&self) -> &Statement {
        self.statements.last().expect("No statement was executed")
    }
}

impl Executor for RecordingExecutor {
    fn execute(
        &mut self,
        statement: Statement,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        log::debug!("execute: {}", statement);
        self.statements.push(statement);
        let rows_affected = self.affected.pop_front().unwrap_or_default();
        future::ready(Ok(RowsAffected {
            rows_affected,
            last_affected_id: None,
        }))
    }

    fn fetch<'s>(
        &'s mut self,
        statement: Statement,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send + 's {
        log::debug!("fetch: {}", statement);
        self.statements.push(statement);
        let rows = self.rows.pop_front().unwrap_or_default();
        stream::iter(rows.into_iter().map(Ok))
    }
}

#[derive(stencil::Entity, Debug, Default, Clone, PartialEq)]
#[stencil(name = "orders", schema = "sales")]
pub struct Order {
    #[stencil(name = "order_id", key, database_generated)]
    pub id: i64,
    pub customer: String,
    pub total: rust_decimal::Decimal,
    pub note: Option<String>,
    #[stencil(skip)]
    pub dirty: bool,
}
