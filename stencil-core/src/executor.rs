use crate::{
    Result, RowLabeled, RowsAffected, Statement,
    stream::{Stream, StreamExt},
};
use std::{future::Future, pin::pin};

/// Query execution layer: runs statements against an actual database.
///
/// Stencil only generates the statements, connections, pooling and transactions live behind
/// this trait.
pub trait Executor: Send {
    /// Execute the statement and return the number of rows affected.
    fn execute(
        &mut self,
        statement: Statement,
    ) -> impl Future<Output = Result<RowsAffected>> + Send;

    /// Execute the statement and stream the rows it produces.
    fn fetch<'s>(
        &'s mut self,
        statement: Statement,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send + 's;

    /// Execute the statement and return its first row, if any.
    fn fetch_one(
        &mut self,
        statement: Statement,
    ) -> impl Future<Output = Result<Option<RowLabeled>>> + Send {
        async move {
            let mut stream = pin!(self.fetch(statement));
            stream.next().await.transpose()
        }
    }
}
