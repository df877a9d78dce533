mod builder;
mod configuration;
mod descriptor;
mod dialect;
mod entity;
mod error;
mod executor;
mod mapping;
mod statement;
mod statement_set;
#[cfg(test)]
mod testing;
mod util;
mod value;

pub use ::anyhow::Context;
pub use builder::*;
pub use configuration::*;
pub use descriptor::*;
pub use dialect::*;
pub use entity::*;
pub use error::*;
pub use executor::*;
pub use mapping::*;
pub use statement::*;
pub use statement_set::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
