pub mod config;
pub mod date;
pub mod error;
pub mod index;
pub mod join;
pub mod keys;
pub mod loader;
pub mod query;
pub mod schema;
pub mod sort;
pub mod store;
pub mod validate;
pub mod wal;

#[cfg(test)]
mod fixtures;

pub use config::EngineParams;
pub use error::{Result, TpkvError};
pub use index::{build_all as build_indexes, IndexReport};
pub use loader::{load_dir, LoadReport};
pub use query::{Query, QueryOutput};
pub use store::{KeyKind, KvStore, MemoryStore, Record, StoreStats};
pub use validate::{validate, ValidationReport};
