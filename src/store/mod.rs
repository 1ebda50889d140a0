//! Persistence layer — durable lead storage behind an async trait.

pub mod libsql_backend;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::LeadStore;
