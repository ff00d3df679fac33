//! Storage layer for eventdesk-daemon
//!
//! Persists event records; the lifecycle manager is the only writer.

mod memory;
mod postgres;
mod traits;

pub use memory::InMemoryStorage;
pub use postgres::PostgresStorage;
pub use traits::{EventStorage, StorageResult};
